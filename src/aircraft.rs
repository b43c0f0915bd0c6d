use crate::tasks::{Task, TaskList, TaskType};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type Callsign = Arc<str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AircraftType {
    Airplane,
    Helicopter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AircraftKind {
    Passenger,
    Freight,
}

impl fmt::Display for AircraftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AircraftKind::Passenger => write!(f, "passenger"),
            AircraftKind::Freight => write!(f, "freight"),
        }
    }
}

/// Fixed catalogue of airframes and their characteristics.
///
/// A model with a non-zero freight capacity is a freight airframe,
/// otherwise it carries passengers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AircraftModel {
    AirbusA320,
    Boeing747_8F,
    RobinsonR44,
    Boeing787,
    Fokker100,
    SikorskySkycrane,
}

impl AircraftModel {
    pub const ALL: [AircraftModel; 6] = [
        AircraftModel::AirbusA320,
        AircraftModel::Boeing747_8F,
        AircraftModel::RobinsonR44,
        AircraftModel::Boeing787,
        AircraftModel::Fokker100,
        AircraftModel::SikorskySkycrane,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AircraftModel::AirbusA320 => "AIRBUS_A320",
            AircraftModel::Boeing747_8F => "BOEING_747_8F",
            AircraftModel::RobinsonR44 => "ROBINSON_R44",
            AircraftModel::Boeing787 => "BOEING_787",
            AircraftModel::Fokker100 => "FOKKER_100",
            AircraftModel::SikorskySkycrane => "SIKORSKY_SKYCRANE",
        }
    }

    pub fn from_name(name: &str) -> Option<AircraftModel> {
        AircraftModel::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn aircraft_type(self) -> AircraftType {
        match self {
            AircraftModel::RobinsonR44 | AircraftModel::SikorskySkycrane => {
                AircraftType::Helicopter
            }
            _ => AircraftType::Airplane,
        }
    }

    /// Maximum fuel onboard, in litres.
    pub fn fuel_capacity(self) -> f64 {
        match self {
            AircraftModel::AirbusA320 => 27200.0,
            AircraftModel::Boeing747_8F => 226117.0,
            AircraftModel::RobinsonR44 => 190.0,
            AircraftModel::Boeing787 => 126206.0,
            AircraftModel::Fokker100 => 13365.0,
            AircraftModel::SikorskySkycrane => 3328.0,
        }
    }

    pub fn passenger_capacity(self) -> u32 {
        match self {
            AircraftModel::AirbusA320 => 150,
            AircraftModel::RobinsonR44 => 4,
            AircraftModel::Boeing787 => 242,
            AircraftModel::Fokker100 => 97,
            _ => 0,
        }
    }

    /// Freight capacity in kilograms.
    pub fn freight_capacity(self) -> u32 {
        match self {
            AircraftModel::Boeing747_8F => 137_756,
            AircraftModel::SikorskySkycrane => 9_100,
            _ => 0,
        }
    }

    pub fn kind(self) -> AircraftKind {
        if self.freight_capacity() > 0 {
            AircraftKind::Freight
        } else {
            AircraftKind::Passenger
        }
    }

    /// Passenger or freight capacity, whichever this model carries.
    pub fn cargo_capacity(self) -> u32 {
        match self.kind() {
            AircraftKind::Passenger => self.passenger_capacity(),
            AircraftKind::Freight => self.freight_capacity(),
        }
    }
}

impl fmt::Display for AircraftModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single managed aircraft: identity, airframe, task cycle and the
/// simple fuel/cargo state the tick physics act on.
#[derive(Debug, Clone)]
pub struct Aircraft {
    pub callsign: Callsign,
    pub model: AircraftModel,
    tasks: TaskList,
    fuel_amount: f64,
    cargo_amount: u32,
    emergency: bool,
}

impl Aircraft {
    pub fn new(
        callsign: Callsign,
        model: AircraftModel,
        tasks: TaskList,
        fuel_amount: f64,
        cargo_amount: u32,
    ) -> Aircraft {
        Aircraft {
            callsign,
            model,
            tasks,
            fuel_amount,
            cargo_amount,
            emergency: false,
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskList {
        &mut self.tasks
    }

    pub fn current_task(&self) -> Task {
        self.tasks.current()
    }

    pub fn kind(&self) -> AircraftKind {
        self.model.kind()
    }

    pub fn fuel_amount(&self) -> f64 {
        self.fuel_amount
    }

    pub fn fuel_percent_remaining(&self) -> f64 {
        100.0 * self.fuel_amount / self.model.fuel_capacity()
    }

    pub fn cargo_amount(&self) -> u32 {
        self.cargo_amount
    }

    /// Cargo onboard once the current LOAD task completes.
    fn cargo_to_load(&self) -> u32 {
        let percent = self.current_task().load_percent();
        (self.model.cargo_capacity() as f64 * percent as f64 / 100.0).round() as u32
    }

    /// Number of ticks a LOAD task takes for this aircraft.
    ///
    /// Passenger airframes load in `round(log10(passengers))` ticks, at
    /// least one. Freight loads in 1, 2 or 3 ticks depending on tonnage.
    pub fn loading_time(&self) -> u32 {
        let to_load = self.cargo_to_load();
        match self.kind() {
            AircraftKind::Passenger => {
                if to_load == 0 {
                    return 1;
                }
                ((to_load as f64).log10().round() as u32).max(1)
            }
            AircraftKind::Freight => {
                if to_load < 1000 {
                    1
                } else if to_load <= 50_000 {
                    2
                } else {
                    3
                }
            }
        }
    }

    /// Per-tick physics update.
    ///
    /// AWAY and LAND burn a tenth of the fuel capacity (floored at empty);
    /// LOAD refuels at capacity / loading_time per tick and loads cargo
    /// toward the task's target in equal increments.
    pub fn tick(&mut self) {
        let capacity = self.model.fuel_capacity();
        match self.current_task().task_type() {
            TaskType::Away | TaskType::Land => {
                self.fuel_amount = (self.fuel_amount - capacity / 10.0).max(0.0);
            }
            TaskType::Load => {
                let ticks = self.loading_time();
                self.fuel_amount = (self.fuel_amount + capacity / ticks as f64).min(capacity);
                let step = (self.cargo_to_load() as f64 / ticks as f64).round() as u32;
                self.cargo_amount =
                    (self.cargo_amount + step).min(self.model.cargo_capacity());
            }
            _ => {}
        }
    }

    /// Empties the passengers or freight onboard.
    pub fn unload(&mut self) {
        self.cargo_amount = 0;
    }

    /// Rounded percentage of cargo capacity currently in use.
    pub fn occupancy_level(&self) -> u32 {
        let capacity = self.model.cargo_capacity();
        if capacity == 0 {
            return 0;
        }
        (100.0 * self.cargo_amount as f64 / capacity as f64).round() as u32
    }

    pub fn declare_emergency(&mut self) {
        self.emergency = true;
    }

    pub fn clear_emergency(&mut self) {
        self.emergency = false;
    }

    pub fn has_emergency(&self) -> bool {
        self.emergency
    }

    /// Machine-readable form:
    /// `callsign:MODEL:taskList:fuelAmount:emergency:cargoAmount`.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}",
            self.callsign,
            self.model,
            self.tasks.encode(),
            self.fuel_amount,
            self.emergency,
            self.cargo_amount
        )
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) on {}{}",
            self.callsign,
            self.model,
            self.current_task(),
            if self.emergency { " (EMERGENCY)" } else { "" }
        )
    }
}

/// The canonical aircraft store, owned by the control tower.
///
/// Insertion order is preserved (it is the admission order) and lookups go
/// through a callsign index. Queues and the loading map refer to aircraft
/// by callsign only, never by reference.
#[derive(Debug, Default)]
pub struct Fleet {
    aircraft: Vec<Aircraft>,
    index: HashMap<Callsign, usize>,
}

impl Fleet {
    pub fn new() -> Fleet {
        Fleet::default()
    }

    pub fn insert(&mut self, aircraft: Aircraft) {
        self.index.insert(aircraft.callsign.clone(), self.aircraft.len());
        self.aircraft.push(aircraft);
    }

    pub fn get(&self, callsign: &str) -> Option<&Aircraft> {
        self.index.get(callsign).map(|&i| &self.aircraft[i])
    }

    pub fn get_mut(&mut self, callsign: &str) -> Option<&mut Aircraft> {
        self.index.get(callsign).map(|&i| &mut self.aircraft[i])
    }

    pub fn contains(&self, callsign: &str) -> bool {
        self.index.contains_key(callsign)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Aircraft> {
        self.aircraft.iter_mut()
    }

    pub fn callsigns(&self) -> Vec<Callsign> {
        self.aircraft.iter().map(|a| a.callsign.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }
}
