use crate::aircraft::{AircraftType, Callsign};
use std::fmt;
use thiserror::Error;

/// Maximum number of gates a terminal can hold.
pub const MAX_NUM_GATES: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoSpace {
    #[error("gate {0} is already occupied")]
    GateOccupied(u32),
    #[error("maximum number of gates reached ({MAX_NUM_GATES})")]
    TerminalFull,
}

/// A single-aircraft parking position within a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    number: u32,
    occupant: Option<Callsign>,
}

impl Gate {
    pub fn new(number: u32) -> Gate {
        Gate { number, occupant: None }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<&Callsign> {
        self.occupant.as_ref()
    }

    pub fn park(&mut self, callsign: Callsign) -> Result<(), NoSpace> {
        if self.occupant.is_some() {
            return Err(NoSpace::GateOccupied(self.number));
        }
        self.occupant = Some(callsign);
        Ok(())
    }

    /// Clears the gate, returning the callsign of the aircraft that left.
    pub fn vacate(&mut self) -> Option<Callsign> {
        self.occupant.take()
    }

    /// Machine-readable form: `gateNumber:callsign` or `gateNumber:empty`.
    pub fn encode(&self) -> String {
        match &self.occupant {
            Some(callsign) => format!("{}:{}", self.number, callsign),
            None => format!("{}:empty", self.number),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.occupant {
            Some(callsign) => write!(f, "Gate {} [{}]", self.number, callsign),
            None => write!(f, "Gate {} [empty]", self.number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Airplane,
    Helicopter,
}

impl TerminalKind {
    pub fn name(self) -> &'static str {
        match self {
            TerminalKind::Airplane => "AirplaneTerminal",
            TerminalKind::Helicopter => "HelicopterTerminal",
        }
    }

    pub fn from_name(name: &str) -> Option<TerminalKind> {
        match name {
            "AirplaneTerminal" => Some(TerminalKind::Airplane),
            "HelicopterTerminal" => Some(TerminalKind::Helicopter),
            _ => None,
        }
    }

    /// Whether aircraft of the given type may park at this terminal.
    pub fn accepts(self, aircraft_type: AircraftType) -> bool {
        match self {
            TerminalKind::Airplane => aircraft_type == AircraftType::Airplane,
            TerminalKind::Helicopter => aircraft_type == AircraftType::Helicopter,
        }
    }
}

/// A terminal building holding up to [`MAX_NUM_GATES`] gates, serving a
/// single aircraft category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    kind: TerminalKind,
    number: u32,
    emergency: bool,
    gates: Vec<Gate>,
}

impl Terminal {
    pub fn new(kind: TerminalKind, number: u32) -> Terminal {
        Terminal {
            kind,
            number,
            emergency: false,
            gates: Vec::new(),
        }
    }

    pub fn kind(&self) -> TerminalKind {
        self.kind
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gates_mut(&mut self) -> &mut [Gate] {
        &mut self.gates
    }

    pub fn add_gate(&mut self, gate: Gate) -> Result<(), NoSpace> {
        if self.gates.len() == MAX_NUM_GATES {
            return Err(NoSpace::TerminalFull);
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Index of the first unoccupied gate, in registration order.
    pub fn first_unoccupied_gate(&self) -> Option<usize> {
        self.gates.iter().position(|gate| !gate.is_occupied())
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

    /// Rounded percentage of gates currently occupied. A terminal with no
    /// gates reports 0.
    pub fn occupancy_level(&self) -> u32 {
        if self.gates.is_empty() {
            return 0;
        }
        let occupied = self.gates.iter().filter(|gate| gate.is_occupied()).count();
        (100.0 * occupied as f64 / self.gates.len() as f64).round() as u32
    }

    /// Machine-readable form: `Kind:number:emergency:numGates` followed by
    /// one encoded gate per line, in registration order.
    pub fn encode(&self) -> String {
        let mut encoded = format!(
            "{}:{}:{}:{}",
            self.kind.name(),
            self.number,
            self.emergency,
            self.gates.len()
        );
        for gate in &self.gates {
            encoded.push('\n');
            encoded.push_str(&gate.encode());
        }
        encoded
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} gates{}",
            self.kind.name(),
            self.number,
            self.gates.len(),
            if self.emergency { " (EMERGENCY)" } else { "" }
        )
    }
}
