use crate::aircraft::{Aircraft, Callsign, Fleet};
use crate::ground::{Gate, Terminal};
use crate::queues::{AircraftQueue, LandingQueue, TakeoffQueue};
use crate::tasks::TaskType;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Tick parity on which a landing is attempted before a takeoff. Even
/// ticks (starting from tick 0) attempt a takeoff only.
pub const LANDING_TICK_PARITY: u64 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no suitable gate for aircraft {0}")]
pub struct NoSuitableGate(pub Callsign);

/// What happened during one call to [`ControlTower::tick`].
///
/// Failed land/takeoff attempts are not errors: the aircraft simply stays
/// queued and is reconsidered on its next eligible tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub landed: Option<Callsign>,
    pub took_off: Option<Callsign>,
    pub finished_loading: Vec<Callsign>,
}

/// The airport's control tower: owns the fleet, terminals, both queues and
/// the loading countdowns, and advances them one atomic tick at a time.
pub struct ControlTower {
    ticks_elapsed: u64,
    fleet: Fleet,
    terminals: Vec<Terminal>,
    landing_queue: LandingQueue,
    takeoff_queue: TakeoffQueue,
    loading: HashMap<Callsign, u32>,
}

impl ControlTower {
    pub fn new(
        ticks_elapsed: u64,
        fleet: Fleet,
        landing_queue: LandingQueue,
        takeoff_queue: TakeoffQueue,
        loading: HashMap<Callsign, u32>,
    ) -> ControlTower {
        ControlTower {
            ticks_elapsed,
            fleet,
            terminals: Vec::new(),
            landing_queue,
            takeoff_queue,
            loading,
        }
    }

    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn fleet_mut(&mut self) -> &mut Fleet {
        &mut self.fleet
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn terminal_mut(&mut self, number: u32) -> Option<&mut Terminal> {
        self.terminals.iter_mut().find(|t| t.number() == number)
    }

    pub fn landing_queue(&self) -> &LandingQueue {
        &self.landing_queue
    }

    pub fn takeoff_queue(&self) -> &TakeoffQueue {
        &self.takeoff_queue
    }

    /// Aircraft currently in their LOAD task, mapped to ticks remaining.
    pub fn loading(&self) -> &HashMap<Callsign, u32> {
        &self.loading
    }

    /// Registers a terminal. Terminals are scanned for gates in
    /// registration order.
    pub fn add_terminal(&mut self, terminal: Terminal) {
        self.terminals.push(terminal);
    }

    /// Admits an aircraft into the tower's jurisdiction.
    ///
    /// An aircraft arriving mid-WAIT or mid-LOAD must be parked right away;
    /// if no gate fits, the aircraft is not admitted and the error is
    /// returned. Admitted aircraft are immediately placed in whatever
    /// queue/map their current task calls for.
    pub fn add_aircraft(&mut self, aircraft: Aircraft) -> Result<(), NoSuitableGate> {
        let task_type = aircraft.current_task().task_type();
        if matches!(task_type, TaskType::Wait | TaskType::Load) {
            let (t, g) = self.find_unoccupied_gate(&aircraft)?;
            // the found gate is unoccupied, parking cannot fail
            self.terminals[t].gates_mut()[g]
                .park(aircraft.callsign.clone())
                .ok();
        }
        let callsign = aircraft.callsign.clone();
        self.fleet.insert(aircraft);
        self.place_aircraft_in_queues(&callsign);
        Ok(())
    }

    /// Finds an unoccupied gate for the aircraft: terminals are scanned in
    /// registration order, skipping those under emergency or of the wrong
    /// aircraft category; within a terminal the first unoccupied gate wins.
    ///
    /// Returns (terminal index, gate index).
    pub fn find_unoccupied_gate(
        &self,
        aircraft: &Aircraft,
    ) -> Result<(usize, usize), NoSuitableGate> {
        let wanted = aircraft.model.aircraft_type();
        for (t, terminal) in self.terminals.iter().enumerate() {
            if terminal.has_emergency() || !terminal.kind().accepts(wanted) {
                continue;
            }
            if let Some(g) = terminal.first_unoccupied_gate() {
                return Ok((t, g));
            }
        }
        Err(NoSuitableGate(aircraft.callsign.clone()))
    }

    /// The gate the given aircraft is parked at, if any.
    pub fn find_gate_of(&self, callsign: &str) -> Option<&Gate> {
        self.terminals
            .iter()
            .flat_map(|terminal| terminal.gates())
            .find(|gate| gate.occupant().is_some_and(|cs| &**cs == callsign))
    }

    fn release_gate(&mut self, callsign: &str) {
        for terminal in &mut self.terminals {
            for gate in terminal.gates_mut() {
                if gate.occupant().is_some_and(|cs| &**cs == callsign) {
                    gate.vacate();
                    return;
                }
            }
        }
    }

    /// Attempts to land the head of the landing queue at a suitable gate.
    ///
    /// Returns the callsign on success. With an empty queue or no suitable
    /// gate nothing happens and the aircraft (if any) stays queued.
    pub fn try_land_aircraft(&mut self) -> Option<Callsign> {
        let candidate = self.landing_queue.peek(&self.fleet)?;
        let aircraft = self.fleet.get(&candidate)?;
        let (t, g) = self.find_unoccupied_gate(aircraft).ok()?;

        // state is unchanged since the peek, so this removes the candidate
        let callsign = self.landing_queue.remove(&self.fleet)?;
        self.terminals[t].gates_mut()[g].park(callsign.clone()).ok();
        let landed = self.fleet.get_mut(&callsign)?;
        landed.unload();
        landed.tasks_mut().advance();
        Some(callsign)
    }

    /// Releases the head of the takeoff queue, if any. No gate is involved;
    /// the aircraft is airborne once it leaves the queue.
    pub fn try_takeoff_aircraft(&mut self) -> Option<Callsign> {
        let callsign = self.takeoff_queue.remove(&self.fleet)?;
        self.fleet.get_mut(&callsign)?.tasks_mut().advance();
        Some(callsign)
    }

    /// Counts down every loading aircraft by one tick. Aircraft reaching
    /// zero leave their gate, advance their task and are dropped from the
    /// loading map.
    fn update_loading_aircraft(&mut self) -> Vec<Callsign> {
        let mut finished = Vec::new();
        for (callsign, ticks) in &mut self.loading {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                finished.push(callsign.clone());
            }
        }
        finished.sort();
        for callsign in &finished {
            self.loading.remove(callsign);
            self.release_gate(callsign);
            if let Some(aircraft) = self.fleet.get_mut(callsign) {
                aircraft.tasks_mut().advance();
            }
        }
        finished
    }

    /// Ensures the aircraft sits in the queue/map its current task calls
    /// for. Idempotent: an existing membership is never duplicated.
    pub fn place_aircraft_in_queues(&mut self, callsign: &Callsign) {
        let Some(aircraft) = self.fleet.get(callsign) else {
            return;
        };
        match aircraft.current_task().task_type() {
            TaskType::Land => {
                if !self.landing_queue.contains(callsign) {
                    self.landing_queue.add(callsign.clone());
                }
            }
            TaskType::Takeoff => {
                if !self.takeoff_queue.contains(callsign) {
                    self.takeoff_queue.add(callsign.clone());
                }
            }
            TaskType::Load => {
                let loading_time = aircraft.loading_time();
                self.loading.entry(callsign.clone()).or_insert(loading_time);
            }
            TaskType::Away | TaskType::Wait => {}
        }
    }

    pub fn place_all_aircraft_in_queues(&mut self) {
        for callsign in self.fleet.callsigns() {
            self.place_aircraft_in_queues(&callsign);
        }
    }

    /// Advances the simulation by one tick:
    ///
    /// 1. every aircraft runs its physics update, and AWAY/WAIT aircraft
    ///    advance to their next task for free;
    /// 2. loading countdowns tick down, finished aircraft vacate gates;
    /// 3. on odd ticks a landing is attempted, falling back to one takeoff
    ///    if it fails; on even ticks one takeoff is attempted directly;
    /// 4. every aircraft is (re-)placed in the queue its task calls for;
    /// 5. the tick counter increments.
    pub fn tick(&mut self) -> TickReport {
        for aircraft in self.fleet.iter_mut() {
            aircraft.tick();
            if matches!(
                aircraft.current_task().task_type(),
                TaskType::Away | TaskType::Wait
            ) {
                aircraft.tasks_mut().advance();
            }
        }

        let finished_loading = self.update_loading_aircraft();

        let mut landed = None;
        let mut took_off = None;
        if self.ticks_elapsed % 2 == LANDING_TICK_PARITY {
            landed = self.try_land_aircraft();
            if landed.is_none() {
                took_off = self.try_takeoff_aircraft();
            }
        } else {
            took_off = self.try_takeoff_aircraft();
        }

        self.place_all_aircraft_in_queues();
        self.ticks_elapsed += 1;

        TickReport {
            landed,
            took_off,
            finished_loading,
        }
    }
}

impl fmt::Display for ControlTower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ControlTower: {} terminals, {} total aircraft ({} LAND, {} TAKEOFF, {} LOAD)",
            self.terminals.len(),
            self.fleet.len(),
            self.landing_queue.len(),
            self.takeoff_queue.len(),
            self.loading.len()
        )
    }
}
