//! Reader and writer for the line-oriented save format.
//!
//! A save is a directory of four files, mirroring the four logical
//! sections: `tick.txt` (elapsed ticks), `aircraft.txt` (the fleet),
//! `queues.txt` (takeoff queue, landing queue, loading map) and
//! `terminals.txt` (terminals with their gates). Each section is
//! independently loadable from any `BufRead`; any structural, referential
//! or range violation aborts that section's load with [`SaveError`].

use crate::aircraft::{Aircraft, AircraftModel, Callsign, Fleet};
use crate::control::ControlTower;
use crate::ground::{Gate, Terminal, TerminalKind, MAX_NUM_GATES};
use crate::queues::{AircraftQueue, LandingQueue, TakeoffQueue};
use crate::tasks::{Task, TaskList, TaskType};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub const TICK_FILE: &str = "tick.txt";
pub const AIRCRAFT_FILE: &str = "aircraft.txt";
pub const QUEUES_FILE: &str = "queues.txt";
pub const TERMINALS_FILE: &str = "terminals.txt";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("malformed save data")]
    Malformed,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

type Lines<R> = io::Lines<R>;

fn next_line<R: BufRead>(lines: &mut Lines<R>) -> Result<String, SaveError> {
    lines.next().ok_or(SaveError::Malformed)?.map_err(SaveError::Io)
}

/// Splits on `sep`, requiring exactly `parts` fields.
fn split_exact(line: &str, sep: char, parts: usize) -> Result<Vec<&str>, SaveError> {
    let tokens: Vec<&str> = line.split(sep).collect();
    if tokens.len() != parts {
        return Err(SaveError::Malformed);
    }
    Ok(tokens)
}

fn parse_num<T: std::str::FromStr>(token: &str) -> Result<T, SaveError> {
    token.parse().map_err(|_| SaveError::Malformed)
}

// ── Section readers ──

/// Loads the number of elapsed ticks: a single non-negative integer line.
pub fn load_tick(reader: impl BufRead) -> Result<u64, SaveError> {
    let mut lines = reader.lines();
    parse_num(&next_line(&mut lines)?)
}

/// Loads the fleet: a count line followed by that many encoded aircraft.
pub fn load_aircraft(reader: impl BufRead) -> Result<Fleet, SaveError> {
    let mut lines = reader.lines();
    let count: usize = parse_num(&next_line(&mut lines)?)?;
    let mut fleet = Fleet::new();
    let mut read = 0;
    for line in lines {
        fleet.insert(read_aircraft(&line?)?);
        read += 1;
    }
    if read != count {
        return Err(SaveError::Malformed);
    }
    Ok(fleet)
}

/// Decodes one aircraft line:
/// `callsign:MODEL:taskList:fuelAmount:emergency:cargoAmount`.
pub fn read_aircraft(line: &str) -> Result<Aircraft, SaveError> {
    let tokens = split_exact(line, ':', 6)?;
    let callsign: Callsign = Arc::from(tokens[0]);
    let model = AircraftModel::from_name(tokens[1]).ok_or(SaveError::Malformed)?;
    let tasks = read_task_list(tokens[2])?;
    let fuel: f64 = parse_num(tokens[3])?;
    if !(0.0..=model.fuel_capacity()).contains(&fuel) {
        return Err(SaveError::Malformed);
    }
    let emergency: bool = parse_num(tokens[4])?;
    let cargo: u32 = parse_num(tokens[5])?;
    if cargo > model.cargo_capacity() {
        return Err(SaveError::Malformed);
    }
    let mut aircraft = Aircraft::new(callsign, model, tasks, fuel, cargo);
    if emergency {
        aircraft.declare_emergency();
    }
    Ok(aircraft)
}

/// Decodes a comma-joined task list, e.g. `WAIT,LOAD@75,TAKEOFF,AWAY,LAND`.
pub fn read_task_list(encoded: &str) -> Result<TaskList, SaveError> {
    let mut tasks = Vec::new();
    for part in encoded.split(',') {
        let task = match part.split_once('@') {
            None => {
                let task_type = TaskType::from_name(part).ok_or(SaveError::Malformed)?;
                Task::new(task_type)
            }
            Some((name, percent)) => {
                if percent.contains('@') || TaskType::from_name(name) != Some(TaskType::Load) {
                    return Err(SaveError::Malformed);
                }
                Task::load(parse_num(percent)?)
            }
        };
        tasks.push(task);
    }
    TaskList::new(tasks).map_err(|_| SaveError::Malformed)
}

/// Loads the takeoff queue, landing queue and loading map, in that order.
/// Every callsign must resolve against the fleet; trailing data after the
/// loading section is malformed.
pub fn load_queues(
    reader: impl BufRead,
    fleet: &Fleet,
    takeoff_queue: &mut TakeoffQueue,
    landing_queue: &mut LandingQueue,
    loading: &mut HashMap<Callsign, u32>,
) -> Result<(), SaveError> {
    let mut lines = reader.lines();
    read_queue(&mut lines, fleet, takeoff_queue)?;
    read_queue(&mut lines, fleet, landing_queue)?;
    read_loading_aircraft(&mut lines, fleet, loading)?;
    if lines.next().is_some() {
        return Err(SaveError::Malformed);
    }
    Ok(())
}

fn read_queue<R: BufRead>(
    lines: &mut Lines<R>,
    fleet: &Fleet,
    queue: &mut dyn AircraftQueue,
) -> Result<(), SaveError> {
    let header = next_line(lines)?;
    let tokens = split_exact(&header, ':', 2)?;
    if tokens[0] != queue.kind_name() {
        return Err(SaveError::Malformed);
    }
    let count: usize = parse_num(tokens[1])?;
    if count == 0 {
        return Ok(());
    }
    let line = next_line(lines)?;
    let callsigns: Vec<&str> = line.split(',').collect();
    if callsigns.len() != count {
        return Err(SaveError::Malformed);
    }
    for callsign in callsigns {
        let aircraft = fleet.get(callsign).ok_or(SaveError::Malformed)?;
        queue.add(aircraft.callsign.clone());
    }
    Ok(())
}

fn read_loading_aircraft<R: BufRead>(
    lines: &mut Lines<R>,
    fleet: &Fleet,
    loading: &mut HashMap<Callsign, u32>,
) -> Result<(), SaveError> {
    let header = next_line(lines)?;
    let tokens = split_exact(&header, ':', 2)?;
    if tokens[0] != "LoadingAircraft" {
        return Err(SaveError::Malformed);
    }
    let count: usize = parse_num(tokens[1])?;
    if count == 0 {
        return Ok(());
    }
    let line = next_line(lines)?;
    let entries: Vec<&str> = line.split(',').collect();
    if entries.len() != count {
        return Err(SaveError::Malformed);
    }
    for entry in entries {
        let pair = split_exact(entry, ':', 2)?;
        let aircraft = fleet.get(pair[0]).ok_or(SaveError::Malformed)?;
        let ticks_remaining: u32 = parse_num(pair[1])?;
        if ticks_remaining < 1 {
            return Err(SaveError::Malformed);
        }
        loading.insert(aircraft.callsign.clone(), ticks_remaining);
    }
    Ok(())
}

/// Loads terminals and their gates: a count line, then per terminal a
/// header line followed by its gate lines.
pub fn load_terminals(reader: impl BufRead, fleet: &Fleet) -> Result<Vec<Terminal>, SaveError> {
    let mut lines = reader.lines();
    let count: usize = parse_num(&next_line(&mut lines)?)?;
    let mut terminals = Vec::with_capacity(count);
    for _ in 0..count {
        let header = next_line(&mut lines)?;
        terminals.push(read_terminal(&header, &mut lines, fleet)?);
    }
    if lines.next().is_some() {
        return Err(SaveError::Malformed);
    }
    Ok(terminals)
}

/// Decodes one terminal from its header line
/// (`Kind:number:emergency:numGates`) plus `numGates` following gate lines.
pub fn read_terminal<R: BufRead>(
    header: &str,
    lines: &mut Lines<R>,
    fleet: &Fleet,
) -> Result<Terminal, SaveError> {
    let tokens = split_exact(header, ':', 4)?;
    let kind = TerminalKind::from_name(tokens[0]).ok_or(SaveError::Malformed)?;
    let number: u32 = parse_num(tokens[1])?;
    if number < 1 {
        return Err(SaveError::Malformed);
    }
    let emergency: bool = parse_num(tokens[2])?;
    let num_gates: usize = parse_num(tokens[3])?;
    if num_gates > MAX_NUM_GATES {
        return Err(SaveError::Malformed);
    }
    let mut terminal = Terminal::new(kind, number);
    if emergency {
        terminal.declare_emergency();
    }
    for _ in 0..num_gates {
        let line = next_line(lines)?;
        terminal
            .add_gate(read_gate(&line, fleet)?)
            .map_err(|_| SaveError::Malformed)?;
    }
    Ok(terminal)
}

/// Decodes one gate line: `gateNumber:callsign` or `gateNumber:empty`.
pub fn read_gate(line: &str, fleet: &Fleet) -> Result<Gate, SaveError> {
    let tokens = split_exact(line, ':', 2)?;
    let number: u32 = parse_num(tokens[0])?;
    if number < 1 {
        return Err(SaveError::Malformed);
    }
    let mut gate = Gate::new(number);
    if tokens[1] != "empty" {
        let aircraft = fleet.get(tokens[1]).ok_or(SaveError::Malformed)?;
        // a fresh gate is never occupied
        gate.park(aircraft.callsign.clone()).ok();
    }
    Ok(gate)
}

// ── Section writers ──

pub fn encode_tick(tower: &ControlTower) -> String {
    tower.ticks_elapsed().to_string()
}

pub fn encode_aircraft(fleet: &Fleet) -> String {
    let mut encoded = fleet.len().to_string();
    for aircraft in fleet.iter() {
        encoded.push('\n');
        encoded.push_str(&aircraft.encode());
    }
    encoded
}

pub fn encode_queues(tower: &ControlTower) -> String {
    let fleet = tower.fleet();
    let mut encoded = tower.takeoff_queue().encode(fleet);
    encoded.push('\n');
    encoded.push_str(&tower.landing_queue().encode(fleet));
    encoded.push('\n');

    // loading map entries are written sorted by callsign so saves are
    // byte-for-byte deterministic
    let mut entries: Vec<(&Callsign, &u32)> = tower.loading().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    encoded.push_str(&format!("LoadingAircraft:{}", entries.len()));
    if !entries.is_empty() {
        let joined = entries
            .iter()
            .map(|(callsign, ticks)| format!("{}:{}", callsign, ticks))
            .collect::<Vec<String>>()
            .join(",");
        encoded.push('\n');
        encoded.push_str(&joined);
    }
    encoded
}

pub fn encode_terminals(terminals: &[Terminal]) -> String {
    let mut encoded = terminals.len().to_string();
    for terminal in terminals {
        encoded.push('\n');
        encoded.push_str(&terminal.encode());
    }
    encoded
}

// ── Whole-tower load/save ──

fn open(path: &Path) -> Result<BufReader<File>, SaveError> {
    Ok(BufReader::new(File::open(path)?))
}

/// Reads the four section files from `dir` and reassembles the tower.
/// Sections load in dependency order: tick, aircraft, terminals, queues.
pub fn load_control_tower(dir: &Path) -> Result<ControlTower, SaveError> {
    let ticks = load_tick(open(&dir.join(TICK_FILE))?)?;
    let fleet = load_aircraft(open(&dir.join(AIRCRAFT_FILE))?)?;
    let terminals = load_terminals(open(&dir.join(TERMINALS_FILE))?, &fleet)?;
    let mut takeoff_queue = TakeoffQueue::new();
    let mut landing_queue = LandingQueue::new();
    let mut loading = HashMap::new();
    load_queues(
        open(&dir.join(QUEUES_FILE))?,
        &fleet,
        &mut takeoff_queue,
        &mut landing_queue,
        &mut loading,
    )?;

    let mut tower = ControlTower::new(ticks, fleet, landing_queue, takeoff_queue, loading);
    for terminal in terminals {
        tower.add_terminal(terminal);
    }
    Ok(tower)
}

/// Writes the four section files into `dir`, creating it if needed.
pub fn save_control_tower(tower: &ControlTower, dir: &Path) -> Result<(), SaveError> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(TICK_FILE), encode_tick(tower) + "\n")?;
    fs::write(dir.join(AIRCRAFT_FILE), encode_aircraft(tower.fleet()) + "\n")?;
    fs::write(dir.join(QUEUES_FILE), encode_queues(tower) + "\n")?;
    fs::write(
        dir.join(TERMINALS_FILE),
        encode_terminals(tower.terminals()) + "\n",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(s: &str) -> Cursor<Vec<u8>> {
        Cursor::new(s.as_bytes().to_vec())
    }

    fn sample_fleet() -> Fleet {
        load_aircraft(reader(
            "2\n\
             QFA481:AIRBUS_A320:AWAY,LAND,WAIT,LOAD@60,TAKEOFF:10000:false:132\n\
             UPS119:BOEING_747_8F:WAIT,LOAD@50,TAKEOFF,AWAY,LAND:4000:true:0",
        ))
        .unwrap()
    }

    #[test]
    fn test_load_tick() {
        assert_eq!(load_tick(reader("5")).unwrap(), 5);
        assert_eq!(load_tick(reader("0")).unwrap(), 0);
    }

    #[test]
    fn test_load_tick_rejects_bad_values() {
        assert!(load_tick(reader("")).is_err());
        assert!(load_tick(reader("-3")).is_err());
        assert!(load_tick(reader("five")).is_err());
    }

    #[test]
    fn test_load_aircraft() {
        let fleet = sample_fleet();
        assert_eq!(fleet.len(), 2);
        let qfa = fleet.get("QFA481").unwrap();
        assert_eq!(qfa.model, AircraftModel::AirbusA320);
        assert_eq!(qfa.cargo_amount(), 132);
        assert!(!qfa.has_emergency());
        let ups = fleet.get("UPS119").unwrap();
        assert!(ups.has_emergency());
        assert_eq!(ups.current_task().task_type(), TaskType::Wait);
    }

    #[test]
    fn test_load_aircraft_count_mismatch() {
        let data = "2\nQFA481:AIRBUS_A320:AWAY,LAND,WAIT,LOAD@60,TAKEOFF:10000:false:132";
        assert!(load_aircraft(reader(data)).is_err());
    }

    #[test]
    fn test_read_aircraft_field_count() {
        assert!(read_aircraft("QFA481:AIRBUS_A320:AWAY:10000:false").is_err());
        assert!(read_aircraft("QFA481:AIRBUS_A320:AWAY:10000:false:0:extra").is_err());
    }

    #[test]
    fn test_read_aircraft_range_checks() {
        // fuel above capacity
        assert!(read_aircraft("A:AIRBUS_A320:AWAY:999999:false:0").is_err());
        // negative fuel
        assert!(read_aircraft("A:AIRBUS_A320:AWAY:-1:false:0").is_err());
        // too many passengers for an A320
        assert!(read_aircraft("A:AIRBUS_A320:AWAY:1000:false:151").is_err());
        // unknown model
        assert!(read_aircraft("A:CESSNA_172:AWAY:10:false:0").is_err());
        // emergency flag must be a bool
        assert!(read_aircraft("A:AIRBUS_A320:AWAY:1000:maybe:0").is_err());
    }

    #[test]
    fn test_read_task_list() {
        let list = read_task_list("WAIT,LOAD@75,TAKEOFF,AWAY,LAND").unwrap();
        assert_eq!(list.current().task_type(), TaskType::Wait);
        assert_eq!(list.encode(), "WAIT,LOAD@75,TAKEOFF,AWAY,LAND");
    }

    #[test]
    fn test_read_task_list_rejects_garbage() {
        // unknown task name
        assert!(read_task_list("AWAY,HOLD").is_err());
        // double @
        assert!(read_task_list("LOAD@10@20").is_err());
        // percentage on a non-LOAD task
        assert!(read_task_list("AWAY@30").is_err());
        // negative load percent
        assert!(read_task_list("LOAD@-5,TAKEOFF,AWAY,LAND,WAIT").is_err());
        // valid tokens but an illegal cycle
        assert!(read_task_list("AWAY,TAKEOFF").is_err());
    }

    #[test]
    fn test_load_queues() {
        let fleet = sample_fleet();
        let mut takeoff = TakeoffQueue::new();
        let mut landing = LandingQueue::new();
        let mut loading = HashMap::new();
        load_queues(
            reader("TakeoffQueue:1\nQFA481\nLandingQueue:0\nLoadingAircraft:1\nUPS119:2"),
            &fleet,
            &mut takeoff,
            &mut landing,
            &mut loading,
        )
        .unwrap();
        assert!(takeoff.contains("QFA481"));
        assert_eq!(landing.len(), 0);
        assert_eq!(loading.get("UPS119"), Some(&2));
    }

    #[test]
    fn test_load_queues_referential_integrity() {
        let fleet = sample_fleet();
        let mut takeoff = TakeoffQueue::new();
        let mut landing = LandingQueue::new();
        let mut loading = HashMap::new();
        let result = load_queues(
            reader("TakeoffQueue:1\nGHOST99\nLandingQueue:0\nLoadingAircraft:0"),
            &fleet,
            &mut takeoff,
            &mut landing,
            &mut loading,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_queues_strict_structure() {
        let fleet = sample_fleet();
        let attempt = |data: &str| {
            let mut takeoff = TakeoffQueue::new();
            let mut landing = LandingQueue::new();
            let mut loading = HashMap::new();
            load_queues(reader(data), &fleet, &mut takeoff, &mut landing, &mut loading)
        };
        // queue kinds in the wrong order
        assert!(attempt("LandingQueue:0\nTakeoffQueue:0\nLoadingAircraft:0").is_err());
        // count doesn't match the callsign line
        assert!(attempt("TakeoffQueue:2\nQFA481\nLandingQueue:0\nLoadingAircraft:0").is_err());
        // zero ticks remaining
        assert!(
            attempt("TakeoffQueue:0\nLandingQueue:0\nLoadingAircraft:1\nQFA481:0").is_err()
        );
        // trailing data
        assert!(
            attempt("TakeoffQueue:0\nLandingQueue:0\nLoadingAircraft:0\nleftover").is_err()
        );
        // truncated
        assert!(attempt("TakeoffQueue:0\nLandingQueue:0").is_err());
    }

    #[test]
    fn test_terminal_round_trip() {
        let fleet = sample_fleet();
        let encoded = "AirplaneTerminal:1:false:2\n1:QFA481\n2:empty";
        let terminals = load_terminals(reader(&format!("1\n{}", encoded)), &fleet).unwrap();
        assert_eq!(terminals.len(), 1);
        let terminal = &terminals[0];
        assert_eq!(terminal.kind(), TerminalKind::Airplane);
        assert_eq!(terminal.number(), 1);
        assert!(!terminal.has_emergency());
        assert_eq!(terminal.gates().len(), 2);
        assert_eq!(terminal.gates()[0].occupant().map(|c| &**c), Some("QFA481"));
        assert!(!terminal.gates()[1].is_occupied());
        assert_eq!(terminal.encode(), encoded);
    }

    #[test]
    fn test_load_terminals_rejects_bad_data() {
        let fleet = sample_fleet();
        // unknown terminal kind
        assert!(load_terminals(reader("1\nSeaplaneTerminal:1:false:0"), &fleet).is_err());
        // terminal number below one
        assert!(load_terminals(reader("1\nAirplaneTerminal:0:false:0"), &fleet).is_err());
        // more gates than a terminal can hold
        assert!(load_terminals(reader("1\nAirplaneTerminal:1:false:7"), &fleet).is_err());
        // missing gate line
        assert!(load_terminals(reader("1\nAirplaneTerminal:1:false:1"), &fleet).is_err());
        // gate parked by an unknown callsign
        assert!(
            load_terminals(reader("1\nAirplaneTerminal:1:false:1\n1:GHOST99"), &fleet).is_err()
        );
        // trailing data after the declared terminals
        assert!(
            load_terminals(reader("1\nAirplaneTerminal:1:false:0\nextra"), &fleet).is_err()
        );
    }

    #[test]
    fn test_encode_queues_deterministic_loading_order() {
        let fleet = sample_fleet();
        let mut takeoff = TakeoffQueue::new();
        let mut landing = LandingQueue::new();
        let mut loading = HashMap::new();
        loading.insert(fleet.get("UPS119").unwrap().callsign.clone(), 2);
        loading.insert(fleet.get("QFA481").unwrap().callsign.clone(), 1);
        landing.add(fleet.get("QFA481").unwrap().callsign.clone());
        takeoff.add(fleet.get("UPS119").unwrap().callsign.clone());
        let tower = ControlTower::new(3, fleet, landing, takeoff, loading);
        assert_eq!(
            encode_queues(&tower),
            "TakeoffQueue:1\nUPS119\nLandingQueue:1\nQFA481\nLoadingAircraft:2\nQFA481:1,UPS119:2"
        );
    }

    #[test]
    fn test_queue_section_round_trip() {
        let fleet = sample_fleet();
        let mut takeoff = TakeoffQueue::new();
        takeoff.add(fleet.get("QFA481").unwrap().callsign.clone());
        takeoff.add(fleet.get("UPS119").unwrap().callsign.clone());
        let landing = LandingQueue::new();
        let tower = ControlTower::new(0, fleet, landing, takeoff, HashMap::new());

        let encoded = encode_queues(&tower);
        let mut takeoff2 = TakeoffQueue::new();
        let mut landing2 = LandingQueue::new();
        let mut loading2 = HashMap::new();
        load_queues(
            reader(&encoded),
            tower.fleet(),
            &mut takeoff2,
            &mut landing2,
            &mut loading2,
        )
        .unwrap();
        assert_eq!(
            takeoff2.in_order(tower.fleet()),
            tower.takeoff_queue().in_order(tower.fleet())
        );
    }

    #[test]
    fn test_aircraft_section_round_trip() {
        let fleet = sample_fleet();
        let encoded = encode_aircraft(&fleet);
        let reloaded = load_aircraft(reader(&encoded)).unwrap();
        assert_eq!(reloaded.len(), fleet.len());
        for aircraft in fleet.iter() {
            let copy = reloaded.get(&aircraft.callsign).unwrap();
            assert_eq!(copy.encode(), aircraft.encode());
        }
    }
}
