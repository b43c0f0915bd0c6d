use crate::aircraft::Aircraft;
use crate::control::{ControlTower, TickReport};
use crate::queues::AircraftQueue;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::{Context, Editor, Helper, Highlighter, Hinter, Validator};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tabled::settings::Style;
use tabled::Tabled;

mod aircraft;
mod control;
mod ground;
mod queues;
mod save;
mod tasks;

#[derive(Parser)]
struct Args {
    /// Path to the save directory (tick.txt, aircraft.txt, queues.txt, terminals.txt)
    #[arg(short, long, value_name = "DIR", default_value = "data/default")]
    save: PathBuf,
}

#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct CompleteHelper {
    pub commands: Vec<String>,
}

impl Completer for CompleteHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, _pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let mut candidates = Vec::new();

        for cmd in &self.commands {
            if cmd.starts_with(line) {
                candidates.push(Pair {
                    display: cmd.clone(),
                    replacement: format!("{} ", cmd),
                });
            }
        }

        Ok((0, candidates))
    }
}

fn paginate(content: String) {
    let mut pager = Command::new("less")
        .arg("-R")
        .stdin(Stdio::piped())
        .spawn()
        // Fallback to 'more' if 'less' isn't available
        .or_else(|_| Command::new("more").stdin(Stdio::piped()).spawn())
        .expect("Failed to spawn pager");

    let mut stdin = pager.stdin.take().expect("Failed to open stdin for pager");

    if let Err(e) = stdin.write_all(content.as_bytes()) {
        // Broken pipe is common if the user quits the pager early
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            eprintln!("Error writing to pager: {}", e);
        }
    }

    // Wait for the user to close the pager before returning to the ">> " prompt
    let _ = pager.wait();
}

#[derive(Tabled)]
struct FleetRow {
    #[tabled(rename = "Callsign")]
    callsign: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Fuel %")]
    fuel: String,
    #[tabled(rename = "Cargo")]
    cargo: String,
    #[tabled(rename = "Gate")]
    gate: String,
}

impl FleetRow {
    fn from_aircraft(aircraft: &Aircraft, tower: &ControlTower) -> FleetRow {
        let callsign = if aircraft.has_emergency() {
            format!("{} !", aircraft.callsign).red().bold().to_string()
        } else {
            aircraft.callsign.to_string()
        };
        FleetRow {
            callsign,
            model: aircraft.model.to_string(),
            kind: aircraft.kind().to_string(),
            task: aircraft.current_task().to_string(),
            fuel: format!("{:.0}", aircraft.fuel_percent_remaining()),
            cargo: format!("{}%", aircraft.occupancy_level()),
            gate: tower
                .find_gate_of(&aircraft.callsign)
                .map(|gate| gate.number().to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn print_tick_report(tick: u64, report: &TickReport) {
    let mut events = Vec::new();
    for callsign in &report.finished_loading {
        events.push(format!("{} finished loading", callsign));
    }
    if let Some(callsign) = &report.landed {
        events.push(format!("{} landed", callsign).green().to_string());
    }
    if let Some(callsign) = &report.took_off {
        events.push(format!("{} took off", callsign).cyan().to_string());
    }
    if events.is_empty() {
        println!("tick {}: nothing happened", tick);
    } else {
        println!("tick {}: {}", tick, events.join(", "));
    }
}

fn print_fleet(tower: &ControlTower, filter: &str) {
    let rows: Vec<FleetRow> = tower
        .fleet()
        .iter()
        .filter(|a| match filter {
            "land" | "takeoff" | "load" | "wait" | "away" => {
                a.current_task().task_type().name().eq_ignore_ascii_case(filter)
            }
            "emergency" => a.has_emergency(),
            _ => true,
        })
        .map(|a| FleetRow::from_aircraft(a, tower))
        .collect();
    if rows.is_empty() {
        println!("No matching aircraft.");
        return;
    }
    let count = rows.len();
    let mut table = tabled::Table::new(rows);
    table.with(Style::rounded());
    table.with(tabled::settings::Alignment::left());
    if count > 20 {
        paginate(table.to_string());
    } else {
        println!("{}", table);
    }
}

fn print_queues(tower: &ControlTower) {
    println!("{}", tower.landing_queue().render(tower.fleet()));
    println!("{}", tower.takeoff_queue().render(tower.fleet()));
    let mut loading: Vec<(String, u32)> = tower
        .loading()
        .iter()
        .map(|(callsign, ticks)| (callsign.to_string(), *ticks))
        .collect();
    loading.sort();
    let rendered = loading
        .iter()
        .map(|(callsign, ticks)| format!("{} ({} ticks)", callsign, ticks))
        .collect::<Vec<String>>()
        .join(", ");
    println!("LoadingAircraft [{}]", rendered);
}

fn print_terminals(tower: &ControlTower) {
    if tower.terminals().is_empty() {
        println!("No terminals registered.");
        return;
    }
    for terminal in tower.terminals() {
        let header = if terminal.has_emergency() {
            terminal.to_string().red().bold().to_string()
        } else {
            terminal.to_string()
        };
        println!("{} - {}% occupied", header, terminal.occupancy_level());
        for gate in terminal.gates() {
            println!("  {}", gate);
        }
    }
}

/// Flips the emergency state of an aircraft (by callsign) or a terminal
/// (by number).
fn set_emergency(tower: &mut ControlTower, id: &str, active: bool) {
    if let Ok(number) = id.parse::<u32>() {
        match tower.terminal_mut(number) {
            Some(terminal) => {
                if active {
                    terminal.declare_emergency();
                } else {
                    terminal.clear_emergency();
                }
                println!("{}", terminal);
            }
            None => println!("No terminal numbered {}.", number),
        }
        return;
    }
    match tower.fleet_mut().get_mut(id) {
        Some(aircraft) => {
            if active {
                aircraft.declare_emergency();
            } else {
                aircraft.clear_emergency();
            }
            println!("{}", aircraft);
        }
        None => println!("No aircraft with callsign {}.", id),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut tower = save::load_control_tower(&args.save)?;
    println!(
        "Tower online from {}. {}",
        args.save.display(),
        tower
    );

    let config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();

    let helper = CompleteHelper {
        commands: vec![
            "tick".to_string(),
            "tower".to_string(),
            "fleet".to_string(),
            "queues".to_string(),
            "terminals".to_string(),
            "admit".to_string(),
            "mayday".to_string(),
            "all-clear".to_string(),
            "save".to_string(),
            "help".to_string(),
            "exit".to_string(),
        ],
    };

    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));

    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() { continue; }

                rl.add_history_entry(trimmed)?;

                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                match parts[0] {
                    "tick" => {
                        let n = parts.get(1).and_then(|s| s.parse::<u64>().ok()).unwrap_or(1);
                        for _ in 0..n {
                            let at = tower.ticks_elapsed();
                            let report = tower.tick();
                            print_tick_report(at, &report);
                        }
                    },
                    "tower" => println!("{}", tower),
                    "fleet" => {
                        let filter = parts.get(1).copied().unwrap_or("all");
                        print_fleet(&tower, filter);
                    },
                    "queues" => print_queues(&tower),
                    "terminals" => print_terminals(&tower),
                    "admit" => {
                        if let Some(encoded) = parts.get(1) {
                            match save::read_aircraft(encoded) {
                                Ok(aircraft) => {
                                    let callsign = aircraft.callsign.clone();
                                    match tower.add_aircraft(aircraft) {
                                        Ok(()) => println!("Admitted {}.", callsign),
                                        Err(e) => println!("{}", e.to_string().red()),
                                    }
                                }
                                Err(e) => println!("Could not decode aircraft: {}", e),
                            }
                        } else {
                            println!("Usage: admit <callsign:MODEL:taskList:fuel:emergency:cargo>");
                        }
                    },
                    "mayday" => {
                        if let Some(id) = parts.get(1) {
                            set_emergency(&mut tower, id, true);
                        } else {
                            println!("Usage: mayday <callsign|terminal#>");
                        }
                    },
                    "all-clear" => {
                        if let Some(id) = parts.get(1) {
                            set_emergency(&mut tower, id, false);
                        } else {
                            println!("Usage: all-clear <callsign|terminal#>");
                        }
                    },
                    "save" => {
                        let dir = parts.get(1).map(PathBuf::from).unwrap_or_else(|| args.save.clone());
                        match save::save_control_tower(&tower, &dir) {
                            Ok(()) => println!("Saved to {}.", dir.display()),
                            Err(e) => println!("Save failed: {}", e),
                        }
                    },
                    "help" | "?" => {
                        println!("\nAvailable Commands:");
                        println!("  tick [n]            - Advance the simulation by n ticks (default 1)");
                        println!("  tower               - One-line tower summary");
                        println!("  fleet [filter]      - List aircraft; filter: land, takeoff, load, wait, away, emergency");
                        println!("  queues              - Show the landing/takeoff queues and loading aircraft");
                        println!("  terminals           - Show terminals with their gates");
                        println!("  admit <encoded>     - Admit an aircraft, e.g. admit ABC123:AIRBUS_A320:AWAY,LAND,WAIT,LOAD@60,TAKEOFF:10000:false:0");
                        println!("  mayday <id>         - Declare an emergency on an aircraft or terminal");
                        println!("  all-clear <id>      - Clear an emergency on an aircraft or terminal");
                        println!("  save [dir]          - Write the save files (default: the loaded directory)");
                        println!("  help / ?            - Show this help menu");
                        println!("  exit / quit         - Exit the simulator\n");
                    },
                    "exit" | "quit" => break,
                    _ => println!("Unknown command: {}", parts[0]),
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            },
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            },
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
