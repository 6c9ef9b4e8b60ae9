//! Line-based console front end: prints match notifications and turns typed
//! lines into pump commands.

use crate::balloon::controller::MatchEvent;
use crate::balloon::gauge;
use crate::balloon::state::Roster;
use crate::core::engine::LocalCommand;
use std::io::BufRead;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum LineInput {
    /// Empty line: start the gauge, or stop it and pump its value.
    Toggle,
    Amount(f32),
    Quit,
    Unknown,
}

pub fn parse_line(line: &str) -> LineInput {
    let line = line.trim();
    if line.is_empty() {
        return LineInput::Toggle;
    }
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return LineInput::Quit;
    }
    match line.parse::<f32>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => LineInput::Amount(amount),
        _ => LineInput::Unknown,
    }
}

/// Gauge bound to the player's Enter presses.
#[derive(Debug, Clone)]
pub struct PowerGauge {
    speed: f32,
    max: f32,
    started: Option<Instant>,
}

impl PowerGauge {
    pub fn new(speed: f32, max: f32) -> Self {
        Self { speed, max, started: None }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Starts the gauge, or stops it and returns the amount it landed on.
    pub fn toggle(&mut self, now: Instant) -> Option<f32> {
        match self.started.take() {
            Some(at) => Some(self.value_after(now.saturating_duration_since(at))),
            None => {
                self.started = Some(now);
                None
            }
        }
    }

    pub fn value_after(&self, elapsed: Duration) -> f32 {
        gauge::reading(elapsed, self.speed, self.max)
    }
}

pub fn describe(event: &MatchEvent, roster: &Roster) -> String {
    let name = |actor| roster.name_of(actor).unwrap_or("?").to_string();
    match *event {
        MatchEvent::CapacityKnown { .. } => "The balloon is ready. Don't be the one to pop it!".to_string(),
        MatchEvent::Pumped { ratio } => format!("Pumped. The balloon is at {}%.", (ratio * 100.0) as i32),
        MatchEvent::Cracked { by } => format!("BANG! {} cracked the balloon. Type q to leave.", name(by)),
        MatchEvent::TurnChanged { is_local: true, .. } => {
            "Your turn: Enter starts the gauge, Enter again pumps (or type an amount).".to_string()
        }
        MatchEvent::TurnChanged { active, .. } => format!("Waiting for {}...", name(active)),
        MatchEvent::Stalled { authority } => {
            format!("{} left before the balloon was ready. Type q to leave.", name(authority))
        }
    }
}

/// Prints notifications until the controller goes away.
pub async fn print_events(mut events: mpsc::UnboundedReceiver<MatchEvent>, roster: Roster) {
    while let Some(event) = events.recv().await {
        println!("{}", describe(&event, &roster));
    }
}

/// Reads stdin on its own thread and forwards commands until the player
/// quits or stdin closes. A plain thread keeps a pending read from holding
/// the runtime open at exit.
pub fn spawn_command_reader(
    commands: mpsc::UnboundedSender<LocalCommand>,
    mut gauge: PowerGauge,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match parse_line(&line) {
                LineInput::Toggle => match gauge.toggle(Instant::now()) {
                    Some(amount) => {
                        println!("Gauge stopped at {amount:.1}");
                        LocalCommand::Pump(amount)
                    }
                    None => {
                        println!("Gauge running... press Enter to pump");
                        continue;
                    }
                },
                LineInput::Amount(amount) => LocalCommand::Pump(amount),
                LineInput::Quit => LocalCommand::Quit,
                LineInput::Unknown => {
                    println!("Enter, a number or q");
                    continue;
                }
            };
            let quit = command == LocalCommand::Quit;
            if commands.send(command).is_err() || quit {
                break;
            }
        }
    })
}
