use crate::balloon::controller::MatchController;
use crate::balloon::moves::TurnStamp;
use crate::core::transport::{Inbound, Transport};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Requests from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalCommand {
    Pump(f32),
    Quit,
}

/// Tracks the room's delivery sequence, which starts at 1.
#[derive(Debug)]
pub struct SeqTracker {
    next: u64,
}

impl Default for SeqTracker {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SeqTracker {
    /// Records `seq` and returns the expected number when it skips ahead or
    /// goes back.
    pub fn observe(&mut self, seq: u64) -> Option<u64> {
        let expected = self.next;
        self.next = seq + 1;
        (seq != expected).then_some(expected)
    }
}

struct TurnTimer {
    stamp: TurnStamp,
    deadline: Option<Instant>,
}

/// Drives one participant: room deliveries, local commands and the optional
/// turn timer, one event at a time.
pub struct Engine<T: Transport> {
    controller: MatchController<T>,
    inbox: mpsc::UnboundedReceiver<Inbound>,
    turn_timeout: Option<Duration>,
}

impl<T: Transport> Engine<T> {
    pub fn new(
        controller: MatchController<T>,
        inbox: mpsc::UnboundedReceiver<Inbound>,
        turn_timeout: Option<Duration>,
    ) -> Self {
        Self { controller, inbox, turn_timeout }
    }

    pub fn controller_mut(&mut self) -> &mut MatchController<T> {
        &mut self.controller
    }

    /// Runs until the presentation quits or the room goes away, then hands
    /// the controller back.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<LocalCommand>) -> Result<MatchController<T>> {
        if let Err(e) = self.controller.start() {
            warn!(error = %e, "could not announce capacity");
        }

        let mut sequence = SeqTracker::default();
        let mut timer: Option<TurnTimer> = None;

        loop {
            self.arm_timer(&mut timer);
            let deadline = timer.as_ref().and_then(|t| t.deadline);

            tokio::select! {
                inbound = self.inbox.recv() => match inbound {
                    Some(Inbound::Deliver { seq, sender, payload }) => {
                        if let Some(expected) = sequence.observe(seq) {
                            warn!(expected, got = seq, "gap in room sequence");
                        }
                        self.controller.on_transport_message(sender, &payload);
                    }
                    Some(Inbound::Left { actor }) => {
                        // The controller logs and notifies; there is no recovery.
                        let _ = self.controller.on_participant_left(actor);
                    }
                    None => {
                        info!("room closed");
                        break;
                    }
                },

                command = commands.recv() => match command {
                    Some(LocalCommand::Pump(amount)) => {
                        if let Err(e) = self.controller.local_pump(amount) {
                            warn!(amount, error = %e, "pump rejected");
                        }
                    }
                    Some(LocalCommand::Quit) | None => break,
                },

                _ = wait_until(deadline) => {
                    if let Some(t) = timer.as_mut() {
                        t.deadline = None;
                    }
                    if let Err(e) = self.controller.on_turn_timer_expired() {
                        warn!(error = %e, "forced pump failed");
                    }
                }
            }
        }

        Ok(self.controller)
    }

    fn arm_timer(&self, timer: &mut Option<TurnTimer>) {
        let Some(timeout) = self.turn_timeout else { return };
        if !self.controller.is_local_turn() {
            *timer = None;
            return;
        }
        let stamp = self.controller.turns().expected_stamp();
        if timer.as_ref().map(|t| t.stamp) != Some(stamp) {
            *timer = Some(TurnTimer {
                stamp,
                deadline: Some(Instant::now() + timeout),
            });
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
