use crate::balloon::authority::AuthorityInitializer;
use crate::balloon::decision::{decide, Outcome};
use crate::balloon::error::MatchError;
use crate::balloon::moves::{Move, WireFormat};
use crate::balloon::state::{ActorId, MatchState, Phase, Roster};
use crate::balloon::turn::{StateDelta, Transition, TurnCoordinator};
use crate::config::MatchConfig;
use crate::core::transport::Transport;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    CapacityKnown { capacity: f32 },
    Pumped { ratio: f32 },
    Cracked { by: ActorId },
    TurnChanged { active: ActorId, is_local: bool },
    /// The authority left before announcing capacity; the match cannot start.
    Stalled { authority: ActorId },
}

/// Glues transport, codec and turn coordinator together for one participant.
///
/// Every state change goes through [`MatchController::on_transport_message`],
/// including the effects of moves this participant sent itself.
pub struct MatchController<T: Transport> {
    transport: T,
    wire: WireFormat,
    timeout_pump: f32,
    turns: TurnCoordinator,
    authority: AuthorityInitializer,
    in_flight: bool,
    subscribers: Vec<mpsc::UnboundedSender<MatchEvent>>,
}

impl<T: Transport> MatchController<T> {
    pub fn new(transport: T, config: &MatchConfig) -> Self {
        let turns = TurnCoordinator::new(transport.roster());
        Self {
            transport,
            wire: config.wire_format,
            timeout_pump: config.timeout_pump,
            turns,
            authority: AuthorityInitializer::new(config.min_capacity, config.max_capacity),
            in_flight: false,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<MatchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn roster(&self) -> &Roster {
        self.transport.roster()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> &MatchState {
        self.turns.state()
    }

    pub fn phase(&self) -> Phase {
        self.turns.phase()
    }

    pub fn active_participant(&self) -> Option<ActorId> {
        self.turns.active_participant()
    }

    pub fn is_local_turn(&self) -> bool {
        self.phase() == Phase::RoundActive && self.active_participant() == Some(self.roster().local)
    }

    pub fn turns(&self) -> &TurnCoordinator {
        &self.turns
    }

    /// Runs the authority's one-off initialisation. A no-op everywhere else.
    pub fn start(&mut self) -> Result<Option<Move>, MatchError> {
        let is_authority = self.roster().is_local_authority();
        let Some(mv) = self.authority.initialize(is_authority, &mut rand::rng()) else {
            return Ok(None);
        };
        self.send(&mv)?;
        Ok(Some(mv))
    }

    /// Decodes and applies one delivered payload. Malformed or rejected moves
    /// are logged and dropped.
    pub fn on_transport_message(&mut self, sender: ActorId, raw: &[u8]) {
        let mv = match self.wire.decode(raw) {
            Ok(mv) => mv,
            Err(err) => {
                warn!(%sender, error = %err, "dropping undecodable move");
                return;
            }
        };

        let is_pump = matches!(mv, Move::Pump { .. } | Move::Crack { .. });
        match self.turns.apply(sender, mv) {
            Ok(delta) => {
                if is_pump && sender == self.roster().local {
                    self.in_flight = false;
                }
                self.publish(delta);
            }
            Err(MatchError::NotAccepting { phase: Phase::Terminal }) => {}
            Err(err @ MatchError::OutOfOrderMove { .. }) => {
                error!(error = %err, "replica may have diverged, dropping move");
            }
            Err(err) => {
                warn!(%sender, kind = mv.kind(), error = %err, "rejected move");
            }
        }
    }

    /// Sends this participant's pump for the current turn.
    ///
    /// The outcome is predicted locally only to pick `Pump` or `Crack`; the
    /// state changes when the move comes back through the room.
    pub fn local_pump(&mut self, amount: f32) -> Result<Move, MatchError> {
        let phase = self.phase();
        if phase != Phase::RoundActive {
            return Err(MatchError::NotAccepting { phase });
        }
        let local = self.roster().local;
        match self.active_participant() {
            Some(active) if active != local => return Err(MatchError::NotYourTurn { active }),
            None => return Err(MatchError::NotAccepting { phase }),
            Some(_) => {}
        }
        if self.in_flight {
            return Err(MatchError::PumpInFlight);
        }
        if !amount.is_finite() {
            return Err(MatchError::InvalidAmount(amount));
        }

        let state = self.turns.state();
        let capacity = state.capacity.unwrap_or(f32::INFINITY);
        let turn = self.turns.expected_stamp();
        let mv = match decide(state.accumulated, capacity, amount).outcome {
            Outcome::Survive => Move::Pump { turn, amount },
            Outcome::Crack => Move::Crack { turn, amount },
        };

        self.send(&mv)?;
        self.in_flight = true;
        info!(amount, kind = mv.kind(), "sent local pump");
        Ok(mv)
    }

    /// Turn timer hook: forces a pump of the configured default when the
    /// local participant is still holding the turn.
    pub fn on_turn_timer_expired(&mut self) -> Result<Option<Move>, MatchError> {
        if !self.is_local_turn() || self.in_flight {
            return Ok(None);
        }
        info!(amount = self.timeout_pump, "turn timer expired, forcing pump");
        self.local_pump(self.timeout_pump).map(Some)
    }

    pub fn on_participant_left(&mut self, actor: ActorId) -> Result<(), MatchError> {
        if self.roster().authority() == Some(actor) && self.phase() == Phase::AwaitingCapacity {
            let err = MatchError::AuthorityUnavailable(actor);
            error!(error = %err, "match cannot start");
            self.emit(MatchEvent::Stalled { authority: actor });
            return Err(err);
        }
        if self.phase() == Phase::RoundActive {
            warn!(%actor, "participant left, the match stalls when their turn comes");
        } else {
            debug!(%actor, "participant left");
        }
        Ok(())
    }

    fn send(&self, mv: &Move) -> Result<(), MatchError> {
        let payload = self.wire.encode(mv)?;
        self.transport.broadcast(payload)?;
        Ok(())
    }

    fn publish(&mut self, delta: StateDelta) {
        let local = self.roster().local;
        for transition in delta {
            let event = match transition {
                Transition::CapacitySet { capacity } => MatchEvent::CapacityKnown { capacity },
                Transition::Pumped { ratio, .. } => MatchEvent::Pumped { ratio },
                Transition::Cracked { by, .. } => MatchEvent::Cracked { by },
                Transition::TurnChanged { active, .. } => MatchEvent::TurnChanged {
                    active,
                    is_local: active == local,
                },
                Transition::RoundCompleted { .. } => continue,
            };
            self.emit(event);
        }
    }

    fn emit(&mut self, event: MatchEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
