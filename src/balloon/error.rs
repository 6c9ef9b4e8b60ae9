use crate::balloon::moves::{DecodeError, EncodeError, TurnStamp};
use crate::balloon::state::{ActorId, Phase};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
}

/// Everything that can go wrong while applying or originating a move.
///
/// None of these are fatal to the process. `OutOfOrderMove` and
/// `AuthorityUnavailable` do leave the match unable to progress, since there
/// is no resynchronisation.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("not your turn, {active} is active")]
    NotYourTurn { active: ActorId },
    #[error("out-of-order move from {sender}: expected {expected:?}, got {got:?}")]
    OutOfOrderMove {
        sender: ActorId,
        expected: TurnStamp,
        got: TurnStamp,
    },
    #[error("authority {0} left before announcing capacity")]
    AuthorityUnavailable(ActorId),
    #[error("match is not accepting moves ({phase})")]
    NotAccepting { phase: Phase },
    #[error("a pump from this participant is already in flight")]
    PumpInFlight,
    #[error("unexpected capacity announcement from {sender}")]
    UnexpectedCapacity { sender: ActorId },
    #[error("pump amount {0} is not a finite number")]
    InvalidAmount(f32),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
