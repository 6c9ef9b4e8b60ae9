/// Transport seam between the match core and whatever carries moves
use crate::balloon::error::TransportError;
use crate::balloon::state::{ActorId, Roster};

/// Reliable, totally ordered broadcast to every room member, the sender
/// included. Sending never waits for delivery.
pub trait Transport {
    /// Membership fixed when the room filled up.
    fn roster(&self) -> &Roster;

    fn broadcast(&self, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// What a participant's inbox yields, already in room order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Deliver { seq: u64, sender: ActorId, payload: Vec<u8> },
    Left { actor: ActorId },
}
