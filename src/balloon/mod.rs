//! Balloon match: players take turns pumping a shared balloon until one of
//! them pushes it past its hidden capacity.

pub mod authority;
pub mod controller;
pub mod decision;
pub mod error;
pub mod gauge;
pub mod moves;
pub mod state;
pub mod turn;

pub use controller::{MatchController, MatchEvent};
pub use error::{MatchError, TransportError};
pub use moves::{Move, TurnStamp, WireFormat};
pub use state::{ActorId, MatchState, Participant, Phase, Roster};
