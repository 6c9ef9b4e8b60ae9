pub mod core {
	pub mod engine;
	pub mod lobby;
	pub mod loopback;
	pub mod network;
	pub mod transport;
}

pub mod balloon;
pub mod cli;
pub mod config;
pub mod console;

// Re-export for convenience
pub use crate::balloon::{MatchController, MatchEvent};
pub use crate::core::transport::Transport;
