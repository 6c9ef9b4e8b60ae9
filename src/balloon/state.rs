use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport-assigned participant number, unique within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ActorId,
    pub name: String,
    pub is_authority: bool,
}

/// Room membership as reported by the transport once the room is full.
///
/// `participants` is in turn order and contains exactly one authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub participants: Vec<Participant>,
    pub local: ActorId,
}

impl Roster {
    pub fn new(participants: Vec<Participant>, local: ActorId) -> Self {
        Self { participants, local }
    }

    pub fn authority(&self) -> Option<ActorId> {
        self.participants.iter().find(|p| p.is_authority).map(|p| p.id)
    }

    pub fn is_local_authority(&self) -> bool {
        self.authority() == Some(self.local)
    }

    pub fn seats(&self) -> Vec<ActorId> {
        self.participants.iter().map(|p| p.id).collect()
    }

    pub fn name_of(&self, actor: ActorId) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.id == actor)
            .map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingCapacity,
    RoundActive,
    Terminal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::AwaitingCapacity => "awaiting capacity",
            Phase::RoundActive => "round active",
            Phase::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Per-participant replica of the match. Only mutated by applying moves.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub capacity: Option<f32>,
    pub accumulated: f32,
    pub active_index: usize,
    pub turn_number: u32,
    pub terminal: bool,
    pub cracked_by: Option<ActorId>,
}

impl MatchState {
    pub fn new() -> Self {
        Self {
            capacity: None,
            accumulated: 0.0,
            active_index: 0,
            turn_number: 0,
            terminal: false,
            cracked_by: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.terminal {
            Phase::Terminal
        } else if self.capacity.is_none() {
            Phase::AwaitingCapacity
        } else {
            Phase::RoundActive
        }
    }

    /// Fraction of capacity used so far, 0.0 before capacity is known.
    pub fn capacity_ratio(&self) -> f32 {
        match self.capacity {
            Some(capacity) if capacity > 0.0 => self.accumulated / capacity,
            _ => 0.0,
        }
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}
