/// In-process room: several transports sharing one ordered queue
use crate::balloon::error::TransportError;
use crate::balloon::state::{ActorId, Participant, Roster};
use crate::core::transport::{Inbound, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Sequencer {
    next_seq: u64,
    pending: VecDeque<Inbound>,
}

/// A room whose participants all live in this process.
///
/// Broadcasts are stamped in call order, which gives the same total order
/// the networked host provides.
#[derive(Debug, Clone)]
pub struct LoopbackRoom {
    participants: Vec<Participant>,
    queue: Arc<Mutex<Sequencer>>,
}

impl LoopbackRoom {
    /// Actors are numbered from 1; actor 1 is the authority.
    pub fn new(count: u32) -> Self {
        let participants = (1..=count)
            .map(|n| Participant {
                id: ActorId(n),
                name: format!("player-{n}"),
                is_authority: n == 1,
            })
            .collect();
        Self { participants, queue: Arc::default() }
    }

    pub fn transport(&self, local: ActorId) -> LoopbackTransport {
        LoopbackTransport {
            roster: Roster::new(self.participants.clone(), local),
            queue: Arc::clone(&self.queue),
        }
    }

    /// Removes and returns everything broadcast so far, in room order.
    pub fn drain(&self) -> Vec<Inbound> {
        match self.queue.lock() {
            Ok(mut queue) => queue.pending.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn leave(&self, actor: ActorId) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.pending.push_back(Inbound::Left { actor });
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    roster: Roster,
    queue: Arc<Mutex<Sequencer>>,
}

impl Transport for LoopbackTransport {
    fn roster(&self) -> &Roster {
        &self.roster
    }

    fn broadcast(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        let mut queue = self.queue.lock().map_err(|_| TransportError::Closed)?;
        queue.next_seq += 1;
        let seq = queue.next_seq;
        queue.pending.push_back(Inbound::Deliver {
            seq,
            sender: self.roster.local,
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcasts_are_sequenced_across_transports() {
        let room = LoopbackRoom::new(2);
        let a = room.transport(ActorId(1));
        let b = room.transport(ActorId(2));
        assert!(a.roster().is_local_authority());
        assert!(!b.roster().is_local_authority());

        b.broadcast(vec![2]).unwrap();
        a.broadcast(vec![1]).unwrap();
        room.leave(ActorId(2));

        assert_eq!(
            room.drain(),
            vec![
                Inbound::Deliver { seq: 1, sender: ActorId(2), payload: vec![2] },
                Inbound::Deliver { seq: 2, sender: ActorId(1), payload: vec![1] },
                Inbound::Left { actor: ActorId(2) },
            ]
        );
        assert!(room.drain().is_empty());
    }
}
