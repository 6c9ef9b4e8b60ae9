use crate::balloon::decision::{decide, Outcome};
use crate::balloon::error::MatchError;
use crate::balloon::moves::{Move, TurnStamp};
use crate::balloon::state::{ActorId, MatchState, Phase, Roster};
use tracing::{debug, info, warn};

/// One observable change produced by applying a move.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    CapacitySet { capacity: f32 },
    Pumped { by: ActorId, amount: f32, accumulated: f32, ratio: f32 },
    Cracked { by: ActorId, accumulated: f32 },
    RoundCompleted { turn: u32 },
    TurnChanged { active: ActorId, turn: TurnStamp },
}

pub type StateDelta = Vec<Transition>;

/// Owns the turn lifecycle: who may move, when the pointer rotates and when
/// a round is over.
#[derive(Debug, Clone)]
pub struct TurnCoordinator {
    seats: Vec<ActorId>,
    authority: Option<ActorId>,
    state: MatchState,
    finished: usize,
}

impl TurnCoordinator {
    pub fn new(roster: &Roster) -> Self {
        Self {
            seats: roster.seats(),
            authority: roster.authority(),
            state: MatchState::new(),
            finished: 0,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn seats(&self) -> &[ActorId] {
        &self.seats
    }

    pub fn active_participant(&self) -> Option<ActorId> {
        self.seats.get(self.state.active_index).copied()
    }

    /// Stamp a pump must carry to be accepted right now.
    pub fn expected_stamp(&self) -> TurnStamp {
        TurnStamp {
            round: self.state.turn_number,
            seat: self.state.active_index,
        }
    }

    /// Number of participants that already pumped in the current round.
    pub fn finished_this_round(&self) -> usize {
        self.finished
    }

    pub fn apply(&mut self, sender: ActorId, mv: Move) -> Result<StateDelta, MatchError> {
        match (self.phase(), mv) {
            (Phase::Terminal, _) => {
                debug!(%sender, kind = mv.kind(), "match is over, ignoring move");
                Err(MatchError::NotAccepting { phase: Phase::Terminal })
            }
            (Phase::AwaitingCapacity, Move::SetCapacity { capacity }) => {
                self.set_capacity(sender, capacity)
            }
            (_, Move::SetCapacity { .. }) => Err(MatchError::UnexpectedCapacity { sender }),
            (phase @ Phase::AwaitingCapacity, _) => Err(MatchError::NotAccepting { phase }),
            (Phase::RoundActive, Move::Pump { turn, amount }) => {
                self.pump(sender, turn, amount, Outcome::Survive)
            }
            (Phase::RoundActive, Move::Crack { turn, amount }) => {
                self.pump(sender, turn, amount, Outcome::Crack)
            }
        }
    }

    fn set_capacity(&mut self, sender: ActorId, capacity: f32) -> Result<StateDelta, MatchError> {
        if self.authority != Some(sender) {
            return Err(MatchError::UnexpectedCapacity { sender });
        }
        if self.seats.is_empty() {
            return Err(MatchError::NotAccepting { phase: self.phase() });
        }

        self.state.capacity = Some(capacity);
        self.state.accumulated = 0.0;
        self.state.active_index = 0;
        self.state.turn_number = 1;
        self.finished = 0;
        info!(capacity, "capacity set, first round begins");

        Ok(vec![
            Transition::CapacitySet { capacity },
            Transition::TurnChanged {
                active: self.seats[0],
                turn: self.expected_stamp(),
            },
        ])
    }

    fn pump(
        &mut self,
        sender: ActorId,
        turn: TurnStamp,
        amount: f32,
        predicted: Outcome,
    ) -> Result<StateDelta, MatchError> {
        let expected = self.expected_stamp();
        if self.active_participant() != Some(sender) || turn != expected {
            return Err(MatchError::OutOfOrderMove { sender, expected, got: turn });
        }
        let Some(capacity) = self.state.capacity else {
            return Err(MatchError::NotAccepting { phase: self.phase() });
        };

        let decision = decide(self.state.accumulated, capacity, amount);
        if decision.outcome != predicted {
            warn!(%sender, ?predicted, actual = ?decision.outcome, "sender predicted a different outcome");
        }
        self.state.accumulated = decision.accumulated;

        if decision.outcome == Outcome::Crack {
            self.state.terminal = true;
            self.state.cracked_by = Some(sender);
            info!(%sender, accumulated = decision.accumulated, capacity, "balloon cracked");
            return Ok(vec![Transition::Cracked {
                by: sender,
                accumulated: decision.accumulated,
            }]);
        }

        let ratio = self.state.capacity_ratio();
        info!(%sender, amount, accumulated = decision.accumulated, ratio, "balloon survived");
        let mut delta = vec![Transition::Pumped {
            by: sender,
            amount,
            accumulated: decision.accumulated,
            ratio,
        }];
        self.advance(&mut delta);
        Ok(delta)
    }

    fn advance(&mut self, delta: &mut StateDelta) {
        self.finished += 1;
        self.state.active_index = (self.state.active_index + 1) % self.seats.len();

        if self.state.active_index == 0 {
            let completed = self.state.turn_number;
            debug!(turn = completed, finished = self.finished, "round completed by all");
            self.state.turn_number += 1;
            self.finished = 0;
            delta.push(Transition::RoundCompleted { turn: completed });
        }

        let active = self.seats[self.state.active_index];
        debug!(%active, turn = self.state.turn_number, "active participant changed");
        delta.push(Transition::TurnChanged {
            active,
            turn: self.expected_stamp(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balloon::state::Participant;

    const A: ActorId = ActorId(1);
    const B: ActorId = ActorId(2);
    const C: ActorId = ActorId(3);

    fn coordinator(count: u32) -> TurnCoordinator {
        let participants = (1..=count)
            .map(|n| Participant {
                id: ActorId(n),
                name: format!("p{n}"),
                is_authority: n == 1,
            })
            .collect();
        TurnCoordinator::new(&Roster::new(participants, A))
    }

    fn started(count: u32, capacity: f32) -> TurnCoordinator {
        let mut turns = coordinator(count);
        turns.apply(A, Move::SetCapacity { capacity }).unwrap();
        turns
    }

    fn pump(turns: &mut TurnCoordinator, sender: ActorId, amount: f32) -> Result<StateDelta, MatchError> {
        let turn = turns.expected_stamp();
        turns.apply(sender, Move::Pump { turn, amount })
    }

    #[test]
    fn capacity_starts_the_first_round() {
        let mut turns = coordinator(2);
        let delta = turns.apply(A, Move::SetCapacity { capacity: 110.0 }).unwrap();

        assert_eq!(
            delta,
            vec![
                Transition::CapacitySet { capacity: 110.0 },
                Transition::TurnChanged { active: A, turn: TurnStamp { round: 1, seat: 0 } },
            ]
        );
        assert_eq!(turns.phase(), Phase::RoundActive);
        assert_eq!(turns.state().accumulated, 0.0);
    }

    #[test]
    fn pumps_wait_for_capacity() {
        let mut turns = coordinator(2);
        let err = pump(&mut turns, A, 10.0).unwrap_err();
        assert!(matches!(err, MatchError::NotAccepting { phase: Phase::AwaitingCapacity }));
    }

    #[test]
    fn capacity_only_from_authority_and_only_once() {
        let mut turns = coordinator(2);
        let err = turns.apply(B, Move::SetCapacity { capacity: 1.0 }).unwrap_err();
        assert!(matches!(err, MatchError::UnexpectedCapacity { sender: B }));

        turns.apply(A, Move::SetCapacity { capacity: 100.0 }).unwrap();
        let err = turns.apply(A, Move::SetCapacity { capacity: 5.0 }).unwrap_err();
        assert!(matches!(err, MatchError::UnexpectedCapacity { sender: A }));
        assert_eq!(turns.state().capacity, Some(100.0));
    }

    #[test]
    fn three_survivals_complete_a_round() {
        let mut turns = started(3, 1000.0);
        assert_eq!(turns.state().turn_number, 1);

        pump(&mut turns, A, 1.0).unwrap();
        assert_eq!(turns.active_participant(), Some(B));
        assert_eq!(turns.finished_this_round(), 1);
        pump(&mut turns, B, 1.0).unwrap();
        assert_eq!(turns.active_participant(), Some(C));
        let delta = pump(&mut turns, C, 1.0).unwrap();

        assert_eq!(turns.state().active_index, 0);
        assert_eq!(turns.state().turn_number, 2);
        assert_eq!(turns.finished_this_round(), 0);
        assert!(delta.contains(&Transition::RoundCompleted { turn: 1 }));
        assert_eq!(
            delta.last(),
            Some(&Transition::TurnChanged { active: A, turn: TurnStamp { round: 2, seat: 0 } })
        );
    }

    #[test]
    fn wrong_sender_is_out_of_order() {
        let mut turns = started(2, 100.0);
        let err = pump(&mut turns, B, 10.0).unwrap_err();
        assert!(matches!(err, MatchError::OutOfOrderMove { sender: B, .. }));
        assert_eq!(turns.state().accumulated, 0.0);
    }

    #[test]
    fn duplicate_delivery_is_out_of_order() {
        let mut turns = started(2, 100.0);
        let stale = Move::Pump { turn: turns.expected_stamp(), amount: 10.0 };
        turns.apply(A, stale).unwrap();

        // Same move delivered twice: wrong seat now.
        assert!(matches!(
            turns.apply(A, stale),
            Err(MatchError::OutOfOrderMove { .. })
        ));

        // Right sender, stale round.
        let err = turns
            .apply(B, Move::Pump { turn: TurnStamp { round: 0, seat: 1 }, amount: 1.0 })
            .unwrap_err();
        match err {
            MatchError::OutOfOrderMove { expected, got, .. } => {
                assert_eq!(expected, TurnStamp { round: 1, seat: 1 });
                assert_eq!(got, TurnStamp { round: 0, seat: 1 });
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(turns.state().accumulated, 10.0);
    }

    #[test]
    fn crack_is_absorbing() {
        let mut turns = started(2, 100.0);
        pump(&mut turns, A, 40.0).unwrap();
        let delta = pump(&mut turns, B, 65.0).unwrap();

        assert_eq!(delta, vec![Transition::Cracked { by: B, accumulated: 105.0 }]);
        assert_eq!(turns.phase(), Phase::Terminal);
        assert_eq!(turns.state().cracked_by, Some(B));

        let before = turns.state().clone();
        for sender in [A, B] {
            assert!(matches!(
                pump(&mut turns, sender, 1.0),
                Err(MatchError::NotAccepting { phase: Phase::Terminal })
            ));
        }
        assert_eq!(turns.state(), &before);
    }

    #[test]
    fn receivers_trust_their_own_verdict_over_the_move_kind() {
        let mut turns = started(2, 100.0);

        // Announced as a crack but lands under capacity.
        let turn = turns.expected_stamp();
        let delta = turns.apply(A, Move::Crack { turn, amount: 10.0 }).unwrap();
        assert!(matches!(delta[0], Transition::Pumped { by: A, .. }));
        assert_eq!(turns.phase(), Phase::RoundActive);

        // Announced as a pump but goes over.
        let turn = turns.expected_stamp();
        let delta = turns.apply(B, Move::Pump { turn, amount: 95.0 }).unwrap();
        assert_eq!(delta, vec![Transition::Cracked { by: B, accumulated: 105.0 }]);
    }

    #[test]
    fn single_participant_rotates_onto_itself() {
        let mut turns = started(1, 100.0);
        pump(&mut turns, A, 10.0).unwrap();
        pump(&mut turns, A, 10.0).unwrap();
        assert_eq!(turns.active_participant(), Some(A));
        assert_eq!(turns.state().turn_number, 3);
    }
}
