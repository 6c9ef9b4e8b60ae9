//! The crack/survive rule. Pure so every participant reaches the same verdict.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Survive,
    Crack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub accumulated: f32,
    pub outcome: Outcome,
}

/// Adds `pump` to `accumulated` and cracks only when the total strictly
/// exceeds `capacity`. A pump landing exactly on capacity survives.
pub fn decide(accumulated: f32, capacity: f32, pump: f32) -> Decision {
    let accumulated = accumulated + pump;
    let outcome = if accumulated > capacity {
        Outcome::Crack
    } else {
        Outcome::Survive
    };
    Decision { accumulated, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_capacity_survives() {
        let d = decide(0.0, 100.0, 100.0);
        assert_eq!(d.outcome, Outcome::Survive);
        assert_eq!(d.accumulated, 100.0);
    }

    #[test]
    fn just_over_capacity_cracks() {
        assert_eq!(decide(0.0, 100.0, 100.0001).outcome, Outcome::Crack);
    }

    #[test]
    fn accumulates_across_pumps() {
        let first = decide(0.0, 100.0, 40.0);
        assert_eq!(first.outcome, Outcome::Survive);
        let second = decide(first.accumulated, 100.0, 65.0);
        assert_eq!(second.outcome, Outcome::Crack);
        assert_eq!(second.accumulated, 105.0);
    }

    proptest! {
        #[test]
        fn same_inputs_same_verdict(
            acc in 0.0f32..500.0,
            cap in 0.0f32..500.0,
            pump in 0.0f32..100.0,
        ) {
            prop_assert_eq!(decide(acc, cap, pump), decide(acc, cap, pump));
        }
    }
}
