use crate::balloon::moves::Move;
use rand::Rng;
use tracing::{debug, info};

/// Picks the random capacity on the authority participant and makes sure it
/// is announced only once per match.
#[derive(Debug, Clone)]
pub struct AuthorityInitializer {
    min_capacity: f32,
    max_capacity: f32,
    announced: bool,
}

impl AuthorityInitializer {
    pub fn new(min_capacity: f32, max_capacity: f32) -> Self {
        Self { min_capacity, max_capacity, announced: false }
    }

    pub fn announced(&self) -> bool {
        self.announced
    }

    /// Draws uniformly from `[min_capacity, max_capacity]`.
    pub fn draw_capacity<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.min_capacity >= self.max_capacity {
            return self.min_capacity;
        }
        rng.random_range(self.min_capacity..=self.max_capacity)
    }

    /// Returns the `SetCapacity` move to broadcast, or `None` when this
    /// participant is not the authority or the move already went out.
    pub fn initialize<R: Rng>(&mut self, is_authority: bool, rng: &mut R) -> Option<Move> {
        if !is_authority {
            debug!("not the authority, waiting for capacity");
            return None;
        }
        if self.announced {
            debug!("capacity already announced");
            return None;
        }
        let capacity = self.draw_capacity(rng);
        self.announced = true;
        info!(capacity, "authority drew balloon capacity");
        Some(Move::SetCapacity { capacity })
    }
}
