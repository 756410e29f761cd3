//! Random AI controller for testing and baseline gameplay
//!
//! Makes uniformly random choices among the offered actions, passing
//! included. Seeded, so a game between two random controllers replays
//! exactly.

use crate::game::actor::PriorityRequest;
use crate::game::controller::PlayerController;
use crate::game::PlayerAction;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

/// A controller that makes random choices
#[derive(Debug)]
pub struct RandomController {
    rng: ChaCha12Rng,
}

impl RandomController {
    /// Create a random controller with a seeded RNG (for deterministic testing)
    pub fn with_seed(seed: u64) -> Self {
        RandomController {
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerController for RandomController {
    fn choose_action(&mut self, request: &PriorityRequest) -> PlayerAction {
        if request.available_actions.is_empty() {
            return PlayerAction::pass();
        }
        let index = self.rng.gen_range(0..request.available_actions.len());
        request.available_actions[index]
    }
}
