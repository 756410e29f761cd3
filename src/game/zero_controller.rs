//! Zero controller for testing and automation
//!
//! Always takes the first offered action that isn't a pass, and passes when
//! nothing else is left. Games driven by two of these are fully
//! deterministic for a given seed.

use crate::game::actor::PriorityRequest;
use crate::game::controller::PlayerController;
use crate::game::PlayerAction;

/// A controller that always chooses the first meaningful action
#[derive(Debug, Default)]
pub struct ZeroController;

impl ZeroController {
    pub fn new() -> Self {
        ZeroController
    }
}

impl PlayerController for ZeroController {
    fn choose_action(&mut self, request: &PriorityRequest) -> PlayerAction {
        request
            .available_actions
            .iter()
            .find(|a| !a.is_pass())
            .copied()
            .unwrap_or_else(PlayerAction::pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardId, PlayerId};
    use crate::game::Phase;

    fn request(actions: Vec<PlayerAction>) -> PriorityRequest {
        PriorityRequest {
            player: PlayerId::new(0),
            turn_number: 1,
            phase: Phase::Main1,
            combat_step: None,
            life: 20,
            stack: Vec::new(),
            descriptions: actions.iter().map(|a| a.to_string()).collect(),
            available_actions: actions,
        }
    }

    #[test]
    fn test_takes_first_non_pass() {
        let mut zero = ZeroController::new();
        let land = PlayerAction::play_land(CardId::new(4));
        let cast = PlayerAction::cast(CardId::new(5), None);
        let choice = zero.choose_action(&request(vec![land, cast, PlayerAction::pass()]));
        assert_eq!(choice, land);
    }

    #[test]
    fn test_passes_when_nothing_else() {
        let mut zero = ZeroController::new();
        assert!(zero.choose_action(&request(vec![PlayerAction::pass()])).is_pass());
        assert!(zero.choose_action(&request(Vec::new())).is_pass());
    }
}
