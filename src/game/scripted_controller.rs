//! Scripted player controller for tests
//!
//! Plays a predetermined queue of actions, then passes forever.

use crate::game::actor::PriorityRequest;
use crate::game::controller::PlayerController;
use crate::game::PlayerAction;
use std::collections::VecDeque;

/// A controller that follows a predetermined sequence of actions
#[derive(Debug, Default)]
pub struct ScriptedController {
    script: VecDeque<PlayerAction>,
}

impl ScriptedController {
    pub fn new(actions: impl IntoIterator<Item = PlayerAction>) -> Self {
        ScriptedController {
            script: actions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl PlayerController for ScriptedController {
    fn choose_action(&mut self, _request: &PriorityRequest) -> PlayerAction {
        self.script.pop_front().unwrap_or_else(PlayerAction::pass)
    }
}
