//! Player controller trait
//!
//! A controller is the decision-making half of an actor. It sees only the
//! `PriorityRequest` snapshot and answers with one of the offered actions.
//! `spawn_controller` runs it on its own thread, connected to the engine
//! through an `ActorHandle`.

use crate::game::actor::{ActorHandle, PriorityRequest};
use crate::game::PlayerAction;
use std::thread::{self, JoinHandle};

/// Player controller trait
///
/// Implement this trait to create AI players or connect to UI.
pub trait PlayerController: Send {
    /// Pick one action for this request
    ///
    /// Returning an action that was not offered wastes the turn's request:
    /// the engine logs it and asks again.
    fn choose_action(&mut self, request: &PriorityRequest) -> PlayerAction;

    /// Called once when the engine closes the channels
    fn on_game_end(&mut self) {}
}

/// Run `controller` on a new thread until the engine hangs up
pub fn spawn_controller<C>(handle: ActorHandle, mut controller: C) -> JoinHandle<()>
where
    C: PlayerController + 'static,
{
    thread::spawn(move || {
        while let Some(request) = handle.next_request() {
            let action = controller.choose_action(&request);
            if handle.send(action).is_err() {
                break;
            }
        }
        controller.on_game_end();
    })
}
