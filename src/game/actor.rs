//! Player actor protocol
//!
//! Each player is a pair of channels. The engine posts a `PriorityRequest`
//! on the waiting channel (capacity one, a stale request is replaced) and then
//! blocks on the input channel until the actor answers with a `PlayerAction`.
//! Only one actor is ever waited on at a time.

use crate::core::PlayerId;
use crate::game::{CombatStep, GameState, Phase, PlayerAction};
use crate::{MtgError, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who is behind a channel pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    /// Waited on without a deadline (unless an idle timeout is configured);
    /// disconnecting is an error
    Human,
    /// Waited on for `ai_timeout`; silence or disconnect counts as a pass
    Ai,
}

/// Snapshot sent to an actor when it must decide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityRequest {
    pub player: PlayerId,
    pub turn_number: u32,
    pub phase: Phase,
    pub combat_step: Option<CombatStep>,
    pub life: i32,
    /// Stack contents, top first, as readable names
    pub stack: Vec<String>,
    pub available_actions: Vec<PlayerAction>,
    /// One readable line per entry of `available_actions`
    pub descriptions: Vec<String>,
}

/// Engine side of a player's channels
#[derive(Debug, Clone)]
pub struct ActorEndpoint {
    pub kind: ActorKind,
    input_rx: Receiver<PlayerAction>,
    waiting_tx: Sender<PriorityRequest>,
    /// Kept so a stale request can be pulled back out before replacing it
    waiting_rx: Receiver<PriorityRequest>,
}

/// Actor side of a player's channels
#[derive(Debug)]
pub struct ActorHandle {
    pub player: PlayerId,
    pub kind: ActorKind,
    input_tx: Sender<PlayerAction>,
    waiting_rx: Receiver<PriorityRequest>,
}

/// Create a connected endpoint/handle pair
///
/// `buffer` bounds the input queue.
pub fn actor_channel(player: PlayerId, kind: ActorKind, buffer: usize) -> (ActorEndpoint, ActorHandle) {
    let (input_tx, input_rx) = channel::bounded(buffer.max(1));
    let (waiting_tx, waiting_rx) = channel::bounded(1);
    (
        ActorEndpoint {
            kind,
            input_rx,
            waiting_tx,
            waiting_rx: waiting_rx.clone(),
        },
        ActorHandle {
            player,
            kind,
            input_tx,
            waiting_rx,
        },
    )
}

impl ActorEndpoint {
    /// Best-effort notify; replaces a request nobody picked up yet
    pub fn notify(&self, request: PriorityRequest) {
        match self.waiting_tx.try_send(request) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(request)) => {
                while self.waiting_rx.try_recv().is_ok() {}
                let _ = self.waiting_tx.try_send(request);
            }
        }
    }

    /// Throw away queued actions left over from an earlier round
    pub fn drain_stale(&self) -> usize {
        self.input_rx.try_iter().count()
    }

    /// Block for the next action
    ///
    /// `Ok(None)` means the timeout expired.
    pub fn wait_for_input(&self, timeout: Option<Duration>) -> Result<Option<PlayerAction>> {
        match timeout {
            None => self
                .input_rx
                .recv()
                .map(Some)
                .map_err(|_| MtgError::ActorDisconnected("input channel closed".to_string())),
            Some(timeout) => match self.input_rx.recv_timeout(timeout) {
                Ok(action) => Ok(Some(action)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(MtgError::ActorDisconnected(
                    "input channel closed".to_string(),
                )),
            },
        }
    }
}

impl ActorHandle {
    /// Block until the engine asks for a decision; `None` once the game is over
    pub fn next_request(&self) -> Option<PriorityRequest> {
        self.waiting_rx.recv().ok()
    }

    pub fn try_next_request(&self) -> Option<PriorityRequest> {
        self.waiting_rx.try_recv().ok()
    }

    /// Send a decision; fails once the engine has dropped its endpoint
    pub fn send(&self, action: PlayerAction) -> Result<()> {
        self.input_tx
            .send(action)
            .map_err(|_| MtgError::ActorDisconnected(format!("engine gone for player {}", self.player)))
    }
}

impl GameState {
    /// Connect an actor to `player` and return the actor's half
    pub fn attach_actor(&mut self, player: PlayerId, kind: ActorKind) -> Result<ActorHandle> {
        let buffer = self.config.input_buffer;
        let (endpoint, handle) = actor_channel(player, kind, buffer);
        self.player_mut(player)?.actor = Some(endpoint);
        Ok(handle)
    }

    /// Drop every engine endpoint so actor threads see the channels close
    pub fn detach_actors(&mut self) {
        for player in &mut self.players {
            player.actor = None;
        }
    }

    /// Clear stale queued input for every player
    pub fn drain_stale_inputs(&self) {
        for player in &self.players {
            if let Some(actor) = &player.actor {
                let dropped = actor.drain_stale();
                if dropped > 0 {
                    self.logger.verbose(&format!(
                        "Dropped {} stale action(s) from {}",
                        dropped, player.name
                    ));
                }
            }
        }
    }

    /// Snapshot of what `player` sees and may do right now
    pub fn priority_request(&self, player: PlayerId) -> PriorityRequest {
        let available_actions = self.available_actions(player);
        let descriptions = available_actions
            .iter()
            .map(|a| self.describe_action(a))
            .collect();
        PriorityRequest {
            player,
            turn_number: self.turn.turn_number,
            phase: self.turn.phase,
            combat_step: self.turn.combat_step,
            life: self.player(player).map(|p| p.life).unwrap_or(0),
            stack: self
                .stack
                .items()
                .map(|item| format!("{} ({})", self.card_name(item.card), item.card))
                .collect(),
            available_actions,
            descriptions,
        }
    }

    /// Ask `player` for a decision and block until one arrives
    ///
    /// An AI gets `ai_timeout`; a human waits forever unless an idle timeout
    /// is configured. A timeout, or an AI that went away, yields a pass. A
    /// human that went away is an error.
    pub fn wait_for_player_input(&self, player: PlayerId, request: PriorityRequest) -> Result<PlayerAction> {
        let endpoint = self
            .player(player)?
            .actor
            .as_ref()
            .ok_or_else(|| MtgError::ActorDisconnected(format!("no actor for {}", self.player_name(player))))?;

        let timeout = match endpoint.kind {
            ActorKind::Ai => Some(self.config.ai_timeout()),
            ActorKind::Human => self.config.human_idle_timeout(),
        };

        endpoint.notify(request);
        match (endpoint.wait_for_input(timeout), endpoint.kind) {
            (Ok(Some(action)), _) => Ok(action),
            (Ok(None), _) => {
                self.logger.normal(&format!(
                    "{} timed out and passes",
                    self.player_name(player)
                ));
                Ok(PlayerAction::pass())
            }
            (Err(_), ActorKind::Ai) => {
                self.logger.verbose(&format!(
                    "{} is disconnected; passing",
                    self.player_name(player)
                ));
                Ok(PlayerAction::pass())
            }
            (Err(e), ActorKind::Human) => Err(e),
        }
    }
}
