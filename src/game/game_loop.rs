//! Game loop implementation
//!
//! Drives turns through the phase cycle, runs priority rounds against the
//! player actors, and decides when and why the game ends.

/// Macro for conditional logging that avoids allocation when feature is disabled
///
/// When verbose-logging feature is disabled, this becomes a no-op at compile time,
/// eliminating all format! allocations that are a major performance bottleneck.
macro_rules! log_if_verbose {
    ($self:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $self.log_normal(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self; // Suppress unused variable warning
        }
    };
}

use crate::core::{LossReason, PlayerId};
use crate::game::{ActionKind, CombatStep, GameState, Phase, PlayerAction, StackState};
use crate::Result;
use serde::Serialize;

/// Invalid answers tolerated in one priority round before the engine
/// passes on the player's behalf
const MAX_INVALID_ACTIONS: usize = 100;

/// Result of running a game to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameResult {
    /// Winner of the game (None if draw or game didn't complete)
    pub winner: Option<PlayerId>,
    /// Total number of turns played
    pub turns_played: u32,
    /// Reason the game ended
    pub end_reason: GameEndReason,
}

/// Reason the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameEndReason {
    /// The named player's life total reached zero
    PlayerDeath(PlayerId),
    /// The named player drew from an empty library
    Decking(PlayerId),
    /// Game reached maximum turn limit
    TurnLimit,
}

/// Game loop manager
///
/// Handles turn progression, priority, and win condition checking. Actors
/// must already be attached to every player.
pub struct GameLoop<'a> {
    /// The game state
    pub game: &'a mut GameState,
    /// Maximum turns before the game is called
    max_turns: u32,
    /// Turn counter for the loop
    turns_elapsed: u32,
}

impl<'a> GameLoop<'a> {
    /// Create a new game loop for the given game state
    pub fn new(game: &'a mut GameState) -> Self {
        let max_turns = game.config.max_turns;
        GameLoop {
            game,
            max_turns,
            turns_elapsed: 0,
        }
    }

    /// Override the configured turn limit
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn turns_elapsed(&self) -> u32 {
        self.turns_elapsed
    }

    fn log_normal(&self, message: &str) {
        self.game.logger.normal(message);
    }

    /// Run turns until someone wins or the turn limit is hit
    ///
    /// The actor channels are closed on the way out, whatever the outcome,
    /// so controller threads can finish.
    pub fn run_game(&mut self) -> Result<GameResult> {
        let result = self.run_until_over();
        self.game.detach_actors();

        if let Ok(result) = &result {
            let message = match result.winner {
                Some(winner) => format!(
                    "{} wins after {} turn(s) ({:?})",
                    self.game.player_name(winner),
                    result.turns_played,
                    result.end_reason
                ),
                None => format!(
                    "No winner after {} turn(s) ({:?})",
                    result.turns_played, result.end_reason
                ),
            };
            self.game.logger.minimal(&message);
        }
        result
    }

    fn run_until_over(&mut self) -> Result<GameResult> {
        loop {
            if let Some(result) = self.check_win_condition() {
                return Ok(result);
            }
            if self.turns_elapsed >= self.max_turns {
                return Ok(GameResult {
                    winner: None,
                    turns_played: self.turns_elapsed,
                    end_reason: GameEndReason::TurnLimit,
                });
            }
            self.run_turn()?;
        }
    }

    /// Play one full turn for the active player, then hand the turn on
    ///
    /// The turn stops early after any phase that leaves a player lost.
    pub fn run_turn(&mut self) -> Result<()> {
        let active = self.game.active_player_id();
        self.game
            .logger
            .turn_header(self.game.turn.turn_number, self.game.player_name(active));

        for phase in Phase::ALL {
            self.game.turn.phase = phase;
            log_if_verbose!(self, "-- {} --", phase);
            self.execute_phase(phase)?;

            self.game.drain_mana_pools();
            if self.game.check_win_conditions() {
                break;
            }
        }

        self.turns_elapsed += 1;
        if !self.game.is_game_over() {
            self.pass_turn();
        }
        Ok(())
    }

    /// Give the turn to the next player still in the game
    fn pass_turn(&mut self) {
        let count = self.game.players.len();
        let mut next = (self.game.active_player + 1) % count;
        while self.game.players[next].has_lost && next != self.game.active_player {
            next = (next + 1) % count;
        }
        self.game.active_player = next;
        self.game.current_player = next;
        self.game.turn.next_turn();
    }

    pub fn execute_phase(&mut self, phase: Phase) -> Result<()> {
        match phase {
            Phase::Untap => self.untap_phase(),
            Phase::Draw => self.draw_phase(),
            Phase::Combat => self.combat_phase(),
            Phase::Cleanup => self.cleanup_phase(),
            Phase::Upkeep | Phase::Main1 | Phase::Main2 | Phase::End => self.priority_round(),
        }
    }

    fn untap_phase(&mut self) -> Result<()> {
        let active = self.game.active_player_id();
        self.game.untap_permanents(active)?;
        self.game.turn.land_played = false;
        Ok(())
    }

    /// Draw for the turn; the very first turn of the game skips it
    fn draw_phase(&mut self) -> Result<()> {
        if self.game.turn.is_first_turn() {
            return Ok(());
        }
        let active = self.game.active_player_id();
        match self.game.draw_card(active)? {
            Some(card) => {
                log_if_verbose!(
                    self,
                    "{} draws {} ({})",
                    self.game.player_name(active),
                    self.game.card_name(card),
                    card
                );
            }
            None => {
                self.log_normal(&format!(
                    "{} has no cards left to draw",
                    self.game.player_name(active)
                ));
                self.game.player_mut(active)?.lose_game(LossReason::Decking);
            }
        }
        Ok(())
    }

    /// Walk the combat steps, skipping the ones with nothing to do
    fn combat_phase(&mut self) -> Result<()> {
        let mut step = Some(CombatStep::Beginning);

        while let Some(current) = step {
            step = current.next();
            let has_attackers = self.game.combat.has_attackers();
            let skip = match current {
                CombatStep::DeclareBlockers => !has_attackers,
                CombatStep::FirstStrikeDamage => {
                    !has_attackers || !self.game.has_first_strike_combat()
                }
                _ => false,
            };
            if skip {
                continue;
            }

            self.game.turn.combat_step = Some(current);
            log_if_verbose!(self, "- {} -", current);
            if current.is_damage_step() && has_attackers {
                self.game
                    .resolve_combat_damage(current == CombatStep::FirstStrikeDamage)?;
                self.game.check_state_based_actions()?;
                if self.game.check_win_conditions() {
                    break;
                }
            }

            self.priority_round()?;
            self.game.check_state_based_actions()?;
            if self.game.check_win_conditions() {
                break;
            }
        }

        self.game.combat.clear();
        self.game.turn.combat_step = None;
        Ok(())
    }

    /// Discard down to the maximum hand size, then wipe end-of-turn effects
    ///
    /// Anything other than a legal discard (a pass, a timeout, a card not in
    /// hand) discards the last card in hand instead.
    fn cleanup_phase(&mut self) -> Result<()> {
        let active = self.game.active_player_id();
        let max = self.game.config.max_hand_size;

        while self.game.hand(active).len() > max {
            self.game.turn.discarding = true;
            let request = self.game.priority_request(active);
            let action = self.game.wait_for_player_input(active, request)?;

            let discarded = action.kind == ActionKind::Discard
                && self.game.process_action(active, &action).is_ok();
            if !discarded {
                if let Some(&last) = self.game.hand(active).last() {
                    self.game.discard(active, last)?;
                }
            }
        }
        self.game.turn.discarding = false;

        self.game.clear_end_of_turn();
        Ok(())
    }

    /// Run priority until every player passes in succession
    ///
    /// After a resolution the active player gets priority again while items
    /// remain. Once the last item resolves the round is over for this step.
    pub fn priority_round(&mut self) -> Result<()> {
        self.game.drain_stale_inputs();
        let active = self.game.active_player;
        self.game.stack.begin(active);
        let mut invalid_actions = 0;

        loop {
            match self.game.stack.state() {
                StackState::Empty => return Ok(()),
                StackState::Resolve => {
                    if let Some(item) = self.game.stack.take_resolving() {
                        self.game.resolve_stack_item(item)?;
                        self.game.check_state_based_actions()?;
                        if self.game.check_win_conditions() {
                            return Ok(());
                        }
                    }
                }
                StackState::StartStack | StackState::WaitPlayer => {
                    let idx = self.game.stack.priority_holder();
                    self.game.current_player = idx;
                    let player = self.game.players[idx].id;
                    if self.game.players[idx].has_lost {
                        self.game.stack.pass();
                        continue;
                    }

                    let action = if invalid_actions >= MAX_INVALID_ACTIONS {
                        invalid_actions = 0;
                        self.log_normal(&format!(
                            "{} made too many invalid choices; passing for them",
                            self.game.player_name(player)
                        ));
                        PlayerAction::pass()
                    } else {
                        let request = self.game.priority_request(player);
                        self.game.wait_for_player_input(player, request)?
                    };

                    if action.is_pass() {
                        log_if_verbose!(self, "{} passes", self.game.player_name(player));
                        self.game.stack.pass();
                        continue;
                    }

                    match self.game.process_action(player, &action) {
                        Ok(()) => {
                            // Casting already handed priority back through the push
                            if action.kind != ActionKind::CastSpell {
                                self.game.stack.note_action(idx);
                            }
                        }
                        Err(e) => {
                            invalid_actions += 1;
                            self.log_normal(&format!(
                                "Ignoring {} from {}: {}",
                                action,
                                self.game.player_name(player),
                                e
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Check if the game has reached a win condition
    ///
    /// The reason is taken from the first player (in seat order) who lost.
    pub fn check_win_condition(&self) -> Option<GameResult> {
        if !self.game.is_game_over() {
            return None;
        }
        let loser = self.game.players.iter().find(|p| p.has_lost)?;
        let end_reason = match loser.loss_reason {
            Some(LossReason::Decking) => GameEndReason::Decking(loser.id),
            _ => GameEndReason::PlayerDeath(loser.id),
        };
        Some(GameResult {
            winner: self.game.winner(),
            turns_played: self.turns_elapsed,
            end_reason,
        })
    }
}
