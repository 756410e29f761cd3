//! Core game state and turn structure

pub mod actions;
pub mod actor;
pub mod availability;
pub mod combat;
pub mod controller;
pub mod game_loop;
pub mod interactive_controller;
pub mod logger;
pub mod phase;
pub mod random_controller;
pub mod resolution;
pub mod scripted_controller;
pub mod stack;
pub mod state;
pub mod zero_controller;

pub use actions::{ActionKind, PlayerAction};
pub use actor::{actor_channel, ActorEndpoint, ActorHandle, ActorKind, PriorityRequest};
pub use combat::{assign_attacker_damage, CombatState, Combatant, DamageAssignment};
pub use controller::{spawn_controller, PlayerController};
pub use game_loop::{GameEndReason, GameLoop, GameResult};
pub use interactive_controller::InteractiveController;
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use phase::{CombatStep, Phase, Turn};
pub use random_controller::RandomController;
pub use scripted_controller::ScriptedController;
pub use stack::{PriorityStack, StackItem, StackState};
pub use state::GameState;
pub use zero_controller::ZeroController;
