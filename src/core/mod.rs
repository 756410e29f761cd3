//! Core game types and entities

pub mod card;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod player;
pub mod types;

pub use card::{Card, CardDefinition, CardType};
pub use effects::{
    AbilityType, Keyword, ParsedAbility, ParsedEffect, ParsedTargetSpec, Target, TargetController,
    TargetKind, Trigger,
};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use mana::{Color, ManaCost, ManaPool, ManaSource};
pub use player::{LossReason, Player};
pub use types::{CardName, PlayerName, Subtype};

pub type CardId = EntityId<Card>;
pub type PlayerId = EntityId<Player>;
