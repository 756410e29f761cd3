//! Player representation

use crate::core::{GameEntity, ManaPool, PlayerId, PlayerName};
use crate::game::actor::ActorEndpoint;
use crate::zones::PlayerZones;
use serde::{Deserialize, Serialize};

/// Why a player lost the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    /// Life total reached zero or less
    LifeTotal,
    /// Tried to draw from an empty library
    Decking,
}

/// Represents a player in the game
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    /// Unique ID for this player
    pub id: PlayerId,

    /// Player name
    pub name: PlayerName,

    /// Life total
    pub life: i32,

    /// Mana pool, emptied after every phase
    pub mana_pool: ManaPool,

    /// Library, hand, battlefield, graveyard and exile
    pub zones: PlayerZones,

    /// Has the player lost?
    pub has_lost: bool,

    pub loss_reason: Option<LossReason>,

    /// Engine side of this player's action channels. `None` until an actor
    /// is attached.
    #[serde(skip)]
    pub actor: Option<ActorEndpoint>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            mana_pool: ManaPool::new(),
            zones: PlayerZones::new(id),
            has_lost: false,
            loss_reason: None,
            actor: None,
        }
    }

    pub fn gain_life(&mut self, amount: i32) {
        self.life += amount;
    }

    /// Lose life; the loss itself is detected by the win-condition check
    pub fn lose_life(&mut self, amount: i32) {
        self.life -= amount;
    }

    /// Mark the player as having lost; the first reason recorded sticks
    pub fn lose_game(&mut self, reason: LossReason) {
        if !self.has_lost {
            self.has_lost = true;
            self.loss_reason = Some(reason);
        }
    }

    pub fn empty_mana_pool(&mut self) {
        self.mana_pool.clear();
    }

    pub fn hand_size(&self) -> usize {
        self.zones.hand.len()
    }
}

impl GameEntity<Player> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
