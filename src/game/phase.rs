//! Turn phases and combat steps

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of a turn, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Untap,
    Upkeep,
    Draw,
    Main1,
    Combat,
    Main2,
    End,
    Cleanup,
}

impl Phase {
    /// Every phase in turn order
    pub const ALL: [Phase; 8] = [
        Phase::Untap,
        Phase::Upkeep,
        Phase::Draw,
        Phase::Main1,
        Phase::Combat,
        Phase::Main2,
        Phase::End,
        Phase::Cleanup,
    ];

    /// Get the next phase (cyclic: Cleanup wraps to Untap)
    pub fn next(&self) -> Phase {
        match self {
            Phase::Untap => Phase::Upkeep,
            Phase::Upkeep => Phase::Draw,
            Phase::Draw => Phase::Main1,
            Phase::Main1 => Phase::Combat,
            Phase::Combat => Phase::Main2,
            Phase::Main2 => Phase::End,
            Phase::End => Phase::Cleanup,
            Phase::Cleanup => Phase::Untap,
        }
    }

    /// Can a player play sorceries and lands in this phase?
    pub fn is_main(&self) -> bool {
        matches!(self, Phase::Main1 | Phase::Main2)
    }

    /// Does this phase run a priority round?
    pub fn has_priority_round(&self) -> bool {
        matches!(
            self,
            Phase::Upkeep | Phase::Main1 | Phase::Main2 | Phase::End
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Steps of the combat phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatStep {
    Beginning,
    DeclareAttackers,
    DeclareBlockers,
    FirstStrikeDamage,
    CombatDamage,
    EndOfCombat,
}

impl CombatStep {
    /// Next step in the unabridged order; `None` after EndOfCombat
    pub fn next(&self) -> Option<CombatStep> {
        match self {
            CombatStep::Beginning => Some(CombatStep::DeclareAttackers),
            CombatStep::DeclareAttackers => Some(CombatStep::DeclareBlockers),
            CombatStep::DeclareBlockers => Some(CombatStep::FirstStrikeDamage),
            CombatStep::FirstStrikeDamage => Some(CombatStep::CombatDamage),
            CombatStep::CombatDamage => Some(CombatStep::EndOfCombat),
            CombatStep::EndOfCombat => None,
        }
    }

    pub fn is_damage_step(&self) -> bool {
        matches!(
            self,
            CombatStep::FirstStrikeDamage | CombatStep::CombatDamage
        )
    }
}

impl fmt::Display for CombatStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Represents the current turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Current turn number (starts at 1)
    pub turn_number: u32,

    pub phase: Phase,

    /// `None` outside the combat phase
    pub combat_step: Option<CombatStep>,

    /// Has the active player played a land this turn?
    pub land_played: bool,

    /// Set only while the cleanup hand-size check is asking for discards
    pub discarding: bool,
}

impl Turn {
    pub fn new() -> Self {
        Turn {
            turn_number: 1,
            phase: Phase::Untap,
            combat_step: None,
            land_played: false,
            discarding: false,
        }
    }

    /// Start the next turn
    pub fn next_turn(&mut self) {
        self.turn_number += 1;
        self.phase = Phase::Untap;
        self.combat_step = None;
        self.land_played = false;
        self.discarding = false;
    }

    pub fn is_first_turn(&self) -> bool {
        self.turn_number == 1
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}
