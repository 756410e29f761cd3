//! Card effects and ability system
//!
//! These are the already-parsed ability records the engine consumes. Turning
//! rules text into them is the card parser's job; the engine never reads text.

use crate::core::{CardId, Color, ManaCost, PlayerId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Something a spell or ability can point at
///
/// A card or a player. Damage, death checks and stat boosts dispatch on the
/// variant in `GameState` rather than through a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Card(CardId),
    Player(PlayerId),
}

/// Keyword abilities in MTG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Reach,
    FirstStrike,
    DoubleStrike,
    Deathtouch,
    Trample,
    Lifelink,
    Vigilance,
    Haste,
    Flash,
    Defender,
    /// Unblockable while the defending player controls a land with this
    /// name or subtype (e.g. "Swamp" for swampwalk)
    Landwalk(String),
    /// Catch-all for keywords the engine doesn't interpret
    Other(String),
}

/// What kind of ability a parsed record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityType {
    Activated,
    Triggered,
    Static,
    Keyword,
    /// The effect of an instant or sorcery
    Spell,
    Mana,
}

/// When a triggered ability fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    EntersBattlefield,
}

/// Which kinds of objects a target spec accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Any creature or player
    AnyTarget,
    Creature,
    Player,
    Land,
}

/// Whose objects a target spec accepts, relative to the caster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetController {
    #[default]
    Any,
    You,
    Opponent,
}

/// Parsed "target ..." clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTargetSpec {
    pub kind: TargetKind,
    #[serde(default)]
    pub controller: TargetController,
}

impl ParsedTargetSpec {
    pub fn new(kind: TargetKind) -> Self {
        ParsedTargetSpec {
            kind,
            controller: TargetController::Any,
        }
    }

    pub fn controlled_by(mut self, controller: TargetController) -> Self {
        self.controller = controller;
        self
    }
}

/// Basic card effects that can be executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedEffect {
    /// "deals 3 damage to any target"
    DealDamage { amount: i32 },

    /// "you gain 3 life"
    GainLife { amount: i32 },

    /// "draw two cards"
    DrawCards { count: u8 },

    /// "+3/+3 until end of turn"; on a static aura ability the boost applies
    /// to the enchanted permanent for as long as the aura is attached
    Pump { power: i32, toughness: i32 },

    /// "add {R}"
    AddMana { colors: SmallVec<[Color; 2]> },

    /// "destroy target creature"
    Destroy,
}

/// A single parsed ability of a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAbility {
    pub kind: AbilityType,
    #[serde(default)]
    pub cost: Option<ManaCost>,
    #[serde(default)]
    pub effect: Option<ParsedEffect>,
    /// Keywords granted by this ability (to the card itself, or to the
    /// enchanted permanent for a static aura ability)
    #[serde(default)]
    pub keywords: SmallVec<[Keyword; 2]>,
    #[serde(default)]
    pub target_spec: Option<ParsedTargetSpec>,
    #[serde(default)]
    pub trigger: Option<Trigger>,
}

impl ParsedAbility {
    pub fn new(kind: AbilityType) -> Self {
        ParsedAbility {
            kind,
            cost: None,
            effect: None,
            keywords: SmallVec::new(),
            target_spec: None,
            trigger: None,
        }
    }

    /// Spell ability with an optional target ("Lightning Bolt")
    pub fn spell(effect: ParsedEffect, target_spec: Option<ParsedTargetSpec>) -> Self {
        ParsedAbility {
            effect: Some(effect),
            target_spec,
            ..ParsedAbility::new(AbilityType::Spell)
        }
    }

    /// "{T}: Add ..." mana ability
    pub fn mana(colors: &[Color]) -> Self {
        ParsedAbility {
            effect: Some(ParsedEffect::AddMana {
                colors: colors.iter().copied().collect(),
            }),
            ..ParsedAbility::new(AbilityType::Mana)
        }
    }

    /// Enters-the-battlefield trigger
    pub fn on_enter(effect: ParsedEffect, target_spec: Option<ParsedTargetSpec>) -> Self {
        ParsedAbility {
            effect: Some(effect),
            target_spec,
            trigger: Some(Trigger::EntersBattlefield),
            ..ParsedAbility::new(AbilityType::Triggered)
        }
    }

    /// Static ability, e.g. an aura's "enchanted creature gets +2/+0 and has trample"
    pub fn static_boost(power: i32, toughness: i32, keywords: &[Keyword]) -> Self {
        ParsedAbility {
            effect: Some(ParsedEffect::Pump { power, toughness }),
            keywords: keywords.iter().cloned().collect(),
            ..ParsedAbility::new(AbilityType::Static)
        }
    }

    /// Bare "Enchant creature" / "Enchant land" clause of an aura
    pub fn enchant(kind: TargetKind) -> Self {
        ParsedAbility {
            target_spec: Some(ParsedTargetSpec::new(kind)),
            ..ParsedAbility::new(AbilityType::Static)
        }
    }

    pub fn with_target(mut self, spec: ParsedTargetSpec) -> Self {
        self.target_spec = Some(spec);
        self
    }

    /// Colors produced, if this is a mana ability
    pub fn mana_production(&self) -> Option<&[Color]> {
        match (&self.kind, &self.effect) {
            (AbilityType::Mana, Some(ParsedEffect::AddMana { colors })) => Some(colors.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_ability_builder() {
        let bolt = ParsedAbility::spell(
            ParsedEffect::DealDamage { amount: 3 },
            Some(ParsedTargetSpec::new(TargetKind::AnyTarget)),
        );
        assert_eq!(bolt.kind, AbilityType::Spell);
        assert_eq!(bolt.effect, Some(ParsedEffect::DealDamage { amount: 3 }));
        assert_eq!(
            bolt.target_spec.map(|t| t.controller),
            Some(TargetController::Any)
        );
        assert!(bolt.mana_production().is_none());
    }

    #[test]
    fn test_mana_ability_production() {
        let ability = ParsedAbility::mana(&[Color::Red]);
        assert_eq!(ability.mana_production(), Some(&[Color::Red][..]));
    }

    #[test]
    fn test_parsed_ability_from_json() {
        let json = r#"{
            "kind": "Spell",
            "effect": { "GainLife": { "amount": 4 } }
        }"#;
        let ability: ParsedAbility = serde_json::from_str(json).unwrap();
        assert_eq!(ability.effect, Some(ParsedEffect::GainLife { amount: 4 }));
        assert!(ability.target_spec.is_none());
        assert!(ability.keywords.is_empty());
    }
}
