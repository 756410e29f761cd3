//! Card types and definitions

use crate::core::{
    AbilityType, CardId, CardName, GameEntity, Keyword, ManaCost, ParsedAbility, ParsedEffect,
    PlayerId, Subtype, Target,
};
use crate::zones::Zone;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Card types in MTG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
}

/// Printed attributes of a card, as delivered by the card database
///
/// Many card instances share one definition; the instance only carries the
/// mutable in-game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub name: CardName,

    #[serde(default)]
    pub mana_cost: ManaCost,

    /// Card types (a card can be multiple types)
    pub types: SmallVec<[CardType; 2]>,

    /// Card subtypes (e.g., "Goblin", "Aura", "Mountain")
    #[serde(default)]
    pub subtypes: SmallVec<[Subtype; 2]>,

    #[serde(default)]
    pub power: Option<i32>,

    #[serde(default)]
    pub toughness: Option<i32>,

    /// Printed keywords (flat list)
    #[serde(default)]
    pub keywords: SmallVec<[Keyword; 2]>,

    /// Parsed abilities
    #[serde(default)]
    pub abilities: Vec<ParsedAbility>,
}

impl CardDefinition {
    pub fn new(name: impl Into<String>, mana_cost: ManaCost, types: &[CardType]) -> Self {
        CardDefinition {
            name: CardName::new(name),
            mana_cost,
            types: types.iter().copied().collect(),
            subtypes: SmallVec::new(),
            power: None,
            toughness: None,
            keywords: SmallVec::new(),
            abilities: Vec::new(),
        }
    }

    pub fn with_stats(mut self, power: i32, toughness: i32) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    pub fn with_subtypes(mut self, subtypes: &[&str]) -> Self {
        self.subtypes = subtypes.iter().map(|s| Subtype::new(*s)).collect();
        self
    }

    pub fn with_keywords(mut self, keywords: &[Keyword]) -> Self {
        self.keywords = keywords.iter().cloned().collect();
        self
    }

    pub fn with_ability(mut self, ability: ParsedAbility) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s.matches(subtype))
    }

    /// The ability that carries the spell's effect, if any
    pub fn spell_ability(&self) -> Option<&ParsedAbility> {
        self.abilities.iter().find(|a| a.kind == AbilityType::Spell)
    }

    /// The ability that needs a target at cast time
    ///
    /// Instants and sorceries target through their spell ability, auras
    /// through their enchant clause; both are recorded as `target_spec`.
    pub fn cast_target_ability(&self) -> Option<&ParsedAbility> {
        self.abilities
            .iter()
            .find(|a| matches!(a.kind, AbilityType::Spell | AbilityType::Static) && a.target_spec.is_some())
    }
}

/// Represents a card in the game
///
/// Cards have a unique id and are owned by one player for the whole game.
/// This struct holds the instance state of a card during gameplay.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    /// Unique ID for this card instance
    pub id: CardId,

    /// Player who owns (and controls) this card
    pub owner: PlayerId,

    /// Shared printed attributes
    pub definition: Arc<CardDefinition>,

    /// Zone this card currently sits in; always matches zone membership
    pub current_zone: Zone,

    pub tapped: bool,

    /// False while summoning sick
    pub active: bool,

    pub damage_taken: i32,

    /// Dealt damage by a deathtouch source since the last cleanup
    pub deathtouched: bool,

    /// Temporary bonuses, cleared during cleanup
    pub power_boost: i32,
    pub toughness_boost: i32,

    /// Auras attached to this card
    pub attachments: SmallVec<[CardId; 2]>,

    /// For an aura on the battlefield: what it is attached to
    pub attached_to: Option<Target>,
}

impl Card {
    pub fn new(id: CardId, owner: PlayerId, definition: Arc<CardDefinition>) -> Self {
        Card {
            id,
            owner,
            definition,
            current_zone: Zone::Library,
            tapped: false,
            active: false,
            damage_taken: 0,
            deathtouched: false,
            power_boost: 0,
            toughness_boost: 0,
            attachments: SmallVec::new(),
            attached_to: None,
        }
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.definition.is_type(card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_aura(&self) -> bool {
        self.is_type(CardType::Enchantment) && self.definition.has_subtype("Aura")
    }

    /// Instants and sorceries go to the graveyard when they resolve
    pub fn is_instant_or_sorcery(&self) -> bool {
        self.is_type(CardType::Instant) || self.is_type(CardType::Sorcery)
    }

    /// Printed keyword check (does not see keywords granted by auras)
    pub fn has_printed_keyword(&self, keyword: &Keyword) -> bool {
        self.definition.keywords.contains(keyword)
            || self
                .definition
                .abilities
                .iter()
                .any(|a| a.kind == AbilityType::Keyword && a.keywords.contains(keyword))
    }

    pub fn mana_cost(&self) -> &ManaCost {
        &self.definition.mana_cost
    }

    pub fn base_power(&self) -> i32 {
        self.definition.power.unwrap_or(0)
    }

    pub fn base_toughness(&self) -> i32 {
        self.definition.toughness.unwrap_or(0)
    }

    /// Mana this card produces when tapped, if it has a mana ability
    pub fn mana_production(&self) -> Option<&[crate::core::Color]> {
        self.definition
            .abilities
            .iter()
            .find_map(|a| a.mana_production())
    }

    /// Static boost this card grants to whatever it is attached to
    pub fn granted_boost(&self) -> (i32, i32) {
        self.definition
            .abilities
            .iter()
            .filter(|a| a.kind == AbilityType::Static)
            .filter_map(|a| match a.effect {
                Some(ParsedEffect::Pump { power, toughness }) => Some((power, toughness)),
                _ => None,
            })
            .fold((0, 0), |(p, t), (dp, dt)| (p + dp, t + dt))
    }

    /// Keywords this card grants to whatever it is attached to
    pub fn granted_keywords(&self) -> impl Iterator<Item = &Keyword> {
        self.definition
            .abilities
            .iter()
            .filter(|a| a.kind == AbilityType::Static)
            .flat_map(|a| a.keywords.iter())
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Clear everything that only lasts until end of turn
    pub fn clear_end_of_turn(&mut self) {
        self.damage_taken = 0;
        self.deathtouched = false;
        self.power_boost = 0;
        self.toughness_boost = 0;
    }

    /// Reset in-play state when the card leaves the battlefield
    pub fn reset_for_zone_change(&mut self) {
        self.clear_end_of_turn();
        self.tapped = false;
        self.active = false;
        self.attachments.clear();
        self.attached_to = None;
    }
}

impl GameEntity<Card> for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.definition.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Color, EntityId};

    fn ape() -> Arc<CardDefinition> {
        Arc::new(
            CardDefinition::new("Kird Ape", ManaCost::parse("R").unwrap(), &[CardType::Creature])
                .with_stats(1, 1)
                .with_subtypes(&["Ape"]),
        )
    }

    #[test]
    fn test_card_creation() {
        let card = Card::new(EntityId::new(5), EntityId::new(0), ape());

        assert_eq!(card.name(), "Kird Ape");
        assert_eq!(card.current_zone, Zone::Library);
        assert!(card.is_creature());
        assert!(!card.is_aura());
        assert!(!card.tapped);
        assert_eq!(card.base_power(), 1);
    }

    #[test]
    fn test_aura_grants() {
        let rancor = Arc::new(
            CardDefinition::new("Rancor", ManaCost::parse("G").unwrap(), &[CardType::Enchantment])
                .with_subtypes(&["Aura"])
                .with_ability(ParsedAbility::static_boost(2, 0, &[Keyword::Trample])),
        );
        let card = Card::new(EntityId::new(1), EntityId::new(0), rancor);

        assert!(card.is_aura());
        assert_eq!(card.granted_boost(), (2, 0));
        assert_eq!(card.granted_keywords().collect::<Vec<_>>(), vec![&Keyword::Trample]);
    }

    #[test]
    fn test_mana_production() {
        let mountain = Arc::new(
            CardDefinition::new("Mountain", ManaCost::new(), &[CardType::Land])
                .with_subtypes(&["Mountain"])
                .with_ability(ParsedAbility::mana(&[Color::Red])),
        );
        let card = Card::new(EntityId::new(1), EntityId::new(0), mountain);
        assert_eq!(card.mana_production(), Some(&[Color::Red][..]));
    }

    #[test]
    fn test_reset_for_zone_change() {
        let mut card = Card::new(EntityId::new(5), EntityId::new(0), ape());
        card.tapped = true;
        card.damage_taken = 3;
        card.power_boost = 2;
        card.attachments.push(EntityId::new(9));

        card.reset_for_zone_change();
        assert!(!card.tapped);
        assert_eq!(card.damage_taken, 0);
        assert_eq!(card.power_boost, 0);
        assert!(card.attachments.is_empty());
    }
}
