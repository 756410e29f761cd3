//! Player actions and the mutators that carry them out
//!
//! Every mutator validates on its own and returns `MtgError::InvalidAction`
//! without changing anything when the move is illegal.

use crate::core::{
    CardId, CardType, Color, GameEntity, Keyword, ManaCost, ManaSource, PlayerId, Target,
};
use crate::game::{GameState, StackItem};
use crate::zones::Zone;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of decisions a player can send back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    PlayLand,
    CastSpell,
    PassPriority,
    DeclareAttacker,
    DeclareBlocker,
    Discard,
}

/// A player's decision
///
/// `card` is the land, spell, attacker, blocker or discarded card. `target`
/// is the spell's target, or for a block the attacker being blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerAction {
    pub kind: ActionKind,
    pub card: Option<CardId>,
    pub target: Option<Target>,
}

impl PlayerAction {
    pub fn pass() -> Self {
        PlayerAction {
            kind: ActionKind::PassPriority,
            card: None,
            target: None,
        }
    }

    pub fn play_land(card: CardId) -> Self {
        PlayerAction {
            kind: ActionKind::PlayLand,
            card: Some(card),
            target: None,
        }
    }

    pub fn cast(card: CardId, target: Option<Target>) -> Self {
        PlayerAction {
            kind: ActionKind::CastSpell,
            card: Some(card),
            target,
        }
    }

    pub fn attack(card: CardId) -> Self {
        PlayerAction {
            kind: ActionKind::DeclareAttacker,
            card: Some(card),
            target: None,
        }
    }

    pub fn block(blocker: CardId, attacker: CardId) -> Self {
        PlayerAction {
            kind: ActionKind::DeclareBlocker,
            card: Some(blocker),
            target: Some(Target::Card(attacker)),
        }
    }

    pub fn discard(card: CardId) -> Self {
        PlayerAction {
            kind: ActionKind::Discard,
            card: Some(card),
            target: None,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.kind == ActionKind::PassPriority
    }

    fn require_card(&self) -> Result<CardId> {
        self.card
            .ok_or_else(|| MtgError::InvalidAction(format!("{:?} needs a card", self.kind)))
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(card) = self.card {
            write!(f, " {card}")?;
        }
        match self.target {
            Some(Target::Card(id)) => write!(f, " -> {id}"),
            Some(Target::Player(id)) => write!(f, " -> player {id}"),
            None => Ok(()),
        }
    }
}

impl GameState {
    /// Human-readable form of an action, with card and player names
    pub fn describe_action(&self, action: &PlayerAction) -> String {
        let card = action
            .card
            .map(|id| format!("{} ({id})", self.card_name(id)))
            .unwrap_or_default();
        let target = action.target.map(|t| self.target_name(t));
        match (action.kind, target) {
            (ActionKind::PassPriority, _) => "pass priority".to_string(),
            (ActionKind::PlayLand, _) => format!("play {card}"),
            (ActionKind::CastSpell, Some(target)) => format!("cast {card} targeting {target}"),
            (ActionKind::CastSpell, None) => format!("cast {card}"),
            (ActionKind::DeclareAttacker, _) => format!("attack with {card}"),
            (ActionKind::DeclareBlocker, Some(target)) => format!("block {target} with {card}"),
            (ActionKind::DeclareBlocker, None) => format!("block with {card}"),
            (ActionKind::Discard, _) => format!("discard {card}"),
        }
    }

    fn require_in_hand(&self, player: PlayerId, card_id: CardId) -> Result<()> {
        if self.hand(player).contains(&card_id) {
            Ok(())
        } else {
            Err(MtgError::InvalidAction(format!(
                "{} ({card_id}) is not in {}'s hand",
                self.card_name(card_id),
                self.player_name(player)
            )))
        }
    }

    /// Can `player` act at sorcery speed right now?
    pub fn is_sorcery_timing(&self, player: PlayerId) -> bool {
        player == self.active_player_id() && self.turn.phase.is_main() && self.stack.is_empty()
    }

    /// Play a land from hand (doesn't use the stack)
    pub fn play_land(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        self.require_in_hand(player, card_id)?;
        if !self.cards.get(card_id)?.is_land() {
            return Err(MtgError::InvalidAction(format!(
                "{} is not a land",
                self.card_name(card_id)
            )));
        }
        if !self.is_sorcery_timing(player) {
            return Err(MtgError::InvalidAction(
                "lands can only be played in your main phase with an empty stack".to_string(),
            ));
        }
        if self.turn.land_played {
            return Err(MtgError::InvalidAction(
                "already played a land this turn".to_string(),
            ));
        }

        self.move_card(card_id, Zone::Battlefield)?;
        self.cards.get_mut(card_id)?.active = true;
        self.turn.land_played = true;
        self.logger.normal(&format!(
            "{} plays {} ({})",
            self.player_name(player),
            self.card_name(card_id),
            card_id
        ));
        Ok(())
    }

    /// Could this card produce mana right now?
    pub fn can_tap_for_mana(&self, player: PlayerId, card_id: CardId) -> bool {
        let Ok(card) = self.cards.get(card_id) else {
            return false;
        };
        card.owner == player
            && card.current_zone == Zone::Battlefield
            && !card.tapped
            && card.attached_to.is_none()
            && card.mana_production().is_some()
            && (!card.is_creature() || card.active || self.has_keyword(card_id, &Keyword::Haste))
    }

    /// Tap a permanent for mana
    ///
    /// A dual land lists several colors under a single mana ability and adds
    /// one mana of any of them; every other entry adds one mana of that color.
    pub fn tap_for_mana(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        if !self.can_tap_for_mana(player, card_id) {
            return Err(MtgError::InvalidAction(format!(
                "{} ({card_id}) can't be tapped for mana",
                self.card_name(card_id)
            )));
        }

        let sources = self.mana_sources(card_id);
        self.cards.get_mut(card_id)?.tap();
        let pool = &mut self.player_mut(player)?.mana_pool;
        for source in sources {
            pool.add(source);
        }
        self.logger.verbose(&format!(
            "{} taps {} for mana (pool: {})",
            self.player_name(player),
            self.card_name(card_id),
            self.player(player)?.mana_pool
        ));
        Ok(())
    }

    /// Pool entries tapping this card would add
    pub fn mana_sources(&self, card_id: CardId) -> Vec<ManaSource> {
        let Ok(card) = self.cards.get(card_id) else {
            return Vec::new();
        };
        let to_source = |colors: &[Color]| -> Option<ManaSource> {
            match colors {
                [] => None,
                [single] => Some(ManaSource::Single(*single)),
                many => Some(ManaSource::AnyOf(many.iter().copied().collect())),
            }
        };

        let mut sources: Vec<ManaSource> =
            card.mana_production().and_then(to_source).into_iter().collect();
        // Aura mana (Wild Growth style) adds its colors individually
        for aura in card.attachments.iter().filter_map(|id| self.cards.get(*id).ok()) {
            if let Some(colors) = aura.mana_production() {
                sources.extend(colors.iter().copied().map(ManaSource::Single));
            }
        }
        sources
    }

    /// Tap producers until the pool covers `cost`
    ///
    /// Producers are tried in battlefield order, preferring those that supply
    /// a color the pool still lacks.
    fn auto_tap(&mut self, player: PlayerId, cost: &ManaCost) -> Result<()> {
        loop {
            let pool = &self.player(player)?.mana_pool;
            if pool.can_pay(cost) {
                return Ok(());
            }
            let missing = pool.missing_colors(cost);

            let producers: Vec<CardId> = self
                .battlefield(player)
                .iter()
                .copied()
                .filter(|id| self.can_tap_for_mana(player, *id))
                .collect();
            let choice = producers
                .iter()
                .copied()
                .find(|id| {
                    self.mana_sources(*id)
                        .iter()
                        .any(|source| missing.iter().any(|color| source.provides(*color)))
                })
                .or_else(|| {
                    if missing.is_empty() {
                        producers.first().copied()
                    } else {
                        None
                    }
                });

            match choice {
                Some(id) => self.tap_for_mana(player, id)?,
                None => {
                    return Err(MtgError::InsufficientMana {
                        cost: cost.to_string(),
                        pool: self.player(player)?.mana_pool.to_string(),
                    })
                }
            }
        }
    }

    /// Cast a spell: check timing and target, pay, and put it on the stack
    pub fn cast_spell(&mut self, player: PlayerId, card_id: CardId, target: Option<Target>) -> Result<()> {
        self.require_in_hand(player, card_id)?;
        let card = self.cards.get(card_id)?;
        if card.is_land() {
            return Err(MtgError::InvalidAction(format!(
                "{} is a land and can't be cast",
                card.name()
            )));
        }
        let instant_speed = card.is_type(CardType::Instant)
            || self.has_keyword(card_id, &Keyword::Flash);
        if !instant_speed && !self.is_sorcery_timing(player) {
            return Err(MtgError::InvalidAction(format!(
                "{} can only be cast in your main phase with an empty stack",
                card.name()
            )));
        }

        let target = match card.definition.cast_target_ability() {
            Some(_) => {
                let chosen = target.ok_or_else(|| {
                    MtgError::InvalidAction(format!("{} needs a target", self.card_name(card_id)))
                })?;
                if !self.available_targets(player, card_id).contains(&chosen) {
                    return Err(MtgError::InvalidAction(format!(
                        "{} is not a legal target for {}",
                        self.target_name(chosen),
                        self.card_name(card_id)
                    )));
                }
                Some(chosen)
            }
            None => None,
        };

        let cost = *card.mana_cost();
        let pool = self.player(player)?.mana_pool.clone();
        if !self.available_mana(player, &pool).can_pay(&cost) {
            return Err(MtgError::InsufficientMana {
                cost: cost.to_string(),
                pool: pool.to_string(),
            });
        }

        self.auto_tap(player, &cost)?;
        self.player_mut(player)?.mana_pool.pay(&cost)?;

        let idx = self.player_index(player)?;
        self.players[idx].zones.hand.remove(card_id);
        self.cards.get_mut(card_id)?.current_zone = Zone::Stack;
        self.stack.push(StackItem {
            card: card_id,
            controller: player,
            target,
        });

        let message = match target {
            Some(t) => format!(
                "{} casts {} ({}) targeting {}",
                self.player_name(player),
                self.card_name(card_id),
                card_id,
                self.target_name(t)
            ),
            None => format!(
                "{} casts {} ({})",
                self.player_name(player),
                self.card_name(card_id),
                card_id
            ),
        };
        self.logger.normal(&message);
        Ok(())
    }

    /// Discard a card from hand
    pub fn discard(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        self.require_in_hand(player, card_id)?;
        self.move_card(card_id, Zone::Graveyard)?;
        self.logger.normal(&format!(
            "{} discards {} ({})",
            self.player_name(player),
            self.card_name(card_id),
            card_id
        ));
        Ok(())
    }

    /// Carry out a non-pass action for `player`
    ///
    /// Anything not offered by `available_actions` is rejected before any
    /// mutator runs. Passing is the priority loop's job, not this one's.
    pub fn process_action(&mut self, player: PlayerId, action: &PlayerAction) -> Result<()> {
        if action.is_pass() {
            return Ok(());
        }
        if !self.available_actions(player).contains(action) {
            return Err(MtgError::InvalidAction(format!(
                "{} is not available to {}",
                self.describe_action(action),
                self.player_name(player)
            )));
        }

        let card = action.require_card()?;
        match action.kind {
            ActionKind::PlayLand => self.play_land(player, card),
            ActionKind::CastSpell => self.cast_spell(player, card, action.target),
            ActionKind::DeclareAttacker => self.declare_attacker(player, card),
            ActionKind::DeclareBlocker => match action.target {
                Some(Target::Card(attacker)) => self.declare_blocker(player, card, attacker),
                _ => Err(MtgError::InvalidAction(
                    "a block must name the attacker".to_string(),
                )),
            },
            ActionKind::Discard => self.discard(player, card),
            ActionKind::PassPriority => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardDefinition, ParsedAbility};
    use crate::game::Phase;
    use crate::EngineConfig;
    use std::sync::Arc;

    fn mountain() -> Arc<CardDefinition> {
        Arc::new(
            CardDefinition::new("Mountain", ManaCost::new(), &[CardType::Land])
                .with_subtypes(&["Mountain"])
                .with_ability(ParsedAbility::mana(&[Color::Red])),
        )
    }

    fn taiga() -> Arc<CardDefinition> {
        Arc::new(
            CardDefinition::new("Taiga", ManaCost::new(), &[CardType::Land])
                .with_subtypes(&["Mountain", "Forest"])
                .with_ability(ParsedAbility::mana(&[Color::Red, Color::Green])),
        )
    }

    fn main_phase_game() -> GameState {
        let mut game = GameState::new_two_player("Alice", "Bob", EngineConfig::default());
        game.turn.phase = Phase::Main1;
        game
    }

    #[test]
    fn test_play_land_once_per_turn() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let first = game.create_card(alice, mountain(), Zone::Hand).unwrap();
        let second = game.create_card(alice, mountain(), Zone::Hand).unwrap();

        game.play_land(alice, first).unwrap();
        assert!(game.battlefield(alice).contains(&first));
        assert!(game.turn.land_played);
        assert!(game.play_land(alice, second).is_err());
        assert!(game.hand(alice).contains(&second));
    }

    #[test]
    fn test_play_land_needs_own_main_phase() {
        let mut game = main_phase_game();
        let bob = PlayerId::new(1);
        let land = game.create_card(bob, mountain(), Zone::Hand).unwrap();
        assert!(game.play_land(bob, land).is_err());

        game.turn.phase = Phase::Upkeep;
        let alice = PlayerId::new(0);
        let land = game.create_card(alice, mountain(), Zone::Hand).unwrap();
        assert!(game.play_land(alice, land).is_err());
    }

    #[test]
    fn test_tap_for_mana() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let land = game.create_card(alice, mountain(), Zone::Battlefield).unwrap();

        game.tap_for_mana(alice, land).unwrap();
        assert!(game.card(land).unwrap().tapped);
        assert_eq!(game.players[0].mana_pool.total(), 1);
        assert!(game.tap_for_mana(alice, land).is_err());
    }

    #[test]
    fn test_dual_land_adds_one_choice() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let land = game.create_card(alice, taiga(), Zone::Battlefield).unwrap();

        game.tap_for_mana(alice, land).unwrap();
        let pool = &game.players[0].mana_pool;
        assert_eq!(pool.total(), 1);
        assert!(pool.can_pay(&ManaCost::parse("G").unwrap()));
        assert!(pool.can_pay(&ManaCost::parse("R").unwrap()));
    }

    #[test]
    fn test_aura_mana_is_added_on_tap() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let forest = Arc::new(
            CardDefinition::new("Forest", ManaCost::new(), &[CardType::Land])
                .with_ability(ParsedAbility::mana(&[Color::Green])),
        );
        let wild_growth = Arc::new(
            CardDefinition::new("Wild Growth", ManaCost::parse("G").unwrap(), &[CardType::Enchantment])
                .with_subtypes(&["Aura"])
                .with_ability(ParsedAbility::mana(&[Color::Green])),
        );
        let land = game.create_card(alice, forest, Zone::Battlefield).unwrap();
        let aura = game.create_card(alice, wild_growth, Zone::Battlefield).unwrap();
        game.cards.get_mut(aura).unwrap().attached_to = Some(Target::Card(land));
        game.cards.get_mut(land).unwrap().attachments.push(aura);

        // The aura itself is not a mana source
        assert!(!game.can_tap_for_mana(alice, aura));
        game.tap_for_mana(alice, land).unwrap();
        assert_eq!(game.players[0].mana_pool.total(), 2);
    }

    #[test]
    fn test_discard_requires_card_in_hand() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let land = game.create_card(alice, mountain(), Zone::Battlefield).unwrap();
        assert!(game.discard(alice, land).is_err());

        let card = game.create_card(alice, mountain(), Zone::Hand).unwrap();
        game.discard(alice, card).unwrap();
        assert_eq!(game.card(card).unwrap().current_zone, Zone::Graveyard);
    }

    #[test]
    fn test_process_action_rejects_unoffered_action() {
        let mut game = main_phase_game();
        let bob = PlayerId::new(1);
        let land = game.create_card(bob, mountain(), Zone::Hand).unwrap();

        let err = game.process_action(bob, &PlayerAction::play_land(land));
        assert!(err.is_err());
        assert!(game.hand(bob).contains(&land));
    }

    #[test]
    fn test_action_display() {
        let action = PlayerAction::block(CardId::new(4), CardId::new(3));
        assert_eq!(action.to_string(), "DeclareBlocker 4 -> 3");
        assert_eq!(PlayerAction::pass().to_string(), "PassPriority");
    }
}
