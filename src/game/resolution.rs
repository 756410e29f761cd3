//! Resolving stack items and applying effects

use crate::core::{
    AbilityType, CardId, Keyword, LossReason, ParsedEffect, PlayerId, Target, Trigger,
};
use crate::game::{GameState, StackItem};
use crate::zones::Zone;
use crate::{MtgError, Result};

impl GameState {
    /// Resolve one item popped off the stack
    ///
    /// Instants and sorceries apply their effect and go to the graveyard;
    /// an effect that fails is logged and the card still leaves the stack.
    /// Auras re-check their target and attach, or fizzle into the graveyard.
    /// Everything else enters the battlefield and fires its ETB triggers.
    /// State-based actions are left to the caller.
    pub fn resolve_stack_item(&mut self, item: StackItem) -> Result<()> {
        let StackItem {
            card: card_id,
            controller,
            target,
        } = item;
        let card = self.cards.get(card_id)?;
        let definition = card.definition.clone();
        let (is_spell, is_aura) = (card.is_instant_or_sorcery(), card.is_aura());
        self.logger.normal(&format!(
            "Resolving {} ({}) for {}",
            definition.name,
            card_id,
            self.player_name(controller)
        ));

        if is_spell {
            if let Some(effect) = definition.spell_ability().and_then(|a| a.effect.clone()) {
                let still_legal = match (target, definition.cast_target_ability()) {
                    (Some(t), Some(ability)) => ability
                        .target_spec
                        .is_some_and(|spec| self.is_legal_target(controller, &spec, t)),
                    _ => true,
                };
                if still_legal {
                    if let Err(e) = self.apply_effect(controller, Some(card_id), &effect, target) {
                        self.logger
                            .normal(&format!("{} has no effect: {}", definition.name, e));
                    }
                } else {
                    self.logger.normal(&format!(
                        "{} fizzles: its target is gone",
                        definition.name
                    ));
                }
            }
            return self.put_into_zone(card_id, Zone::Graveyard);
        }

        if is_aura {
            return self.resolve_aura(card_id, controller, target);
        }

        self.put_into_zone(card_id, Zone::Battlefield)?;
        let haste = self.has_keyword(card_id, &Keyword::Haste);
        let card = self.cards.get_mut(card_id)?;
        card.active = !card.is_creature() || haste;
        self.fire_enter_triggers(card_id, controller)
    }

    /// Place a card that is no longer on the stack
    fn put_into_zone(&mut self, card_id: CardId, zone: Zone) -> Result<()> {
        let owner = self.cards.get(card_id)?.owner;
        let idx = self.player_index(owner)?;
        if let Some(list) = self.players[idx].zones.get_zone_mut(zone) {
            list.add(card_id);
        }
        self.cards.get_mut(card_id)?.current_zone = zone;
        Ok(())
    }

    fn resolve_aura(&mut self, aura: CardId, controller: PlayerId, target: Option<Target>) -> Result<()> {
        let spec = self
            .cards
            .get(aura)?
            .definition
            .cast_target_ability()
            .and_then(|a| a.target_spec);
        let host = match (target, spec) {
            (Some(t), Some(spec)) if self.is_legal_target(controller, &spec, t) => t,
            _ => {
                self.logger.normal(&format!(
                    "{} ({}) has no legal host and goes to the graveyard",
                    self.card_name(aura),
                    aura
                ));
                return self.put_into_zone(aura, Zone::Graveyard);
            }
        };

        self.put_into_zone(aura, Zone::Battlefield)?;
        if let Target::Card(host_id) = host {
            self.cards.get_mut(host_id)?.attachments.push(aura);
        }
        let card = self.cards.get_mut(aura)?;
        card.attached_to = Some(host);
        card.active = true;
        self.logger.normal(&format!(
            "{} ({}) enchants {}",
            self.card_name(aura),
            aura,
            self.target_name(host)
        ));
        Ok(())
    }

    /// Run enters-the-battlefield triggers for a permanent that just arrived
    ///
    /// A targeted trigger takes the first legal target in offer order and
    /// does nothing if there is none; an untargeted one affects its controller.
    fn fire_enter_triggers(&mut self, card_id: CardId, controller: PlayerId) -> Result<()> {
        let triggers: Vec<_> = self
            .cards
            .get(card_id)?
            .definition
            .abilities
            .iter()
            .filter(|a| a.kind == AbilityType::Triggered && a.trigger == Some(Trigger::EntersBattlefield))
            .filter_map(|a| a.effect.clone().map(|e| (e, a.target_spec)))
            .collect();

        for (effect, spec) in triggers {
            let target = match spec {
                Some(spec) => {
                    let opponents: Vec<PlayerId> = self
                        .players
                        .iter()
                        .filter(|p| p.id != controller && !p.has_lost)
                        .map(|p| p.id)
                        .collect();
                    let mut candidates: Vec<Target> =
                        opponents.iter().map(|p| Target::Player(*p)).collect();
                    for opponent in &opponents {
                        candidates.extend(self.battlefield(*opponent).iter().map(|id| Target::Card(*id)));
                    }
                    candidates.extend(self.battlefield(controller).iter().map(|id| Target::Card(*id)));
                    candidates.push(Target::Player(controller));

                    match candidates
                        .into_iter()
                        .find(|t| self.is_legal_target(controller, &spec, *t))
                    {
                        Some(t) => Some(t),
                        None => continue,
                    }
                }
                None => Some(Target::Player(controller)),
            };
            self.logger.verbose(&format!(
                "{} ({}) enter trigger",
                self.card_name(card_id),
                card_id
            ));
            if let Err(e) = self.apply_effect(controller, Some(card_id), &effect, target) {
                self.logger.normal(&format!(
                    "{} ({}) trigger has no effect: {}",
                    self.card_name(card_id),
                    card_id,
                    e
                ));
            }
        }
        Ok(())
    }

    /// Apply one effect on behalf of `controller`
    pub fn apply_effect(
        &mut self,
        controller: PlayerId,
        source: Option<CardId>,
        effect: &ParsedEffect,
        target: Option<Target>,
    ) -> Result<()> {
        match effect {
            ParsedEffect::DealDamage { amount } => {
                let target = require_target(target, "damage")?;
                self.logger.normal(&format!(
                    "{} deals {} damage to {}",
                    source.map(|s| self.card_name(s)).unwrap_or("Effect"),
                    amount,
                    self.target_name(target)
                ));
                self.damage_target(target, *amount, source)?;
            }
            ParsedEffect::GainLife { amount } => {
                let player = match target {
                    Some(Target::Player(p)) => p,
                    _ => controller,
                };
                self.player_mut(player)?.gain_life(*amount);
                self.logger.normal(&format!(
                    "{} gains {} life",
                    self.player_name(player),
                    amount
                ));
            }
            ParsedEffect::DrawCards { count } => {
                let player = match target {
                    Some(Target::Player(p)) => p,
                    _ => controller,
                };
                for _ in 0..*count {
                    if self.draw_card(player)?.is_none() {
                        self.logger.normal(&format!(
                            "{} can't draw from an empty library",
                            self.player_name(player)
                        ));
                        self.player_mut(player)?.lose_game(LossReason::Decking);
                        break;
                    }
                }
                self.logger.normal(&format!(
                    "{} draws {} card(s)",
                    self.player_name(player),
                    count
                ));
            }
            ParsedEffect::Pump { power, toughness } => {
                let target = require_target(target, "pump")?;
                self.boost_target(target, *power, *toughness)?;
                self.logger.normal(&format!(
                    "{} gets {:+}/{:+} until end of turn",
                    self.target_name(target),
                    power,
                    toughness
                ));
            }
            ParsedEffect::AddMana { colors } => {
                let pool = &mut self.player_mut(controller)?.mana_pool;
                for color in colors {
                    pool.add_color(*color);
                }
            }
            ParsedEffect::Destroy => match require_target(target, "destroy")? {
                Target::Card(id) => {
                    if self.is_on_battlefield(id) {
                        self.logger.normal(&format!("{} ({}) is destroyed", self.card_name(id), id));
                        self.move_card(id, Zone::Graveyard)?;
                    }
                }
                Target::Player(_) => {
                    return Err(MtgError::InvalidAction("players can't be destroyed".to_string()))
                }
            },
        }
        Ok(())
    }
}

fn require_target(target: Option<Target>, what: &str) -> Result<Target> {
    target.ok_or_else(|| MtgError::InvalidAction(format!("{what} effect needs a target")))
}

#[cfg(test)]
mod tests {
    use crate::core::{
        CardDefinition, CardType, Color, Keyword, ManaCost, ParsedAbility, ParsedEffect,
        ParsedTargetSpec, PlayerId, Target, TargetKind,
    };
    use crate::game::{GameState, Phase, StackItem};
    use crate::zones::Zone;
    use crate::EngineConfig;
    use std::sync::Arc;

    fn game() -> GameState {
        let mut game = GameState::new_two_player("Alice", "Bob", EngineConfig::default());
        game.turn.phase = Phase::Main1;
        game
    }

    fn mountains(game: &mut GameState, player: PlayerId, n: usize) {
        let def = Arc::new(
            CardDefinition::new("Mountain", ManaCost::new(), &[CardType::Land])
                .with_ability(ParsedAbility::mana(&[Color::Red])),
        );
        for _ in 0..n {
            game.create_card(player, def.clone(), Zone::Battlefield).unwrap();
        }
    }

    fn bolt() -> Arc<CardDefinition> {
        Arc::new(
            CardDefinition::new("Lightning Bolt", ManaCost::parse("R").unwrap(), &[CardType::Instant])
                .with_ability(ParsedAbility::spell(
                    ParsedEffect::DealDamage { amount: 3 },
                    Some(ParsedTargetSpec::new(TargetKind::AnyTarget)),
                )),
        )
    }

    fn resolve_top(game: &mut GameState) {
        let item = game.stack.take_resolving().unwrap();
        game.resolve_stack_item(item).unwrap();
        game.check_state_based_actions().unwrap();
    }

    #[test]
    fn test_bolt_to_face() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        mountains(&mut game, alice, 1);
        let bolt = game.create_card(alice, bolt(), Zone::Hand).unwrap();

        game.cast_spell(alice, bolt, Some(Target::Player(bob))).unwrap();
        assert!(game.stack.contains(bolt));
        resolve_top(&mut game);

        assert_eq!(game.player(bob).unwrap().life, 17);
        assert_eq!(game.card(bolt).unwrap().current_zone, Zone::Graveyard);
        assert!(game.stack.is_empty());
    }

    #[test]
    fn test_pump_saves_creature_from_bolt() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        mountains(&mut game, bob, 1);
        let bears = game
            .create_card(
                alice,
                Arc::new(
                    CardDefinition::new("Grizzly Bears", ManaCost::parse("1G").unwrap(), &[CardType::Creature])
                        .with_stats(2, 2),
                ),
                Zone::Battlefield,
            )
            .unwrap();
        let growth = Arc::new(
            CardDefinition::new("Giant Growth", ManaCost::new(), &[CardType::Instant]).with_ability(
                ParsedAbility::spell(
                    ParsedEffect::Pump { power: 3, toughness: 3 },
                    Some(ParsedTargetSpec::new(TargetKind::Creature)),
                ),
            ),
        );
        let growth = game.create_card(alice, growth, Zone::Hand).unwrap();
        let bolt = game.create_card(bob, bolt(), Zone::Hand).unwrap();

        game.cast_spell(bob, bolt, Some(Target::Card(bears))).unwrap();
        game.cast_spell(alice, growth, Some(Target::Card(bears))).unwrap();

        resolve_top(&mut game);
        assert_eq!(game.effective_toughness(bears).unwrap(), 5);
        resolve_top(&mut game);
        assert!(game.is_on_battlefield(bears));
        assert_eq!(game.card(bears).unwrap().damage_taken, 3);
    }

    #[test]
    fn test_fizzle_when_target_left() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        mountains(&mut game, alice, 1);
        let bears = game
            .create_card(
                bob,
                Arc::new(
                    CardDefinition::new("Grizzly Bears", ManaCost::parse("1G").unwrap(), &[CardType::Creature])
                        .with_stats(2, 2),
                ),
                Zone::Battlefield,
            )
            .unwrap();
        let bolt = game.create_card(alice, bolt(), Zone::Hand).unwrap();
        game.logger.enable_capture();
        game.cast_spell(alice, bolt, Some(Target::Card(bears))).unwrap();

        game.move_card(bears, Zone::Graveyard).unwrap();
        resolve_top(&mut game);
        assert_eq!(game.player(bob).unwrap().life, 20);
        assert_eq!(game.card(bolt).unwrap().current_zone, Zone::Graveyard);
        assert!(game.logger.logs().contains("fizzles"));
    }

    #[test]
    fn test_effect_error_still_clears_the_stack() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        // A pump that imported card data let aim at anything
        let odd_growth = Arc::new(
            CardDefinition::new("Odd Growth", ManaCost::new(), &[CardType::Instant]).with_ability(
                ParsedAbility::spell(
                    ParsedEffect::Pump { power: 3, toughness: 3 },
                    Some(ParsedTargetSpec::new(TargetKind::AnyTarget)),
                ),
            ),
        );
        let growth = game.create_card(alice, odd_growth, Zone::Hand).unwrap();
        game.logger.enable_capture();

        game.cast_spell(alice, growth, Some(Target::Player(bob))).unwrap();
        resolve_top(&mut game);

        assert_eq!(game.card(growth).unwrap().current_zone, Zone::Graveyard);
        assert!(game.zones(alice).unwrap().graveyard.contains(growth));
        assert!(game.stack.is_empty());
        assert!(game.logger.logs().contains("has no effect"));
    }

    #[test]
    fn test_creature_enters_summoning_sick_unless_haste() {
        let mut game = game();
        let alice = PlayerId::new(0);
        mountains(&mut game, alice, 2);
        let goblin = Arc::new(
            CardDefinition::new("Raging Goblin", ManaCost::parse("R").unwrap(), &[CardType::Creature])
                .with_stats(1, 1)
                .with_keywords(&[Keyword::Haste]),
        );
        let ape = Arc::new(
            CardDefinition::new("Kird Ape", ManaCost::parse("R").unwrap(), &[CardType::Creature])
                .with_stats(1, 1),
        );
        let goblin = game.create_card(alice, goblin, Zone::Hand).unwrap();
        let ape = game.create_card(alice, ape, Zone::Hand).unwrap();

        game.cast_spell(alice, goblin, None).unwrap();
        resolve_top(&mut game);
        game.cast_spell(alice, ape, None).unwrap();
        resolve_top(&mut game);

        assert!(game.card(goblin).unwrap().active);
        assert!(!game.card(ape).unwrap().active);
        assert!(game.can_attack(alice, goblin));
        assert!(!game.can_attack(alice, ape));
    }

    #[test]
    fn test_aura_attaches_and_grants() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let forest = Arc::new(
            CardDefinition::new("Forest", ManaCost::new(), &[CardType::Land])
                .with_ability(ParsedAbility::mana(&[Color::Green])),
        );
        game.create_card(alice, forest, Zone::Battlefield).unwrap();
        let ape = game
            .create_card(
                alice,
                Arc::new(
                    CardDefinition::new("Kird Ape", ManaCost::parse("R").unwrap(), &[CardType::Creature])
                        .with_stats(1, 1),
                ),
                Zone::Battlefield,
            )
            .unwrap();
        let mut rancor_ability = ParsedAbility::static_boost(2, 0, &[Keyword::Trample]);
        rancor_ability.target_spec = Some(ParsedTargetSpec::new(TargetKind::Creature));
        let rancor = Arc::new(
            CardDefinition::new("Rancor", ManaCost::parse("G").unwrap(), &[CardType::Enchantment])
                .with_subtypes(&["Aura"])
                .with_ability(rancor_ability),
        );
        let rancor = game.create_card(alice, rancor, Zone::Hand).unwrap();

        game.cast_spell(alice, rancor, Some(Target::Card(ape))).unwrap();
        resolve_top(&mut game);

        assert_eq!(game.card(rancor).unwrap().attached_to, Some(Target::Card(ape)));
        assert_eq!(game.effective_power(ape).unwrap(), 3);
        assert!(game.has_keyword(ape, &Keyword::Trample));

        // Host dies, aura follows
        game.move_card(ape, Zone::Graveyard).unwrap();
        game.check_state_based_actions().unwrap();
        assert_eq!(game.card(rancor).unwrap().current_zone, Zone::Graveyard);
    }

    #[test]
    fn test_draw_effect_decks_out() {
        let mut game = game();
        let alice = PlayerId::new(0);
        game.apply_effect(alice, None, &ParsedEffect::DrawCards { count: 2 }, None)
            .unwrap();
        assert!(game.player(alice).unwrap().has_lost);
    }

    #[test]
    fn test_enter_trigger_targets_opponent_first() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        mountains(&mut game, alice, 1);
        let shock_elemental = Arc::new(
            CardDefinition::new("Spark Elemental", ManaCost::parse("R").unwrap(), &[CardType::Creature])
                .with_stats(1, 1)
                .with_ability(ParsedAbility::on_enter(
                    ParsedEffect::DealDamage { amount: 2 },
                    Some(ParsedTargetSpec::new(TargetKind::AnyTarget)),
                )),
        );
        let card = game.create_card(alice, shock_elemental, Zone::Hand).unwrap();
        game.cast_spell(alice, card, None).unwrap();
        resolve_top(&mut game);
        assert_eq!(game.player(bob).unwrap().life, 18);
    }
}
