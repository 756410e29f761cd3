//! Legal-move enumeration
//!
//! `available_actions` is the only place legality is decided for the
//! actor protocol. It is recomputed for every priority request.

use crate::core::{
    CardId, CardType, Keyword, ManaPool, ParsedTargetSpec, PlayerId, Target, TargetController,
    TargetKind,
};
use crate::game::{CombatStep, GameState, PlayerAction};
use crate::zones::Zone;

impl GameState {
    /// Everything `player` may do right now, with `PassPriority` last
    ///
    /// During the cleanup discard only `Discard` actions are offered.
    pub fn available_actions(&self, player: PlayerId) -> Vec<PlayerAction> {
        let hand = self.hand(player);

        if self.turn.discarding {
            return hand.iter().map(|id| PlayerAction::discard(*id)).collect();
        }

        let mut actions = Vec::new();
        let sorcery_timing = self.is_sorcery_timing(player);

        for &card_id in hand {
            let Ok(card) = self.cards.get(card_id) else {
                continue;
            };
            if card.is_land() {
                if sorcery_timing && !self.turn.land_played {
                    actions.push(PlayerAction::play_land(card_id));
                }
                continue;
            }

            let instant_speed =
                card.is_type(CardType::Instant) || self.has_keyword(card_id, &Keyword::Flash);
            if !(sorcery_timing || instant_speed) || !self.can_afford(player, card_id) {
                continue;
            }

            if card.definition.cast_target_ability().is_some() {
                for target in self.available_targets(player, card_id) {
                    actions.push(PlayerAction::cast(card_id, Some(target)));
                }
            } else {
                actions.push(PlayerAction::cast(card_id, None));
            }
        }

        match self.turn.combat_step {
            Some(CombatStep::DeclareAttackers) if player == self.active_player_id() => {
                actions.extend(
                    self.available_attackers(player)
                        .into_iter()
                        .map(PlayerAction::attack),
                );
            }
            Some(CombatStep::DeclareBlockers) if player == self.defending_player() => {
                for blocker in self.available_blockers(player) {
                    for &attacker in &self.combat.attackers {
                        if self.can_block(player, blocker, attacker) {
                            actions.push(PlayerAction::block(blocker, attacker));
                        }
                    }
                }
            }
            _ => {}
        }

        actions.push(PlayerAction::pass());
        actions
    }

    /// Creatures `player` could declare as attackers
    pub fn available_attackers(&self, player: PlayerId) -> Vec<CardId> {
        self.battlefield(player)
            .iter()
            .copied()
            .filter(|id| self.can_attack(player, *id))
            .collect()
    }

    /// Untapped creatures `player` controls that aren't blocking yet
    pub fn available_blockers(&self, player: PlayerId) -> Vec<CardId> {
        self.battlefield(player)
            .iter()
            .copied()
            .filter(|id| {
                self.cards
                    .get(*id)
                    .is_ok_and(|c| c.is_creature() && !c.tapped)
                    && !self.combat.is_blocking(*id)
            })
            .collect()
    }

    /// The pool plus everything `player`'s untapped producers would add
    pub fn available_mana(&self, player: PlayerId, pool: &ManaPool) -> ManaPool {
        let mut total = pool.clone();
        for &id in self.battlefield(player) {
            if self.can_tap_for_mana(player, id) {
                for source in self.mana_sources(id) {
                    total.add(source);
                }
            }
        }
        total
    }

    fn can_afford(&self, player: PlayerId, card_id: CardId) -> bool {
        let (Ok(card), Ok(owner)) = (self.cards.get(card_id), self.player(player)) else {
            return false;
        };
        self.available_mana(player, &owner.mana_pool)
            .can_pay(card.mana_cost())
    }

    /// Legal targets for a card `player` is casting, in offer order
    ///
    /// Opponents' objects come before the caster's own: the opposing player,
    /// opposing permanents, own permanents, then the caster. Empty for
    /// cards that don't target.
    pub fn available_targets(&self, player: PlayerId, card_id: CardId) -> Vec<Target> {
        let Some(spec) = self
            .cards
            .get(card_id)
            .ok()
            .and_then(|c| c.definition.cast_target_ability())
            .and_then(|a| a.target_spec)
        else {
            return Vec::new();
        };

        let opponents: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.id != player && !p.has_lost)
            .map(|p| p.id)
            .collect();

        let mut targets = Vec::new();
        for &opponent in &opponents {
            targets.push(Target::Player(opponent));
        }
        for &opponent in &opponents {
            targets.extend(self.battlefield(opponent).iter().map(|id| Target::Card(*id)));
        }
        targets.extend(self.battlefield(player).iter().map(|id| Target::Card(*id)));
        targets.push(Target::Player(player));

        targets.retain(|t| self.is_legal_target(player, &spec, *t));
        targets
    }

    /// Does `target` satisfy `spec` from `caster`'s point of view?
    pub fn is_legal_target(&self, caster: PlayerId, spec: &ParsedTargetSpec, target: Target) -> bool {
        let controller = match target {
            Target::Card(id) => match self.cards.get(id) {
                Ok(card) if card.current_zone == Zone::Battlefield => card.owner,
                _ => return false,
            },
            Target::Player(id) => match self.player(id) {
                Ok(p) if !p.has_lost => id,
                _ => return false,
            },
        };

        let controller_ok = match spec.controller {
            TargetController::Any => true,
            TargetController::You => controller == caster,
            TargetController::Opponent => controller != caster,
        };

        let kind_ok = match (spec.kind, target) {
            (TargetKind::Player | TargetKind::AnyTarget, Target::Player(_)) => true,
            (TargetKind::Player, Target::Card(_)) => false,
            (TargetKind::AnyTarget | TargetKind::Creature, Target::Card(id)) => {
                self.cards.get(id).is_ok_and(|c| c.is_creature())
            }
            (TargetKind::Land, Target::Card(id)) => self.cards.get(id).is_ok_and(|c| c.is_land()),
            (TargetKind::Creature | TargetKind::Land, Target::Player(_)) => false,
        };

        controller_ok && kind_ok
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{
        CardDefinition, CardType, Color, Keyword, ManaCost, ParsedAbility, ParsedEffect,
        ParsedTargetSpec, PlayerId, Target, TargetKind,
    };
    use crate::game::{ActionKind, CombatStep, GameState, Phase, PlayerAction};
    use crate::zones::Zone;
    use crate::EngineConfig;
    use similar_asserts::assert_eq;
    use std::sync::Arc;

    fn mountain() -> Arc<CardDefinition> {
        Arc::new(
            CardDefinition::new("Mountain", ManaCost::new(), &[CardType::Land])
                .with_subtypes(&["Mountain"])
                .with_ability(ParsedAbility::mana(&[Color::Red])),
        )
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

    fn creature(name: &str, keywords: &[Keyword]) -> Arc<CardDefinition> {
        Arc::new(
            CardDefinition::new(name, ManaCost::parse("1").unwrap(), &[CardType::Creature])
                .with_stats(2, 2)
                .with_keywords(keywords),
        )
    }

    fn game() -> GameState {
        let mut game = GameState::new_two_player("Alice", "Bob", EngineConfig::default());
        game.turn.phase = Phase::Main1;
        game
    }

    #[test]
    fn test_pass_is_always_last() {
        let game = game();
        let actions = game.available_actions(PlayerId::new(1));
        assert_eq!(actions, vec![PlayerAction::pass()]);
    }

    #[test]
    fn test_main_phase_offers_land_and_targets_in_order() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let land = game.create_card(alice, mountain(), Zone::Battlefield).unwrap();
        let bolt = game.create_card(alice, bolt(), Zone::Hand).unwrap();
        let in_hand = game.create_card(alice, mountain(), Zone::Hand).unwrap();
        let theirs = game.create_card(bob, creature("Grizzly Bears", &[]), Zone::Battlefield).unwrap();
        let mine = game.create_card(alice, creature("Kird Ape", &[]), Zone::Battlefield).unwrap();

        let actions = game.available_actions(alice);
        assert_eq!(
            actions,
            vec![
                PlayerAction::cast(bolt, Some(Target::Player(bob))),
                PlayerAction::cast(bolt, Some(Target::Card(theirs))),
                PlayerAction::cast(bolt, Some(Target::Card(mine))),
                PlayerAction::cast(bolt, Some(Target::Player(alice))),
                PlayerAction::play_land(in_hand),
                PlayerAction::pass(),
            ]
        );
        assert!(!game.card(land).unwrap().tapped);
    }

    #[test]
    fn test_only_instants_off_turn() {
        let mut game = game();
        let bob = PlayerId::new(1);
        game.create_card(bob, mountain(), Zone::Battlefield).unwrap();
        game.create_card(bob, mountain(), Zone::Battlefield).unwrap();
        game.create_card(bob, bolt(), Zone::Hand).unwrap();
        game.create_card(bob, creature("Grizzly Bears", &[]), Zone::Hand).unwrap();
        game.create_card(bob, mountain(), Zone::Hand).unwrap();

        let kinds: Vec<ActionKind> = game.available_actions(bob).iter().map(|a| a.kind).collect();
        assert!(kinds.iter().all(|k| matches!(k, ActionKind::CastSpell | ActionKind::PassPriority)));
        let casts = game.available_actions(bob).len() - 1;
        // Bolt at either player; the creature is sorcery speed
        assert_eq!(casts, 2);
    }

    #[test]
    fn test_unaffordable_spells_are_not_offered() {
        let mut game = game();
        let alice = PlayerId::new(0);
        game.create_card(alice, bolt(), Zone::Hand).unwrap();
        assert_eq!(game.available_actions(alice), vec![PlayerAction::pass()]);
    }

    #[test]
    fn test_discard_mode_offers_only_discards() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let a = game.create_card(alice, mountain(), Zone::Hand).unwrap();
        let b = game.create_card(alice, bolt(), Zone::Hand).unwrap();
        game.turn.discarding = true;

        assert_eq!(
            game.available_actions(alice),
            vec![PlayerAction::discard(a), PlayerAction::discard(b)]
        );
    }

    #[test]
    fn test_flying_attacker_filters_blockers() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let angel = game.create_card(alice, creature("Serra Angel", &[Keyword::Flying]), Zone::Battlefield).unwrap();
        let bears = game.create_card(bob, creature("Grizzly Bears", &[]), Zone::Battlefield).unwrap();
        let spider = game.create_card(bob, creature("Giant Spider", &[Keyword::Reach]), Zone::Battlefield).unwrap();

        game.turn.phase = Phase::Combat;
        game.turn.combat_step = Some(CombatStep::DeclareAttackers);
        game.declare_attacker(alice, angel).unwrap();
        game.turn.combat_step = Some(CombatStep::DeclareBlockers);

        let actions = game.available_actions(bob);
        assert!(actions.contains(&PlayerAction::block(spider, angel)));
        assert!(!actions.contains(&PlayerAction::block(bears, angel)));
        assert!(game.declare_blocker(bob, bears, angel).is_err());
        game.declare_blocker(bob, spider, angel).unwrap();
    }

    #[test]
    fn test_controller_filter() {
        let mut game = game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let mine = game.create_card(alice, creature("Kird Ape", &[]), Zone::Battlefield).unwrap();
        let theirs = game.create_card(bob, creature("Grizzly Bears", &[]), Zone::Battlefield).unwrap();

        let spec = ParsedTargetSpec::new(TargetKind::Creature)
            .controlled_by(crate::core::TargetController::Opponent);
        assert!(game.is_legal_target(alice, &spec, Target::Card(theirs)));
        assert!(!game.is_legal_target(alice, &spec, Target::Card(mine)));
        assert!(!game.is_legal_target(alice, &spec, Target::Player(bob)));
    }
}
