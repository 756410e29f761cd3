//! Combat system
//!
//! Handles declaring attackers, declaring blockers, and combat damage.
//! Damage assignment itself is a pure function over a snapshot of the
//! combatants so both damage steps can be computed before anything is applied.

use crate::core::{CardId, Keyword, PlayerId, Target};
use crate::game::{CombatStep, GameState};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Combat state for the current combat phase
///
/// Reset at the end of combat. Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CombatState {
    /// Attacking creatures, in declaration order
    pub attackers: Vec<CardId>,

    /// Attacker -> blockers, in the order the blocks were declared
    pub blockers: BTreeMap<CardId, SmallVec<[CardId; 2]>>,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_attacker(&mut self, attacker: CardId) {
        self.attackers.push(attacker);
    }

    pub fn declare_blocker(&mut self, blocker: CardId, attacker: CardId) {
        self.blockers.entry(attacker).or_default().push(blocker);
    }

    pub fn is_attacking(&self, card_id: CardId) -> bool {
        self.attackers.contains(&card_id)
    }

    pub fn is_blocking(&self, card_id: CardId) -> bool {
        self.blockers.values().any(|b| b.contains(&card_id))
    }

    /// Was a blocker declared for this attacker (even if it has since died)?
    pub fn is_blocked(&self, attacker: CardId) -> bool {
        self.blockers.get(&attacker).is_some_and(|b| !b.is_empty())
    }

    pub fn blockers_of(&self, attacker: CardId) -> &[CardId] {
        self.blockers
            .get(&attacker)
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_attackers(&self) -> bool {
        !self.attackers.is_empty()
    }

    /// Every attacker and blocker
    pub fn participants(&self) -> impl Iterator<Item = CardId> + '_ {
        self.attackers
            .iter()
            .copied()
            .chain(self.blockers.values().flat_map(|b| b.iter().copied()))
    }

    /// Clear all combat state (called at end of combat)
    pub fn clear(&mut self) {
        self.attackers.clear();
        self.blockers.clear();
    }
}

/// What damage assignment needs to know about a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combatant {
    pub id: CardId,
    pub power: i32,
    /// Effective toughness minus damage already marked
    pub remaining_toughness: i32,
    pub deathtouch: bool,
    pub trample: bool,
}

/// Damage one creature deals to one recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageAssignment {
    pub source: CardId,
    pub target: Target,
    pub amount: i32,
}

/// Split an attacker's power among its blockers and the defending player
///
/// Each blocker in order gets lethal damage (its remaining toughness, at
/// least 1, or just 1 from a deathtouch attacker) until power runs out. A
/// trampler sends whatever is left to the player; anything else drops the
/// remainder. An unblocked attacker hits the player for full power.
pub fn assign_attacker_damage(
    attacker: &Combatant,
    blockers: &[Combatant],
    blocked: bool,
    defender: PlayerId,
) -> SmallVec<[DamageAssignment; 4]> {
    let mut assignments = SmallVec::new();
    let mut remaining = attacker.power.max(0);

    if !blocked {
        if remaining > 0 {
            assignments.push(DamageAssignment {
                source: attacker.id,
                target: Target::Player(defender),
                amount: remaining,
            });
        }
        return assignments;
    }

    for blocker in blockers {
        if remaining == 0 {
            break;
        }
        let lethal = if attacker.deathtouch {
            1
        } else {
            blocker.remaining_toughness.max(1)
        };
        let amount = lethal.min(remaining);
        assignments.push(DamageAssignment {
            source: attacker.id,
            target: Target::Card(blocker.id),
            amount,
        });
        remaining -= amount;
    }

    if attacker.trample && remaining > 0 {
        assignments.push(DamageAssignment {
            source: attacker.id,
            target: Target::Player(defender),
            amount: remaining,
        });
    }
    assignments
}

impl GameState {
    fn combatant(&self, id: CardId) -> Result<Combatant> {
        let card = self.cards.get(id)?;
        Ok(Combatant {
            id,
            power: self.effective_power(id)?,
            remaining_toughness: self.effective_toughness(id)? - card.damage_taken,
            deathtouch: self.has_keyword(id, &Keyword::Deathtouch),
            trample: self.has_keyword(id, &Keyword::Trample),
        })
    }

    /// Could this creature be declared as an attacker right now?
    pub fn can_attack(&self, player: PlayerId, card_id: CardId) -> bool {
        let Ok(card) = self.cards.get(card_id) else {
            return false;
        };
        card.owner == player
            && card.is_creature()
            && self.is_on_battlefield(card_id)
            && !card.tapped
            && (card.active || self.has_keyword(card_id, &Keyword::Haste))
            && !self.has_keyword(card_id, &Keyword::Defender)
            && !self.combat.is_attacking(card_id)
    }

    /// Why `blocker` may not block `attacker`, if it may not
    pub fn block_error(&self, player: PlayerId, blocker: CardId, attacker: CardId) -> Option<String> {
        let Ok(card) = self.cards.get(blocker) else {
            return Some(format!("unknown blocker {blocker}"));
        };
        if card.owner != player || !card.is_creature() || !self.is_on_battlefield(blocker) {
            return Some(format!("{} is not a creature you control", card.definition.name));
        }
        if card.tapped {
            return Some(format!("{} is tapped", card.definition.name));
        }
        if self.combat.is_blocking(blocker) {
            return Some(format!("{} is already blocking", card.definition.name));
        }
        if !self.combat.is_attacking(attacker) {
            return Some(format!("{} is not attacking", self.card_name(attacker)));
        }
        if self.has_keyword(attacker, &Keyword::Flying)
            && !self.has_keyword(blocker, &Keyword::Flying)
            && !self.has_keyword(blocker, &Keyword::Reach)
        {
            return Some(format!(
                "{} can't block {} (flying)",
                card.definition.name,
                self.card_name(attacker)
            ));
        }
        if let Some(land) = self
            .landwalk_types(attacker)
            .into_iter()
            .find(|land| self.controls_land_matching(player, land))
        {
            return Some(format!(
                "{} can't be blocked ({land}walk)",
                self.card_name(attacker)
            ));
        }
        None
    }

    pub fn can_block(&self, player: PlayerId, blocker: CardId, attacker: CardId) -> bool {
        self.block_error(player, blocker, attacker).is_none()
    }

    /// Declare an attacker; it taps unless it has vigilance
    pub fn declare_attacker(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        if self.turn.combat_step != Some(CombatStep::DeclareAttackers)
            || player != self.active_player_id()
        {
            return Err(MtgError::InvalidAction(
                "attackers are declared by the active player in the declare attackers step"
                    .to_string(),
            ));
        }
        if !self.can_attack(player, card_id) {
            return Err(MtgError::InvalidAction(format!(
                "{} ({card_id}) can't attack",
                self.card_name(card_id)
            )));
        }

        if !self.has_keyword(card_id, &Keyword::Vigilance) {
            self.cards.get_mut(card_id)?.tap();
        }
        self.combat.declare_attacker(card_id);
        self.logger.normal(&format!(
            "{} attacks with {} ({})",
            self.player_name(player),
            self.card_name(card_id),
            card_id
        ));
        Ok(())
    }

    pub fn declare_blocker(&mut self, player: PlayerId, blocker: CardId, attacker: CardId) -> Result<()> {
        if self.turn.combat_step != Some(CombatStep::DeclareBlockers)
            || player != self.defending_player()
        {
            return Err(MtgError::InvalidAction(
                "blockers are declared by the defending player in the declare blockers step"
                    .to_string(),
            ));
        }
        if let Some(reason) = self.block_error(player, blocker, attacker) {
            return Err(MtgError::InvalidAction(reason));
        }

        self.combat.declare_blocker(blocker, attacker);
        self.logger.normal(&format!(
            "{} blocks {} with {}",
            self.player_name(player),
            self.card_name(attacker),
            self.card_name(blocker)
        ));
        Ok(())
    }

    /// Does anyone in this combat have first strike or double strike?
    pub fn has_first_strike_combat(&self) -> bool {
        self.combat.participants().any(|id| self.strikes_first(id))
    }

    fn strikes_first(&self, id: CardId) -> bool {
        self.has_keyword(id, &Keyword::FirstStrike) || self.has_keyword(id, &Keyword::DoubleStrike)
    }

    /// Does this creature deal damage in the given damage step?
    fn deals_damage_in(&self, id: CardId, first_strike_step: bool) -> bool {
        if !self.is_on_battlefield(id) {
            return false;
        }
        if first_strike_step {
            self.strikes_first(id)
        } else {
            !self.has_keyword(id, &Keyword::FirstStrike)
                || self.has_keyword(id, &Keyword::DoubleStrike)
        }
    }

    /// Work out every damage assignment for one damage step
    ///
    /// Reads only; nothing is dealt until `resolve_combat_damage` applies the
    /// whole batch.
    pub fn compute_combat_damage(&self, first_strike_step: bool) -> Result<Vec<DamageAssignment>> {
        let defender = self.defending_player();
        let mut assignments = Vec::new();

        for &attacker_id in &self.combat.attackers {
            if !self.is_on_battlefield(attacker_id) {
                continue;
            }
            let blocked = self.combat.is_blocked(attacker_id);
            let surviving: Vec<Combatant> = self
                .combat
                .blockers_of(attacker_id)
                .iter()
                .filter(|id| self.is_on_battlefield(**id))
                .map(|id| self.combatant(*id))
                .collect::<Result<_>>()?;

            if self.deals_damage_in(attacker_id, first_strike_step) {
                let attacker = self.combatant(attacker_id)?;
                assignments.extend(assign_attacker_damage(&attacker, &surviving, blocked, defender));
            }

            for blocker in &surviving {
                if blocker.power > 0 && self.deals_damage_in(blocker.id, first_strike_step) {
                    assignments.push(DamageAssignment {
                        source: blocker.id,
                        target: Target::Card(attacker_id),
                        amount: blocker.power,
                    });
                }
            }
        }
        Ok(assignments)
    }

    /// Deal one step's combat damage simultaneously, with lifelink
    pub fn resolve_combat_damage(&mut self, first_strike_step: bool) -> Result<()> {
        let assignments = self.compute_combat_damage(first_strike_step)?;

        for assignment in &assignments {
            self.logger.normal(&format!(
                "{} deals {} damage to {}",
                self.card_name(assignment.source),
                assignment.amount,
                self.target_name(assignment.target)
            ));
            self.damage_target(assignment.target, assignment.amount, Some(assignment.source))?;

            if self.has_keyword(assignment.source, &Keyword::Lifelink) {
                let controller = self.cards.get(assignment.source)?.owner;
                self.player_mut(controller)?.gain_life(assignment.amount);
            }
        }
        Ok(())
    }
}
