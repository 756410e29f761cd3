//! Main game state structure

use crate::config::EngineConfig;
use crate::core::{
    AbilityType, Card, CardDefinition, CardId, EntityId, EntityStore, GameEntity, Keyword,
    LossReason, Player, PlayerId, Target,
};
use crate::game::{CombatState, GameLogger, PriorityStack, Turn};
use crate::zones::{PlayerZones, Zone};
use crate::{MtgError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// Complete game state
///
/// Owned by the rules thread for the whole match. Players reach it only
/// through their actor channels.
#[derive(Debug, Serialize)]
pub struct GameState {
    /// All players, in turn order
    pub players: Vec<Player>,

    /// Index of the player whose turn it is
    pub active_player: usize,

    /// Index of the player currently asked for input
    pub current_player: usize,

    pub turn: Turn,

    /// Spells waiting to resolve, plus the priority state machine
    pub stack: PriorityStack,

    /// Every card in the game, filled once by `start_game`
    pub cards: EntityStore<Card>,

    /// Combat state (active during the combat phase)
    pub combat: CombatState,

    /// Shuffling RNG, seeded from the config
    pub rng: ChaCha12Rng,

    #[serde(skip)]
    pub logger: GameLogger,

    pub config: EngineConfig,

    /// Unified entity ID generator (players first, then cards)
    next_entity_id: u32,
}

impl GameState {
    /// Create a game with one player per name
    pub fn new(player_names: &[&str], config: EngineConfig) -> Self {
        let mut next_id = 0;
        let players: Vec<Player> = player_names
            .iter()
            .map(|name| {
                let player = Player::new(PlayerId::new(next_id), *name, config.starting_life);
                next_id += 1;
                player
            })
            .collect();

        GameState {
            stack: PriorityStack::new(players.len()),
            players,
            active_player: 0,
            current_player: 0,
            turn: Turn::new(),
            cards: EntityStore::new(),
            combat: CombatState::new(),
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            logger: GameLogger::new(),
            config,
            next_entity_id: next_id,
        }
    }

    pub fn new_two_player(player1: &str, player2: &str, config: EngineConfig) -> Self {
        Self::new(&[player1, player2], config)
    }

    pub fn next_card_id(&mut self) -> CardId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Create a card instance and put it straight into one of its owner's zones
    ///
    /// Permanents created on the battlefield this way are not summoning sick.
    pub fn create_card(
        &mut self,
        owner: PlayerId,
        definition: Arc<CardDefinition>,
        zone: Zone,
    ) -> Result<CardId> {
        if zone == Zone::Stack {
            return Err(MtgError::InvalidAction(
                "cards enter the stack only by being cast".to_string(),
            ));
        }
        let idx = self.player_index(owner)?;
        let id = self.next_card_id();

        let mut card = Card::new(id, owner, definition);
        card.current_zone = zone;
        card.active = zone == Zone::Battlefield;
        self.cards.insert(id, card);

        if let Some(list) = self.players[idx].zones.get_zone_mut(zone) {
            list.add(id);
        }
        Ok(id)
    }

    /// Load decks into libraries, shuffle them and deal opening hands
    ///
    /// `decks[i]` belongs to `players[i]`.
    pub fn start_game(&mut self, decks: Vec<Vec<Arc<CardDefinition>>>) -> Result<()> {
        if decks.len() != self.players.len() {
            return Err(MtgError::InvalidAction(format!(
                "expected {} decks, got {}",
                self.players.len(),
                decks.len()
            )));
        }

        for (idx, deck) in decks.into_iter().enumerate() {
            let owner = self.players[idx].id;
            for definition in deck {
                self.create_card(owner, definition, Zone::Library)?;
            }
        }

        let rng = &mut self.rng;
        for player in &mut self.players {
            player.zones.library.shuffle(rng);
        }

        let hand_size = self.config.opening_hand_size;
        for idx in 0..self.players.len() {
            let player_id = self.players[idx].id;
            for _ in 0..hand_size {
                if self.draw_card(player_id)?.is_none() {
                    break;
                }
            }
            self.logger.verbose(&format!(
                "{} draws an opening hand of {} cards",
                self.players[idx].name,
                self.players[idx].hand_size()
            ));
        }

        self.active_player = 0;
        self.current_player = 0;
        self.turn = Turn::new();
        Ok(())
    }

    // === Players ===

    pub fn player_index(&self, id: PlayerId) -> Result<usize> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn active_player_id(&self) -> PlayerId {
        self.players[self.active_player].id
    }

    /// The player the active player attacks
    pub fn defending_player(&self) -> PlayerId {
        self.players[(self.active_player + 1) % self.players.len()].id
    }

    pub fn player_name(&self, id: PlayerId) -> &str {
        self.player(id).map(|p| p.name.as_str()).unwrap_or("Unknown")
    }

    pub fn zones(&self, player: PlayerId) -> Result<&PlayerZones> {
        Ok(&self.player(player)?.zones)
    }

    /// Cards in one of a player's zones
    pub fn zone_cards(&self, player: PlayerId, zone: Zone) -> Result<&[CardId]> {
        self.zones(player)?
            .get_zone(zone)
            .map(|z| z.cards.as_slice())
            .ok_or_else(|| MtgError::InvalidAction(format!("{zone} is not a player zone")))
    }

    pub fn battlefield(&self, player: PlayerId) -> &[CardId] {
        self.zone_cards(player, Zone::Battlefield).unwrap_or(&[])
    }

    pub fn hand(&self, player: PlayerId) -> &[CardId] {
        self.zone_cards(player, Zone::Hand).unwrap_or(&[])
    }

    // === Cards ===

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    pub fn card_name(&self, id: CardId) -> &str {
        self.cards.get(id).map(|c| c.name()).unwrap_or("Unknown")
    }

    pub fn is_on_battlefield(&self, id: CardId) -> bool {
        self.cards
            .get(id)
            .is_ok_and(|c| c.current_zone == Zone::Battlefield)
    }

    /// Move a card to another zone, keeping zone lists and `current_zone` in step
    ///
    /// Leaving the battlefield detaches the card from its host and wipes its
    /// in-play state. A card leaving the stack must already have been popped.
    pub fn move_card(&mut self, card_id: CardId, to: Zone) -> Result<()> {
        let (owner, from) = {
            let card = self.cards.get(card_id)?;
            (card.owner, card.current_zone)
        };
        if from == to {
            return Ok(());
        }
        let idx = self.player_index(owner)?;

        if let Some(list) = self.players[idx].zones.get_zone_mut(from) {
            if !list.remove(card_id) {
                return Err(MtgError::InvalidAction(format!(
                    "card {card_id} not found in {from}"
                )));
            }
        }

        if from == Zone::Battlefield {
            self.detach(card_id)?;
        }

        if let Some(list) = self.players[idx].zones.get_zone_mut(to) {
            list.add(card_id);
        }

        let card = self.cards.get_mut(card_id)?;
        if from == Zone::Battlefield {
            card.reset_for_zone_change();
        }
        card.current_zone = to;
        Ok(())
    }

    /// Unhook an aura from its host
    fn detach(&mut self, card_id: CardId) -> Result<()> {
        let host = self.cards.get(card_id)?.attached_to;
        if let Some(Target::Card(host_id)) = host {
            if let Ok(host) = self.cards.get_mut(host_id) {
                host.attachments.retain(|id| *id != card_id);
            }
        }
        self.cards.get_mut(card_id)?.attached_to = None;
        Ok(())
    }

    /// Draw the top card of a player's library; `None` when it is empty
    pub fn draw_card(&mut self, player: PlayerId) -> Result<Option<CardId>> {
        let top = self.zones(player)?.library.peek_top();
        match top {
            Some(card_id) => {
                self.move_card(card_id, Zone::Hand)?;
                Ok(Some(card_id))
            }
            None => Ok(None),
        }
    }

    // === Effective characteristics (printed + boosts + attached auras) ===

    fn attached_auras<'a>(&'a self, card: &'a Card) -> impl Iterator<Item = &'a Card> + 'a {
        card.attachments
            .iter()
            .filter_map(move |id| self.cards.get(*id).ok())
    }

    pub fn effective_power(&self, card_id: CardId) -> Result<i32> {
        let card = self.cards.get(card_id)?;
        let granted: i32 = self.attached_auras(card).map(|a| a.granted_boost().0).sum();
        Ok(card.base_power() + card.power_boost + granted)
    }

    pub fn effective_toughness(&self, card_id: CardId) -> Result<i32> {
        let card = self.cards.get(card_id)?;
        let granted: i32 = self.attached_auras(card).map(|a| a.granted_boost().1).sum();
        Ok(card.base_toughness() + card.toughness_boost + granted)
    }

    /// Printed keyword or one granted by an attached aura
    pub fn has_keyword(&self, card_id: CardId, keyword: &Keyword) -> bool {
        let Ok(card) = self.cards.get(card_id) else {
            return false;
        };
        card.has_printed_keyword(keyword)
            || self
                .attached_auras(card)
                .any(|aura| aura.granted_keywords().any(|k| k == keyword))
    }

    /// Land names/subtypes this creature can walk through
    pub fn landwalk_types(&self, card_id: CardId) -> SmallVec<[String; 1]> {
        let Ok(card) = self.cards.get(card_id) else {
            return SmallVec::new();
        };
        let printed = card.definition.keywords.iter().chain(
            card.definition
                .abilities
                .iter()
                .filter(|a| a.kind == AbilityType::Keyword)
                .flat_map(|a| a.keywords.iter()),
        );
        let granted = self
            .attached_auras(card)
            .flat_map(|aura| aura.granted_keywords());

        printed
            .chain(granted)
            .filter_map(|k| match k {
                Keyword::Landwalk(land) => Some(land.clone()),
                _ => None,
            })
            .collect()
    }

    /// Does `player` control a land with this exact name or subtype?
    pub fn controls_land_matching(&self, player: PlayerId, land: &str) -> bool {
        self.battlefield(player).iter().any(|id| {
            self.cards.get(*id).is_ok_and(|c| {
                c.is_land() && (c.name() == land || c.definition.has_subtype(land))
            })
        })
    }

    /// Creature whose damage or toughness means it must die
    pub fn is_lethally_damaged(&self, card_id: CardId) -> bool {
        let Ok(card) = self.cards.get(card_id) else {
            return false;
        };
        if !card.is_creature() {
            return false;
        }
        let toughness = self.effective_toughness(card_id).unwrap_or(0);
        toughness <= 0
            || card.damage_taken >= toughness
            || (card.deathtouched && card.damage_taken > 0)
    }

    // === Target dispatch ===

    pub fn target_name(&self, target: Target) -> String {
        match target {
            Target::Card(id) => self.card_name(id).to_string(),
            Target::Player(id) => self.player_name(id).to_string(),
        }
    }

    /// Deal damage to a creature or player
    ///
    /// Damage from a deathtouch source marks the creature it hits.
    pub fn damage_target(&mut self, target: Target, amount: i32, source: Option<CardId>) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        match target {
            Target::Card(id) => {
                let deathtouch = source.is_some_and(|s| self.has_keyword(s, &Keyword::Deathtouch));
                let card = self.cards.get_mut(id)?;
                if card.current_zone != Zone::Battlefield || !card.is_creature() {
                    return Ok(());
                }
                card.damage_taken += amount;
                if deathtouch {
                    card.deathtouched = true;
                }
            }
            Target::Player(id) => self.player_mut(id)?.lose_life(amount),
        }
        Ok(())
    }

    /// Is the target gone (creature dead or off the battlefield, player lost)?
    pub fn target_is_dead(&self, target: Target) -> bool {
        match target {
            Target::Card(id) => !self.is_on_battlefield(id) || self.is_lethally_damaged(id),
            Target::Player(id) => self.player(id).map_or(true, |p| p.has_lost || p.life <= 0),
        }
    }

    /// Until-end-of-turn stat boost
    pub fn boost_target(&mut self, target: Target, power: i32, toughness: i32) -> Result<()> {
        match target {
            Target::Card(id) => {
                let card = self.cards.get_mut(id)?;
                card.power_boost += power;
                card.toughness_boost += toughness;
                Ok(())
            }
            Target::Player(_) => Err(MtgError::InvalidAction(
                "players have no power or toughness".to_string(),
            )),
        }
    }

    // === Turn bookkeeping ===

    /// Untap and wake up everything the player controls
    pub fn untap_permanents(&mut self, player: PlayerId) -> Result<()> {
        let permanents = self.battlefield(player).to_vec();
        for id in permanents {
            let card = self.cards.get_mut(id)?;
            card.untap();
            card.active = true;
        }
        Ok(())
    }

    pub fn drain_mana_pools(&mut self) {
        for player in &mut self.players {
            player.empty_mana_pool();
        }
    }

    /// Wipe boosts, damage and deathtouch marks on every battlefield
    pub fn clear_end_of_turn(&mut self) {
        let permanents: Vec<CardId> = self
            .players
            .iter()
            .flat_map(|p| p.zones.battlefield.iter())
            .collect();
        for id in permanents {
            if let Ok(card) = self.cards.get_mut(id) {
                card.clear_end_of_turn();
            }
        }
    }

    // === State-based actions and game end ===

    /// Put dead creatures and orphaned auras into their owners' graveyards
    ///
    /// Repeats until nothing changes, so auras on a creature that just died
    /// follow it. Returns everything that was moved.
    pub fn check_state_based_actions(&mut self) -> Result<Vec<CardId>> {
        let mut moved = Vec::new();
        loop {
            let mut doomed: Vec<CardId> = Vec::new();
            for player in &self.players {
                for id in player.zones.battlefield.iter() {
                    let Ok(card) = self.cards.get(id) else {
                        continue;
                    };
                    let orphaned = match card.attached_to {
                        Some(Target::Card(host)) => !self.is_on_battlefield(host),
                        Some(Target::Player(owner)) => self.player(owner).map_or(true, |p| p.has_lost),
                        None => card.is_aura(),
                    };
                    if self.is_lethally_damaged(id) || orphaned {
                        doomed.push(id);
                    }
                }
            }
            if doomed.is_empty() {
                break;
            }
            for id in doomed {
                let verb = if self.cards.get(id).is_ok_and(|c| c.is_creature()) {
                    "dies"
                } else {
                    "is put into the graveyard"
                };
                self.logger.normal(&format!("{} ({}) {}", self.card_name(id), id, verb));
                self.move_card(id, Zone::Graveyard)?;
                moved.push(id);
            }
        }
        Ok(moved)
    }

    /// Mark players at zero or less life as lost; true if anyone has lost
    pub fn check_win_conditions(&mut self) -> bool {
        for player in &mut self.players {
            if !player.has_lost && player.life <= 0 {
                player.lose_game(LossReason::LifeTotal);
                self.logger
                    .normal(&format!("{} has {} life and loses", player.name, player.life));
            }
        }
        self.has_loser()
    }

    pub fn has_loser(&self) -> bool {
        self.players.iter().any(|p| p.has_lost)
    }

    /// Over when at most one player is still in the game
    pub fn is_game_over(&self) -> bool {
        self.players.iter().filter(|p| !p.has_lost).count() <= 1
    }

    pub fn winner(&self) -> Option<PlayerId> {
        let mut remaining = self.players.iter().filter(|p| !p.has_lost);
        match (remaining.next(), remaining.next()) {
            (Some(winner), None) => Some(winner.id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardType, ManaCost, ParsedAbility};

    fn bears() -> Arc<CardDefinition> {
        Arc::new(
            CardDefinition::new("Grizzly Bears", ManaCost::parse("1G").unwrap(), &[CardType::Creature])
                .with_stats(2, 2),
        )
    }

    fn new_game() -> GameState {
        GameState::new_two_player("Alice", "Bob", EngineConfig::default())
    }

    #[test]
    fn test_game_creation() {
        let game = new_game();
        assert_eq!(game.players.len(), 2);
        assert_eq!(game.players[0].id, PlayerId::new(0));
        assert_eq!(game.players[1].id, PlayerId::new(1));
        assert_eq!(game.players[0].life, 20);
        assert_eq!(game.defending_player(), PlayerId::new(1));
    }

    #[test]
    fn test_card_ids_follow_player_ids() {
        let mut game = new_game();
        let id = game.create_card(PlayerId::new(0), bears(), Zone::Hand).unwrap();
        assert_eq!(id.as_u32(), 2);
    }

    #[test]
    fn test_start_game_deals_hands() {
        let mut game = new_game();
        let deck: Vec<_> = (0..20).map(|_| bears()).collect();
        game.start_game(vec![deck.clone(), deck]).unwrap();

        for player in &game.players {
            assert_eq!(player.zones.hand.len(), 7);
            assert_eq!(player.zones.library.len(), 13);
        }
        assert!(game.start_game(vec![]).is_err());
    }

    #[test]
    fn test_move_card_keeps_zone_in_step() {
        let mut game = new_game();
        let alice = PlayerId::new(0);
        let id = game.create_card(alice, bears(), Zone::Hand).unwrap();

        game.move_card(id, Zone::Battlefield).unwrap();
        assert_eq!(game.card(id).unwrap().current_zone, Zone::Battlefield);
        let holding: Vec<Zone> = game
            .zones(alice)
            .unwrap()
            .all()
            .iter()
            .filter(|z| z.contains(id))
            .map(|z| z.zone_type)
            .collect();
        assert_eq!(holding, vec![Zone::Battlefield]);
    }

    #[test]
    fn test_draw_from_empty_library() {
        let mut game = new_game();
        assert_eq!(game.draw_card(PlayerId::new(0)).unwrap(), None);
    }

    #[test]
    fn test_lethal_damage_and_sba() {
        let mut game = new_game();
        let alice = PlayerId::new(0);
        let id = game.create_card(alice, bears(), Zone::Battlefield).unwrap();

        game.damage_target(Target::Card(id), 1, None).unwrap();
        assert!(!game.target_is_dead(Target::Card(id)));
        assert!(game.check_state_based_actions().unwrap().is_empty());

        game.damage_target(Target::Card(id), 1, None).unwrap();
        assert!(game.target_is_dead(Target::Card(id)));
        assert_eq!(game.check_state_based_actions().unwrap(), vec![id]);
        assert_eq!(game.card(id).unwrap().current_zone, Zone::Graveyard);
        assert_eq!(game.card(id).unwrap().damage_taken, 0);
    }

    #[test]
    fn test_aura_follows_dead_host() {
        let mut game = new_game();
        let alice = PlayerId::new(0);
        let host = game.create_card(alice, bears(), Zone::Battlefield).unwrap();
        let rancor = Arc::new(
            CardDefinition::new("Rancor", ManaCost::parse("G").unwrap(), &[CardType::Enchantment])
                .with_subtypes(&["Aura"])
                .with_ability(ParsedAbility::static_boost(2, 0, &[Keyword::Trample])),
        );
        let aura = game.create_card(alice, rancor, Zone::Battlefield).unwrap();
        game.cards.get_mut(aura).unwrap().attached_to = Some(Target::Card(host));
        game.cards.get_mut(host).unwrap().attachments.push(aura);

        assert_eq!(game.effective_power(host).unwrap(), 4);
        assert!(game.has_keyword(host, &Keyword::Trample));

        game.damage_target(Target::Card(host), 2, None).unwrap();
        let moved = game.check_state_based_actions().unwrap();
        assert_eq!(moved, vec![host, aura]);
        assert_eq!(game.card(aura).unwrap().current_zone, Zone::Graveyard);
    }

    #[test]
    fn test_win_conditions() {
        let mut game = new_game();
        assert!(!game.check_win_conditions());
        assert_eq!(game.winner(), None);

        game.damage_target(Target::Player(PlayerId::new(1)), 20, None).unwrap();
        assert!(game.check_win_conditions());
        assert!(game.is_game_over());
        assert_eq!(game.winner(), Some(PlayerId::new(0)));
        assert_eq!(game.players[1].loss_reason, Some(LossReason::LifeTotal));
    }

    #[test]
    fn test_boost_player_is_rejected() {
        let mut game = new_game();
        assert!(game.boost_target(Target::Player(PlayerId::new(0)), 1, 1).is_err());
    }
}
