//! Combat keyword scenarios played with the built-in card pool
//!
//! Most tests drive the combat mutators directly. The last ones run a whole
//! combat phase through the game loop with scripted actors on both seats.

use mtg_rules_engine::core::{CardId, PlayerId};
use mtg_rules_engine::game::{
    spawn_controller, ActorKind, CombatStep, GameLoop, GameState, Phase, PlayerAction,
    ScriptedController,
};
use mtg_rules_engine::loader::CardDatabase;
use mtg_rules_engine::zones::Zone;
use mtg_rules_engine::EngineConfig;

const ALICE: PlayerId = PlayerId::new(0);
const BOB: PlayerId = PlayerId::new(1);

struct Table {
    game: GameState,
    db: CardDatabase,
}

impl Table {
    fn new() -> Self {
        Table {
            game: GameState::new_two_player("Alice", "Bob", EngineConfig::default()),
            db: CardDatabase::builtin().unwrap(),
        }
    }

    fn put(&mut self, owner: PlayerId, name: &str) -> CardId {
        let definition = self.db.get_or_err(name).unwrap();
        self.game
            .create_card(owner, definition, Zone::Battlefield)
            .unwrap()
    }

    fn attack(&mut self, attackers: &[CardId]) {
        self.game.turn.phase = Phase::Combat;
        self.game.turn.combat_step = Some(CombatStep::DeclareAttackers);
        for &attacker in attackers {
            self.game.declare_attacker(ALICE, attacker).unwrap();
        }
        self.game.turn.combat_step = Some(CombatStep::DeclareBlockers);
    }

    fn block(&mut self, blocker: CardId, attacker: CardId) {
        self.game.declare_blocker(BOB, blocker, attacker).unwrap();
    }

    /// Both damage steps, with state-based actions after each
    fn deal_damage(&mut self) {
        if self.game.has_first_strike_combat() {
            self.game.resolve_combat_damage(true).unwrap();
            self.game.check_state_based_actions().unwrap();
        }
        self.game.resolve_combat_damage(false).unwrap();
        self.game.check_state_based_actions().unwrap();
    }

    fn life(&self, player: PlayerId) -> i32 {
        self.game.player(player).unwrap().life
    }

    fn alive(&self, card: CardId) -> bool {
        self.game.is_on_battlefield(card)
    }
}

#[test]
fn test_unblocked_attacker_hits_defender() {
    let mut table = Table::new();
    let ape = table.put(ALICE, "Kird Ape");
    table.attack(&[ape]);
    table.deal_damage();

    assert_eq!(table.life(BOB), 19);
    assert!(table.game.card(ape).unwrap().tapped);
}

#[test]
fn test_deathtouch_blocker_kills_big_attacker() {
    let mut table = Table::new();
    let wurm = table.put(ALICE, "Craw Wurm");
    let rats = table.put(BOB, "Typhoid Rats");
    table.attack(&[wurm]);
    table.block(rats, wurm);
    table.deal_damage();

    assert!(!table.alive(wurm));
    assert!(!table.alive(rats));
    assert_eq!(table.life(BOB), 20);
}

#[test]
fn test_deathtouch_attacker_kills_big_blocker() {
    let mut table = Table::new();
    let rats = table.put(ALICE, "Typhoid Rats");
    let ape = table.put(ALICE, "Kird Ape");
    let wurm = table.put(BOB, "Craw Wurm");
    let spider = table.put(BOB, "Giant Spider");
    table.attack(&[rats, ape]);
    table.block(wurm, rats);
    table.block(spider, ape);
    table.deal_damage();

    assert!(!table.alive(wurm));
    assert!(table.alive(spider));
    assert_eq!(table.game.card(spider).unwrap().damage_taken, 1);
    assert!(!table.alive(rats));
    assert!(!table.alive(ape));
}

#[test]
fn test_first_strike_kills_before_damage_back() {
    let mut table = Table::new();
    let knight = table.put(ALICE, "Youthful Knight");
    let ape = table.put(BOB, "Kird Ape");
    table.attack(&[knight]);
    table.block(ape, knight);
    table.deal_damage();

    assert!(table.alive(knight));
    assert_eq!(table.game.card(knight).unwrap().damage_taken, 0);
    assert!(!table.alive(ape));
}

#[test]
fn test_double_strike_hits_twice() {
    let mut table = Table::new();
    let ace = table.put(ALICE, "Fencing Ace");
    table.attack(&[ace]);
    table.deal_damage();

    assert_eq!(table.life(BOB), 18);
}

#[test]
fn test_trample_carries_excess_to_player() {
    let mut table = Table::new();
    let dreadmaw = table.put(ALICE, "Colossal Dreadmaw");
    let bears = table.put(BOB, "Grizzly Bears");
    table.attack(&[dreadmaw]);
    table.block(bears, dreadmaw);
    table.deal_damage();

    assert!(!table.alive(bears));
    assert_eq!(table.life(BOB), 16);
}

#[test]
fn test_blocked_without_trample_deals_nothing_to_player() {
    let mut table = Table::new();
    let wurm = table.put(ALICE, "Craw Wurm");
    let bears = table.put(BOB, "Grizzly Bears");
    table.attack(&[wurm]);
    table.block(bears, wurm);
    table.deal_damage();

    assert!(!table.alive(bears));
    assert!(table.alive(wurm));
    assert_eq!(table.life(BOB), 20);
}

#[test]
fn test_flying_needs_flying_or_reach_to_block() {
    let mut table = Table::new();
    let angel = table.put(ALICE, "Serra Angel");
    let bears = table.put(BOB, "Grizzly Bears");
    let spider = table.put(BOB, "Giant Spider");
    table.attack(&[angel]);

    assert!(!table.game.can_block(BOB, bears, angel));
    assert!(table.game.declare_blocker(BOB, bears, angel).is_err());
    assert!(table.game.can_block(BOB, spider, angel));

    table.block(spider, angel);
    table.deal_damage();
    // 4 damage into a 2/4, 2 back into a 4/4
    assert!(!table.alive(spider));
    assert!(table.alive(angel));
    assert_eq!(table.life(BOB), 20);
}

#[test]
fn test_vigilance_attacker_stays_untapped() {
    let mut table = Table::new();
    let angel = table.put(ALICE, "Serra Angel");
    table.attack(&[angel]);
    table.deal_damage();

    assert!(!table.game.card(angel).unwrap().tapped);
    assert_eq!(table.life(BOB), 16);
    assert!(table.game.available_blockers(ALICE).contains(&angel));
}

#[test]
fn test_lifelink_gains_what_it_deals() {
    let mut table = Table::new();
    let nighthawk = table.put(ALICE, "Vampire Nighthawk");
    table.attack(&[nighthawk]);
    table.deal_damage();

    assert_eq!(table.life(ALICE), 22);
    assert_eq!(table.life(BOB), 18);
}

#[test]
fn test_swampwalk_is_unblockable_against_swamps() {
    let mut table = Table::new();
    let wraith = table.put(ALICE, "Bog Wraith");
    let bears = table.put(BOB, "Grizzly Bears");
    table.attack(&[wraith]);
    assert!(table.game.can_block(BOB, bears, wraith));

    table.put(BOB, "Swamp");
    assert!(!table.game.can_block(BOB, bears, wraith));
}

#[test]
fn test_defender_and_summoning_sickness_cannot_attack() {
    let mut table = Table::new();
    let wall = table.put(ALICE, "Wall of Wood");
    let bears = table.put(ALICE, "Grizzly Bears");
    table.game.cards.get_mut(bears).unwrap().active = false;
    table.game.turn.phase = Phase::Combat;
    table.game.turn.combat_step = Some(CombatStep::DeclareAttackers);

    assert!(!table.game.can_attack(ALICE, wall));
    assert!(!table.game.can_attack(ALICE, bears));
    assert!(table.game.declare_attacker(ALICE, bears).is_err());
}

#[test]
fn test_rancor_gives_trample_through_a_blocker() {
    let mut table = Table::new();
    let bears = table.put(ALICE, "Grizzly Bears");
    let rancor = table.put(ALICE, "Rancor");
    table.game.cards.get_mut(rancor).unwrap().attached_to =
        Some(mtg_rules_engine::core::Target::Card(bears));
    table.game.cards.get_mut(bears).unwrap().attachments.push(rancor);
    let ape = table.put(BOB, "Kird Ape");

    table.attack(&[bears]);
    table.block(ape, bears);
    table.deal_damage();

    // 4 power: 1 to the 1/1 blocker, 3 tramples over
    assert!(!table.alive(ape));
    assert_eq!(table.life(BOB), 17);
}

fn attach_scripts(game: &mut GameState, alice: ScriptedController, bob: ScriptedController) {
    let a = game.attach_actor(ALICE, ActorKind::Ai).unwrap();
    let b = game.attach_actor(BOB, ActorKind::Ai).unwrap();
    spawn_controller(a, alice);
    spawn_controller(b, bob);
}

#[test]
fn test_combat_phase_with_actors() {
    let mut table = Table::new();
    let bears = table.put(ALICE, "Grizzly Bears");
    let ape = table.put(BOB, "Kird Ape");

    // Alice passes at the beginning of combat, then attacks.
    // Bob passes twice, then blocks once blockers are offered.
    attach_scripts(
        &mut table.game,
        ScriptedController::new([PlayerAction::pass(), PlayerAction::attack(bears)]),
        ScriptedController::new([
            PlayerAction::pass(),
            PlayerAction::pass(),
            PlayerAction::block(ape, bears),
        ]),
    );

    GameLoop::new(&mut table.game)
        .execute_phase(Phase::Combat)
        .unwrap();
    table.game.detach_actors();

    assert!(!table.alive(ape));
    assert!(table.alive(bears));
    assert_eq!(table.game.card(bears).unwrap().damage_taken, 1);
    assert!(table.game.card(bears).unwrap().tapped);
    assert_eq!(table.life(BOB), 20);
    assert!(!table.game.combat.has_attackers());
    assert_eq!(table.game.turn.combat_step, None);
}

#[test]
fn test_lethal_combat_ends_the_game() {
    let mut table = Table::new();
    let dreadmaw = table.put(ALICE, "Colossal Dreadmaw");
    table.game.player_mut(BOB).unwrap().life = 6;

    attach_scripts(
        &mut table.game,
        ScriptedController::new([PlayerAction::pass(), PlayerAction::attack(dreadmaw)]),
        ScriptedController::default(),
    );

    let mut game_loop = GameLoop::new(&mut table.game);
    game_loop.execute_phase(Phase::Combat).unwrap();
    let result = game_loop.check_win_condition().unwrap();
    table.game.detach_actors();

    assert_eq!(result.winner, Some(ALICE));
    assert_eq!(table.life(BOB), 0);
}
