//! Built-in card pool and deck presets
//!
//! Card text parsing lives outside the engine, so the cards the binary and
//! the tests play with are written down here already parsed.

use crate::core::{
    CardDefinition, CardType, Color, Keyword, ManaCost, ParsedAbility, ParsedEffect,
    ParsedTargetSpec, TargetController, TargetKind,
};
use crate::Result;

fn cost(symbols: &str) -> Result<ManaCost> {
    ManaCost::parse(symbols)
}

fn basic_land(name: &str, color: Color) -> CardDefinition {
    CardDefinition::new(name, ManaCost::new(), &[CardType::Land])
        .with_subtypes(&[name])
        .with_ability(ParsedAbility::mana(&[color]))
}

fn creature(name: &str, mana: &str, power: i32, toughness: i32, keywords: &[Keyword]) -> Result<CardDefinition> {
    Ok(CardDefinition::new(name, cost(mana)?, &[CardType::Creature])
        .with_stats(power, toughness)
        .with_keywords(keywords))
}

fn spell(name: &str, mana: &str, card_type: CardType, effect: ParsedEffect, target: Option<TargetKind>) -> Result<CardDefinition> {
    Ok(CardDefinition::new(name, cost(mana)?, &[card_type])
        .with_ability(ParsedAbility::spell(effect, target.map(ParsedTargetSpec::new))))
}

fn aura(name: &str, mana: &str, ability: ParsedAbility) -> Result<CardDefinition> {
    Ok(CardDefinition::new(name, cost(mana)?, &[CardType::Enchantment])
        .with_subtypes(&["Aura"])
        .with_ability(ability))
}

/// Every card the engine ships with
pub fn builtin_cards() -> Result<Vec<CardDefinition>> {
    use Keyword::*;

    Ok(vec![
        // Lands
        basic_land("Plains", Color::White),
        basic_land("Island", Color::Blue),
        basic_land("Swamp", Color::Black),
        basic_land("Mountain", Color::Red),
        basic_land("Forest", Color::Green),
        CardDefinition::new("Taiga", ManaCost::new(), &[CardType::Land])
            .with_subtypes(&["Mountain", "Forest"])
            .with_ability(ParsedAbility::mana(&[Color::Red, Color::Green])),
        // Instants and sorceries
        spell(
            "Lightning Bolt",
            "R",
            CardType::Instant,
            ParsedEffect::DealDamage { amount: 3 },
            Some(TargetKind::AnyTarget),
        )?,
        spell(
            "Shock",
            "R",
            CardType::Instant,
            ParsedEffect::DealDamage { amount: 2 },
            Some(TargetKind::AnyTarget),
        )?,
        spell(
            "Lava Axe",
            "4R",
            CardType::Sorcery,
            ParsedEffect::DealDamage { amount: 5 },
            Some(TargetKind::Player),
        )?,
        spell(
            "Giant Growth",
            "G",
            CardType::Instant,
            ParsedEffect::Pump { power: 3, toughness: 3 },
            Some(TargetKind::Creature),
        )?,
        spell(
            "Healing Salve",
            "W",
            CardType::Instant,
            ParsedEffect::GainLife { amount: 3 },
            Some(TargetKind::Player),
        )?,
        spell(
            "Divination",
            "2U",
            CardType::Sorcery,
            ParsedEffect::DrawCards { count: 2 },
            None,
        )?,
        spell(
            "Terror",
            "1B",
            CardType::Instant,
            ParsedEffect::Destroy,
            Some(TargetKind::Creature),
        )?,
        spell(
            "Stone Rain",
            "2R",
            CardType::Sorcery,
            ParsedEffect::Destroy,
            Some(TargetKind::Land),
        )?,
        CardDefinition::new("Dark Ritual", cost("B")?, &[CardType::Instant]).with_ability(
            ParsedAbility::spell(
                ParsedEffect::AddMana {
                    colors: [Color::Black; 3].into_iter().collect(),
                },
                None,
            ),
        ),
        // Creatures
        creature("Kird Ape", "R", 1, 1, &[])?,
        creature("Grizzly Bears", "1G", 2, 2, &[])?,
        creature("Raging Goblin", "R", 1, 1, &[Haste])?,
        creature("Youthful Knight", "1W", 2, 1, &[FirstStrike])?,
        creature("Fencing Ace", "1W", 1, 1, &[DoubleStrike])?,
        creature("Serra Angel", "3WW", 4, 4, &[Flying, Vigilance])?,
        creature("Giant Spider", "3G", 2, 4, &[Reach])?,
        creature("Typhoid Rats", "B", 1, 1, &[Deathtouch])?,
        creature("Vampire Nighthawk", "1BB", 2, 3, &[Flying, Deathtouch, Lifelink])?,
        creature("Ambush Viper", "1G", 2, 1, &[Flash, Deathtouch])?,
        creature("Craw Wurm", "4GG", 6, 4, &[])?,
        creature("Colossal Dreadmaw", "4GG", 6, 6, &[Trample])?,
        creature("Wall of Wood", "G", 0, 3, &[Defender])?,
        creature("Bog Wraith", "3B", 3, 3, &[Landwalk("Swamp".to_string())])?,
        creature("Llanowar Elves", "G", 1, 1, &[])?.with_ability(ParsedAbility::mana(&[Color::Green])),
        creature("Elvish Visionary", "1G", 1, 1, &[])?
            .with_ability(ParsedAbility::on_enter(ParsedEffect::DrawCards { count: 1 }, None)),
        creature("Flametongue Kavu", "3R", 4, 2, &[])?.with_ability(ParsedAbility::on_enter(
            ParsedEffect::DealDamage { amount: 4 },
            Some(ParsedTargetSpec::new(TargetKind::Creature).controlled_by(TargetController::Opponent)),
        )),
        // Auras
        aura(
            "Rancor",
            "G",
            ParsedAbility::static_boost(2, 0, &[Trample])
                .with_target(ParsedTargetSpec::new(TargetKind::Creature)),
        )?,
        aura(
            "Holy Strength",
            "W",
            ParsedAbility::static_boost(1, 2, &[])
                .with_target(ParsedTargetSpec::new(TargetKind::Creature)),
        )?,
        aura("Wild Growth", "G", ParsedAbility::enchant(TargetKind::Land))?
            .with_ability(ParsedAbility::mana(&[Color::Green])),
    ])
}

/// Named deck lists usable from the command line
const PRESETS: &[(&str, &[(&str, usize)])] = &[
    (
        "bolt",
        &[("Mountain", 10), ("Lightning Bolt", 10), ("Kird Ape", 10)],
    ),
    (
        "red",
        &[
            ("Mountain", 17),
            ("Lightning Bolt", 4),
            ("Shock", 4),
            ("Kird Ape", 4),
            ("Raging Goblin", 4),
            ("Flametongue Kavu", 3),
            ("Lava Axe", 2),
            ("Stone Rain", 2),
        ],
    ),
    (
        "green",
        &[
            ("Forest", 17),
            ("Llanowar Elves", 4),
            ("Grizzly Bears", 4),
            ("Giant Spider", 3),
            ("Ambush Viper", 2),
            ("Elvish Visionary", 2),
            ("Craw Wurm", 2),
            ("Colossal Dreadmaw", 2),
            ("Giant Growth", 2),
            ("Rancor", 2),
        ],
    ),
    (
        "white",
        &[
            ("Plains", 17),
            ("Youthful Knight", 4),
            ("Fencing Ace", 4),
            ("Serra Angel", 3),
            ("Holy Strength", 3),
            ("Healing Salve", 3),
            ("Island", 3),
            ("Divination", 3),
        ],
    ),
    (
        "gruul",
        &[
            ("Taiga", 6),
            ("Mountain", 6),
            ("Forest", 6),
            ("Kird Ape", 4),
            ("Lightning Bolt", 4),
            ("Rancor", 3),
            ("Wild Growth", 2),
            ("Grizzly Bears", 4),
            ("Colossal Dreadmaw", 2),
            ("Giant Growth", 3),
        ],
    ),
    (
        "black",
        &[
            ("Swamp", 19),
            ("Typhoid Rats", 4),
            ("Vampire Nighthawk", 3),
            ("Bog Wraith", 4),
            ("Terror", 4),
            ("Dark Ritual", 4),
        ],
    ),
];

/// Look up a deck preset by name
pub fn preset(name: &str) -> Option<&'static [(&'static str, usize)]> {
    PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, cards)| *cards)
}

pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}
