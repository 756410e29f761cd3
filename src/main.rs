//! MTG rules engine - main binary
//!
//! Runs a two-player game between any mix of scripted AIs and a human at the
//! terminal.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use mtg_rules_engine::{
    core::{CardDefinition, PlayerId},
    game::{
        spawn_controller, ActorKind, GameLoop, GameState, InteractiveController, RandomController,
        VerbosityLevel, ZeroController,
    },
    loader::{preset, preset_names, CardDatabase, DeckLoader},
    EngineConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Controller type for each seat
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControllerType {
    /// Always chooses first meaningful action (for testing)
    Zero,
    /// Makes random choices
    Random,
    /// Numbered menu on stdin for human play
    Interactive,
}

#[derive(Parser)]
#[command(name = "mtg")]
#[command(about = "MTG rules engine - two-player games in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game
    Play {
        /// Deck for player 1: a preset name or a .dck file
        #[arg(value_name = "PLAYER1_DECK", default_value = "bolt")]
        deck1: String,

        /// Deck for player 2: a preset name or a .dck file
        #[arg(value_name = "PLAYER2_DECK", default_value = "bolt")]
        deck2: String,

        /// Player 1 controller type
        #[arg(long, value_enum, default_value = "zero")]
        p1: ControllerType,

        /// Player 2 controller type
        #[arg(long, value_enum, default_value = "random")]
        p2: ControllerType,

        /// Player 1 name
        #[arg(long, default_value = "Player 1")]
        p1_name: String,

        /// Player 2 name
        #[arg(long, default_value = "Player 2")]
        p2_name: String,

        /// Engine config as JSON (fields not given keep their defaults)
        #[arg(long, value_name = "CONFIG_JSON")]
        config: Option<PathBuf>,

        /// Extra card definitions as a JSON array, replacing the built-in pool
        #[arg(long, value_name = "CARDS_JSON")]
        cards: Option<PathBuf>,

        /// Set random seed for deterministic games
        #[arg(long)]
        seed: Option<u64>,

        /// Turn limit
        #[arg(long)]
        max_turns: Option<u32>,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityLevel,

        /// Print the result and final state as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in cards and deck presets
    Cards,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            deck1,
            deck2,
            p1,
            p2,
            p1_name,
            p2_name,
            config,
            cards,
            seed,
            max_turns,
            verbosity,
            json,
        } => {
            let mut config = match config {
                Some(path) => EngineConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(max_turns) = max_turns {
                config.max_turns = max_turns;
            }
            config.validate()?;

            let db = match cards {
                Some(path) => CardDatabase::load_json_file(&path)
                    .with_context(|| format!("loading cards {}", path.display()))?,
                None => CardDatabase::builtin()?,
            };

            let decks = vec![load_deck(&db, &deck1)?, load_deck(&db, &deck2)?];
            run_play(config, decks, [(p1, p1_name), (p2, p2_name)], verbosity, json)
        }
        Commands::Cards => {
            let db = CardDatabase::builtin()?;
            println!("Cards ({}):", db.len());
            for card in db.iter() {
                let stats = match (card.power, card.toughness) {
                    (Some(p), Some(t)) => format!(" {p}/{t}"),
                    _ => String::new(),
                };
                println!(
                    "  {:<20} {:<10} {:?}{}",
                    card.name.as_str(),
                    card.mana_cost.to_string(),
                    card.types.as_slice(),
                    stats
                );
            }
            println!("\nDeck presets:");
            for name in preset_names() {
                let total: usize = preset(name).map_or(0, |cards| cards.iter().map(|(_, n)| n).sum());
                println!("  {name:<10} {total} cards");
            }
            Ok(())
        }
    }
}

/// A preset name, or a path to a .dck file
fn load_deck(db: &CardDatabase, spec: &str) -> anyhow::Result<Vec<Arc<CardDefinition>>> {
    if let Some(cards) = preset(spec) {
        return Ok(db.build_deck(cards)?);
    }
    let path = Path::new(spec);
    if !path.exists() {
        bail!(
            "'{spec}' is neither a deck preset ({}) nor a deck file",
            preset_names().collect::<Vec<_>>().join(", ")
        );
    }
    let list = DeckLoader::load_from_file(path).with_context(|| format!("reading deck {spec}"))?;
    Ok(db.build_deck_list(&list)?)
}

fn run_play(
    config: EngineConfig,
    decks: Vec<Vec<Arc<CardDefinition>>>,
    seats: [(ControllerType, String); 2],
    verbosity: VerbosityLevel,
    json: bool,
) -> anyhow::Result<()> {
    let seed = config.seed;
    let mut game = GameState::new_two_player(&seats[0].1, &seats[1].1, config);
    game.logger.set_verbosity(verbosity);
    game.start_game(decks)?;

    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    for (idx, (controller, _)) in seats.iter().enumerate() {
        let player = game.players[idx].id;
        workers.push(attach(&mut game, player, *controller, seed.wrapping_add(idx as u64))?);
    }

    let result = GameLoop::new(&mut game).run_game()?;
    for worker in workers {
        let _ = worker.join();
    }

    if json {
        let output = serde_json::json!({
            "result": result,
            "state": &game,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn attach(
    game: &mut GameState,
    player: PlayerId,
    controller: ControllerType,
    seed: u64,
) -> anyhow::Result<JoinHandle<()>> {
    let kind = match controller {
        ControllerType::Interactive => ActorKind::Human,
        ControllerType::Zero | ControllerType::Random => ActorKind::Ai,
    };
    let handle = game.attach_actor(player, kind)?;
    Ok(match controller {
        ControllerType::Zero => spawn_controller(handle, ZeroController::new()),
        ControllerType::Random => spawn_controller(handle, RandomController::with_seed(seed)),
        ControllerType::Interactive => spawn_controller(handle, InteractiveController::stdio()),
    })
}
