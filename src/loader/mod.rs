//! Card repository and deck lists

pub mod catalog;
pub mod database;
pub mod deck;

pub use catalog::{builtin_cards, preset, preset_names};
pub use database::CardDatabase;
pub use deck::{DeckEntry, DeckList, DeckLoader};
