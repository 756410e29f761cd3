//! Card database for looking up card definitions
//!
//! An immutable repository, sorted by name and searched with binary search.
//! It is built once and handed to whoever sets up a game; the engine itself
//! never reaches for a global card list.

use crate::core::CardDefinition;
use crate::loader::catalog;
use crate::loader::deck::DeckList;
use crate::{MtgError, Result};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

/// Database of card definitions
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: Vec<Arc<CardDefinition>>,
}

impl CardDatabase {
    /// Build a database; later duplicates of a name are dropped
    pub fn new(definitions: impl IntoIterator<Item = CardDefinition>) -> Self {
        let mut cards: Vec<Arc<CardDefinition>> = definitions.into_iter().map(Arc::new).collect();
        cards.sort_by(|a, b| a.name.cmp_ignore_case(b.name.as_str()));
        cards.dedup_by(|a, b| a.name.cmp_ignore_case(b.name.as_str()) == Ordering::Equal);
        CardDatabase { cards }
    }

    /// The built-in card pool
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(catalog::builtin_cards()?))
    }

    /// Parse a JSON array of card definitions
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<CardDefinition> = serde_json::from_str(json)?;
        Ok(Self::new(definitions))
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Look up a card by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Arc<CardDefinition>> {
        self.cards
            .binary_search_by(|card| card.name.cmp_ignore_case(name))
            .ok()
            .map(|idx| &self.cards[idx])
    }

    pub fn get_or_err(&self, name: &str) -> Result<Arc<CardDefinition>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| MtgError::UnknownCard(name.to_string()))
    }

    /// Check if a card exists in the database
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Expand `(name, count)` pairs into a deck, in list order
    pub fn build_deck(&self, entries: &[(&str, usize)]) -> Result<Vec<Arc<CardDefinition>>> {
        let mut deck = Vec::with_capacity(entries.iter().map(|(_, n)| n).sum());
        for &(name, count) in entries {
            let definition = self.get_or_err(name)?;
            deck.extend(std::iter::repeat(definition).take(count));
        }
        Ok(deck)
    }

    /// Build the main deck of a parsed deck list
    pub fn build_deck_list(&self, list: &DeckList) -> Result<Vec<Arc<CardDefinition>>> {
        let entries: Vec<(&str, usize)> = list
            .main_deck
            .iter()
            .map(|e| (e.card_name.as_str(), e.count))
            .collect();
        self.build_deck(&entries)
    }

    /// Cards in name order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CardDefinition>> {
        self.cards.iter()
    }

    /// Total number of cards in database
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
