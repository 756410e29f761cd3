//! Deck list loader (.dck format)
//!
//! `N Card Name` per line; `[Sideboard]` starts the sideboard, other section
//! headers, blank lines and `#` comments are skipped. A `|SET` suffix after
//! the name is ignored.

use crate::{MtgError, Result};
use std::fs;
use std::path::Path;

/// Deck loader for .dck files
pub struct DeckLoader;

impl DeckLoader {
    /// Load a deck from a .dck file
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a deck from its text content
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut main_deck = Vec::new();
        let mut sideboard = Vec::new();
        let mut in_sideboard = false;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                in_sideboard = line.eq_ignore_ascii_case("[sideboard]");
                continue;
            }
            // Metadata lines like "Name=Red Deck Wins"
            if line.contains('=') {
                continue;
            }

            let (count, rest) = line
                .split_once(' ')
                .and_then(|(n, rest)| n.parse::<usize>().ok().map(|n| (n, rest)))
                .ok_or_else(|| {
                    MtgError::ParseError(format!("deck line {}: expected 'N Card Name'", line_no + 1))
                })?;
            let card_name = rest.split_once('|').map_or(rest, |(name, _set)| name).trim();

            let entry = DeckEntry {
                card_name: card_name.to_string(),
                count,
            };
            if in_sideboard {
                sideboard.push(entry);
            } else {
                main_deck.push(entry);
            }
        }

        if main_deck.is_empty() {
            return Err(MtgError::ParseError("empty deck".to_string()));
        }

        Ok(DeckList {
            main_deck,
            sideboard,
        })
    }
}

/// Represents a deck entry (card name and count)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: usize,
}

/// Represents a complete deck list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckList {
    pub main_deck: Vec<DeckEntry>,
    pub sideboard: Vec<DeckEntry>,
}

impl DeckList {
    /// Total cards in main deck
    pub fn total_cards(&self) -> usize {
        self.main_deck.iter().map(|e| e.count).sum()
    }

    /// Total cards in sideboard
    pub fn sideboard_size(&self) -> usize {
        self.sideboard.iter().map(|e| e.count).sum()
    }
}
