//! Strongly-typed wrappers for game concepts
//!
//! Newtypes keep card names, subtypes and player names from being mixed up
//! with each other or with arbitrary strings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        // `pad` so width/alignment flags work in tables
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

string_newtype!(
    /// Card subtype: "Goblin", "Aura", "Mountain"
    Subtype
);

string_newtype!(
    /// Card name, the key of the card database
    CardName
);

string_newtype!(
    /// Player name as shown in the log
    PlayerName
);

impl Subtype {
    /// Case-insensitive comparison, used for landwalk matching
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl CardName {
    /// Database order: ASCII case-insensitive, without allocating
    pub fn cmp_ignore_case(&self, other: &str) -> Ordering {
        compare_ignore_case(&self.0, other)
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.chars().map(|c| c.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_matching() {
        let subtype = Subtype::new("Forest");
        assert_eq!(subtype.as_str(), "Forest");
        assert!(subtype.matches("forest"));
        assert!(!subtype.matches("Island"));
    }

    #[test]
    fn test_card_name_ordering() {
        assert!(CardName::new("Kird Ape") < CardName::new("Lightning Bolt"));
        assert_eq!(CardName::new("Kird Ape").cmp_ignore_case("KIRD APE"), Ordering::Equal);
        assert_eq!(CardName::new("bolt").cmp_ignore_case("Shock"), Ordering::Less);
    }

    #[test]
    fn test_names_pad_in_tables() {
        assert_eq!(format!("[{:<6}]", PlayerName::new("Bob")), "[Bob   ]");
        assert_eq!(serde_json::to_string(&CardName::new("Shock")).unwrap(), "\"Shock\"");
    }
}
