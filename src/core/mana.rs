//! Mana system for casting spells
//!
//! A pool is an ordered list of independent sources. Each source is worth one
//! mana: either a fixed color or a choice among alternatives (dual lands).
//! Costs are parsed from the braced symbol grammar (`{3}{G}{R}`) or from bare
//! symbols (`2RR`).

use crate::{MtgError, Result};
use nom::{
    branch::alt,
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_opt, map_res},
    multi::many0,
    sequence::{delimited, preceded, separated_pair},
    IResult,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Mana colors in MTG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// The five colors, in WUBRG order
    pub const COLORED: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    pub fn from_symbol(symbol: char) -> Option<Color> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Colorless => 'C',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One unit of mana in a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManaSource {
    /// Exactly this color
    Single(Color),
    /// Any one of these colors, chosen at payment time
    AnyOf(SmallVec<[Color; 2]>),
}

impl ManaSource {
    pub fn provides(&self, color: Color) -> bool {
        match self {
            ManaSource::Single(c) => *c == color,
            ManaSource::AnyOf(colors) => colors.contains(&color),
        }
    }
}

impl fmt::Display for ManaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManaSource::Single(c) => write!(f, "{{{c}}}"),
            ManaSource::AnyOf(colors) => {
                write!(f, "{{")?;
                for (i, c) in colors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A mana cost (e.g., `{2}{R}{R}` = 2 generic + 2 red)
///
/// `{C}` requirements are folded into `generic`: both are payable by dedicated
/// colorless sources or by colored mana left over after the colored symbols.
/// Copy-eligible since it's just six u8 fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManaCost {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Generic(u8),
    Colored(Color),
    Colorless,
    Variable,
}

fn generic_symbol(input: &str) -> IResult<&str, Symbol> {
    map_res(digit1, |digits: &str| {
        digits
            .parse::<u32>()
            .map(|n| Symbol::Generic(u8::try_from(n).unwrap_or(u8::MAX)))
    })(input)
}

fn single_symbol(input: &str) -> IResult<&str, Symbol> {
    map_opt(one_of("WUBRGCXwubrgcx"), |c: char| match c.to_ascii_uppercase() {
        'X' => Some(Symbol::Variable),
        'C' => Some(Symbol::Colorless),
        other => Color::from_symbol(other).map(Symbol::Colored),
    })(input)
}

/// `R/W` hybrid: reduced to its first color
fn hybrid_symbol(input: &str) -> IResult<&str, Symbol> {
    map_opt(
        separated_pair(one_of("WUBRGwubrg"), char('/'), one_of("WUBRGP2wubrgp")),
        |(first, _)| Color::from_symbol(first).map(Symbol::Colored),
    )(input)
}

fn braced_symbol(input: &str) -> IResult<&str, Symbol> {
    delimited(
        char('{'),
        alt((hybrid_symbol, generic_symbol, single_symbol)),
        char('}'),
    )(input)
}

fn cost_symbols(input: &str) -> IResult<&str, Vec<Symbol>> {
    all_consuming(delimited(
        multispace0,
        many0(preceded(
            multispace0,
            alt((braced_symbol, generic_symbol, single_symbol)),
        )),
        multispace0,
    ))(input)
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cost such as `{3}{G}{R}`, `{R/W}`, `2RR` or `WUBRG`
    pub fn parse(s: &str) -> Result<Self> {
        let (_, symbols) = cost_symbols(s)
            .map_err(|e| MtgError::ParseError(format!("invalid mana cost '{s}': {e}")))?;

        let mut cost = ManaCost::new();
        for symbol in symbols {
            match symbol {
                Symbol::Generic(n) => cost.generic = cost.generic.saturating_add(n),
                Symbol::Colorless => cost.generic = cost.generic.saturating_add(1),
                Symbol::Colored(color) => cost.add_colored(color, 1),
                // X is chosen on cast; this engine always pays it as zero
                Symbol::Variable => {}
            }
        }
        Ok(cost)
    }

    fn add_colored(&mut self, color: Color, amount: u8) {
        let slot = match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.generic,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Number of symbols of `color` in this cost
    pub fn colored(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => 0,
        }
    }

    /// Total converted mana cost
    ///
    /// Saturates at 255 rather than overflowing on oversized costs.
    pub fn cmc(&self) -> u8 {
        [self.white, self.blue, self.black, self.red, self.green]
            .into_iter()
            .fold(self.generic, u8::saturating_add)
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic > 0 || self.cmc() == 0 {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in Color::COLORED {
            for _ in 0..self.colored(color) {
                write!(f, "{{{color}}}")?;
            }
        }
        Ok(())
    }
}

/// Mana pool for a player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    sources: Vec<ManaSource>,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool holding one single-color source per entry
    pub fn from_colors(colors: &[Color]) -> Self {
        ManaPool {
            sources: colors.iter().copied().map(ManaSource::Single).collect(),
        }
    }

    pub fn add(&mut self, source: ManaSource) {
        self.sources.push(source);
    }

    pub fn add_color(&mut self, color: Color) {
        self.sources.push(ManaSource::Single(color));
    }

    pub fn extend(&mut self, other: &ManaPool) {
        self.sources.extend(other.sources.iter().cloned());
    }

    pub fn sources(&self) -> &[ManaSource] {
        &self.sources
    }

    /// Total mana in pool
    pub fn total(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Check if we can pay the given mana cost
    pub fn can_pay(&self, cost: &ManaCost) -> bool {
        self.payment_plan(cost).is_some()
    }

    /// Pay a mana cost from this pool
    ///
    /// Removes exactly one source per unit of mana. Fails without touching
    /// the pool when the cost cannot be covered.
    pub fn pay(&mut self, cost: &ManaCost) -> Result<()> {
        let plan = self
            .payment_plan(cost)
            .ok_or_else(|| MtgError::InsufficientMana {
                cost: cost.to_string(),
                pool: self.to_string(),
            })?;

        let mut index = 0;
        self.sources.retain(|_| {
            let keep = !plan[index];
            index += 1;
            keep
        });
        Ok(())
    }

    /// Colors the cost needs that nothing in the pool can currently provide
    pub fn missing_colors(&self, cost: &ManaCost) -> SmallVec<[Color; 5]> {
        Color::COLORED
            .into_iter()
            .filter(|&color| {
                let available = self.sources.iter().filter(|s| s.provides(color)).count();
                available < cost.colored(color) as usize
            })
            .collect()
    }

    /// Decide which sources pay for `cost`; `true` marks a spent source
    ///
    /// Pass one covers colored symbols with matching single-color sources.
    /// Whatever is still owed is matched against alternative sources with an
    /// augmenting-path search, so one color never strands another. Pass two
    /// covers generic with dedicated colorless first, then leftover colored,
    /// then leftover alternatives.
    fn payment_plan(&self, cost: &ManaCost) -> Option<Vec<bool>> {
        let mut used = vec![false; self.sources.len()];
        let mut owed: SmallVec<[Color; 8]> = SmallVec::new();

        for color in Color::COLORED {
            let mut need = cost.colored(color);

            for (i, source) in self.sources.iter().enumerate() {
                if need == 0 {
                    break;
                }
                if !used[i] && *source == ManaSource::Single(color) {
                    used[i] = true;
                    need -= 1;
                }
            }
            owed.extend(std::iter::repeat(color).take(need as usize));
        }

        if !owed.is_empty() {
            // Narrow sources are tried first so wide ones stay free for generic
            let mut candidates: Vec<usize> = (0..self.sources.len())
                .filter(|&i| !used[i] && matches!(self.sources[i], ManaSource::AnyOf(_)))
                .collect();
            candidates.sort_by_key(|&i| match &self.sources[i] {
                ManaSource::AnyOf(colors) => colors.len(),
                ManaSource::Single(_) => 0,
            });

            let mut paying: Vec<Option<usize>> = vec![None; self.sources.len()];
            for symbol in 0..owed.len() {
                let mut visited = vec![false; self.sources.len()];
                if !self.assign_symbol(symbol, &owed, &candidates, &mut visited, &mut paying) {
                    return None;
                }
            }
            for (i, slot) in paying.iter().enumerate() {
                if slot.is_some() {
                    used[i] = true;
                }
            }
        }

        let mut generic = cost.generic;
        let tiers: [fn(&ManaSource) -> bool; 3] = [
            |s| *s == ManaSource::Single(Color::Colorless),
            |s| matches!(s, ManaSource::Single(c) if *c != Color::Colorless),
            |s| matches!(s, ManaSource::AnyOf(_)),
        ];
        for tier in tiers {
            for (i, source) in self.sources.iter().enumerate() {
                if generic == 0 {
                    break;
                }
                if !used[i] && tier(source) {
                    used[i] = true;
                    generic -= 1;
                }
            }
        }

        if generic > 0 {
            return None;
        }
        Some(used)
    }
}

impl ManaPool {
    /// Find a source for `owed[symbol]`, moving earlier symbols to other
    /// sources when that frees one up
    fn assign_symbol(
        &self,
        symbol: usize,
        owed: &[Color],
        candidates: &[usize],
        visited: &mut [bool],
        paying: &mut [Option<usize>],
    ) -> bool {
        for &i in candidates {
            if visited[i] || !self.sources[i].provides(owed[symbol]) {
                continue;
            }
            visited[i] = true;
            let free = match paying[i] {
                None => true,
                Some(other) => self.assign_symbol(other, owed, candidates, visited, paying),
            };
            if free {
                paying[i] = Some(symbol);
                return true;
            }
        }
        false
    }
}

impl fmt::Display for ManaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sources.is_empty() {
            return write!(f, "(empty)");
        }
        for source in &self.sources {
            write!(f, "{source}")?;
        }
        Ok(())
    }
}
