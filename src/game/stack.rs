//! The priority stack
//!
//! Spells wait here until every player passes in succession. The stack is a
//! small state machine; the turn controller drives it and asks players for
//! input whenever it sits in `WaitPlayer`.

use crate::core::{CardId, PlayerId, Target};
use serde::Serialize;

/// Where the priority round currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StackState {
    /// No round has begun yet
    StartStack,
    /// A player holds priority and must act or pass
    WaitPlayer,
    /// Everyone passed on a non-empty stack; the top item resolves next
    Resolve,
    /// Everyone passed on an empty stack; the round is over
    Empty,
}

/// A spell waiting to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StackItem {
    pub card: CardId,
    pub controller: PlayerId,
    /// Target chosen at cast time, re-checked on resolution
    pub target: Option<Target>,
}

/// LIFO stack plus the pass-tracking state machine
#[derive(Debug, Clone, Serialize)]
pub struct PriorityStack {
    items: Vec<StackItem>,
    state: StackState,
    player_count: usize,
    /// Index (into `GameState::players`) of the active player
    active: usize,
    /// Index of the player holding priority
    priority: usize,
    consecutive_passes: usize,
}

impl PriorityStack {
    pub fn new(player_count: usize) -> Self {
        PriorityStack {
            items: Vec::new(),
            state: StackState::StartStack,
            player_count: player_count.max(1),
            active: 0,
            priority: 0,
            consecutive_passes: 0,
        }
    }

    /// Start a priority round: the active player acts first
    pub fn begin(&mut self, active: usize) {
        self.active = active;
        self.priority = active;
        self.consecutive_passes = 0;
        self.state = StackState::WaitPlayer;
    }

    /// Put a spell on top of the stack
    ///
    /// Resets the pass counter and hands priority back to the active player.
    pub fn push(&mut self, item: StackItem) {
        self.items.push(item);
        self.consecutive_passes = 0;
        self.priority = self.active;
        self.state = StackState::WaitPlayer;
    }

    /// The priority holder passes
    pub fn pass(&mut self) {
        self.consecutive_passes += 1;
        self.priority = (self.priority + 1) % self.player_count;

        if self.consecutive_passes >= self.player_count {
            self.state = if self.items.is_empty() {
                StackState::Empty
            } else {
                StackState::Resolve
            };
        }
    }

    /// Any other successful action: passes start over, the actor keeps priority
    pub fn note_action(&mut self, actor: usize) {
        self.consecutive_passes = 0;
        self.priority = actor;
        self.state = StackState::WaitPlayer;
    }

    /// Pop the top item for resolution
    ///
    /// Afterwards the active player gets priority again if anything is left,
    /// otherwise the round is over.
    pub fn take_resolving(&mut self) -> Option<StackItem> {
        let item = self.items.pop();
        self.consecutive_passes = 0;
        if self.items.is_empty() {
            self.state = StackState::Empty;
        } else {
            self.priority = self.active;
            self.state = StackState::WaitPlayer;
        }
        item
    }

    pub fn state(&self) -> StackState {
        self.state
    }

    pub fn priority_holder(&self) -> usize {
        self.priority
    }

    pub fn pass_count(&self) -> usize {
        self.consecutive_passes
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items from top to bottom
    pub fn items(&self) -> impl Iterator<Item = &StackItem> {
        self.items.iter().rev()
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.items.iter().any(|item| item.card == card)
    }
}
