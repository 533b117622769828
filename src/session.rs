//! Study session state machine.
//!
//! ```text
//! Idle --start--> Active --next at last card--> Complete
//!                   ^                               |
//!                   +------------restart------------+
//! any --reset--> Idle
//! ```
use log::{debug, info};
use serde::Serialize;

use crate::{Advance, Card, Deck, MemoError, Result};

/// Progress thresholds of the five-step tracker (Start, 25%, 50%, 75%, Complete)
const MILESTONES: [f64; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Active,
    Complete,
}

/// Which deck is being studied and which card is shown
#[derive(Debug, Clone)]
pub struct Session {
    deck: Option<Deck>,
    cursor: usize,
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            deck: None,
            cursor: 0,
            state: SessionState::Idle,
        }
    }

    /// Starts studying `deck` from its first card. Valid from any state; an
    /// empty deck leaves the session untouched.
    pub fn start(&mut self, deck: Deck) -> Result<()> {
        if deck.is_empty() {
            return Err(MemoError::EmptyDeck);
        }

        info!("Starting session on deck {} ({} cards)", deck.id, deck.len());
        self.deck = Some(deck);
        self.cursor = 0;
        self.state = SessionState::Active;
        Ok(())
    }

    /// Moves to the next card, or completes the deck at the last card.
    pub fn next(&mut self) -> Advance {
        let len = match (&self.deck, self.state) {
            (Some(deck), SessionState::Active) => deck.len(),
            _ => return Advance::Ignored,
        };

        if self.cursor + 1 < len {
            self.cursor += 1;
            Advance::Moved
        } else {
            debug!("Session complete after {} cards", len);
            self.state = SessionState::Complete;
            Advance::Completed
        }
    }

    /// Moves to the previous card. No-op on the first card or when nothing
    /// is being studied.
    pub fn previous(&mut self) -> bool {
        if self.state != SessionState::Active || self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Goes back to the first card of the current deck.
    pub fn restart(&mut self) -> bool {
        if self.deck.is_none() {
            return false;
        }
        self.cursor = 0;
        self.state = SessionState::Active;
        true
    }

    /// Drops the active deck and returns to `Idle`.
    pub fn reset(&mut self) {
        if let Some(deck) = self.deck.take() {
            debug!("Session on deck {} reset", deck.id);
        }
        self.cursor = 0;
        self.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.deck.as_ref().map(|_| self.cursor)
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.deck.as_ref().and_then(|d| d.cards.get(self.cursor))
    }

    /// 1-based card number and deck length, for "Card 2 of 5"
    pub fn position(&self) -> Option<(usize, usize)> {
        self.deck.as_ref().map(|d| (self.cursor + 1, d.len()))
    }

    /// Percentage of the deck covered, `cursor / (len - 1) * 100`.
    ///
    /// A single-card deck is at 100 as soon as its card is shown. A completed
    /// deck is at 100. Without a deck the progress is 0.
    pub fn progress(&self) -> f64 {
        let Some(deck) = &self.deck else {
            return 0.0;
        };

        if self.state == SessionState::Complete || deck.len() <= 1 {
            return 100.0;
        }
        self.cursor as f64 / (deck.len() - 1) as f64 * 100.0
    }

    /// How many steps of the progress tracker are reached
    pub fn milestones_reached(&self) -> usize {
        if self.deck.is_none() {
            return 0;
        }
        let progress = self.progress();
        MILESTONES.iter().filter(|m| progress >= **m).count()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
