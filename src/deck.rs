//! Deck data structure.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Card;

/// Identifier of a deck. Assigned by the remote store, or provisionally from
/// the creation time in milliseconds for decks that only exist locally.
pub type DeckId = i64;

/// A named, ordered collection of cards with persistence metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    /// Unique identifier for the deck
    pub id: DeckId,
    /// Deck name chosen by the user
    pub name: String,
    /// Cards in study order
    pub cards: Vec<Card>,
    /// When the deck was created
    pub created: DateTime<Utc>,
    /// When the deck was last opened for study
    pub last_studied: DateTime<Utc>,
}

impl Deck {
    /// Creates a deck carrying a provisional identifier
    pub fn new(name: impl Into<String>, cards: Vec<Card>) -> Self {
        let now = Utc::now();

        Deck {
            id: now.timestamp_millis(),
            name: name.into(),
            cards,
            created: now,
            last_studied: now,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Theme;

    #[test]
    fn serde_round_trip_keeps_persisted_fields() {
        let deck = Deck::new(
            "Biology",
            vec![Card::new("What is a cell?", "The unit of life.").with_theme(Theme::Science)],
        );

        let json = serde_json::to_string(&deck).unwrap();
        assert!(json.contains("\"lastStudied\""));

        let back: Deck = serde_json::from_str(&json).unwrap();
        assert_eq!(back, deck);
    }

    #[test]
    fn provisional_id_comes_from_creation_time() {
        let deck = Deck::new("Any", Vec::new());
        assert_eq!(deck.id, deck.created.timestamp_millis());
        assert!(deck.is_empty());
    }
}
