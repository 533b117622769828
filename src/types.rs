//! Shared result and outcome types for the memorize application.
//!
//! This module contains the values operations hand back to their callers
//! and the CLI subcommands.
use std::path::PathBuf;

use clap::Subcommand;

use crate::{Card, DeckId, MemoError};

/// A specialized Result type for memorize operations.
pub type Result<T> = std::result::Result<T, MemoError>;

/// Result of moving forward in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved to the next card
    Moved,
    /// The last card was passed; emitted once per traversal
    Completed,
    /// Nothing to advance (idle or already complete)
    Ignored,
}

/// Which path produced a set of generated cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Remote,
    LocalFallback,
}

/// Cards produced by the generator, themes applied
#[derive(Debug, Clone)]
pub struct Generation {
    pub cards: Vec<Card>,
    pub source: GenerationSource,
}

/// Where a deck write ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Stored remotely and mirrored in the local cache
    Remote,
    /// Remote store unreachable; only the local cache has it
    LocalOnly,
}

/// Summary of a save operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Server-assigned id, or the provisional id when local-only
    pub id: DeckId,
    pub persistence: Persistence,
}

/// Summary of a delete operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: DeckId,
    /// Whether the deck was present in the local cache
    pub removed_locally: bool,
    /// Whether the remote store confirmed the deletion
    pub removed_remotely: bool,
}

/// Available subcommands for the memorize application
#[derive(Subcommand)]
pub enum Commands {
    /// Generate flashcards from text and study them
    Generate {
        /// Text to generate cards from
        #[clap(short = 'T', long)]
        text: Option<String>,

        /// Path to a file containing the text
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Save the generated cards as a deck with this name
        #[clap(short, long)]
        save: Option<String>,

        /// Print the cards instead of starting a study session
        #[clap(short, long)]
        print: bool,
    },

    /// List saved decks
    Decks {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Study a saved deck
    Study {
        /// Deck id, or a (fuzzy) deck name
        deck: String,
    },

    /// Delete a saved deck
    Delete {
        /// ID of the deck to delete
        id: DeckId,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Show the current study streak
    Streak,

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
