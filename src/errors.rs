//! Error types for the memorize application.
//!
//! This module defines the error taxonomy shared by the card generator, the
//! deck store and the session controller.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::DeckId;

/// The main error type for the memorize application.
#[derive(Error, Debug)]
pub enum MemoError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No text was given to generate cards from.
    #[error("Please enter some text first.")]
    EmptyInput,

    /// Neither the remote service nor the local heuristic produced a card.
    #[error("Text is too short to generate meaningful flashcards.")]
    NoContentGenerated,

    /// A session was started on a deck without cards.
    #[error("Cannot study an empty deck")]
    EmptyDeck,

    /// Save was requested while no cards are loaded.
    #[error("No flashcards to save.")]
    NoFlashcards,

    /// Any network or service failure of the remote deck service.
    #[error("Remote service unavailable: {message}")]
    RemoteUnavailable { message: String },

    /// Deck was not found in the merged collection.
    #[error("Deck not found: {id}")]
    DeckNotFound { id: DeckId },

    /// Invalid data read from the cache or the remote service.
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    #[error("{message}")]
    EditorError { message: String },
}

impl MemoError {
    /// Shorthand for building a [`MemoError::RemoteUnavailable`].
    pub fn remote(message: impl Into<String>) -> Self {
        MemoError::RemoteUnavailable {
            message: message.into(),
        }
    }

    /// Whether this failure came from the remote service and should trigger
    /// a fallback or degraded path instead of reaching the user.
    pub fn is_remote(&self) -> bool {
        matches!(self, MemoError::RemoteUnavailable { .. })
    }
}

impl From<reqwest::Error> for MemoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MemoError::remote(format!("request timed out: {}", e))
        } else {
            MemoError::remote(e.to_string())
        }
    }
}
