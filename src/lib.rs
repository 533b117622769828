//! Flashcard study library
//!
//! This library turns text into question/answer flashcards, keeps decks in
//! sync between a flashcard server and a local cache, and drives study
//! sessions over them.

mod cache;
mod card;
mod cli;
mod config;
mod controller;
mod deck;
mod errors;
mod generator;
mod notification;
mod remote;
mod session;
mod store;
mod streak;
mod theme;
mod types;

#[cfg(test)]
mod testing;

// Re-export key components
pub use cache::*;
pub use card::*;
pub use cli::*;
pub use config::*;
pub use controller::*;
pub use deck::*;
pub use errors::*;
pub use generator::*;
pub use notification::*;
pub use remote::*;
pub use session::*;
pub use store::*;
pub use streak::*;
pub use theme::*;
pub use types::*;
