//! In-memory remote used by unit tests.
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{Card, Deck, DeckId, DeckPatch, DeckRemote, MemoError, Result};

/// Scriptable [`DeckRemote`] that keeps decks in memory and counts calls
pub struct FakeRemote {
    failing: AtomicBool,
    broken: AtomicBool,
    calls: AtomicUsize,
    next_id: AtomicUsize,
    generated: Vec<Card>,
    decks: Mutex<Vec<Deck>>,
    patches: Mutex<Vec<(DeckId, DeckPatch)>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            failing: AtomicBool::new(false),
            broken: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
            generated: Vec::new(),
            decks: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
        }
    }

    /// Cards returned by `generate_flashcards`
    pub fn with_generated(mut self, cards: Vec<Card>) -> Self {
        self.generated = cards;
        self
    }

    /// Decks the server already holds
    pub fn with_decks(self, decks: Vec<Deck>) -> Self {
        let max_id = decks.iter().map(|d| d.id).max().unwrap_or(0);
        self.next_id.store(max_id as usize + 1, Ordering::SeqCst);
        *self.decks.lock().unwrap() = decks;
        self
    }

    /// Makes every following call fail as if the network were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every following call fail with a local, non-network error
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn decks(&self) -> Vec<Deck> {
        self.decks.lock().unwrap().clone()
    }

    pub fn patches(&self) -> Vec<(DeckId, DeckPatch)> {
        self.patches.lock().unwrap().clone()
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.load(Ordering::SeqCst) {
            Err(MemoError::LockAcquisitionFailed {
                message: "simulated poisoned lock".to_string(),
            })
        } else if self.failing.load(Ordering::SeqCst) {
            Err(MemoError::remote("simulated network error"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeckRemote for FakeRemote {
    async fn generate_flashcards(&self, _text: &str) -> Result<Vec<Card>> {
        self.enter()?;
        Ok(self.generated.clone())
    }

    async fn list_decks(&self) -> Result<Vec<Deck>> {
        self.enter()?;
        Ok(self.decks())
    }

    async fn create_deck(&self, name: &str, cards: &[Card]) -> Result<DeckId> {
        self.enter()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as DeckId;
        let now = Utc::now();
        self.decks.lock().unwrap().push(Deck {
            id,
            name: name.to_string(),
            cards: cards.to_vec(),
            created: now,
            last_studied: now,
        });
        Ok(id)
    }

    async fn update_deck(&self, id: DeckId, patch: &DeckPatch) -> Result<()> {
        self.enter()?;
        self.patches.lock().unwrap().push((id, patch.clone()));
        Ok(())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<()> {
        self.enter()?;
        self.decks.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }
}
