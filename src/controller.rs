//! Flashcard session controller.
//!
//! Owns the study session, the deck store, the card generator and the
//! notification center, and exposes one method per user gesture. Remote
//! failures end in a fallback and at most a warning; local failures end in
//! an error notification and an `Err` with nothing changed.
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, Utc};
use log::{debug, info};

use crate::{
    Advance, CardGenerator, Config, Deck, DeckId, DeckRemote, DeckStore, DeleteOutcome,
    GenerationSource, HttpRemote, LocalCache, MemoError, NotificationCenter, OfflineRemote,
    Persistence, Result, SaveOutcome, Session, Severity, StudyStreak,
};

/// Name given to freshly generated cards until they are saved
pub const DRAFT_DECK_NAME: &str = "Untitled deck";

pub struct FlashcardController {
    generator: CardGenerator,
    store: DeckStore,
    session: Session,
    streak: StudyStreak,
    notifications: NotificationCenter,
}

impl FlashcardController {
    pub fn new(remote: Arc<dyn DeckRemote>, cache: LocalCache, notify_for: Duration) -> Self {
        let store = DeckStore::new(Arc::clone(&remote), cache);
        let streak = store.streak();

        Self {
            generator: CardGenerator::new(remote),
            store,
            session: Session::new(),
            streak,
            notifications: NotificationCenter::new(notify_for),
        }
    }

    /// Builds a controller from the configuration. Without a server URL the
    /// controller runs offline; with `ephemeral` nothing is written to disk.
    pub fn from_config(config: &Config, ephemeral: bool) -> Result<Self> {
        let remote: Arc<dyn DeckRemote> = match &config.server_url {
            Some(url) => Arc::new(HttpRemote::new(url, config.request_timeout())?),
            None => {
                info!("No server configured, working offline");
                Arc::new(OfflineRemote)
            }
        };

        let cache = if ephemeral {
            LocalCache::in_memory()
        } else {
            LocalCache::open(&config.data_dir)?
        };

        Ok(Self::new(remote, cache, config.notification_duration()?))
    }

    /// Replaces the card generator, e.g. with a seeded one
    pub fn with_generator(mut self, generator: CardGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn decks(&self) -> &[Deck] {
        self.store.decks()
    }

    pub fn store(&self) -> &DeckStore {
        &self.store
    }

    pub fn streak(&self) -> StudyStreak {
        self.streak
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    /// Surfaces a local failure to the user and hands it back
    fn fail<T>(&mut self, err: MemoError, message: Option<&str>) -> Result<T> {
        let message = message.map(str::to_string).unwrap_or_else(|| err.to_string());
        self.notifications.push(Severity::Error, message);
        Err(err)
    }

    /// Generates cards from `text` and starts studying them.
    pub async fn generate(&mut self, text: &str) -> Result<GenerationSource> {
        let generation = match self.generator.generate(text).await {
            Ok(generation) => generation,
            Err(e) => return self.fail(e, None),
        };

        if generation.source == GenerationSource::LocalFallback {
            self.notifications.push(
                Severity::Warning,
                "Server error. Using local generation instead.",
            );
        }

        let deck = Deck::new(DRAFT_DECK_NAME, generation.cards);
        if deck.is_empty() {
            return self.fail(MemoError::EmptyDeck, None);
        }

        self.record_study_event(Local::now().date_naive())?;
        if let Err(e) = self.session.start(deck) {
            return self.fail(e, None);
        }

        Ok(generation.source)
    }

    /// Re-reads the saved decks, merging the server's collection when it is
    /// reachable.
    pub async fn refresh_decks(&mut self) -> Result<Persistence> {
        match self.store.refresh().await {
            Ok(persistence) => Ok(persistence),
            Err(e) => self.fail(e, None),
        }
    }

    /// Starts studying a saved deck.
    pub async fn load_deck(&mut self, id: DeckId) -> Result<()> {
        let Some(deck) = self.store.get(id).cloned() else {
            return self.fail(
                MemoError::DeckNotFound { id },
                Some("Could not load deck, it may be corrupted."),
            );
        };

        if deck.is_empty() {
            return self.fail(
                MemoError::EmptyDeck,
                Some("Could not load deck, it may be corrupted."),
            );
        }

        // the session only moves once the study time and streak are stored
        if let Err(e) = self.store.touch_studied(id, Utc::now()) {
            return self.fail(e, None);
        }
        self.record_study_event(Local::now().date_naive())?;

        let name = deck.name.clone();
        if let Err(e) = self.session.start(deck) {
            return self.fail(e, Some("Could not load deck, it may be corrupted."));
        }

        self.notifications
            .push(Severity::Success, format!("Loaded deck: {}", name));
        Ok(())
    }

    /// Saves the cards being studied as a new deck.
    pub async fn save_current(&mut self, name: Option<&str>) -> Result<SaveOutcome> {
        let Some(cards) = self.session.deck().map(|d| d.cards.clone()) else {
            return self.fail(MemoError::NoFlashcards, None);
        };

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("My Deck {}", self.store.decks().len() + 1),
        };

        let outcome = match self.store.save(Deck::new(name, cards)).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e, None),
        };

        match outcome.persistence {
            Persistence::Remote => self
                .notifications
                .push(Severity::Success, "Deck saved successfully!"),
            Persistence::LocalOnly => self
                .notifications
                .push(Severity::Warning, "Deck saved locally (offline mode)."),
        }
        Ok(outcome)
    }

    /// Deletes a saved deck; the local copy always goes.
    pub async fn delete_deck(&mut self, id: DeckId) -> Result<DeleteOutcome> {
        let outcome = match self.store.delete(id).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e, None),
        };

        if outcome.removed_remotely {
            self.notifications
                .push(Severity::Success, "Deck deleted successfully!");
        } else {
            self.notifications
                .push(Severity::Warning, "Deck deleted from local storage.");
        }
        Ok(outcome)
    }

    pub fn next(&mut self) -> Advance {
        let advance = self.session.next();
        if advance == Advance::Completed {
            self.notifications.push(
                Severity::Success,
                "Congratulations! You've completed this deck!",
            );
        }
        advance
    }

    pub fn previous(&mut self) -> bool {
        self.session.previous()
    }

    pub fn restart(&mut self) -> bool {
        self.session.restart()
    }

    /// Leaves the current deck; saved decks are untouched.
    pub fn new_deck(&mut self) {
        self.session.reset();
    }

    /// Counts a study event on `today` towards the daily streak and persists
    /// the streak when it changed. Returns the streak length.
    pub fn record_study_event(&mut self, today: NaiveDate) -> Result<u32> {
        let mut streak = self.streak;
        if streak.record(today) {
            if let Err(e) = self.store.store_streak(&streak) {
                return self.fail(e, None);
            }
            self.streak = streak;
            debug!("Study streak is now {} days", streak.count);
        }
        Ok(self.streak.count)
    }
}
