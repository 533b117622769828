use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use log::{debug, error, info, trace, warn};

use crate::{
    Deck, DeckId, DeckPatch, DeckRemote, DeleteOutcome, LocalCache, Persistence, Result,
    SaveOutcome, StudyStreak,
};

/// Cache key holding the serialized deck collection
pub const DECKS_KEY: &str = "memorizeDecks";
/// Cache key holding the streak length
pub const STREAK_COUNT_KEY: &str = "streakCount";
/// Cache key holding the day of the last study event
pub const LAST_STUDIED_KEY: &str = "lastStudied";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Merges the remote collection with the local cache.
///
/// Every remote deck is kept, followed by the local decks whose id the
/// remote does not know. When an id appears twice only its first occurrence
/// survives, so remote records win over local ones.
pub fn reconcile(local: &[Deck], remote: &[Deck]) -> Vec<Deck> {
    let mut seen = HashSet::with_capacity(local.len() + remote.len());

    remote
        .iter()
        .chain(local.iter())
        .filter(|deck| seen.insert(deck.id))
        .cloned()
        .collect()
}

/// Manages the deck collection across the remote store and the local cache.
pub struct DeckStore {
    remote: Arc<dyn DeckRemote>,
    cache: LocalCache,
    /// Merged collection, mirrored in the cache under [`DECKS_KEY`]
    decks: Vec<Deck>,
}

impl DeckStore {
    /// Creates a store over `cache`, loading the decks it already holds.
    ///
    /// A corrupt deck entry is logged and treated as an empty collection.
    pub fn new(remote: Arc<dyn DeckRemote>, cache: LocalCache) -> Self {
        let decks = match cache.get(DECKS_KEY) {
            Some(json) => match serde_json::from_str::<Vec<Deck>>(json) {
                Ok(decks) => reconcile(&decks, &[]),
                Err(e) => {
                    error!("Cached decks are unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        info!("Loaded {} decks from local cache", decks.len());
        Self {
            remote,
            cache,
            decks,
        }
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn get(&self, id: DeckId) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    /// Best fuzzy match of `query` against deck names
    pub fn find_by_name(&self, query: &str) -> Option<&Deck> {
        let matcher = SkimMatcherV2::default();

        self.decks
            .iter()
            .filter_map(|deck| matcher.fuzzy_match(&deck.name, query).map(|s| (s, deck)))
            .max_by_key(|(score, _)| *score)
            .map(|(_, deck)| deck)
    }

    /// Pulls the remote collection and merges it into the cache.
    ///
    /// When the remote is unreachable the cached collection stays as it is
    /// and `LocalOnly` is returned.
    pub async fn refresh(&mut self) -> Result<Persistence> {
        match self.remote.list_decks().await {
            Ok(remote) => {
                self.decks = reconcile(&self.decks, &remote);
                debug!(
                    "Merged {} remote decks, {} decks in total",
                    remote.len(),
                    self.decks.len()
                );
                self.persist_decks()?;
                Ok(Persistence::Remote)
            }
            Err(e) if e.is_remote() => {
                warn!("Error loading decks from server, using local cache: {}", e);
                Ok(Persistence::LocalOnly)
            }
            Err(e) => Err(e),
        }
    }

    /// Saves a deck, remotely if possible.
    ///
    /// On remote success the server id replaces the provisional one. On
    /// remote failure the deck is kept locally under its provisional id.
    pub async fn save(&mut self, mut deck: Deck) -> Result<SaveOutcome> {
        info!("Saving deck {:?} ({} cards)", deck.name, deck.len());

        let persistence = match self.remote.create_deck(&deck.name, &deck.cards).await {
            Ok(id) => {
                debug!("Server assigned id {} to provisional deck {}", id, deck.id);
                deck.id = id;
                Persistence::Remote
            }
            Err(e) if e.is_remote() => {
                warn!("Error saving deck to server, keeping it locally: {}", e);
                Persistence::LocalOnly
            }
            Err(e) => return Err(e),
        };

        let id = deck.id;
        match self.decks.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = deck,
            None => self.decks.push(deck),
        }
        self.persist_decks()?;

        Ok(SaveOutcome { id, persistence })
    }

    /// Deletes a deck remotely (best effort) and locally (always).
    pub async fn delete(&mut self, id: DeckId) -> Result<DeleteOutcome> {
        info!("Deleting deck: {}", id);

        let removed_remotely = match self.remote.delete_deck(id).await {
            Ok(()) => true,
            Err(e) if e.is_remote() => {
                warn!("Error deleting deck {} from server: {}", id, e);
                false
            }
            Err(e) => return Err(e),
        };

        let before = self.decks.len();
        self.decks.retain(|d| d.id != id);
        let removed_locally = self.decks.len() != before;
        self.persist_decks()?;

        Ok(DeleteOutcome {
            id,
            removed_locally,
            removed_remotely,
        })
    }

    /// Records that a deck was opened for study.
    ///
    /// The cache is updated right away; the server update runs in the
    /// background and its failure is only logged. Returns whether the deck
    /// was found locally.
    pub fn touch_studied(&mut self, id: DeckId, at: DateTime<Utc>) -> Result<bool> {
        let Some(deck) = self.decks.iter_mut().find(|d| d.id == id) else {
            debug!("touch_studied: deck {} not in local cache", id);
            return Ok(false);
        };
        let previous = std::mem::replace(&mut deck.last_studied, at);
        if let Err(e) = self.persist_decks() {
            if let Some(deck) = self.decks.iter_mut().find(|d| d.id == id) {
                deck.last_studied = previous;
            }
            return Err(e);
        }

        let patch = DeckPatch {
            last_studied: Some(at),
            ..DeckPatch::default()
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let remote = Arc::clone(&self.remote);
                handle.spawn(async move {
                    if let Err(e) = remote.update_deck(id, &patch).await {
                        warn!("Error updating deck study time for {}: {}", id, e);
                    }
                });
            }
            Err(_) => warn!("No async runtime, study time of deck {} not sent", id),
        }

        Ok(true)
    }

    /// Streak stored in the cache; unreadable values count as no streak.
    pub fn streak(&self) -> StudyStreak {
        let count = self
            .cache
            .get(STREAK_COUNT_KEY)
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(0);
        let last_studied = self.cache.get(LAST_STUDIED_KEY).and_then(|raw| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|e| warn!("Ignoring unreadable last study date {:?}: {}", raw, e))
                .ok()
        });

        StudyStreak::new(count, last_studied)
    }

    pub fn store_streak(&mut self, streak: &StudyStreak) -> Result<()> {
        self.cache.set(STREAK_COUNT_KEY, streak.count.to_string())?;
        match streak.last_studied {
            Some(day) => self
                .cache
                .set(LAST_STUDIED_KEY, day.format(DATE_FORMAT).to_string()),
            None => self.cache.remove(LAST_STUDIED_KEY).map(|_| ()),
        }
    }

    fn persist_decks(&mut self) -> Result<()> {
        trace!("Writing {} decks to local cache", self.decks.len());
        let json = serde_json::to_string(&self.decks)?;
        self.cache.set(DECKS_KEY, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRemote;
    use crate::Card;

    fn deck(id: DeckId, name: &str) -> Deck {
        Deck {
            id,
            ..Deck::new(name, vec![Card::new("Q", "A")])
        }
    }

    fn ids(decks: &[Deck]) -> Vec<DeckId> {
        decks.iter().map(|d| d.id).collect()
    }

    #[test]
    fn reconcile_prefers_remote_and_keeps_local_only() {
        let local = vec![deck(1, "local one"), deck(1_700_000_000_000, "offline")];
        let remote = vec![deck(2, "two"), deck(1, "remote one")];

        let merged = reconcile(&local, &remote);
        assert_eq!(ids(&merged), vec![2, 1, 1_700_000_000_000]);
        assert_eq!(merged[1].name, "remote one");
    }

    #[test]
    fn reconcile_is_idempotent() {
        let local = vec![deck(1, "a"), deck(5, "b"), deck(9, "c")];
        let remote = vec![deck(5, "B"), deck(7, "d")];

        let once = reconcile(&local, &remote);
        let twice = reconcile(&once, &remote);
        assert_eq!(once, twice);
    }

    #[test]
    fn reconcile_never_yields_duplicate_ids() {
        let local = vec![deck(3, "a"), deck(3, "a again"), deck(4, "b")];
        let remote = vec![deck(4, "B"), deck(4, "B again")];

        let merged = reconcile(&local, &remote);
        let unique: HashSet<DeckId> = merged.iter().map(|d| d.id).collect();
        assert_eq!(unique.len(), merged.len());
        assert_eq!(ids(&merged), vec![4, 3]);
    }

    #[tokio::test]
    async fn save_uses_server_id_when_remote_succeeds() {
        let remote = Arc::new(FakeRemote::new().with_decks(vec![deck(41, "old")]));
        let mut store = DeckStore::new(remote.clone(), LocalCache::in_memory());

        let draft = Deck::new("Chemistry", vec![Card::new("Q", "A")]);
        let provisional = draft.id;
        let outcome = store.save(draft).await.unwrap();

        assert_eq!(outcome.persistence, Persistence::Remote);
        assert_eq!(outcome.id, 42);
        assert!(store.get(provisional).is_none());
        assert_eq!(store.get(42).unwrap().name, "Chemistry");
        assert_eq!(remote.decks().len(), 2);
    }

    #[tokio::test]
    async fn save_keeps_provisional_id_when_offline() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_failing(true);
        let mut store = DeckStore::new(remote, LocalCache::in_memory());

        let draft = Deck::new("Offline", vec![Card::new("Q", "A")]);
        let provisional = draft.id;
        let outcome = store.save(draft).await.unwrap();

        assert_eq!(outcome.persistence, Persistence::LocalOnly);
        assert_eq!(outcome.id, provisional);
        assert!(store.get(provisional).is_some());
    }

    #[tokio::test]
    async fn delete_removes_locally_even_when_remote_fails() {
        let remote = Arc::new(FakeRemote::new());
        let mut cache = LocalCache::in_memory();
        cache
            .set(DECKS_KEY, serde_json::to_string(&vec![deck(42, "x"), deck(43, "y")]).unwrap())
            .unwrap();
        let mut store = DeckStore::new(remote.clone(), cache);
        remote.set_failing(true);

        let outcome = store.delete(42).await.unwrap();
        assert!(outcome.removed_locally);
        assert!(!outcome.removed_remotely);
        assert_eq!(ids(store.decks()), vec![43]);
    }

    #[tokio::test]
    async fn refresh_merges_and_persists() {
        let remote = Arc::new(FakeRemote::new().with_decks(vec![deck(1, "server")]));
        let dir = tempfile::tempdir().unwrap();

        let mut cache = LocalCache::open(dir.path()).unwrap();
        cache
            .set(DECKS_KEY, serde_json::to_string(&vec![deck(99, "local")]).unwrap())
            .unwrap();
        let mut store = DeckStore::new(remote.clone(), cache);

        assert_eq!(store.refresh().await.unwrap(), Persistence::Remote);
        assert_eq!(ids(store.decks()), vec![1, 99]);

        // a fresh store over the same directory sees the merged collection
        let reopened = DeckStore::new(remote, LocalCache::open(dir.path()).unwrap());
        assert_eq!(ids(reopened.decks()), vec![1, 99]);
        assert_eq!(reopened.get(1).unwrap(), store.get(1).unwrap());
    }

    #[tokio::test]
    async fn refresh_offline_keeps_cache() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_failing(true);
        let mut cache = LocalCache::in_memory();
        cache
            .set(DECKS_KEY, serde_json::to_string(&vec![deck(5, "mine")]).unwrap())
            .unwrap();
        let mut store = DeckStore::new(remote, cache);

        assert_eq!(store.refresh().await.unwrap(), Persistence::LocalOnly);
        assert_eq!(ids(store.decks()), vec![5]);
    }

    #[test]
    fn corrupt_cached_decks_start_empty() {
        let mut cache = LocalCache::in_memory();
        cache.set(DECKS_KEY, "{not json").unwrap();
        let store = DeckStore::new(Arc::new(FakeRemote::new()), cache);
        assert!(store.decks().is_empty());
    }

    #[tokio::test]
    async fn touch_studied_updates_locally_even_when_remote_fails() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_failing(true);
        let mut store = DeckStore::new(remote, LocalCache::in_memory());
        store.save(deck(8, "x")).await.unwrap();

        let at = Utc::now();
        assert!(store.touch_studied(8, at).unwrap());
        assert_eq!(store.get(8).unwrap().last_studied, at);
        assert!(!store.touch_studied(1234, at).unwrap());
    }

    #[tokio::test]
    async fn touch_studied_sends_patch_in_background() {
        let remote = Arc::new(FakeRemote::new());
        let mut store = DeckStore::new(remote.clone(), LocalCache::in_memory());
        let saved = store.save(Deck::new("x", vec![Card::new("Q", "A")])).await.unwrap();

        let at = Utc::now();
        store.touch_studied(saved.id, at).unwrap();

        for _ in 0..10 {
            if !remote.patches().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let patches = remote.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, saved.id);
        assert_eq!(patches[0].1.last_studied, Some(at));
    }

    #[test]
    fn streak_round_trips_through_cache() {
        let mut store = DeckStore::new(Arc::new(FakeRemote::new()), LocalCache::in_memory());
        assert_eq!(store.streak(), StudyStreak::default());

        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        store.store_streak(&StudyStreak::new(3, Some(day))).unwrap();
        assert_eq!(store.streak(), StudyStreak::new(3, Some(day)));
    }

    #[test]
    fn finds_deck_by_fuzzy_name() {
        let mut cache = LocalCache::in_memory();
        let decks = vec![deck(1, "Organic Chemistry"), deck(2, "World History")];
        cache.set(DECKS_KEY, serde_json::to_string(&decks).unwrap()).unwrap();
        let store = DeckStore::new(Arc::new(FakeRemote::new()), cache);

        assert_eq!(store.find_by_name("wrld hist").unwrap().id, 2);
        assert!(store.find_by_name("zzzz").is_none());
    }
}
