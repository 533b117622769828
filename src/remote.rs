//! Remote deck service.
//!
//! [`DeckRemote`] is the narrow interface the generator and the deck store
//! talk to. [`HttpRemote`] binds it to the flashcard server's JSON API and
//! [`OfflineRemote`] stands in when no server is configured. Every failure
//! comes back as [`MemoError::RemoteUnavailable`].
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::{Card, Deck, DeckId, MemoError, Result};

/// Fields of a deck that can be updated remotely
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_studied: Option<DateTime<Utc>>,
}

/// Operations offered by the remote flashcard service
#[async_trait]
pub trait DeckRemote: Send + Sync {
    /// Generates question/answer pairs from raw text
    async fn generate_flashcards(&self, text: &str) -> Result<Vec<Card>>;

    /// Lists every deck the server knows about
    async fn list_decks(&self) -> Result<Vec<Deck>>;

    /// Creates a deck and returns its server-assigned identifier
    async fn create_deck(&self, name: &str, cards: &[Card]) -> Result<DeckId>;

    /// Updates some fields of a deck
    async fn update_deck(&self, id: DeckId, patch: &DeckPatch) -> Result<()>;

    /// Deletes a deck
    async fn delete_deck(&self, id: DeckId) -> Result<()>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    flashcards: Vec<Card>,
}

#[derive(Serialize)]
struct CreateDeckRequest<'a> {
    name: &'a str,
    cards: &'a [Card],
}

#[derive(Deserialize)]
struct CreateDeckResponse {
    id: DeckId,
}

/// Deck as returned by `GET /api/decks`
#[derive(Debug, Deserialize)]
struct RemoteDeckRecord {
    id: DeckId,
    name: String,
    #[serde(default)]
    cards: Vec<Card>,
    #[serde(default, alias = "created_at")]
    created: Option<String>,
    #[serde(default, rename = "lastStudied", alias = "last_studied")]
    last_studied: Option<String>,
}

impl RemoteDeckRecord {
    fn into_deck(self) -> Deck {
        let created = self
            .created
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);
        let last_studied = self
            .last_studied
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(created);

        Deck {
            id: self.id,
            name: self.name,
            cards: self.cards,
            created,
            last_studied,
        }
    }
}

/// Parses RFC 3339 or naive ISO timestamps; naive ones are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// HTTP client for the flashcard server
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// Create a new client; `timeout` bounds every request
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(MemoError::ConfigError {
                message: format!("server URL must start with http:// or https://: {}", base_url),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| MemoError::ConfigError {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turns a non-success status into `RemoteUnavailable`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Server answered {}: {}", status, body);
        Err(MemoError::remote(format!("server answered {}", status)))
    }
}

#[async_trait]
impl DeckRemote for HttpRemote {
    async fn generate_flashcards(&self, text: &str) -> Result<Vec<Card>> {
        debug!("POST /api/generate-flashcards ({} bytes)", text.len());
        let response = self
            .client
            .post(self.url("api/generate-flashcards"))
            .json(&GenerateRequest { text })
            .send()
            .await?;

        let body: GenerateResponse = Self::check(response).await?.json().await?;
        Ok(body.flashcards)
    }

    async fn list_decks(&self) -> Result<Vec<Deck>> {
        debug!("GET /api/decks");
        let response = self.client.get(self.url("api/decks")).send().await?;

        let records: Vec<RemoteDeckRecord> = Self::check(response).await?.json().await?;
        Ok(records.into_iter().map(RemoteDeckRecord::into_deck).collect())
    }

    async fn create_deck(&self, name: &str, cards: &[Card]) -> Result<DeckId> {
        debug!("POST /api/decks name={:?} cards={}", name, cards.len());
        let response = self
            .client
            .post(self.url("api/decks"))
            .json(&CreateDeckRequest { name, cards })
            .send()
            .await?;

        let body: CreateDeckResponse = Self::check(response).await?.json().await?;
        Ok(body.id)
    }

    async fn update_deck(&self, id: DeckId, patch: &DeckPatch) -> Result<()> {
        debug!("PATCH /api/decks/{}", id);
        let response = self
            .client
            .patch(self.url(&format!("api/decks/{}", id)))
            .json(patch)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<()> {
        debug!("DELETE /api/decks/{}", id);
        let response = self
            .client
            .delete(self.url(&format!("api/decks/{}", id)))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

/// Remote used when no server is configured; every call is unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl DeckRemote for OfflineRemote {
    async fn generate_flashcards(&self, _text: &str) -> Result<Vec<Card>> {
        Err(MemoError::remote("offline"))
    }

    async fn list_decks(&self) -> Result<Vec<Deck>> {
        Err(MemoError::remote("offline"))
    }

    async fn create_deck(&self, _name: &str, _cards: &[Card]) -> Result<DeckId> {
        Err(MemoError::remote("offline"))
    }

    async fn update_deck(&self, _id: DeckId, _patch: &DeckPatch) -> Result<()> {
        Err(MemoError::remote("offline"))
    }

    async fn delete_deck(&self, _id: DeckId) -> Result<()> {
        Err(MemoError::remote("offline"))
    }
}
