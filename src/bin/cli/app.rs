use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use lingobud_lib::config::{AppConfig, API_KEY_ENV};
use lingobud_lib::conversations::{ChatSessionStorage, ChatSessionSummary};
use lingobud_lib::flashcards::{Flashcard, FlashcardStorage};
use lingobud_lib::profile::UserProfile;
use lingobud_lib::tutor::{GeminiClient, Tutor};

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub cards: FlashcardStorage,
    pub sessions: ChatSessionStorage,
}

impl App {
    /// Load config and open storage under the data directory
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load configuration")?;
        let data_dir = config.data_dir().context("Failed to get data directory")?;

        let cards = FlashcardStorage::new(data_dir.clone());
        let sessions = ChatSessionStorage::new(data_dir)
            .context("Failed to initialize chat session storage")?;

        Ok(Self {
            config,
            cards,
            sessions,
        })
    }

    pub fn profile(&self) -> &UserProfile {
        &self.config.profile
    }

    /// Gemini client; requires an API key
    pub fn client(&self) -> Result<Arc<GeminiClient>> {
        let api_key = self
            .config
            .api_key
            .clone()
            .with_context(|| format!("No API key configured. Set {} or api_key in the config file", API_KEY_ENV))?;
        let client = GeminiClient::new(api_key, self.config.gemini.clone())
            .context("Failed to create Gemini client")?;
        Ok(Arc::new(client))
    }

    pub fn tutor(&self) -> Result<Tutor> {
        Ok(Tutor::new(self.client()?, self.config.retry.clone()))
    }

    /// Find a card by id prefix or word (case-insensitive)
    pub fn find_card(&self, query: &str) -> Result<Flashcard> {
        let cards = self
            .cards
            .list_cards(&self.profile().id)
            .context("Failed to list flashcards")?;
        let query_lower = query.to_lowercase();

        // Exact word match first
        if let Some(card) = cards.iter().find(|c| c.word.to_lowercase() == query_lower) {
            return Ok(card.clone());
        }

        let matches: Vec<&Flashcard> = cards
            .iter()
            .filter(|c| c.id.to_string().starts_with(&query_lower))
            .collect();

        match matches.len() {
            0 => bail!("No card matching '{}'", query),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous card id '{}'. Matches:\n{}", query,
                matches.iter().map(|c| format!("  - {} {}", c.id, c.word)).collect::<Vec<_>>().join("\n")),
        }
    }

    /// Find a session by id prefix
    pub fn find_session(&self, query: &str) -> Result<Uuid> {
        let sessions = self.list_sessions()?;
        let query_lower = query.to_lowercase();

        let matches: Vec<&ChatSessionSummary> = sessions
            .iter()
            .filter(|s| s.id.to_string().starts_with(&query_lower))
            .collect();

        match matches.len() {
            0 => bail!("No session matching '{}'", query),
            1 => Ok(matches[0].id),
            _ => bail!("Ambiguous session id '{}'. Matches:\n{}", query,
                matches.iter().map(|s| format!("  - {} {}", s.id, s.title)).collect::<Vec<_>>().join("\n")),
        }
    }

    pub fn list_sessions(&self) -> Result<Vec<ChatSessionSummary>> {
        self.sessions
            .list_sessions(&self.profile().id)
            .context("Failed to list chat sessions")
    }
}
