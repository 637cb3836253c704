//! Storage operations for flashcards
//!
//! Directory structure per user:
//! ```text
//! users/{user-id}/flashcards/
//! └── {card-id}.json   # Card with its review state
//! ```
//!
//! Cards are written as whole rows. Review submissions carry the version
//! they were read at, so two concurrent reviews of the same card cannot
//! silently overwrite each other.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::{schedule_rating, SchedulerError};
use super::models::*;
use crate::storage::{self, StorageError};

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Card {card_id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        card_id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("Invalid user ID: {0}")]
    InvalidUserId(String),

    #[error("Stored review state is invalid: {0}")]
    Scheduler(#[from] SchedulerError),
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Storage manager for flashcard operations
pub struct FlashcardStorage {
    /// Base data path (e.g., ~/.local/share/lingobud)
    data_dir: PathBuf,
    /// Held across the version check and write of a review
    review_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl FlashcardStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            review_locks: Mutex::new(HashMap::new()),
        }
    }

    fn review_lock(&self, card_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.review_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(card_id).or_default())
    }

    /// Get the flashcards directory for a user
    fn cards_dir(&self, user_id: &str) -> Result<PathBuf> {
        if user_id.is_empty() || user_id.contains(['/', '\\']) || user_id.starts_with('.') {
            return Err(FlashcardStorageError::InvalidUserId(user_id.to_string()));
        }
        Ok(self.data_dir.join("users").join(user_id).join("flashcards"))
    }

    /// Get the path for a specific card
    fn card_path(&self, user_id: &str, card_id: Uuid) -> Result<PathBuf> {
        Ok(self.cards_dir(user_id)?.join(format!("{}.json", card_id)))
    }

    fn save_card(&self, card: &Flashcard) -> Result<()> {
        let path = self.card_path(&card.user_id, card.id)?;
        storage::write_json_atomic(&path, card)?;
        Ok(())
    }

    // ==================== Card Operations ====================

    /// List all cards for a user, newest first
    pub fn list_cards(&self, user_id: &str) -> Result<Vec<Flashcard>> {
        let mut cards: Vec<Flashcard> = storage::read_json_dir(&self.cards_dir(user_id)?)?;
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }

    /// Get a specific card
    pub fn get_card(&self, user_id: &str, card_id: Uuid) -> Result<Flashcard> {
        let path = self.card_path(user_id, card_id)?;
        if !path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }
        Ok(storage::read_json(&path)?)
    }

    /// Create a single card with a fresh review state
    pub fn create_card(&self, user_id: &str, draft: FlashcardDraft) -> Result<Flashcard> {
        let card = Flashcard::from_draft(user_id, draft, Utc::now());
        self.save_card(&card)?;
        log::info!("Created flashcard {} for '{}'", card.id, card.word);
        Ok(card)
    }

    /// Insert tutor-proposed cards, skipping words the user already has
    ///
    /// Returns only the cards that were actually inserted.
    pub fn add_drafts(&self, user_id: &str, drafts: Vec<FlashcardDraft>) -> Result<Vec<Flashcard>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut known: HashSet<String> = self
            .list_cards(user_id)?
            .into_iter()
            .map(|card| card.word)
            .collect();

        let now = Utc::now();
        let mut inserted = Vec::new();
        for draft in drafts {
            if !known.insert(draft.word.clone()) {
                log::debug!("Skipping existing flashcard '{}'", draft.word);
                continue;
            }
            let card = Flashcard::from_draft(user_id, draft, now);
            self.save_card(&card)?;
            inserted.push(card);
        }

        log::info!("Added {} new flashcards for user {}", inserted.len(), user_id);
        Ok(inserted)
    }

    /// Delete a card and its state
    pub fn delete_card(&self, user_id: &str, card_id: Uuid) -> Result<()> {
        let path = self.card_path(user_id, card_id)?;
        if !path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    // ==================== Review Operations ====================

    /// Cards due at `now`, most overdue first
    pub fn due_cards(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Flashcard>> {
        let mut due: Vec<Flashcard> = self
            .list_cards(user_id)?
            .into_iter()
            .filter(|card| card.review.is_due(now))
            .collect();

        // Sort by due date (oldest first)
        due.sort_by(|a, b| a.review.due_date.cmp(&b.review.due_date));

        Ok(due)
    }

    /// Submit a review for a card
    ///
    /// `expected_version` is the version the caller read the card at; the
    /// write is refused if another review landed in between. Reviews of the
    /// same card through this storage are serialized.
    pub fn submit_review(
        &self,
        user_id: &str,
        card_id: Uuid,
        rating: Rating,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let lock = self.review_lock(card_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut card = self.get_card(user_id, card_id)?;
        if card.version != expected_version {
            return Err(FlashcardStorageError::VersionConflict {
                card_id,
                expected: expected_version,
                found: card.version,
            });
        }

        card.review = schedule_rating(&card.review, rating, now)?;
        card.version += 1;
        card.updated_at = now;
        self.save_card(&card)?;

        log::debug!(
            "Reviewed '{}' as {:?}: next in {} days (ef {:.2})",
            card.word,
            rating,
            card.review.interval,
            card.review.ease_factor
        );

        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    const USER: &str = "user-1";

    fn create_test_storage() -> (FlashcardStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FlashcardStorage::new(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    fn draft(word: &str) -> FlashcardDraft {
        FlashcardDraft {
            word: word.to_string(),
            translation: format!("{} (translated)", word),
            example_sentence: format!("Una frase con {}.", word),
            part_of_speech: "n".to_string(),
            difficulty: Difficulty::Beginner,
        }
    }

    #[test]
    fn test_create_and_get_card() {
        let (storage, _temp) = create_test_storage();

        let created = storage.create_card(USER, draft("perro")).unwrap();
        let loaded = storage.get_card(USER, created.id).unwrap();

        assert_eq!(loaded.word, "perro");
        assert_eq!(loaded.review, created.review);
        assert_eq!(loaded.version, 0);
    }

    #[test]
    fn test_add_drafts_skips_known_words() {
        let (storage, _temp) = create_test_storage();
        storage.create_card(USER, draft("gato")).unwrap();

        let inserted = storage
            .add_drafts(USER, vec![draft("gato"), draft("casa"), draft("casa")])
            .unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].word, "casa");
        assert_eq!(storage.list_cards(USER).unwrap().len(), 2);

        // Another user's deck is independent
        let other = storage.add_drafts("user-2", vec![draft("gato")]).unwrap();
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_due_cards_ordered_most_overdue_first() {
        let (storage, _temp) = create_test_storage();
        let now = Utc::now();

        for (word, offset) in [("uno", -1), ("dos", -5), ("tres", 3), ("cuatro", 0)] {
            let mut card = storage.create_card(USER, draft(word)).unwrap();
            card.review.due_date = now + Duration::days(offset);
            storage.save_card(&card).unwrap();
        }

        let due: Vec<String> = storage
            .due_cards(USER, now)
            .unwrap()
            .into_iter()
            .map(|c| c.word)
            .collect();
        assert_eq!(due, vec!["dos", "uno", "cuatro"]);
    }

    #[test]
    fn test_submit_review_updates_state() {
        let (storage, _temp) = create_test_storage();
        let card = storage.create_card(USER, draft("libro")).unwrap();
        let now = Utc::now();

        let first = storage.submit_review(USER, card.id, Rating::Good, 0, now).unwrap();
        assert_eq!(first.review.repetition, 1);
        assert_eq!(first.version, 1);

        let second = storage.submit_review(USER, card.id, Rating::Good, 1, now).unwrap();
        assert_eq!(second.review.interval, 6);
        assert_eq!(second.review.due_date, now + Duration::days(6));
        assert!(storage.due_cards(USER, now).unwrap().is_empty());
    }

    #[test]
    fn test_stale_review_is_rejected() {
        let (storage, _temp) = create_test_storage();
        let card = storage.create_card(USER, draft("mesa")).unwrap();
        let now = Utc::now();

        storage.submit_review(USER, card.id, Rating::Easy, 0, now).unwrap();
        let result = storage.submit_review(USER, card.id, Rating::Again, 0, now);

        assert!(matches!(
            result,
            Err(FlashcardStorageError::VersionConflict { expected: 0, found: 1, .. })
        ));
        assert_eq!(storage.get_card(USER, card.id).unwrap().review.repetition, 1);
    }

    #[test]
    fn test_concurrent_reviews_accept_exactly_one() {
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..20 {
            let (storage, _temp) = create_test_storage();
            let storage = Arc::new(storage);
            let card = storage.create_card(USER, draft("puerta")).unwrap();
            let barrier = Arc::new(Barrier::new(8));

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let storage = Arc::clone(&storage);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        storage.submit_review(USER, card.id, Rating::Good, 0, Utc::now())
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let accepted = results.iter().filter(|r| r.is_ok()).count();
            let conflicts = results
                .iter()
                .filter(|r| matches!(r, Err(FlashcardStorageError::VersionConflict { .. })))
                .count();

            assert_eq!(accepted, 1);
            assert_eq!(conflicts, 7);
            assert_eq!(storage.get_card(USER, card.id).unwrap().version, 1);
        }
    }

    #[test]
    fn test_corrupted_state_is_not_clamped() {
        let (storage, _temp) = create_test_storage();
        let mut card = storage.create_card(USER, draft("silla")).unwrap();
        card.review.ease_factor = 0.9;
        storage.save_card(&card).unwrap();

        let result = storage.submit_review(USER, card.id, Rating::Good, 0, Utc::now());
        assert!(matches!(result, Err(FlashcardStorageError::Scheduler(_))));
    }

    #[test]
    fn test_delete_card() {
        let (storage, _temp) = create_test_storage();
        let card = storage.create_card(USER, draft("agua")).unwrap();

        storage.delete_card(USER, card.id).unwrap();

        assert!(matches!(
            storage.get_card(USER, card.id),
            Err(FlashcardStorageError::CardNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_path_like_user_ids() {
        let (storage, _temp) = create_test_storage();
        assert!(matches!(
            storage.list_cards("../etc"),
            Err(FlashcardStorageError::InvalidUserId(_))
        ));
    }
}
