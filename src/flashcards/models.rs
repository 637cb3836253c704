//! Data models for the flashcard system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Starting ease factor for a new card
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Learner level, used both for cards and for the learner profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        };
        f.write_str(label)
    }
}

/// A vocabulary item proposed by the tutor, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDraft {
    pub word: String,
    pub translation: String,
    #[serde(alias = "exampleSentence")]
    pub example_sentence: String,
    #[serde(alias = "partOfSpeech")]
    pub part_of_speech: String,
    pub difficulty: Difficulty,
}

/// Current spaced repetition state for a card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    /// Current interval in days
    pub interval: i32,
    /// Number of consecutive successful reviews
    pub repetition: i32,
    /// SM-2 ease factor
    pub ease_factor: f64,
    /// When the card is due for review
    pub due_date: DateTime<Utc>,
}

impl ReviewState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            interval: 1,
            repetition: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            due_date: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date <= now
    }
}

/// Answer buttons shown on the review screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// SM-2 quality for this answer
    pub fn quality(self) -> i32 {
        match self {
            Self::Again => 0,
            Self::Hard => 3,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "again" | "0" => Ok(Self::Again),
            "hard" | "3" => Ok(Self::Hard),
            "good" | "4" => Ok(Self::Good),
            "easy" | "5" => Ok(Self::Easy),
            other => Err(format!("unknown rating '{}' (expected again, hard, good or easy)", other)),
        }
    }
}

/// A persisted flashcard with its review state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub user_id: String,
    pub word: String,
    pub translation: String,
    pub example_sentence: String,
    pub part_of_speech: String,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub review: ReviewState,
    /// Bumped on every write, checked by review submissions
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn from_draft(user_id: &str, draft: FlashcardDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            word: draft.word,
            translation: draft.translation,
            example_sentence: draft.example_sentence,
            part_of_speech: draft.part_of_speech,
            difficulty: draft.difficulty,
            review: ReviewState::new(now),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_quality_mapping() {
        let qualities: Vec<i32> = Rating::ALL.iter().map(|r| r.quality()).collect();
        assert_eq!(qualities, vec![0, 3, 4, 5]);
        assert_eq!("Good".parse::<Rating>().unwrap(), Rating::Good);
        assert!("meh".parse::<Rating>().is_err());
    }

    #[test]
    fn test_draft_accepts_both_key_styles() {
        let snake: FlashcardDraft = serde_json::from_str(
            r#"{"word":"gato","translation":"cat","example_sentence":"El gato duerme.","part_of_speech":"n","difficulty":"Beginner"}"#,
        )
        .unwrap();
        let camel: FlashcardDraft = serde_json::from_str(
            r#"{"word":"gato","translation":"cat","exampleSentence":"El gato duerme.","partOfSpeech":"n","difficulty":"Beginner"}"#,
        )
        .unwrap();
        assert_eq!(snake, camel);
    }

    #[test]
    fn test_new_card_starts_due() {
        let now = Utc::now();
        let draft = FlashcardDraft {
            word: "hola".to_string(),
            translation: "hello".to_string(),
            example_sentence: "Hola, amigo.".to_string(),
            part_of_speech: "interj".to_string(),
            difficulty: Difficulty::Beginner,
        };
        let card = Flashcard::from_draft("user-1", draft, now);
        assert_eq!(card.review.interval, 1);
        assert_eq!(card.review.repetition, 0);
        assert_eq!(card.review.ease_factor, INITIAL_EASE_FACTOR);
        assert!(card.review.is_due(now));
    }
}
