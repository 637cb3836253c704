//! Data models for tutor replies

use serde::{Deserialize, Serialize};

use super::errors::ErrorDetails;
use crate::flashcards::FlashcardDraft;

/// Avatar facial expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Happy,
    Thinking,
    Teaching,
    Confused,
}

/// Avatar animation to play alongside the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AvatarAction {
    #[default]
    Talk,
    Nod,
    Wave,
    Smile,
}

/// Structured data trailing the reply text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TutorMetadata {
    pub flashcards: Vec<FlashcardDraft>,
    pub emotion: Emotion,
    pub avatar_action: AvatarAction,
    pub pronunciation_feedback: String,
}

impl TutorMetadata {
    /// Used when the model sent no metadata at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Used when the metadata could not be parsed
    pub fn malformed() -> Self {
        Self {
            flashcards: Vec::new(),
            emotion: Emotion::Confused,
            avatar_action: AvatarAction::Smile,
            pronunciation_feedback: "I had a little trouble with my thoughts just now.".to_string(),
        }
    }
}

/// A complete tutor turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorResponse {
    pub reply: String,
    #[serde(flatten)]
    pub metadata: TutorMetadata,
}

/// Streaming event for a tutor turn
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TutorEvent {
    #[serde(rename = "chunk")]
    Chunk { content: String },
    #[serde(rename = "done")]
    Done { response: TutorResponse },
    #[serde(rename = "error")]
    Error { details: ErrorDetails },
}
