use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tutor::TutorResponse;

/// Number of transcript characters used for an automatic title
pub const TITLE_CHARS: usize = 30;

pub const DEFAULT_TITLE: &str = "New Chat";

/// A full chat session with all turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub turns: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: DEFAULT_TITLE.to_string(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a completed turn; the first one names the session
    pub fn push_turn(&mut self, turn: ConversationTurn) {
        if self.turns.is_empty() {
            let title: String = turn.transcript.trim().chars().take(TITLE_CHARS).collect();
            if !title.is_empty() {
                self.title = title;
            }
        }
        self.updated_at = turn.created_at;
        self.turns.push(turn);
    }

    pub fn summary(&self) -> ChatSessionSummary {
        ChatSessionSummary {
            id: self.id,
            title: self.title.clone(),
            turn_count: self.turns.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A lightweight summary for listing sessions without the turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSessionSummary {
    pub id: Uuid,
    pub title: String,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the learner said and the tutor's completed reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub transcript: String,
    pub reply: TutorResponse,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(transcript: &str, reply: TutorResponse, now: DateTime<Utc>) -> Self {
        Self {
            transcript: transcript.to_string(),
            reply,
            created_at: now,
        }
    }
}
