use serde::{Deserialize, Serialize};

use crate::flashcards::Difficulty;

/// The learner the tutor is talking to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub native_language: String,
    pub target_language: String,
    #[serde(default)]
    pub difficulty_level: Difficulty,
    #[serde(default = "default_avatar_voice")]
    pub avatar_voice: String,
}

fn default_avatar_voice() -> String {
    "Kore".to_string()
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: "local".to_string(),
            display_name: String::new(),
            native_language: "English".to_string(),
            target_language: "Spanish".to_string(),
            difficulty_level: Difficulty::Beginner,
            avatar_voice: default_avatar_voice(),
        }
    }
}
