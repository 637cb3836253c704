use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::*;
use crate::storage::{self, Result, StorageError};

/// Storage for tutor chat sessions (one JSON file per session)
pub struct ChatSessionStorage {
    sessions_dir: PathBuf,
}

impl ChatSessionStorage {
    /// Create a new chat session storage, creating the directory if needed
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        let sessions_dir = data_dir.join("chat_sessions");
        fs::create_dir_all(&sessions_dir)?;
        Ok(Self { sessions_dir })
    }

    /// Get the file path for a session
    fn session_path(&self, id: Uuid) -> PathBuf {
        self.sessions_dir.join(format!("{}.json", id))
    }

    fn save_session(&self, session: &ChatSession) -> Result<()> {
        storage::write_json_atomic(&self.session_path(session.id), session)
    }

    /// Start an empty session titled "New Chat"
    pub fn create_session(&self, user_id: &str, now: DateTime<Utc>) -> Result<ChatSession> {
        let session = ChatSession::new(user_id, now);
        self.save_session(&session)?;
        log::info!("Created chat session {}", session.id);
        Ok(session)
    }

    /// Load a full session by ID. Sessions of other users are not found.
    pub fn get_session(&self, user_id: &str, id: Uuid) -> Result<ChatSession> {
        let path = self.session_path(id);
        if !path.exists() {
            return Err(StorageError::SessionNotFound(id));
        }
        let session: ChatSession = storage::read_json(&path)?;
        if session.user_id != user_id {
            return Err(StorageError::SessionNotFound(id));
        }
        Ok(session)
    }

    /// List a user's sessions as summaries, most recently updated first
    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSessionSummary>> {
        let sessions: Vec<ChatSession> = storage::read_json_dir(&self.sessions_dir)?;
        let mut summaries: Vec<ChatSessionSummary> = sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(ChatSession::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Delete a session by ID
    pub fn delete_session(&self, user_id: &str, id: Uuid) -> Result<()> {
        self.get_session(user_id, id)?;
        fs::remove_file(self.session_path(id))?;
        Ok(())
    }

    pub fn rename_session(
        &self,
        user_id: &str,
        id: Uuid,
        title: String,
        now: DateTime<Utc>,
    ) -> Result<ChatSession> {
        let mut session = self.get_session(user_id, id)?;
        session.title = title;
        session.updated_at = now;
        self.save_session(&session)?;
        Ok(session)
    }

    /// Record a completed turn
    pub fn append_turn(&self, user_id: &str, id: Uuid, turn: ConversationTurn) -> Result<ChatSession> {
        let mut session = self.get_session(user_id, id)?;
        session.push_turn(turn);
        self.save_session(&session)?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::{TutorMetadata, TutorResponse};
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_storage() -> (ChatSessionStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = ChatSessionStorage::new(temp_dir.path().to_path_buf()).unwrap();
        (storage, temp_dir)
    }

    fn turn(transcript: &str, at: DateTime<Utc>) -> ConversationTurn {
        let reply = TutorResponse {
            reply: "¡Muy bien!".to_string(),
            metadata: TutorMetadata::empty(),
        };
        ConversationTurn::new(transcript, reply, at)
    }

    #[test]
    fn test_create_and_get_session() {
        let (storage, _temp) = create_test_storage();
        let session = storage.create_session("local", Utc::now()).unwrap();

        let loaded = storage.get_session("local", session.id).unwrap();
        assert_eq!(loaded.title, "New Chat");
        assert!(loaded.turns.is_empty());
    }

    #[test]
    fn test_first_turn_sets_title() {
        let (storage, _temp) = create_test_storage();
        let now = Utc::now();
        let session = storage.create_session("local", now).unwrap();

        let transcript = "Hola, quiero practicar mi español para mi viaje a Madrid";
        storage.append_turn("local", session.id, turn(transcript, now)).unwrap();
        let updated = storage
            .append_turn("local", session.id, turn("Otra pregunta", now + Duration::seconds(5)))
            .unwrap();

        assert_eq!(updated.title, "Hola, quiero practicar mi espa");
        assert_eq!(updated.title.chars().count(), 30);
        assert_eq!(updated.turns.len(), 2);
        assert_eq!(updated.updated_at, now + Duration::seconds(5));
    }

    #[test]
    fn test_list_sessions_newest_first() {
        let (storage, _temp) = create_test_storage();
        let now = Utc::now();
        let older = storage.create_session("local", now - Duration::hours(1)).unwrap();
        let newer = storage.create_session("local", now).unwrap();
        storage.create_session("someone-else", now).unwrap();

        let summaries = storage.list_sessions("local").unwrap();
        let ids: Vec<Uuid> = summaries.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        storage.append_turn("local", older.id, turn("Buenos días", now + Duration::minutes(1))).unwrap();
        let summaries = storage.list_sessions("local").unwrap();
        assert_eq!(summaries[0].id, older.id);
        assert_eq!(summaries[0].turn_count, 1);
    }

    #[test]
    fn test_sessions_are_scoped_to_their_user() {
        let (storage, _temp) = create_test_storage();
        let now = Utc::now();
        let session = storage.create_session("ana", now).unwrap();

        assert!(matches!(
            storage.get_session("ben", session.id),
            Err(StorageError::SessionNotFound(_))
        ));
        assert!(storage.append_turn("ben", session.id, turn("Hola", now)).is_err());
        assert!(storage
            .rename_session("ben", session.id, "Mine now".to_string(), now)
            .is_err());
        assert!(storage.delete_session("ben", session.id).is_err());

        let untouched = storage.get_session("ana", session.id).unwrap();
        assert_eq!(untouched.title, "New Chat");
        assert!(untouched.turns.is_empty());
    }

    #[test]
    fn test_rename_and_delete() {
        let (storage, _temp) = create_test_storage();
        let session = storage.create_session("local", Utc::now()).unwrap();

        let renamed = storage
            .rename_session("local", session.id, "Travel phrases".to_string(), Utc::now())
            .unwrap();
        assert_eq!(renamed.title, "Travel phrases");

        storage.delete_session("local", session.id).unwrap();
        assert!(matches!(
            storage.get_session("local", session.id),
            Err(StorageError::SessionNotFound(_))
        ));
    }
}
