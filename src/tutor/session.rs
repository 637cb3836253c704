//! Conversation turns and one-shot vocabulary helpers

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::client::TextGenerator;
use super::errors::{ErrorDetails, Result};
use super::models::{TutorEvent, TutorResponse};
use super::prompt;
use super::retry::{retry_with_backoff, RetryPolicy};
use super::splitter::split_stream;
use crate::flashcards::FlashcardDraft;
use crate::profile::UserProfile;

/// Receives the outcome of a conversation turn.
///
/// Exactly one of `on_complete` / `on_error` fires per turn.
pub trait TurnObserver {
    fn on_text_chunk(&mut self, chunk: &str);
    fn on_complete(&mut self, response: TutorResponse);
    fn on_error(&mut self, details: ErrorDetails);
}

/// Forwards turn events over a channel
impl TurnObserver for mpsc::UnboundedSender<TutorEvent> {
    fn on_text_chunk(&mut self, chunk: &str) {
        let _ = self.send(TutorEvent::Chunk {
            content: chunk.to_string(),
        });
    }

    fn on_complete(&mut self, response: TutorResponse) {
        let _ = self.send(TutorEvent::Done { response });
    }

    fn on_error(&mut self, details: ErrorDetails) {
        let _ = self.send(TutorEvent::Error { details });
    }
}

/// The AI conversation partner
pub struct Tutor {
    generator: Arc<dyn TextGenerator>,
    retry: RetryPolicy,
    /// word:target:native -> translation
    translations: Mutex<HashMap<String, String>>,
}

impl Tutor {
    pub fn new(generator: Arc<dyn TextGenerator>, retry: RetryPolicy) -> Self {
        Self {
            generator,
            retry,
            translations: Mutex::new(HashMap::new()),
        }
    }

    /// Run one turn, forwarding reply text to `on_chunk` as it streams.
    ///
    /// Opening the stream is retried on overload; the stream itself is not.
    pub async fn stream_turn<F>(
        &self,
        transcript: &str,
        profile: &UserProfile,
        on_chunk: F,
    ) -> Result<TutorResponse>
    where
        F: FnMut(&str),
    {
        let instruction = prompt::system_instruction(profile);
        let stream = retry_with_backoff(&self.retry, || {
            self.generator.stream_text(transcript, &instruction)
        })
        .await?;

        split_stream(stream, on_chunk).await
    }

    /// Run one turn and report it through `observer`
    pub async fn respond<O>(&self, transcript: &str, profile: &UserProfile, observer: &mut O)
    where
        O: TurnObserver + ?Sized,
    {
        let result = self
            .stream_turn(transcript, profile, |chunk| observer.on_text_chunk(chunk))
            .await;

        match result {
            Ok(response) => {
                log::info!(
                    "Turn complete: {} chars, {} flashcards",
                    response.reply.len(),
                    response.metadata.flashcards.len()
                );
                observer.on_complete(response);
            }
            Err(e) => {
                log::error!("Error getting tutor response stream: {}", e);
                observer.on_error(ErrorDetails::from_error(&e));
            }
        }
    }

    /// Ask the model for a flashcard about a word the learner tapped
    pub async fn create_flashcard_for_word(
        &self,
        word: &str,
        context_sentence: &str,
        profile: &UserProfile,
    ) -> Result<FlashcardDraft> {
        let instruction = prompt::flashcard_instruction(word, context_sentence, profile);
        let raw = self
            .generator
            .generate_json(&instruction, prompt::flashcard_schema(profile))
            .await?;
        Ok(serde_json::from_str(raw.trim())?)
    }

    /// Translate a single word into the learner's native language.
    ///
    /// Falls back to the word itself when translation fails; only
    /// non-empty translations are cached.
    pub async fn translate_word(&self, word: &str, profile: &UserProfile) -> String {
        let key = format!("{}:{}:{}", word, profile.target_language, profile.native_language);
        if let Some(cached) = self.translations.lock().ok().and_then(|c| c.get(&key).cloned()) {
            return cached;
        }

        let instruction = prompt::translation_instruction(word, profile);
        match self.generator.generate_text(&instruction).await {
            Ok(text) => {
                let translation = text.trim().to_string();
                if translation.is_empty() {
                    return word.to_string();
                }
                if let Ok(mut cache) = self.translations.lock() {
                    cache.insert(key, translation.clone());
                }
                translation
            }
            Err(e) => {
                log::error!("Error getting word translation: {}", e);
                word.to_string()
            }
        }
    }
}
