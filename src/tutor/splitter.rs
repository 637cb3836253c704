//! Reply/metadata splitting for streamed tutor responses.
//!
//! The model streams its conversational reply first, then the sentinel
//! `_||_`, then a minified JSON object with flashcards and avatar cues.
//! Reply text is forwarded as soon as it arrives; only a tail that could
//! be the start of a split delimiter is held back. Everything after the
//! first delimiter is buffered and parsed once the stream ends.

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::errors::Result;
use super::models::{AvatarAction, Emotion, TutorMetadata, TutorResponse};
use crate::flashcards::FlashcardDraft;

/// Boundary between reply text and the JSON metadata document
pub const DELIMITER: &str = "_||_";

/// Raw outcome of splitting a stream
#[derive(Debug, Clone, PartialEq)]
pub struct SplitParts {
    /// Untrimmed text before the first delimiter
    pub reply: String,
    /// Everything after the first delimiter; `None` if it never appeared
    pub metadata: Option<String>,
}

/// Incremental splitter. Create a fresh instance per stream.
#[derive(Debug)]
pub struct ResponseSplitter {
    delimiter: String,
    reply: String,
    /// Tail of the reply that may be the start of the delimiter
    pending: String,
    metadata: Option<String>,
}

impl Default for ResponseSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSplitter {
    pub fn new() -> Self {
        Self::with_delimiter(DELIMITER)
    }

    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        assert!(!delimiter.is_empty(), "delimiter must not be empty");
        Self {
            delimiter,
            reply: String::new(),
            pending: String::new(),
            metadata: None,
        }
    }

    pub fn delimiter_found(&self) -> bool {
        self.metadata.is_some()
    }

    /// Process one fragment. Returns reply text to show immediately.
    pub fn push(&mut self, fragment: &str) -> Option<String> {
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.push_str(fragment);
            return None;
        }

        let mut buffer = std::mem::take(&mut self.pending);
        buffer.push_str(fragment);

        if let Some(index) = buffer.find(&self.delimiter) {
            self.metadata = Some(buffer[index + self.delimiter.len()..].to_string());
            buffer.truncate(index);
            return self.emit(buffer);
        }

        let held = self.partial_delimiter_len(&buffer);
        self.pending = buffer.split_off(buffer.len() - held);
        self.emit(buffer)
    }

    /// Release held-back text at the end of the stream
    pub fn flush(&mut self) -> Option<String> {
        let pending = std::mem::take(&mut self.pending);
        self.emit(pending)
    }

    pub fn finish(mut self) -> SplitParts {
        self.reply.push_str(&self.pending);
        SplitParts {
            reply: self.reply,
            metadata: self.metadata,
        }
    }

    fn emit(&mut self, text: String) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        self.reply.push_str(&text);
        Some(text)
    }

    /// Length of the longest suffix of `buffer` that is a proper prefix of
    /// the delimiter
    fn partial_delimiter_len(&self, buffer: &str) -> usize {
        (1..self.delimiter.len())
            .rev()
            .filter(|&len| self.delimiter.is_char_boundary(len))
            .find(|&len| buffer.ends_with(&self.delimiter[..len]))
            .unwrap_or(0)
    }
}

/// Resolve the final response from split parts, applying defaults
pub fn resolve(parts: SplitParts) -> TutorResponse {
    let metadata = match parts.metadata.as_deref().map(str::trim) {
        None | Some("") => TutorMetadata::empty(),
        Some(raw) => parse_metadata(raw),
    };

    TutorResponse {
        reply: parts.reply.trim().to_string(),
        metadata,
    }
}

/// Parse the metadata document with field-level defaults
pub fn parse_metadata(raw: &str) -> TutorMetadata {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            log::error!("Failed to parse metadata part of the stream: {}", e);
            log::debug!("Invalid metadata received: {}", raw);
            return TutorMetadata::malformed();
        }
    };

    // A valid document that is not an object carries no fields
    let partial: PartialMetadata = serde_json::from_value(value).unwrap_or_default();

    TutorMetadata {
        flashcards: partial
            .flashcards
            .map(|cards| cards.into_iter().flatten().collect())
            .unwrap_or_default(),
        emotion: partial.emotion.unwrap_or_default(),
        avatar_action: partial.avatar_action.unwrap_or_default(),
        pronunciation_feedback: partial.pronunciation_feedback.unwrap_or_default(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialMetadata {
    #[serde(default, deserialize_with = "lenient_list")]
    flashcards: Option<Vec<Option<FlashcardDraft>>>,
    #[serde(default, deserialize_with = "lenient")]
    emotion: Option<Emotion>,
    #[serde(default, alias = "avatarAction", deserialize_with = "lenient")]
    avatar_action: Option<AvatarAction>,
    #[serde(default, alias = "pronunciationFeedback", deserialize_with = "lenient")]
    pronunciation_feedback: Option<String>,
}

/// A field that fails to deserialize falls back to its default instead of
/// failing the whole document
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like `lenient`, but individual malformed entries are dropped
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<Option<T>>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Consume a fragment stream, forwarding reply text to `on_chunk` in order.
///
/// Returns the resolved response when the stream ends normally. If the
/// stream yields an error the split is abandoned and the error returned;
/// partial reply text already forwarded is not part of any result.
pub async fn split_stream<S, F>(stream: S, mut on_chunk: F) -> Result<TutorResponse>
where
    S: Stream<Item = Result<String>>,
    F: FnMut(&str),
{
    let mut stream = std::pin::pin!(stream);
    let mut splitter = ResponseSplitter::new();

    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        if fragment.is_empty() {
            continue;
        }
        if let Some(text) = splitter.push(&fragment) {
            on_chunk(&text);
        }
    }

    if let Some(text) = splitter.flush() {
        on_chunk(&text);
    }

    if !splitter.delimiter_found() {
        log::debug!("Stream ended without metadata delimiter");
    }

    Ok(resolve(splitter.finish()))
}
