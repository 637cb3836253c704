//! The AI language partner: prompting, streaming and reply parsing

pub mod client;
pub mod errors;
pub mod models;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod splitter;

pub use client::{FragmentStream, GeminiClient, GeminiSettings, SpeechSynthesizer, TextGenerator};
pub use errors::{ErrorDetails, TutorError};
pub use models::{AvatarAction, Emotion, TutorEvent, TutorMetadata, TutorResponse};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use session::{Tutor, TurnObserver};
pub use splitter::{resolve, split_stream, ResponseSplitter, SplitParts, DELIMITER};
