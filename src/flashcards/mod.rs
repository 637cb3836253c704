//! Flashcard and spaced repetition system
//!
//! This module provides:
//! - Flashcard creation from tutor-proposed vocabulary
//! - SM-2 spaced repetition algorithm
//! - Review state tracking with optimistic concurrency

pub mod algorithm;
pub mod models;
pub mod storage;

pub use algorithm::{schedule, schedule_rating, SchedulerError, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR};
pub use models::*;
pub use storage::{FlashcardStorage, FlashcardStorageError};
