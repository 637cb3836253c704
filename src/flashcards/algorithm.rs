//! SM-2 Spaced Repetition Algorithm
//!
//! Implementation of the SuperMemo 2 algorithm for calculating
//! review intervals based on learner performance.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation
//!
//! Intervals are rounded with `f64::round` (half away from zero).

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::models::{Rating, ReviewState};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval handed out (about a century); keeps due dates representable
pub const MAX_INTERVAL_DAYS: i32 = 36_500;

/// Rejected scheduler input. These indicate corrupted stored state or a
/// caller bug, so they are never clamped.
#[derive(Error, Debug, PartialEq)]
pub enum SchedulerError {
    #[error("Quality must be between 0 and 5, got {0}")]
    InvalidQuality(i32),

    #[error("Interval must be at least 1 day, got {0}")]
    InvalidInterval(i32),

    #[error("Repetition count must not be negative, got {0}")]
    InvalidRepetition(i32),

    #[error("Ease factor must be at least 1.3, got {0}")]
    InvalidEaseFactor(f64),
}

fn validate(state: &ReviewState, quality: i32) -> Result<(), SchedulerError> {
    if !(0..=5).contains(&quality) {
        return Err(SchedulerError::InvalidQuality(quality));
    }
    if state.interval < 1 {
        return Err(SchedulerError::InvalidInterval(state.interval));
    }
    if state.repetition < 0 {
        return Err(SchedulerError::InvalidRepetition(state.repetition));
    }
    if !state.ease_factor.is_finite() || state.ease_factor < MIN_EASE_FACTOR {
        return Err(SchedulerError::InvalidEaseFactor(state.ease_factor));
    }
    Ok(())
}

/// Calculate the next review state using the SM-2 algorithm
///
/// # Arguments
/// * `state` - Current review state
/// * `quality` - Quality rating (0-5)
/// * `now` - Review time; the due date is counted from here
pub fn schedule(
    state: &ReviewState,
    quality: i32,
    now: DateTime<Utc>,
) -> Result<ReviewState, SchedulerError> {
    validate(state, quality)?;

    let mut next = *state;

    if quality < 3 {
        // Failed recall: start over, ease factor untouched
        next.repetition = 0;
        next.interval = 1;
    } else {
        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let q = (5 - quality) as f64;
        next.ease_factor = (state.ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MIN_EASE_FACTOR);

        next.interval = match state.repetition {
            0 => 1,
            1 => 6,
            _ => ((state.interval as f64 * next.ease_factor).round() as i32).max(1),
        }
        .min(MAX_INTERVAL_DAYS);
        next.repetition = state.repetition.saturating_add(1);
    }

    next.due_date = now + Duration::days(next.interval as i64);

    Ok(next)
}

/// Schedule from one of the review screen buttons
pub fn schedule_rating(
    state: &ReviewState,
    rating: Rating,
    now: DateTime<Utc>,
) -> Result<ReviewState, SchedulerError> {
    schedule(state, rating.quality(), now)
}

/// Calculate the preview intervals for each rating
/// Used to show users what interval each button would give
pub fn preview_intervals(state: &ReviewState) -> Result<[i32; 4], SchedulerError> {
    let now = Utc::now();
    let mut intervals = [0; 4];
    for (slot, rating) in intervals.iter_mut().zip(Rating::ALL) {
        *slot = schedule_rating(state, rating, now)?.interval;
    }
    Ok(intervals)
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: i32) -> String {
    if days <= 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
