//! Tutor error types and failure classification

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while talking to the generative API
#[derive(Debug, Error)]
pub enum TutorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response contained no {0}")]
    EmptyResponse(&'static str),

    #[error("API key is not configured")]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, TutorError>;

const RATE_LIMIT_MESSAGE: &str = "API rate limit reached. Please wait a minute.";
const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

fn rate_limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)RESOURCE_EXHAUSTED|rate limit|quota").expect("valid rate limit pattern")
    })
}

impl TutorError {
    /// Quota exhaustion (HTTP 429 and friends). Never retried.
    pub fn is_rate_limit(&self) -> bool {
        if let Self::Api { status: 429, .. } = self {
            return true;
        }
        let detail = self.to_string();
        detail.contains("429") || rate_limit_pattern().is_match(&detail)
    }

    /// Overload or connectivity failures worth retrying
    pub fn is_transient(&self) -> bool {
        if self.is_rate_limit() {
            return false;
        }
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, body } => {
                *status == 503 || body.contains("overloaded") || body.contains("UNAVAILABLE")
            }
            _ => false,
        }
    }
}

/// What the caller shows the learner when a turn fails
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub is_rate_limit: bool,
    pub message: String,
}

impl ErrorDetails {
    pub fn from_error(error: &TutorError) -> Self {
        let is_rate_limit = error.is_rate_limit();
        let detail = match error {
            TutorError::Api { body, .. } => body.clone(),
            other => other.to_string(),
        };

        let message = structured_message(&detail).unwrap_or_else(|| {
            if is_rate_limit {
                RATE_LIMIT_MESSAGE.to_string()
            } else if detail.is_empty() {
                GENERIC_MESSAGE.to_string()
            } else {
                detail
            }
        });

        Self {
            is_rate_limit,
            message,
        }
    }
}

impl From<&TutorError> for ErrorDetails {
    fn from(error: &TutorError) -> Self {
        Self::from_error(error)
    }
}

/// Pull `error.message` or `message` out of a JSON payload embedded
/// anywhere in the failure text
fn structured_message(detail: &str) -> Option<String> {
    let start = detail.find('{')?;
    let value: serde_json::Value = serde_json::from_str(&detail[start..]).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, body: &str) -> TutorError {
        TutorError::Api {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_rate_limit_with_structured_message() {
        let error = api(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        let details = ErrorDetails::from_error(&error);

        assert!(details.is_rate_limit);
        assert_eq!(details.message, "Quota exceeded for metric");
        assert!(!error.is_transient());
    }

    #[test]
    fn test_rate_limit_detected_from_text() {
        let error = TutorError::Stream("upstream said: Rate Limit exceeded".to_string());
        let details = ErrorDetails::from_error(&error);

        assert!(details.is_rate_limit);
        assert_eq!(details.message, RATE_LIMIT_MESSAGE);
    }

    #[test]
    fn test_plain_failure_uses_raw_text() {
        let error = api(400, "bad request");
        let details = ErrorDetails::from_error(&error);

        assert!(!details.is_rate_limit);
        assert_eq!(details.message, "bad request");
    }

    #[test]
    fn test_top_level_message_field() {
        let error = api(500, r#"internal: {"message":"backend exploded"}"#);
        assert_eq!(ErrorDetails::from_error(&error).message, "backend exploded");
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(503, "").is_transient());
        assert!(api(500, r#"{"error":{"message":"The model is overloaded."}}"#).is_transient());
        assert!(api(500, r#"{"error":{"status":"UNAVAILABLE"}}"#).is_transient());
        assert!(!api(401, "unauthorized").is_transient());
        assert!(!api(403, "PERMISSION_DENIED").is_transient());
        assert!(!TutorError::Stream("connection reset".to_string()).is_transient());
    }
}
