//! Gemini client for text generation and speech synthesis

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{Result, TutorError};

/// Fragments of a streamed reply, in arrival order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Text generation channel
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Open a streamed completion. HTTP-level failures are reported here;
    /// failures after the stream has opened arrive as stream items.
    async fn stream_text(&self, prompt: &str, system_instruction: &str) -> Result<FragmentStream>;

    /// One-shot completion constrained to a JSON schema; returns raw JSON text
    async fn generate_json(&self, prompt: &str, schema: serde_json::Value) -> Result<String>;

    /// One-shot plain text completion
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Audio synthesis channel
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns base64-encoded raw PCM (mono, 24 kHz, 16-bit LE)
    async fn synthesize(&self, text: &str, voice: &str) -> Result<String>;
}

/// Endpoint and model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub base_url: String,
    pub chat_model: String,
    pub speech_model: String,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-2.5-flash".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            connect_timeout: 30,
        }
    }
}

/// Gemini REST client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(api_key: String, settings: GeminiSettings) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(TutorError::MissingApiKey);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout))
            .build()?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    fn url(&self, model: &str, method: &str) -> String {
        model_url(&self.settings.base_url, model, method)
    }

    async fn generate(&self, model: &str, body: serde_json::Value) -> Result<GenerateResponse> {
        let response = self
            .client
            .post(self.url(model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TutorError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn stream_text(&self, prompt: &str, system_instruction: &str) -> Result<FragmentStream> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let request = self
            .client
            .post(format!("{}?alt=sse", self.url(&self.settings.chat_model, "streamGenerateContent")))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let mut es = EventSource::new(request).map_err(|e| TutorError::Stream(e.to_string()))?;
        // Retrying is decided above us, per failure class
        es.set_retry_policy(Box::new(reqwest_eventsource::retry::Never));

        // Wait for the connection so status errors surface at open time
        loop {
            match es.next().await {
                Some(Ok(Event::Open)) => break,
                Some(Ok(Event::Message(message))) => {
                    log::debug!("Ignoring SSE message before open: {}", message.event);
                }
                Some(Err(e)) => {
                    es.close();
                    return Err(event_source_error(e).await);
                }
                None => return Ok(Box::pin(futures_util::stream::empty::<Result<String>>())),
            }
        }

        log::debug!("Reply stream opened");

        let stream = async_stream::stream! {
            let mut tracker = ChunkTracker::default();
            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => match tracker.on_message(&message.data) {
                        Ok(text) => {
                            if !text.is_empty() {
                                yield Ok(text);
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            break;
                        }
                    },
                    Err(reqwest_eventsource::Error::StreamEnded) => {
                        if let Err(e) = tracker.on_end() {
                            yield Err(e);
                        }
                        break;
                    }
                    Err(e) => {
                        yield Err(event_source_error(e).await);
                        break;
                    }
                }
            }
            es.close();
        };

        Ok(Box::pin(stream))
    }

    async fn generate_json(&self, prompt: &str, schema: serde_json::Value) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });
        let text = self.generate(&self.settings.chat_model, body).await?.text();
        if text.trim().is_empty() {
            return Err(TutorError::EmptyResponse("text"));
        }
        Ok(text)
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        Ok(self.generate(&self.settings.chat_model, body).await?.text())
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } },
                },
            },
        });

        self.generate(&self.settings.speech_model, body)
            .await?
            .audio_data()
            .ok_or(TutorError::EmptyResponse("audio data"))
    }
}

/// Build full URL for a model method
fn model_url(base_url: &str, model: &str, method: &str) -> String {
    format!("{}/models/{}:{}", base_url.trim_end_matches('/'), model, method)
}

/// Follows SSE chunks so a connection closed before the model finished
/// is reported instead of being taken as a complete reply
#[derive(Debug, Default)]
struct ChunkTracker {
    finished: bool,
}

impl ChunkTracker {
    /// Parse one SSE payload and return its text
    fn on_message(&mut self, data: &str) -> Result<String> {
        let chunk: GenerateResponse = serde_json::from_str(data)?;
        if chunk.finish_reason().is_some() {
            self.finished = true;
        }
        Ok(chunk.text())
    }

    fn on_end(&self) -> Result<()> {
        if self.finished {
            Ok(())
        } else {
            Err(TutorError::Stream("stream ended before the reply finished".to_string()))
        }
    }
}

async fn event_source_error(error: reqwest_eventsource::Error) -> TutorError {
    match error {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => TutorError::Api {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        },
        reqwest_eventsource::Error::Transport(e) => TutorError::Http(e),
        other => TutorError::Stream(other.to_string()),
    }
}

// ===== Wire types =====

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }

    fn finish_reason(&self) -> Option<&str> {
        self.candidates.first().and_then(|c| c.finish_reason.as_deref())
    }

    fn audio_data(&self) -> Option<String> {
        self.parts()
            .find_map(|p| p.inline_data.as_ref())
            .map(|inline| inline.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        assert!(matches!(
            GeminiClient::new("  ".to_string(), GeminiSettings::default()),
            Err(TutorError::MissingApiKey)
        ));
    }

    #[test]
    fn test_url_building() {
        assert_eq!(
            model_url("http://localhost:8080/v1beta/", "gemini-2.5-flash", "generateContent"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_chunk_text_concatenates_parts() {
        let chunk: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hola, "},{"text":"¿qué tal?"}]}}],"usageMetadata":{}}"#,
        )
        .unwrap();
        assert_eq!(chunk.text(), "Hola, ¿qué tal?");
    }

    #[test]
    fn test_chunk_without_candidates_is_empty() {
        let chunk: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(chunk.text(), "");
        assert_eq!(chunk.audio_data(), None);
    }

    #[test]
    fn test_stream_closed_before_finish_is_an_error() {
        let mut tracker = ChunkTracker::default();
        let text = tracker
            .on_message(r#"{"candidates":[{"content":{"parts":[{"text":"Hola, ¿có"}]}}]}"#)
            .unwrap();
        assert_eq!(text, "Hola, ¿có");

        let err = tracker.on_end().unwrap_err();
        assert!(matches!(err, TutorError::Stream(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_stream_with_finish_reason_ends_cleanly() {
        let mut tracker = ChunkTracker::default();
        tracker
            .on_message(r#"{"candidates":[{"content":{"parts":[{"text":"Hola"}]}}]}"#)
            .unwrap();
        let text = tracker
            .on_message(r#"{"candidates":[{"content":{"parts":[{"text":"_||_{}"}]},"finishReason":"STOP"}]}"#)
            .unwrap();

        assert_eq!(text, "_||_{}");
        assert!(tracker.on_end().is_ok());
    }

    #[test]
    fn test_malformed_chunk_is_a_json_error() {
        let mut tracker = ChunkTracker::default();
        assert!(matches!(tracker.on_message("{not json"), Err(TutorError::Json(_))));
    }

    #[test]
    fn test_audio_data_extraction() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/L16;codec=pcm;rate=24000","data":"AAA="}}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.audio_data().as_deref(), Some("AAA="));
    }
}
