//! Speech synthesis with a platform-voice fallback

use serde::{Deserialize, Serialize};

use super::pcm::{decode_pcm_base64, PcmAudio};
use crate::tutor::SpeechSynthesizer;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Consecutive failures before synthesis is skipped for the session
    pub fallback_after_failures: u32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            fallback_after_failures: 5,
        }
    }
}

/// What the caller should play
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutcome {
    Audio(PcmAudio),
    /// Speak `text` with a platform voice for `language_code`
    Fallback { text: String, language_code: &'static str },
    /// Nothing to say
    Silent,
}

/// Tracks synthesis health for one app session
#[derive(Debug)]
pub struct SpeechSession {
    fallback_after: u32,
    failures: u32,
    fallback_mode: bool,
}

impl SpeechSession {
    pub fn new(settings: &SpeechSettings) -> Self {
        Self {
            fallback_after: settings.fallback_after_failures.max(1),
            failures: 0,
            fallback_mode: false,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback_mode
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    pub async fn synthesize<S>(&mut self, synth: &S, text: &str, voice: &str, language: &str) -> SpeechOutcome
    where
        S: SpeechSynthesizer + ?Sized,
    {
        if text.trim().is_empty() {
            return SpeechOutcome::Silent;
        }
        if self.fallback_mode {
            return fallback(text, language);
        }

        let decoded = match synth.synthesize(text, voice).await {
            Ok(data) => decode_pcm_base64(&data).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match decoded {
            Ok(audio) => {
                self.failures = 0;
                SpeechOutcome::Audio(audio)
            }
            Err(e) => {
                self.failures += 1;
                log::error!("Speech synthesis failed ({} in a row): {}", self.failures, e);
                if self.failures >= self.fallback_after {
                    log::warn!("Switching to platform voice after repeated synthesis failures");
                    self.fallback_mode = true;
                }
                fallback(text, language)
            }
        }
    }
}

fn fallback(text: &str, language: &str) -> SpeechOutcome {
    SpeechOutcome::Fallback {
        text: text.to_string(),
        language_code: language_code(language),
    }
}

/// BCP-47 tag for a language name, `en-US` when unknown
pub fn language_code(language: &str) -> &'static str {
    match language {
        "Japanese" => "ja-JP",
        "Spanish" => "es-ES",
        "French" => "fr-FR",
        "German" => "de-DE",
        "Chinese" => "zh-CN",
        "Korean" => "ko-KR",
        "Italian" => "it-IT",
        "Portuguese" => "pt-BR",
        "Russian" => "ru-RU",
        "Arabic" => "ar-SA",
        _ => "en-US",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::errors::{Result, TutorError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeSynth {
        healthy: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeSynth {
        fn new(healthy: bool) -> Self {
            Self {
                healthy: AtomicBool::new(healthy),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynth {
        async fn synthesize(&self, _text: &str, _voice: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok("AEA=".to_string())
            } else {
                Err(TutorError::EmptyResponse("audio data"))
            }
        }
    }

    fn session() -> SpeechSession {
        SpeechSession::new(&SpeechSettings::default())
    }

    #[tokio::test]
    async fn test_audio_on_success() {
        let synth = FakeSynth::new(true);
        let outcome = session().synthesize(&synth, "Hola", "Kore", "Spanish").await;
        match outcome {
            SpeechOutcome::Audio(audio) => assert_eq!(audio.samples, vec![0.5]),
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_falls_back_per_call() {
        let synth = FakeSynth::new(false);
        let mut session = session();
        let outcome = session.synthesize(&synth, "Bonjour", "Kore", "French").await;

        assert_eq!(
            outcome,
            SpeechOutcome::Fallback {
                text: "Bonjour".to_string(),
                language_code: "fr-FR"
            }
        );
        assert_eq!(session.consecutive_failures(), 1);
        assert!(!session.is_fallback());
    }

    #[tokio::test]
    async fn test_switches_after_five_failures() {
        let synth = FakeSynth::new(false);
        let mut session = session();
        for _ in 0..5 {
            session.synthesize(&synth, "Hallo", "Kore", "German").await;
        }
        assert!(session.is_fallback());

        // Synthesis is no longer attempted even once it recovers
        synth.healthy.store(true, Ordering::SeqCst);
        let outcome = session.synthesize(&synth, "Hallo", "Kore", "German").await;
        assert!(matches!(outcome, SpeechOutcome::Fallback { language_code: "de-DE", .. }));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let synth = FakeSynth::new(false);
        let mut session = session();
        for _ in 0..4 {
            session.synthesize(&synth, "Ciao", "Kore", "Italian").await;
        }
        synth.healthy.store(true, Ordering::SeqCst);
        session.synthesize(&synth, "Ciao", "Kore", "Italian").await;
        assert_eq!(session.consecutive_failures(), 0);

        synth.healthy.store(false, Ordering::SeqCst);
        session.synthesize(&synth, "Ciao", "Kore", "Italian").await;
        assert!(!session.is_fallback());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let synth = FakeSynth::new(false);
        let mut first = session();
        for _ in 0..5 {
            first.synthesize(&synth, "Hi", "Kore", "English").await;
        }
        let second = session();
        assert!(first.is_fallback());
        assert!(!second.is_fallback());
    }

    #[tokio::test]
    async fn test_empty_text_is_silent() {
        let synth = FakeSynth::new(true);
        assert_eq!(session().synthesize(&synth, "  ", "Kore", "English").await, SpeechOutcome::Silent);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(language_code("Japanese"), "ja-JP");
        assert_eq!(language_code("Portuguese"), "pt-BR");
        assert_eq!(language_code("Klingon"), "en-US");
    }
}
