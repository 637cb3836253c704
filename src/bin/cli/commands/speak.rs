use std::path::Path;

use anyhow::{Context, Result};

use lingobud_lib::audio::{SpeechOutcome, SpeechSession};

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, text: &str, output: Option<&Path>, format: &OutputFormat) -> Result<()> {
    let client = app.client()?;
    let profile = app.profile();
    let mut session = SpeechSession::new(&app.config.speech);

    let outcome = session
        .synthesize(client.as_ref(), text, &profile.avatar_voice, &profile.target_language)
        .await;

    match outcome {
        SpeechOutcome::Audio(audio) => {
            if let Some(path) = output {
                let bytes: Vec<u8> = audio.samples.iter().flat_map(|s| s.to_le_bytes()).collect();
                std::fs::write(path, bytes)
                    .with_context(|| format!("Failed to write audio to {}", path.display()))?;
            }
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "kind": "audio",
                        "sampleRate": audio.sample_rate,
                        "channels": audio.channels,
                        "samples": audio.samples.len(),
                        "durationMs": audio.duration_ms(),
                    })
                ),
                OutputFormat::Plain => println!(
                    "{} samples at {} Hz ({:.1}s)",
                    audio.samples.len(),
                    audio.sample_rate,
                    audio.duration_ms() / 1000.0
                ),
            }
        }
        SpeechOutcome::Fallback { text, language_code } => match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "kind": "fallback", "text": text, "languageCode": language_code })
            ),
            OutputFormat::Plain => {
                eprintln!("Speech synthesis unavailable; use a {} system voice:", language_code);
                println!("{}", text);
            }
        },
        SpeechOutcome::Silent => {}
    }

    Ok(())
}
