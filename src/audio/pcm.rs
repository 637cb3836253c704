//! Raw PCM decoding for synthesized speech

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use thiserror::Error;

/// Sample rate of synthesized speech
pub const SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Audio data is empty")]
    Empty,
}

/// Decoded mono audio, samples in [-1.0, 1.0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcmAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn duration_ms(&self) -> f64 {
        self.samples.len() as f64 * 1000.0 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Decode base64 16-bit little-endian PCM. A trailing odd byte is ignored.
pub fn decode_pcm_base64(data: &str) -> Result<PcmAudio, AudioError> {
    let bytes = BASE64.decode(data.trim())?;
    if bytes.len() < 2 {
        return Err(AudioError::Empty);
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(PcmAudio {
        samples,
        sample_rate: SAMPLE_RATE,
        channels: CHANNELS,
    })
}
