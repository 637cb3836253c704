//! Speech audio: PCM decoding and synthesis fallback

pub mod pcm;
pub mod speech;

pub use pcm::{decode_pcm_base64, AudioError, PcmAudio};
pub use speech::{language_code, SpeechOutcome, SpeechSession, SpeechSettings};
