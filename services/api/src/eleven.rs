//! Text-to-speech adapters for the HTTP front end.
//!
//! `ElevenLabsTts` talks to the real ElevenLabs API. `BeepTts` is the
//! keyless stand-in: it renders a short tone instead of speech so the
//! whole pipeline can be exercised without an API key.

use async_trait::async_trait;
use resq_core::adapters::{AudioClip, AudioFormat, TtsAdapter};
use resq_core::error::SynthesisError;
use std::io::Cursor;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const ELEVENLABS_MODEL_ID: &str = "eleven_multilingual_v2";
/// ElevenLabs' stock "Rachel" voice.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

#[derive(serde::Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs-backed synthesis, one MP3 clip per call.
pub struct ElevenLabsTts {
    client: reqwest::Client,
    api_key: String,
    voice_id: String,
}

impl ElevenLabsTts {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }
}

#[async_trait]
impl TtsAdapter for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError> {
        let url = format!("{ELEVENLABS_BASE_URL}/text-to-speech/{}", self.voice_id);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&SynthesisRequest {
                text,
                model_id: ELEVENLABS_MODEL_ID,
            })
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Rejected(format!(
                "synthesis service returned HTTP {status}"
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        Ok(AudioClip {
            data: data.to_vec(),
            format: AudioFormat::Mp3,
        })
    }
}

const BEEP_SAMPLE_RATE: u32 = 22_050;
const BEEP_FREQUENCY_HZ: f32 = 440.0;
const BEEP_DURATION_MS: u32 = 500;

/// Keyless stand-in synthesizer producing a 440Hz tone per chunk.
pub struct BeepTts;

#[async_trait]
impl TtsAdapter for BeepTts {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: BEEP_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| SynthesisError::Transport(e.to_string()))?;
            let total_samples = BEEP_SAMPLE_RATE * BEEP_DURATION_MS / 1000;
            for n in 0..total_samples {
                let t = n as f32 / BEEP_SAMPLE_RATE as f32;
                let sample = (t * BEEP_FREQUENCY_HZ * 2.0 * std::f32::consts::PI).sin();
                writer
                    .write_sample((sample * i16::MAX as f32 * 0.5) as i16)
                    .map_err(|e| SynthesisError::Transport(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| SynthesisError::Transport(e.to_string()))?;
        }

        tracing::debug!(chars = text.len(), "generated beep tone in place of speech");
        Ok(AudioClip {
            data: cursor.into_inner(),
            format: AudioFormat::Wav,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn beep_produces_a_riff_wav_clip() {
        let clip = BeepTts.synthesize("Stay calm.").await.unwrap();
        assert_eq!(clip.format, AudioFormat::Wav);
        assert_eq!(&clip.data[..4], b"RIFF");
        // Half a second of 16-bit mono plus header.
        assert!(clip.data.len() > (BEEP_SAMPLE_RATE as usize / 2) * 2);
    }
}
