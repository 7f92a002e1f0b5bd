//! Collaborator interfaces the engine depends on.
//!
//! The engine never talks to a microphone, a language model, or a speaker
//! directly. Each external system sits behind one of the traits below and
//! is injected at construction, so the whole turn protocol can be driven
//! by fakes in tests and by real clients in deployment.

use crate::error::{AudioError, ListenError, ServiceError, SynthesisError};
use async_trait::async_trait;
use std::time::Duration;

/// Container format of a synthesized audio chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}

/// One synthesized, playable audio chunk.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}

/// Converts spans of user speech to text.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Waits up to `timeout` for speech to start, then captures at most
    /// `phrase_time_limit` of audio and transcribes it.
    async fn listen(
        &self,
        timeout: Duration,
        phrase_time_limit: Duration,
    ) -> Result<String, ListenError>;
}

/// The language-model reply service.
#[async_trait]
pub trait ReplyService: Send + Sync {
    /// Sends the full rendered prompt and returns the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Text-to-speech synthesis for one chunk at a time.
#[async_trait]
pub trait TtsAdapter: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError>;
}

/// Handle to one currently-sounding chunk, used only to request early stop.
pub trait PlaybackHandle: Send {
    /// Requests the chunk stop sounding as soon as possible.
    fn stop(&self);
    /// Whether the chunk is still audible.
    fn is_playing(&self) -> bool;
}

/// Plays synthesized chunks on whatever output the deployment provides.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    async fn play(&self, clip: AudioClip) -> Result<Box<dyn PlaybackHandle>, AudioError>;
}

/// Sink for finalized turns, injected at construction.
///
/// Replaces the original design's mutable global callback: a front-facing
/// layer receives each finalized assistant reply and each aborted turn
/// through this capability instead of registering itself at runtime.
pub trait TurnObserver: Send + Sync {
    /// Called once an assistant turn has been appended to the ledger.
    fn on_reply(&self, reply: &str);
    /// Called when a turn is aborted by a reply-service failure.
    fn on_error(&self, error: &ServiceError);
}

/// Observer for callers that do not need turn notifications.
pub struct NoopObserver;

impl TurnObserver for NoopObserver {
    fn on_reply(&self, _reply: &str) {}
    fn on_error(&self, _error: &ServiceError) {}
}
