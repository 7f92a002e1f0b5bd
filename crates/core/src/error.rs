//! Error taxonomy for the turn-taking engine.
//!
//! Every failure mode here is recoverable: recognition errors are absorbed
//! by the listening loop, reply and synthesis failures abort at most one
//! turn or one chunk, and nothing is fatal to the process. Cancellation by
//! preemption is deliberately *not* an error — it is reported through
//! [`crate::speech::SpeakOutcome`] instead.

use std::time::Duration;
use thiserror::Error;

/// Failure of the external reply service (network, auth, or timeout).
///
/// A `ServiceError` aborts the current turn: no assistant turn is appended
/// and no speech session is started. It is reported to the injected
/// observer and never retried automatically.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("reply service request failed: {0}")]
    Transport(String),
    #[error("reply service returned an unusable response: {0}")]
    BadResponse(String),
    #[error("reply service did not answer within {0:?}")]
    Timeout(Duration),
}

/// Failure to synthesize one chunk of speech.
///
/// Skips the failing chunk only; playback continues with the next one.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis request failed: {0}")]
    Transport(String),
    #[error("synthesis rejected input: {0}")]
    Rejected(String),
}

/// Failure to start or control playback of a synthesized chunk.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output failure: {0}")]
    Output(String),
}

/// Outcome of a single listen attempt that did not produce an utterance.
#[derive(Debug, Error)]
pub enum ListenError {
    /// No speech was detected before the listen timeout. The loop retries
    /// silently; this is the normal idle case, not a fault.
    #[error("no speech detected before timeout")]
    Timeout,
    /// Audio was captured but could not be transcribed. Discarded.
    #[error("could not understand audio")]
    Unintelligible,
    /// The capture device itself failed.
    #[error("audio device failure: {0}")]
    Device(String),
}
