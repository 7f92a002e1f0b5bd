//! Chunked, cancellable speech playback.
//!
//! A reply is split on sentence boundaries and spoken one chunk at a time.
//! Cancellation is cooperative: the player checks the session's token
//! before synthesizing and before playing each chunk, and polls it at a
//! bounded interval while a chunk is sounding, so preemption takes effect
//! within one polling interval rather than after the full chunk.

use crate::adapters::{AudioOutput, TtsAdapter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Upper bound on how long a cancellation can go unnoticed mid-chunk.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One in-flight spoken reply: the cancellable unit of work.
#[derive(Debug)]
pub struct SpeechSession {
    pub text: String,
    pub chunks: Vec<String>,
    pub current_chunk: usize,
    cancel: CancellationToken,
}

impl SpeechSession {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chunks = split_sentences(&text);
        Self {
            text,
            chunks,
            current_chunk: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// Token the owner keeps to request cancellation from outside the
    /// playback task.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// How a speech session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Every chunk was played (or skipped on synthesis failure).
    Completed,
    /// Preempted before the last chunk finished. Expected control flow,
    /// not an error.
    Cancelled,
}

/// Splits reply text into sentence-like chunks.
///
/// A boundary is a terminal `.`, `?` or `!` followed by whitespace. Chunks
/// that are empty after trimming are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut after_terminal = false;
    for (i, c) in text.char_indices() {
        if after_terminal && c.is_whitespace() {
            let chunk = text[start..i].trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }
            start = i;
        }
        after_terminal = matches!(c, '.' | '?' | '!');
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }
    chunks
}

/// Plays a [`SpeechSession`] chunk by chunk through the injected adapters.
pub struct ChunkedSpeechPlayer {
    tts: Arc<dyn TtsAdapter>,
    output: Arc<dyn AudioOutput>,
    poll_interval: Duration,
}

impl ChunkedSpeechPlayer {
    pub fn new(tts: Arc<dyn TtsAdapter>, output: Arc<dyn AudioOutput>) -> Self {
        Self {
            tts,
            output,
            poll_interval: CANCEL_POLL_INTERVAL,
        }
    }

    /// Overrides the cancellation polling interval (tests use a tight one).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Speaks the session to completion or until its token is cancelled.
    ///
    /// Chunks are processed strictly in order. A synthesis failure skips
    /// that chunk and continues; one bad chunk never aborts the reply.
    pub async fn speak(&self, mut session: SpeechSession) -> SpeakOutcome {
        while session.current_chunk < session.chunks.len() {
            if session.is_cancelled() {
                debug!(chunk = session.current_chunk, "speech session cancelled");
                return SpeakOutcome::Cancelled;
            }

            let chunk = &session.chunks[session.current_chunk];
            let clip = match self.tts.synthesize(chunk).await {
                Ok(clip) => clip,
                Err(error) => {
                    warn!(chunk = session.current_chunk, %error, "synthesis failed, skipping chunk");
                    session.current_chunk += 1;
                    continue;
                }
            };

            if session.is_cancelled() {
                return SpeakOutcome::Cancelled;
            }

            let handle = match self.output.play(clip).await {
                Ok(handle) => handle,
                Err(error) => {
                    warn!(chunk = session.current_chunk, %error, "playback failed, skipping chunk");
                    session.current_chunk += 1;
                    continue;
                }
            };

            while handle.is_playing() {
                if session.is_cancelled() {
                    handle.stop();
                    return SpeakOutcome::Cancelled;
                }
                tokio::time::sleep(self.poll_interval).await;
            }

            session.current_chunk += 1;
        }
        SpeakOutcome::Completed
    }
}
