//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the turn-taking
//! engine and the shared, clonable resources every handler needs.

use crate::audio_files::AudioFileStore;
use crate::config::Config;
use resq_core::adapters::{TtsAdapter, TurnObserver};
use resq_core::error::ServiceError;
use resq_core::turn::TurnController;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The one session engine. Handlers serialize turns through this lock;
    /// the engine itself serializes preemption internally.
    pub engine: Arc<Mutex<TurnController>>,
    pub tts: Arc<dyn TtsAdapter>,
    pub audio_files: Arc<AudioFileStore>,
    pub config: Arc<Config>,
}

/// Observer that surfaces finalized turns in the service log.
///
/// Stands where the original design's dynamically registered frontend
/// callback stood; the HTTP response already carries the reply text, so
/// logging is all that is left to do here.
pub struct LogObserver;

impl TurnObserver for LogObserver {
    fn on_reply(&self, reply: &str) {
        info!(chars = reply.len(), "assistant turn finalized");
    }

    fn on_error(&self, error: &ServiceError) {
        error!(%error, "turn aborted by reply service");
    }
}
