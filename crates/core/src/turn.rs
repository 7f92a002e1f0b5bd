//! Turn controller: the concurrency core.
//!
//! Owns the memory store, the ledger, and the one active speech session.
//! Governs the `Idle`/`Speaking` state machine: a new utterance arriving
//! while a reply is being spoken preempts it, and the preempted playback
//! task is joined before any shared state is touched for the new turn.
//! That join-before-proceed step is what keeps the ledger causally ordered
//! and prevents two replies from ever sounding at once.

use crate::adapters::{ReplyService, SpeechRecognizer, TurnObserver};
use crate::context;
use crate::error::{ListenError, ServiceError};
use crate::ledger::{ConversationLedger, Role, Turn};
use crate::memory::{MemoryKey, MemoryStore};
use crate::speech::{ChunkedSpeechPlayer, SpeakOutcome, SpeechSession};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Bound on the reply-service call. The original design waited forever
/// here; a turn that outlives this bound is aborted as
/// [`ServiceError::Timeout`].
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a calm, concise, safety-first \
emergency response assistant. Always prioritize the user's safety and privacy. \
Keep responses short and direct.";

/// Coarse turn-taking state, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    Idle,
    Speaking,
}

/// Read-only snapshot of ledger and memory for the control surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: TurnPhase,
    pub turns: Vec<Turn>,
    pub memory: Vec<MemorySlotView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemorySlotView {
    pub key: MemoryKey,
    pub value: Option<String>,
}

/// Memory and ledger together: mutated only by the controller, and only
/// under this one lock, so a reset is atomic from any observer's view.
struct SessionState {
    memory: MemoryStore,
    ledger: ConversationLedger,
}

struct ActiveSpeech {
    cancel: CancellationToken,
    task: JoinHandle<SpeakOutcome>,
}

/// The coordination core of the agent.
pub struct TurnController {
    state: Arc<Mutex<SessionState>>,
    reply: Arc<dyn ReplyService>,
    observer: Arc<dyn TurnObserver>,
    /// Attached in voice deployments; the HTTP front end runs replies
    /// without local playback and leaves this unset.
    speaker: Option<Arc<ChunkedSpeechPlayer>>,
    reply_timeout: Duration,
    active: Option<ActiveSpeech>,
}

impl TurnController {
    pub fn new(reply: Arc<dyn ReplyService>, observer: Arc<dyn TurnObserver>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                memory: MemoryStore::new(),
                ledger: ConversationLedger::new(DEFAULT_SYSTEM_PROMPT),
            })),
            reply,
            observer,
            speaker: None,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            active: None,
        }
    }

    /// Attaches the chunked player used to speak replies aloud.
    pub fn with_speaker(mut self, speaker: Arc<ChunkedSpeechPlayer>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    /// Replaces the default system turn. Builder-time only: the session
    /// restarts empty with the new prompt at position 0.
    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.state = Arc::new(Mutex::new(SessionState {
            memory: MemoryStore::new(),
            ledger: ConversationLedger::new(system_prompt),
        }));
        self
    }

    /// Current turn-taking phase.
    pub fn phase(&self) -> TurnPhase {
        match &self.active {
            Some(active) if !active.task.is_finished() => TurnPhase::Speaking,
            _ => TurnPhase::Idle,
        }
    }

    /// Cancels any active speech session and waits for its task to stop.
    ///
    /// Nothing for the next turn may run before this returns: the join is
    /// the acknowledgement that no further chunk of the old reply will
    /// synthesize or sound.
    async fn preempt_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.cancel.cancel();
        match active.task.await {
            Ok(SpeakOutcome::Cancelled) => info!("active speech session preempted"),
            Ok(SpeakOutcome::Completed) => debug!("previous speech session already complete"),
            Err(join_error) => warn!(%join_error, "speech task did not join cleanly"),
        }
    }

    /// Runs one full turn for a recognized utterance.
    ///
    /// Preempts in-progress speech, updates memory and ledger, fetches a
    /// reply, and (when a speaker is attached) starts a new speech session.
    /// On reply-service failure the ledger keeps the user turn, gains no
    /// assistant turn, and the observer is notified; the error is also
    /// returned for callers that report it themselves.
    pub async fn on_utterance(&mut self, utterance: &str) -> Result<String, ServiceError> {
        self.preempt_active().await;

        let prompt = {
            let mut state = self.state.lock().await;
            state.ledger.append(Role::User, utterance);
            let changes = state.memory.update(utterance);
            for change in &changes {
                info!(key = %change.key, value = %change.value, "stored");
            }
            context::build_prompt(&state.memory, &state.ledger)
        };

        let reply = match tokio::time::timeout(self.reply_timeout, self.reply.complete(&prompt))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(service_error)) => {
                self.observer.on_error(&service_error);
                return Err(service_error);
            }
            Err(_elapsed) => {
                let service_error = ServiceError::Timeout(self.reply_timeout);
                self.observer.on_error(&service_error);
                return Err(service_error);
            }
        };

        {
            let mut state = self.state.lock().await;
            state.ledger.append(Role::Assistant, &reply);
        }
        self.observer.on_reply(&reply);

        if let Some(speaker) = &self.speaker {
            let session = SpeechSession::new(reply.clone());
            let cancel = session.cancel_token();
            let speaker = Arc::clone(speaker);
            let task = tokio::spawn(async move { speaker.speak(session).await });
            self.active = Some(ActiveSpeech { cancel, task });
        }

        Ok(reply)
    }

    /// Atomically truncates the ledger to the system turn and clears every
    /// memory slot. Any active speech is preempted first.
    pub async fn reset(&mut self) {
        self.preempt_active().await;
        let mut state = self.state.lock().await;
        state.ledger.reset();
        state.memory.clear();
        info!("session reset");
    }

    /// Read-only view of the session for diagnostics.
    pub async fn inspect(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            phase: self.phase(),
            turns: state.ledger.turns().to_vec(),
            memory: state
                .memory
                .iter()
                .map(|(key, value)| MemorySlotView {
                    key,
                    value: value.map(str::to_string),
                })
                .collect(),
        }
    }

    /// Stores the hosting environment's coarse location hint.
    pub async fn set_location_hint(&mut self, hint: &str) {
        let mut state = self.state.lock().await;
        state.memory.set_location_hint(hint);
    }

    /// Stops any in-progress speech and waits for it. Used on loop exit.
    pub async fn shutdown(&mut self) {
        self.preempt_active().await;
    }
}

/// How long each listen attempt waits for speech to start.
pub const LISTEN_TIMEOUT: Duration = Duration::from_secs(5);
/// Longest single utterance captured per attempt.
pub const PHRASE_TIME_LIMIT: Duration = Duration::from_secs(8);

/// The long-lived listening loop.
///
/// Idle between utterances; each recognized utterance is handed to the
/// controller on this task while any preempted playback winds down on its
/// own task. Recognition-layer failures are absorbed here and the loop
/// continues; only the shutdown token ends it.
pub async fn run_listen_loop(
    recognizer: Arc<dyn SpeechRecognizer>,
    controller: &mut TurnController,
    shutdown: CancellationToken,
) {
    info!("listening for speech");
    loop {
        let heard = tokio::select! {
            () = shutdown.cancelled() => break,
            heard = recognizer.listen(LISTEN_TIMEOUT, PHRASE_TIME_LIMIT) => heard,
        };
        match heard {
            Ok(utterance) => {
                let utterance = utterance.trim();
                if utterance.is_empty() {
                    continue;
                }
                info!(%utterance, "utterance recognized");
                if let Err(service_error) = controller.on_utterance(utterance).await {
                    error!(%service_error, "turn aborted");
                }
            }
            Err(ListenError::Timeout) => continue,
            Err(ListenError::Unintelligible) => {
                debug!("discarding unintelligible audio");
            }
            Err(ListenError::Device(message)) => {
                warn!(%message, "recognizer device error");
            }
        }
    }
    controller.shutdown().await;
    info!("listening loop stopped");
}
