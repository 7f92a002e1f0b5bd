//! RES-Q Core
//!
//! The interruptible speech turn-taking engine behind the RES-Q voice
//! agent: conversational memory, prompt construction, the append-only
//! conversation ledger, the preempting turn controller, and the chunked
//! cancellable speech player. External systems (speech recognition, the
//! reply service, text-to-speech, audio output) plug in through the
//! traits in [`adapters`].

pub mod adapters;
pub mod context;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod reply;
pub mod speech;
pub mod turn;

pub use adapters::{
    AudioClip, AudioFormat, AudioOutput, NoopObserver, PlaybackHandle, ReplyService,
    SpeechRecognizer, TtsAdapter, TurnObserver,
};
pub use error::{AudioError, ListenError, ServiceError, SynthesisError};
pub use ledger::{ConversationLedger, Role, Turn};
pub use memory::{MemoryChange, MemoryKey, MemoryStore};
pub use speech::{ChunkedSpeechPlayer, SpeakOutcome, SpeechSession};
pub use turn::{SessionSnapshot, TurnController, TurnPhase, run_listen_loop};
