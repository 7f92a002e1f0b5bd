//! RES-Q API Library Crate
//!
//! This library contains all the logic for the RES-Q web service: the
//! application state wrapping the turn-taking engine, configuration,
//! the REST handlers, routing, and the deployment-specific adapters
//! (Gemini replies via `resq-core`, ElevenLabs or beep-tone synthesis,
//! reply audio staging). The `api` binary is a thin wrapper around this
//! library.

pub mod audio_files;
pub mod config;
pub mod eleven;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
