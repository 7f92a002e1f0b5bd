//! API request and response models.

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct ProcessTextPayload {
    pub text: String,
}

#[derive(Serialize, Debug)]
pub struct ProcessTextResponse {
    pub response_text: String,
    /// Relative URL of the synthesized reply audio, when synthesis worked.
    pub audio_url: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub message: String,
}
