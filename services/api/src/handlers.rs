//! Axum handlers for the RES-Q REST surface.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    models::{ErrorResponse, ProcessTextPayload, ProcessTextResponse},
    state::AppState,
};
use resq_core::turn::SessionSnapshot;

pub enum ApiError {
    BadRequest(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Liveness line, mirrored from the original backend banner.
pub async fn health() -> &'static str {
    "RES-Q backend is running"
}

/// Runs one conversational turn for a text utterance.
///
/// The reply text always comes back when the turn succeeds; the audio URL
/// is best-effort, because a failed synthesis must not void a good reply.
pub async fn process_text(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProcessTextPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let text = payload.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Empty text".to_string()));
    }

    let reply = {
        let mut engine = state.engine.lock().await;
        engine.on_utterance(&text).await?
    };

    if let Err(error) = state.audio_files.cleanup().await {
        warn!(%error, "stale audio cleanup failed");
    }

    let audio_url = match state.tts.synthesize(&reply).await {
        Ok(clip) => match state.audio_files.store(&clip).await {
            Ok(name) => Some(format!("/static/{name}")),
            Err(error) => {
                warn!(%error, "failed to stage reply audio");
                None
            }
        },
        Err(error) => {
            warn!(%error, "reply synthesis failed");
            None
        }
    };

    Ok(Json(ProcessTextResponse {
        response_text: reply,
        audio_url,
    }))
}

/// Atomically clears the session: ledger back to the system turn, every
/// memory slot emptied.
pub async fn reset(State(state): State<Arc<AppState>>) -> StatusCode {
    state.engine.lock().await.reset().await;
    StatusCode::NO_CONTENT
}

/// Read-only diagnostic snapshot of the ledger and memory store.
pub async fn inspect(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.engine.lock().await.inspect().await)
}
