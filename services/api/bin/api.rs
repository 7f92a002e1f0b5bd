//! Main Entrypoint for the RES-Q API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Constructing the reply and synthesis adapters and the turn engine.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use resq_api::{
    audio_files::AudioFileStore,
    config::Config,
    eleven::{BeepTts, ElevenLabsTts},
    router::create_router,
    state::{AppState, LogObserver},
};
use resq_core::adapters::TtsAdapter;
use resq_core::reply::GeminiReplyService;
use resq_core::turn::TurnController;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Adapters and the Turn Engine ---
    let reply = Arc::new(
        GeminiReplyService::new(config.gemini_api_key.clone()).with_model(config.reply_model.clone()),
    );

    let tts: Arc<dyn TtsAdapter> = match &config.eleven_api_key {
        Some(api_key) => Arc::new(ElevenLabsTts::new(api_key.clone())),
        None => {
            warn!("ELEVEN_API_KEY not set; replies will use the beep-tone synthesizer");
            Arc::new(BeepTts)
        }
    };

    let audio_files = Arc::new(
        AudioFileStore::new(config.static_dir.clone())
            .await
            .context("Failed to prepare static audio directory")?,
    );

    // The HTTP front end returns reply audio by URL instead of playing it
    // locally, so the engine runs without an attached speaker here.
    let engine = TurnController::new(reply, Arc::new(LogObserver))
        .with_reply_timeout(config.reply_timeout);

    let app_state = Arc::new(AppState {
        engine: Arc::new(Mutex::new(engine)),
        tts,
        audio_files,
        config: Arc::new(config.clone()),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        model = %config.reply_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server has shut down.");
    Ok(())
}
