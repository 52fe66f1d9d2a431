use soundboard::services::{speech, OutputSlot, RodioOutput, SpeechWorker};
use soundboard::{build_router, AppState, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,soundboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    if !config.app.sound_dir.is_dir() {
        tracing::warn!(
            "Library root {} does not exist; the board will be empty",
            config.app.sound_dir.display()
        );
    }

    // Audio output and speech engine
    let output = Arc::new(RodioOutput::open(config.app.sample_rate)?);
    let command = config.speech.command.clone();
    let speech = SpeechWorker::spawn(move || speech::platform_backend(command))?;
    let slot = Arc::new(OutputSlot::new(output, speech));
    tracing::info!("Audio output ready");

    let state = Arc::new(AppState::new(&config, slot));
    let app = build_router(state);

    // Start server
    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
