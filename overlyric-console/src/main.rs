mod render;
mod source;

use crate::render::print_sink_events;
use crate::source::FileLyricsSource;
use overlyric_core::{BroadcastSink, CoreError, InterpolatedClock, OverlyricConfig, SyncController};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SONG_ID: &str = "demo";

fn main() {
    init_tracing();

    // Load config or create template on first run
    let config = match OverlyricConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            println!(
                "A configuration file has been created at {}.\n\
                Edit it if needed and run again.",
                path.display()
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let song_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SONG_ID.to_string());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(run(config, song_id, cancel_token));
}

async fn run(config: OverlyricConfig, song_id: String, cancel_token: CancellationToken) {
    // No real player here: play from the configured position in wall time
    let clock = Arc::new(InterpolatedClock::new());
    clock.report(true, config.console.start_position_ms);
    let source = Arc::new(FileLyricsSource::new(config.console.lyrics_dir));
    let sink = Arc::new(BroadcastSink::default());

    info!(
        "Playing '{}' from {}ms with lyrics from {}",
        song_id,
        config.console.start_position_ms,
        source.dir().display()
    );

    let printer = tokio::spawn(print_sink_events(sink.subscribe()));

    let controller = SyncController::new(
        config.engine,
        clock,
        source,
        sink,
        Some(cancel_token.clone()),
    );
    let handle = controller.handle();
    let task = controller.start();

    handle.song_changed(song_id).await;

    cancel_token.cancelled().await;

    handle.teardown();
    if let Err(e) = task.await {
        error!("Sync controller task failed: {e}");
    }
    printer.abort();
}

/// Initialize tracing with console output
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
