use overlyric_core::SinkEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::info;

const LOG_TARGET: &str = "overlyric::render";

/// Placeholder printed for a missing neighbouring line
const EMPTY_LINE: &str = "-";

/// Print sink events to stdout until the channel closes.
pub async fn print_sink_events(mut rx: broadcast::Receiver<SinkEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => println!("{}", format_event(&event)),
            Err(RecvError::Closed) => {
                info!(target: LOG_TARGET, "Sink channel closed");
                break;
            }
            Err(RecvError::Lagged(n)) => {
                info!(target: LOG_TARGET, "Missed {} sink events", n);
            }
        }
    }
}

fn format_event(event: &SinkEvent) -> String {
    match event {
        SinkEvent::LyricsChanged {
            prev,
            current,
            next,
        } => format!(
            "  {}\n> {current}\n  {}",
            prev.as_deref().unwrap_or(EMPTY_LINE),
            next.as_deref().unwrap_or(EMPTY_LINE),
        ),
        SinkEvent::LyricsCleared => "(cleared)".to_string(),
        SinkEvent::SettingsChanged => "(settings changed)".to_string(),
    }
}
