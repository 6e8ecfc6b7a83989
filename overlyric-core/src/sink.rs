//! Presentation sink interface.

use crate::gate::Emission;
use tokio::sync::broadcast;

/// Receiver of display updates. The sink owns rendering, animation and
/// visibility; the engine only tells it what changed.
pub trait LyricsSink: Send + Sync {
    /// The current line changed
    fn on_lyrics_changed(&self, prev: Option<&str>, current: &str, next: Option<&str>);

    /// Nothing should be displayed
    fn on_lyrics_cleared(&self);

    /// Presentation preferences changed; the engine state is untouched
    fn on_settings_changed(&self) {}
}

/// Hand a gate emission to a sink.
pub fn deliver(sink: &dyn LyricsSink, emission: &Emission) {
    match emission {
        Emission::Changed {
            prev,
            current,
            next,
        } => sink.on_lyrics_changed(prev.as_deref(), current, next.as_deref()),
        Emission::Cleared => sink.on_lyrics_cleared(),
    }
}

/// Events published by [`BroadcastSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A new current line should be shown
    LyricsChanged {
        prev: Option<String>,
        current: String,
        next: Option<String>,
    },
    /// The display should be hidden
    LyricsCleared,
    /// Presentation settings should be reloaded
    SettingsChanged,
}

/// Sink that republishes every callback on a broadcast channel
pub struct BroadcastSink {
    event_tx: broadcast::Sender<SinkEvent>,
}

impl BroadcastSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self { event_tx }
    }

    /// Subscribe to sink events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SinkEvent> {
        self.event_tx.subscribe()
    }

    fn publish(&self, event: SinkEvent) {
        // No subscribers is not an error
        let _ = self.event_tx.send(event);
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl LyricsSink for BroadcastSink {
    fn on_lyrics_changed(&self, prev: Option<&str>, current: &str, next: Option<&str>) {
        self.publish(SinkEvent::LyricsChanged {
            prev: prev.map(str::to_string),
            current: current.to_string(),
            next: next.map(str::to_string),
        });
    }

    fn on_lyrics_cleared(&self) {
        self.publish(SinkEvent::LyricsCleared);
    }

    fn on_settings_changed(&self) {
        self.publish(SinkEvent::SettingsChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_sink_publishes_emissions() {
        let sink = BroadcastSink::default();
        let mut rx = sink.subscribe();

        deliver(
            &sink,
            &Emission::Changed {
                prev: None,
                current: "a".to_string(),
                next: Some("b".to_string()),
            },
        );
        deliver(&sink, &Emission::Cleared);
        sink.on_settings_changed();

        assert_eq!(
            rx.try_recv().unwrap(),
            SinkEvent::LyricsChanged {
                prev: None,
                current: "a".to_string(),
                next: Some("b".to_string()),
            }
        );
        assert_eq!(rx.try_recv().unwrap(), SinkEvent::LyricsCleared);
        assert_eq!(rx.try_recv().unwrap(), SinkEvent::SettingsChanged);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_sink_without_subscribers() {
        let sink = BroadcastSink::new(0);
        sink.on_lyrics_changed(None, "a", None);
        sink.on_lyrics_cleared();
    }
}
