//! Mode state machine driving lyric resolution.
//!
//! A [`SyncController`] runs as a single tokio task that exclusively owns the
//! mode, the loaded [`LineIndex`], the [`ResolverState`] and the
//! [`Scheduler`]. Everything from outside arrives as a message through a
//! [`SyncHandle`], and lyric loads report back through an internal channel,
//! so no state is ever mutated concurrently.

use crate::clock::MediaClock;
use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::gate::ChangeGate;
use crate::index::{LineIndex, ResolverCache};
use crate::scheduler::{Scheduler, TickCadence};
use crate::sink::{deliver, LyricsSink};
use crate::source::LyricsSource;
use crate::track::LyricTrack;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the internal lyric-load completion channel
const LOAD_CHANNEL_CAPACITY: usize = 8;

/// Which update source currently drives the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No active track and no ticking
    Idle,
    /// Pre-resolved triples arrive from outside and are only debounced
    ExternalDriven,
    /// The engine polls the media clock and resolves lines itself
    SelfDriven,
}

/// Per-track mutable resolution state
#[derive(Debug, Default)]
pub struct ResolverState {
    cache: ResolverCache,
    gate: ChangeGate,
    last_position_ms: Option<u64>,
}

impl ResolverState {
    #[must_use]
    pub const fn cached_index(&self) -> Option<usize> {
        self.cache.hint()
    }

    #[must_use]
    pub fn last_emitted_text(&self) -> Option<&str> {
        self.gate.last_emitted()
    }

    #[must_use]
    pub const fn last_position_ms(&self) -> Option<u64> {
        self.last_position_ms
    }

    /// Back to initial values. The gate keeps track of whether the sink is
    /// showing something so a following clear still reaches it.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.gate.forget();
        self.last_position_ms = None;
    }
}

/// Point-in-time view of the controller, for diagnostics and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub mode: SyncMode,
    pub song_id: Option<String>,
    pub track_lines: usize,
    pub cached_index: Option<usize>,
    pub last_emitted_text: Option<String>,
    pub last_position_ms: Option<u64>,
    pub tick_pending: bool,
    pub load_in_flight: bool,
}

/// Identifies one lyric load request; only the latest is ever applied
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadTicket {
    song_id: String,
    request: u64,
}

struct LoadCompletion {
    ticket: LoadTicket,
    result: Result<LyricTrack>,
}

enum Command {
    SongChanged {
        song_id: String,
    },
    ExternalLyrics {
        prev: Option<String>,
        current: Option<String>,
        next: Option<String>,
    },
    SettingsChanged,
    ClockReconnected,
    Stop,
    Mode(oneshot::Sender<SyncMode>),
    Snapshot(oneshot::Sender<EngineSnapshot>),
}

/// Cloneable front door to a running [`SyncController`].
///
/// Every method is a no-op once [`SyncHandle::teardown`] has been called.
#[derive(Clone)]
pub struct SyncHandle {
    command_tx: mpsc::Sender<Command>,
    shutdown: CancellationToken,
}

impl SyncHandle {
    /// A new song started; switch to self-driven resolution for it.
    pub async fn song_changed(&self, song_id: impl Into<String>) {
        self.send(Command::SongChanged {
            song_id: song_id.into(),
        })
        .await;
    }

    /// An externally resolved triple. Dropped while self-driven.
    pub async fn external_lyrics(
        &self,
        prev: Option<String>,
        current: Option<String>,
        next: Option<String>,
    ) {
        self.send(Command::ExternalLyrics {
            prev,
            current,
            next,
        })
        .await;
    }

    /// Presentation settings changed; forwarded to the sink.
    pub async fn settings_changed(&self) {
        self.send(Command::SettingsChanged).await;
    }

    /// The media clock is reachable again; resume polling if it had idled.
    pub async fn clock_reconnected(&self) {
        self.send(Command::ClockReconnected).await;
    }

    /// Playback ended or the overlay was disabled: clear and go idle.
    pub async fn stop(&self) {
        self.send(Command::Stop).await;
    }

    /// Current mode, or `None` once torn down.
    pub async fn mode(&self) -> Option<SyncMode> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Mode(reply)).await;
        rx.await.ok()
    }

    /// Current controller state, or `None` once torn down.
    pub async fn snapshot(&self) -> Option<EngineSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await;
        rx.await.ok()
    }

    /// Stop the controller for good. Pending ticks and loads are cancelled.
    /// Safe to call any number of times.
    ///
    /// This only signals the controller task. Await the [`JoinHandle`] from
    /// [`SyncController::start`] to be sure nothing more reaches the sink.
    ///
    /// [`JoinHandle`]: tokio::task::JoinHandle
    pub fn teardown(&self) {
        self.shutdown.cancel();
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn send(&self, command: Command) {
        if self.shutdown.is_cancelled() {
            return;
        }
        if self.command_tx.send(command).await.is_err() {
            debug!("Sync controller has stopped, command ignored");
        }
    }
}

/// Lyric synchronization engine
pub struct SyncController {
    config: EngineConfig,
    clock: Arc<dyn MediaClock>,
    source: Arc<dyn LyricsSource>,
    sink: Arc<dyn LyricsSink>,
    mode: SyncMode,
    index: LineIndex,
    state: ResolverState,
    scheduler: Scheduler,
    /// Latest requested load; completions for anything else are stale
    requested: Option<LoadTicket>,
    next_request: u64,
    load_token: Option<CancellationToken>,
    command_tx: mpsc::Sender<Command>,
    command_rx: mpsc::Receiver<Command>,
    load_tx: mpsc::Sender<LoadCompletion>,
    load_rx: mpsc::Receiver<LoadCompletion>,
    shutdown: CancellationToken,
}

impl SyncController {
    /// Create a new controller
    ///
    /// # Arguments
    /// * `config` - Engine timing parameters
    /// * `clock` - Media clock polled on every tick
    /// * `source` - Collaborator that loads lyric tracks
    /// * `sink` - Presentation sink receiving display updates
    /// * `cancel_token` - Optional parent token; cancelling it shuts the controller down.
    ///   [`SyncHandle::teardown`] only stops this controller, never the parent.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn MediaClock>,
        source: Arc<dyn LyricsSource>,
        sink: Arc<dyn LyricsSink>,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (load_tx, load_rx) = mpsc::channel(LOAD_CHANNEL_CAPACITY);
        let scheduler = Scheduler::new(&config);
        let index = LineIndex::with_hint_window(LyricTrack::empty(), config.hint_window_ms);

        Self {
            config,
            clock,
            source,
            sink,
            mode: SyncMode::Idle,
            index,
            state: ResolverState::default(),
            scheduler,
            requested: None,
            next_request: 0,
            load_token: None,
            command_tx,
            command_rx,
            load_tx,
            load_rx,
            shutdown: cancel_token.map_or_else(CancellationToken::new, |t| t.child_token()),
        }
    }

    /// Get a handle for sending commands to this controller
    #[must_use]
    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            command_tx: self.command_tx.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Start the controller in a background task
    #[must_use]
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the controller until torn down
    pub async fn run(mut self) {
        info!("Lyric sync controller started");

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                Some(command) = self.command_rx.recv() => self.handle_command(command),
                Some(completion) = self.load_rx.recv() => self.apply_load(completion),
                () = self.scheduler.fired() => self.on_tick(),
            }
        }

        self.release();
        info!("Lyric sync controller shut down");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SongChanged { song_id } => self.begin_song(song_id),
            Command::ExternalLyrics {
                prev,
                current,
                next,
            } => self.apply_external(prev.as_deref(), current.as_deref(), next.as_deref()),
            Command::SettingsChanged => self.sink.on_settings_changed(),
            Command::ClockReconnected => self.resume_polling(),
            Command::Stop => self.stop(),
            Command::Mode(reply) => {
                let _ = reply.send(self.mode);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn set_mode(&mut self, mode: SyncMode) {
        if self.mode != mode {
            info!("Sync mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    fn begin_song(&mut self, song_id: String) {
        if song_id.trim().is_empty() {
            warn!("Ignoring song change with an empty song id");
            return;
        }

        // Nothing from the previous track may fire from here on
        self.scheduler.cancel();
        self.cancel_load();
        self.set_mode(SyncMode::SelfDriven);

        self.replace_track(LyricTrack::empty());
        self.submit(None, None, None);

        let ticket = LoadTicket {
            song_id,
            request: self.next_request,
        };
        self.next_request = self.next_request.wrapping_add(1);
        info!("Song changed to {}, loading lyrics", ticket.song_id);
        self.spawn_load(ticket);
    }

    fn spawn_load(&mut self, ticket: LoadTicket) {
        let token = self.shutdown.child_token();
        let source = Arc::clone(&self.source);
        let load_tx = self.load_tx.clone();
        let settle = self.config.settle_delay();
        let song_id = ticket.song_id.clone();

        self.requested = Some(ticket.clone());
        self.load_token = Some(token.clone());

        tokio::spawn(async move {
            // A panicking source must still produce a completion
            let mut fetch = tokio::spawn(async move {
                // Let the player timeline settle before asking for lyrics
                tokio::time::sleep(settle).await;
                source.fetch_lyrics_for_song(&song_id).await
            });

            tokio::select! {
                () = token.cancelled() => {
                    fetch.abort();
                    debug!("Lyrics load for {} cancelled", ticket.song_id);
                }
                joined = &mut fetch => {
                    let result = joined.unwrap_or_else(|e| {
                        Err(CoreError::fetch_failed(
                            ticket.song_id.as_str(),
                            format!("lyrics task failed: {e}"),
                        ))
                    });
                    let _ = load_tx.send(LoadCompletion { ticket, result }).await;
                }
            }
        });
    }

    fn apply_load(&mut self, completion: LoadCompletion) {
        let LoadCompletion { ticket, result } = completion;

        if self.mode != SyncMode::SelfDriven || self.requested.as_ref() != Some(&ticket) {
            debug!(
                "Discarding stale lyrics load for {} (request {})",
                ticket.song_id, ticket.request
            );
            return;
        }
        self.load_token = None;

        let track = match result {
            Ok(track) => {
                info!(
                    "Loaded lyrics for {} ({} lines, {} timed)",
                    ticket.song_id,
                    track.len(),
                    track.timed_len()
                );
                track
            }
            Err(e) => {
                warn!("Lyrics load for {} failed: {}", ticket.song_id, e);
                LyricTrack::empty()
            }
        };

        self.replace_track(track);
        self.scheduler.arm_initial();
    }

    fn apply_external(&mut self, prev: Option<&str>, current: Option<&str>, next: Option<&str>) {
        if self.mode == SyncMode::SelfDriven {
            debug!("Dropping external lyrics update while self-driven");
            return;
        }

        if current.is_some() {
            self.set_mode(SyncMode::ExternalDriven);
        } else {
            self.set_mode(SyncMode::Idle);
        }
        self.submit(prev, current, next);
    }

    fn resume_polling(&mut self) {
        if self.mode == SyncMode::SelfDriven
            && self.requested.is_some()
            && self.load_token.is_none()
            && !self.scheduler.is_armed()
        {
            info!("Media clock reconnected, resuming lyric polling");
            self.scheduler.arm_initial();
        }
    }

    fn stop(&mut self) {
        self.scheduler.cancel();
        self.cancel_load();
        self.requested = None;
        self.replace_track(LyricTrack::empty());
        self.submit(None, None, None);
        self.set_mode(SyncMode::Idle);
    }

    /// Final cleanup on teardown. Emits nothing.
    fn release(&mut self) {
        self.scheduler.cancel();
        self.cancel_load();
        self.requested = None;
        self.replace_track(LyricTrack::empty());
        self.mode = SyncMode::Idle;
    }

    fn cancel_load(&mut self) {
        if let Some(token) = self.load_token.take() {
            token.cancel();
        }
    }

    /// Swap the active track. The resolver state never outlives its track.
    fn replace_track(&mut self, track: LyricTrack) {
        self.index = LineIndex::with_hint_window(track, self.config.hint_window_ms);
        self.state.reset();
    }

    fn on_tick(&mut self) {
        if self.mode != SyncMode::SelfDriven {
            return;
        }

        let cadence = match self.poll() {
            Ok(cadence) => cadence,
            Err(e) => {
                warn!("Lyric tick failed, retrying at the paused cadence: {}", e);
                self.state.last_position_ms = None;
                TickCadence::Paused
            }
        };

        if cadence == TickCadence::Idle {
            info!("Media clock disconnected, lyric polling suspended");
        }
        self.scheduler.rearm(cadence);
    }

    fn poll(&mut self) -> Result<TickCadence> {
        let cadence = TickCadence::observe(self.clock.as_ref())?;
        match cadence {
            TickCadence::Playing => {
                let position_ms = self.clock.current_position_ms()?;
                self.resolve_and_emit(position_ms);
            }
            TickCadence::Paused | TickCadence::Idle => {
                // A resumed tick starts fresh rather than as a delta
                self.state.last_position_ms = None;
            }
        }
        Ok(cadence)
    }

    fn resolve_and_emit(&mut self, position_ms: u64) {
        if let Some(last) = self.state.last_position_ms {
            if position_ms < last || position_ms - last > self.config.hint_window_ms {
                debug!("Position jumped from {}ms to {}ms", last, position_ms);
            }
        }

        let (resolved, cache) = self.state.cache.resolve(&self.index, position_ms);
        self.state.cache = cache;
        self.state.last_position_ms = Some(position_ms);

        let (prev, current, next) = resolved.map_or((None, None, None), |i| {
            self.index.track().neighborhood(i)
        });
        if let Some(emission) = self.state.gate.submit(prev, current, next) {
            debug!("Line changed at {}ms: {:?}", position_ms, current);
            deliver(self.sink.as_ref(), &emission);
        }
    }

    fn submit(&mut self, prev: Option<&str>, current: Option<&str>, next: Option<&str>) {
        if let Some(emission) = self.state.gate.submit(prev, current, next) {
            deliver(self.sink.as_ref(), &emission);
        }
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            mode: self.mode,
            song_id: self.requested.as_ref().map(|t| t.song_id.clone()),
            track_lines: self.index.track().len(),
            cached_index: self.state.cached_index(),
            last_emitted_text: self.state.last_emitted_text().map(str::to_string),
            last_position_ms: self.state.last_position_ms(),
            tick_pending: self.scheduler.is_armed(),
            load_in_flight: self.load_token.is_some(),
        }
    }
}
