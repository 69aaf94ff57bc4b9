//! Player Engine - Main Entry Point
//!
//! The PlayerEngine owns the player thread and gives the UI a plain
//! method-call API. Commands cross to the player thread over a bounded
//! channel; events come back over an unbounded one.
//!
//! # Architecture
//!
//! ```text
//! UI thread:      PlayerEngine ──commands──▶ ┐
//!                              ◀──events──── │ crossbeam-channel
//!                                            ▼
//! Player thread:  Player (state machine) ── MediaBackend ── AudioGraph
//! ```
//!
//! The player thread wakes on every command and at least every 16ms to
//! advance the clock-driven behavior (ramps, cache polls, buffering
//! deadline).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{info, warn};

use rewind_platform::MediaBackend;

use crate::analytics::{AnalyticsSink, LogSink};
use crate::config::PlayerConfig;
use crate::equalizer::EqualizerSettings;
use crate::error::{PlayerError, PlayerResult};
use crate::message::{Command, Event};
use crate::player::Player;
use crate::registry::StreamRegistry;
use crate::store::JsonFileStore;

/// Wake interval for the player thread when no commands arrive
const IDLE_TICK: Duration = Duration::from_millis(16);

/// The main player controller
///
/// This struct lives on the UI thread and communicates with the player
/// thread via channels.
pub struct PlayerEngine {
    command_sender: Sender<Command>,
    event_receiver: Receiver<Event>,
    player_thread: Option<JoinHandle<()>>,
    shutdown_flag: Arc<AtomicBool>,
}

impl PlayerEngine {
    /// Create an engine with default configuration and on-disk stores
    pub fn new(backend: Box<dyn MediaBackend>) -> PlayerResult<Self> {
        Self::with_parts(
            PlayerConfig::default(),
            backend,
            StreamRegistry::new(Box::new(JsonFileStore::open("stations"))),
            EqualizerSettings::new(Box::new(JsonFileStore::open("equalizer"))),
            Box::new(LogSink),
        )
    }

    /// Create an engine from explicit parts (tests use memory stores)
    pub fn with_parts(
        config: PlayerConfig,
        backend: Box<dyn MediaBackend>,
        registry: StreamRegistry,
        equalizer: EqualizerSettings,
        analytics: Box<dyn AnalyticsSink>,
    ) -> PlayerResult<Self> {
        let (command_sender, command_receiver) = bounded::<Command>(32);
        let (event_sender, event_receiver) = unbounded::<Event>();

        let player = Player::new(
            config,
            backend,
            registry,
            equalizer,
            analytics,
            event_sender.clone(),
        )?;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown_flag);

        let player_thread = thread::Builder::new()
            .name("rewind-player".into())
            .spawn(move || {
                Self::player_thread_main(player, command_receiver, event_sender, shutdown_clone);
            })
            .map_err(|e| PlayerError::ConfigError(e.to_string()))?;

        Ok(Self {
            command_sender,
            event_receiver,
            player_thread: Some(player_thread),
            shutdown_flag,
        })
    }

    // ---- Command API ---------------------------------------------------

    pub fn select_stream(&self, id: impl Into<String>) -> PlayerResult<()> {
        self.send_command(Command::SelectStream(id.into()))
    }

    pub fn play(&self) -> PlayerResult<()> {
        self.send_command(Command::Play)
    }

    pub fn pause(&self) -> PlayerResult<()> {
        self.send_command(Command::Pause)
    }

    pub fn resume(&self) -> PlayerResult<()> {
        self.send_command(Command::Resume)
    }

    pub fn stop(&self) -> PlayerResult<()> {
        self.send_command(Command::Stop)
    }

    /// Nudge the time shift by a signed amount in milliseconds
    pub fn adjust_delay(&self, delta_ms: i64) -> PlayerResult<()> {
        self.send_command(Command::AdjustDelay(delta_ms))
    }

    /// Set the time shift from a slider position (0 = max shift)
    pub fn set_delay_position(&self, position_ms: u64) -> PlayerResult<()> {
        self.send_command(Command::SetDelayPosition(position_ms))
    }

    pub fn go_live(&self) -> PlayerResult<()> {
        self.send_command(Command::GoLive)
    }

    pub fn set_volume(&self, volume: f32) -> PlayerResult<()> {
        self.send_command(Command::SetVolume(volume))
    }

    pub fn toggle_mute(&self) -> PlayerResult<()> {
        self.send_command(Command::ToggleMute)
    }

    pub fn set_band_gain(&self, band: usize, gain_db: f32) -> PlayerResult<()> {
        self.send_command(Command::SetBandGain { band, gain_db })
    }

    pub fn reset_equalizer(&self) -> PlayerResult<()> {
        self.send_command(Command::ResetEqualizer)
    }

    pub fn add_custom_stream(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> PlayerResult<()> {
        self.send_command(Command::AddCustomStream {
            name: name.into(),
            url: url.into(),
        })
    }

    pub fn remove_custom_stream(&self, id: impl Into<String>) -> PlayerResult<()> {
        self.send_command(Command::RemoveCustomStream(id.into()))
    }

    /// Request current state (triggers a StateUpdate event)
    pub fn request_state(&self) -> PlayerResult<()> {
        self.send_command(Command::RequestState)
    }

    /// Get next event (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get next event (blocking)
    pub fn wait_event(&self) -> Option<Event> {
        self.event_receiver.recv().ok()
    }

    fn send_command(&self, command: Command) -> PlayerResult<()> {
        self.command_sender
            .send(command)
            .map_err(|_| PlayerError::ChannelSendError)
    }

    // ---- Player thread -------------------------------------------------

    fn player_thread_main(
        mut player: Player,
        command_receiver: Receiver<Command>,
        event_sender: Sender<Event>,
        shutdown_flag: Arc<AtomicBool>,
    ) {
        info!("Player thread started");

        while !shutdown_flag.load(Ordering::SeqCst) {
            match command_receiver.recv_timeout(IDLE_TICK) {
                Ok(Command::Shutdown) => {
                    shutdown_flag.store(true, Ordering::SeqCst);
                }
                Ok(command) => {
                    Self::dispatch(&mut player, command, &event_sender);
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
            player.tick(Instant::now());
        }

        player.stop(Instant::now());
        info!("Player thread exiting");
    }

    fn dispatch(player: &mut Player, command: Command, events: &Sender<Event>) {
        let now = Instant::now();
        let result = match command {
            Command::SelectStream(id) => player.select_stream(&id, now),
            Command::Play => match player.play(now) {
                // These already surfaced a user-facing error event
                Err(PlayerError::StreamUnavailable(_)) | Err(PlayerError::Backend(_)) => Ok(()),
                other => other,
            },
            Command::Pause => {
                player.pause(now);
                Ok(())
            }
            Command::Resume => {
                player.resume(now);
                Ok(())
            }
            Command::Stop => {
                player.stop(now);
                Ok(())
            }
            Command::AdjustDelay(delta_ms) => {
                player.adjust_delay(delta_ms, now);
                Ok(())
            }
            Command::SetDelayPosition(position_ms) => {
                player.set_delay_position(position_ms, now);
                Ok(())
            }
            Command::GoLive => {
                player.go_live();
                Ok(())
            }
            Command::SetVolume(volume) => {
                player.set_volume(volume);
                Ok(())
            }
            Command::ToggleMute => {
                player.toggle_mute();
                Ok(())
            }
            Command::SetBandGain { band, gain_db } => player.set_band_gain(band, gain_db),
            Command::ResetEqualizer => player.reset_equalizer(),
            Command::AddCustomStream { name, url } => player.add_custom_stream(&name, &url),
            Command::RemoveCustomStream(id) => player.remove_custom_stream(&id, now),
            Command::RequestState => {
                let _ = events.send(player.state_snapshot());
                Ok(())
            }
            Command::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            warn!("command failed: {}", e);
            let _ = events.send(Event::error(e));
        }
    }
}

impl Drop for PlayerEngine {
    fn drop(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        let _ = self.command_sender.send(Command::Shutdown);
        if let Some(handle) = self.player_thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NullSink;
    use crate::session::PlaybackPhase;
    use crate::store::MemoryStore;
    use rewind_platform::SimBackend;

    fn engine() -> PlayerEngine {
        PlayerEngine::with_parts(
            PlayerConfig::default(),
            Box::new(SimBackend::new(48_000.0, 180.0)),
            StreamRegistry::new(Box::new(MemoryStore::new())),
            EqualizerSettings::new(Box::new(MemoryStore::new())),
            Box::new(NullSink),
        )
        .unwrap()
    }

    fn wait_for<F: Fn(&Event) -> bool>(engine: &PlayerEngine, pred: F) -> Event {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(event) = engine.poll_event() {
                if pred(&event) {
                    return event;
                }
            } else {
                thread::sleep(Duration::from_millis(1));
            }
        }
        panic!("timed out waiting for event");
    }

    #[test]
    fn test_select_and_state_round_trip() {
        let engine = engine();
        engine.select_stream("cadena-3").unwrap();
        wait_for(&engine, |e| matches!(e, Event::StreamSelected { .. }));

        engine.request_state().unwrap();
        let state = wait_for(&engine, |e| matches!(e, Event::StateUpdate { .. }));
        if let Event::StateUpdate {
            phase, stream_id, ..
        } = state
        {
            assert_eq!(phase, PlaybackPhase::Stopped);
            assert_eq!(stream_id.as_deref(), Some("cadena-3"));
        }
    }

    #[test]
    fn test_play_without_selection_reports_error() {
        let engine = engine();
        engine.play().unwrap();
        wait_for(&engine, |e| matches!(e, Event::Error { .. }));
    }

    #[test]
    fn test_known_error_station_reports_fixed_message() {
        let engine = engine();
        engine.select_stream("gol-y-pop").unwrap();
        engine.play().unwrap();
        let event = wait_for(&engine, |e| matches!(e, Event::Error { .. }));
        if let Event::Error { message } = event {
            assert!(message.contains("Gol & Pop"));
        }
    }

    #[test]
    fn test_custom_stream_commands() {
        let engine = engine();
        engine
            .add_custom_stream("My Radio", "https://radio.example/live")
            .unwrap();
        wait_for(&engine, |e| matches!(e, Event::StreamListChanged));

        engine.remove_custom_stream("my-radio").unwrap();
        wait_for(&engine, |e| matches!(e, Event::StreamListChanged));
    }

    #[test]
    fn test_shutdown_on_drop() {
        let engine = engine();
        drop(engine);
        // Drop joins the thread; reaching here without hanging is the test
    }
}
