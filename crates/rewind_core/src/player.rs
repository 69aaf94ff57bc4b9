//! Player Session Core
//!
//! Owns the whole playback state: the media backend, the time-shift
//! controller, the cache tracker, the station registry and the volume
//! state. All time-dependent behavior runs through [`Player::tick`]
//! with an explicit `Instant`, so tests drive the clock instead of
//! sleeping.
//!
//! # Lifecycle
//!
//! ```text
//! Stopped --play--> Connecting --element playing--> Buffering
//!     ^                                                 |
//!     |                               window elapses,   |
//!     +--stop/error--- Playing <----- fade in ----------+
//!                      |    ^
//!                   pause  resume
//!                      v    |
//!                      Paused (shift keeps growing)
//! ```
//!
//! While buffering the output is silent and the delay ramps from zero
//! to the target; the listener hears the fade-in once a full target
//! window is cached.

use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use rewind_platform::{MediaBackend, MediaEvent};

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::cache::CacheTracker;
use crate::config::PlayerConfig;
use crate::delay::DelayController;
use crate::equalizer::EqualizerSettings;
use crate::error::{PlayerError, PlayerResult};
use crate::message::Event;
use crate::registry::StreamRegistry;
use crate::session::{PlaybackPhase, PlaybackSession};
use crate::volume::VolumeState;

/// The player core
///
/// Single-threaded: the engine thread owns it and feeds it commands
/// and clock ticks.
pub struct Player {
    config: PlayerConfig,
    backend: Box<dyn MediaBackend>,
    registry: StreamRegistry,
    equalizer: EqualizerSettings,
    volume: VolumeState,
    delay: DelayController,
    cache: CacheTracker,
    session: PlaybackSession,
    analytics: Box<dyn AnalyticsSink>,
    events: Sender<Event>,

    selected: Option<String>,

    last_ramp_tick: Option<Instant>,
    last_cache_poll: Option<Instant>,
    last_progress: Option<Instant>,
    buffering_deadline: Option<Instant>,
    /// Time left in the buffering window when a pause interrupted it
    buffering_remaining: Option<Duration>,
    /// Stale element events are dropped until this passes
    stop_cooldown_until: Option<Instant>,
}

impl Player {
    pub fn new(
        config: PlayerConfig,
        backend: Box<dyn MediaBackend>,
        registry: StreamRegistry,
        equalizer: EqualizerSettings,
        analytics: Box<dyn AnalyticsSink>,
        events: Sender<Event>,
    ) -> PlayerResult<Self> {
        config.validate().map_err(PlayerError::ConfigError)?;

        let delay = DelayController::new(config.target_delay_ms, config.max_delay_ms);
        let cache = CacheTracker::new(config.max_delay_ms);

        Ok(Self {
            config,
            backend,
            registry,
            equalizer,
            volume: VolumeState::default(),
            delay,
            cache,
            session: PlaybackSession::new(),
            analytics,
            events,
            selected: None,
            last_ramp_tick: None,
            last_cache_poll: None,
            last_progress: None,
            buffering_deadline: None,
            buffering_remaining: None,
            stop_cooldown_until: None,
        })
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.session.phase()
    }

    pub fn current_delay_ms(&self) -> u64 {
        self.delay.current_ms()
    }

    pub fn available_cache_ms(&self) -> u64 {
        self.cache.available_ms()
    }

    pub fn selected_stream(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    // ---- Station selection and playback --------------------------------

    /// Select a station. Stops playback if another station is active.
    pub fn select_stream(&mut self, id: &str, now: Instant) -> PlayerResult<()> {
        let descriptor = self
            .registry
            .get(id)
            .ok_or_else(|| PlayerError::StreamNotFound(id.to_string()))?;
        let known_error = descriptor.known_error.clone();

        if self.session.is_active() {
            self.stop(now);
        }

        self.selected = Some(id.to_string());
        // A fresh selection starts with a clean slate; only a fixed
        // known error carries over.
        match &known_error {
            Some(message) => self.session.set_error(message.clone()),
            None => self.session.clear_error(),
        }
        self.analytics.record(AnalyticsEvent::StreamSelected {
            stream_id: id.to_string(),
        });
        self.emit(Event::StreamSelected {
            id: id.to_string(),
            known_error: known_error.clone(),
        });

        // Surface the station's saved EQ curve right away
        let gains = self.equalizer.gains_for(id);
        self.emit(Event::EqualizerChanged {
            gains: gains.to_vec(),
        });

        if let Some(message) = known_error {
            self.emit(Event::Error { message });
        }
        Ok(())
    }

    /// Connect the selected station and enter the buffering window
    pub fn play(&mut self, now: Instant) -> PlayerResult<()> {
        let id = self
            .selected
            .clone()
            .ok_or(PlayerError::NoStreamSelected)?;
        let descriptor = self
            .registry
            .get(&id)
            .ok_or_else(|| PlayerError::StreamNotFound(id.clone()))?;

        if let Some(message) = &descriptor.known_error {
            let message = message.clone();
            self.session.set_error(message.clone());
            self.analytics.record(AnalyticsEvent::StreamErrored {
                stream_id: id,
                message: message.clone(),
            });
            self.emit(Event::Error {
                message: message.clone(),
            });
            return Err(PlayerError::StreamUnavailable(message));
        }

        if !self.session.begin_connect() {
            debug!("play ignored, element already active");
            return Ok(());
        }
        // Retrying after a failure starts clean
        self.session.clear_error();

        let url = descriptor.url.clone();
        info!(stream = %id, "connecting");

        if let Err(e) = self.backend.open(&url) {
            self.session.stop();
            self.session.set_error(PlayerError::ConnectionFailed.to_string());
            // Anything the failed element still emits is stale
            self.stop_cooldown_until =
                Some(now + Duration::from_millis(self.config.stop_cooldown_ms));
            self.emit(Event::error(PlayerError::ConnectionFailed));
            self.set_phase(PlaybackPhase::Stopped);
            return Err(e.into());
        }

        // Apply the station's saved EQ and the current volume state
        let gains = self.equalizer.gains_for(&id);
        self.backend.set_band_gains(&gains)?;
        self.backend.set_element_volume(self.volume.volume());
        self.backend.set_element_muted(self.volume.is_muted());
        // Silent until the buffering window completes
        self.backend.set_gain(0.0);

        self.set_phase(PlaybackPhase::Connecting);
        Ok(())
    }

    /// Pause. The time shift keeps growing, the cache count freezes.
    pub fn pause(&mut self, now: Instant) {
        if !self.session.pause() {
            return;
        }

        self.cache.pause(now);
        // A paused buffering window resumes where it left off
        if let Some(deadline) = self.buffering_deadline.take() {
            self.buffering_remaining = Some(deadline.saturating_duration_since(now));
        }

        if self.backend.is_enhanced() {
            self.backend.set_gain(0.0);
        } else {
            // No graph to silence; mute the element itself
            self.backend.set_element_muted(true);
        }
        self.last_ramp_tick = Some(now);
        self.analytics.record(AnalyticsEvent::PlaybackPaused);
        self.set_phase(PlaybackPhase::Paused);
    }

    /// Resume from pause at the accumulated delay
    pub fn resume(&mut self, now: Instant) {
        let back_to = match self.session.resume() {
            Some(phase) => phase,
            None => return,
        };

        // The shift grew during the pause; the cache has at least that
        // much audio by construction, so reconcile the count upward.
        self.cache.ensure_at_least(self.delay.current_ms());
        self.cache.resume(now);
        self.apply_delay();
        self.last_ramp_tick = Some(now);

        match back_to {
            PlaybackPhase::Buffering => {
                let remaining = self
                    .buffering_remaining
                    .take()
                    .unwrap_or(Duration::from_millis(self.config.buffering_window_ms));
                self.buffering_deadline = Some(now + remaining);
                // Still silent until the window completes
            }
            _ if self.backend.is_enhanced() => {
                self.backend
                    .set_gain_target(self.volume.effective(), self.config.fade_in_smoothing);
            }
            _ => {
                self.backend.set_element_muted(self.volume.is_muted());
            }
        }
        self.analytics.record(AnalyticsEvent::PlaybackResumed);
        self.set_phase(back_to);
        self.emit_delay();
    }

    /// Tear down playback and reset the time shift
    pub fn stop(&mut self, now: Instant) {
        if !self.session.stop() {
            return;
        }

        self.backend.close();
        self.cache.stop();
        self.delay.reset();
        self.buffering_deadline = None;
        self.buffering_remaining = None;
        self.last_ramp_tick = None;
        self.last_cache_poll = None;
        self.last_progress = None;
        self.stop_cooldown_until =
            Some(now + Duration::from_millis(self.config.stop_cooldown_ms));

        if let Some(id) = &self.selected {
            self.analytics.record(AnalyticsEvent::PlaybackStopped {
                stream_id: id.clone(),
            });
        }

        // Stopping wipes transient errors; a station's fixed known
        // error sticks to it.
        let fixed = self
            .selected
            .as_deref()
            .and_then(|id| self.registry.get(id))
            .and_then(|d| d.known_error.clone());
        match fixed {
            Some(message) => self.session.set_error(message),
            None => self.session.clear_error(),
        }

        self.set_phase(PlaybackPhase::Stopped);
        self.emit_delay();
        info!("stopped");
    }

    // ---- Time shift ----------------------------------------------------

    /// Nudge the delay by a signed amount
    pub fn adjust_delay(&mut self, delta_ms: i64, now: Instant) {
        if !self.session.is_active() || !self.delay_capable() {
            return;
        }

        // The pause ramp can outgrow the frozen cache count; the stream
        // kept filling the line, so raise it before clamping.
        self.cache.ensure_at_least(self.delay.current_ms());
        let available = self.cache.poll(now);
        let requested_ms = if delta_ms >= 0 {
            self.delay.current_ms().saturating_add(delta_ms as u64)
        } else {
            self.delay.current_ms().saturating_sub(delta_ms.unsigned_abs())
        };
        let outcome = self.delay.adjust(delta_ms, available);
        if outcome.insufficient_cache {
            self.emit(Event::InsufficientCache {
                requested_ms,
                available_ms: available,
            });
        }
        self.apply_delay();
        self.emit_delay();
        self.analytics.record(AnalyticsEvent::DelayAdjusted {
            current_ms: outcome.current_ms,
        });
    }

    /// Set the delay from a slider position (0 = max shift)
    pub fn set_delay_position(&mut self, position_ms: u64, now: Instant) {
        if !self.session.is_active() || !self.delay_capable() {
            return;
        }

        self.cache.ensure_at_least(self.delay.current_ms());
        let available = self.cache.poll(now);
        let outcome = self.delay.set_from_position(position_ms, available);
        if outcome.insufficient_cache {
            self.emit(Event::InsufficientCache {
                requested_ms: self.config.max_delay_ms.saturating_sub(position_ms),
                available_ms: available,
            });
        }
        self.apply_delay();
        self.emit_delay();
    }

    /// Jump back to the live edge
    pub fn go_live(&mut self) {
        if !self.session.is_active() || !self.delay_capable() {
            return;
        }
        self.delay.go_live();
        self.apply_delay();
        self.emit_delay();
        self.analytics.record(AnalyticsEvent::WentLive);
    }

    // ---- Volume and EQ -------------------------------------------------

    pub fn set_volume(&mut self, volume: f32) {
        self.volume.set_volume(volume);
        self.sync_volume_to_backend();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.sync_volume_to_backend();
    }

    pub fn set_band_gain(&mut self, band: usize, gain_db: f32) -> PlayerResult<()> {
        let id = self
            .selected
            .clone()
            .ok_or(PlayerError::NoStreamSelected)?;
        let gains = self.equalizer.set_band(&id, band, gain_db)?;
        if self.session.is_active() {
            self.backend.set_band_gains(&gains)?;
        }
        self.emit(Event::EqualizerChanged {
            gains: gains.to_vec(),
        });
        Ok(())
    }

    pub fn reset_equalizer(&mut self) -> PlayerResult<()> {
        let id = self
            .selected
            .clone()
            .ok_or(PlayerError::NoStreamSelected)?;
        let gains = self.equalizer.reset(&id)?;
        if self.session.is_active() {
            self.backend.set_band_gains(&gains)?;
        }
        self.emit(Event::EqualizerChanged {
            gains: gains.to_vec(),
        });
        Ok(())
    }

    // ---- Station list --------------------------------------------------

    pub fn add_custom_stream(&mut self, name: &str, url: &str) -> PlayerResult<()> {
        self.registry.add_custom(name, url)?;
        self.analytics.record(AnalyticsEvent::CustomStationAdded);
        self.emit(Event::StreamListChanged);
        Ok(())
    }

    pub fn remove_custom_stream(&mut self, id: &str, now: Instant) -> PlayerResult<()> {
        self.registry.remove_custom(id)?;
        if self.selected.as_deref() == Some(id) {
            if self.session.is_active() {
                self.stop(now);
            }
            self.selected = None;
        }
        self.emit(Event::StreamListChanged);
        Ok(())
    }

    // ---- Clock ---------------------------------------------------------

    /// Advance all time-driven behavior to `now`
    pub fn tick(&mut self, now: Instant) {
        self.drain_media_events(now);

        if let Some(until) = self.stop_cooldown_until {
            if now >= until {
                self.stop_cooldown_until = None;
            }
        }

        match self.session.phase() {
            PlaybackPhase::Buffering => {
                self.run_buffering_ramp(now);
                self.run_cache_polls(now);
                self.emit_buffering_progress(now);
                self.maybe_finish_buffering(now);
            }
            PlaybackPhase::Playing => {
                self.run_cache_polls(now);
            }
            PlaybackPhase::Paused => {
                if self.delay_capable() {
                    self.run_pause_ramp(now);
                }
            }
            PlaybackPhase::Stopped | PlaybackPhase::Connecting => {}
        }
    }

    pub fn state_snapshot(&self) -> Event {
        Event::StateUpdate {
            phase: self.session.phase(),
            stream_id: self.selected.clone(),
            current_delay_ms: self.delay.current_ms(),
            available_cache_ms: self.cache.available_ms(),
            volume: self.volume.volume(),
            muted: self.volume.is_muted(),
            enhanced: self.backend.is_enhanced(),
            last_error: self.session.last_error().map(String::from),
        }
    }

    // ---- Internals -----------------------------------------------------

    fn drain_media_events(&mut self, now: Instant) {
        while let Some(event) = self.backend.poll_event() {
            self.handle_media_event(event, now);
        }
    }

    fn handle_media_event(&mut self, event: MediaEvent, now: Instant) {
        // Events raised by an element we are tearing down are stale
        if self.stop_cooldown_until.is_some_and(|until| now < until) {
            if matches!(event, MediaEvent::Errored(_) | MediaEvent::Ended) {
                debug!(?event, "dropping stale element event");
                return;
            }
        }

        match event {
            MediaEvent::Playing => {
                if self.session.begin_buffering() {
                    if self.delay_capable() {
                        self.begin_buffering_window(now);
                    } else {
                        self.begin_basic_playback();
                    }
                }
            }
            MediaEvent::Waiting => {
                debug!("element waiting for data");
            }
            MediaEvent::Errored(detail) => {
                warn!(detail, "element error");
                if let Some(id) = &self.selected {
                    self.analytics.record(AnalyticsEvent::StreamErrored {
                        stream_id: id.clone(),
                        message: detail,
                    });
                }
                self.emit(Event::error(PlayerError::ConnectionFailed));
                self.stop(now);
                self.session.set_error(PlayerError::ConnectionFailed.to_string());
            }
            MediaEvent::Ended => {
                info!("stream ended");
                self.stop(now);
            }
        }
    }

    fn begin_buffering_window(&mut self, now: Instant) {
        self.cache.start(now);
        self.delay.reset();
        self.apply_delay();

        self.buffering_deadline =
            Some(now + Duration::from_millis(self.config.buffering_window_ms));
        self.last_ramp_tick = Some(now);
        self.last_cache_poll = Some(now);
        self.last_progress = Some(now);

        if let Some(id) = &self.selected {
            self.analytics.record(AnalyticsEvent::PlaybackStarted {
                stream_id: id.clone(),
            });
        }
        self.set_phase(PlaybackPhase::Buffering);
    }

    /// Basic-mode start: no graph means no time shift and no fade-in,
    /// so the element plays the live edge right away.
    fn begin_basic_playback(&mut self) {
        if !self.session.begin_playing() {
            return;
        }
        info!("enhanced graph unavailable, playing live without time shift");
        self.backend.set_element_muted(self.volume.is_muted());

        if let Some(id) = &self.selected {
            self.analytics.record(AnalyticsEvent::PlaybackStarted {
                stream_id: id.clone(),
            });
        }
        self.set_phase(PlaybackPhase::Playing);
    }

    /// Time-shift controls only work when the enhanced graph exists
    fn delay_capable(&self) -> bool {
        self.backend.is_enhanced()
    }

    fn run_buffering_ramp(&mut self, now: Instant) {
        let tick = Duration::from_millis(self.config.ramp_tick_ms);
        let before = self.delay.current_ms();
        while let Some(last) = self.last_ramp_tick {
            if now.saturating_duration_since(last) < tick {
                break;
            }
            self.last_ramp_tick = Some(last + tick);
            self.delay.buffering_ramp_tick(self.config.ramp_step_ms);
        }
        if self.delay.current_ms() != before {
            self.apply_delay();
            self.emit_delay();
        }
    }

    fn run_pause_ramp(&mut self, now: Instant) {
        let tick = Duration::from_millis(self.config.ramp_tick_ms);
        let before = self.delay.current_ms();
        while let Some(last) = self.last_ramp_tick {
            if now.saturating_duration_since(last) < tick {
                break;
            }
            self.last_ramp_tick = Some(last + tick);
            self.delay.pause_ramp_tick(self.config.ramp_step_ms);
        }
        if self.delay.current_ms() != before {
            self.emit_delay();
        }
    }

    fn run_cache_polls(&mut self, now: Instant) {
        let poll = Duration::from_millis(self.config.cache_poll_ms);
        let due = match self.last_cache_poll {
            Some(last) => now.saturating_duration_since(last) >= poll,
            None => false,
        };
        if due {
            self.last_cache_poll = Some(now);
            let available = self.cache.poll(now);
            self.emit(Event::CacheUpdated {
                available_ms: available,
            });
            if self.delay.clamp_to_available(available) {
                self.apply_delay();
                self.emit_delay();
            }
        }
    }

    fn emit_buffering_progress(&mut self, now: Instant) {
        let tick = Duration::from_millis(self.config.progress_tick_ms);
        let deadline = match self.buffering_deadline {
            Some(d) => d,
            None => return,
        };
        let due = match self.last_progress {
            Some(last) => now.saturating_duration_since(last) >= tick,
            None => false,
        };
        if due {
            self.last_progress = Some(now);
            let total = self.config.buffering_window_ms;
            let remaining = deadline.saturating_duration_since(now).as_millis() as u64;
            self.emit(Event::BufferingProgress {
                elapsed_ms: total.saturating_sub(remaining),
                total_ms: total,
            });
        }
    }

    fn maybe_finish_buffering(&mut self, now: Instant) {
        let deadline = match self.buffering_deadline {
            Some(d) => d,
            None => return,
        };
        if now < deadline {
            return;
        }
        if !self.session.begin_playing() {
            return;
        }

        self.buffering_deadline = None;
        // The ramp lands on the target by construction; pin it anyway
        // so rounding in tick scheduling can never leave it short.
        while !self.delay.buffering_ramp_tick(self.config.ramp_step_ms) {}
        self.cache.ensure_at_least(self.delay.current_ms());
        self.apply_delay();
        self.emit_delay();

        self.backend
            .set_gain_target(self.volume.effective(), self.config.fade_in_smoothing);
        self.set_phase(PlaybackPhase::Playing);
        info!(delay_ms = self.delay.current_ms(), "buffering complete");
    }

    fn sync_volume_to_backend(&mut self) {
        self.backend.set_element_volume(self.volume.volume());
        // In basic mode a pause is silenced by the element mute, so a
        // volume change while paused must leave the mute in place.
        let muted = self.volume.is_muted()
            || (self.session.is_paused() && !self.backend.is_enhanced());
        self.backend.set_element_muted(muted);
        // The graph gain only carries the audible level while playing;
        // buffering and pause keep the output silent.
        if self.session.phase() == PlaybackPhase::Playing {
            self.backend.set_gain(self.volume.effective());
        }
        self.emit(Event::VolumeChanged {
            volume: self.volume.volume(),
            muted: self.volume.is_muted(),
        });
    }

    fn apply_delay(&mut self) {
        let seconds = self.delay.current_ms() as f32 / 1000.0;
        if let Err(e) = self
            .backend
            .set_delay(seconds, self.config.delay_smoothing)
        {
            warn!("failed to apply delay: {}", e);
        }
    }

    fn set_phase(&mut self, phase: PlaybackPhase) {
        self.emit(Event::PhaseChanged { phase });
    }

    fn emit_delay(&mut self) {
        self.emit(Event::DelayChanged {
            current_ms: self.delay.current_ms(),
            target_ms: self.delay.target_ms(),
        });
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NullSink;
    use crate::registry::StreamRegistry;
    use crate::store::MemoryStore;
    use crossbeam_channel::{unbounded, Receiver};
    use rewind_platform::SimBackend;

    use std::sync::{Arc, Mutex};

    /// Sim backend behind a shared handle so tests can script events
    /// after handing the backend to the player.
    #[derive(Clone)]
    struct SharedSim(Arc<Mutex<SimBackend>>);

    impl SharedSim {
        fn new(sample_rate: f32, max_delay_seconds: f32) -> Self {
            Self(Arc::new(Mutex::new(SimBackend::new(
                sample_rate,
                max_delay_seconds,
            ))))
        }

        fn push_event(&self, event: MediaEvent) {
            self.0.lock().unwrap().push_event(event);
        }

        fn failing_graph(sample_rate: f32, max_delay_seconds: f32) -> Self {
            Self(Arc::new(Mutex::new(
                SimBackend::new(sample_rate, max_delay_seconds).with_failing_graph(),
            )))
        }

        fn element_muted(&self) -> bool {
            self.0.lock().unwrap().element_muted
        }
    }

    impl MediaBackend for SharedSim {
        fn name(&self) -> &'static str {
            "SharedSim"
        }
        fn open(&mut self, url: &str) -> Result<(), rewind_platform::BackendError> {
            self.0.lock().unwrap().open(url)
        }
        fn close(&mut self) {
            self.0.lock().unwrap().close();
        }
        fn poll_event(&mut self) -> Option<MediaEvent> {
            self.0.lock().unwrap().poll_event()
        }
        fn is_enhanced(&self) -> bool {
            self.0.lock().unwrap().is_enhanced()
        }
        fn set_delay(
            &mut self,
            seconds: f32,
            smoothing: f32,
        ) -> Result<(), rewind_platform::BackendError> {
            self.0.lock().unwrap().set_delay(seconds, smoothing)
        }
        fn set_gain_target(&mut self, target: f32, time_constant: f32) {
            self.0.lock().unwrap().set_gain_target(target, time_constant);
        }
        fn set_gain(&mut self, value: f32) {
            self.0.lock().unwrap().set_gain(value);
        }
        fn set_band_gain(
            &mut self,
            band: usize,
            gain_db: f32,
        ) -> Result<(), rewind_platform::BackendError> {
            self.0.lock().unwrap().set_band_gain(band, gain_db)
        }
        fn set_band_gains(
            &mut self,
            gains_db: &[f32],
        ) -> Result<(), rewind_platform::BackendError> {
            self.0.lock().unwrap().set_band_gains(gains_db)
        }
        fn set_element_volume(&mut self, volume: f32) {
            self.0.lock().unwrap().set_element_volume(volume);
        }
        fn set_element_muted(&mut self, muted: bool) {
            self.0.lock().unwrap().set_element_muted(muted);
        }
    }

    fn fast_config() -> PlayerConfig {
        PlayerConfig {
            target_delay_ms: 1_000,
            max_delay_ms: 5_000,
            buffering_window_ms: 1_000,
            ..Default::default()
        }
    }

    fn player_with(config: PlayerConfig) -> (Player, Receiver<Event>, SharedSim) {
        let (tx, rx) = unbounded();
        let backend = SharedSim::new(config.sample_rate, config.max_delay_seconds());
        let player = Player::new(
            config,
            Box::new(backend.clone()),
            StreamRegistry::new(Box::new(MemoryStore::new())),
            EqualizerSettings::new(Box::new(MemoryStore::new())),
            Box::new(NullSink),
            tx,
        )
        .unwrap();
        (player, rx, backend)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Drive the player to Buffering: select, play, deliver the
    /// element's playing event.
    fn start_buffering(player: &mut Player, sim: &SharedSim, t0: Instant) {
        player.select_stream("cadena-3", t0).unwrap();
        player.play(t0).unwrap();
        sim.push_event(MediaEvent::Playing);
        player.tick(t0);
        assert_eq!(player.phase(), PlaybackPhase::Buffering);
    }

    /// Run ticks until past the buffering window
    fn finish_buffering(player: &mut Player, t0: Instant, window_ms: u64) -> Instant {
        let mut t = t0;
        for _ in 0..=(window_ms / 100) {
            t += ms(100);
            player.tick(t);
        }
        assert_eq!(player.phase(), PlaybackPhase::Playing);
        t
    }

    fn drain(rx: &Receiver<Event>) -> Vec<Event> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_play_without_selection_fails() {
        let (mut player, _rx, _sim) = player_with(fast_config());
        assert!(matches!(
            player.play(Instant::now()),
            Err(PlayerError::NoStreamSelected)
        ));
    }

    #[test]
    fn test_known_error_station_refuses_playback() {
        let (mut player, rx, _sim) = player_with(fast_config());
        let t0 = Instant::now();
        player.select_stream("lv2", t0).unwrap();
        assert!(matches!(
            player.play(t0),
            Err(PlayerError::StreamUnavailable(_))
        ));
        assert_eq!(player.phase(), PlaybackPhase::Stopped);

        let errors: Vec<_> = drain(&rx)
            .into_iter()
            .filter(|e| matches!(e, Event::Error { .. }))
            .collect();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_buffering_ramp_reaches_target_then_plays() {
        let (mut player, rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);

        finish_buffering(&mut player, t0, 1_000);
        assert_eq!(player.current_delay_ms(), 1_000);

        let phases: Vec<_> = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::PhaseChanged { phase } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                PlaybackPhase::Connecting,
                PlaybackPhase::Buffering,
                PlaybackPhase::Playing
            ]
        );
    }

    #[test]
    fn test_delay_never_exceeds_cache() {
        let (mut player, rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let t = finish_buffering(&mut player, t0, 1_000);

        // Barely any cache yet; a big jump back must clamp
        player.adjust_delay(60_000, t);
        assert!(player.current_delay_ms() <= player.available_cache_ms());

        let notices: Vec<_> = drain(&rx)
            .into_iter()
            .filter(|e| matches!(e, Event::InsufficientCache { .. }))
            .collect();
        assert!(!notices.is_empty());
    }

    #[test]
    fn test_go_live() {
        let (mut player, _rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let _ = finish_buffering(&mut player, t0, 1_000);

        player.go_live();
        assert_eq!(player.current_delay_ms(), 0);
    }

    #[test]
    fn test_pause_grows_delay_and_freezes_cache() {
        let mut config = fast_config();
        config.target_delay_ms = 2_000;
        config.max_delay_ms = 7_000;
        let (mut player, _rx, sim) = player_with(config);

        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let mut t = t0;
        for _ in 0..25 {
            t += ms(100);
            player.tick(t);
        }
        assert_eq!(player.phase(), PlaybackPhase::Playing);
        assert_eq!(player.current_delay_ms(), 2_000);

        let cache_at_pause = player.available_cache_ms();
        player.pause(t);
        assert_eq!(player.phase(), PlaybackPhase::Paused);

        // 5 seconds of pause: 2000 + 5000 = 7000, capped at max
        for _ in 0..50 {
            t += ms(100);
            player.tick(t);
        }
        assert_eq!(player.current_delay_ms(), 7_000);
        assert_eq!(player.available_cache_ms(), cache_at_pause);

        // Further pausing cannot push past the maximum
        for _ in 0..30 {
            t += ms(100);
            player.tick(t);
        }
        assert_eq!(player.current_delay_ms(), 7_000);
    }

    #[test]
    fn test_resume_reconciles_cache_with_grown_delay() {
        let mut config = fast_config();
        config.target_delay_ms = 2_000;
        config.max_delay_ms = 7_000;
        let (mut player, _rx, sim) = player_with(config);

        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let mut t = t0;
        for _ in 0..25 {
            t += ms(100);
            player.tick(t);
        }
        player.pause(t);
        for _ in 0..30 {
            t += ms(100);
            player.tick(t);
        }
        let grown = player.current_delay_ms();
        assert!(grown > 2_000);

        player.resume(t);
        assert_eq!(player.phase(), PlaybackPhase::Playing);
        assert!(player.available_cache_ms() >= grown);

        // The pause ramp must be inert after resume
        for _ in 0..10 {
            t += ms(100);
            player.tick(t);
        }
        assert_eq!(player.current_delay_ms(), grown);
    }

    #[test]
    fn test_mid_pause_adjust_keeps_accrued_shift() {
        let mut config = fast_config();
        config.target_delay_ms = 2_000;
        config.max_delay_ms = 7_000;
        let (mut player, rx, sim) = player_with(config);

        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let mut t = t0;
        for _ in 0..25 {
            t += ms(100);
            player.tick(t);
        }
        assert_eq!(player.phase(), PlaybackPhase::Playing);

        // 3 seconds of pause grow the shift past the frozen cache count
        player.pause(t);
        for _ in 0..30 {
            t += ms(100);
            player.tick(t);
        }
        let grown = player.current_delay_ms();
        assert!(grown > player.available_cache_ms());
        drain(&rx);

        // A small nudge further back must not collapse toward live;
        // the reconciled cache clamps it at the accrued shift
        player.adjust_delay(100, t);
        assert_eq!(player.current_delay_ms(), grown);

        // A nudge toward live moves exactly as far as asked
        player.adjust_delay(-100, t);
        assert_eq!(player.current_delay_ms(), grown - 100);
    }

    #[test]
    fn test_pause_during_buffering_saves_remaining_window() {
        let (mut player, _rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);

        // 400ms into a 1000ms window
        let mut t = t0;
        for _ in 0..4 {
            t += ms(100);
            player.tick(t);
        }
        player.pause(t);
        assert_eq!(player.phase(), PlaybackPhase::Paused);

        // A long pause must not complete the window
        t += ms(5_000);
        player.tick(t);
        assert_eq!(player.phase(), PlaybackPhase::Paused);

        player.resume(t);
        assert_eq!(player.phase(), PlaybackPhase::Buffering);

        // Only ~600ms of window remain
        for _ in 0..7 {
            t += ms(100);
            player.tick(t);
        }
        assert_eq!(player.phase(), PlaybackPhase::Playing);
    }

    #[test]
    fn test_stop_resets_everything_and_is_idempotent() {
        let (mut player, _rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let t = finish_buffering(&mut player, t0, 1_000);

        player.stop(t);
        assert_eq!(player.phase(), PlaybackPhase::Stopped);
        assert_eq!(player.current_delay_ms(), 0);
        assert_eq!(player.available_cache_ms(), 0);

        player.stop(t);
        assert_eq!(player.phase(), PlaybackPhase::Stopped);
    }

    #[test]
    fn test_stale_error_after_stop_is_dropped() {
        let (mut player, rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let t = finish_buffering(&mut player, t0, 1_000);

        player.stop(t);
        drain(&rx);

        // The dying element fires an error inside the cooldown window.
        // SimBackend clears its queue on close, so exercise the filter
        // through the handler directly.
        player.handle_media_event(MediaEvent::Errored("aborted".into()), t + ms(50));
        let events = drain(&rx);
        assert!(events
            .iter()
            .all(|e| !matches!(e, Event::Error { .. })));

        // After the cooldown the same event is real again
        player.handle_media_event(MediaEvent::Errored("gone".into()), t + ms(500));
        let events = drain(&rx);
        assert!(events.iter().any(|e| matches!(e, Event::Error { .. })));
    }

    #[test]
    fn test_element_error_stops_playback() {
        let (mut player, rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);

        sim.push_event(MediaEvent::Errored("connection reset".into()));
        player.tick(t0 + ms(100));

        assert_eq!(player.phase(), PlaybackPhase::Stopped);
        assert!(drain(&rx)
            .iter()
            .any(|e| matches!(e, Event::Error { .. })));
    }

    #[test]
    fn test_cache_updates_emitted_while_playing() {
        let (mut player, rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);
        let mut t = finish_buffering(&mut player, t0, 1_000);
        drain(&rx);

        for _ in 0..4 {
            t += ms(500);
            player.tick(t);
        }
        let updates: Vec<_> = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::CacheUpdated { available_ms } => Some(available_ms),
                _ => None,
            })
            .collect();
        assert!(!updates.is_empty());
        // Monotonic while playing
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_volume_zero_mutes_and_mute_toggle_restores() {
        let (mut player, rx, _sim) = player_with(fast_config());
        player.set_volume(0.7);
        player.set_volume(0.0);

        let last_volume = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::VolumeChanged { volume, muted } => Some((volume, muted)),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last_volume, (0.0, true));

        player.toggle_mute();
        let last_volume = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::VolumeChanged { volume, muted } => Some((volume, muted)),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last_volume, (0.7, false));
    }

    #[test]
    fn test_eq_edits_require_selection_and_persist() {
        let (mut player, rx, _sim) = player_with(fast_config());
        assert!(player.set_band_gain(0, 6.0).is_err());

        let t0 = Instant::now();
        player.select_stream("cadena-3", t0).unwrap();
        drain(&rx);
        player.set_band_gain(3, 6.0).unwrap();

        let gains = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::EqualizerChanged { gains } => Some(gains),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(gains[3], 6.0);

        // Selecting another station surfaces its own (flat) curve
        player.select_stream("suquia", t0).unwrap();
        let gains = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::EqualizerChanged { gains } => Some(gains),
                _ => None,
            })
            .last()
            .unwrap();
        assert!(gains.iter().all(|g| *g == 0.0));

        // And coming back restores the saved curve
        player.select_stream("cadena-3", t0).unwrap();
        let gains = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::EqualizerChanged { gains } => Some(gains),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(gains[3], 6.0);
    }

    #[test]
    fn test_basic_mode_skips_buffering_and_refuses_time_shift() {
        let config = fast_config();
        let (tx, rx) = unbounded();
        let backend = SharedSim::failing_graph(config.sample_rate, config.max_delay_seconds());
        let mut player = Player::new(
            config,
            Box::new(backend.clone()),
            StreamRegistry::new(Box::new(MemoryStore::new())),
            EqualizerSettings::new(Box::new(MemoryStore::new())),
            Box::new(NullSink),
            tx,
        )
        .unwrap();

        let t0 = Instant::now();
        player.select_stream("cadena-3", t0).unwrap();
        player.play(t0).unwrap();
        backend.push_event(MediaEvent::Playing);
        player.tick(t0);

        // No buffering window: straight to audible playback at the
        // live edge
        assert_eq!(player.phase(), PlaybackPhase::Playing);
        assert_eq!(player.current_delay_ms(), 0);

        // Time-shift controls are inert without the graph
        player.adjust_delay(5_000, t0 + ms(100));
        assert_eq!(player.current_delay_ms(), 0);
        assert!(drain(&rx)
            .iter()
            .all(|e| !matches!(e, Event::DelayChanged { current_ms, .. } if *current_ms > 0)));

        if let Event::StateUpdate { enhanced, .. } = player.state_snapshot() {
            assert!(!enhanced);
        }
    }

    #[test]
    fn test_basic_mode_volume_change_keeps_pause_silent() {
        let config = fast_config();
        let (tx, _rx) = unbounded();
        let backend = SharedSim::failing_graph(config.sample_rate, config.max_delay_seconds());
        let mut player = Player::new(
            config,
            Box::new(backend.clone()),
            StreamRegistry::new(Box::new(MemoryStore::new())),
            EqualizerSettings::new(Box::new(MemoryStore::new())),
            Box::new(NullSink),
            tx,
        )
        .unwrap();

        let t0 = Instant::now();
        player.select_stream("cadena-3", t0).unwrap();
        player.play(t0).unwrap();
        backend.push_event(MediaEvent::Playing);
        player.tick(t0);
        assert_eq!(player.phase(), PlaybackPhase::Playing);

        // Pause silences via the element mute; a volume change while
        // paused must not lift it
        player.pause(t0 + ms(100));
        assert!(backend.element_muted());
        player.set_volume(0.5);
        assert!(backend.element_muted());

        player.resume(t0 + ms(200));
        assert!(!backend.element_muted());
    }

    #[test]
    fn test_connection_error_outlives_teardown() {
        let (mut player, _rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);

        sim.push_event(MediaEvent::Errored("connection reset".into()));
        player.tick(t0 + ms(100));
        assert_eq!(player.phase(), PlaybackPhase::Stopped);

        // The failure stays visible in snapshots after the teardown
        if let Event::StateUpdate { last_error, .. } = player.state_snapshot() {
            assert!(last_error.is_some());
        } else {
            panic!("wrong snapshot variant");
        }

        // Selecting a clean station wipes it
        player.select_stream("suquia", t0 + ms(400)).unwrap();
        if let Event::StateUpdate { last_error, .. } = player.state_snapshot() {
            assert_eq!(last_error, None);
        } else {
            panic!("wrong snapshot variant");
        }
    }

    #[test]
    fn test_known_error_sticks_through_stop() {
        let (mut player, _rx, _sim) = player_with(fast_config());
        let t0 = Instant::now();
        player.select_stream("lv2", t0).unwrap();
        assert!(player.play(t0).is_err());

        let message = match player.state_snapshot() {
            Event::StateUpdate { last_error, .. } => last_error,
            _ => panic!("wrong snapshot variant"),
        };
        assert!(message.is_some());

        // Stop clears transient errors but not a station's fixed one
        player.stop(t0 + ms(100));
        if let Event::StateUpdate { last_error, .. } = player.state_snapshot() {
            assert_eq!(last_error, message);
        } else {
            panic!("wrong snapshot variant");
        }
    }

    #[test]
    fn test_custom_station_lifecycle() {
        let (mut player, rx, _sim) = player_with(fast_config());
        let t0 = Instant::now();

        player
            .add_custom_stream("My Radio", "https://radio.example/live")
            .unwrap();
        assert!(drain(&rx)
            .iter()
            .any(|e| matches!(e, Event::StreamListChanged)));

        player.select_stream("my-radio", t0).unwrap();
        player.remove_custom_stream("my-radio", t0).unwrap();
        assert_eq!(player.selected_stream(), None);
        assert!(player.registry().get("my-radio").is_none());
    }

    #[test]
    fn test_state_snapshot() {
        let (mut player, _rx, sim) = player_with(fast_config());
        let t0 = Instant::now();
        start_buffering(&mut player, &sim, t0);

        if let Event::StateUpdate {
            phase, stream_id, ..
        } = player.state_snapshot()
        {
            assert_eq!(phase, PlaybackPhase::Buffering);
            assert_eq!(stream_id.as_deref(), Some("cadena-3"));
        } else {
            panic!("wrong snapshot variant");
        }
    }
}
