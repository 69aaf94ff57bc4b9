//! Simulation Backend
//!
//! An in-process backend used by tests and the demo. It plays nothing
//! audible; instead it records every call made against it, replays a
//! scripted queue of media events, and optionally runs a real
//! [`AudioGraph`] fed through a lock-free ring buffer so the whole
//! signal path can be exercised without an audio device.

use std::collections::VecDeque;

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::debug;

use crate::error::BackendError;
use crate::graph::AudioGraph;
use crate::traits::{MediaBackend, MediaEvent};

const RING_CAPACITY: usize = 48000 * 2;

/// Backend that simulates a media element
pub struct SimBackend {
    sample_rate: f32,
    max_delay_seconds: f32,
    /// When set, `open` behaves as if the enhanced graph could not be
    /// constructed and the element runs in basic mode.
    fail_enhanced: bool,
    /// When set, `open` itself fails
    fail_open: bool,
    /// When set, a successful `open` queues a `Playing` event, the way
    /// a real element reports once its first segment arrives
    auto_play: bool,

    graph: Option<AudioGraph>,
    open_url: Option<String>,
    scripted_events: VecDeque<MediaEvent>,

    /// Feed ring: tests push samples in, `pump` pulls them through the graph
    feed: Option<Consumer<f32>>,

    // Recorded element state, inspected by tests
    pub element_volume: f32,
    pub element_muted: bool,
    pub opened_urls: Vec<String>,
    pub close_count: usize,
    pub last_delay_request: Option<(f32, f32)>,
}

impl SimBackend {
    pub fn new(sample_rate: f32, max_delay_seconds: f32) -> Self {
        Self {
            sample_rate,
            max_delay_seconds,
            fail_enhanced: false,
            fail_open: false,
            auto_play: false,
            graph: None,
            open_url: None,
            scripted_events: VecDeque::new(),
            feed: None,
            element_volume: 1.0,
            element_muted: false,
            opened_urls: Vec::new(),
            close_count: 0,
            last_delay_request: None,
        }
    }

    /// Configure the next `open` to run in basic mode
    pub fn with_failing_graph(mut self) -> Self {
        self.fail_enhanced = true;
        self
    }

    /// Configure `open` to fail outright
    pub fn with_failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Configure every successful `open` to queue a `Playing` event
    pub fn with_auto_play(mut self) -> Self {
        self.auto_play = true;
        self
    }

    /// Queue a media event for a later `poll_event`
    pub fn push_event(&mut self, event: MediaEvent) {
        self.scripted_events.push_back(event);
    }

    /// Create the sample feed and hand back the producer side
    ///
    /// Samples pushed into the producer are pulled through the graph by
    /// [`pump`](Self::pump).
    pub fn sample_feed(&mut self) -> Producer<f32> {
        let (producer, consumer) = RingBuffer::new(RING_CAPACITY);
        self.feed = Some(consumer);
        producer
    }

    /// Pull up to `max_frames` stereo frames from the feed through the
    /// graph and return the processed samples.
    ///
    /// In basic mode (no graph) samples pass through untouched, the way
    /// a plain media element would play them.
    pub fn pump(&mut self, max_frames: usize) -> Vec<f32> {
        let consumer = match self.feed.as_mut() {
            Some(c) => c,
            None => return Vec::new(),
        };

        let available = consumer.slots() / 2;
        let frames = available.min(max_frames);
        let mut buffer = Vec::with_capacity(frames * 2);
        for _ in 0..frames * 2 {
            match consumer.pop() {
                Ok(sample) => buffer.push(sample),
                Err(_) => break,
            }
        }

        if let Some(graph) = self.graph.as_mut() {
            graph.process_interleaved(&mut buffer);
        }
        buffer
    }

    pub fn current_delay_seconds(&self) -> f32 {
        self.graph
            .as_ref()
            .map(|g| g.current_delay_seconds())
            .unwrap_or(0.0)
    }

    pub fn band_gains(&self) -> Option<[f32; rewind_dsp::NUM_BANDS]> {
        self.graph.as_ref().map(|g| g.band_gains())
    }
}

impl MediaBackend for SimBackend {
    fn name(&self) -> &'static str {
        "Simulation"
    }

    fn open(&mut self, url: &str) -> Result<(), BackendError> {
        self.close();

        if self.fail_open {
            return Err(BackendError::OpenFailed(url.to_string()));
        }

        self.graph = if self.fail_enhanced {
            debug!(url, "enhanced graph disabled, running in basic mode");
            None
        } else {
            Some(AudioGraph::new(self.sample_rate, self.max_delay_seconds)?)
        };

        debug!(url, enhanced = self.graph.is_some(), "sim element opened");
        self.open_url = Some(url.to_string());
        self.opened_urls.push(url.to_string());
        if self.auto_play {
            self.scripted_events.push_back(MediaEvent::Playing);
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.open_url.take().is_some() {
            self.close_count += 1;
            debug!("sim element closed");
        }
        if let Some(graph) = self.graph.as_mut() {
            graph.reset();
        }
        self.graph = None;
        self.scripted_events.clear();
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        if self.open_url.is_some() {
            self.scripted_events.pop_front()
        } else {
            None
        }
    }

    fn is_enhanced(&self) -> bool {
        self.graph.is_some()
    }

    fn set_delay(&mut self, seconds: f32, smoothing: f32) -> Result<(), BackendError> {
        self.last_delay_request = Some((seconds, smoothing));
        if let Some(graph) = self.graph.as_mut() {
            graph.set_delay(seconds, smoothing)?;
        }
        Ok(())
    }

    fn set_gain_target(&mut self, target: f32, time_constant: f32) {
        if let Some(graph) = self.graph.as_mut() {
            graph.set_gain_target(target, time_constant);
        }
    }

    fn set_gain(&mut self, value: f32) {
        if let Some(graph) = self.graph.as_mut() {
            graph.set_gain(value);
        }
    }

    fn set_band_gain(&mut self, band: usize, gain_db: f32) -> Result<(), BackendError> {
        if let Some(graph) = self.graph.as_mut() {
            graph.set_band_gain(band, gain_db)?;
        }
        Ok(())
    }

    fn set_band_gains(&mut self, gains_db: &[f32]) -> Result<(), BackendError> {
        if let Some(graph) = self.graph.as_mut() {
            graph.set_band_gains(gains_db)?;
        }
        Ok(())
    }

    fn set_element_volume(&mut self, volume: f32) {
        self.element_volume = volume.clamp(0.0, 1.0);
    }

    fn set_element_muted(&mut self, muted: bool) {
        self.element_muted = muted;
    }
}
