//! Usage Analytics Seam
//!
//! The player reports coarse usage events through this trait. The
//! default sink writes them to the log; tests plug in a recording sink.

use tracing::info;

/// A coarse usage event
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    StreamSelected { stream_id: String },
    PlaybackStarted { stream_id: String },
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped { stream_id: String },
    DelayAdjusted { current_ms: u64 },
    WentLive,
    StreamErrored { stream_id: String, message: String },
    CustomStationAdded,
}

/// Destination for usage events
pub trait AnalyticsSink: Send {
    fn record(&mut self, event: AnalyticsEvent);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn record(&mut self, _event: AnalyticsEvent) {}
}

/// Writes events to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn record(&mut self, event: AnalyticsEvent) {
        info!(?event, "analytics");
    }
}
