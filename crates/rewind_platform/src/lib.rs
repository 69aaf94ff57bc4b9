//! Rewind Platform - Media Backend Abstraction
//!
//! This crate defines the playback seam for Rewind:
//! - The `MediaBackend` trait the core engine drives
//! - The enhanced audio graph (equalizer, delay, analysis, gain)
//! - A simulation backend for tests and headless demos
//!
//! # Architecture
//!
//! A backend wraps one media element at a time. When the enhanced graph
//! cannot be constructed the backend keeps playing in basic mode and the
//! graph-dependent controls degrade to no-ops, so a stream is never lost
//! to a DSP failure.

mod error;
mod graph;
mod sim;
mod traits;

pub use error::BackendError;
pub use graph::AudioGraph;
pub use sim::SimBackend;
pub use traits::{MediaBackend, MediaEvent};
