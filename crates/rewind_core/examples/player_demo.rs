//! End-to-end demo against the simulation backend
//!
//! Run with: cargo run -p rewind_core --example player_demo

use std::time::Duration;

use rewind_core::{
    EqualizerSettings, Event, MemoryStore, NullSink, PlaybackPhase, PlayerConfig, PlayerEngine,
    StreamRegistry,
};
use rewind_platform::SimBackend;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rewind_core=debug,rewind_platform=debug".into()),
        )
        .init();

    let config = PlayerConfig::fast();
    let backend = SimBackend::new(config.sample_rate, config.max_delay_seconds()).with_auto_play();

    let engine = PlayerEngine::with_parts(
        config,
        Box::new(backend),
        StreamRegistry::new(Box::new(MemoryStore::new())),
        EqualizerSettings::new(Box::new(MemoryStore::new())),
        Box::new(NullSink),
    )
    .unwrap();

    engine.select_stream("cadena-3").unwrap();
    engine.play().unwrap();

    // Buffering takes about a second with the fast config; watch the
    // phases go by, then nudge the time shift around and stop.
    let mut playing_seen = false;
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while std::time::Instant::now() < deadline {
        match engine.wait_event() {
            Some(Event::PhaseChanged { phase }) => {
                println!("phase: {:?}", phase);
                if phase == PlaybackPhase::Playing && !playing_seen {
                    playing_seen = true;
                    engine.adjust_delay(500).unwrap();
                    engine.set_band_gain(4, 6.0).unwrap();
                    engine.go_live().unwrap();
                    engine.stop().unwrap();
                }
            }
            Some(Event::BufferingProgress {
                elapsed_ms,
                total_ms,
            }) => println!("buffering {}/{} ms", elapsed_ms, total_ms),
            Some(Event::DelayChanged {
                current_ms,
                target_ms,
            }) => println!("delay {} ms (target {})", current_ms, target_ms),
            Some(Event::EqualizerChanged { gains }) => println!("eq {:?}", gains),
            Some(event) => println!("{:?}", event),
            None => break,
        }
        if playing_seen {
            // Drain whatever the stop produced, then leave
            while let Some(event) = engine.poll_event() {
                println!("{:?}", event);
            }
            break;
        }
    }

    println!("done");
}
