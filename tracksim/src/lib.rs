//! TrackSim - simulated GPS track playback
//!
//! This library replays geographic paths in real time and renders timed
//! position reports (NMEA 0183 sentences or custom `$TRK` records) to one
//! or more sinks: UDP datagrams, MQTT topics, or files.
//!
//! # High-Level API
//!
//! For most use cases, build [`track::Track`] descriptors (by hand or via
//! [`kml::parse_tracks`]), attach sinks, and hand everything to the
//! [`orchestrator::Orchestrator`]:
//!
//! ```ignore
//! use tracksim::orchestrator::Orchestrator;
//! use tracksim::runner::TrackRunner;
//!
//! let mut orchestrator = Orchestrator::new();
//! for track in tracks {
//!     let runner = TrackRunner::new(track, sinks.clone(), nmea_types.clone(), false)?;
//!     orchestrator.start(runner);
//! }
//! let summary = orchestrator.join().await;
//! ```

pub mod config;
pub mod geodesy;
pub mod kml;
pub mod logging;
pub mod message;
pub mod orchestrator;
pub mod path;
pub mod playback;
pub mod runner;
pub mod sink;
pub mod track;

/// Version of the TrackSim library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
