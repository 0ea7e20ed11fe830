//! Per-track playback runner.
//!
//! A [`TrackRunner`] owns exactly one path, config, playback state, and
//! encoder. It ticks on a fixed interval whose deadlines are anchored at
//! runner start (`start + k * interval`), so scheduling jitter does not
//! accumulate; combined with the elapsed-time distance model in
//! [`crate::playback`], a late tick produces a correspondingly further
//! sample instead of a lagging clock.

use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::message::{MessageEncoder, NmeaSentence, Sample};
use crate::path::{Fix, Path, PathError};
use crate::playback::{LegEvent, PlaybackState, Tick};
use crate::sink::{SinkHandle, SinkMessage};
use crate::track::{Track, TrackConfig};

/// Lifecycle notifications from a runner to its observer.
///
/// `Tick` events are best-effort: a lagging observer loses ticks, never
/// the start/repeat/completion markers.
#[derive(Debug, Clone)]
pub enum TrackEvent {
    Started { track_id: String },
    Tick { track_id: String, sample: Sample },
    Repeated { track_id: String },
    Completed { track_id: String },
}

/// How a runner's task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerOutcome {
    /// Playback reached its terminal state.
    Completed,
    /// The runner was cancelled externally.
    Cancelled,
}

/// Drives one track's playback and dispatches rendered payloads.
pub struct TrackRunner {
    track_id: String,
    config: TrackConfig,
    path: Path,
    encoder: MessageEncoder,
    sinks: Vec<SinkHandle>,
}

impl TrackRunner {
    /// Build a runner from a track descriptor.
    ///
    /// The config is sanitized (out-of-range values replaced with
    /// defaults, with a warning) and the path is built up front; an
    /// invalid path rejects the track before any scheduling happens.
    pub fn new(
        track: Track,
        sinks: Vec<SinkHandle>,
        nmea_types: Vec<NmeaSentence>,
        nmea_batch: bool,
    ) -> Result<Self, PathError> {
        let config = track.config.sanitized(&track.id);
        let path = Path::build(&track.waypoints)?;
        let encoder = MessageEncoder::new(config.mode, nmea_types, nmea_batch);

        Ok(Self {
            track_id: track.id,
            config,
            path,
            encoder,
            sinks,
        })
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    /// Run the tick loop until playback completes or the token fires.
    pub async fn run(
        self,
        shutdown: CancellationToken,
        events: mpsc::Sender<TrackEvent>,
    ) -> RunnerOutcome {
        info!(
            track = %self.track_id,
            mode = %self.config.mode,
            source = %self.config.source,
            velocity_kmh = self.config.velocity_kmh,
            interval_ms = self.config.interval.as_millis() as u64,
            path_m = format!("{:.1}", self.path.total_length()),
            "track started"
        );
        let _ = events
            .send(TrackEvent::Started {
                track_id: self.track_id.clone(),
            })
            .await;

        let mut state = PlaybackState::new(&self.config, Instant::now());
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(track = %self.track_id, "track cancelled");
                    return RunnerOutcome::Cancelled;
                }
                _ = ticker.tick() => {}
            }

            match state.advance(Instant::now(), &self.path) {
                Tick::Waiting => {}
                Tick::Sample { fix, event } => {
                    self.emit(&fix, &events).await;
                    if event == Some(LegEvent::Restarted) {
                        debug!(track = %self.track_id, "track repeated");
                        let _ = events
                            .send(TrackEvent::Repeated {
                                track_id: self.track_id.clone(),
                            })
                            .await;
                    }
                }
                Tick::Final { fix } => {
                    self.emit(&fix, &events).await;
                    info!(track = %self.track_id, "track completed");
                    let _ = events
                        .send(TrackEvent::Completed {
                            track_id: self.track_id.clone(),
                        })
                        .await;
                    return RunnerOutcome::Completed;
                }
            }
        }
    }

    /// Render one fix and dispatch the payloads to every attached sink.
    async fn emit(&self, fix: &Fix, events: &mpsc::Sender<TrackEvent>) {
        let sample = Sample {
            timestamp: Utc::now(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            speed_kmh: self.config.velocity_kmh,
            heading: fix.heading.rem_euclid(360.0) as u16,
            track_id: self.track_id.clone(),
        };

        for payload in self.encoder.render(&sample) {
            for sink in &self.sinks {
                let message = SinkMessage {
                    track_id: self.track_id.clone(),
                    mode: self.config.mode,
                    payload: payload.clone().into_bytes(),
                };
                if let Err(error) = sink.dispatch(message).await {
                    warn!(
                        track = %self.track_id,
                        sink = sink.name(),
                        error = %error,
                        "sink dispatch failed, sample dropped"
                    );
                }
            }
        }

        // Best-effort: observers that lag lose ticks, not correctness.
        let _ = events.try_send(TrackEvent::Tick {
            track_id: self.track_id.clone(),
            sample,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::Waypoint;
    use crate::track::TrackMode;
    use std::time::Duration;

    fn short_track(config: TrackConfig) -> Track {
        Track::new(
            "test-track",
            config,
            vec![
                Waypoint::new(41.8902, 12.4923),
                Waypoint::new(41.89025, 12.49235),
            ],
        )
    }

    #[test]
    fn test_new_rejects_invalid_path() {
        let track = Track::new("bad", TrackConfig::default(), vec![Waypoint::new(1.0, 2.0)]);
        let result = TrackRunner::new(track, Vec::new(), Vec::new(), false);
        assert!(matches!(result, Err(PathError::TooFewPoints { .. })));
    }

    #[test]
    fn test_new_sanitizes_config() {
        let config = TrackConfig {
            velocity_kmh: -5.0,
            ..TrackConfig::default()
        };
        let runner =
            TrackRunner::new(short_track(config), Vec::new(), Vec::new(), false).expect("runner");
        assert_eq!(runner.config.velocity_kmh, crate::track::DEFAULT_VELOCITY_KMH);
    }

    #[tokio::test]
    async fn test_runner_completes_and_reports_lifecycle() {
        // ~7 m path at very high velocity: finishes on the second tick.
        let config = TrackConfig {
            velocity_kmh: 3600.0, // 1000 m/s
            interval: Duration::from_millis(10),
            mode: TrackMode::TrkAuto,
            ..TrackConfig::default()
        };
        let runner =
            TrackRunner::new(short_track(config), Vec::new(), Vec::new(), false).expect("runner");

        let (events_tx, mut events_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run(shutdown, events_tx),
        )
        .await
        .expect("runner finishes");
        assert_eq!(outcome, RunnerOutcome::Completed);

        let mut saw_started = false;
        let mut saw_completed = false;
        let mut ticks = 0;
        while let Some(event) = events_rx.recv().await {
            match event {
                TrackEvent::Started { track_id } => {
                    assert_eq!(track_id, "test-track");
                    saw_started = true;
                }
                TrackEvent::Tick { .. } => ticks += 1,
                TrackEvent::Completed { .. } => saw_completed = true,
                TrackEvent::Repeated { .. } => panic!("no repeat configured"),
            }
        }
        assert!(saw_started && saw_completed);
        assert!(ticks >= 1);
    }

    #[tokio::test]
    async fn test_repeat_runner_runs_until_cancelled() {
        let config = TrackConfig {
            velocity_kmh: 3600.0,
            interval: Duration::from_millis(5),
            repeat: true,
            mode: TrackMode::TrkAuto,
            ..TrackConfig::default()
        };
        let runner =
            TrackRunner::new(short_track(config), Vec::new(), Vec::new(), false).expect("runner");

        let (events_tx, mut events_rx) = mpsc::channel(256);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(runner.run(shutdown.clone(), events_tx));

        // Wait until at least one repeat cycle is observed.
        let mut repeated = false;
        let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(5);
        while !repeated {
            let event = tokio::time::timeout_at(deadline, events_rx.recv())
                .await
                .expect("event before deadline")
                .expect("channel open");
            repeated = matches!(event, TrackEvent::Repeated { .. });
        }

        shutdown.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("cancel is prompt")
            .expect("task joins");
        assert_eq!(outcome, RunnerOutcome::Cancelled);
    }
}
