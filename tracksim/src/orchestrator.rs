//! Concurrent track orchestration.
//!
//! The [`Orchestrator`] starts each [`TrackRunner`] as an independent
//! tokio task under a shared [`CancellationToken`] and reports aggregate
//! completion. Tracks share no mutable state and are independent failure
//! domains: a panicking runner is counted as failed without disturbing
//! the others.
//!
//! A track with `repeat` set never completes on its own, so [`join`]
//! completes only once such tracks are cancelled; indefinite and finite
//! tracks run side by side.
//!
//! [`join`]: Orchestrator::join

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::runner::{RunnerOutcome, TrackEvent, TrackRunner};

/// Default capacity of the lifecycle event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Aggregate result of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinSummary {
    /// Runners that reached their terminal playback state.
    pub completed: usize,
    /// Runners stopped by cancellation.
    pub cancelled: usize,
    /// Runners that died (panicked or were aborted).
    pub failed: usize,
}

impl JoinSummary {
    /// True when at least one runner was started and none survived.
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.completed == 0 && self.cancelled == 0
    }
}

/// Starts, observes, and joins a set of concurrent track runners.
pub struct Orchestrator {
    shutdown: CancellationToken,
    events_tx: mpsc::Sender<TrackEvent>,
    events_rx: Option<mpsc::Receiver<TrackEvent>>,
    runners: Vec<(String, JoinHandle<RunnerOutcome>)>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events_tx, events_rx) = mpsc::channel(capacity);
        Self {
            shutdown: CancellationToken::new(),
            events_tx,
            events_rx: Some(events_rx),
            runners: Vec::new(),
        }
    }

    /// Spawn a runner under the shared cancellation token.
    pub fn start(&mut self, runner: TrackRunner) {
        let track_id = runner.track_id().to_string();
        let token = self.shutdown.clone();
        let events = self.events_tx.clone();
        let handle = tokio::spawn(runner.run(token, events));
        self.runners.push((track_id, handle));
    }

    /// Number of started runners.
    pub fn track_count(&self) -> usize {
        self.runners.len()
    }

    /// Take the lifecycle event receiver.
    ///
    /// Can be taken once; the channel closes after every runner finished
    /// and the orchestrator was joined.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TrackEvent>> {
        self.events_rx.take()
    }

    /// Token other components can watch for shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Signal every runner to stop.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Wait for all runners to finish and summarize the outcome.
    ///
    /// Never returns while a `repeat` track is still running; cancel first
    /// (or from another task via [`Orchestrator::cancellation_token`]) to
    /// end an indefinite run.
    pub async fn join(self) -> JoinSummary {
        // Drop our event sender so the receiver ends with the last runner.
        drop(self.events_tx);
        drop(self.events_rx);

        let mut summary = JoinSummary::default();
        for (track_id, handle) in self.runners {
            match handle.await {
                Ok(RunnerOutcome::Completed) => summary.completed += 1,
                Ok(RunnerOutcome::Cancelled) => summary.cancelled += 1,
                Err(join_error) => {
                    error!(track = %track_id, error = %join_error, "track runner failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            completed = summary.completed,
            cancelled = summary.cancelled,
            failed = summary.failed,
            "all tracks finished"
        );
        summary
    }

    /// Cancel every runner, then join.
    pub async fn shutdown(self) -> JoinSummary {
        self.shutdown.cancel();
        self.join().await
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::Waypoint;
    use crate::track::{Track, TrackConfig, TrackMode};
    use std::time::Duration;

    fn fast_track(id: &str, repeat: bool) -> TrackRunner {
        let config = TrackConfig {
            velocity_kmh: 3600.0,
            interval: Duration::from_millis(5),
            repeat,
            mode: TrackMode::TrkAuto,
            ..TrackConfig::default()
        };
        let track = Track::new(
            id,
            config,
            vec![
                Waypoint::new(41.8902, 12.4923),
                Waypoint::new(41.89025, 12.49235),
            ],
        );
        TrackRunner::new(track, Vec::new(), Vec::new(), false).expect("runner")
    }

    #[tokio::test]
    async fn test_join_completes_when_all_tracks_finish() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.start(fast_track("a", false));
        orchestrator.start(fast_track("b", false));
        assert_eq!(orchestrator.track_count(), 2);

        let summary = tokio::time::timeout(Duration::from_secs(5), orchestrator.join())
            .await
            .expect("join completes");
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.cancelled, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_cancel_ends_indefinite_runs() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.start(fast_track("finite", false));
        orchestrator.start(fast_track("forever", true));

        let token = orchestrator.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), orchestrator.join())
            .await
            .expect("join completes after cancel");
        assert_eq!(summary.completed + summary.cancelled, 2);
        assert!(summary.cancelled >= 1, "the repeat track must be cancelled");
    }

    #[tokio::test]
    async fn test_events_observed_across_tracks() {
        let mut orchestrator = Orchestrator::new();
        let mut events = orchestrator.take_events().expect("events available once");
        assert!(orchestrator.take_events().is_none());

        orchestrator.start(fast_track("a", false));
        let observer = tokio::spawn(async move {
            let mut started = 0;
            let mut completed = 0;
            while let Some(event) = events.recv().await {
                match event {
                    TrackEvent::Started { .. } => started += 1,
                    TrackEvent::Completed { .. } => completed += 1,
                    _ => {}
                }
            }
            (started, completed)
        });

        orchestrator.join().await;
        let (started, completed) = observer.await.expect("observer joins");
        assert_eq!(started, 1);
        assert_eq!(completed, 1);
    }

    #[test]
    fn test_all_failed() {
        let summary = JoinSummary {
            completed: 0,
            cancelled: 0,
            failed: 2,
        };
        assert!(summary.all_failed());

        let summary = JoinSummary {
            completed: 1,
            cancelled: 0,
            failed: 1,
        };
        assert!(!summary.all_failed());
    }
}
