//! Message sinks.
//!
//! A sink is an external destination for rendered payloads: a UDP target,
//! an MQTT topic, or a file. Every sink is a worker task behind a bounded
//! queue; the queue decouples a runner's tick cadence from sink latency.
//! Dispatch never blocks a runner indefinitely: enqueueing carries a
//! timeout, and on a full queue or timeout the sample is dropped and
//! logged instead of stalling the simulation clock.
//!
//! Each worker serializes its own writes, so concurrent runners can share
//! one sink handle without interleaving partial messages.

mod file;
mod mqtt;
mod udp;

pub use file::{MultiFileSink, MultiFileSinkConfig, SingleFileSink, SingleFileSinkConfig};
pub use mqtt::{MqttSink, MqttSinkConfig};
pub use udp::{UdpSink, UdpSinkConfig};

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::track::TrackMode;

/// Default bounded queue capacity per sink.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default enqueue timeout before a sample is dropped.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(100);

/// One rendered payload on its way to a sink.
#[derive(Debug, Clone)]
pub struct SinkMessage {
    /// Track that produced the payload.
    pub track_id: String,
    /// The track's output mode (used for topic/file naming).
    pub mode: TrackMode,
    /// Rendered sentence bytes, checksum and CRLF included.
    pub payload: Vec<u8>,
}

/// Sink failures.
///
/// All of these are contained: a failed dispatch drops one sample for one
/// sink and never propagates to other tracks or halts the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to bind UDP socket: {source}")]
    Bind {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open output path {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sink '{sink}' queue full, sample dropped")]
    QueueFull { sink: &'static str },

    #[error("sink '{sink}' is closed")]
    Closed { sink: &'static str },
}

/// Cloneable handle for dispatching payloads to one sink's worker.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    name: &'static str,
    tx: mpsc::Sender<SinkMessage>,
    enqueue_timeout: Duration,
}

impl SinkHandle {
    fn new(name: &'static str, tx: mpsc::Sender<SinkMessage>, enqueue_timeout: Duration) -> Self {
        Self {
            name,
            tx,
            enqueue_timeout,
        }
    }

    /// Sink name for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enqueue a payload, waiting at most the configured timeout.
    pub async fn dispatch(&self, message: SinkMessage) -> Result<(), SinkError> {
        self.tx
            .send_timeout(message, self.enqueue_timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => SinkError::QueueFull { sink: self.name },
                SendTimeoutError::Closed(_) => SinkError::Closed { sink: self.name },
            })
    }
}
