//! UDP datagram sink.
//!
//! Sends each payload as one datagram to a configured target. A datagram
//! send is atomic, so concurrent tracks sharing this sink never interleave
//! within a message.

use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{SinkError, SinkHandle, SinkMessage, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};

/// UDP sink configuration.
#[derive(Debug, Clone)]
pub struct UdpSinkConfig {
    /// Target host.
    pub host: String,
    /// Target port (default: 10110, the conventional NMEA-over-UDP port).
    pub port: u16,
    /// Bounded queue capacity.
    pub queue_capacity: usize,
    /// Enqueue timeout before a sample is dropped.
    pub enqueue_timeout: Duration,
}

impl Default for UdpSinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 10110,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

/// UDP datagram sink worker.
pub struct UdpSink {
    config: UdpSinkConfig,
}

impl UdpSink {
    pub fn new(config: UdpSinkConfig) -> Self {
        Self { config }
    }

    /// Bind the socket and start the worker task.
    ///
    /// Returns the dispatch handle and the worker's join handle. The
    /// worker exits when cancelled or when every dispatch handle is gone.
    pub async fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> Result<(SinkHandle, JoinHandle<()>), SinkError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|source| SinkError::Bind { source })?;

        let target = format!("{}:{}", self.config.host, self.config.port);
        info!(target = %target, "UDP sink started");

        let (tx, mut rx) = mpsc::channel::<SinkMessage>(self.config.queue_capacity);
        let handle = SinkHandle::new("udp", tx, self.config.enqueue_timeout);

        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = rx.recv() => {
                        let Some(message) = received else { break };
                        if let Err(error) = socket.send_to(&message.payload, &target).await {
                            warn!(
                                track = %message.track_id,
                                target = %target,
                                error = %error,
                                "UDP send failed, sample dropped"
                            );
                        }
                    }
                }
            }
            debug!("UDP sink stopped");
        });

        Ok((handle, worker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackMode;

    #[tokio::test]
    async fn test_datagrams_arrive_at_target() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.expect("bind receiver");
        let port = receiver.local_addr().unwrap().port();

        let config = UdpSinkConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..UdpSinkConfig::default()
        };
        let shutdown = CancellationToken::new();
        let (handle, worker) = UdpSink::new(config)
            .spawn(shutdown.clone())
            .await
            .expect("spawn sink");

        handle
            .dispatch(SinkMessage {
                track_id: "t1".to_string(),
                mode: TrackMode::Nmea,
                payload: b"$GPGLL,test*00\r\n".to_vec(),
            })
            .await
            .expect("dispatch");

        let mut buffer = [0u8; 64];
        let len = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buffer))
            .await
            .expect("datagram within timeout")
            .expect("recv");
        assert_eq!(&buffer[..len], b"$GPGLL,test*00\r\n");

        shutdown.cancel();
        let _ = worker.await;
    }

    #[tokio::test]
    async fn test_worker_exits_when_handles_drop() {
        let config = UdpSinkConfig::default();
        let shutdown = CancellationToken::new();
        let (handle, worker) = UdpSink::new(config)
            .spawn(shutdown)
            .await
            .expect("spawn sink");

        drop(handle);
        tokio::time::timeout(Duration::from_secs(2), worker)
            .await
            .expect("worker exits")
            .expect("worker completes");
    }
}
