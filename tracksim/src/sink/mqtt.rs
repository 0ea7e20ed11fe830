//! MQTT publish sink.
//!
//! Publishes each payload to `<prefix>/<mode>/<trackId>` at QoS 1. The
//! client's event loop runs in a companion task and backs off on
//! connection errors; while the broker is unreachable, publishes fail
//! fast and the affected samples are dropped with a warning; the
//! simulation clock never waits on the broker.

use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{SinkHandle, SinkMessage, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};

/// Delay before re-polling the event loop after a connection error.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// MQTT sink configuration.
#[derive(Debug, Clone)]
pub struct MqttSinkConfig {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Topic prefix; full topics are `<prefix>/<mode>/<trackId>`.
    pub topic: String,
    /// Bounded queue capacity.
    pub queue_capacity: usize,
    /// Enqueue timeout before a sample is dropped.
    pub enqueue_timeout: Duration,
}

impl Default for MqttSinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: "tracksim".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

/// MQTT publish sink worker.
pub struct MqttSink {
    config: MqttSinkConfig,
}

impl MqttSink {
    pub fn new(config: MqttSinkConfig) -> Self {
        Self { config }
    }

    /// Start the publish worker and the client event loop.
    ///
    /// Connection establishment is asynchronous; publishes issued before
    /// the broker connects are buffered by the client and flushed once the
    /// connection is up.
    pub fn spawn(self, shutdown: CancellationToken) -> (SinkHandle, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            format!("tracksim-{}", std::process::id()),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut event_loop) = AsyncClient::new(options, self.config.queue_capacity);
        info!(
            broker = %format!("{}:{}", self.config.host, self.config.port),
            topic = %self.config.topic,
            "MQTT sink started"
        );

        // Event loop task: drives the connection, backs off on errors.
        let loop_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_shutdown.cancelled() => break,
                    event = event_loop.poll() => {
                        if let Err(error) = event {
                            warn!(error = %error, "MQTT connection error, backing off");
                            tokio::time::sleep(RECONNECT_BACKOFF).await;
                        }
                    }
                }
            }
        });

        let (tx, mut rx) = mpsc::channel::<SinkMessage>(self.config.queue_capacity);
        let handle = SinkHandle::new("mqtt", tx, self.config.enqueue_timeout);
        let prefix = self.config.topic;

        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = rx.recv() => {
                        let Some(message) = received else { break };
                        let topic = format!("{prefix}/{}/{}", message.mode, message.track_id);
                        if let Err(error) = client
                            .try_publish(topic.as_str(), QoS::AtLeastOnce, false, message.payload)
                        {
                            warn!(
                                track = %message.track_id,
                                topic = %topic,
                                error = %error,
                                "MQTT publish failed, sample dropped"
                            );
                        }
                    }
                }
            }
            let _ = client.try_disconnect();
            debug!("MQTT sink stopped");
        });

        (handle, worker)
    }
}
