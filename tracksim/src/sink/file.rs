//! File sinks.
//!
//! Two layouts, matching the two filegen modes:
//! - [`SingleFileSink`]: one merged file shared by every track, ordered by
//!   arrival at the worker (wall-clock send order; writers are
//!   independent and concurrent, so no simulated-timestamp ordering is
//!   attempted).
//! - [`MultiFileSink`]: one file per track under an output directory,
//!   named from the sanitized track id with a `.nmea` or `.trk` extension
//!   by mode.
//!
//! Writes are flushed per payload, so a cancelled worker leaves no
//! partially-buffered message behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{SinkError, SinkHandle, SinkMessage, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};

/// Configuration for the merged single-file sink.
#[derive(Debug, Clone)]
pub struct SingleFileSinkConfig {
    /// Output file path; parent directories are created.
    pub outfile: PathBuf,
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
}

impl Default for SingleFileSinkConfig {
    fn default() -> Self {
        Self {
            outfile: PathBuf::from("output.trks"),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

/// Merged single-file sink worker.
pub struct SingleFileSink {
    config: SingleFileSinkConfig,
}

impl SingleFileSink {
    pub fn new(config: SingleFileSinkConfig) -> Self {
        Self { config }
    }

    /// Create/truncate the output file and start the worker task.
    pub async fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> Result<(SinkHandle, JoinHandle<()>), SinkError> {
        if let Some(parent) = self.config.outfile.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SinkError::Open {
                    path: self.config.outfile.clone(),
                    source,
                })?;
        }

        let mut file = File::create(&self.config.outfile)
            .await
            .map_err(|source| SinkError::Open {
                path: self.config.outfile.clone(),
                source,
            })?;

        info!(path = %self.config.outfile.display(), "file sink started");

        let (tx, mut rx) = mpsc::channel::<SinkMessage>(self.config.queue_capacity);
        let handle = SinkHandle::new("file", tx, self.config.enqueue_timeout);
        let path = self.config.outfile;

        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = rx.recv() => {
                        let Some(message) = received else { break };
                        if let Err(error) = write_payload(&mut file, &message.payload).await {
                            warn!(
                                track = %message.track_id,
                                path = %path.display(),
                                error = %error,
                                "file write failed, sample dropped"
                            );
                        }
                    }
                }
            }
            debug!(path = %path.display(), "file sink stopped");
        });

        Ok((handle, worker))
    }
}

/// Configuration for the per-track file sink.
#[derive(Debug, Clone)]
pub struct MultiFileSinkConfig {
    /// Output directory; created if missing.
    pub outdir: PathBuf,
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
}

impl Default for MultiFileSinkConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("."),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

/// Per-track file sink worker.
pub struct MultiFileSink {
    config: MultiFileSinkConfig,
}

impl MultiFileSink {
    pub fn new(config: MultiFileSinkConfig) -> Self {
        Self { config }
    }

    /// Create the output directory and start the worker task.
    ///
    /// Track files are opened lazily on the first payload from each track.
    pub async fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> Result<(SinkHandle, JoinHandle<()>), SinkError> {
        tokio::fs::create_dir_all(&self.config.outdir)
            .await
            .map_err(|source| SinkError::Open {
                path: self.config.outdir.clone(),
                source,
            })?;

        info!(dir = %self.config.outdir.display(), "per-track file sink started");

        let (tx, mut rx) = mpsc::channel::<SinkMessage>(self.config.queue_capacity);
        let handle = SinkHandle::new("multifile", tx, self.config.enqueue_timeout);
        let outdir = self.config.outdir;

        let worker = tokio::spawn(async move {
            let mut files: HashMap<String, File> = HashMap::new();
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = rx.recv() => {
                        let Some(message) = received else { break };
                        if let Err(error) = write_track_payload(&outdir, &mut files, &message).await {
                            warn!(
                                track = %message.track_id,
                                error = %error,
                                "file write failed, sample dropped"
                            );
                        }
                    }
                }
            }
            debug!(dir = %outdir.display(), "per-track file sink stopped");
        });

        Ok((handle, worker))
    }
}

async fn write_payload(file: &mut File, payload: &[u8]) -> std::io::Result<()> {
    file.write_all(payload).await?;
    file.flush().await
}

async fn write_track_payload(
    outdir: &Path,
    files: &mut HashMap<String, File>,
    message: &SinkMessage,
) -> std::io::Result<()> {
    if !files.contains_key(&message.track_id) {
        let extension = if message.mode.is_trk() { "trk" } else { "nmea" };
        let path = outdir.join(format!("{}.{extension}", sanitize_track_id(&message.track_id)));
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;
        files.insert(message.track_id.clone(), file);
    }
    let file = files.get_mut(&message.track_id).expect("just inserted");
    write_payload(file, &message.payload).await
}

/// Lowercase a track id and collapse runs of non-alphanumerics to `-`.
fn sanitize_track_id(id: &str) -> String {
    let mut sanitized = String::with_capacity(id.len());
    let mut pending_dash = false;
    for ch in id.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !sanitized.is_empty() {
                sanitized.push('-');
            }
            pending_dash = false;
            sanitized.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackMode;

    fn message(track_id: &str, mode: TrackMode, payload: &str) -> SinkMessage {
        SinkMessage {
            track_id: track_id.to_string(),
            mode,
            payload: payload.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_sanitize_track_id() {
        assert_eq!(sanitize_track_id("Boat Route #2"), "boat-route-2");
        assert_eq!(sanitize_track_id("  harbour  "), "harbour");
        assert_eq!(sanitize_track_id("a__b"), "a-b");
    }

    #[tokio::test]
    async fn test_single_file_appends_in_arrival_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outfile = dir.path().join("merged.trks");
        let config = SingleFileSinkConfig {
            outfile: outfile.clone(),
            ..SingleFileSinkConfig::default()
        };

        let shutdown = CancellationToken::new();
        let (handle, worker) = SingleFileSink::new(config)
            .spawn(shutdown)
            .await
            .expect("spawn sink");

        handle
            .dispatch(message("a", TrackMode::TrkAuto, "$TRK,a*00\r\n"))
            .await
            .unwrap();
        handle
            .dispatch(message("b", TrackMode::TrkAuto, "$TRK,b*00\r\n"))
            .await
            .unwrap();
        drop(handle);
        worker.await.expect("worker completes");

        let contents = std::fs::read_to_string(&outfile).expect("read merged file");
        assert_eq!(contents, "$TRK,a*00\r\n$TRK,b*00\r\n");
    }

    #[tokio::test]
    async fn test_multi_file_splits_by_track_and_mode_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = MultiFileSinkConfig {
            outdir: dir.path().to_path_buf(),
            ..MultiFileSinkConfig::default()
        };

        let shutdown = CancellationToken::new();
        let (handle, worker) = MultiFileSink::new(config)
            .spawn(shutdown)
            .await
            .expect("spawn sink");

        handle
            .dispatch(message("Sea Route", TrackMode::Nmea, "$GPGLL,x*00\r\n"))
            .await
            .unwrap();
        handle
            .dispatch(message("Land Route", TrackMode::TrkAuto, "$TRK,y*00\r\n"))
            .await
            .unwrap();
        drop(handle);
        worker.await.expect("worker completes");

        let nmea = std::fs::read_to_string(dir.path().join("sea-route.nmea")).unwrap();
        assert_eq!(nmea, "$GPGLL,x*00\r\n");
        let trk = std::fs::read_to_string(dir.path().join("land-route.trk")).unwrap();
        assert_eq!(trk, "$TRK,y*00\r\n");
    }
}
