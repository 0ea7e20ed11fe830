//! TrackSim CLI - Command-line interface
//!
//! Loads tracks from KML files, merges CLI flags over the INI config,
//! wires up the configured sinks, and runs every track to completion (or
//! until Ctrl-C).

mod error;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

use error::CliError;
use tracksim::config::{self, AppSettings, FilegenMode, FilegenSettings, MqttSettings};
use tracksim::kml;
use tracksim::logging;
use tracksim::orchestrator::Orchestrator;
use tracksim::runner::TrackRunner;
use tracksim::sink::{
    MqttSink, MqttSinkConfig, MultiFileSink, MultiFileSinkConfig, SingleFileSink,
    SingleFileSinkConfig, UdpSink, UdpSinkConfig,
};

#[derive(Debug, Clone, ValueEnum)]
enum FilegenModeArg {
    /// Write one merged file for every track
    Single,
    /// Write one file per track
    Multi,
}

#[derive(Parser)]
#[command(name = "tracksim", version = tracksim::VERSION)]
#[command(
    about = "Replay KML tracks as timed NMEA/TRK position reports over UDP, MQTT, or files",
    long_about = None
)]
struct Args {
    /// Paths to KML files or directories containing them
    #[arg(required = true, value_name = "KML")]
    kml: Vec<PathBuf>,

    /// INI config file path
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,

    /// Enable the UDP sink, optionally overriding the target
    #[arg(long, value_name = "HOST:PORT", num_args = 0..=1, default_missing_value = "")]
    udp: Option<String>,

    /// Enable the MQTT sink, optionally overriding the broker
    #[arg(long, value_name = "HOST:PORT", num_args = 0..=1, default_missing_value = "")]
    mqtt: Option<String>,

    /// MQTT topic prefix
    #[arg(long, value_name = "PREFIX")]
    topic: Option<String>,

    /// Comma-separated NMEA sentences to emit (GPRMC,GPGGA,GPGLL)
    #[arg(long, value_name = "TYPES")]
    nmea_types: Option<String>,

    /// Emit all selected NMEA sentences in one payload per update
    #[arg(long)]
    nmea_batch: bool,

    /// Enable file output
    #[arg(long, value_enum, value_name = "MODE")]
    filegen: Option<FilegenModeArg>,

    /// Merged output file for single filegen mode
    #[arg(long, value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Output directory for multi filegen mode
    #[arg(long, value_name = "DIR")]
    outdir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match logging::init_logging(logging::default_log_dir(), logging::default_log_file())
    {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    info!(version = tracksim::VERSION, "tracksim starting");

    if let Err(e) = run(args).await {
        e.exit();
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let mut settings = config::load_settings(&args.config)?;
    apply_overrides(&mut settings, &args);

    let kml_paths = kml::collect_kml_paths(&args.kml);
    if kml_paths.is_empty() {
        return Err(CliError::NoInput("No KML files found in the given paths"));
    }

    let track_defaults = settings.track.to_config();
    let mut tracks = Vec::new();
    for path in &kml_paths {
        tracks.extend(kml::parse_tracks(path, &track_defaults)?);
    }
    if tracks.is_empty() {
        return Err(CliError::NoInput("No tracks found in the provided KML files"));
    }

    let mut orchestrator = Orchestrator::new();
    let shutdown = orchestrator.cancellation_token();

    // Sinks shared by every track; each runs its own worker task.
    let mut sinks = Vec::new();
    let mut workers = Vec::new();

    if let Some(udp) = &settings.udp {
        let config = UdpSinkConfig {
            host: udp.host.clone(),
            port: udp.port,
            ..UdpSinkConfig::default()
        };
        let (handle, worker) = UdpSink::new(config).spawn(shutdown.clone()).await?;
        sinks.push(handle);
        workers.push(worker);
    }

    if let Some(mqtt) = &settings.mqtt {
        let config = MqttSinkConfig {
            host: mqtt.host.clone(),
            port: mqtt.port,
            topic: mqtt.topic.clone(),
            ..MqttSinkConfig::default()
        };
        let (handle, worker) = MqttSink::new(config).spawn(shutdown.clone());
        sinks.push(handle);
        workers.push(worker);
    }

    if let Some(filegen) = &settings.filegen {
        let (handle, worker) = match filegen.mode {
            FilegenMode::Single => {
                let config = SingleFileSinkConfig {
                    outfile: filegen.outfile.clone(),
                    ..SingleFileSinkConfig::default()
                };
                SingleFileSink::new(config).spawn(shutdown.clone()).await?
            }
            FilegenMode::Multi => {
                let config = MultiFileSinkConfig {
                    outdir: filegen.outdir.clone(),
                    ..MultiFileSinkConfig::default()
                };
                MultiFileSink::new(config).spawn(shutdown.clone()).await?
            }
        };
        sinks.push(handle);
        workers.push(worker);
    }

    if sinks.is_empty() {
        warn!("no sinks configured; tracks will play without emitting anywhere");
    }

    for track in tracks {
        let id = track.id.clone();
        match TrackRunner::new(
            track,
            sinks.clone(),
            settings.nmea.types.clone(),
            settings.nmea.batch,
        ) {
            Ok(runner) => orchestrator.start(runner),
            Err(e) => error!(track = %id, error = %e, "skipping track with invalid path"),
        }
    }
    if orchestrator.track_count() == 0 {
        return Err(CliError::NoInput("No playable tracks remained after validation"));
    }
    info!(tracks = orchestrator.track_count(), "playback started");

    // Ctrl-C cancels every runner; repeat tracks never end on their own.
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            cancel.cancel();
        }
    });

    let summary = orchestrator.join().await;

    // Drop our sink handles so the workers drain their queues and exit.
    drop(sinks);
    for worker in workers {
        let _ = worker.await;
    }

    if summary.all_failed() {
        return Err(CliError::AllTracksFailed);
    }
    Ok(())
}

/// Overlay CLI flags onto the file/default settings. CLI wins.
fn apply_overrides(settings: &mut AppSettings, args: &Args) {
    if let Some(target) = &args.udp {
        let mut udp = settings.udp.take().unwrap_or_default();
        if !target.is_empty() {
            let (host, port) = parse_host_port(target, udp.port);
            udp.host = host;
            udp.port = port;
        }
        settings.udp = Some(udp);
    }

    if let Some(broker) = &args.mqtt {
        let mut mqtt = settings.mqtt.take().unwrap_or_default();
        if !broker.is_empty() {
            let (host, port) = parse_host_port(broker, mqtt.port);
            mqtt.host = host;
            mqtt.port = port;
        }
        settings.mqtt = Some(mqtt);
    }
    if let Some(topic) = &args.topic {
        settings.mqtt.get_or_insert_with(MqttSettings::default).topic = topic.clone();
    }

    if let Some(mode) = &args.filegen {
        let filegen = settings
            .filegen
            .get_or_insert_with(FilegenSettings::default);
        filegen.mode = match mode {
            FilegenModeArg::Single => FilegenMode::Single,
            FilegenModeArg::Multi => FilegenMode::Multi,
        };
    }
    if let Some(outfile) = &args.outfile {
        settings
            .filegen
            .get_or_insert_with(FilegenSettings::default)
            .outfile = outfile.clone();
    }
    if let Some(outdir) = &args.outdir {
        settings
            .filegen
            .get_or_insert_with(FilegenSettings::default)
            .outdir = outdir.clone();
    }

    if let Some(types) = &args.nmea_types {
        let parsed: Vec<_> = types
            .split(',')
            .filter_map(tracksim::message::NmeaSentence::parse)
            .collect();
        if parsed.is_empty() {
            warn!(value = %types, "no valid NMEA types in --nmea-types, keeping configured set");
        } else {
            settings.nmea.types = parsed;
        }
    }
    if args.nmea_batch {
        settings.nmea.batch = true;
    }
}

/// Split `host:port`, keeping the fallback port when none is given or it
/// doesn't parse.
fn parse_host_port(value: &str, fallback_port: u16) -> (String, u16) {
    match value.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => {
                warn!(value, fallback_port, "unparseable port, using fallback");
                (host.to_string(), fallback_port)
            }
        },
        None => (value.to_string(), fallback_port),
    }
}
