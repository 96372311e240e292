use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use cccd_qr::fields::{ExtractionWorker, FieldExtractor, LocalExtractor};
use cccd_qr::live::{Emission, ImageSequenceCamera, LiveSession, ZoomRange, roi_for_frame};
use cccd_qr::tools::expand_inputs;
use cccd_qr::{LiveConfig, ScanConfig, ScannedRecord, StaticDecode, StaticDecoder};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cccdtool", version, about = "CCCD QR scanning tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode still images (files or directories)
    Scan {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print one JSON object per file
        #[arg(long)]
        json: bool,
    },
    /// Replay a directory of frames through a live session
    Live {
        #[arg(long)]
        frames: PathBuf,
        /// Ticks per second; defaults to `CCCD_TICK_MS`
        #[arg(long)]
        fps: Option<u32>,
        /// Reads per frame, to mimic a card held still
        #[arg(long, default_value_t = 1)]
        hold: u32,
        #[arg(long)]
        zoom: Option<f64>,
        #[arg(long)]
        cooldown_ms: Option<u64>,
    },
    /// Print the still-image region plan and the live ROI for a frame size
    Regions {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CCCD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Scan { paths, json } => scan_cmd(&paths, json),
        Command::Live {
            frames,
            fps,
            hold,
            zoom,
            cooldown_ms,
        } => live_cmd(&frames, fps, hold, zoom, cooldown_ms),
        Command::Regions { width, height } => {
            regions_cmd(width, height);
            ExitCode::SUCCESS
        }
    }
}

#[derive(Serialize)]
struct ScanLine<'a> {
    path: String,
    ok: bool,
    #[serde(flatten)]
    decoded: Option<&'a StaticDecode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a ScannedRecord>,
}

fn scan_cmd(inputs: &[PathBuf], json: bool) -> ExitCode {
    let paths = expand_inputs(inputs);
    if paths.is_empty() {
        eprintln!("No images found");
        return ExitCode::FAILURE;
    }

    let decoder = StaticDecoder::with_config(ScanConfig::from_env());
    let start = Instant::now();
    let outcomes = decoder.decode_batch(&paths);
    let elapsed = start.elapsed();

    let mut found = 0usize;
    for outcome in &outcomes {
        let path = outcome.path.display().to_string();
        match &outcome.result {
            Ok(decoded) => {
                found += 1;
                let record = LocalExtractor
                    .extract(&decoded.payload)
                    .ok()
                    .map(|fields| ScannedRecord {
                        raw: decoded.payload.clone(),
                        fields,
                    });
                if json {
                    print_json(&ScanLine {
                        path,
                        ok: true,
                        decoded: Some(decoded),
                        error: None,
                        record: record.as_ref(),
                    });
                } else {
                    println!("{path}: found via {} ({} attempts)", decoded.strategy.name(), decoded.attempts);
                    if let Some(record) = &record {
                        print_record(record);
                    }
                }
            }
            Err(err) => {
                if json {
                    print_json(&ScanLine {
                        path,
                        ok: false,
                        decoded: None,
                        error: Some(err.to_string()),
                        record: None,
                    });
                } else {
                    println!("{path}: {err}");
                }
            }
        }
    }

    if !json {
        println!(
            "Decoded {found}/{} images in {:.2} ms",
            outcomes.len(),
            elapsed.as_secs_f64() * 1000.0
        );
    }
    if found == 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn live_cmd(frames: &Path, fps: Option<u32>, hold: u32, zoom: Option<f64>, cooldown_ms: Option<u64>) -> ExitCode {
    let mut config = LiveConfig::from_env();
    if zoom.is_some() {
        config.zoom = zoom;
    }
    if let Some(ms) = cooldown_ms {
        config.cooldown = Duration::from_millis(ms);
    }
    if let Some(fps) = fps {
        config.tick_interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    }

    let camera = ImageSequenceCamera::from_dir(frames)
        .hold_frames(hold)
        .with_zoom_range(ZoomRange {
            min: 1.0,
            max: 4.0,
            step: 0.1,
        });
    println!("Replaying {} frames from {}", camera.frame_count(), frames.display());

    let mut session = match LiveSession::open(&camera, config) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let (tx, rx) = crossbeam_channel::unbounded::<Emission>();
    let worker = ExtractionWorker::spawn(LocalExtractor);
    let payloads = worker.sender();
    let printer = thread::spawn(move || {
        for emission in rx {
            println!("Đã quét thành công! ({} bytes)", emission.payload.len());
            if let Some(tx) = &payloads {
                let _ = tx.send(emission.payload);
            }
        }
    });

    let stats = session.run(&tx);
    drop(tx);
    if printer.join().is_err() {
        eprintln!("printer thread panicked");
    }
    let records = worker.finish();
    for record in &records {
        print_record(record);
    }

    println!(
        "ticks={} scans={} detections={} emissions={}",
        stats.ticks, stats.scans, stats.detections, stats.emissions
    );
    ExitCode::SUCCESS
}

fn regions_cmd(width: u32, height: u32) {
    println!("Image {width}x{height}");
    for (strategy, region) in StaticDecoder::<cccd_qr::RqrrDecoder>::plan(width, height) {
        println!("  {:<10} {region}", strategy.name());
    }
    let config = LiveConfig::from_env();
    let roi = roi_for_frame(width, height, config.roi_fraction);
    println!("  live roi   {roi} (fraction {:.2})", config.roi_fraction);
}

fn print_record(record: &ScannedRecord) {
    for field in &record.fields {
        println!("    {}: {}", field.label, field.value);
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(err) => eprintln!("failed to serialize result: {err}"),
    }
}
