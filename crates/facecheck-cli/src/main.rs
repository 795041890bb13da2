use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facecheck_core::{detect_presence, DetectionResult, FixedIncrement, RandomIncrement};
use facecheck_hw::{CameraDevice, FrameSampler, StreamRequest, SyntheticCamera, V4lCamera};
use facecheck_verify::{FacialVerification, Notice, NoticeKind, Notifier, RunOutcome};
use std::path::{Path, PathBuf};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "facecheck", about = "facecheck facial presence verification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a facial verification scan until complete or Ctrl-C
    Scan {
        /// Camera device path (overrides FACECHECK_CAMERA_DEVICE)
        #[arg(short, long)]
        device: Option<String>,
        /// Use a synthetic camera with a face in view
        #[arg(long)]
        synthetic: bool,
        /// Seed the progress increments for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Add a fixed amount per tick instead of a random one
        #[arg(long, conflicts_with = "seed")]
        step: Option<f64>,
    },
    /// Run the skin-tone detector on an image file
    Detect {
        /// Image to scan (PNG, JPEG, ...)
        image: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Capture one camera frame and report the detection
    Probe {
        /// Camera device path (overrides FACECHECK_CAMERA_DEVICE)
        #[arg(short, long)]
        device: Option<String>,
        /// Use a synthetic camera with a face in view
        #[arg(long)]
        synthetic: bool,
    },
    /// List video capture devices
    Devices,
}

/// Prints notices to stderr so they show regardless of the log filter.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let marker = match notice.kind {
            NoticeKind::Info => "*",
            NoticeKind::Success => "+",
            NoticeKind::Error => "!",
        };
        eprintln!("[{marker}] {}: {}", notice.title, notice.description);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Scan {
            device,
            synthetic,
            seed,
            step,
        } => {
            let seed = seed.or(config.rng_seed);
            if synthetic {
                scan(SyntheticCamera::new().with_centered_face(), &config, seed, step).await
            } else {
                let path = device.unwrap_or_else(|| config.camera_device.clone());
                scan(V4lCamera::new(path), &config, seed, step).await
            }
        }
        Commands::Detect { image, json } => detect(&image, json),
        Commands::Probe { device, synthetic } => {
            let request = config.stream_request();
            if synthetic {
                probe(SyntheticCamera::new().with_centered_face(), request)
            } else {
                let path = device.unwrap_or_else(|| config.camera_device.clone());
                probe(V4lCamera::new(path), request)
            }
        }
        Commands::Devices => {
            let devices = V4lCamera::list_devices();
            if devices.is_empty() {
                println!("No video capture devices found");
            }
            for d in devices {
                println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
            }
            Ok(())
        }
    }
}

async fn scan<C: CameraDevice>(
    camera: C,
    config: &Config,
    seed: Option<u64>,
    step: Option<f64>,
) -> Result<()> {
    let mut verification = FacialVerification::new(camera, config.verify_config(), || {
        println!("Identity verified");
    })
    .with_notifier(TerminalNotifier);

    verification = match (step, seed) {
        (Some(step), _) => verification.with_increments(FixedIncrement(step)),
        (None, Some(seed)) => verification.with_increments(RandomIncrement::seeded(seed)),
        (None, None) => verification,
    };

    let cancel = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    match verification.run(cancel).await? {
        RunOutcome::Verified => Ok(()),
        RunOutcome::Cancelled => {
            println!("Scan cancelled at {}", verification.view().status);
            Ok(())
        }
    }
}

fn detect(path: &Path, json: bool) -> Result<()> {
    report(&detect_file(path)?, json)
}

fn detect_file(path: &Path) -> Result<DetectionResult> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(detect_presence(img.as_raw(), width, height))
}

fn probe<C: CameraDevice>(camera: C, request: StreamRequest) -> Result<()> {
    let mut sampler = FrameSampler::new(camera, request);
    sampler.start().context("failed to start camera")?;
    let frame = sampler
        .capture_frame()
        .context("camera produced no frame")?;
    sampler.stop();

    println!(
        "frame: {}x{} seq={} brightness={:.1}",
        frame.width,
        frame.height,
        frame.sequence,
        frame.avg_brightness()
    );
    report(&detect_presence(&frame.data, frame.width, frame.height), false)
}

fn report(result: &DetectionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!(
        "skin coverage: {:.2}% ({} of {} pixels)",
        result.coverage * 100.0,
        result.skin_pixels,
        result.total_pixels
    );
    match result.bounding_box {
        Some(b) if result.present => println!(
            "face present: box x={} y={} width={} height={}",
            b.x, b.y, b.width, b.height
        ),
        _ => println!("no face detected"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecheck_core::BoundingBox;
    use image::{Rgba, RgbaImage};

    fn fast_config() -> Config {
        Config {
            camera_device: "/dev/null".into(),
            frame_width: 64,
            frame_height: 48,
            poll_interval_ms: 1,
            grace_period_ms: 0,
            rng_seed: None,
        }
    }

    #[test]
    fn test_detect_file_finds_square() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        let img = RgbaImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Rgba([200, 150, 120, 255])
            } else {
                Rgba([90, 90, 90, 255])
            }
        });
        img.save(&path).unwrap();

        let result = detect_file(&path).unwrap();
        assert!(result.present);
        assert_eq!(result.skin_pixels, 100);
        assert_eq!(
            result.bounding_box,
            Some(BoundingBox {
                x: 5,
                y: 5,
                width: 9,
                height: 9
            })
        );
        assert!(detect(&path, true).is_ok());
    }

    #[test]
    fn test_detect_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = detect_file(&dir.path().join("missing.png")).unwrap_err();
        assert!(err.to_string().contains("failed to open image"));
    }

    #[test]
    fn test_report_absent() {
        assert!(report(&DetectionResult::absent(), false).is_ok());
        assert!(report(&DetectionResult::absent(), true).is_ok());
    }

    #[test]
    fn test_probe_synthetic() {
        let camera = SyntheticCamera::new().with_centered_face();
        assert!(probe(camera.clone(), fast_config().stream_request()).is_ok());
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_probe_denied_camera_errors() {
        let camera = SyntheticCamera::new().deny_permission();
        let err = probe(camera, fast_config().stream_request()).unwrap_err();
        assert!(err.to_string().contains("failed to start camera"));
    }

    #[tokio::test]
    async fn test_scan_synthetic_completes() {
        let camera = SyntheticCamera::new().with_centered_face();
        scan(camera.clone(), &fast_config(), None, Some(50.0))
            .await
            .unwrap();
        assert_eq!(camera.acquisitions(), 1);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn test_scan_without_device_errors() {
        let camera = SyntheticCamera::new().without_device();
        assert!(scan(camera, &fast_config(), Some(7), None).await.is_err());
    }
}
