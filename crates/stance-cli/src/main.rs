use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stance_core::{
    BodyKeypoint, BodyPartFilter, LandmarkEvent, LandmarkerOptions, ModelVariant, PoseLandmarker,
};
use stance_hw::Camera;

// `#[zbus::proxy]` generates both `StanceProxy` (async) and
// `StanceProxyBlocking`; only the blocking variant is used here.
#[zbus::proxy(
    interface = "org.freedesktop.Stance1",
    default_service = "org.freedesktop.Stance1",
    default_path = "/org/freedesktop/Stance1"
)]
trait Stance {
    async fn switch_camera(&self) -> zbus::Result<String>;
    async fn set_filter(&self, filter: &str) -> zbus::Result<()>;
    async fn set_event_rate(&self, events_per_second: f64) -> zbus::Result<()>;
    async fn set_pose_enabled(&self, enabled: bool) -> zbus::Result<()>;
    async fn set_viewport(&self, width: u32, height: u32) -> zbus::Result<()>;
    async fn set_fit_mode(&self, fit: &str) -> zbus::Result<()>;
    async fn set_rotation(&self, degrees: u32) -> zbus::Result<()>;
    async fn status(&self) -> zbus::Result<String>;
    async fn overlay(&self) -> zbus::Result<String>;

    #[zbus(signal)]
    fn landmark(&self, payload: String) -> zbus::Result<()>;
}

#[derive(Parser)]
#[command(name = "stance", about = "Stance pose streaming CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscribe to landmark events and print them
    Stream {
        /// Print raw JSON payloads instead of one-line summaries
        #[arg(long)]
        json: bool,
    },
    /// Toggle between the front and back camera
    SwitchCamera,
    /// Show daemon status
    Status,
    /// Print the most recent overlay geometry
    Overlay,
    /// Choose which body part connections are drawn
    SetFilter {
        /// Show only these parts, hiding everything else (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Hide these parts, keeping the rest (comma-separated)
        #[arg(long, value_delimiter = ',')]
        hide: Vec<String>,
    },
    /// Cap the outbound event rate
    SetRate {
        /// Events per second; 0 disables throttling
        events_per_second: f64,
    },
    /// Enable or disable pose streaming
    Pose {
        /// "on" or "off"
        state: String,
    },
    /// Set the overlay viewport geometry
    Viewport {
        /// Viewport width in pixels
        width: u32,
        /// Viewport height in pixels
        height: u32,
        /// Fit mode: contain or cover
        #[arg(long)]
        fit: Option<String>,
        /// Rotation in degrees: 0, 90, 180 or 270
        #[arg(long)]
        rotation: Option<u32>,
    },
    /// List available capture devices
    Devices,
    /// Run pose detection on an image file (bypasses the daemon)
    Detect {
        /// Path to the image
        image: PathBuf,
        /// Directory containing pose landmark models
        #[arg(long, default_value = "/usr/share/stance/models")]
        model_dir: PathBuf,
        /// Model variant: lite, full or heavy
        #[arg(long, default_value = "full")]
        model: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stream { json } => stream(json)?,
        Commands::SwitchCamera => {
            let facing = daemon_proxy()?.switch_camera()?;
            println!("active camera: {facing}");
        }
        Commands::Status => {
            let raw = daemon_proxy()?.status()?;
            print_pretty_json(&raw)?;
        }
        Commands::Overlay => {
            let raw = daemon_proxy()?.overlay()?;
            print_pretty_json(&raw)?;
        }
        Commands::SetFilter { only, hide } => set_filter(&only, &hide)?,
        Commands::SetRate { events_per_second } => {
            daemon_proxy()?.set_event_rate(events_per_second)?;
            println!("event rate set to {events_per_second}/s");
        }
        Commands::Pose { state } => {
            let enabled = match state.as_str() {
                "on" => true,
                "off" => false,
                other => bail!("expected \"on\" or \"off\", got {other}"),
            };
            daemon_proxy()?.set_pose_enabled(enabled)?;
            println!("pose streaming {state}");
        }
        Commands::Viewport {
            width,
            height,
            fit,
            rotation,
        } => {
            let proxy = daemon_proxy()?;
            proxy.set_viewport(width, height)?;
            if let Some(fit) = &fit {
                proxy.set_fit_mode(fit)?;
            }
            if let Some(degrees) = rotation {
                proxy.set_rotation(degrees)?;
            }
            println!("viewport set to {width}x{height}");
        }
        Commands::Devices => devices(),
        Commands::Detect {
            image,
            model_dir,
            model,
            json,
        } => detect(&image, &model_dir, &model, json)?,
    }

    Ok(())
}

/// Connect to the session bus and build a blocking proxy for stanced.
fn daemon_proxy() -> Result<StanceProxyBlocking<'static>> {
    let conn =
        zbus::blocking::Connection::session().context("failed to connect to the session bus")?;
    let proxy = StanceProxyBlocking::new(&conn)
        .context("failed to create stanced proxy (is stanced running?)")?;
    Ok(proxy)
}

/// Block on the Landmark signal and print every payload.
fn stream(json: bool) -> Result<()> {
    let proxy = daemon_proxy()?;
    let signals = proxy.receive_landmark()?;
    eprintln!("listening for landmark events, ctrl-c to stop");

    for signal in signals {
        let args = signal.args()?;
        let payload = args.payload();
        if json {
            println!("{payload}");
            continue;
        }
        match serde_json::from_str::<LandmarkEvent>(payload) {
            Ok(event) => print_event_summary(&event),
            Err(_) => println!("{payload}"),
        }
    }

    Ok(())
}

fn print_event_summary(event: &LandmarkEvent) {
    let meta = &event.additional_data;
    match event.landmarks.first() {
        Some(nose) => println!(
            "frame {:>6}  {} landmarks  nose ({:.3}, {:.3})  pts {} ms",
            meta.frame_number,
            event.landmarks.len(),
            nose.x,
            nose.y,
            meta.presentation_time_stamp
        ),
        None => println!("frame {:>6}  0 landmarks", meta.frame_number),
    }
}

fn print_pretty_json(raw: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("daemon returned malformed JSON")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Build a body part filter from --only/--hide lists and send it.
fn set_filter(only: &[String], hide: &[String]) -> Result<()> {
    let mut filter = if only.is_empty() {
        BodyPartFilter::default()
    } else {
        BodyPartFilter::none()
    };
    for name in only {
        *part_toggle(&mut filter, name)? = true;
    }
    for name in hide {
        *part_toggle(&mut filter, name)? = false;
    }

    let payload = serde_json::to_string(&filter)?;
    daemon_proxy()?.set_filter(&payload)?;
    println!("filter updated: {payload}");
    Ok(())
}

fn part_toggle<'a>(filter: &'a mut BodyPartFilter, name: &str) -> Result<&'a mut bool> {
    let field = match name {
        "face" => &mut filter.face,
        "left-arm" => &mut filter.left_arm,
        "right-arm" => &mut filter.right_arm,
        "left-wrist" => &mut filter.left_wrist,
        "right-wrist" => &mut filter.right_wrist,
        "torso" => &mut filter.torso,
        "left-leg" => &mut filter.left_leg,
        "right-leg" => &mut filter.right_leg,
        "left-ankle" => &mut filter.left_ankle,
        "right-ankle" => &mut filter.right_ankle,
        other => bail!(
            "unknown body part: {other} (expected face, left-arm, right-arm, left-wrist, \
             right-wrist, torso, left-leg, right-leg, left-ankle or right-ankle)"
        ),
    };
    Ok(field)
}

fn devices() {
    let devices = Camera::list_devices();
    if devices.is_empty() {
        println!("no capture devices found");
        return;
    }
    for dev in devices {
        println!(
            "{:<14} {:<32} driver {:<12} bus {}",
            dev.path, dev.name, dev.driver, dev.bus
        );
    }
}

/// One-shot detection on a still image, without the daemon.
fn detect(image_path: &Path, model_dir: &Path, model: &str, json: bool) -> Result<()> {
    let variant: ModelVariant = model.parse().map_err(anyhow::Error::msg)?;
    let model_path = model_dir.join(variant.file_name());
    let model_path = model_path.to_str().context("model path is not valid UTF-8")?;

    let img = image::open(image_path)
        .with_context(|| format!("failed to open {}", image_path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    tracing::debug!(width, height, "loaded image");

    let options = LandmarkerOptions {
        variant,
        ..Default::default()
    };
    let mut landmarker = PoseLandmarker::load(model_path, options)?;

    let Some(result) = landmarker.detect(img.as_raw(), width, height)? else {
        println!("no pose detected");
        return Ok(());
    };

    if json {
        let value = serde_json::json!({
            "score": result.score,
            "landmarks": result.keypoints,
            "worldLandmarks": result.world_keypoints,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("pose detected, score {:.3}", result.score);
    for (i, kp) in result.keypoints.iter().enumerate() {
        let name = BodyKeypoint::from_index(i).map_or("?", |k| k.name());
        println!(
            "  {i:>2} {name:<18} ({:+.3}, {:+.3}, {:+.3})  visibility {:.2}",
            kp.x,
            kp.y,
            kp.z,
            kp.visibility.unwrap_or(0.0)
        );
    }
    Ok(())
}
