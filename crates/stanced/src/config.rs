use stance_core::{Delegate, FitMode, LandmarkerOptions, ModelVariant, Rotation};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration, loaded from environment variables with an
/// optional TOML file on top.
pub struct Config {
    /// V4L2 device path for the front camera (default: /dev/video0).
    pub front_device: String,
    /// V4L2 device path for the back camera (default: /dev/video1).
    pub back_device: String,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    pub model_variant: ModelVariant,
    pub delegate: Delegate,
    pub min_detection_confidence: f32,
    pub min_presence_confidence: f32,
    pub min_tracking_confidence: f32,
    /// Landmark signal rate cap in events per second; 0 disables the cap.
    pub events_per_second: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub fit_mode: FitMode,
    pub rotation: Rotation,
    /// Whether pose streaming starts enabled.
    pub pose_enabled: bool,
    /// Number of warmup frames to discard at startup (camera AGC/AE stabilization).
    pub warmup_frames: usize,
    /// Use the synthetic frame source instead of real cameras.
    pub synthetic: bool,
}

impl Config {
    /// Load configuration: `STANCE_*` environment variables, then the
    /// TOML file named in `STANCE_CONFIG` when set.
    ///
    /// An unreadable or invalid file is logged and skipped, never fatal.
    pub fn load() -> Self {
        let mut config = Self::from_env();
        if let Ok(path) = std::env::var("STANCE_CONFIG") {
            match FileConfig::read(&path) {
                Ok(file) => {
                    tracing::info!(path = %path, "applying config file");
                    file.apply(&mut config);
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "config file ignored");
                }
            }
        }
        config
    }

    /// Load configuration from `STANCE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("STANCE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| stance_core::default_model_dir());

        Self {
            front_device: std::env::var("STANCE_FRONT_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            back_device: std::env::var("STANCE_BACK_DEVICE")
                .unwrap_or_else(|_| "/dev/video1".to_string()),
            model_dir,
            model_variant: env_parsed("STANCE_MODEL", ModelVariant::default()),
            delegate: env_parsed("STANCE_DELEGATE", Delegate::default()),
            min_detection_confidence: env_f32("STANCE_MIN_DETECTION_CONFIDENCE", 0.5),
            min_presence_confidence: env_f32("STANCE_MIN_PRESENCE_CONFIDENCE", 0.5),
            min_tracking_confidence: env_f32("STANCE_MIN_TRACKING_CONFIDENCE", 0.5),
            events_per_second: env_f64("STANCE_EVENTS_PER_SECOND", 0.0),
            viewport_width: env_u32("STANCE_VIEWPORT_WIDTH", 720),
            viewport_height: env_u32("STANCE_VIEWPORT_HEIGHT", 1280),
            fit_mode: env_parsed("STANCE_FIT_MODE", FitMode::Cover),
            rotation: std::env::var("STANCE_ROTATION")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .and_then(Rotation::from_degrees)
                .unwrap_or(Rotation::Deg0),
            pose_enabled: std::env::var("STANCE_POSE_ENABLED")
                .map(|v| v != "0")
                .unwrap_or(true),
            warmup_frames: env_usize("STANCE_WARMUP_FRAMES", 4),
            synthetic: std::env::var("STANCE_SYNTHETIC")
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }

    /// Path to the configured pose landmark model file.
    pub fn model_path(&self) -> String {
        self.model_dir
            .join(self.model_variant.file_name())
            .to_string_lossy()
            .into_owned()
    }

    pub fn landmarker_options(&self) -> LandmarkerOptions {
        LandmarkerOptions {
            variant: self.model_variant,
            delegate: self.delegate,
            min_pose_detection_confidence: self.min_detection_confidence,
            min_pose_presence_confidence: self.min_presence_confidence,
            min_tracking_confidence: self.min_tracking_confidence,
        }
    }
}

/// TOML file shape: every key optional, unset keys keep the environment
/// (or built-in) value. Rotation is written in degrees.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct FileConfig {
    front_device: Option<String>,
    back_device: Option<String>,
    model_dir: Option<PathBuf>,
    model: Option<ModelVariant>,
    delegate: Option<Delegate>,
    min_detection_confidence: Option<f32>,
    min_presence_confidence: Option<f32>,
    min_tracking_confidence: Option<f32>,
    events_per_second: Option<f64>,
    viewport_width: Option<u32>,
    viewport_height: Option<u32>,
    fit_mode: Option<FitMode>,
    rotation: Option<u32>,
    pose_enabled: Option<bool>,
    warmup_frames: Option<usize>,
    synthetic: Option<bool>,
}

impl FileConfig {
    fn read(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    fn apply(self, config: &mut Config) {
        if let Some(v) = self.front_device {
            config.front_device = v;
        }
        if let Some(v) = self.back_device {
            config.back_device = v;
        }
        if let Some(v) = self.model_dir {
            config.model_dir = v;
        }
        if let Some(v) = self.model {
            config.model_variant = v;
        }
        if let Some(v) = self.delegate {
            config.delegate = v;
        }
        if let Some(v) = self.min_detection_confidence {
            config.min_detection_confidence = v;
        }
        if let Some(v) = self.min_presence_confidence {
            config.min_presence_confidence = v;
        }
        if let Some(v) = self.min_tracking_confidence {
            config.min_tracking_confidence = v;
        }
        if let Some(v) = self.events_per_second {
            config.events_per_second = v;
        }
        if let Some(v) = self.viewport_width {
            config.viewport_width = v;
        }
        if let Some(v) = self.viewport_height {
            config.viewport_height = v;
        }
        if let Some(v) = self.fit_mode {
            config.fit_mode = v;
        }
        if let Some(degrees) = self.rotation {
            match Rotation::from_degrees(degrees) {
                Some(rotation) => config.rotation = rotation,
                None => {
                    tracing::warn!(degrees, "invalid rotation in config file, keeping current")
                }
            }
        }
        if let Some(v) = self.pose_enabled {
            config.pose_enabled = v;
        }
        if let Some(v) = self.warmup_frames {
            config.warmup_frames = v;
        }
        if let Some(v) = self.synthetic {
            config.synthetic = v;
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_overrides_apply() {
        let file: FileConfig = toml::from_str(
            r#"
            front_device = "/dev/video5"
            model = "heavy"
            fit_mode = "contain"
            rotation = 90
            events_per_second = 10.0
            pose_enabled = false
            "#,
        )
        .unwrap();

        let mut config = Config::from_env();
        file.apply(&mut config);

        assert_eq!(config.front_device, "/dev/video5");
        assert_eq!(config.model_variant, ModelVariant::Heavy);
        assert_eq!(config.fit_mode, FitMode::Contain);
        assert_eq!(config.rotation, Rotation::Deg90);
        assert!((config.events_per_second - 10.0).abs() < f64::EPSILON);
        assert!(!config.pose_enabled);
    }

    #[test]
    fn test_file_partial_keeps_rest() {
        let file: FileConfig = toml::from_str(r#"back_device = "/dev/video9""#).unwrap();

        let mut config = Config::from_env();
        let front_before = config.front_device.clone();
        let variant_before = config.model_variant;
        file.apply(&mut config);

        assert_eq!(config.back_device, "/dev/video9");
        assert_eq!(config.front_device, front_before);
        assert_eq!(config.model_variant, variant_before);
    }

    #[test]
    fn test_file_invalid_rotation_kept_out() {
        let file: FileConfig = toml::from_str("rotation = 45").unwrap();
        let mut config = Config::from_env();
        let before = config.rotation;
        file.apply(&mut config);
        assert_eq!(config.rotation, before);
    }

    #[test]
    fn test_model_path_joins_variant() {
        let mut config = Config::from_env();
        config.model_dir = PathBuf::from("/opt/models");
        config.model_variant = ModelVariant::Lite;
        assert_eq!(config.model_path(), "/opt/models/pose_landmarker_lite.onnx");
    }
}
