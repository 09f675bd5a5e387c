//! Pose landmark estimation via ONNX Runtime.
//!
//! Runs a single-person 33-point pose landmark model (lite/full/heavy
//! variants) and decodes its outputs into normalized image keypoints plus
//! metric world keypoints. Landmark coordinates are de-letterboxed back
//! into source-frame space before normalization, so a keypoint at the
//! center of the camera image decodes to (0.5, 0.5) regardless of aspect
//! ratio.

use crate::landmark::BodyKeypoint;
use crate::types::{Keypoint, WorldKeypoint};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const LANDMARK_INPUT_SIZE: usize = 256;
/// Values per image landmark: x, y, z, visibility logit, presence logit.
const LANDMARK_VALUES: usize = 5;
/// Values per world landmark: x, y, z in meters from the hip midpoint.
const WORLD_VALUES: usize = 3;
const LANDMARK_TENSOR_LEN: usize = BodyKeypoint::COUNT * LANDMARK_VALUES;
const WORLD_TENSOR_LEN: usize = BodyKeypoint::COUNT * WORLD_VALUES;
const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.5;
const DEFAULT_MIN_PRESENCE_CONFIDENCE: f32 = 0.5;
const DEFAULT_MIN_TRACKING_CONFIDENCE: f32 = 0.5;

#[derive(Error, Debug)]
pub enum LandmarkerError {
    #[error("model file not found: {0} (place a pose_landmarker .onnx export in the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Which pose landmark model file to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    Lite,
    #[default]
    Full,
    Heavy,
}

impl ModelVariant {
    pub fn file_name(self) -> &'static str {
        match self {
            ModelVariant::Lite => "pose_landmarker_lite.onnx",
            ModelVariant::Full => "pose_landmarker_full.onnx",
            ModelVariant::Heavy => "pose_landmarker_heavy.onnx",
        }
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lite" => Ok(ModelVariant::Lite),
            "full" => Ok(ModelVariant::Full),
            "heavy" => Ok(ModelVariant::Heavy),
            other => Err(format!("unknown model variant: {other} (expected lite, full or heavy)")),
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModelVariant::Lite => "lite",
            ModelVariant::Full => "full",
            ModelVariant::Heavy => "heavy",
        };
        f.write_str(name)
    }
}

/// Requested inference backend.
///
/// Gpu is accepted everywhere a delegate is configured, but this build
/// registers no GPU execution provider: the request is logged and the
/// session runs on CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delegate {
    #[default]
    Cpu,
    Gpu,
}

impl std::str::FromStr for Delegate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Delegate::Cpu),
            "gpu" => Ok(Delegate::Gpu),
            other => Err(format!("unknown delegate: {other} (expected cpu or gpu)")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LandmarkerOptions {
    pub variant: ModelVariant,
    pub delegate: Delegate,
    pub min_pose_detection_confidence: f32,
    pub min_pose_presence_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for LandmarkerOptions {
    fn default() -> Self {
        Self {
            variant: ModelVariant::default(),
            delegate: Delegate::default(),
            min_pose_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_pose_presence_confidence: DEFAULT_MIN_PRESENCE_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
        }
    }
}

/// One frame's decoded pose.
#[derive(Debug, Clone)]
pub struct PoseResult {
    /// Normalized image-space keypoints, landmark order, 33 entries.
    pub keypoints: Vec<Keypoint>,
    /// Metric world-space keypoints, landmark order, 33 entries.
    pub world_keypoints: Vec<WorldKeypoint>,
    /// Pose presence score after sigmoid.
    pub score: f32,
}

/// Metadata for coordinate de-mapping after letterbox resize.
struct LetterboxInfo {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Output tensor indices: (landmarks, world_landmarks, score).
type OutputIndices = (usize, usize, usize);

/// ONNX-backed 33-point pose landmarker.
pub struct PoseLandmarker {
    session: Session,
    options: LandmarkerOptions,
    /// Discovered by name at load time; falls back to positional ordering.
    output_indices: OutputIndices,
    /// True while the previous frame cleared the confidence gate.
    tracking: bool,
}

impl PoseLandmarker {
    /// Load a pose landmark ONNX model from the given path.
    pub fn load(model_path: &str, options: LandmarkerOptions) -> Result<Self, LandmarkerError> {
        if !Path::new(model_path).exists() {
            return Err(LandmarkerError::ModelNotFound(model_path.to_string()));
        }

        if options.delegate == Delegate::Gpu {
            tracing::warn!("gpu delegate requested but no gpu execution provider is compiled in, running on cpu");
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();
        let num_outputs = output_names.len();

        tracing::info!(
            path = model_path,
            variant = %options.variant,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?output_names,
            "loaded pose landmark model"
        );

        if num_outputs < 3 {
            return Err(LandmarkerError::InferenceFailed(format!(
                "pose landmark model requires 3 outputs (landmarks/world_landmarks/score), got {num_outputs}"
            )));
        }

        let output_indices = discover_output_indices(&output_names);
        tracing::debug!(?output_indices, "pose landmark output tensor mapping");

        Ok(Self {
            session,
            options,
            output_indices,
            tracking: false,
        })
    }

    /// Run the model on one RGB frame.
    ///
    /// Returns `Ok(None)` when no pose clears the confidence gate or the
    /// model emitted a short tensor; such frames are skipped without
    /// surfacing an error. `Err` is reserved for inference infrastructure
    /// failures.
    pub fn detect(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<PoseResult>, LandmarkerError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(LandmarkerError::InferenceFailed(format!(
                "frame buffer is {} bytes, expected {expected} for {width}x{height} RGB",
                rgb.len()
            )));
        }

        let (input, letterbox) = preprocess(rgb, width as usize, height as usize);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (landmarks_idx, world_idx, score_idx) = self.output_indices;

        let (_, score_raw) = outputs[score_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| LandmarkerError::InferenceFailed(format!("score tensor: {e}")))?;
        let Some(&score_logit) = score_raw.first() else {
            tracing::debug!("empty score tensor, frame skipped");
            self.tracking = false;
            return Ok(None);
        };
        let score = sigmoid(score_logit);

        let emit = gate_decision(score, self.tracking, &self.options);
        self.tracking = emit;
        if !emit {
            return Ok(None);
        }

        let (_, landmarks_raw) = outputs[landmarks_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| LandmarkerError::InferenceFailed(format!("landmarks tensor: {e}")))?;
        let (_, world_raw) = outputs[world_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| LandmarkerError::InferenceFailed(format!("world landmarks tensor: {e}")))?;

        let Some(keypoints) =
            decode_landmarks(landmarks_raw, &letterbox, width as usize, height as usize)
        else {
            tracing::debug!(len = landmarks_raw.len(), "short landmark tensor, frame skipped");
            return Ok(None);
        };
        let Some(world_keypoints) = decode_world(world_raw) else {
            tracing::debug!(len = world_raw.len(), "short world landmark tensor, frame skipped");
            return Ok(None);
        };

        Ok(Some(PoseResult {
            keypoints,
            world_keypoints,
            score,
        }))
    }
}

/// Decide whether a frame's pose score clears the confidence gates.
///
/// Acquisition uses the detection threshold; a pose that is already being
/// tracked only needs the tracking threshold to keep emitting. The
/// presence threshold applies in both states.
fn gate_decision(score: f32, tracking: bool, options: &LandmarkerOptions) -> bool {
    let gate = if tracking {
        options.min_tracking_confidence
    } else {
        options.min_pose_detection_confidence
    };
    score >= gate && score >= options.min_pose_presence_confidence
}

/// Discover output tensor ordering by name.
///
/// Our model exports name the tensors "landmarks", "world_landmarks" and
/// "score". Converted models with generic names ("Identity", "Identity_1",
/// ...) fall back to that positional ordering.
fn discover_output_indices(names: &[String]) -> OutputIndices {
    let find = |target: &str| names.iter().position(|n| n == target);

    match (find("landmarks"), find("world_landmarks"), find("score")) {
        (Some(landmarks), Some(world), Some(score)) => {
            tracing::info!("pose landmark model: using name-based output tensor mapping");
            (landmarks, world, score)
        }
        _ => {
            tracing::info!(
                ?names,
                "pose landmark model: output names not recognized, using positional mapping [0]=landmarks, [1]=world_landmarks, [2]=score"
            );
            (0, 1, 2)
        }
    }
}

/// Preprocess an RGB frame into a NCHW float tensor with letterbox padding.
///
/// Resizes with bilinear interpolation, normalizes to [0, 1] and centers
/// the image in a 256x256 square. Padding stays at 0.0 (black).
fn preprocess(rgb: &[u8], width: usize, height: usize) -> (Array4<f32>, LetterboxInfo) {
    let input = LANDMARK_INPUT_SIZE;
    let scale_w = input as f32 / width as f32;
    let scale_h = input as f32 / height as f32;
    let scale = scale_w.min(scale_h);

    let new_w = (width as f32 * scale).round() as usize;
    let new_h = (height as f32 * scale).round() as usize;
    let pad_x = (input - new_w) as f32 / 2.0;
    let pad_y = (input - new_h) as f32 / 2.0;

    let x_start = pad_x.floor() as usize;
    let y_start = pad_y.floor() as usize;

    let mut tensor = Array4::<f32>::zeros((1, 3, input, input));
    let inv_scale = 1.0 / scale;

    for y in 0..new_h {
        let src_y = (y as f32 + 0.5) * inv_scale - 0.5;
        let y0 = (src_y.floor() as i32).clamp(0, height as i32 - 1) as usize;
        let y1 = (y0 + 1).min(height - 1);
        let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

        for x in 0..new_w {
            let src_x = (x as f32 + 0.5) * inv_scale - 0.5;
            let x0 = (src_x.floor() as i32).clamp(0, width as i32 - 1) as usize;
            let x1 = (x0 + 1).min(width - 1);
            let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

            for c in 0..3 {
                let tl = rgb[(y0 * width + x0) * 3 + c] as f32;
                let tr = rgb[(y0 * width + x1) * 3 + c] as f32;
                let bl = rgb[(y1 * width + x0) * 3 + c] as f32;
                let br = rgb[(y1 * width + x1) * 3 + c] as f32;

                let val = tl * (1.0 - fx) * (1.0 - fy)
                    + tr * fx * (1.0 - fy)
                    + bl * (1.0 - fx) * fy
                    + br * fx * fy;

                tensor[[0, c, y_start + y, x_start + x]] = val / 255.0;
            }
        }
    }

    (tensor, LetterboxInfo { scale, pad_x, pad_y })
}

/// Decode the [1, 165] landmark tensor into normalized keypoints.
///
/// Model coordinates are pixels in the letterboxed input square; they are
/// mapped back through the letterbox into source-frame space and divided
/// by the frame dimensions. Returns `None` when the tensor is too short.
fn decode_landmarks(
    raw: &[f32],
    letterbox: &LetterboxInfo,
    src_width: usize,
    src_height: usize,
) -> Option<Vec<Keypoint>> {
    if raw.len() < LANDMARK_TENSOR_LEN {
        return None;
    }

    let mut keypoints = Vec::with_capacity(BodyKeypoint::COUNT);
    for i in 0..BodyKeypoint::COUNT {
        let base = i * LANDMARK_VALUES;
        let x_px = raw[base];
        let y_px = raw[base + 1];
        let z_px = raw[base + 2];

        keypoints.push(Keypoint {
            x: (x_px - letterbox.pad_x) / letterbox.scale / src_width as f32,
            y: (y_px - letterbox.pad_y) / letterbox.scale / src_height as f32,
            // z shares the x scale: roughly same units as x, origin at the hips.
            z: z_px / letterbox.scale / src_width as f32,
            visibility: Some(sigmoid(raw[base + 3])),
            presence: Some(sigmoid(raw[base + 4])),
        });
    }

    Some(keypoints)
}

/// Decode the [1, 99] world landmark tensor. Returns `None` when short.
fn decode_world(raw: &[f32]) -> Option<Vec<WorldKeypoint>> {
    if raw.len() < WORLD_TENSOR_LEN {
        return None;
    }

    let world = (0..BodyKeypoint::COUNT)
        .map(|i| {
            let base = i * WORLD_VALUES;
            WorldKeypoint {
                x: raw[base],
                y: raw[base + 1],
                z: raw[base + 2],
            }
        })
        .collect();

    Some(world)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Default directory scanned for model files.
pub fn default_model_dir() -> PathBuf {
    PathBuf::from("/usr/share/stance/models")
}
