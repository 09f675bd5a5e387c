//! stance-core: pose landmark estimation engine.
//!
//! Runs a 33-point pose landmark model via ONNX Runtime and turns its
//! output into typed keypoints, skeleton connections and viewport
//! overlay geometry. Hardware-free: RGB buffers in, landmark data out.

pub mod landmark;
pub mod landmarker;
pub mod overlay;
pub mod skeleton;
pub mod throttle;
pub mod types;

pub use landmark::BodyKeypoint;
pub use landmarker::{
    default_model_dir, Delegate, LandmarkerError, LandmarkerOptions, ModelVariant, PoseLandmarker,
    PoseResult,
};
pub use overlay::{FitMode, Overlay, OverlayParams, Rotation};
pub use skeleton::{connections_for, BodyPartFilter, Connection};
pub use throttle::EventThrottle;
pub use types::{FrameMetadata, Keypoint, LandmarkEvent, WorldKeypoint};
