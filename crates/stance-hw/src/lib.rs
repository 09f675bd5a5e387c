//! stance-hw: camera capture and hardware abstraction.
//!
//! V4L2 capture with YUYV to RGB conversion, the camera facing state
//! machine and a synthetic frame source for camera-free development.

pub mod camera;
pub mod facing;
pub mod frame;
pub mod source;

pub use camera::{is_capture_device, Camera, CameraError, CaptureSession, DeviceInfo};
pub use facing::{Facing, FacingState};
pub use frame::{flip_horizontal, Frame};
pub use source::{FrameSource, SyntheticSource};
