//! V4L2 camera capture via the `v4l` crate.

use crate::frame::{self, Frame};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::FourCC;

// --- Named constants (no magic numbers) ---
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const CAPTURE_FPS: u32 = 25;
const STREAM_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("permission denied opening {0} (user must be in the video group)")]
    PermissionDenied(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// V4L2 camera device handle.
pub struct Camera {
    device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pub fourcc: FourCC,
}

// Manual impl: `v4l::Device` is not `Debug`.
impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("device_path", &self.device_path)
            .field("fourcc", &self.fourcc)
            .finish_non_exhaustive()
    }
}

impl Camera {
    /// Open a V4L2 camera device by path (e.g., "/dev/video0").
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                CameraError::PermissionDenied(device_path.to_string())
            } else if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        // Query capabilities
        let caps = device.query_caps().map_err(|e| {
            CameraError::CaptureFailed(format!("failed to query capabilities: {e}"))
        })?;

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened camera"
        );

        // Check required capabilities
        let cap_flags = caps.capabilities;
        if !cap_flags.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::StreamingNotSupported);
        }

        // Request YUYV at 1280x720; the negotiated dimensions may differ.
        let mut fmt = device.format().map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to get format: {e}"))
        })?;

        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = DEFAULT_WIDTH;
        fmt.height = DEFAULT_HEIGHT;

        let negotiated = device.set_format(&fmt).map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to set format: {e}"))
        })?;

        if negotiated.fourcc != FourCC::new(b"YUYV") {
            return Err(CameraError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {:?} (need YUYV)",
                negotiated.fourcc
            )));
        }

        match device.set_params(&Parameters::with_fps(CAPTURE_FPS)) {
            Ok(params) => tracing::debug!(interval = ?params.interval, "set frame interval"),
            Err(e) => {
                tracing::warn!(error = %e, "failed to set frame rate, keeping driver default")
            }
        }

        tracing::info!(
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?negotiated.fourcc,
            "negotiated format"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
            device_path: device_path.to_string(),
            fourcc: negotiated.fourcc,
        })
    }

    /// Start a memory-mapped capture stream on this device.
    pub fn start_stream(&self) -> Result<CaptureSession<'_>, CameraError> {
        let stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| {
                CameraError::CaptureFailed(format!("failed to create mmap stream: {e}"))
            })?;

        Ok(CaptureSession {
            camera: self,
            stream,
            started: Instant::now(),
        })
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        for i in 0..16 {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                continue;
            }
            devices.push(DeviceInfo {
                path,
                name: caps.card.clone(),
                driver: caps.driver.clone(),
                bus: caps.bus.clone(),
            });
        }

        devices
    }
}

/// A running capture stream tied to an open camera.
///
/// Dropping the session stops streaming; the camera handle stays open
/// and can start a new session.
pub struct CaptureSession<'a> {
    camera: &'a Camera,
    stream: MmapStream<'a>,
    started: Instant,
}

impl CaptureSession<'_> {
    /// Dequeue the next frame and convert it to RGB.
    pub fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

        let rgb = frame::yuyv_to_rgb(buf, self.camera.width, self.camera.height)
            .map_err(|e| CameraError::CaptureFailed(format!("YUYV conversion failed: {e}")))?;

        Ok(Frame {
            data: rgb,
            width: self.camera.width,
            height: self.camera.height,
            timestamp_ms: self.started.elapsed().as_millis() as u64,
            sequence: meta.sequence,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.camera.width, self.camera.height)
    }
}

/// Check whether a path is an openable V4L2 capture device.
///
/// Used as the availability probe before committing a camera switch.
pub fn is_capture_device(path: &str) -> bool {
    if !Path::new(path).exists() {
        return false;
    }
    let Ok(device) = Device::with_path(path) else {
        return false;
    };
    let Ok(caps) = device.query_caps() else {
        return false;
    };
    caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        let err = Camera::open("/dev/video-nonexistent").unwrap_err();
        assert!(matches!(err, CameraError::DeviceNotFound(_)));
    }

    #[test]
    fn test_probe_missing_device() {
        assert!(!is_capture_device("/dev/video-nonexistent"));
    }
}
