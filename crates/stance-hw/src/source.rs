//! Frame source abstraction over live capture and synthetic frames.

use crate::camera::{CameraError, CaptureSession, CAPTURE_FPS};
use crate::frame::Frame;
use std::time::{Duration, Instant};

/// Anything the capture loop can pull frames from.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
    fn dimensions(&self) -> (u32, u32);
}

impl FrameSource for CaptureSession<'_> {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        CaptureSession::next_frame(self)
    }

    fn dimensions(&self) -> (u32, u32) {
        CaptureSession::dimensions(self)
    }
}

/// Deterministic frame generator for development without a camera.
///
/// Produces a horizontal gradient that scrolls with the sequence number,
/// paced at the capture frame rate.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    sequence: u32,
    started: Instant,
    frame_interval: Duration,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_interval(width, height, Duration::from_millis(1000 / CAPTURE_FPS as u64))
    }

    /// Unpaced constructor; a zero interval skips the inter-frame sleep.
    pub fn with_interval(width: u32, height: u32, frame_interval: Duration) -> Self {
        Self {
            width,
            height,
            sequence: 0,
            started: Instant::now(),
            frame_interval,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let seq = self.sequence;

        let mut data = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                data.push(((x + seq as usize) % 256) as u8);
                data.push(((y * 256) / h.max(1)) as u8);
                data.push(128);
            }
        }

        let frame = Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp_ms: self.started.elapsed().as_millis() as u64,
            sequence: seq,
        };
        self.sequence = self.sequence.wrapping_add(1);

        Ok(frame)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frame_shape() {
        let mut source = SyntheticSource::with_interval(64, 48, Duration::ZERO);
        assert_eq!(source.dimensions(), (64, 48));

        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.data.len(), 64 * 48 * 3);
    }

    #[test]
    fn test_synthetic_sequence_increments() {
        let mut source = SyntheticSource::with_interval(8, 8, Duration::ZERO);
        let first = source.next_frame().unwrap();
        let second = source.next_frame().unwrap();
        let third = source.next_frame().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(third.sequence, 2);
        // Scrolling gradient: consecutive frames differ.
        assert_ne!(first.data, second.data);
    }

    #[test]
    fn test_synthetic_timestamps_nondecreasing() {
        let mut source = SyntheticSource::with_interval(8, 8, Duration::ZERO);
        let a = source.next_frame().unwrap().timestamp_ms;
        let b = source.next_frame().unwrap().timestamp_ms;
        assert!(b >= a);
    }
}
