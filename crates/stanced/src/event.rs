//! Landmark event payload assembly.

use chrono::Utc;
use stance_core::{FrameMetadata, LandmarkEvent, PoseResult};

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Assemble the wire payload for one pose result.
pub fn build_event(
    pose: &PoseResult,
    width: u32,
    height: u32,
    presentation_time_stamp: i64,
    frame_number: u64,
    start_timestamp: i64,
) -> LandmarkEvent {
    LandmarkEvent {
        landmarks: pose.keypoints.clone(),
        world_landmarks: pose.world_keypoints.clone(),
        additional_data: FrameMetadata {
            height,
            width,
            presentation_time_stamp,
            frame_number,
            start_timestamp,
        },
    }
}
