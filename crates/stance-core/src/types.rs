use serde::{Deserialize, Serialize};

/// A single pose landmark in normalized image coordinates.
///
/// `x` and `y` are in [0, 1] relative to the source image; `z` is depth
/// in the same normalized scale (negative = toward the camera).
/// `visibility` and `presence` are confidences in [0, 1] when the model
/// provides them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<f32>,
}

/// A pose landmark in metric world coordinates (meters, hip-centered).
///
/// Kept as a distinct type so world-space and image-space points cannot
/// be mixed up at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldKeypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Per-frame metadata attached to every outbound landmark event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    pub height: u32,
    pub width: u32,
    /// Milliseconds since the capture session started.
    pub presentation_time_stamp: i64,
    /// Count of frames processed by the inference worker.
    pub frame_number: u64,
    /// Daemon start time, milliseconds since the Unix epoch.
    pub start_timestamp: i64,
}

/// The outbound event payload: one frame's landmarks plus metadata.
///
/// Serialized field names are part of the wire contract consumed by
/// subscribers (`worldLandmarks`, `additionalData`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkEvent {
    pub landmarks: Vec<Keypoint>,
    pub world_landmarks: Vec<WorldKeypoint>,
    pub additional_data: FrameMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> LandmarkEvent {
        LandmarkEvent {
            landmarks: vec![Keypoint {
                x: 0.5,
                y: 0.25,
                z: -0.1,
                visibility: Some(0.9),
                presence: Some(0.95),
            }],
            world_landmarks: vec![WorldKeypoint {
                x: 0.1,
                y: -0.2,
                z: 0.05,
            }],
            additional_data: FrameMetadata {
                height: 720,
                width: 1280,
                presentation_time_stamp: 1234,
                frame_number: 42,
                start_timestamp: 1_700_000_000_000,
            },
        }
    }

    #[test]
    fn test_event_wire_keys() {
        let value = serde_json::to_value(sample_event()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("landmarks"));
        assert!(obj.contains_key("worldLandmarks"));
        assert!(obj.contains_key("additionalData"));

        let meta = obj["additionalData"].as_object().unwrap();
        assert!(meta.contains_key("height"));
        assert!(meta.contains_key("width"));
        assert!(meta.contains_key("presentationTimeStamp"));
        assert!(meta.contains_key("frameNumber"));
        assert!(meta.contains_key("startTimestamp"));
    }

    #[test]
    fn test_event_roundtrip() {
        let event = sample_event();
        let json = serde_json::to_string(&event).unwrap();
        let back: LandmarkEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_keypoint_optional_confidences_omitted() {
        let kp = Keypoint {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: None,
            presence: None,
        };
        let value = serde_json::to_value(kp).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("visibility"));
        assert!(!obj.contains_key("presence"));
    }

    #[test]
    fn test_keypoint_parses_without_confidences() {
        let kp: Keypoint = serde_json::from_str(r#"{"x":0.1,"y":0.2,"z":0.3}"#).unwrap();
        assert_eq!(kp.visibility, None);
        assert_eq!(kp.presence, None);
    }
}
