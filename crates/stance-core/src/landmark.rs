//! Canonical pose landmark indices.
//!
//! The 33-point body topology used by the pose landmark models. Index
//! values are fixed by the model output layout and must not be reordered.

use serde::{Deserialize, Serialize};

/// Named index for each of the 33 pose landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum BodyKeypoint {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyKeypoint {
    /// Number of landmarks in the model topology.
    pub const COUNT: usize = 33;

    /// Landmark for a raw model output index, `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        use BodyKeypoint::*;
        let kp = match index {
            0 => Nose,
            1 => LeftEyeInner,
            2 => LeftEye,
            3 => LeftEyeOuter,
            4 => RightEyeInner,
            5 => RightEye,
            6 => RightEyeOuter,
            7 => LeftEar,
            8 => RightEar,
            9 => MouthLeft,
            10 => MouthRight,
            11 => LeftShoulder,
            12 => RightShoulder,
            13 => LeftElbow,
            14 => RightElbow,
            15 => LeftWrist,
            16 => RightWrist,
            17 => LeftPinky,
            18 => RightPinky,
            19 => LeftIndex,
            20 => RightIndex,
            21 => LeftThumb,
            22 => RightThumb,
            23 => LeftHip,
            24 => RightHip,
            25 => LeftKnee,
            26 => RightKnee,
            27 => LeftAnkle,
            28 => RightAnkle,
            29 => LeftHeel,
            30 => RightHeel,
            31 => LeftFootIndex,
            32 => RightFootIndex,
            _ => return None,
        };
        Some(kp)
    }

    /// Raw model output index of this landmark.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name, snake_case.
    pub fn name(self) -> &'static str {
        use BodyKeypoint::*;
        match self {
            Nose => "nose",
            LeftEyeInner => "left_eye_inner",
            LeftEye => "left_eye",
            LeftEyeOuter => "left_eye_outer",
            RightEyeInner => "right_eye_inner",
            RightEye => "right_eye",
            RightEyeOuter => "right_eye_outer",
            LeftEar => "left_ear",
            RightEar => "right_ear",
            MouthLeft => "mouth_left",
            MouthRight => "mouth_right",
            LeftShoulder => "left_shoulder",
            RightShoulder => "right_shoulder",
            LeftElbow => "left_elbow",
            RightElbow => "right_elbow",
            LeftWrist => "left_wrist",
            RightWrist => "right_wrist",
            LeftPinky => "left_pinky",
            RightPinky => "right_pinky",
            LeftIndex => "left_index",
            RightIndex => "right_index",
            LeftThumb => "left_thumb",
            RightThumb => "right_thumb",
            LeftHip => "left_hip",
            RightHip => "right_hip",
            LeftKnee => "left_knee",
            RightKnee => "right_knee",
            LeftAnkle => "left_ankle",
            RightAnkle => "right_ankle",
            LeftHeel => "left_heel",
            RightHeel => "right_heel",
            LeftFootIndex => "left_foot_index",
            RightFootIndex => "right_foot_index",
        }
    }
}

impl std::fmt::Display for BodyKeypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(BodyKeypoint::from_index(0), Some(BodyKeypoint::Nose));
        assert_eq!(
            BodyKeypoint::from_index(32),
            Some(BodyKeypoint::RightFootIndex)
        );
        assert_eq!(BodyKeypoint::from_index(33), None);
        assert_eq!(BodyKeypoint::from_index(usize::MAX), None);
    }

    #[test]
    fn test_index_roundtrip() {
        for i in 0..BodyKeypoint::COUNT {
            let kp = BodyKeypoint::from_index(i).unwrap();
            assert_eq!(kp.index(), i);
        }
    }

    #[test]
    fn test_names_unique() {
        let mut names = std::collections::HashSet::new();
        for i in 0..BodyKeypoint::COUNT {
            assert!(names.insert(BodyKeypoint::from_index(i).unwrap().name()));
        }
        assert_eq!(names.len(), BodyKeypoint::COUNT);
    }

    #[test]
    fn test_display_matches_name() {
        assert_eq!(BodyKeypoint::LeftShoulder.to_string(), "left_shoulder");
        assert_eq!(BodyKeypoint::RightFootIndex.to_string(), "right_foot_index");
    }
}
