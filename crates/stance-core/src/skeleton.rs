//! Skeleton connection tables and the body part filter.
//!
//! Connections are grouped into ten body part categories. The filter
//! selects which categories contribute edges to the rendered skeleton;
//! the union is rebuilt per frame so filter changes apply on the next
//! frame without restarting the pipeline.

use serde::{Deserialize, Serialize};

use crate::landmark::BodyKeypoint;

/// A skeleton edge between two landmark indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub start: usize,
    pub end: usize,
}

const fn conn(start: usize, end: usize) -> Connection {
    Connection { start, end }
}

/// Face outline: eyes, ears, mouth.
pub const FACE_CONNECTIONS: [Connection; 9] = [
    conn(0, 1),  // nose - left eye inner
    conn(1, 2),  // left eye inner - left eye
    conn(2, 3),  // left eye - left eye outer
    conn(3, 7),  // left eye outer - left ear
    conn(0, 4),  // nose - right eye inner
    conn(4, 5),  // right eye inner - right eye
    conn(5, 6),  // right eye - right eye outer
    conn(6, 8),  // right eye outer - right ear
    conn(9, 10), // mouth left - mouth right
];

/// Left upper limb: shoulder to elbow to wrist.
pub const LEFT_ARM_CONNECTIONS: [Connection; 2] = [conn(11, 13), conn(13, 15)];

/// Right upper limb: shoulder to elbow to wrist.
pub const RIGHT_ARM_CONNECTIONS: [Connection; 2] = [conn(12, 14), conn(14, 16)];

/// Left hand: wrist to pinky, index, and thumb.
pub const LEFT_WRIST_CONNECTIONS: [Connection; 3] = [conn(15, 17), conn(15, 19), conn(15, 21)];

/// Right hand: wrist to pinky, index, and thumb.
pub const RIGHT_WRIST_CONNECTIONS: [Connection; 3] = [conn(16, 18), conn(16, 20), conn(16, 22)];

/// Shoulder line, hip line, and the two sides between them.
pub const TORSO_CONNECTIONS: [Connection; 4] =
    [conn(11, 12), conn(11, 23), conn(12, 24), conn(23, 24)];

/// Left lower limb: hip to knee to ankle.
pub const LEFT_LEG_CONNECTIONS: [Connection; 2] = [conn(23, 25), conn(25, 27)];

/// Right lower limb: hip to knee to ankle.
pub const RIGHT_LEG_CONNECTIONS: [Connection; 2] = [conn(24, 26), conn(26, 28)];

/// Left foot: ankle to heel and foot index.
pub const LEFT_ANKLE_CONNECTIONS: [Connection; 2] = [conn(27, 29), conn(27, 31)];

/// Right foot: ankle to heel and foot index.
pub const RIGHT_ANKLE_CONNECTIONS: [Connection; 2] = [conn(28, 30), conn(28, 32)];

/// Total edge count with every category enabled.
pub const TOTAL_CONNECTIONS: usize = FACE_CONNECTIONS.len()
    + LEFT_ARM_CONNECTIONS.len()
    + RIGHT_ARM_CONNECTIONS.len()
    + LEFT_WRIST_CONNECTIONS.len()
    + RIGHT_WRIST_CONNECTIONS.len()
    + TORSO_CONNECTIONS.len()
    + LEFT_LEG_CONNECTIONS.len()
    + RIGHT_LEG_CONNECTIONS.len()
    + LEFT_ANKLE_CONNECTIONS.len()
    + RIGHT_ANKLE_CONNECTIONS.len();

/// Which body part categories contribute skeleton edges.
///
/// Every category defaults to enabled. Deserialization accepts partial
/// objects: missing keys keep their defaults and unknown keys are
/// ignored, so subscribers can send only the parts they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPartFilter {
    #[serde(default = "enabled")]
    pub face: bool,
    #[serde(default = "enabled")]
    pub left_arm: bool,
    #[serde(default = "enabled")]
    pub right_arm: bool,
    #[serde(default = "enabled")]
    pub left_wrist: bool,
    #[serde(default = "enabled")]
    pub right_wrist: bool,
    #[serde(default = "enabled")]
    pub torso: bool,
    #[serde(default = "enabled")]
    pub left_leg: bool,
    #[serde(default = "enabled")]
    pub right_leg: bool,
    #[serde(default = "enabled")]
    pub left_ankle: bool,
    #[serde(default = "enabled")]
    pub right_ankle: bool,
}

fn enabled() -> bool {
    true
}

impl Default for BodyPartFilter {
    fn default() -> Self {
        Self {
            face: true,
            left_arm: true,
            right_arm: true,
            left_wrist: true,
            right_wrist: true,
            torso: true,
            left_leg: true,
            right_leg: true,
            left_ankle: true,
            right_ankle: true,
        }
    }
}

impl BodyPartFilter {
    /// A filter with every category disabled.
    pub fn none() -> Self {
        Self {
            face: false,
            left_arm: false,
            right_arm: false,
            left_wrist: false,
            right_wrist: false,
            torso: false,
            left_leg: false,
            right_leg: false,
            left_ankle: false,
            right_ankle: false,
        }
    }
}

/// Build the connection list for the enabled categories, in catalog order.
///
/// Pure and deterministic: the same filter always yields the same list.
pub fn connections_for(filter: &BodyPartFilter) -> Vec<Connection> {
    let mut connections = Vec::with_capacity(TOTAL_CONNECTIONS);
    if filter.face {
        connections.extend_from_slice(&FACE_CONNECTIONS);
    }
    if filter.left_arm {
        connections.extend_from_slice(&LEFT_ARM_CONNECTIONS);
    }
    if filter.right_arm {
        connections.extend_from_slice(&RIGHT_ARM_CONNECTIONS);
    }
    if filter.left_wrist {
        connections.extend_from_slice(&LEFT_WRIST_CONNECTIONS);
    }
    if filter.right_wrist {
        connections.extend_from_slice(&RIGHT_WRIST_CONNECTIONS);
    }
    if filter.torso {
        connections.extend_from_slice(&TORSO_CONNECTIONS);
    }
    if filter.left_leg {
        connections.extend_from_slice(&LEFT_LEG_CONNECTIONS);
    }
    if filter.right_leg {
        connections.extend_from_slice(&RIGHT_LEG_CONNECTIONS);
    }
    if filter.left_ankle {
        connections.extend_from_slice(&LEFT_ANKLE_CONNECTIONS);
    }
    if filter.right_ankle {
        connections.extend_from_slice(&RIGHT_ANKLE_CONNECTIONS);
    }
    connections
}
