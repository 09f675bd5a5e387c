//! Overlay geometry: projecting normalized landmarks into viewport space.
//!
//! The engine mirrors what a video layer does with the camera image:
//! scale it uniformly into the viewport (letterbox or crop), center it,
//! and then place landmark points with the same transform so dots and
//! lines land on the body they belong to.

use serde::{Deserialize, Serialize};

use crate::skeleton::Connection;
use crate::types::Keypoint;

/// How the source image is fitted into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Letterbox: the whole image is visible inside the viewport.
    Contain,
    /// Crop: the image covers the whole viewport.
    Cover,
}

impl std::str::FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contain" => Ok(FitMode::Contain),
            "cover" => Ok(FitMode::Cover),
            other => Err(format!("unknown fit mode: {other} (expected contain or cover)")),
        }
    }
}

/// Display rotation applied to normalized coordinates before projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Rotate a normalized coordinate pair.
    ///
    /// 0 and 180 degrees are the identity: the capture pipeline delivers
    /// upright frames for both portrait orientations, only the sideways
    /// ones swap axes.
    pub fn apply(self, x: f32, y: f32) -> (f32, f32) {
        match self {
            Rotation::Deg0 | Rotation::Deg180 => (x, y),
            Rotation::Deg90 => (y, 1.0 - x),
            Rotation::Deg270 => (1.0 - y, x),
        }
    }
}

/// Uniform scale factor and centering offsets for one image/viewport pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Compute the scale and offsets that map the image into the viewport.
///
/// Contain takes the smaller axis ratio so the image fits entirely;
/// Cover takes the larger so the image fills entirely. Offsets center
/// the scaled image and may be negative under Cover.
pub fn view_transform(
    image_width: f32,
    image_height: f32,
    viewport_width: f32,
    viewport_height: f32,
    fit: FitMode,
) -> ViewTransform {
    let scale_x = viewport_width / image_width;
    let scale_y = viewport_height / image_height;
    let scale = match fit {
        FitMode::Contain => scale_x.min(scale_y),
        FitMode::Cover => scale_x.max(scale_y),
    };
    ViewTransform {
        scale,
        offset_x: (viewport_width - image_width * scale) / 2.0,
        offset_y: (viewport_height - image_height * scale) / 2.0,
    }
}

/// Inputs for projecting one frame's landmarks.
#[derive(Debug, Clone, Copy)]
pub struct OverlayParams {
    pub image_width: f32,
    pub image_height: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub fit: FitMode,
    pub rotation: Rotation,
}

/// A point in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// A skeleton line segment in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
}

/// Projected geometry for one detected body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// One dot per available landmark, in landmark order.
    pub points: Vec<ScreenPoint>,
    /// One line per enabled connection with both endpoints available.
    pub segments: Vec<Segment>,
}

/// Project a single normalized landmark into viewport space.
pub fn project_point(params: &OverlayParams, keypoint: &Keypoint) -> ScreenPoint {
    let (rx, ry) = params.rotation.apply(keypoint.x, keypoint.y);
    let t = view_transform(
        params.image_width,
        params.image_height,
        params.viewport_width,
        params.viewport_height,
        params.fit,
    );
    ScreenPoint {
        x: rx * params.image_width * t.scale + t.offset_x,
        y: ry * params.image_height * t.scale + t.offset_y,
    }
}

/// Project one body's landmarks and build segments for the given
/// connections.
///
/// A connection whose endpoint index is not covered by the available
/// landmarks is skipped; the remaining segments are still produced.
pub fn project_body(
    params: &OverlayParams,
    keypoints: &[Keypoint],
    connections: &[Connection],
) -> Overlay {
    let points: Vec<ScreenPoint> = keypoints
        .iter()
        .map(|kp| project_point(params, kp))
        .collect();

    let mut segments = Vec::with_capacity(connections.len());
    for c in connections {
        let (Some(from), Some(to)) = (points.get(c.start), points.get(c.end)) else {
            continue;
        };
        segments.push(Segment {
            from: *from,
            to: *to,
        });
    }

    Overlay { points, segments }
}

/// Project several bodies with a shared parameter set.
pub fn project_bodies(
    params: &OverlayParams,
    bodies: &[Vec<Keypoint>],
    connections: &[Connection],
) -> Vec<Overlay> {
    bodies
        .iter()
        .map(|body| project_body(params, body, connections))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{connections_for, BodyPartFilter};

    const EPS: f32 = 1e-4;

    fn kp(x: f32, y: f32) -> Keypoint {
        Keypoint {
            x,
            y,
            z: 0.0,
            visibility: None,
            presence: None,
        }
    }

    #[test]
    fn test_contain_fits_inside_viewport() {
        // Wide image into a tall viewport: width is the limiting axis.
        let t = view_transform(1280.0, 720.0, 720.0, 1280.0, FitMode::Contain);
        assert!((t.scale - 720.0 / 1280.0).abs() < EPS);
        assert!(1280.0 * t.scale <= 720.0 + EPS);
        assert!(720.0 * t.scale <= 1280.0 + EPS);
        // Letterbox bands above and below, none at the sides.
        assert!((t.offset_x - 0.0).abs() < EPS);
        assert!(t.offset_y > 0.0);
    }

    #[test]
    fn test_cover_fills_viewport() {
        let t = view_transform(1280.0, 720.0, 720.0, 1280.0, FitMode::Cover);
        assert!((t.scale - 1280.0 / 720.0).abs() < EPS);
        assert!(1280.0 * t.scale >= 720.0 - EPS);
        assert!(720.0 * t.scale >= 1280.0 - EPS);
        // Cropped horizontally: negative x offset centers the excess.
        assert!(t.offset_x < 0.0);
        assert!((t.offset_y - 0.0).abs() < EPS);
    }

    #[test]
    fn test_offsets_center_the_image() {
        let t = view_transform(100.0, 100.0, 200.0, 100.0, FitMode::Contain);
        assert!((t.scale - 1.0).abs() < EPS);
        assert!((t.offset_x - 50.0).abs() < EPS);
        assert!((t.offset_y - 0.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_90() {
        assert_eq!(Rotation::Deg90.apply(0.2, 0.8), (0.8, 0.8));
        assert_eq!(Rotation::Deg90.apply(0.0, 0.0), (0.0, 1.0));
    }

    #[test]
    fn test_rotation_270() {
        let (x, y) = Rotation::Deg270.apply(0.2, 0.8);
        assert!((x - 0.2).abs() < EPS);
        assert!((y - 0.2).abs() < EPS);
    }

    #[test]
    fn test_rotation_identity() {
        assert_eq!(Rotation::Deg0.apply(0.3, 0.7), (0.3, 0.7));
        assert_eq!(Rotation::Deg180.apply(0.3, 0.7), (0.3, 0.7));
    }

    #[test]
    fn test_rotation_90_then_270_roundtrip() {
        let (rx, ry) = Rotation::Deg90.apply(0.25, 0.6);
        let (x, y) = Rotation::Deg270.apply(rx, ry);
        assert!((x - 0.25).abs() < EPS);
        assert!((y - 0.6).abs() < EPS);
    }

    #[test]
    fn test_from_degrees() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::Deg270.degrees(), 270);
    }

    #[test]
    fn test_project_point_identity_viewport() {
        let params = OverlayParams {
            image_width: 100.0,
            image_height: 100.0,
            viewport_width: 100.0,
            viewport_height: 100.0,
            fit: FitMode::Contain,
            rotation: Rotation::Deg0,
        };
        let p = project_point(&params, &kp(0.5, 0.5));
        assert!((p.x - 50.0).abs() < EPS);
        assert!((p.y - 50.0).abs() < EPS);
    }

    #[test]
    fn test_project_point_scaled_and_offset() {
        // 100x100 image centered in a 200x100 viewport at scale 1.
        let params = OverlayParams {
            image_width: 100.0,
            image_height: 100.0,
            viewport_width: 200.0,
            viewport_height: 100.0,
            fit: FitMode::Contain,
            rotation: Rotation::Deg0,
        };
        let p = project_point(&params, &kp(0.0, 1.0));
        assert!((p.x - 50.0).abs() < EPS);
        assert!((p.y - 100.0).abs() < EPS);
    }

    #[test]
    fn test_missing_endpoint_skips_segment_only() {
        let params = OverlayParams {
            image_width: 100.0,
            image_height: 100.0,
            viewport_width: 100.0,
            viewport_height: 100.0,
            fit: FitMode::Contain,
            rotation: Rotation::Deg0,
        };
        // 28 landmarks available; the right foot connection references 32.
        let keypoints: Vec<Keypoint> = (0..28).map(|i| kp(i as f32 / 28.0, 0.5)).collect();
        let connections = [
            Connection { start: 0, end: 1 },
            Connection { start: 28, end: 32 },
        ];
        let overlay = project_body(&params, &keypoints, &connections);
        assert_eq!(overlay.points.len(), 28);
        assert_eq!(overlay.segments.len(), 1);
    }

    #[test]
    fn test_empty_keypoints_empty_overlay() {
        let params = OverlayParams {
            image_width: 100.0,
            image_height: 100.0,
            viewport_width: 100.0,
            viewport_height: 100.0,
            fit: FitMode::Cover,
            rotation: Rotation::Deg0,
        };
        let overlay = project_body(&params, &[], &connections_for(&BodyPartFilter::default()));
        assert!(overlay.points.is_empty());
        assert!(overlay.segments.is_empty());
    }

    #[test]
    fn test_full_body_segment_count() {
        let params = OverlayParams {
            image_width: 1280.0,
            image_height: 720.0,
            viewport_width: 720.0,
            viewport_height: 1280.0,
            fit: FitMode::Cover,
            rotation: Rotation::Deg90,
        };
        let keypoints: Vec<Keypoint> = (0..33).map(|i| kp(i as f32 / 33.0, 0.5)).collect();
        let overlay = project_body(&params, &keypoints, &connections_for(&BodyPartFilter::default()));
        assert_eq!(overlay.points.len(), 33);
        assert_eq!(overlay.segments.len(), 31);
    }

    #[test]
    fn test_project_bodies_maps_each() {
        let params = OverlayParams {
            image_width: 100.0,
            image_height: 100.0,
            viewport_width: 100.0,
            viewport_height: 100.0,
            fit: FitMode::Contain,
            rotation: Rotation::Deg0,
        };
        let bodies = vec![vec![kp(0.1, 0.1)], vec![kp(0.9, 0.9)]];
        let overlays = project_bodies(&params, &bodies, &[]);
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].points.len(), 1);
    }

    #[test]
    fn test_fit_mode_parse() {
        assert_eq!("contain".parse::<FitMode>(), Ok(FitMode::Contain));
        assert_eq!("cover".parse::<FitMode>(), Ok(FitMode::Cover));
        assert!("stretch".parse::<FitMode>().is_err());
    }
}
