//! Frame type and pixel conversion: YUYV to RGB, horizontal mirroring.

/// A captured RGB camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Interleaved RGB pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Milliseconds since the capture stream started.
    pub timestamp_ms: u64,
    pub sequence: u32,
}

/// Convert packed YUYV (4:2:2) to interleaved RGB using BT.601.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]. Both pixels share
/// the chroma pair.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for quad in yuyv[..expected].chunks_exact(4) {
        let u = quad[1] as f32 - 128.0;
        let v = quad[3] as f32 - 128.0;
        for &y in &[quad[0], quad[2]] {
            let y = y as f32;
            let r = y + 1.402 * v;
            let g = y - 0.344136 * u - 0.714136 * v;
            let b = y + 1.772 * u;
            rgb.push(r.round().clamp(0.0, 255.0) as u8);
            rgb.push(g.round().clamp(0.0, 255.0) as u8);
            rgb.push(b.round().clamp(0.0, 255.0) as u8);
        }
    }

    Ok(rgb)
}

/// Mirror an RGB frame in place around its vertical axis.
///
/// Front-facing frames are mirrored before inference so the overlay
/// matches what a selfie view shows.
pub fn flip_horizontal(rgb: &mut [u8], width: u32, height: u32) {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || rgb.len() < w * h * 3 {
        return;
    }

    for row in rgb.chunks_exact_mut(w * 3).take(h) {
        let mut left = 0usize;
        let mut right = w - 1;
        while left < right {
            for c in 0..3 {
                row.swap(left * 3 + c, right * 3 + c);
            }
            left += 1;
            right -= 1;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid YUYV length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgb_gray() {
        // Neutral chroma: RGB equals luma.
        let yuyv = vec![128, 128, 128, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb, vec![128, 128, 128, 128, 128, 128]);
    }

    #[test]
    fn test_yuyv_to_rgb_red() {
        // BT.601 red: Y=76, U=84, V=255.
        let yuyv = vec![76, 84, 76, 255];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(&rgb[..3], &[254, 0, 0]);
    }

    #[test]
    fn test_yuyv_shared_chroma() {
        // [Y0=0, U=128, Y1=255, V=128]: black pixel then white pixel.
        let yuyv = vec![0, 128, 255, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_yuyv_invalid_length() {
        let yuyv = vec![100, 128]; // too short for 2x1
        assert!(yuyv_to_rgb(&yuyv, 2, 1).is_err());
    }

    #[test]
    fn test_flip_horizontal_2x1() {
        let mut rgb = vec![1, 2, 3, 4, 5, 6];
        flip_horizontal(&mut rgb, 2, 1);
        assert_eq!(rgb, vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_flip_horizontal_odd_width_keeps_center() {
        let mut rgb = vec![1, 1, 1, 2, 2, 2, 3, 3, 3];
        flip_horizontal(&mut rgb, 3, 1);
        assert_eq!(rgb, vec![3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_flip_horizontal_rows_independent() {
        // 2x2: rows swap within themselves, never across.
        let mut rgb = vec![
            1, 1, 1, 2, 2, 2, // row 0
            3, 3, 3, 4, 4, 4, // row 1
        ];
        flip_horizontal(&mut rgb, 2, 2);
        assert_eq!(
            rgb,
            vec![
                2, 2, 2, 1, 1, 1, //
                4, 4, 4, 3, 3, 3, //
            ]
        );
    }

    #[test]
    fn test_flip_twice_restores() {
        let mut rgb: Vec<u8> = (0..4 * 2 * 3).collect();
        let original = rgb.clone();
        flip_horizontal(&mut rgb, 4, 2);
        assert_ne!(rgb, original);
        flip_horizontal(&mut rgb, 4, 2);
        assert_eq!(rgb, original);
    }
}
