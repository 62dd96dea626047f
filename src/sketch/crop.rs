use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// Square canvas region selected for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub size: u32,
}

impl CropRegion {
    /// Aspect-correct the box into a square: grow the shorter dimension to
    /// match the longer one, re-centering the growth on that axis, then pad
    /// all sides and clamp the origin to the canvas (never negative).
    pub fn from_box(b: &BoundingBox, pad: f64) -> Self {
        let width = b.width();
        let height = b.height();
        let mut left = b.min_x;
        let mut top = b.min_y;
        if width >= height {
            top = (top - (width - height) / 2.0).max(0.0);
        } else {
            left = (left - (height - width) / 2.0).max(0.0);
        }
        let size = width.max(height) + 2.0 * pad;
        Self {
            left: (left - pad).max(0.0).floor() as u32,
            top: (top - pad).max(0.0).floor() as u32,
            size: (size.ceil() as u32).max(1),
        }
    }
}

/// Grayscale crop shipped to the classifier (0 = blank, 255 = ink)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Read a region out of the ink raster. Pixels past the right/bottom canvas
/// edge read as blank so the output size is always `size * size`.
pub fn extract(ink: &[u8], canvas: u32, region: CropRegion) -> SketchImage {
    let mut pixels = vec![0u8; (region.size as usize) * (region.size as usize)];
    for row in 0..region.size {
        let src_y = region.top + row;
        if src_y >= canvas {
            break;
        }
        for col in 0..region.size {
            let src_x = region.left + col;
            if src_x >= canvas {
                break;
            }
            pixels[(row * region.size + col) as usize] = ink[(src_y * canvas + src_x) as usize];
        }
    }
    SketchImage {
        width: region.size,
        height: region.size,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[test]
    fn test_wide_box_grows_and_recenters_vertically() {
        // 100x40 box: height grows by 60, 30 on each side of the center
        let region = CropRegion::from_box(&bbox(10.0, 50.0, 110.0, 90.0), 4.0);
        assert_eq!(region, CropRegion { left: 6, top: 16, size: 108 });
    }

    #[test]
    fn test_tall_box_grows_and_recenters_horizontally() {
        let region = CropRegion::from_box(&bbox(30.0, 10.0, 50.0, 90.0), 4.0);
        assert_eq!(region, CropRegion { left: 0, top: 6, size: 88 });
    }

    #[test]
    fn test_origin_clamps_at_zero() {
        // box hugging the top edge: recentering would push top negative
        let region = CropRegion::from_box(&bbox(10.0, 2.0, 110.0, 42.0), 4.0);
        assert_eq!(region.top, 0);
        assert_eq!(region.left, 6);
    }

    #[test]
    fn test_square_box_only_gains_padding() {
        let region = CropRegion::from_box(&bbox(100.0, 100.0, 150.0, 150.0), 4.0);
        assert_eq!(region, CropRegion { left: 96, top: 96, size: 58 });
    }

    #[test]
    fn test_degenerate_box_still_yields_a_region() {
        let region = CropRegion::from_box(&bbox(100.0, 100.0, 100.0, 100.0), 0.0);
        assert_eq!(region.size, 1);
    }

    #[test]
    fn test_extract_reads_the_region() {
        // 4x4 canvas with one marked pixel at (2, 1)
        let mut ink = vec![0u8; 16];
        ink[4 + 2] = 255;
        let img = extract(
            &ink,
            4,
            CropRegion {
                left: 1,
                top: 0,
                size: 3,
            },
        );
        assert_eq!(img.width, 3);
        assert_eq!(img.height, 3);
        assert_eq!(img.pixels[3 + 1], 255);
        assert_eq!(img.pixels.iter().filter(|&&p| p == 255).count(), 1);
    }

    #[test]
    fn test_extract_fills_blank_past_the_canvas_edge() {
        let ink = vec![255u8; 16];
        let img = extract(
            &ink,
            4,
            CropRegion {
                left: 2,
                top: 2,
                size: 4,
            },
        );
        // only the 2x2 in-canvas corner carries ink
        let lit = img.pixels.iter().filter(|&&p| p == 255).count();
        assert_eq!(lit, 4);
        assert_eq!(img.pixels.len(), 16);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let mut ink = vec![0u8; 64];
        ink[20] = 255;
        ink[35] = 255;
        let region = CropRegion {
            left: 1,
            top: 1,
            size: 5,
        };
        assert_eq!(extract(&ink, 8, region), extract(&ink, 8, region));
    }
}
