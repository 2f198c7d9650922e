//! Precomputed mask shapes
//!
//! Entities pick their collision mask from a small set of shapes. Pixels are
//! sampled at their centers, so a circle of radius `r` fits a `2r × 2r`
//! raster exactly.

use crate::BitRaster;

/// Filled circle in a `2r × 2r` raster
pub fn circle(radius: usize) -> BitRaster {
    ellipse(radius, radius)
}

/// Filled axis-aligned ellipse in a `2rx × 2ry` raster
pub fn ellipse(radius_x: usize, radius_y: usize) -> BitRaster {
    if radius_x == 0 || radius_y == 0 {
        return BitRaster::new(radius_x * 2, radius_y * 2);
    }
    let (rx, ry) = (radius_x as f32, radius_y as f32);
    BitRaster::from_fn(radius_x * 2, radius_y * 2, |x, y| {
        let u = (x as f32 + 0.5 - rx) / rx;
        let v = (y as f32 + 0.5 - ry) / ry;
        u * u + v * v <= 1.0
    })
}

/// Rectangle of `width × height` rotated by `angle` radians about its center
///
/// The raster is sized to the rotated bounding box.
pub fn rotated_rectangle(width: usize, height: usize, angle: f32) -> BitRaster {
    let (sin, cos) = angle.sin_cos();
    let (w, h) = (width as f32, height as f32);
    // Trig round-off must not grow the box by a whole pixel
    let box_w = (w * cos.abs() + h * sin.abs() - 1e-3).ceil().max(0.0) as usize;
    let box_h = (w * sin.abs() + h * cos.abs() - 1e-3).ceil().max(0.0) as usize;
    let (cx, cy) = (box_w as f32 * 0.5, box_h as f32 * 0.5);
    let (half_w, half_h) = (w * 0.5 + 1e-4, h * 0.5 + 1e-4);

    BitRaster::from_fn(box_w, box_h, |x, y| {
        let px = x as f32 + 0.5 - cx;
        let py = y as f32 + 0.5 - cy;
        // Rotate the sample point back into the rectangle's frame
        let u = px * cos + py * sin;
        let v = -px * sin + py * cos;
        u.abs() <= half_w && v.abs() <= half_h
    })
}

/// Isosceles triangle with its apex at the top center
pub fn triangle(width: usize, height: usize) -> BitRaster {
    let (w, h) = (width as f32, height as f32);
    BitRaster::from_fn(width, height, |x, y| {
        let half_span = w * 0.5 * (y as f32 + 0.5) / h;
        (x as f32 + 0.5 - w * 0.5).abs() <= half_span
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_size_and_area() {
        let mask = circle(10);
        assert_eq!(mask.width(), 20);
        assert_eq!(mask.height(), 20);

        let area = mask.count_solid() as f32;
        let expected = std::f32::consts::PI * 100.0;
        assert!((area - expected).abs() < expected * 0.05, "area {} vs {}", area, expected);
    }

    #[test]
    fn test_circle_is_symmetric() {
        let mask = circle(7);
        for y in 0..14 {
            for x in 0..14 {
                assert_eq!(mask.get(x, y), mask.get(13 - x, y));
                assert_eq!(mask.get(x, y), mask.get(x, 13 - y));
            }
        }
        assert!(!mask.get(0, 0));
        assert!(mask.get(7, 7));
    }

    #[test]
    fn test_zero_radius() {
        assert!(circle(0).is_empty());
        assert_eq!(ellipse(3, 0).count_solid(), 0);
    }

    #[test]
    fn test_ellipse_extent() {
        let mask = ellipse(8, 3);
        assert_eq!(mask.width(), 16);
        assert_eq!(mask.height(), 6);
        assert!(mask.get(0, 2));
        assert!(!mask.get(0, 0));
    }

    #[test]
    fn test_unrotated_rectangle_is_solid() {
        let mask = rotated_rectangle(6, 4, 0.0);
        assert_eq!(mask, BitRaster::solid_rectangle(6, 4));
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let mask = rotated_rectangle(6, 2, std::f32::consts::FRAC_PI_2);
        assert_eq!(mask.width(), 2);
        assert_eq!(mask.height(), 6);
        assert_eq!(mask.count_solid(), 12);
    }

    #[test]
    fn test_diagonal_rectangle_corners_empty() {
        let mask = rotated_rectangle(10, 2, std::f32::consts::FRAC_PI_4);
        assert!(!mask.get(0, mask.height() as i32 - 1));
        assert!(!mask.get(mask.width() as i32 - 1, 0));
        assert!(mask.count_solid() > 10);
    }

    #[test]
    fn test_triangle_widens_downward() {
        let mask = triangle(9, 9);
        let row_fill = |y: i32| (0..9).filter(|&x| mask.get(x, y)).count();
        assert!(row_fill(0) < row_fill(4));
        assert!(row_fill(4) < row_fill(8));
        assert_eq!(row_fill(8), 9);
    }
}
