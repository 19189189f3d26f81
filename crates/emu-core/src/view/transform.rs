//! The per-quadrant render transform and view-to-device pointer mapping.
//!
//! # How the transform is built (for beginners)
//!
//! The buffer is drawn into the view by one 2x3 affine matrix
//!
//! ```text
//! | a b c |   | x |
//! | d e f | * | y |
//!             | 1 |
//! ```
//!
//! composed from three steps, applied right to left:
//!
//! 1. Rotate the buffer about its own centre `cb` by `quadrant * 90°`.
//! 2. Translate so that centre lands on the target centre `ct`.  For the
//!    sideways quadrants the rotated image is `bh` wide and `bw` tall, so `ct`
//!    is `(bh/2, bw/2)`; otherwise it is `cb`.
//! 3. Scale the rotated image to fill the view.  Sideways quadrants divide by
//!    the swapped buffer axes.

use super::{RotationQuadrant, Size};

/// `(cos, sin)` for 0°, 90°, 180°, 270°.  Exact, so quadrant maths does not
/// pick up floating-point noise.
const QUADRANT_TRIG: [(f64, f64); 4] = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

/// How the buffer is scaled and rotated into the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation_degrees: u32,
    /// Point the rotation is taken about, in buffer pixels.
    pub pivot: (f64, f64),
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl RenderTransform {
    /// Builds the transform for drawing a `buffer`-sized frame into `view` at
    /// `quadrant`.
    ///
    /// Returns `None` if either size has a zero axis.
    pub fn for_view(quadrant: RotationQuadrant, view: Size, buffer: Size) -> Option<Self> {
        if view.is_empty() || buffer.is_empty() {
            return None;
        }

        let (bw, bh) = (f64::from(buffer.width), f64::from(buffer.height));
        let (vw, vh) = (f64::from(view.width), f64::from(view.height));

        let (scale_x, scale_y) = if quadrant.is_sideways() {
            (vw / bh, vh / bw)
        } else {
            (vw / bw, vh / bh)
        };

        let (cos, sin) = QUADRANT_TRIG[quadrant.index() as usize];
        let cb = (bw / 2.0, bh / 2.0);
        let ct = if quadrant.is_sideways() { (bh / 2.0, bw / 2.0) } else { cb };

        Some(Self {
            scale_x,
            scale_y,
            rotation_degrees: quadrant.degrees(),
            pivot: cb,
            a: scale_x * cos,
            b: -scale_x * sin,
            c: scale_x * (ct.0 - cos * cb.0 + sin * cb.1),
            d: scale_y * sin,
            e: scale_y * cos,
            f: scale_y * (ct.1 - sin * cb.0 - cos * cb.1),
        })
    }

    /// Maps a buffer-space point into view space.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }
}

/// Maps a view-space pointer position to device pixels:
/// `device = buffer / view * pointer` on each axis, truncated toward zero.
///
/// Returns `None` if either size has a zero axis.
pub fn map_pointer(buffer: Size, view: Size, x: i32, y: i32) -> Option<(i32, i32)> {
    if view.is_empty() || buffer.is_empty() {
        return None;
    }
    let dx = f64::from(buffer.width) / f64::from(view.width) * f64::from(x);
    let dy = f64::from(buffer.height) / f64::from(view.height) * f64::from(y);
    Some((dx as i32, dy as i32))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < EPS && (a.1 - b.1).abs() < EPS
    }

    #[test]
    fn test_quadrant_zero_scales_without_rotation() {
        // Arrange
        let view = Size::new(300, 500);
        let buffer = Size::new(100, 150);

        // Act
        let t = RenderTransform::for_view(RotationQuadrant::UPRIGHT, view, buffer).unwrap();

        // Assert
        assert!((t.scale_x - 3.0).abs() < EPS);
        assert!((t.scale_y - 500.0 / 150.0).abs() < EPS);
        assert_eq!(t.rotation_degrees, 0);
        assert!(close(t.apply(0.0, 0.0), (0.0, 0.0)));
        assert!(close(t.apply(100.0, 150.0), (300.0, 500.0)));
    }

    #[test]
    fn test_quadrant_two_rotates_about_buffer_centre() {
        // Arrange
        let view = Size::new(300, 500);
        let buffer = Size::new(100, 150);

        // Act
        let t = RenderTransform::for_view(RotationQuadrant::new(2), view, buffer).unwrap();

        // Assert – same scale as upright, corners swap
        assert!((t.scale_x - 3.0).abs() < EPS);
        assert!((t.scale_y - 500.0 / 150.0).abs() < EPS);
        assert_eq!(t.rotation_degrees, 180);
        assert_eq!(t.pivot, (50.0, 75.0));
        assert!(close(t.apply(0.0, 0.0), (300.0, 500.0)));
        assert!(close(t.apply(100.0, 150.0), (0.0, 0.0)));
        assert!(close(t.apply(50.0, 75.0), (150.0, 250.0)));
    }

    #[test]
    fn test_quadrant_one_swaps_axes() {
        // Arrange
        let view = Size::new(500, 300);
        let buffer = Size::new(100, 150);

        // Act
        let t = RenderTransform::for_view(RotationQuadrant::new(1), view, buffer).unwrap();

        // Assert
        assert!((t.scale_x - 500.0 / 150.0).abs() < EPS);
        assert!((t.scale_y - 3.0).abs() < EPS);
        assert_eq!(t.rotation_degrees, 90);
        // Buffer top-left goes to the view's top-right for a clockwise turn.
        assert!(close(t.apply(0.0, 0.0), (500.0, 0.0)));
        assert!(close(t.apply(100.0, 150.0), (0.0, 300.0)));
        assert!(close(t.apply(50.0, 75.0), (250.0, 150.0)));
    }

    #[test]
    fn test_quadrant_three_swaps_axes_other_way() {
        let view = Size::new(500, 300);
        let buffer = Size::new(100, 150);

        let t = RenderTransform::for_view(RotationQuadrant::new(3), view, buffer).unwrap();

        assert!((t.scale_x - 500.0 / 150.0).abs() < EPS);
        assert!((t.scale_y - 3.0).abs() < EPS);
        assert_eq!(t.rotation_degrees, 270);
        assert!(close(t.apply(0.0, 0.0), (0.0, 300.0)));
        assert!(close(t.apply(100.0, 150.0), (500.0, 0.0)));
    }

    #[test]
    fn test_empty_sizes_have_no_transform() {
        assert!(RenderTransform::for_view(RotationQuadrant::UPRIGHT, Size::new(0, 5), Size::new(1, 1)).is_none());
        assert!(RenderTransform::for_view(RotationQuadrant::UPRIGHT, Size::new(5, 5), Size::new(1, 0)).is_none());
    }

    #[test]
    fn test_map_pointer_scales_view_to_device() {
        let device = map_pointer(Size::new(1080, 1920), Size::new(360, 640), 180, 320);
        assert_eq!(device, Some((540, 960)));
    }

    #[test]
    fn test_map_pointer_truncates_fractions() {
        let device = map_pointer(Size::new(100, 100), Size::new(300, 300), 1, 2);
        assert_eq!(device, Some((0, 0)));
    }

    #[test]
    fn test_map_pointer_without_view_is_none() {
        assert_eq!(map_pointer(Size::new(1080, 1920), Size::new(0, 0), 1, 1), None);
    }
}
