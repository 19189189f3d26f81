//! View geometry: rotation quadrants, the render transform, and pointer
//! mapping between view pixels and device pixels.

pub mod transform;

pub use transform::{map_pointer, RenderTransform};

use serde::{Deserialize, Serialize};

/// Width and height of a surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The same size with the axes swapped.
    pub fn transposed(&self) -> Self {
        Self { width: self.height, height: self.width }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// One of the four 90° display rotations.
///
/// Only local user action advances the quadrant; the device never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RotationQuadrant(u8);

impl RotationQuadrant {
    pub const UPRIGHT: Self = Self(0);

    /// Wraps `q` into `0..4`.
    pub const fn new(q: u8) -> Self {
        Self(q % 4)
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// The next quadrant clockwise, wrapping 3 → 0.
    pub const fn next(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    pub const fn degrees(self) -> u32 {
        self.0 as u32 * 90
    }

    /// `true` for 90° and 270°, where the buffer's axes are swapped on screen.
    pub const fn is_sideways(self) -> bool {
        self.0 % 2 == 1
    }
}

impl std::fmt::Display for RotationQuadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
