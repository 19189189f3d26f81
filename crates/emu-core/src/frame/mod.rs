//! Shared-memory video feed.
//!
//! After `screenrecord webrtc start`, the emulator copies every rendered frame
//! into a named shared-memory region laid out as:
//!
//! ```text
//! offset  0 ┌──────────────┐
//!           │ width    u32 │
//!         4 │ height   u32 │
//!         8 │ fps      u32 │   VideoInfoHeader (20 bytes, little-endian)
//!        12 │ frame #  u32 │
//!        16 │ time µs  u32 │
//!        20 ├──────────────┤
//!           │ ARGB pixels  │   width * height * 4 bytes, row-major
//!           └──────────────┘
//! ```
//!
//! The producer bumps `frame #` after writing a frame.  [`SharedFrameBuffer`]
//! re-reads the 20-byte header on every poll and copies the pixel block only
//! when that counter moved, so copy cost tracks the real frame rate rather
//! than the poll rate.
//!
//! Mapping the region is an OS concern.  This module only sees it through the
//! [`RegionProvider`] / [`Region`] capability traits; the viewer crate supplies
//! the POSIX and Windows implementations, and [`memory`] supplies an in-memory
//! one for tests and simulations.

pub mod header;
pub mod memory;
pub mod region;
pub mod shared;

pub use header::{VideoInfoHeader, HEADER_SIZE};
pub use region::{FrameError, Region, RegionProvider};
pub use shared::{Frame, PollOutcome, SharedFrameBuffer};
