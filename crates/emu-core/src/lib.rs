//! # emu-core
//!
//! Shared library for the emulator viewer.  It holds the pieces of the system
//! that do not touch sockets, OS memory-mapping calls, or a UI toolkit:
//!
//! - **`protocol`** – The emulator console's line protocol: outbound command
//!   formatting, inbound line framing, the authentication challenge scanner,
//!   and the connection state / event types the control channel publishes.
//!
//! - **`frame`** – The shared-memory video feed.  The emulator publishes a
//!   20-byte `VideoInfoHeader` followed by raw ARGB pixels in a named region;
//!   [`frame::SharedFrameBuffer`] polls that region and only copies pixels when
//!   the producer's frame counter moves.  The OS mapping itself is hidden
//!   behind the [`frame::RegionProvider`] capability trait.
//!
//! - **`view`** – Pure geometry: rotation quadrants, the per-quadrant render
//!   transform, and the view-to-device pointer mapping.
//!
//! - **`keymap`** – The immutable table that turns local key identifiers into
//!   linux input-event codes for `event send EV_KEY:<code>:<0|1>`.
//!
//! # Architecture overview (for beginners)
//!
//! ```text
//!            emulator process                       this workspace
//!  ┌───────────────────────────────┐      ┌──────────────────────────────┐
//!  │ console (TCP, text lines)     │ <──> │ emu-viewer ControlChannel    │
//!  │ shared memory "videmulator…"  │ ───> │ emu-core SharedFrameBuffer   │
//!  └───────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! `emu-core` has no async runtime dependency; the `emu-viewer` crate wires
//! these types into tokio tasks.

pub mod frame;
pub mod keymap;
pub mod protocol;
pub mod view;

pub use frame::{FrameError, PollOutcome, Region, RegionProvider, SharedFrameBuffer, VideoInfoHeader};
pub use keymap::{KeyTranslator, LocalKey};
pub use protocol::{ChannelEvent, ConnectionState, ConsoleCommand};
pub use view::{RenderTransform, RotationQuadrant, Size};
