//! The emulator console's line protocol.
//!
//! The console is a plain-text, newline-terminated protocol on a TCP stream
//! (port 5554 for the first emulator, then 5556, 5558, ...).  This module holds
//! everything about that protocol that does not need a socket:
//!
//! - [`commands`] – outbound commands (`auth`, `event mouse`, `rotate`, ...).
//! - [`lines`] – reassembly of inbound bytes into trimmed lines.
//! - [`auth`] – recognition of the authentication challenge banner.
//! - [`events`] – connection states and the events the control channel
//!   publishes, plus classification of inbound reply lines.

pub mod auth;
pub mod commands;
pub mod events;
pub mod lines;

pub use auth::{AuthScanner, AuthStep, AUTH_MARKER};
pub use commands::{buttons, ConsoleCommand};
pub use events::{
    classify_line, default_video_handle, ChannelEvent, ConnectionState, ConsoleReply,
    DEFAULT_CONSOLE_PORT, VIDEO_HANDLE_PREFIX,
};
pub use lines::LineAccumulator;
