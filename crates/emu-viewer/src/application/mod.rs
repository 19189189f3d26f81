//! Application layer use cases for the viewer.
//!
//! - **`console_link`** – The [`console_link::ConsoleLink`] port through which
//!   use cases send console commands and request reconnects.  The network
//!   layer's `ControlChannel` implements it.
//!
//! - **`supervise_reconnect`** – Reacts to connection state changes: detaches
//!   the view and reconnects after a fixed delay on disconnect, and starts the
//!   video stream on connect.
//!
//! - **`interactive_session`** – Attaches the shared-memory video feed when
//!   the console announces it, polls it into a `FrameSink`, and forwards
//!   pointer, key and rotate input.

pub mod console_link;
pub mod interactive_session;
pub mod supervise_reconnect;
