//! emu-viewer library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does emu-viewer do? (for beginners)
//!
//! An Android emulator exposes two things on the local machine:
//!
//! - a text *console* on TCP port 5554 (5556, ... for later instances), and
//! - once asked with `screenrecord webrtc start`, a *shared-memory region*
//!   named `videmulator<port>` that holds the latest screen frame.
//!
//! The viewer:
//!
//! 1. Connects to the console and answers its auth challenge with the token
//!    stored in `~/.emulator_console_auth_token`.
//! 2. Asks the emulator to start sharing frames and waits for the region name.
//! 3. Maps the region and polls it at the emulator's frame rate, handing new
//!    frames to a frame sink.
//! 4. Turns local clicks, key presses and rotate requests into console
//!    commands (`event mouse`, `event send EV_KEY`, `rotate`).
//! 5. Reconnects one second after the console goes away.

/// Application layer: use cases for the viewer.
pub mod application;

/// Infrastructure layer: OS adapters, network, config, and command bridge.
pub mod infrastructure;
