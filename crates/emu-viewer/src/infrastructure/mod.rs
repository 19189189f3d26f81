//! Infrastructure layer for the viewer.
//!
//! **Dependency rule**: this layer may depend on `application` and `emu_core`,
//! but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – The console `ControlChannel`: TCP connect, auth
//!   handshake, line framing, state notifications to subscribers.
//!
//! - **`shared_memory`** – OS implementations of `RegionProvider`, chosen at
//!   compile time (`shm_open` + `mmap` on unix, file mappings on Windows).
//!
//! - **`frame_sink`** – The headless frame sink used by the binary, and a
//!   recording sink for tests.
//!
//! - **`config`** – TOML configuration file loading and saving.
//!
//! - **`ui_bridge`** – Text command handlers that expose the session to a
//!   front end with JSON responses.

pub mod config;
pub mod frame_sink;
pub mod network;
pub mod shared_memory;
pub mod ui_bridge;
