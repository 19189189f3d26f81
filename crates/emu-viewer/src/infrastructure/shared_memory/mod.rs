//! OS shared-memory adapters for the emulator's video region.
//!
//! The correct implementation is selected at compile time:
//!
//! - **unix** – `shm_open("/<handle>")` via `nix`, mapped read-only with
//!   `memmap2`.  This is how the emulator publishes the region on Linux and
//!   macOS.
//! - **windows** – a named file mapping opened with `OpenFileMappingW` and
//!   mapped with `MapViewOfFile`.
//!
//! [`NativeRegionProvider`] names whichever one the target uses.

#[cfg(unix)]
pub mod unix;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(unix)]
pub use self::unix::PosixRegionProvider as NativeRegionProvider;

#[cfg(target_os = "windows")]
pub use self::windows::WindowsRegionProvider as NativeRegionProvider;

use emu_core::frame::FrameError;

/// Wraps an OS error for `handle` as [`FrameError::ResourceUnavailable`].
pub(crate) fn unavailable(handle: &str, source: std::io::Error) -> FrameError {
    FrameError::ResourceUnavailable {
        handle: handle.to_string(),
        source,
    }
}
