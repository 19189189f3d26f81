//! Connection states, channel events, and inbound line classification.

use serde::{Deserialize, Serialize};

/// Console port of the first emulator instance.  Later instances use
/// 5556, 5558, ... (even ports; the odd neighbour is the adb port).
pub const DEFAULT_CONSOLE_PORT: u16 = 5554;

/// Prefix of the shared-memory handle the console announces after
/// `screenrecord webrtc start`.
pub const VIDEO_HANDLE_PREFIX: &str = "videmulator";

/// Returns the handle the emulator on `port` uses for its video region,
/// e.g. `videmulator5554`.
pub fn default_video_handle(port: u16) -> String {
    format!("{VIDEO_HANDLE_PREFIX}{port}")
}

/// State of the console control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// A connect attempt is in flight, or the socket is open but the console
    /// has not yet accepted us.
    Connecting,
    /// Socket open and authorized; commands will be honoured.
    Connected,
    /// No usable connection.
    Disconnected,
}

/// Event published by the control channel to every subscriber, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel entered `state`.  Repeated identical states are delivered
    /// as-is.
    StateChanged(ConnectionState),
    /// A line arrived while authorized.
    MessageReceived(String),
}

/// What an inbound console line means to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleReply<'a> {
    /// `OK` – the previous command succeeded.
    Ok,
    /// `KO: <reason>` – the previous command failed.
    Ko(&'a str),
    /// The shared-memory video handle, prefix included.
    VideoHandle(&'a str),
    /// Anything else (help text, command output).
    Other(&'a str),
}

/// Classifies a trimmed console line.
///
/// # Examples
///
/// ```rust
/// use emu_core::protocol::{classify_line, ConsoleReply, VIDEO_HANDLE_PREFIX};
///
/// assert_eq!(
///     classify_line("videmulator5554", VIDEO_HANDLE_PREFIX),
///     ConsoleReply::VideoHandle("videmulator5554")
/// );
/// assert_eq!(classify_line("KO: bad", VIDEO_HANDLE_PREFIX), ConsoleReply::Ko("bad"));
/// ```
pub fn classify_line<'a>(line: &'a str, handle_prefix: &str) -> ConsoleReply<'a> {
    if line == "OK" {
        ConsoleReply::Ok
    } else if let Some(reason) = line.strip_prefix("KO:") {
        ConsoleReply::Ko(reason.trim())
    } else if !handle_prefix.is_empty() && line.starts_with(handle_prefix) {
        ConsoleReply::VideoHandle(line)
    } else {
        ConsoleReply::Other(line)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
