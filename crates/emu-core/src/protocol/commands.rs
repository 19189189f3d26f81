//! Outbound console commands.
//!
//! Each [`ConsoleCommand`] renders (via `Display`) to exactly one console line
//! *without* the trailing newline; the control channel appends the terminator
//! when it writes.
//!
//! | Variant            | Wire text                                   |
//! |--------------------|---------------------------------------------|
//! | `Auth`             | `auth <token>`                              |
//! | `ScreenShareStart` | `screenrecord webrtc start [fps]`           |
//! | `ScreenShareStop`  | `screenrecord webrtc stop`                  |
//! | `Mouse`            | `event mouse <x> <y> 0 <buttons>`           |
//! | `Key`              | `event send EV_KEY:<code>:<0\|1>`           |
//! | `Rotate`           | `rotate`                                    |

use std::fmt;

/// Mouse button bit mask understood by `event mouse`.
pub mod buttons {
    pub const NONE: u32 = 0;
    pub const LEFT: u32 = 1;
    pub const RIGHT: u32 = 2;
    pub const MIDDLE: u32 = 4;
    pub const WHEEL_UP: u32 = 8;
    pub const WHEEL_DOWN: u32 = 16;
}

/// Device index for `event mouse`: 0 is the touch screen, 1 the trackball.
const TOUCH_SCREEN_DEVICE: u32 = 0;

/// A command sent to the emulator console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Answers the authentication challenge.
    Auth { token: String },
    /// Starts sharing video frames through shared memory.  The console replies
    /// with the region handle.  `fps` defaults to 60 on the device side.
    ScreenShareStart { fps: Option<u32> },
    /// Stops the shared-memory video module.
    ScreenShareStop,
    /// Pointer event in device pixels with a [`buttons`] mask.
    Mouse { x: i32, y: i32, buttons: u32 },
    /// Kernel key event.
    Key { code: u16, pressed: bool },
    /// Rotates the device 90 degrees clockwise.
    Rotate,
}

impl fmt::Display for ConsoleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleCommand::Auth { token } => write!(f, "auth {token}"),
            ConsoleCommand::ScreenShareStart { fps: None } => f.write_str("screenrecord webrtc start"),
            ConsoleCommand::ScreenShareStart { fps: Some(fps) } => {
                write!(f, "screenrecord webrtc start {fps}")
            }
            ConsoleCommand::ScreenShareStop => f.write_str("screenrecord webrtc stop"),
            ConsoleCommand::Mouse { x, y, buttons } => {
                write!(f, "event mouse {x} {y} {TOUCH_SCREEN_DEVICE} {buttons}")
            }
            ConsoleCommand::Key { code, pressed } => {
                write!(f, "event send EV_KEY:{code}:{}", u8::from(*pressed))
            }
            ConsoleCommand::Rotate => f.write_str("rotate"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_includes_token() {
        let cmd = ConsoleCommand::Auth { token: "s3cr3t".to_string() };
        assert_eq!(cmd.to_string(), "auth s3cr3t");
    }

    #[test]
    fn test_screen_share_start_without_fps() {
        assert_eq!(
            ConsoleCommand::ScreenShareStart { fps: None }.to_string(),
            "screenrecord webrtc start"
        );
    }

    #[test]
    fn test_screen_share_start_with_fps() {
        assert_eq!(
            ConsoleCommand::ScreenShareStart { fps: Some(30) }.to_string(),
            "screenrecord webrtc start 30"
        );
    }

    #[test]
    fn test_mouse_uses_touch_screen_device() {
        // Arrange
        let cmd = ConsoleCommand::Mouse { x: 540, y: 960, buttons: buttons::LEFT };

        // Act / Assert
        assert_eq!(cmd.to_string(), "event mouse 540 960 0 1");
    }

    #[test]
    fn test_key_press_and_release() {
        let down = ConsoleCommand::Key { code: 30, pressed: true };
        let up = ConsoleCommand::Key { code: 30, pressed: false };
        assert_eq!(down.to_string(), "event send EV_KEY:30:1");
        assert_eq!(up.to_string(), "event send EV_KEY:30:0");
    }

    #[test]
    fn test_rotate_and_stop_are_bare_words() {
        assert_eq!(ConsoleCommand::Rotate.to_string(), "rotate");
        assert_eq!(
            ConsoleCommand::ScreenShareStop.to_string(),
            "screenrecord webrtc stop"
        );
    }

    #[test]
    fn test_commands_never_contain_newlines() {
        let cmds = [
            ConsoleCommand::Auth { token: "t".into() },
            ConsoleCommand::ScreenShareStart { fps: Some(60) },
            ConsoleCommand::Mouse { x: -1, y: 2, buttons: buttons::WHEEL_DOWN },
            ConsoleCommand::Rotate,
        ];
        for cmd in cmds {
            assert!(!cmd.to_string().contains('\n'));
        }
    }
}
