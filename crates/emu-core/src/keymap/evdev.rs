//! Local key to linux input-event code table.
//!
//! Codes come from `include/uapi/linux/input-event-codes.h`.  The emulated
//! device runs a linux kernel, and the console's `event send EV_KEY:<code>:<v>`
//! command feeds the code straight into its input subsystem.
//!
//! # Why linux codes and not Android keycodes?
//!
//! Android's `KEYCODE_*` values are assigned by the framework *after* the
//! kernel delivers the event.  The console injects at the kernel level, so it
//! wants the kernel's numbering: `KEY_A` is 30 here even though Android calls
//! the same key `KEYCODE_A = 29`.
//!
//! The table is a plain array of pairs.  [`lookup`] indexes it through a
//! `HashMap` that is built exactly once per process and never mutated.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::local::LocalKey;

/// `(local key, linux KEY_* code)` pairs.  Keys absent from this list have no
/// device-side equivalent.
pub const EVDEV_CODES: &[(LocalKey, u16)] = &[
    // Letters
    (LocalKey::KeyA, 30), // KEY_A
    (LocalKey::KeyB, 48), // KEY_B
    (LocalKey::KeyC, 46), // KEY_C
    (LocalKey::KeyD, 32), // KEY_D
    (LocalKey::KeyE, 18), // KEY_E
    (LocalKey::KeyF, 33), // KEY_F
    (LocalKey::KeyG, 34), // KEY_G
    (LocalKey::KeyH, 35), // KEY_H
    (LocalKey::KeyI, 23), // KEY_I
    (LocalKey::KeyJ, 36), // KEY_J
    (LocalKey::KeyK, 37), // KEY_K
    (LocalKey::KeyL, 38), // KEY_L
    (LocalKey::KeyM, 50), // KEY_M
    (LocalKey::KeyN, 49), // KEY_N
    (LocalKey::KeyO, 24), // KEY_O
    (LocalKey::KeyP, 25), // KEY_P
    (LocalKey::KeyQ, 16), // KEY_Q
    (LocalKey::KeyR, 19), // KEY_R
    (LocalKey::KeyS, 31), // KEY_S
    (LocalKey::KeyT, 20), // KEY_T
    (LocalKey::KeyU, 22), // KEY_U
    (LocalKey::KeyV, 47), // KEY_V
    (LocalKey::KeyW, 17), // KEY_W
    (LocalKey::KeyX, 45), // KEY_X
    (LocalKey::KeyY, 21), // KEY_Y
    (LocalKey::KeyZ, 44), // KEY_Z
    // Digits
    (LocalKey::Digit1, 2),  // KEY_1
    (LocalKey::Digit2, 3),  // KEY_2
    (LocalKey::Digit3, 4),  // KEY_3
    (LocalKey::Digit4, 5),  // KEY_4
    (LocalKey::Digit5, 6),  // KEY_5
    (LocalKey::Digit6, 7),  // KEY_6
    (LocalKey::Digit7, 8),  // KEY_7
    (LocalKey::Digit8, 9),  // KEY_8
    (LocalKey::Digit9, 10), // KEY_9
    (LocalKey::Digit0, 11), // KEY_0
    // Editing and whitespace
    (LocalKey::Escape, 1),     // KEY_ESC
    (LocalKey::Backspace, 14), // KEY_BACKSPACE
    (LocalKey::Tab, 15),       // KEY_TAB
    (LocalKey::Enter, 28),     // KEY_ENTER
    (LocalKey::Space, 57),     // KEY_SPACE
    (LocalKey::Insert, 110),   // KEY_INSERT
    (LocalKey::Delete, 111),   // KEY_DELETE
    // Punctuation
    (LocalKey::Minus, 12),        // KEY_MINUS
    (LocalKey::Equal, 13),        // KEY_EQUAL
    (LocalKey::BracketLeft, 26),  // KEY_LEFTBRACE
    (LocalKey::BracketRight, 27), // KEY_RIGHTBRACE
    (LocalKey::Semicolon, 39),    // KEY_SEMICOLON
    (LocalKey::Quote, 40),        // KEY_APOSTROPHE
    (LocalKey::Backquote, 41),    // KEY_GRAVE
    (LocalKey::Backslash, 43),    // KEY_BACKSLASH
    (LocalKey::Comma, 51),        // KEY_COMMA
    (LocalKey::Period, 52),       // KEY_DOT
    (LocalKey::Slash, 53),        // KEY_SLASH
    // Navigation
    (LocalKey::Home, 102),       // KEY_HOME
    (LocalKey::ArrowUp, 103),    // KEY_UP
    (LocalKey::PageUp, 104),     // KEY_PAGEUP
    (LocalKey::ArrowLeft, 105),  // KEY_LEFT
    (LocalKey::ArrowRight, 106), // KEY_RIGHT
    (LocalKey::End, 107),        // KEY_END
    (LocalKey::ArrowDown, 108),  // KEY_DOWN
    (LocalKey::PageDown, 109),   // KEY_PAGEDOWN
    // Function keys
    (LocalKey::F1, 59),  // KEY_F1
    (LocalKey::F2, 60),  // KEY_F2
    (LocalKey::F3, 61),  // KEY_F3
    (LocalKey::F4, 62),  // KEY_F4
    (LocalKey::F5, 63),  // KEY_F5
    (LocalKey::F6, 64),  // KEY_F6
    (LocalKey::F7, 65),  // KEY_F7
    (LocalKey::F8, 66),  // KEY_F8
    (LocalKey::F9, 67),  // KEY_F9
    (LocalKey::F10, 68), // KEY_F10
    (LocalKey::F11, 87), // KEY_F11
    (LocalKey::F12, 88), // KEY_F12
    // Modifiers
    (LocalKey::ControlLeft, 29),   // KEY_LEFTCTRL
    (LocalKey::ShiftLeft, 42),     // KEY_LEFTSHIFT
    (LocalKey::ShiftRight, 54),    // KEY_RIGHTSHIFT
    (LocalKey::AltLeft, 56),       // KEY_LEFTALT
    (LocalKey::CapsLock, 58),      // KEY_CAPSLOCK
    (LocalKey::ControlRight, 97),  // KEY_RIGHTCTRL
    (LocalKey::AltRight, 100),     // KEY_RIGHTALT
    (LocalKey::MetaLeft, 125),     // KEY_LEFTMETA
    (LocalKey::MetaRight, 126),    // KEY_RIGHTMETA
    // Handset keys
    (LocalKey::VolumeDown, 114), // KEY_VOLUMEDOWN
    (LocalKey::VolumeUp, 115),   // KEY_VOLUMEUP
    (LocalKey::Power, 116),      // KEY_POWER
    (LocalKey::Menu, 139),       // KEY_MENU
    (LocalKey::Back, 158),       // KEY_BACK
    (LocalKey::Camera, 212),     // KEY_CAMERA
    (LocalKey::Search, 217),     // KEY_SEARCH
    (LocalKey::AppSwitch, 580),  // KEY_APPSELECT
];

fn table() -> &'static HashMap<LocalKey, u16> {
    static TABLE: OnceLock<HashMap<LocalKey, u16>> = OnceLock::new();
    TABLE.get_or_init(|| EVDEV_CODES.iter().copied().collect())
}

/// Returns the linux input-event code for `key`, or `None` if unmapped.
pub fn lookup(key: LocalKey) -> Option<u16> {
    table().get(&key).copied()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
