//! Local key identifiers.
//!
//! [`LocalKey`] names a key the way the viewer's input source reports it,
//! independent of keyboard layout.  The names follow the DOM
//! `KeyboardEvent.code` convention (`KeyA`, `Digit1`, `ArrowLeft`, ...) so that
//! a UI layer can forward its key events with a plain string lookup, plus a
//! handful of device keys (`VolumeUp`, `Power`, `Back`, ...) that only exist
//! on the emulated handset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not name any [`LocalKey`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown key name: {0}")]
pub struct ParseLocalKeyError(pub String);

/// A key on the local input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalKey {
    // Letters
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,

    // Digits (top row)
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,

    // Editing and whitespace
    Enter,
    Escape,
    Backspace,
    Tab,
    Space,
    Insert,
    Delete,

    // Punctuation
    Minus,
    Equal,
    BracketLeft,
    BracketRight,
    Backslash,
    Semicolon,
    Quote,
    Backquote,
    Comma,
    Period,
    Slash,

    // Navigation
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Modifiers
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    MetaLeft,
    MetaRight,
    CapsLock,

    // Desktop-only keys with no handset equivalent
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    ContextMenu,

    // Handset keys
    VolumeUp,
    VolumeDown,
    Power,
    Back,
    AppSwitch,
    Menu,
    Search,
    Camera,
}

impl LocalKey {
    /// Every key, in declaration order.
    pub const ALL: &'static [LocalKey] = &[
        LocalKey::KeyA,
        LocalKey::KeyB,
        LocalKey::KeyC,
        LocalKey::KeyD,
        LocalKey::KeyE,
        LocalKey::KeyF,
        LocalKey::KeyG,
        LocalKey::KeyH,
        LocalKey::KeyI,
        LocalKey::KeyJ,
        LocalKey::KeyK,
        LocalKey::KeyL,
        LocalKey::KeyM,
        LocalKey::KeyN,
        LocalKey::KeyO,
        LocalKey::KeyP,
        LocalKey::KeyQ,
        LocalKey::KeyR,
        LocalKey::KeyS,
        LocalKey::KeyT,
        LocalKey::KeyU,
        LocalKey::KeyV,
        LocalKey::KeyW,
        LocalKey::KeyX,
        LocalKey::KeyY,
        LocalKey::KeyZ,
        LocalKey::Digit0,
        LocalKey::Digit1,
        LocalKey::Digit2,
        LocalKey::Digit3,
        LocalKey::Digit4,
        LocalKey::Digit5,
        LocalKey::Digit6,
        LocalKey::Digit7,
        LocalKey::Digit8,
        LocalKey::Digit9,
        LocalKey::Enter,
        LocalKey::Escape,
        LocalKey::Backspace,
        LocalKey::Tab,
        LocalKey::Space,
        LocalKey::Insert,
        LocalKey::Delete,
        LocalKey::Minus,
        LocalKey::Equal,
        LocalKey::BracketLeft,
        LocalKey::BracketRight,
        LocalKey::Backslash,
        LocalKey::Semicolon,
        LocalKey::Quote,
        LocalKey::Backquote,
        LocalKey::Comma,
        LocalKey::Period,
        LocalKey::Slash,
        LocalKey::ArrowUp,
        LocalKey::ArrowDown,
        LocalKey::ArrowLeft,
        LocalKey::ArrowRight,
        LocalKey::Home,
        LocalKey::End,
        LocalKey::PageUp,
        LocalKey::PageDown,
        LocalKey::F1,
        LocalKey::F2,
        LocalKey::F3,
        LocalKey::F4,
        LocalKey::F5,
        LocalKey::F6,
        LocalKey::F7,
        LocalKey::F8,
        LocalKey::F9,
        LocalKey::F10,
        LocalKey::F11,
        LocalKey::F12,
        LocalKey::ShiftLeft,
        LocalKey::ShiftRight,
        LocalKey::ControlLeft,
        LocalKey::ControlRight,
        LocalKey::AltLeft,
        LocalKey::AltRight,
        LocalKey::MetaLeft,
        LocalKey::MetaRight,
        LocalKey::CapsLock,
        LocalKey::NumLock,
        LocalKey::ScrollLock,
        LocalKey::PrintScreen,
        LocalKey::Pause,
        LocalKey::ContextMenu,
        LocalKey::VolumeUp,
        LocalKey::VolumeDown,
        LocalKey::Power,
        LocalKey::Back,
        LocalKey::AppSwitch,
        LocalKey::Menu,
        LocalKey::Search,
        LocalKey::Camera,
    ];

    /// The key's name, identical to the variant identifier.
    pub fn name(self) -> &'static str {
        match self {
            LocalKey::KeyA => "KeyA",
            LocalKey::KeyB => "KeyB",
            LocalKey::KeyC => "KeyC",
            LocalKey::KeyD => "KeyD",
            LocalKey::KeyE => "KeyE",
            LocalKey::KeyF => "KeyF",
            LocalKey::KeyG => "KeyG",
            LocalKey::KeyH => "KeyH",
            LocalKey::KeyI => "KeyI",
            LocalKey::KeyJ => "KeyJ",
            LocalKey::KeyK => "KeyK",
            LocalKey::KeyL => "KeyL",
            LocalKey::KeyM => "KeyM",
            LocalKey::KeyN => "KeyN",
            LocalKey::KeyO => "KeyO",
            LocalKey::KeyP => "KeyP",
            LocalKey::KeyQ => "KeyQ",
            LocalKey::KeyR => "KeyR",
            LocalKey::KeyS => "KeyS",
            LocalKey::KeyT => "KeyT",
            LocalKey::KeyU => "KeyU",
            LocalKey::KeyV => "KeyV",
            LocalKey::KeyW => "KeyW",
            LocalKey::KeyX => "KeyX",
            LocalKey::KeyY => "KeyY",
            LocalKey::KeyZ => "KeyZ",
            LocalKey::Digit0 => "Digit0",
            LocalKey::Digit1 => "Digit1",
            LocalKey::Digit2 => "Digit2",
            LocalKey::Digit3 => "Digit3",
            LocalKey::Digit4 => "Digit4",
            LocalKey::Digit5 => "Digit5",
            LocalKey::Digit6 => "Digit6",
            LocalKey::Digit7 => "Digit7",
            LocalKey::Digit8 => "Digit8",
            LocalKey::Digit9 => "Digit9",
            LocalKey::Enter => "Enter",
            LocalKey::Escape => "Escape",
            LocalKey::Backspace => "Backspace",
            LocalKey::Tab => "Tab",
            LocalKey::Space => "Space",
            LocalKey::Insert => "Insert",
            LocalKey::Delete => "Delete",
            LocalKey::Minus => "Minus",
            LocalKey::Equal => "Equal",
            LocalKey::BracketLeft => "BracketLeft",
            LocalKey::BracketRight => "BracketRight",
            LocalKey::Backslash => "Backslash",
            LocalKey::Semicolon => "Semicolon",
            LocalKey::Quote => "Quote",
            LocalKey::Backquote => "Backquote",
            LocalKey::Comma => "Comma",
            LocalKey::Period => "Period",
            LocalKey::Slash => "Slash",
            LocalKey::ArrowUp => "ArrowUp",
            LocalKey::ArrowDown => "ArrowDown",
            LocalKey::ArrowLeft => "ArrowLeft",
            LocalKey::ArrowRight => "ArrowRight",
            LocalKey::Home => "Home",
            LocalKey::End => "End",
            LocalKey::PageUp => "PageUp",
            LocalKey::PageDown => "PageDown",
            LocalKey::F1 => "F1",
            LocalKey::F2 => "F2",
            LocalKey::F3 => "F3",
            LocalKey::F4 => "F4",
            LocalKey::F5 => "F5",
            LocalKey::F6 => "F6",
            LocalKey::F7 => "F7",
            LocalKey::F8 => "F8",
            LocalKey::F9 => "F9",
            LocalKey::F10 => "F10",
            LocalKey::F11 => "F11",
            LocalKey::F12 => "F12",
            LocalKey::ShiftLeft => "ShiftLeft",
            LocalKey::ShiftRight => "ShiftRight",
            LocalKey::ControlLeft => "ControlLeft",
            LocalKey::ControlRight => "ControlRight",
            LocalKey::AltLeft => "AltLeft",
            LocalKey::AltRight => "AltRight",
            LocalKey::MetaLeft => "MetaLeft",
            LocalKey::MetaRight => "MetaRight",
            LocalKey::CapsLock => "CapsLock",
            LocalKey::NumLock => "NumLock",
            LocalKey::ScrollLock => "ScrollLock",
            LocalKey::PrintScreen => "PrintScreen",
            LocalKey::Pause => "Pause",
            LocalKey::ContextMenu => "ContextMenu",
            LocalKey::VolumeUp => "VolumeUp",
            LocalKey::VolumeDown => "VolumeDown",
            LocalKey::Power => "Power",
            LocalKey::Back => "Back",
            LocalKey::AppSwitch => "AppSwitch",
            LocalKey::Menu => "Menu",
            LocalKey::Search => "Search",
            LocalKey::Camera => "Camera",
        }
    }
}

impl fmt::Display for LocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LocalKey {
    type Err = ParseLocalKeyError;

    /// Parses a key name, ignoring ASCII case (`"keya"` and `"KeyA"` both work).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocalKey::ALL
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLocalKeyError(s.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
