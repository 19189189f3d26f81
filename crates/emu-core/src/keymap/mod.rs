//! Key code translation from local key identifiers to the device's input codes.
//!
//! The emulator console injects keys with `event send EV_KEY:<code>:<value>`,
//! where `<code>` is a linux input-event code (`KEY_A` = 30, `KEY_ENTER` = 28,
//! ...).  The viewer identifies keys with [`LocalKey`]; [`KeyTranslator`] maps
//! one to the other through an immutable table built on first use.
//!
//! Not every local key has a device counterpart.  A missing mapping is a
//! normal case: [`KeyTranslator::translate`] returns an empty string and the
//! caller sends nothing.

pub mod evdev;
pub mod local;

pub use local::{LocalKey, ParseLocalKeyError};

use crate::protocol::ConsoleCommand;

/// Stateless translator over the process-wide evdev table.
pub struct KeyTranslator;

impl KeyTranslator {
    /// Returns the linux input-event code for `key`, if the device has one.
    pub fn evdev_code(key: LocalKey) -> Option<u16> {
        evdev::lookup(key)
    }

    /// Formats the console command that presses (`is_press = true`) or
    /// releases `key`.
    ///
    /// Returns an empty string when `key` has no mapping.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use emu_core::keymap::{KeyTranslator, LocalKey};
    ///
    /// assert_eq!(KeyTranslator::translate(LocalKey::KeyA, true), "event send EV_KEY:30:1");
    /// assert_eq!(KeyTranslator::translate(LocalKey::ScrollLock, true), "");
    /// ```
    pub fn translate(key: LocalKey, is_press: bool) -> String {
        match Self::evdev_code(key) {
            Some(code) => ConsoleCommand::Key {
                code,
                pressed: is_press,
            }
            .to_string(),
            None => String::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
