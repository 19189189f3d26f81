//! Authentication challenge recognition.
//!
//! When console authentication is enabled, the emulator greets every new
//! connection with:
//!
//! ```text
//! Android Console: Authentication required
//! Android Console: type 'auth <auth_token>' to authenticate
//! Android Console: you can find your <auth_token> in
//! '/home/user/.emulator_console_auth_token'
//! OK
//! ```
//!
//! The client reads the token from that file and answers `auth <token>`.
//! When authentication is disabled the greeting is a help prompt followed by
//! `OK`, and no `auth` command is needed.
//!
//! [`AuthScanner`] is fed one line at a time and reports which of those two
//! outcomes the greeting resolved to.

use std::path::PathBuf;

/// Text that precedes the token path in the challenge banner.
pub const AUTH_MARKER: &str = "you can find your <auth_token> in";

/// The console's end-of-reply line.
const READY_LINE: &str = "OK";

/// Result of feeding one line to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    /// Keep feeding lines.
    Pending,
    /// The challenge named this token file.
    TokenPath(PathBuf),
    /// The console finished its greeting without a challenge.
    NotRequired,
}

/// Line-by-line scanner for the authentication banner.
#[derive(Debug, Clone)]
pub struct AuthScanner {
    marker: String,
    seen_marker: bool,
}

impl Default for AuthScanner {
    fn default() -> Self {
        Self::new(AUTH_MARKER)
    }
}

impl AuthScanner {
    /// Creates a scanner that looks for `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            seen_marker: false,
        }
    }

    /// Feeds one trimmed, non-blank line.
    ///
    /// Lines before the marker are skipped.  The first line after it is the
    /// token path (surrounding quotes removed).  If the marker line itself
    /// carries text after the marker, that text is used as the path.
    pub fn feed(&mut self, line: &str) -> AuthStep {
        if self.seen_marker {
            let path = unquote(line);
            if path.is_empty() {
                return AuthStep::Pending;
            }
            self.seen_marker = false;
            return AuthStep::TokenPath(PathBuf::from(path));
        }

        if let Some(idx) = line.find(&self.marker) {
            let rest = unquote(&line[idx + self.marker.len()..]);
            if !rest.is_empty() {
                return AuthStep::TokenPath(PathBuf::from(rest));
            }
            self.seen_marker = true;
            return AuthStep::Pending;
        }

        if line == READY_LINE {
            return AuthStep::NotRequired;
        }

        AuthStep::Pending
    }

    /// Forgets a half-seen challenge, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.seen_marker = false;
    }
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '\'' || c == '"').trim()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
