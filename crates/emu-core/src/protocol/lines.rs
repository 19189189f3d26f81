//! Reassembly of console bytes into lines.
//!
//! # Why a buffer is needed
//!
//! TCP is a stream protocol.  A single `read()` may end in the middle of a
//! line (`"Android Console: you can f"`) or carry several lines at once.  The
//! authentication banner in particular spans four lines that the console
//! writes in separate calls, so the challenge marker and the token path can
//! land in different reads.
//!
//! [`LineAccumulator`] keeps the unterminated tail between calls and only
//! yields complete lines.  Lines are split on `\n`, trimmed (which also drops
//! the console's `\r`), and blank lines are discarded.

/// Upper bound on an unterminated line.  A peer that streams this many bytes
/// without a newline gets its partial line flushed as-is.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Accumulates bytes across reads and splits them into trimmed lines.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    pending: Vec<u8>,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every line completed by them, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            push_trimmed(&mut lines, &raw[..raw.len() - 1]);
        }

        if self.pending.len() > MAX_LINE_LEN {
            let raw = std::mem::take(&mut self.pending);
            push_trimmed(&mut lines, &raw);
        }

        lines
    }

    /// Bytes received after the last newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops any partial line, e.g. when the connection is torn down.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

fn push_trimmed(lines: &mut Vec<String>, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
