//! Frame sink implementations.
//!
//! The viewer binary runs without a window, so its sink keeps the latest
//! frame in memory and tracks delivery statistics instead of drawing.  A
//! toolkit-backed sink would implement the same [`FrameSink`] trait.
//!
//! `mock` provides a recording sink for tests.

pub mod mock;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::interactive_session::FrameSink;

/// How often the headless sink logs its frame rate.
const STATS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Delivery statistics for status output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub frames_presented: u64,
    pub repaints_requested: u64,
    pub width: u32,
    pub height: u32,
    /// Frames per second over the last completed logging window.
    pub recent_fps: f64,
}

#[derive(Default)]
struct SinkState {
    last_frame: Vec<u32>,
    stats: FrameStats,
    window_start: Option<Instant>,
    window_frames: u64,
}

/// Keeps the most recent frame and counts deliveries.
///
/// The last frame survives disconnects so a status query can still report
/// what was last shown.
#[derive(Default)]
pub struct HeadlessFrameSink {
    state: Mutex<SinkState>,
}

impl HeadlessFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> FrameStats {
        self.state().stats.clone()
    }

    /// Copy of the most recently presented pixels.
    pub fn last_frame(&self) -> Vec<u32> {
        self.state().last_frame.clone()
    }
}

impl FrameSink for HeadlessFrameSink {
    fn present(&self, pixels: &[u32], width: u32, height: u32) {
        let mut state = self.state();
        state.last_frame.clear();
        state.last_frame.extend_from_slice(pixels);
        state.stats.frames_presented += 1;
        state.stats.width = width;
        state.stats.height = height;

        let now = Instant::now();
        let start = *state.window_start.get_or_insert(now);
        state.window_frames += 1;
        let elapsed = now.duration_since(start);
        if elapsed >= STATS_LOG_INTERVAL {
            let fps = state.window_frames as f64 / elapsed.as_secs_f64();
            state.stats.recent_fps = fps;
            state.window_start = Some(now);
            state.window_frames = 0;
            info!(width, height, fps, "Video feed");
        }
    }

    fn request_repaint(&self) {
        self.state().stats.repaints_requested += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_keeps_copy_of_last_frame() {
        // Arrange
        let sink = HeadlessFrameSink::new();

        // Act
        sink.present(&[1, 2, 3, 4], 2, 2);
        sink.present(&[5, 6, 7, 8], 2, 2);

        // Assert
        assert_eq!(sink.last_frame(), vec![5, 6, 7, 8]);
        let stats = sink.stats();
        assert_eq!(stats.frames_presented, 2);
        assert_eq!((stats.width, stats.height), (2, 2));
    }

    #[test]
    fn test_repaints_are_counted_separately() {
        let sink = HeadlessFrameSink::new();

        sink.request_repaint();
        sink.request_repaint();

        assert_eq!(sink.stats().repaints_requested, 2);
        assert_eq!(sink.stats().frames_presented, 0);
    }

    #[test]
    fn test_stats_serialize_to_json() {
        let sink = HeadlessFrameSink::new();
        sink.present(&[0], 1, 1);

        let json = serde_json::to_value(sink.stats()).unwrap();

        assert_eq!(json["frames_presented"], 1);
        assert_eq!(json["width"], 1);
    }
}
