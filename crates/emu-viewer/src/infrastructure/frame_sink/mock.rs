//! Recording frame sink for unit tests.
//!
//! Every `present` call copies the pixels into `presented` so tests can
//! assert on exactly what reached the screen and in what order.

use std::sync::Mutex;

use crate::application::interactive_session::FrameSink;

/// A copy of one presented frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedFrame {
    pub pixels: Vec<u32>,
    pub width: u32,
    pub height: u32,
}

/// A sink that records calls instead of drawing.
#[derive(Default)]
pub struct MockFrameSink {
    pub frames: Mutex<Vec<PresentedFrame>>,
    pub repaints: Mutex<usize>,
}

impl MockFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every frame presented so far.
    pub fn presented(&self) -> Vec<PresentedFrame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn repaint_count(&self) -> usize {
        *self.repaints.lock().unwrap()
    }
}

impl FrameSink for MockFrameSink {
    fn present(&self, pixels: &[u32], width: u32, height: u32) {
        self.frames.lock().unwrap().push(PresentedFrame {
            pixels: pixels.to_vec(),
            width,
            height,
        });
    }

    fn request_repaint(&self) {
        *self.repaints.lock().unwrap() += 1;
    }
}
