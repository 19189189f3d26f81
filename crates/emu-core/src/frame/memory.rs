//! Heap-backed [`RegionProvider`] for tests and simulations.
//!
//! Plays the producer side too: [`InMemoryRegionProvider::create`] lays out a
//! header and [`InMemoryRegionProvider::publish_frame`] writes pixels and
//! bumps the frame counter, just as the emulator does.  Every open, close and
//! pixel read is counted so tests can assert on access patterns.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::header::{VideoInfoHeader, BYTES_PER_PIXEL, HEADER_SIZE};
use super::region::{check_bounds, copy_le_u32s, FrameError, Region, RegionProvider};

#[derive(Debug, Default)]
struct Segment {
    bytes: Vec<u8>,
    open_sizes: Vec<usize>,
    closes: usize,
    pixel_reads: usize,
}

type SharedSegment = Arc<Mutex<Segment>>;

fn lock(segment: &SharedSegment) -> MutexGuard<'_, Segment> {
    segment.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Named in-memory regions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegionProvider {
    segments: Arc<Mutex<HashMap<String, SharedSegment>>>,
}

impl InMemoryRegionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) the region `handle` with a header for a
    /// `width` x `height` feed at `fps`, frame number 0 and black pixels.
    pub fn create(&self, handle: &str, width: u32, height: u32, fps: u32) {
        let header = VideoInfoHeader {
            width,
            height,
            target_fps: fps,
            frame_number: 0,
            timestamp_us: 0,
        };
        // Dimensions that overflow get a header-only segment.
        let mut bytes = vec![0u8; header.region_size().unwrap_or(HEADER_SIZE)];
        bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

        let segment = Segment { bytes, ..Segment::default() };
        self.map().insert(handle.to_string(), Arc::new(Mutex::new(segment)));
    }

    /// Writes `pixels` after the header, stores `timestamp_us` and increments
    /// the frame number.  Extra pixels beyond the frame are ignored.
    ///
    /// Returns the new frame number, or `None` if `handle` does not exist.
    pub fn publish_frame(&self, handle: &str, pixels: &[u32], timestamp_us: u64) -> Option<u32> {
        let segment = self.segment(handle)?;
        let mut seg = lock(&segment);

        let mut header = VideoInfoHeader::parse(&seg.bytes).ok()?;
        let capacity = (seg.bytes.len() - HEADER_SIZE) / BYTES_PER_PIXEL;
        for (i, px) in pixels.iter().take(capacity).enumerate() {
            let at = HEADER_SIZE + i * BYTES_PER_PIXEL;
            seg.bytes[at..at + BYTES_PER_PIXEL].copy_from_slice(&px.to_le_bytes());
        }

        header.frame_number = header.frame_number.wrapping_add(1);
        header.timestamp_us = timestamp_us;
        seg.bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        Some(header.frame_number)
    }

    /// Replaces the header of `handle` without resizing the segment, the way
    /// a producer that restarts at another resolution briefly leaves it.
    pub fn overwrite_header(&self, handle: &str, header: VideoInfoHeader) {
        if let Some(segment) = self.segment(handle) {
            lock(&segment).bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        }
    }

    /// Overwrites the advertised fps without publishing a frame.
    pub fn set_fps(&self, handle: &str, fps: u32) {
        if let Some(segment) = self.segment(handle) {
            let mut seg = lock(&segment);
            seg.bytes[8..12].copy_from_slice(&fps.to_le_bytes());
        }
    }

    /// Sizes passed to every `open` of `handle`, in order.
    pub fn open_sizes(&self, handle: &str) -> Vec<usize> {
        self.segment(handle).map(|s| lock(&s).open_sizes.clone()).unwrap_or_default()
    }

    /// Number of regions of `handle` that have been closed.
    pub fn close_count(&self, handle: &str) -> usize {
        self.segment(handle).map(|s| lock(&s).closes).unwrap_or(0)
    }

    /// Number of reads that touched the pixel block of `handle`.
    pub fn pixel_reads(&self, handle: &str) -> usize {
        self.segment(handle).map(|s| lock(&s).pixel_reads).unwrap_or(0)
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, SharedSegment>> {
        self.segments.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn segment(&self, handle: &str) -> Option<SharedSegment> {
        self.map().get(handle).cloned()
    }
}

impl RegionProvider for InMemoryRegionProvider {
    fn open(&self, handle: &str, size: usize) -> Result<Box<dyn Region>, FrameError> {
        let unavailable = |kind: io::ErrorKind, msg: &str| FrameError::ResourceUnavailable {
            handle: handle.to_string(),
            source: io::Error::new(kind, msg.to_string()),
        };

        let segment = self
            .segment(handle)
            .ok_or_else(|| unavailable(io::ErrorKind::NotFound, "no such region"))?;

        {
            let mut seg = lock(&segment);
            if size > seg.bytes.len() {
                return Err(unavailable(io::ErrorKind::InvalidInput, "mapping larger than region"));
            }
            seg.open_sizes.push(size);
        }

        Ok(Box::new(InMemoryRegion { segment: Some(segment), size }))
    }
}

/// One open mapping of an in-memory segment.
#[derive(Debug)]
pub struct InMemoryRegion {
    segment: Option<SharedSegment>,
    size: usize,
}

impl Region for InMemoryRegion {
    fn size(&self) -> usize {
        self.size
    }

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), FrameError> {
        let segment = self.segment.as_ref().ok_or(FrameError::Closed)?;
        check_bounds(offset, dst.len(), self.size)?;
        let mut seg = lock(segment);
        if offset + dst.len() > HEADER_SIZE {
            seg.pixel_reads += 1;
        }
        dst.copy_from_slice(&seg.bytes[offset..offset + dst.len()]);
        Ok(())
    }

    fn read_u32s(&self, offset: usize, dst: &mut [u32]) -> Result<(), FrameError> {
        let segment = self.segment.as_ref().ok_or(FrameError::Closed)?;
        let len = dst.len() * BYTES_PER_PIXEL;
        check_bounds(offset, len, self.size)?;
        let mut seg = lock(segment);
        if offset + len > HEADER_SIZE {
            seg.pixel_reads += 1;
        }
        copy_le_u32s(&seg.bytes[offset..offset + len], dst);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(segment) = self.segment.take() {
            lock(&segment).closes += 1;
        }
    }
}

impl Drop for InMemoryRegion {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
