//! Polling reader over the emulator's shared video region.

use tracing::{debug, info};

use super::header::{VideoInfoHeader, HEADER_SIZE};
use super::region::{FrameError, Region, RegionProvider};

/// A borrowed view of the latest pixels.
///
/// The slice points into the buffer's own storage and is overwritten by the
/// next changed poll, so sinks must copy what they want to keep.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u32],
    pub width: u32,
    pub height: u32,
    pub frame_number: u32,
    pub timestamp_us: u64,
}

/// Result of one [`SharedFrameBuffer::poll`].
#[derive(Debug)]
pub enum PollOutcome<'a> {
    /// The producer published a new frame; pixels were re-read.
    FrameChanged(Frame<'a>),
    /// Same frame number as the previous poll; nothing was copied.
    FrameUnchanged,
}

impl PollOutcome<'_> {
    pub fn is_changed(&self) -> bool {
        matches!(self, PollOutcome::FrameChanged(_))
    }
}

/// Owns one mapped video region and the pixel array decoded from it.
///
/// The frame size is fixed when the buffer is opened.  `poll` takes
/// `&mut self`, so a buffer is polled by exactly one task at a time.
pub struct SharedFrameBuffer {
    handle: String,
    region: Option<Box<dyn Region>>,
    header: VideoInfoHeader,
    pixels: Vec<u32>,
    last_frame: Option<u32>,
}

impl std::fmt::Debug for SharedFrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFrameBuffer")
            .field("handle", &self.handle)
            .field("header", &self.header)
            .field("open", &self.region.is_some())
            .field("last_frame", &self.last_frame)
            .finish()
    }
}

impl SharedFrameBuffer {
    /// Maps the region called `handle`.
    ///
    /// The header is read through a 20-byte mapping first to learn the frame
    /// size; that mapping is then released and the region is re-opened with
    /// room for the full pixel block.
    ///
    /// # Errors
    ///
    /// - [`FrameError::ResourceUnavailable`] if either mapping fails.
    /// - [`FrameError::NotPopulated`] if the producer has not written a
    ///   non-zero width and height yet.
    /// - [`FrameError::TooLarge`] if the width and height overflow the
    ///   region size arithmetic.
    pub fn open(provider: &dyn RegionProvider, handle: &str) -> Result<Self, FrameError> {
        let mut probe = provider.open(handle, HEADER_SIZE)?;
        let mut raw = [0u8; HEADER_SIZE];
        let read = probe.read_bytes(0, &mut raw);
        probe.close();
        read?;
        let header = VideoInfoHeader::parse(&raw)?;

        if !header.is_populated() {
            return Err(FrameError::NotPopulated { handle: handle.to_string() });
        }

        let (pixel_count, region_size) = match (header.pixel_count(), header.region_size()) {
            (Some(pixels), Some(size)) => (pixels, size),
            _ => {
                return Err(FrameError::TooLarge {
                    handle: handle.to_string(),
                    width: header.width,
                    height: header.height,
                })
            }
        };

        // The provider rejects regions shorter than `region_size`, so the
        // pixel array is only allocated for a frame that really exists.
        let region = provider.open(handle, region_size)?;
        info!(
            handle,
            width = header.width,
            height = header.height,
            fps = header.target_fps,
            "Attached shared video region"
        );

        Ok(Self {
            handle: handle.to_string(),
            region: Some(region),
            pixels: vec![0u32; pixel_count],
            header,
            last_frame: None,
        })
    }

    /// Re-reads the header and, if the frame number moved, the pixels.
    ///
    /// The first poll after `open` always reads pixels.  Width and height in
    /// later headers are ignored; the pixel array keeps its original size.
    ///
    /// # Errors
    ///
    /// [`FrameError::Closed`] after [`close`](Self::close), or any read error
    /// from the region.
    pub fn poll(&mut self) -> Result<PollOutcome<'_>, FrameError> {
        let region = self.region.as_ref().ok_or(FrameError::Closed)?;

        let mut raw = [0u8; HEADER_SIZE];
        region.read_bytes(0, &mut raw)?;
        let latest = VideoInfoHeader::parse(&raw)?;

        if self.last_frame == Some(latest.frame_number) {
            return Ok(PollOutcome::FrameUnchanged);
        }

        region.read_u32s(HEADER_SIZE, &mut self.pixels)?;
        debug!(
            handle = %self.handle,
            frame = latest.frame_number,
            "Read new frame"
        );

        self.last_frame = Some(latest.frame_number);
        self.header.target_fps = latest.target_fps;
        self.header.frame_number = latest.frame_number;
        self.header.timestamp_us = latest.timestamp_us;

        Ok(PollOutcome::FrameChanged(Frame {
            pixels: &self.pixels,
            width: self.header.width,
            height: self.header.height,
            frame_number: latest.frame_number,
            timestamp_us: latest.timestamp_us,
        }))
    }

    /// `(width, height)` fixed at open time.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.header.width, self.header.height)
    }

    /// Producer's target frame rate as of the last read.
    pub fn fps(&self) -> u32 {
        self.header.target_fps
    }

    /// Producer timestamp of the last frame read.
    pub fn timestamp(&self) -> u64 {
        self.header.timestamp_us
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn is_closed(&self) -> bool {
        self.region.is_none()
    }

    /// Releases the region.  Calling it again does nothing.
    pub fn close(&mut self) {
        if let Some(mut region) = self.region.take() {
            region.close();
            info!(handle = %self.handle, "Released shared video region");
        }
    }
}

impl Drop for SharedFrameBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::memory::InMemoryRegionProvider;

    const HANDLE: &str = "videmulator5554";

    fn provider_with_frame(width: u32, height: u32) -> InMemoryRegionProvider {
        let provider = InMemoryRegionProvider::new();
        provider.create(HANDLE, width, height, 30);
        provider
    }

    #[test]
    fn test_open_probes_header_then_maps_full_region() {
        // Arrange
        let provider = provider_with_frame(4, 2);

        // Act
        let buffer = SharedFrameBuffer::open(&provider, HANDLE).unwrap();

        // Assert
        assert_eq!(buffer.dimensions(), (4, 2));
        assert_eq!(buffer.fps(), 30);
        assert_eq!(provider.open_sizes(HANDLE), vec![20, 20 + 4 * 2 * 4]);
        assert_eq!(provider.close_count(HANDLE), 1, "probe mapping is released");
    }

    #[test]
    fn test_open_missing_region_is_resource_unavailable() {
        let provider = InMemoryRegionProvider::new();
        let result = SharedFrameBuffer::open(&provider, "videmulator9999");
        assert!(matches!(result, Err(FrameError::ResourceUnavailable { .. })));
    }

    #[test]
    fn test_open_zero_sized_header_is_not_populated() {
        let provider = provider_with_frame(0, 0);
        let result = SharedFrameBuffer::open(&provider, HANDLE);
        assert!(matches!(result, Err(FrameError::NotPopulated { .. })));
    }

    #[test]
    fn test_open_overflowing_header_is_too_large() {
        // Arrange
        let provider = provider_with_frame(1, 1);
        provider.overwrite_header(
            HANDLE,
            VideoInfoHeader { width: u32::MAX, height: u32::MAX, ..Default::default() },
        );

        // Act
        let result = SharedFrameBuffer::open(&provider, HANDLE);

        // Assert – only the probe was mapped
        assert!(matches!(
            result,
            Err(FrameError::TooLarge { width: u32::MAX, height: u32::MAX, .. })
        ));
        assert_eq!(provider.open_sizes(HANDLE), vec![20]);
    }

    #[test]
    fn test_open_header_larger_than_region_is_resource_unavailable() {
        // Arrange – header claims 64 x 64 over a 1 x 1 segment
        let provider = provider_with_frame(1, 1);
        provider.overwrite_header(
            HANDLE,
            VideoInfoHeader { width: 64, height: 64, target_fps: 30, ..Default::default() },
        );

        // Act
        let result = SharedFrameBuffer::open(&provider, HANDLE);

        // Assert
        assert!(matches!(result, Err(FrameError::ResourceUnavailable { .. })));
    }

    #[test]
    fn test_first_poll_reads_pixels() {
        // Arrange
        let provider = provider_with_frame(2, 1);
        provider.publish_frame(HANDLE, &[0xFF00_0000, 0xFFFF_FFFF], 1_000);
        let mut buffer = SharedFrameBuffer::open(&provider, HANDLE).unwrap();

        // Act
        let outcome = buffer.poll().unwrap();

        // Assert
        match outcome {
            PollOutcome::FrameChanged(frame) => {
                assert_eq!(frame.pixels, &[0xFF00_0000, 0xFFFF_FFFF]);
                assert_eq!(frame.frame_number, 1);
                assert_eq!(frame.timestamp_us, 1_000);
            }
            PollOutcome::FrameUnchanged => panic!("first poll must read the frame"),
        }
        assert_eq!(provider.pixel_reads(HANDLE), 1);
    }

    #[test]
    fn test_unchanged_frame_number_skips_pixel_read() {
        // Arrange
        let provider = provider_with_frame(2, 2);
        provider.publish_frame(HANDLE, &[1, 2, 3, 4], 10);
        let mut buffer = SharedFrameBuffer::open(&provider, HANDLE).unwrap();
        assert!(buffer.poll().unwrap().is_changed());

        // Act
        let second = buffer.poll().unwrap().is_changed();
        let third = buffer.poll().unwrap().is_changed();

        // Assert
        assert!(!second);
        assert!(!third);
        assert_eq!(provider.pixel_reads(HANDLE), 1);
    }

    #[test]
    fn test_each_new_frame_number_is_read_once() {
        // Arrange
        let provider = provider_with_frame(1, 1);
        let mut buffer = SharedFrameBuffer::open(&provider, HANDLE).unwrap();
        buffer.poll().unwrap();
        let baseline = provider.pixel_reads(HANDLE);

        // Act
        let mut changed = 0;
        for n in 0..5u32 {
            provider.publish_frame(HANDLE, &[n], u64::from(n));
            if buffer.poll().unwrap().is_changed() {
                changed += 1;
            }
            assert!(!buffer.poll().unwrap().is_changed());
        }

        // Assert
        assert_eq!(changed, 5);
        assert_eq!(provider.pixel_reads(HANDLE) - baseline, 5);
        assert_eq!(buffer.timestamp(), 4);
    }

    #[test]
    fn test_close_is_idempotent_and_poll_fails_after() {
        // Arrange
        let provider = provider_with_frame(1, 1);
        let mut buffer = SharedFrameBuffer::open(&provider, HANDLE).unwrap();

        // Act
        buffer.close();
        buffer.close();
        drop(buffer);

        // Assert – probe close + one full-region close
        assert_eq!(provider.close_count(HANDLE), 2);
    }

    #[test]
    fn test_poll_after_close_returns_closed() {
        let provider = provider_with_frame(1, 1);
        let mut buffer = SharedFrameBuffer::open(&provider, HANDLE).unwrap();
        buffer.close();
        assert!(matches!(buffer.poll(), Err(FrameError::Closed)));
    }

    #[test]
    fn test_drop_releases_region() {
        let provider = provider_with_frame(1, 1);
        {
            let _buffer = SharedFrameBuffer::open(&provider, HANDLE).unwrap();
        }
        assert_eq!(provider.close_count(HANDLE), 2);
    }
}
