//! The fixed video-info header at the start of the shared region.

use super::region::FrameError;

/// Size of the encoded header in bytes.
pub const HEADER_SIZE: usize = 20;

/// Bytes per ARGB pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Metadata the producer writes in front of the pixel block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoInfoHeader {
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    /// Incremented by the producer after each complete frame.
    pub frame_number: u32,
    /// Producer timestamp.  Only the low 32 bits are carried in the region.
    pub timestamp_us: u64,
}

impl VideoInfoHeader {
    /// Decodes the little-endian header from the first [`HEADER_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ShortHeader`] if fewer than [`HEADER_SIZE`] bytes
    /// are supplied.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::ShortHeader { available: bytes.len() });
        }
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Ok(Self {
            width: word(0),
            height: word(4),
            target_fps: word(8),
            frame_number: word(12),
            timestamp_us: u64::from(word(16)),
        })
    }

    /// Encodes the header; the timestamp is truncated to 32 bits.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.width.to_le_bytes());
        out[4..8].copy_from_slice(&self.height.to_le_bytes());
        out[8..12].copy_from_slice(&self.target_fps.to_le_bytes());
        out[12..16].copy_from_slice(&self.frame_number.to_le_bytes());
        out[16..20].copy_from_slice(&(self.timestamp_us as u32).to_le_bytes());
        out
    }

    /// `true` once the producer has written real dimensions.
    pub fn is_populated(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Number of pixels in one frame, or `None` if it does not fit in `usize`.
    pub fn pixel_count(&self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.height).ok()?)
    }

    /// Total region size: header plus one frame of pixels.  `None` when the
    /// dimensions overflow the address space.
    pub fn region_size(&self) -> Option<usize> {
        self.pixel_count()?
            .checked_mul(BYTES_PER_PIXEL)?
            .checked_add(HEADER_SIZE)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reads_little_endian_fields() {
        // Arrange – 1080 x 1920 @ 60, frame 7, ts 0x01020304
        let bytes: [u8; HEADER_SIZE] = [
            0x38, 0x04, 0, 0, // 1080
            0x80, 0x07, 0, 0, // 1920
            60, 0, 0, 0, //
            7, 0, 0, 0, //
            0x04, 0x03, 0x02, 0x01,
        ];

        // Act
        let header = VideoInfoHeader::parse(&bytes).unwrap();

        // Assert
        assert_eq!(header.width, 1080);
        assert_eq!(header.height, 1920);
        assert_eq!(header.target_fps, 60);
        assert_eq!(header.frame_number, 7);
        assert_eq!(header.timestamp_us, 0x0102_0304);
    }

    #[test]
    fn test_parse_rejects_short_input() {
        let result = VideoInfoHeader::parse(&[0u8; 12]);
        assert!(matches!(result, Err(FrameError::ShortHeader { available: 12 })));
    }

    #[test]
    fn test_to_bytes_truncates_timestamp_to_low_32_bits() {
        let header = VideoInfoHeader {
            width: 2,
            height: 2,
            target_fps: 30,
            frame_number: 1,
            timestamp_us: 0xAAAA_0000_0000_0005,
        };

        let decoded = VideoInfoHeader::parse(&header.to_bytes()).unwrap();

        assert_eq!(decoded.timestamp_us, 5);
        assert_eq!(decoded.width, 2);
    }

    #[test]
    fn test_region_size_includes_header() {
        let header = VideoInfoHeader { width: 100, height: 150, ..Default::default() };
        assert_eq!(header.region_size(), Some(20 + 100 * 150 * 4));
    }

    #[test]
    fn test_region_size_overflow_is_none() {
        // Arrange – a garbage header from a half-written region
        let header = VideoInfoHeader { width: u32::MAX, height: u32::MAX, ..Default::default() };

        // Act / Assert
        #[cfg(target_pointer_width = "64")]
        assert_eq!(header.pixel_count(), Some(u32::MAX as usize * u32::MAX as usize));
        assert_eq!(header.region_size(), None);
    }

    #[test]
    fn test_zero_dimensions_are_not_populated() {
        let header = VideoInfoHeader { width: 0, height: 640, ..Default::default() };
        assert!(!header.is_populated());
    }
}
