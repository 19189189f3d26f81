//! Shared-memory capability traits and the frame error type.
//!
//! A [`RegionProvider`] opens named regions; a [`Region`] is a read-only view
//! of one.  Implementations live wherever the OS calls live (the viewer
//! crate's `shared_memory` module) so this crate stays free of `unsafe` and
//! platform conditionals.

use thiserror::Error;

/// Errors raised while opening or reading a shared video region.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The region could not be mapped.  Fatal to the attach attempt only.
    #[error("shared memory region '{handle}' is unavailable: {source}")]
    ResourceUnavailable {
        handle: String,
        #[source]
        source: std::io::Error,
    },

    /// The producer has not published a frame size yet.
    #[error("shared memory region '{handle}' has no frame dimensions yet")]
    NotPopulated { handle: String },

    /// The header's dimensions do not describe an addressable frame.
    #[error("shared memory region '{handle}' claims an oversized {width}x{height} frame")]
    TooLarge { handle: String, width: u32, height: u32 },

    /// Fewer than 20 header bytes were supplied.
    #[error("video header needs 20 bytes, got {available}")]
    ShortHeader { available: usize },

    /// A read reached past the end of the mapping.
    #[error("read of {len} bytes at offset {offset} exceeds region size {size}")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    /// The region was already released.
    #[error("shared memory region is closed")]
    Closed,
}

/// A mapped, readable shared-memory region.
///
/// Implementations release the OS mapping in `close` and must tolerate
/// `close` being followed by `Drop`.
pub trait Region: Send {
    /// Size of the mapping in bytes.
    fn size(&self) -> usize;

    /// Copies `dst.len()` bytes starting at `offset` into `dst`.
    ///
    /// # Errors
    ///
    /// [`FrameError::OutOfBounds`] if the range leaves the mapping,
    /// [`FrameError::Closed`] after `close`.
    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), FrameError>;

    /// Copies `dst.len()` little-endian `u32`s starting at byte `offset`.
    ///
    /// # Errors
    ///
    /// Same as [`Region::read_bytes`].
    fn read_u32s(&self, offset: usize, dst: &mut [u32]) -> Result<(), FrameError>;

    /// Releases the mapping.  Subsequent reads fail with [`FrameError::Closed`].
    fn close(&mut self);
}

/// Opens shared-memory regions by handle name.
pub trait RegionProvider: Send + Sync {
    /// Maps `size` bytes of the region called `handle`.
    ///
    /// # Errors
    ///
    /// [`FrameError::ResourceUnavailable`] carrying the OS error when the
    /// region does not exist or cannot be mapped.
    fn open(&self, handle: &str, size: usize) -> Result<Box<dyn Region>, FrameError>;
}

/// Checks that `[offset, offset + len)` lies within a mapping of `size` bytes.
///
/// # Errors
///
/// [`FrameError::OutOfBounds`] otherwise.
pub fn check_bounds(offset: usize, len: usize, size: usize) -> Result<(), FrameError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(FrameError::OutOfBounds { offset, len, size }),
    }
}

/// Decodes little-endian `u32`s from `src` into `dst`.
///
/// `src` must hold at least `dst.len() * 4` bytes; extra bytes are ignored.
pub fn copy_le_u32s(src: &[u8], dst: &mut [u32]) {
    for (word, chunk) in dst.iter_mut().zip(src.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bounds_accepts_exact_fit() {
        assert!(check_bounds(20, 80, 100).is_ok());
    }

    #[test]
    fn test_check_bounds_rejects_overrun() {
        assert!(matches!(
            check_bounds(20, 81, 100),
            Err(FrameError::OutOfBounds { offset: 20, len: 81, size: 100 })
        ));
    }

    #[test]
    fn test_check_bounds_rejects_overflowing_offset() {
        assert!(check_bounds(usize::MAX, 1, 100).is_err());
    }

    #[test]
    fn test_copy_le_u32s_decodes_argb_words() {
        let src = [0x44, 0x33, 0x22, 0xFF, 0x01, 0x00, 0x00, 0x00];
        let mut dst = [0u32; 2];

        copy_le_u32s(&src, &mut dst);

        assert_eq!(dst, [0xFF22_3344, 1]);
    }
}
