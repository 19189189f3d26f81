//! POSIX shared memory via `shm_open` + `mmap`.

use std::fs::File;
use std::io;

use emu_core::frame::region::{check_bounds, copy_le_u32s};
use emu_core::frame::{FrameError, Region, RegionProvider};
use memmap2::{Mmap, MmapOptions};
use nix::fcntl::OFlag;
use nix::sys::mman::shm_open;
use nix::sys::stat::Mode;
use tracing::debug;

use super::unavailable;

/// Opens `/<handle>` objects created by the emulator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixRegionProvider;

impl PosixRegionProvider {
    pub fn new() -> Self {
        Self
    }
}

impl RegionProvider for PosixRegionProvider {
    fn open(&self, handle: &str, size: usize) -> Result<Box<dyn Region>, FrameError> {
        let name = format!("/{handle}");
        let fd = shm_open(name.as_str(), OFlag::O_RDONLY, Mode::empty())
            .map_err(|errno| unavailable(handle, std::io::Error::from(errno)))?;
        let map = map_object(handle, &File::from(fd), size)?;

        debug!(%name, size, "Mapped shared memory");
        Ok(Box::new(MappedRegion { map: Some(map) }))
    }
}

/// Maps the first `size` bytes of `file`.
///
/// Pages past the end of the object would map fine and then fault with
/// `SIGBUS` on first touch, so an object shorter than `size` is refused.
fn map_object(handle: &str, file: &File, size: usize) -> Result<Mmap, FrameError> {
    let len = file.metadata().map_err(|e| unavailable(handle, e))?.len();
    if len < size as u64 {
        return Err(unavailable(
            handle,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("object is {len} bytes, mapping needs {size}"),
            ),
        ));
    }

    // SAFETY: the mapping is read-only and only copied out of.  The
    // emulator writes concurrently, so a pixel read may tear.
    unsafe { MmapOptions::new().len(size).map(file) }.map_err(|e| unavailable(handle, e))
}

/// A read-only `mmap` of one shared-memory object.
pub struct MappedRegion {
    map: Option<Mmap>,
}

impl MappedRegion {
    fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], FrameError> {
        let map = self.map.as_ref().ok_or(FrameError::Closed)?;
        check_bounds(offset, len, map.len())?;
        Ok(&map[offset..offset + len])
    }
}

impl Region for MappedRegion {
    fn size(&self) -> usize {
        self.map.as_ref().map_or(0, |m| m.len())
    }

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), FrameError> {
        dst.copy_from_slice(self.bytes(offset, dst.len())?);
        Ok(())
    }

    fn read_u32s(&self, offset: usize, dst: &mut [u32]) -> Result<(), FrameError> {
        let src = self.bytes(offset, dst.len() * 4)?;
        copy_le_u32s(src, dst);
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the Mmap unmaps it.
        self.map = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
