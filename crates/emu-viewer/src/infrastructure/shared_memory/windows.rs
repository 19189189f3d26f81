//! Windows named file mappings via `OpenFileMappingW` + `MapViewOfFile`.

#![cfg(target_os = "windows")]

use std::iter;

use emu_core::frame::region::{check_bounds, copy_le_u32s};
use emu_core::frame::{FrameError, Region, RegionProvider};
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Memory::{
    MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS,
};

use super::unavailable;

/// Opens the file mappings the emulator creates under the handle name.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegionProvider;

impl WindowsRegionProvider {
    pub fn new() -> Self {
        Self
    }
}

impl RegionProvider for WindowsRegionProvider {
    fn open(&self, handle: &str, size: usize) -> Result<Box<dyn Region>, FrameError> {
        let wide: Vec<u16> = handle.encode_utf16().chain(iter::once(0)).collect();

        // SAFETY: `wide` is NUL-terminated and outlives the call.
        let mapping = unsafe { OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR(wide.as_ptr())) }
            .map_err(|e| unavailable(handle, std::io::Error::from(e)))?;

        // SAFETY: `mapping` is a valid file-mapping handle opened above.
        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, size) };
        if view.Value.is_null() {
            let err = std::io::Error::last_os_error();
            // SAFETY: `mapping` is owned here and not used again.
            let _ = unsafe { CloseHandle(mapping) };
            return Err(unavailable(handle, err));
        }

        debug!(handle, size, "Mapped file view");
        Ok(Box::new(ViewRegion { mapping, view: Some(view), size }))
    }
}

/// A read-only view of a named file mapping.
pub struct ViewRegion {
    mapping: HANDLE,
    view: Option<MEMORY_MAPPED_VIEW_ADDRESS>,
    size: usize,
}

// SAFETY: the view is only read through `&self` and released once in `close`.
unsafe impl Send for ViewRegion {}

impl ViewRegion {
    fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], FrameError> {
        let view = self.view.as_ref().ok_or(FrameError::Closed)?;
        check_bounds(offset, len, self.size)?;
        // SAFETY: `view` maps `size` readable bytes and the range was checked.
        let all = unsafe { std::slice::from_raw_parts(view.Value as *const u8, self.size) };
        Ok(&all[offset..offset + len])
    }
}

impl Region for ViewRegion {
    fn size(&self) -> usize {
        self.size
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
        if let Some(view) = self.view.take() {
            // SAFETY: `view` and `mapping` were obtained in `open` and are
            // released exactly once here.
            unsafe {
                let _ = UnmapViewOfFile(view);
                let _ = CloseHandle(self.mapping);
            }
        }
    }
}

impl Drop for ViewRegion {
    fn drop(&mut self) {
        self.close();
    }
}
