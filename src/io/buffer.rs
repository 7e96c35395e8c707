// Aligned wipe buffer, reused for every chunk of every pass

use crate::error::{WipeError, WipeErrorResult};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;
use zeroize::Zeroize;

/// Alignment requirements for unbuffered device I/O
pub const SECTOR_SIZE: usize = 512;
pub const PAGE_SIZE: usize = 4096;

/// Heap buffer with a guaranteed start alignment. Contents are zeroed on drop.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuffer {
    pub fn new(size: usize, alignment: usize) -> WipeErrorResult<Self> {
        if size == 0 {
            return Err(WipeError::BufferAllocation(
                "buffer size must be non-zero".to_string(),
            ));
        }
        if !alignment.is_power_of_two() {
            return Err(WipeError::BufferAllocation(format!(
                "alignment {} is not a power of 2",
                alignment
            )));
        }

        // Round size up to a whole number of alignment units
        let aligned_size = (size + alignment - 1) & !(alignment - 1);
        let layout = Layout::from_size_align(aligned_size, alignment)
            .map_err(|e| WipeError::BufferAllocation(e.to_string()))?;

        // SAFETY: layout has a non-zero size
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| {
            WipeError::BufferAllocation(format!("failed to allocate {} bytes", aligned_size))
        })?;

        Ok(Self { ptr, layout })
    }

    /// Page aligned, good for any sector size up to 4 KiB
    pub fn page_aligned(size: usize) -> WipeErrorResult<Self> {
        Self::new(size, PAGE_SIZE)
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid for layout.size() bytes and uniquely borrowed
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for layout.size() bytes
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn alignment(&self) -> usize {
        self.layout.align()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        self.as_mut_slice().zeroize();
        // SAFETY: allocated in `new` with this exact layout
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

// The buffer owns its allocation exclusively
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}
