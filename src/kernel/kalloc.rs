use std::sync::Mutex;

use serde::Serialize;

use super::KernelError;

/// Physical memory bounds the page accounting is derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryLayout {
    pub page_size: u32,
    /// First address after the kernel image.
    pub kernel_end: u32,
    /// Top of physical memory.
    pub phys_top: u32,
}

impl MemoryLayout {
    /// Pages between the page-aligned end of the kernel and the top of memory.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let base = page_round_up(self.kernel_end, self.page_size);
        self.phys_top.saturating_sub(base) / self.page_size
    }

    /// Pages charged for a process image of `sz` bytes: the image itself plus
    /// a kernel stack and a page directory.
    pub fn pages_for(&self, sz: u32) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        sz.div_ceil(self.page_size) + 2
    }
}

pub fn page_round_up(addr: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return addr;
    }
    addr.div_ceil(page_size).saturating_mul(page_size)
}

/// Free-page count of the physical allocator. The free list itself is not
/// modelled, only how many pages it holds.
#[derive(Debug)]
pub struct Kmem {
    free: Mutex<u32>,
    total: u32,
}

impl Kmem {
    /// All `total` pages start out on the free list.
    pub fn new(total: u32) -> Self {
        Kmem {
            free: Mutex::new(total),
            total,
        }
    }

    pub fn free_pages(&self) -> Result<u32, KernelError> {
        self.free
            .lock()
            .map(|f| *f)
            .map_err(|_| KernelError::Unavailable("page allocator"))
    }

    pub fn alloc(&self, pages: u32) -> Result<(), KernelError> {
        let mut free = self
            .free
            .lock()
            .map_err(|_| KernelError::Unavailable("page allocator"))?;
        *free = free.checked_sub(pages).ok_or(KernelError::OutOfMemory)?;
        Ok(())
    }

    pub fn release(&self, pages: u32) -> Result<(), KernelError> {
        let mut free = self
            .free
            .lock()
            .map_err(|_| KernelError::Unavailable("page allocator"))?;
        *free = free.saturating_add(pages).min(self.total);
        Ok(())
    }
}
