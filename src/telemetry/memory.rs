use super::error::Result;
use super::source::FreePageSource;
use super::types::MemoryInfo;
use crate::kernel::MemoryLayout;

/// Page accounting from the allocator's free count and the fixed memory
/// bounds. Best effort: the allocator may change right after it is read.
pub fn get_memory_info(pages: &dyn FreePageSource, layout: &MemoryLayout) -> Result<MemoryInfo> {
    let total_pages = layout.total_pages();
    let free_pages = pages.free_pages()?.min(total_pages);
    Ok(MemoryInfo {
        page_size: layout.page_size,
        total_pages,
        free_pages,
        used_pages: total_pages - free_pages,
        kernel_end: layout.kernel_end,
    })
}
