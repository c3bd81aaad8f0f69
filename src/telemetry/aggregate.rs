use tracing::debug_span;

use super::error::Result;
use super::memory::get_memory_info;
use super::procs::process_queue_summary;
use super::source::{FreePageSource, TickSource};
use super::types::SystemSnapshot;
use crate::kernel::{MemoryLayout, ProcessTable};

/// Uptime, memory and queue summary, read in that order, each under its own
/// lock and released before the next is taken. The parts may describe
/// different instants; nothing here tries to make them agree.
pub fn get_system_snapshot(
    clock: &dyn TickSource,
    pages: &dyn FreePageSource,
    layout: &MemoryLayout,
    table: &ProcessTable,
    ncpu: u32,
) -> Result<SystemSnapshot> {
    let _span = debug_span!("get_system_snapshot").entered();
    let uptime = clock.ticks()?;
    let mem = get_memory_info(pages, layout)?;
    let queue = process_queue_summary(table)?;
    Ok(SystemSnapshot {
        uptime,
        mem,
        queue,
        ncpu,
    })
}
