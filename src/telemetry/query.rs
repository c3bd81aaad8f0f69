//! The boundary callers outside the kernel go through. Every operation
//! writes into storage the caller already owns and either fills it
//! completely or leaves it as it was.

use super::aggregate::get_system_snapshot;
use super::counters::SyscallRegistry;
use super::error::Result;
use super::memory::get_memory_info;
use super::procs::{get_cpu_info, get_process_info};
use super::source::{FreePageSource, TickSource};
use super::types::{CpuInfo, MemoryInfo, ProcessRecord, SyscallStats, SystemSnapshot};
use crate::kernel::{Cpus, MemoryLayout, ProcessTable};

pub trait QueryInterface {
    /// Fills `out` with up to `max_entries` live processes; returns how many.
    fn getprocinfo(&self, out: &mut [ProcessRecord], max_entries: usize) -> Result<usize>;

    fn getmeminfo(&self, out: &mut MemoryInfo) -> Result<()>;

    fn getsysinfo(&self, out: &mut SystemSnapshot) -> Result<()>;

    fn getsyscallstats(&self, out: &mut SyscallStats) -> Result<()>;

    /// Fills `out` with up to `max_entries` CPU slots; returns how many.
    fn getcpuinfo(&self, out: &mut [CpuInfo], max_entries: usize) -> Result<usize>;
}

/// Borrowed view over the collaborators a query reads.
pub struct Telemetry<'k> {
    clock: &'k dyn TickSource,
    pages: &'k dyn FreePageSource,
    table: &'k ProcessTable,
    cpus: &'k Cpus,
    counters: &'k SyscallRegistry,
    layout: MemoryLayout,
}

impl<'k> Telemetry<'k> {
    pub fn new(
        clock: &'k dyn TickSource,
        pages: &'k dyn FreePageSource,
        table: &'k ProcessTable,
        cpus: &'k Cpus,
        counters: &'k SyscallRegistry,
        layout: MemoryLayout,
    ) -> Self {
        Telemetry {
            clock,
            pages,
            table,
            cpus,
            counters,
            layout,
        }
    }

    fn ncpu(&self) -> u32 {
        self.cpus.count() as u32
    }
}

impl QueryInterface for Telemetry<'_> {
    fn getprocinfo(&self, out: &mut [ProcessRecord], max_entries: usize) -> Result<usize> {
        get_process_info(self.table, out, max_entries)
    }

    fn getmeminfo(&self, out: &mut MemoryInfo) -> Result<()> {
        *out = get_memory_info(self.pages, &self.layout)?;
        Ok(())
    }

    fn getsysinfo(&self, out: &mut SystemSnapshot) -> Result<()> {
        let ncpu = self.ncpu();
        *out = get_system_snapshot(self.clock, self.pages, &self.layout, self.table, ncpu)?;
        Ok(())
    }

    fn getsyscallstats(&self, out: &mut SyscallStats) -> Result<()> {
        *out = self.counters.query()?;
        Ok(())
    }

    fn getcpuinfo(&self, out: &mut [CpuInfo], max_entries: usize) -> Result<usize> {
        get_cpu_info(self.cpus, self.table, out, max_entries)
    }
}
