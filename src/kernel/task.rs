use std::cell::Cell;
use std::sync::Arc;

use tracing::warn;

use super::{Kernel, KernelError, Syscall};
use crate::telemetry::error::Result as TelemetryResult;
use crate::telemetry::query::QueryInterface;
use crate::telemetry::types::{CpuInfo, MemoryInfo, ProcessRecord, SyscallStats, SystemSnapshot};

/// Code a process runs. Returning ends the process.
pub type Program = Box<dyn FnOnce(&Task) -> Result<(), KernelError> + Send + 'static>;

/// Handle of one process, held by the thread running it. Every method that
/// enters the kernel is counted as a syscall. Dropping the handle exits the
/// process.
#[derive(Debug)]
pub struct Task {
    kernel: Arc<Kernel>,
    pid: u32,
    slice_start: Cell<u64>,
}

impl Task {
    pub(super) fn new(kernel: Arc<Kernel>, pid: u32) -> Self {
        Task {
            kernel,
            pid,
            slice_start: Cell::new(0),
        }
    }

    pub(super) fn reset_slice(&self) {
        self.slice_start
            .set(self.kernel.clock.ticks().unwrap_or_default());
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    fn enter(&self, call: Syscall) -> Result<(), KernelError> {
        self.kernel.stats.record(call.id());
        if self.kernel.is_killed(self.pid)? {
            return Err(KernelError::Killed);
        }
        Ok(())
    }

    /// Starts a child running `program`, with this process's name and size.
    pub fn fork(&self, program: Program) -> Result<u32, KernelError> {
        self.enter(Syscall::Fork)?;
        self.kernel.fork(self.pid, program)
    }

    pub fn exit(self) {
        drop(self);
    }

    /// Blocks until a child exits and returns its pid.
    pub fn wait(&self) -> Result<u32, KernelError> {
        self.enter(Syscall::Wait)?;
        self.kernel.wait_child(self.pid)
    }

    pub fn kill(&self, pid: u32) -> Result<(), KernelError> {
        self.enter(Syscall::Kill)?;
        self.kernel.kill_process(pid)
    }

    pub fn getpid(&self) -> Result<u32, KernelError> {
        self.enter(Syscall::Getpid)?;
        Ok(self.pid)
    }

    /// Grows the image by `bytes`, returning the previous size.
    pub fn sbrk(&self, bytes: u32) -> Result<u32, KernelError> {
        self.enter(Syscall::Sbrk)?;
        self.kernel.grow(self.pid, bytes)
    }

    pub fn sleep(&self, ticks: u64) -> Result<(), KernelError> {
        self.enter(Syscall::Sleep)?;
        self.kernel.sleep_ticks(self.pid, ticks)?;
        self.reset_slice();
        Ok(())
    }

    /// Current tick count. A process that has used up its quantum gives its
    /// CPU away here before returning.
    pub fn uptime(&self) -> Result<u64, KernelError> {
        self.enter(Syscall::Uptime)?;
        let now = self.kernel.clock.ticks()?;
        if now.saturating_sub(self.slice_start.get()) >= self.kernel.quantum_ticks {
            self.kernel.yield_cpu(self.pid)?;
            self.reset_slice();
        }
        Ok(now)
    }

    /// Replaces the process image; only the name is modelled.
    pub fn exec(&self, name: &str) -> Result<(), KernelError> {
        self.enter(Syscall::Exec)?;
        self.kernel.rename(self.pid, name)
    }

    /// Writes to the console. Console failures are logged, not returned.
    pub fn print(&self, text: &str) {
        self.kernel.stats.record(Syscall::Write.id());
        if let Err(err) = self.kernel.console.write_str(text) {
            warn!(pid = self.pid, %err, "console write failed");
        }
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        self.kernel.exit_process(self.pid);
    }
}

impl QueryInterface for Task {
    fn getprocinfo(&self, out: &mut [ProcessRecord], max_entries: usize) -> TelemetryResult<usize> {
        self.kernel.stats.record(Syscall::Getprocinfo.id());
        self.kernel.telemetry().getprocinfo(out, max_entries)
    }

    fn getmeminfo(&self, out: &mut MemoryInfo) -> TelemetryResult<()> {
        self.kernel.stats.record(Syscall::Getmeminfo.id());
        self.kernel.telemetry().getmeminfo(out)
    }

    fn getsysinfo(&self, out: &mut SystemSnapshot) -> TelemetryResult<()> {
        self.kernel.stats.record(Syscall::Getsysinfo.id());
        self.kernel.telemetry().getsysinfo(out)
    }

    fn getsyscallstats(&self, out: &mut SyscallStats) -> TelemetryResult<()> {
        self.kernel.stats.record(Syscall::Getsyscallstats.id());
        self.kernel.telemetry().getsyscallstats(out)
    }

    fn getcpuinfo(&self, out: &mut [CpuInfo], max_entries: usize) -> TelemetryResult<usize> {
        self.kernel.stats.record(Syscall::Getcpuinfo.id());
        self.kernel.telemetry().getcpuinfo(out, max_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::kernel::{Console, ProcState};

    fn kernel() -> Arc<Kernel> {
        let config = KernelConfig {
            tick_ms: 1,
            ..KernelConfig::default()
        };
        let (console, _) = Console::capture();
        Kernel::new(&config, console)
    }

    #[test]
    fn attach_without_init_has_no_parent() {
        let kernel = kernel();
        let task = kernel.attach("solo").unwrap();
        let table = kernel.process_table().lock().unwrap();
        let proc = table.get(task.pid()).unwrap();
        assert_eq!(proc.ppid, 0);
        assert_eq!(proc.state, ProcState::Running);
        assert_eq!(proc.name.as_str(), "solo");
    }

    #[test]
    fn parentless_exit_frees_slot_and_pages() {
        let kernel = kernel();
        let before = kernel.kmem().free_pages().unwrap();
        let task = kernel.attach("solo").unwrap();
        let pid = task.pid();
        assert!(kernel.kmem().free_pages().unwrap() < before);
        task.exit();
        assert!(kernel.process_table().lock().unwrap().get(pid).is_none());
        assert_eq!(kernel.kmem().free_pages().unwrap(), before);
    }

    #[test]
    fn syscalls_are_counted() {
        let kernel = kernel();
        let task = kernel.attach("counter").unwrap();
        task.getpid().unwrap();
        task.getpid().unwrap();
        task.exec("renamed").unwrap();
        let stats = kernel.syscall_stats().query().unwrap();
        assert_eq!(stats.count(Syscall::Getpid.id()), 2);
        assert_eq!(stats.count(Syscall::Exec.id()), 1);
        assert_eq!(stats.total_calls, 3);
    }

    #[test]
    fn sbrk_grows_image_and_charges_pages() {
        let kernel = kernel();
        let task = kernel.attach("grower").unwrap();
        let free = kernel.kmem().free_pages().unwrap();
        let old = task.sbrk(8192).unwrap();
        assert_eq!(old, crate::kernel::USER_SZ);
        assert_eq!(kernel.kmem().free_pages().unwrap(), free - 2);
    }

    #[test]
    fn wait_without_children_fails() {
        let kernel = kernel();
        let task = kernel.attach("lonely").unwrap();
        assert_eq!(task.wait(), Err(KernelError::NoChildren));
        // The caller is back on a cpu afterwards.
        let table = kernel.process_table().lock().unwrap();
        assert_eq!(table.get(task.pid()).unwrap().state, ProcState::Running);
    }

    #[test]
    fn killed_process_fails_its_next_syscall() {
        let kernel = kernel();
        let victim = kernel.attach("victim").unwrap();
        let killer = kernel.attach("killer").unwrap();
        killer.kill(victim.pid()).unwrap();
        assert_eq!(victim.getpid(), Err(KernelError::Killed));
    }
}
