//! Host model of the kernel state the telemetry core observes.
//!
//! Processes are OS threads registered in a fixed-size process table. The
//! table, the tick clock, the page allocator and the CPU slots each sit
//! behind their own lock; none of the operations here hold two of those
//! locks at once.

pub mod clock;
pub mod console;
pub mod cpu;
pub mod kalloc;
mod kstatus;
pub mod proc;
pub mod syscall;
pub mod task;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

pub use clock::Clock;
pub use console::{Capture, Console};
pub use cpu::{Cpus, NCPU};
pub use kalloc::{Kmem, MemoryLayout};
pub use proc::{Channel, Proc, ProcName, ProcState, ProcessTable};
pub use syscall::{NSYSCALL, Syscall};
pub use task::{Program, Task};

use crate::config::KernelConfig;
use crate::telemetry::counters::SyscallRegistry;
use crate::telemetry::query::Telemetry;

pub const INIT_PID: u32 = 1;
pub const SH_PID: u32 = 2;
/// Uptime ticks per second.
pub const HZ: u64 = 100;
/// Image size of a freshly started user program.
pub const USER_SZ: u32 = 12 * 1024;
/// How long a reaper with no children naps before looking again.
const REAP_IDLE_TICKS: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error("process table full")]
    NoFreeSlot,
    #[error("out of memory")]
    OutOfMemory,
    #[error("no children to wait for")]
    NoChildren,
    #[error("process killed")]
    Killed,
    #[error("no such process: {0}")]
    NoSuchProcess(u32),
    #[error("{0} unavailable")]
    Unavailable(&'static str),
    #[error("could not start process thread")]
    SpawnFailed,
}

#[derive(Debug)]
pub struct Kernel {
    ptable: ProcessTable,
    clock: Clock,
    kmem: Kmem,
    cpus: Cpus,
    stats: SyscallRegistry,
    console: Console,
    layout: MemoryLayout,
    quantum_ticks: u64,
    nproc: usize,
}

impl Kernel {
    /// Builds the kernel state without starting the timer or any process.
    pub fn new(config: &KernelConfig, console: Console) -> Arc<Self> {
        let layout = config.layout();
        Arc::new(Kernel {
            ptable: ProcessTable::new(config.nproc),
            clock: Clock::new(),
            kmem: Kmem::new(layout.total_pages()),
            cpus: Cpus::new(config.ncpu),
            stats: SyscallRegistry::new(),
            console,
            layout,
            quantum_ticks: config.quantum_ticks.max(1),
            nproc: config.nproc,
        })
    }

    /// Starts the timer and the two resident processes, `init` and `sh`.
    pub fn boot(config: &KernelConfig, console: Console) -> Result<Arc<Self>, KernelError> {
        let kernel = Self::new(config, console);
        kernel.start_timer(Duration::from_millis(config.tick_ms.max(1)))?;
        let init = kernel.spawn(0, "init", USER_SZ, Box::new(reaper))?;
        kernel.spawn(init, "sh", USER_SZ, Box::new(reaper))?;
        debug!(
            nproc = config.nproc,
            ncpu = config.ncpu,
            total_pages = kernel.layout.total_pages(),
            "kernel booted"
        );
        Ok(kernel)
    }

    /// Registers the calling thread as a new child of `sh` and puts it on a CPU.
    pub fn attach(self: &Arc<Self>, name: &str) -> Result<Task, KernelError> {
        let parent = {
            let table = self.ptable.lock()?;
            [SH_PID, INIT_PID]
                .into_iter()
                .find(|&pid| table.get(pid).is_some())
                .unwrap_or(0)
        };
        let pid = self.create_process(name, parent, USER_SZ)?;
        let task = Task::new(Arc::clone(self), pid);
        self.dispatch(pid)?;
        task.reset_slice();
        Ok(task)
    }

    /// Kernel-side view over the live state; queries made through it are not
    /// counted as syscalls.
    pub fn telemetry(&self) -> Telemetry<'_> {
        Telemetry::new(
            &self.clock,
            &self.kmem,
            &self.ptable,
            &self.cpus,
            &self.stats,
            self.layout,
        )
    }

    pub fn process_table(&self) -> &ProcessTable {
        &self.ptable
    }

    pub fn kmem(&self) -> &Kmem {
        &self.kmem
    }

    pub fn syscall_stats(&self) -> &SyscallRegistry {
        &self.stats
    }

    /// Marks every live process killed; each exits at its next syscall.
    pub fn halt(&self) {
        match self.ptable.lock() {
            Ok(mut table) => table.kill_all(),
            Err(err) => warn!(%err, "halt could not reach the process table"),
        }
        self.ptable.wakeup();
    }

    fn start_timer(self: &Arc<Self>, period: Duration) -> Result<(), KernelError> {
        let kernel = Arc::downgrade(self);
        thread::Builder::new()
            .name("timer".to_string())
            .spawn(move || {
                loop {
                    thread::sleep(period);
                    let Some(kernel) = kernel.upgrade() else {
                        break;
                    };
                    if let Err(err) = kernel.clock.advance() {
                        warn!(%err, "timer stopped");
                        break;
                    }
                }
            })
            .map_err(|_| KernelError::SpawnFailed)?;
        Ok(())
    }

    pub(crate) fn spawn(
        self: &Arc<Self>,
        ppid: u32,
        name: &str,
        sz: u32,
        program: Program,
    ) -> Result<u32, KernelError> {
        let pid = self.create_process(name, ppid, sz)?;
        let kernel = Arc::clone(self);
        let started = thread::Builder::new()
            .name(format!("pid-{pid}"))
            .spawn(move || {
                let task = Task::new(kernel, pid);
                if let Err(err) = task.kernel().dispatch(pid) {
                    warn!(pid, %err, "process never got a cpu");
                    return;
                }
                task.reset_slice();
                if let Err(err) = program(&task) {
                    debug!(pid, %err, "program stopped");
                }
            });
        if started.is_err() {
            self.discard(pid);
            return Err(KernelError::SpawnFailed);
        }
        debug!(pid, ppid, name, "process created");
        Ok(pid)
    }

    fn create_process(&self, name: &str, ppid: u32, sz: u32) -> Result<u32, KernelError> {
        let pages = self.layout.pages_for(sz);
        self.kmem.alloc(pages)?;
        let allocated = self.ptable.lock().and_then(|mut t| t.alloc(name, ppid, sz));
        if allocated.is_err() {
            let _ = self.kmem.release(pages);
        }
        allocated
    }

    fn discard(&self, pid: u32) {
        let freed = self.ptable.lock().ok().and_then(|mut t| t.free(pid));
        if let Some(proc) = freed {
            let _ = self.kmem.release(self.layout.pages_for(proc.sz));
        }
    }

    fn set_state(&self, pid: u32, state: ProcState, chan: Channel) -> Result<(), KernelError> {
        self.ptable.lock()?.set_state(pid, state, chan)
    }

    /// Waits runnable for a CPU, then runs.
    fn dispatch(&self, pid: u32) -> Result<(), KernelError> {
        self.set_state(pid, ProcState::Runnable, Channel::NONE)?;
        self.cpus.acquire(pid)?;
        self.set_state(pid, ProcState::Running, Channel::NONE)
    }

    fn yield_cpu(&self, pid: u32) -> Result<(), KernelError> {
        self.cpus.release(pid)?;
        thread::yield_now();
        self.dispatch(pid)
    }

    fn is_killed(&self, pid: u32) -> Result<bool, KernelError> {
        self.ptable
            .lock()?
            .get(pid)
            .map(|p| p.killed)
            .ok_or(KernelError::NoSuchProcess(pid))
    }

    fn image_size(&self, pid: u32) -> Result<(ProcName, u32), KernelError> {
        self.ptable
            .lock()?
            .get(pid)
            .map(|p| (p.name, p.sz))
            .ok_or(KernelError::NoSuchProcess(pid))
    }

    fn fork(self: &Arc<Self>, parent: u32, program: Program) -> Result<u32, KernelError> {
        let (name, sz) = self.image_size(parent)?;
        self.spawn(parent, name.as_str(), sz, program)
    }

    fn grow(&self, pid: u32, bytes: u32) -> Result<u32, KernelError> {
        let (_, old) = self.image_size(pid)?;
        let new = old.checked_add(bytes).ok_or(KernelError::OutOfMemory)?;
        let extra = self.layout.pages_for(new) - self.layout.pages_for(old);
        self.kmem.alloc(extra)?;
        let resized = self.ptable.lock().and_then(|mut t| {
            let proc = t.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
            proc.sz = new;
            Ok(old)
        });
        if resized.is_err() {
            let _ = self.kmem.release(extra);
        }
        resized
    }

    fn rename(&self, pid: u32, name: &str) -> Result<(), KernelError> {
        let mut table = self.ptable.lock()?;
        let proc = table.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        proc.name = ProcName::new(name);
        Ok(())
    }

    fn sleep_ticks(&self, pid: u32, ticks: u64) -> Result<(), KernelError> {
        let start = self.clock.ticks()?;
        self.cpus.release(pid)?;
        let slept = self.set_state(pid, ProcState::Sleeping, Channel::TICKS).and_then(|()| {
            let mut now = start;
            while now - start < ticks {
                if self.is_killed(pid)? {
                    return Err(KernelError::Killed);
                }
                now = self.clock.wait_past(now)?;
            }
            Ok(())
        });
        self.dispatch(pid)?;
        slept
    }

    fn wait_child(&self, pid: u32) -> Result<u32, KernelError> {
        self.cpus.release(pid)?;
        let reaped = self.reap_child(pid);
        self.dispatch(pid)?;
        let (child, pages) = reaped?;
        self.kmem.release(pages)?;
        Ok(child)
    }

    /// Sleeps on the table until a child is a zombie, frees its slot and
    /// returns its pid with the pages it held.
    fn reap_child(&self, pid: u32) -> Result<(u32, u32), KernelError> {
        let mut table = self.ptable.lock()?;
        loop {
            let mut have_kids = false;
            let mut zombie = None;
            for child in table.children_of(pid) {
                have_kids = true;
                if child.state == ProcState::Zombie {
                    zombie = Some(child.pid);
                    break;
                }
            }
            if let Some(child) = zombie {
                let gone = table.free(child).ok_or(KernelError::NoSuchProcess(child))?;
                return Ok((child, self.layout.pages_for(gone.sz)));
            }
            let me = table.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
            if !have_kids {
                return Err(KernelError::NoChildren);
            }
            if me.killed {
                return Err(KernelError::Killed);
            }
            me.state = ProcState::Sleeping;
            me.chan = Channel::of_pid(pid);
            table = self.ptable.sleep(table)?;
        }
    }

    fn kill_process(&self, pid: u32) -> Result<(), KernelError> {
        let mut table = self.ptable.lock()?;
        let proc = table.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        proc.killed = true;
        drop(table);
        self.ptable.wakeup();
        debug!(pid, "process killed");
        Ok(())
    }

    fn exit_process(&self, pid: u32) {
        self.stats.record(Syscall::Exit.id());
        let heir = if pid == INIT_PID { 0 } else { INIT_PID };
        let mut orphaned = None;
        match self.ptable.lock() {
            Ok(mut table) => {
                table.reparent(pid, heir);
                let parentless = table.get(pid).is_some_and(|p| p.ppid == 0);
                if parentless {
                    // Nobody will wait for it.
                    orphaned = table.free(pid);
                } else if let Err(err) = table.set_state(pid, ProcState::Zombie, Channel::NONE) {
                    warn!(pid, %err, "exit of unknown process");
                }
            }
            Err(err) => warn!(pid, %err, "exit could not reach the process table"),
        }
        self.ptable.wakeup();
        if let Err(err) = self.cpus.release(pid) {
            warn!(pid, %err, "exit could not release its cpu");
        }
        if let Some(proc) = orphaned {
            let _ = self.kmem.release(self.layout.pages_for(proc.sz));
        }
        debug!(pid, "process exited");
    }
}

/// Body of `init` and `sh`: reap children forever.
fn reaper(task: &Task) -> Result<(), KernelError> {
    loop {
        match task.wait() {
            Ok(_) => {}
            Err(KernelError::NoChildren) => task.sleep(REAP_IDLE_TICKS)?,
            Err(err) => return Err(err),
        }
    }
}
