use std::sync::Arc;
use std::sync::mpsc;

use sysmon::config::KernelConfig;
use sysmon::kernel::{Console, INIT_PID, Kernel, KernelError, ProcState, SH_PID, Syscall, Task};
use sysmon::telemetry::{MemoryInfo, ProcessRecord, QueryInterface, SyscallStats, SystemSnapshot};

fn fast_config() -> KernelConfig {
    KernelConfig {
        tick_ms: 1,
        ..KernelConfig::default()
    }
}

fn boot() -> (Arc<Kernel>, Task) {
    let (console, _capture) = Console::capture();
    let kernel = Kernel::boot(&fast_config(), console).unwrap();
    let task = kernel.attach("test").unwrap();
    (kernel, task)
}

fn records(task: &Task) -> Vec<ProcessRecord> {
    let mut buf = [ProcessRecord::default(); 64];
    let n = task.getprocinfo(&mut buf, 64).unwrap();
    buf[..n].to_vec()
}

fn free_pages(task: &Task) -> u32 {
    let mut mem = MemoryInfo::default();
    task.getmeminfo(&mut mem).unwrap();
    mem.free_pages
}

#[test]
fn boot_starts_init_and_sh() {
    let (_kernel, task) = boot();
    let procs = records(&task);
    let init = procs.iter().find(|p| p.pid == INIT_PID).unwrap();
    let sh = procs.iter().find(|p| p.pid == SH_PID).unwrap();
    assert_eq!(init.name.as_str(), "init");
    assert_eq!(init.ppid, 0);
    assert_eq!(sh.name.as_str(), "sh");
    assert_eq!(sh.ppid, INIT_PID);

    let me = procs.iter().find(|p| p.pid == task.pid()).unwrap();
    assert_eq!(me.ppid, SH_PID);
    assert_eq!(me.state, ProcState::Running);
}

#[test]
fn fork_and_wait_return_the_pages() {
    let (_kernel, task) = boot();
    let before = free_pages(&task);

    let child = task.fork(Box::new(|c: &Task| c.sleep(2))).unwrap();
    assert!(free_pages(&task) < before);
    assert_eq!(task.wait().unwrap(), child);
    assert_eq!(free_pages(&task), before);
    assert_eq!(task.wait(), Err(KernelError::NoChildren));
    assert!(records(&task).iter().all(|p| p.pid != child));
}

#[test]
fn killed_child_exits_at_its_next_syscall() {
    let (_kernel, task) = boot();
    let child = task
        .fork(Box::new(|c: &Task| {
            loop {
                c.sleep(1)?;
            }
        }))
        .unwrap();
    task.kill(child).unwrap();
    assert_eq!(task.wait().unwrap(), child);
    assert_eq!(task.kill(child), Err(KernelError::NoSuchProcess(child)));
}

#[test]
fn orphans_are_handed_to_init() {
    let (_kernel, task) = boot();
    let (tx, rx) = mpsc::channel();
    let child = task
        .fork(Box::new(move |c: &Task| {
            let grandchild = c.fork(Box::new(|g: &Task| g.sleep(200)))?;
            let _ = tx.send(grandchild);
            Ok(())
        }))
        .unwrap();
    assert_eq!(task.wait().unwrap(), child);
    let grandchild = rx.recv().unwrap();

    let orphan = records(&task)
        .into_iter()
        .find(|p| p.pid == grandchild)
        .unwrap();
    assert_eq!(orphan.ppid, INIT_PID);
    task.kill(grandchild).unwrap();
}

#[test]
fn syscalls_are_counted_by_id() {
    let (_kernel, task) = boot();
    task.getpid().unwrap();
    task.getpid().unwrap();
    task.sbrk(4096).unwrap();

    let mut stats = SyscallStats::default();
    task.getsyscallstats(&mut stats).unwrap();
    assert_eq!(stats.count(Syscall::Getpid.id()), 2);
    assert_eq!(stats.count(Syscall::Sbrk.id()), 1);
    // The query itself is entered before the copy is taken.
    assert!(stats.count(Syscall::Getsyscallstats.id()) >= 1);
    let sum: u64 = stats.calls.iter().sum();
    assert_eq!(sum, stats.total_calls);
}

#[test]
fn kernel_view_does_not_count() {
    let (kernel, task) = boot();
    let mut first = SyscallStats::default();
    task.getsyscallstats(&mut first).unwrap();
    let calls = first.count(Syscall::Getsysinfo.id());

    let mut snapshot = SystemSnapshot::default();
    kernel.telemetry().getsysinfo(&mut snapshot).unwrap();
    kernel.telemetry().getsysinfo(&mut snapshot).unwrap();

    let mut second = SyscallStats::default();
    task.getsyscallstats(&mut second).unwrap();
    assert_eq!(second.count(Syscall::Getsysinfo.id()), calls);
}

#[test]
fn snapshot_matches_the_table() {
    let (_kernel, task) = boot();
    let mut snapshot = SystemSnapshot::default();
    task.getsysinfo(&mut snapshot).unwrap();

    let mem = snapshot.mem;
    assert_eq!(mem.used_pages + mem.free_pages, mem.total_pages);
    assert_eq!(mem.total_pages, 57066);
    assert_eq!(snapshot.ncpu, 2);
    assert_eq!(
        snapshot.queue.total as usize + snapshot.queue.unused as usize,
        64
    );
    assert!(snapshot.queue.total >= 3);
}

#[test]
fn halt_kills_the_caller_too() {
    let (kernel, task) = boot();
    kernel.halt();
    assert_eq!(task.getpid(), Err(KernelError::Killed));
}

#[test]
fn kstatus_dump_goes_to_the_console() {
    let (console, capture) = Console::capture();
    let kernel = Kernel::boot(&fast_config(), console).unwrap();
    kernel.dump_status(false);
    kernel.dump_status(true);
    let out = capture.contents();
    assert!(out.contains("init"));
    assert!(out.contains("Syscalls:"));
    kernel.halt();
}
