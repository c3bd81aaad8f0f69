//! Supervised run: start a program, watch the process list while it runs,
//! stop watching once it has been reaped.
//!
//! The watcher has a fixed number of frames. A target that outlives them
//! simply stops being watched.

use tracing::{debug, warn};

use super::programs;
use crate::config::ProcmonConfig;
use crate::kernel::{KernelError, Task};
use crate::report::ProcmonListing;
use crate::telemetry::{MemoryInfo, ProcessRecord, QueryInterface};

const MAX_PROCS: usize = 64;

const USAGE: &str = "\nProcess Monitor\nUsage: sysmon procmon [command [args...]]\n\n";

/// Prints one listing, marking `highlight`. Prints nothing when the kernel
/// has no data to give.
pub fn show_procs(task: &Task, highlight: Option<u32>) {
    let mut mem = MemoryInfo::default();
    let mut procs = [ProcessRecord::default(); MAX_PROCS];
    let listing = task
        .getmeminfo(&mut mem)
        .and_then(|()| task.getprocinfo(&mut procs, MAX_PROCS));
    match listing {
        Ok(n) => task.print(
            &ProcmonListing {
                mem: &mem,
                procs: &procs[..n],
                highlight,
            }
            .to_string(),
        ),
        Err(err) => warn!(%err, "procmon: no process data"),
    }
}

pub fn run(task: &Task, argv: &[String], config: &ProcmonConfig) -> Result<(), KernelError> {
    let Some(command) = argv.first().cloned() else {
        task.print(USAGE);
        show_procs(task, None);
        return Ok(());
    };
    task.print(&format!("\n=== PROCMON: {command} ===\n"));

    let target = {
        let argv = argv.to_vec();
        let delay = config.startup_delay_ticks;
        task.fork(Box::new(move |child: &Task| {
            child.sleep(delay)?;
            let Some(program) = programs::lookup(&argv) else {
                child.print("exec failed\n");
                return Ok(());
            };
            child.exec(&argv[0])?;
            program(child)
        }))?
    };

    let watcher = {
        let iterations = config.watch_iterations;
        let interval = config.watch_interval_ticks;
        task.fork(Box::new(move |watcher: &Task| {
            for _ in 0..iterations {
                show_procs(watcher, Some(target));
                watcher.sleep(interval)?;
            }
            Ok(())
        }))?
    };

    task.print(&format!("Target PID: {target}\n"));

    loop {
        match task.wait() {
            Ok(pid) if pid == target => {
                if let Err(err) = task.kill(watcher) {
                    // Already gone: its frames ran out first.
                    debug!(watcher, %err, "watcher not killed");
                }
                task.print(&format!("\n[{command} finished]\n"));
            }
            Ok(_) => {}
            Err(KernelError::NoChildren) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}
