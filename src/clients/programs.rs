//! Programs `procmon` can launch by name.

use std::hint;

use super::{calc, status};
use crate::kernel::{KernelError, Program, Task};

const DEFAULT_TICKS: u64 = 100;

/// Names `lookup` recognises.
pub const BUILTINS: [&str; 4] = ["spin", "sleep", "calc", "sysinfo"];

/// Resolves `argv[0]` to a program taking the remaining arguments.
pub fn lookup(argv: &[String]) -> Option<Program> {
    let (name, args) = argv.split_first()?;
    let args = args.to_vec();
    let program: Program = match name.as_str() {
        "spin" => Box::new(move |task: &Task| spin(task, ticks_arg(&args))),
        "sleep" => Box::new(move |task: &Task| task.sleep(ticks_arg(&args))),
        "calc" => Box::new(move |task: &Task| {
            task.print(&calc::run_args(&args));
            Ok(())
        }),
        "sysinfo" => Box::new(|task: &Task| status::run(task, &status::StatusOptions::default())),
        _ => return None,
    };
    Some(program)
}

fn ticks_arg(args: &[String]) -> u64 {
    args.first()
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_TICKS)
}

/// Keeps the CPU busy until `ticks` have elapsed. Every `uptime` call is a
/// chance for the scheduler to hand the CPU to someone else. A tick count
/// past the end of the clock spins until the process is killed.
pub fn spin(task: &Task, ticks: u64) -> Result<(), KernelError> {
    let target = task.uptime()?.saturating_add(ticks);
    while task.uptime()? < target {
        hint::spin_loop();
    }
    Ok(())
}
