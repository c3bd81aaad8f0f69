use std::sync::Mutex;

use super::error::{Result, TelemetryError};
use super::types::SyscallStats;
use crate::kernel::NSYSCALL;

/// Process-wide syscall counters, reset only when the kernel is rebuilt.
#[derive(Debug, Default)]
pub struct SyscallRegistry {
    stats: Mutex<SyscallStats>,
}

impl SyscallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one call to `id`. Id 0 and ids past the table are ignored, as
    /// is a poisoned lock: counting is best effort and never fails a syscall.
    pub fn record(&self, id: u32) {
        let Ok(index) = usize::try_from(id) else {
            return;
        };
        if index == 0 || index >= NSYSCALL {
            return;
        }
        if let Ok(mut stats) = self.stats.lock() {
            stats.calls[index] = stats.calls[index].saturating_add(1);
            stats.total_calls = stats.total_calls.saturating_add(1);
        }
    }

    /// A copy of every counter taken in one critical section.
    pub fn query(&self) -> Result<SyscallStats> {
        self.stats
            .lock()
            .map(|s| *s)
            .map_err(|_| TelemetryError::CollaboratorUnavailable {
                collaborator: "syscall counters",
            })
    }
}
