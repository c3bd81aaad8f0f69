use std::sync::{Condvar, Mutex};

use super::KernelError;

/// The tick counter advanced by the timer interrupt, guarded by its own lock.
#[derive(Debug, Default)]
pub struct Clock {
    ticks: Mutex<u64>,
    tick: Condvar,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> Result<u64, KernelError> {
        self.ticks
            .lock()
            .map(|t| *t)
            .map_err(|_| KernelError::Unavailable("clock"))
    }

    /// Timer interrupt: one tick passes and every sleeper is woken.
    pub fn advance(&self) -> Result<u64, KernelError> {
        let mut ticks = self
            .ticks
            .lock()
            .map_err(|_| KernelError::Unavailable("clock"))?;
        *ticks += 1;
        let now = *ticks;
        drop(ticks);
        self.tick.notify_all();
        Ok(now)
    }

    /// Blocks until the counter moves past `seen` and returns the new value.
    pub fn wait_past(&self, seen: u64) -> Result<u64, KernelError> {
        let mut ticks = self
            .ticks
            .lock()
            .map_err(|_| KernelError::Unavailable("clock"))?;
        while *ticks <= seen {
            ticks = self
                .tick
                .wait(ticks)
                .map_err(|_| KernelError::Unavailable("clock"))?;
        }
        Ok(*ticks)
    }
}
