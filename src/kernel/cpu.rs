use std::sync::{Condvar, Mutex};

use super::KernelError;

/// Most CPU slots a kernel boots with.
pub const NCPU: usize = 8;

/// CPU slots. A process runs only while it holds one; everyone else waits
/// runnable.
#[derive(Debug)]
pub struct Cpus {
    slots: Mutex<[Option<u32>; NCPU]>,
    ncpu: usize,
    freed: Condvar,
}

impl Cpus {
    /// `ncpu` is clamped to `1..=NCPU`.
    pub fn new(ncpu: usize) -> Self {
        Cpus {
            slots: Mutex::new([None; NCPU]),
            ncpu: ncpu.clamp(1, NCPU),
            freed: Condvar::new(),
        }
    }

    /// Fixed at construction, so reading it takes no lock.
    pub fn count(&self) -> usize {
        self.ncpu
    }

    /// Blocks until a CPU is free and gives it to `pid`.
    pub fn acquire(&self, pid: u32) -> Result<usize, KernelError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| KernelError::Unavailable("cpus"))?;
        loop {
            if let Some(id) = slots[..self.ncpu].iter().position(|s| s.is_none()) {
                slots[id] = Some(pid);
                return Ok(id);
            }
            slots = self
                .freed
                .wait(slots)
                .map_err(|_| KernelError::Unavailable("cpus"))?;
        }
    }

    pub fn release(&self, pid: u32) -> Result<(), KernelError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| KernelError::Unavailable("cpus"))?;
        for slot in slots.iter_mut().filter(|s| **s == Some(pid)) {
            *slot = None;
        }
        drop(slots);
        self.freed.notify_all();
        Ok(())
    }

    /// Which pid sits on each CPU, indexed by cpu id. A copy taken under
    /// the lock; only the first `count()` entries are meaningful.
    pub fn occupants(&self) -> Result<[Option<u32>; NCPU], KernelError> {
        self.slots
            .lock()
            .map(|s| *s)
            .map_err(|_| KernelError::Unavailable("cpus"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn cpu_count_is_clamped() {
        assert_eq!(Cpus::new(0).count(), 1);
        assert_eq!(Cpus::new(3).count(), 3);
        assert_eq!(Cpus::new(64).count(), NCPU);
    }

    #[test]
    fn count_survives_a_poisoned_slot_lock() {
        let cpus = Cpus::new(2);
        thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = cpus.slots.lock().unwrap();
                    panic!("poisoning the cpu slots");
                })
                .join();
        });
        assert!(cpus.occupants().is_err());
        assert_eq!(cpus.count(), 2);
    }

    #[test]
    fn acquire_takes_lowest_free_slot() {
        let cpus = Cpus::new(2);
        assert_eq!(cpus.acquire(7).unwrap(), 0);
        assert_eq!(cpus.acquire(8).unwrap(), 1);
        cpus.release(7).unwrap();
        assert_eq!(cpus.occupants().unwrap()[..2], [None, Some(8)]);
        assert_eq!(cpus.acquire(9).unwrap(), 0);
    }

    #[test]
    fn acquire_blocks_until_release() {
        let cpus = Arc::new(Cpus::new(1));
        cpus.acquire(1).unwrap();
        let waiter = {
            let cpus = Arc::clone(&cpus);
            thread::spawn(move || cpus.acquire(2))
        };
        cpus.release(1).unwrap();
        assert_eq!(waiter.join().unwrap().unwrap(), 0);
        assert_eq!(cpus.occupants().unwrap()[..1], [Some(2)]);
    }
}
