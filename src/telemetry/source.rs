//! Read-only seams onto the collaborators whose internals the core does not
//! own.

use super::error::Result;
use crate::kernel::{Clock, Kmem};

pub trait TickSource {
    fn ticks(&self) -> Result<u64>;
}

pub trait FreePageSource {
    fn free_pages(&self) -> Result<u32>;
}

impl TickSource for Clock {
    fn ticks(&self) -> Result<u64> {
        Ok(Clock::ticks(self)?)
    }
}

impl FreePageSource for Kmem {
    fn free_pages(&self) -> Result<u32> {
        Ok(Kmem::free_pages(self)?)
    }
}
