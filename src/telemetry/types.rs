//! Fixed-size structures copied out across the query boundary. Callers
//! allocate them up front; nothing here owns heap memory.

use serde::Serialize;

use crate::format::percent;
use crate::kernel::{Channel, HZ, NSYSCALL, Proc, ProcName, ProcState, Syscall};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub name: ProcName,
    pub state: ProcState,
    pub size_bytes: u32,
    /// Only set while the process is sleeping.
    pub sleep_channel: Channel,
    pub killed: bool,
}

impl From<&Proc> for ProcessRecord {
    fn from(p: &Proc) -> Self {
        let sleep_channel = if p.state == ProcState::Sleeping {
            p.chan
        } else {
            Channel::NONE
        };
        ProcessRecord {
            pid: p.pid,
            ppid: p.ppid,
            name: p.name,
            state: p.state,
            size_bytes: p.sz,
            sleep_channel,
            killed: p.killed,
        }
    }
}

impl ProcessRecord {
    pub fn size_kb(&self) -> u32 {
        self.size_bytes / 1024
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct MemoryInfo {
    pub page_size: u32,
    pub total_pages: u32,
    pub free_pages: u32,
    pub used_pages: u32,
    pub kernel_end: u32,
}

impl MemoryInfo {
    /// Whole percent of pages in use; 0 when there are no pages at all.
    pub fn usage_percent(&self) -> u32 {
        percent(self.used_pages.into(), self.total_pages.into()) as u32
    }

    pub fn pages_to_kb(&self, pages: u32) -> u64 {
        u64::from(pages) * u64::from(self.page_size) / 1024
    }

    pub fn total_kb(&self) -> u64 {
        self.pages_to_kb(self.total_pages)
    }

    pub fn used_kb(&self) -> u64 {
        self.pages_to_kb(self.used_pages)
    }

    pub fn free_kb(&self) -> u64 {
        self.pages_to_kb(self.free_pages)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct ProcessQueueSummary {
    pub unused: u32,
    pub embryo: u32,
    pub sleeping: u32,
    pub runnable: u32,
    pub running: u32,
    pub zombie: u32,
    /// Every state except `Unused`.
    pub total: u32,
}

impl ProcessQueueSummary {
    pub fn tally(&mut self, state: ProcState) {
        let bucket = match state {
            ProcState::Unused => {
                self.unused += 1;
                return;
            }
            ProcState::Embryo => &mut self.embryo,
            ProcState::Sleeping => &mut self.sleeping,
            ProcState::Runnable => &mut self.runnable,
            ProcState::Running => &mut self.running,
            ProcState::Zombie => &mut self.zombie,
        };
        *bucket += 1;
        self.total += 1;
    }

    pub fn count(&self, state: ProcState) -> u32 {
        match state {
            ProcState::Unused => self.unused,
            ProcState::Embryo => self.embryo,
            ProcState::Sleeping => self.sleeping,
            ProcState::Runnable => self.runnable,
            ProcState::Running => self.running,
            ProcState::Zombie => self.zombie,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct SyscallStats {
    pub total_calls: u64,
    /// Indexed by syscall id; slot 0 stays zero.
    pub calls: [u64; NSYSCALL],
}

impl Default for SyscallStats {
    fn default() -> Self {
        SyscallStats {
            total_calls: 0,
            calls: [0; NSYSCALL],
        }
    }
}

impl SyscallStats {
    pub fn count(&self, id: u32) -> u64 {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.calls.get(i))
            .copied()
            .unwrap_or(0)
    }

    /// Known syscalls that have been made at least once, in id order.
    pub fn nonzero(&self) -> impl Iterator<Item = (Syscall, u64)> + '_ {
        Syscall::ALL
            .iter()
            .map(|&call| (call, self.count(call.id())))
            .filter(|&(_, n)| n > 0)
    }

    /// Calls made with a reserved id, i.e. one with no `Syscall` variant.
    pub fn reserved(&self) -> u64 {
        self.calls
            .iter()
            .enumerate()
            .filter(|&(id, _)| id != 0 && Syscall::from_id(id as u32).is_none())
            .fold(0, |sum, (_, &n)| sum.saturating_add(n))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct SystemSnapshot {
    pub uptime: u64,
    pub mem: MemoryInfo,
    pub queue: ProcessQueueSummary,
    pub ncpu: u32,
}

impl SystemSnapshot {
    pub fn uptime_secs(&self) -> u64 {
        self.uptime / HZ
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct CpuInfo {
    pub cpu_id: u32,
    pub has_proc: bool,
    pub proc_pid: u32,
    pub proc_name: ProcName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_drops_channel_unless_sleeping() {
        let mut proc = Proc {
            pid: 4,
            ppid: 2,
            name: ProcName::new("cat"),
            state: ProcState::Sleeping,
            sz: 12288,
            chan: Channel::TICKS,
            killed: false,
        };
        assert_eq!(ProcessRecord::from(&proc).sleep_channel, Channel::TICKS);

        proc.state = ProcState::Runnable;
        let record = ProcessRecord::from(&proc);
        assert!(record.sleep_channel.is_none());
        assert_eq!(record.size_kb(), 12);
    }

    #[test]
    fn tally_keeps_total_in_step() {
        let mut summary = ProcessQueueSummary::default();
        for state in ProcState::ALL {
            summary.tally(state);
        }
        summary.tally(ProcState::Running);
        assert_eq!(summary.unused, 1);
        assert_eq!(summary.running, 2);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.count(ProcState::Running), 2);
    }

    #[test]
    fn usage_percent_of_empty_memory_is_zero() {
        assert_eq!(MemoryInfo::default().usage_percent(), 0);
        let mem = MemoryInfo {
            page_size: 4096,
            total_pages: 200,
            free_pages: 150,
            used_pages: 50,
            kernel_end: 0,
        };
        assert_eq!(mem.usage_percent(), 25);
        assert_eq!(mem.used_kb(), 200);
    }

    #[test]
    fn nonzero_skips_idle_and_unknown_slots() {
        let mut stats = SyscallStats::default();
        stats.calls[5] = 3;
        stats.calls[29] = 9;
        let rows: Vec<_> = stats.nonzero().collect();
        assert_eq!(rows, vec![(Syscall::Read, 3)]);
        assert_eq!(stats.count(99), 0);
    }

    #[test]
    fn reserved_ids_account_for_the_rest_of_the_total() {
        let mut stats = SyscallStats::default();
        stats.calls[Syscall::Fork.id() as usize] = 2;
        stats.calls[27] = 4;
        stats.calls[29] = 1;
        stats.total_calls = 7;
        let listed: u64 = stats.nonzero().map(|(_, n)| n).sum();
        assert_eq!(stats.reserved(), 5);
        assert_eq!(listed + stats.reserved(), stats.total_calls);
    }

    #[test]
    fn record_serializes_with_readable_fields() {
        let record = ProcessRecord {
            pid: 1,
            ppid: 0,
            name: ProcName::new("init"),
            state: ProcState::Sleeping,
            size_bytes: 12288,
            sleep_channel: Channel::NONE,
            killed: false,
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["name"], "init");
        assert_eq!(json["state"], "sleeping");
        assert!(json["sleep_channel"].is_null());
    }
}
