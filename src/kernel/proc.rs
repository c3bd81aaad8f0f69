use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};

use serde::{Serialize, Serializer};

use super::KernelError;

/// Width of a process name including the terminating nul.
pub const NAME_LEN: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ProcState {
    #[default]
    Unused,
    Embryo,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

impl ProcState {
    pub const ALL: [ProcState; 6] = [
        ProcState::Unused,
        ProcState::Embryo,
        ProcState::Sleeping,
        ProcState::Runnable,
        ProcState::Running,
        ProcState::Zombie,
    ];

    pub fn is_live(self) -> bool {
        self != ProcState::Unused
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcState::Unused => "UNUSED",
            ProcState::Embryo => "EMBRYO",
            ProcState::Sleeping => "SLEEPING",
            ProcState::Runnable => "RUNNABLE",
            ProcState::Running => "RUNNING",
            ProcState::Zombie => "ZOMBIE",
        }
    }

    /// Scheduler-oriented names used by the top view.
    pub fn queue_label(self) -> &'static str {
        match self {
            ProcState::Unused => "----",
            ProcState::Embryo => "EMBRYO",
            ProcState::Sleeping => "SLEEP",
            ProcState::Runnable => "READY",
            ProcState::Running => "RUNNING",
            ProcState::Zombie => "ZOMBIE",
        }
    }

    /// Four-column names used by the supervisor listing.
    pub fn short_label(self) -> &'static str {
        match self {
            ProcState::Unused => "----",
            ProcState::Embryo => "EMBR",
            ProcState::Sleeping => "SLEP",
            ProcState::Runnable => "REDY",
            ProcState::Running => "RUN ",
            ProcState::Zombie => "ZOMB",
        }
    }
}

impl fmt::Display for ProcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Fixed-width, nul-terminated process name.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ProcName([u8; NAME_LEN]);

impl ProcName {
    /// Copies at most `NAME_LEN - 1` bytes, cut back to a char boundary, so the
    /// buffer always keeps its terminating nul.
    pub fn new(name: &str) -> Self {
        let mut buf = [0u8; NAME_LEN];
        let mut len = name.len().min(NAME_LEN - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        ProcName(buf)
    }

    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        &self.0[..end]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("?")
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl fmt::Debug for ProcName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ProcName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for ProcName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Opaque wait-channel identifier. Zero means "not waiting on anything".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Channel(u64);

impl Channel {
    pub const NONE: Channel = Channel(0);
    /// Processes in `sleep` wait on the tick counter.
    pub const TICKS: Channel = Channel(0x8011_4c80);

    /// Channel a parent blocks on while waiting for its children.
    pub fn of_pid(pid: u32) -> Self {
        Channel(0x8011_0000 | u64::from(pid) << 8)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_none() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(&self.0)
        }
    }
}

/// One process-table slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Proc {
    pub pid: u32,
    /// Parent pid, 0 for the root or an orphan.
    pub ppid: u32,
    pub name: ProcName,
    pub state: ProcState,
    /// Size of the process image in bytes.
    pub sz: u32,
    pub chan: Channel,
    pub killed: bool,
}

#[derive(Debug)]
pub struct Table {
    slots: Box<[Proc]>,
    next_pid: u32,
}

impl Table {
    fn new(nproc: usize) -> Self {
        Table {
            slots: vec![Proc::default(); nproc].into_boxed_slice(),
            next_pid: 1,
        }
    }

    pub fn slots(&self) -> &[Proc] {
        &self.slots
    }

    /// Claims the first unused slot as an `Embryo`.
    pub fn alloc(&mut self, name: &str, ppid: u32, sz: u32) -> Result<u32, KernelError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|p| p.state == ProcState::Unused)
            .ok_or(KernelError::NoFreeSlot)?;
        let pid = self.next_pid;
        self.next_pid += 1;
        *slot = Proc {
            pid,
            ppid,
            name: ProcName::new(name),
            state: ProcState::Embryo,
            sz,
            chan: Channel::NONE,
            killed: false,
        };
        Ok(pid)
    }

    pub fn get(&self, pid: u32) -> Option<&Proc> {
        self.slots
            .iter()
            .find(|p| p.state.is_live() && p.pid == pid)
    }

    pub fn get_mut(&mut self, pid: u32) -> Option<&mut Proc> {
        self.slots
            .iter_mut()
            .find(|p| p.state.is_live() && p.pid == pid)
    }

    pub fn set_state(
        &mut self,
        pid: u32,
        state: ProcState,
        chan: Channel,
    ) -> Result<(), KernelError> {
        let proc = self.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        proc.state = state;
        proc.chan = chan;
        Ok(())
    }

    pub fn children_of(&self, ppid: u32) -> impl Iterator<Item = &Proc> {
        self.slots
            .iter()
            .filter(move |p| p.state.is_live() && p.ppid == ppid)
    }

    /// Hands `pid`'s children to `new_parent`.
    pub fn reparent(&mut self, pid: u32, new_parent: u32) {
        for proc in self.slots.iter_mut() {
            if proc.state.is_live() && proc.ppid == pid {
                proc.ppid = new_parent;
            }
        }
    }

    pub fn kill_all(&mut self) {
        for proc in self.slots.iter_mut().filter(|p| p.state.is_live()) {
            proc.killed = true;
        }
    }

    /// Returns the slot to `Unused`, handing back what it held.
    pub fn free(&mut self, pid: u32) -> Option<Proc> {
        let slot = self.get_mut(pid)?;
        let old = *slot;
        *slot = Proc::default();
        Some(old)
    }
}

/// The shared process table and the lock that guards it.
#[derive(Debug)]
pub struct ProcessTable {
    inner: Mutex<Table>,
    changed: Condvar,
}

impl ProcessTable {
    pub fn new(nproc: usize) -> Self {
        ProcessTable {
            inner: Mutex::new(Table::new(nproc)),
            changed: Condvar::new(),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Table>, KernelError> {
        self.inner
            .lock()
            .map_err(|_| KernelError::Unavailable("process table"))
    }

    /// Releases the lock until the next `wakeup`, then reacquires it.
    pub fn sleep<'a>(
        &self,
        guard: MutexGuard<'a, Table>,
    ) -> Result<MutexGuard<'a, Table>, KernelError> {
        self.changed
            .wait(guard)
            .map_err(|_| KernelError::Unavailable("process table"))
    }

    pub fn wakeup(&self) {
        self.changed.notify_all();
    }
}
