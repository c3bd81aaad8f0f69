/// Size of the per-call counter array. Index 0 is never a valid syscall.
/// Ids past the last `Syscall` are reserved: they are counted and included
/// in the total, and reports list them as one `reserved` row.
pub const NSYSCALL: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Syscall {
    Fork = 1,
    Exit,
    Wait,
    Pipe,
    Read,
    Kill,
    Exec,
    Fstat,
    Chdir,
    Dup,
    Getpid,
    Sbrk,
    Sleep,
    Uptime,
    Open,
    Write,
    Mknod,
    Unlink,
    Link,
    Mkdir,
    Close,
    Getprocinfo,
    Getmeminfo,
    Getsysinfo,
    Getsyscallstats,
    Getcpuinfo,
}

impl Syscall {
    pub const ALL: [Syscall; 26] = [
        Syscall::Fork,
        Syscall::Exit,
        Syscall::Wait,
        Syscall::Pipe,
        Syscall::Read,
        Syscall::Kill,
        Syscall::Exec,
        Syscall::Fstat,
        Syscall::Chdir,
        Syscall::Dup,
        Syscall::Getpid,
        Syscall::Sbrk,
        Syscall::Sleep,
        Syscall::Uptime,
        Syscall::Open,
        Syscall::Write,
        Syscall::Mknod,
        Syscall::Unlink,
        Syscall::Link,
        Syscall::Mkdir,
        Syscall::Close,
        Syscall::Getprocinfo,
        Syscall::Getmeminfo,
        Syscall::Getsysinfo,
        Syscall::Getsyscallstats,
        Syscall::Getcpuinfo,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Syscall::Fork => "fork",
            Syscall::Exit => "exit",
            Syscall::Wait => "wait",
            Syscall::Pipe => "pipe",
            Syscall::Read => "read",
            Syscall::Kill => "kill",
            Syscall::Exec => "exec",
            Syscall::Fstat => "fstat",
            Syscall::Chdir => "chdir",
            Syscall::Dup => "dup",
            Syscall::Getpid => "getpid",
            Syscall::Sbrk => "sbrk",
            Syscall::Sleep => "sleep",
            Syscall::Uptime => "uptime",
            Syscall::Open => "open",
            Syscall::Write => "write",
            Syscall::Mknod => "mknod",
            Syscall::Unlink => "unlink",
            Syscall::Link => "link",
            Syscall::Mkdir => "mkdir",
            Syscall::Close => "close",
            Syscall::Getprocinfo => "getprocinfo",
            Syscall::Getmeminfo => "getmeminfo",
            Syscall::Getsysinfo => "getsysinfo",
            Syscall::Getsyscallstats => "getsyscallstats",
            Syscall::Getcpuinfo => "getcpuinfo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_from_one() {
        for (i, call) in Syscall::ALL.iter().enumerate() {
            assert_eq!(call.id() as usize, i + 1);
            assert_eq!(Syscall::from_id(call.id()), Some(*call));
        }
    }

    #[test]
    fn every_id_fits_the_counter_array() {
        assert!(Syscall::ALL.iter().all(|c| (c.id() as usize) < NSYSCALL));
    }

    #[test]
    fn unknown_ids() {
        assert_eq!(Syscall::from_id(0), None);
        assert_eq!(Syscall::from_id(27), None);
        assert_eq!(Syscall::from_id(u32::MAX), None);
    }

    #[test]
    fn classic_numbering() {
        assert_eq!(Syscall::Read.id(), 5);
        assert_eq!(Syscall::Uptime.id(), 14);
        assert_eq!(Syscall::Close.name(), "close");
        assert_eq!(Syscall::Close.id(), 21);
    }
}
