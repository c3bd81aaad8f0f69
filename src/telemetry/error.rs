use crate::kernel::KernelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TelemetryError {
    /// A clock, table or allocator could not be read. Callers treat this as
    /// "no data".
    #[error("{collaborator} unavailable")]
    CollaboratorUnavailable { collaborator: &'static str },
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

impl From<KernelError> for TelemetryError {
    fn from(err: KernelError) -> Self {
        let collaborator = match err {
            KernelError::Unavailable(what) => what,
            _ => "kernel",
        };
        TelemetryError::CollaboratorUnavailable { collaborator }
    }
}
