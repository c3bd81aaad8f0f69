//! Point-in-time views of kernel state.
//!
//! Each service here takes exactly one collaborator lock, copies what it
//! needs and releases it before returning. The aggregate snapshot is built
//! from several such sections in sequence and is therefore not atomic across
//! its sources.

pub mod aggregate;
pub mod counters;
pub mod error;
pub mod memory;
pub mod procs;
pub mod query;
pub mod source;
pub mod types;

pub use error::{Result, TelemetryError};
pub use query::{QueryInterface, Telemetry};
pub use types::{
    CpuInfo, MemoryInfo, ProcessQueueSummary, ProcessRecord, SyscallStats, SystemSnapshot,
};
