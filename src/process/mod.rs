//! Per-PID lookups and signal delivery
//!
//! The selection pipeline and the kill pass never touch `/proc` or `kill(2)`
//! directly. They go through two narrow seams:
//!
//! - [`ProcessInspector`] resolves a PID to its owner, resident memory,
//!   scheduling state and cgroup membership.
//! - [`Signaller`] delivers the termination signal.
//!
//! The live implementations are [`ProcfsInspector`] and [`SigkillSignaller`].

pub mod inspector;
pub mod signal;

pub use inspector::{ProcessInspector, ProcessState, ProcfsInspector, TaskRecord};
pub use signal::{SigkillSignaller, Signaller};

/// Kernel process (or thread) id
pub type Pid = libc::pid_t;

/// Kernel user id
pub type Uid = libc::uid_t;
