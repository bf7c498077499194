//! Error types shared by the probe, the selection pipeline and the kill pass
//!
//! Only [`ReaperError`] ever aborts a call. The other types are per-PID
//! records: they are logged, stored in the kill report, and processing moves
//! on to the next task.

use std::fmt;
use std::path::PathBuf;

use crate::process::Pid;

/// Hard-stop errors: the agent is pointed at an unusable control surface
#[derive(Debug)]
pub enum ReaperError {
    /// Malformed or missing control/config file
    Config { path: PathBuf, reason: String },
}

impl ReaperError {
    pub(crate) fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ReaperError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ReaperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaperError::Config { path, reason } => {
                write!(f, "Configuration error in {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ReaperError {}

/// A PID could not be resolved (usually because it already exited)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupMiss {
    pub pid: Pid,
    pub reason: String,
}

impl LookupMiss {
    pub fn new(pid: Pid, reason: impl Into<String>) -> Self {
        Self {
            pid,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lookup of PID {} failed: {}", self.pid, self.reason)
    }
}

impl std::error::Error for LookupMiss {}

/// Which step of the kill protocol failed for a PID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KillStep {
    Quarantine,
    Signal,
    FreezerBookkeeping,
    MemoryBookkeeping,
}

impl KillStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            KillStep::Quarantine => "quarantine",
            KillStep::Signal => "signal",
            KillStep::FreezerBookkeeping => "freezer_bookkeeping",
            KillStep::MemoryBookkeeping => "memory_bookkeeping",
        }
    }
}

impl fmt::Display for KillStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One isolated failure inside a kill pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillStepFailure {
    pub pid: Pid,
    pub step: KillStep,
    pub reason: String,
}

impl fmt::Display for KillStepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for PID {}: {}", self.step, self.pid, self.reason)
    }
}

impl std::error::Error for KillStepFailure {}
