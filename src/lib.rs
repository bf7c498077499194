//! oomreaper - per-user OOM mitigation for cgroup subtrees
//!
//! When a memory-controlled subtree reports `under_oom`, the reaper finds
//! the user holding the most resident memory anywhere in that subtree and
//! kills every task of theirs in it: quarantine first, then SIGKILL for
//! everything that can take a signal.
//!
//! # Modules
//!
//! - `cgroups` - subtree walk, cgroup layout, `memory.oom_control` probe
//! - `process` - PID lookups (procfs) and signal delivery
//! - `victim` - per-UID aggregation, victim selection, kill snapshot
//! - `kill` - the quarantine / gate / signal / bookkeeping protocol
//! - `reaper` - `probe_oom` and `find_victim` entry points
//! - `config` - JSON configuration
//! - `metrics` - Prometheus counters
//! - `security` - capability preflight
//! - `telemetry` - tracing subscriber setup
//!
//! # Quick Start
//!
//! ```ignore
//! use oomreaper::{config::ReaperConfig, Reaper, VictimOutcome};
//!
//! let config = ReaperConfig::from_file("/etc/oomreaper/config.json".as_ref())?;
//! let reaper = Reaper::live(config.context()?);
//!
//! if reaper.probe_oom()?.is_under_oom() {
//!     if let VictimOutcome::Killed(report) = reaper.find_victim() {
//!         println!("killed {} tasks of uid {}", report.signaled.len(), report.uid);
//!     }
//! }
//! ```

pub mod cgroups;
pub mod config;
pub mod error;
pub mod kill;
pub mod metrics;
pub mod process;
pub mod reaper;
pub mod security;
pub mod telemetry;
pub mod victim;

// Re-export commonly used types at crate root for convenience
pub use cgroups::{CgroupContext, OomStatus, QuarantineCgroup};
pub use error::ReaperError;
pub use kill::KillReport;
pub use reaper::{find_victim, probe_oom, Reaper, VictimOutcome};
