//! cgroup v1 plumbing for the OOM reaper
//!
//! This module knows the filesystem side of the problem:
//! - walking a memory-controller subtree level by level (`walker`)
//! - where the subtree, the root task lists and purgatory live (`context`)
//! - reading the subtree's `under_oom` flag (`oom_control`)
//!
//! # Example Usage
//!
//! ```ignore
//! use oomreaper::cgroups::{probe_oom, CgroupContext, QuarantineCgroup};
//!
//! let ctx = CgroupContext::new(
//!     "/sys/fs/cgroup/memory",
//!     "batch",
//!     "/sys/fs/cgroup/freezer",
//!     QuarantineCgroup::new(vec!["/sys/fs/cgroup/memory/purgatory".into()]),
//! );
//!
//! if probe_oom(&ctx)?.is_under_oom() {
//!     // hand over to oomreaper::find_victim
//! }
//! ```

pub mod context;
pub mod oom_control;
pub mod walker;

pub use context::{CgroupContext, QuarantineCgroup};
pub use oom_control::{probe_oom, OomStatus};
pub use walker::{CgroupTreeWalker, TaskVisitor};
