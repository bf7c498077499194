//! Victim selection
//!
//! # Architecture
//!
//! ```text
//! subtree ──walk #1──► MemoryAggregator ──► UserMemoryAggregate {uid → rss}
//!                                                   │
//!                                            select_victim()
//!                                                   │ uid
//! subtree ──walk #2──► VictimSnapshot::capture ─────┘──► [pid, pid, ...]
//! ```
//!
//! The two walks are deliberately separate: the first one is allowed to be
//! stale by the time the second one runs, and only the second one is acted on.

pub mod aggregate;
pub mod selector;
pub mod snapshot;

pub use aggregate::{MemoryAggregator, UserMemoryAggregate};
pub use selector::{select_victim, Victim};
pub use snapshot::VictimSnapshot;
