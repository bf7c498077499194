//! UID → total resident memory across a subtree
//!
//! One walk, one lookup per task. Tasks that exit mid-walk contribute
//! nothing; every other task adds its RSS to its owner's total no matter how
//! deep in the subtree it sits.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;

use tracing::{debug, error};

use crate::cgroups::{CgroupTreeWalker, TaskVisitor};
use crate::process::{Pid, ProcessInspector, Uid};

/// Per-UID resident memory totals for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMemoryAggregate {
    totals: BTreeMap<Uid, u64>,
}

impl UserMemoryAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// First sighting initializes, later sightings add
    pub fn add(&mut self, uid: Uid, rss_bytes: u64) {
        *self.totals.entry(uid).or_insert(0) += rss_bytes;
    }

    pub fn get(&self, uid: Uid) -> Option<u64> {
        self.totals.get(&uid).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Entries in ascending UID order
    pub fn iter(&self) -> impl Iterator<Item = (Uid, u64)> + '_ {
        self.totals.iter().map(|(uid, rss)| (*uid, *rss))
    }
}

impl FromIterator<(Uid, u64)> for UserMemoryAggregate {
    fn from_iter<T: IntoIterator<Item = (Uid, u64)>>(iter: T) -> Self {
        let mut aggregate = Self::new();
        for (uid, rss) in iter {
            aggregate.add(uid, rss);
        }
        aggregate
    }
}

/// Visitor that sums RSS per owner while the walker runs
pub struct MemoryAggregator<'a, I: ProcessInspector + ?Sized> {
    inspector: &'a I,
    aggregate: UserMemoryAggregate,
    /// Thread groups already counted; `tasks` lists every thread
    counted: HashSet<Pid>,
}

impl<'a, I: ProcessInspector + ?Sized> MemoryAggregator<'a, I> {
    pub fn new(inspector: &'a I) -> Self {
        Self {
            inspector,
            aggregate: UserMemoryAggregate::new(),
            counted: HashSet::new(),
        }
    }

    /// Walk `root` once and return the totals
    pub fn collect(inspector: &'a I, root: &Path) -> UserMemoryAggregate {
        let mut aggregator = Self::new(inspector);
        CgroupTreeWalker::walk(root, &mut aggregator);
        aggregator.aggregate
    }
}

impl<I: ProcessInspector + ?Sized> TaskVisitor for MemoryAggregator<'_, I> {
    fn on_tasks(&mut self, cgroup: &Path, pids: &[Pid]) {
        for &pid in pids {
            match self.inspector.owner(pid) {
                Ok(record) => {
                    if self.counted.insert(record.tgid) {
                        self.aggregate.add(record.uid, record.rss_bytes);
                    } else {
                        // Thread of a group already counted: register the owner only
                        self.aggregate.add(record.uid, 0);
                    }
                }
                Err(miss) => {
                    debug!(cgroup = %cgroup.display(), pid, reason = %miss.reason, "Task vanished during aggregation");
                }
            }
        }
    }

    fn on_error(&mut self, path: &Path, err: &io::Error) {
        error!(alert = true, path = %path.display(), error = %err, "cgroup traversal error during aggregation");
    }
}
