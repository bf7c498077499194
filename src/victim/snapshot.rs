//! Point-in-time PID list for the chosen user
//!
//! This is a second, independent walk. Whatever it captures is what the kill
//! pass acts on; tasks the victim forks afterwards are not included.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use tracing::{debug, error};

use crate::cgroups::{CgroupTreeWalker, TaskVisitor};
use crate::process::{Pid, ProcessInspector, Uid};

/// Ordered PIDs owned by the victim, in walk order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VictimSnapshot {
    pub uid: Uid,
    pids: Vec<Pid>,
}

impl VictimSnapshot {
    pub fn new(uid: Uid) -> Self {
        Self { uid, pids: Vec::new() }
    }

    pub fn push(&mut self, pid: Pid) {
        self.pids.push(pid);
    }

    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Walk `root` and keep every PID currently owned by `uid`
    pub fn capture<I: ProcessInspector + ?Sized>(inspector: &I, root: &Path, uid: Uid) -> Self {
        let mut enumerator = TaskSnapshotEnumerator {
            inspector,
            snapshot: Self::new(uid),
            seen: HashSet::new(),
        };
        CgroupTreeWalker::walk(root, &mut enumerator);
        enumerator.snapshot
    }
}

struct TaskSnapshotEnumerator<'a, I: ProcessInspector + ?Sized> {
    inspector: &'a I,
    snapshot: VictimSnapshot,
    seen: HashSet<Pid>,
}

impl<I: ProcessInspector + ?Sized> TaskVisitor for TaskSnapshotEnumerator<'_, I> {
    fn on_tasks(&mut self, cgroup: &Path, pids: &[Pid]) {
        for &pid in pids {
            if !self.seen.insert(pid) {
                continue;
            }
            match self.inspector.owner(pid) {
                Ok(record) if record.uid == self.snapshot.uid => self.snapshot.pids.push(pid),
                Ok(_) => {}
                Err(miss) => {
                    debug!(cgroup = %cgroup.display(), pid, reason = %miss.reason, "Task vanished during snapshot");
                }
            }
        }
    }

    fn on_error(&mut self, path: &Path, err: &io::Error) {
        error!(alert = true, path = %path.display(), error = %err, "cgroup traversal error during snapshot");
    }
}
