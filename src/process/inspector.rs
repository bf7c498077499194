//! PID → owner / RSS / state / cgroup lookups
//!
//! ```text
//! /proc/<pid>/          owner uid  → who to blame
//! /proc/<pid>/status    VmRSS, Tgid → how much memory, which thread group
//! /proc/<pid>/stat      field 3    → R S D Z T ...
//! /proc/<pid>/cgroup    id:controllers:path → audit log only
//! ```
//!
//! Every lookup can race with process exit, so every method returns
//! [`LookupMiss`] instead of panicking or aborting the pass.

use std::fmt;
use std::fs;

use procfs::process::Process;
use procfs::ProcError;

use super::{Pid, Uid};
use crate::error::LookupMiss;

/// One task observed in a cgroup `tasks` file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRecord {
    pub pid: Pid,
    /// Thread group the task belongs to (equals `pid` for a main thread)
    pub tgid: Pid,
    pub uid: Uid,
    /// Resident set size in bytes
    pub rss_bytes: u64,
}

/// Scheduling state as reported by the third field of `/proc/<pid>/stat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Running or sleeping interruptibly (R, S, I, W)
    Runnable(char),
    /// D: the kernel will not deliver signals until the blocking call returns
    UninterruptibleSleep,
    /// Z: exited, waiting for the parent to reap it
    Zombie,
    /// Stopped, traced, dead, ...
    Other(char),
}

impl ProcessState {
    pub fn from_code(code: char) -> Self {
        match code {
            'D' => ProcessState::UninterruptibleSleep,
            'Z' => ProcessState::Zombie,
            'R' | 'S' | 'I' | 'W' => ProcessState::Runnable(code),
            other => ProcessState::Other(other),
        }
    }

    pub fn code(&self) -> char {
        match self {
            ProcessState::Runnable(c) | ProcessState::Other(c) => *c,
            ProcessState::UninterruptibleSleep => 'D',
            ProcessState::Zombie => 'Z',
        }
    }

    /// Zombies hold nothing reclaimable and D-state tasks cannot take a signal
    pub fn is_signalable(&self) -> bool {
        !matches!(
            self,
            ProcessState::UninterruptibleSleep | ProcessState::Zombie
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Resolves PIDs to the facts the pipeline needs
///
/// Implementations must be cheap: they are called once per task per pass.
pub trait ProcessInspector {
    /// Owner, resident memory and thread group of `pid`
    fn owner(&self, pid: Pid) -> Result<TaskRecord, LookupMiss>;

    /// Current scheduling state of `pid`
    fn state(&self, pid: Pid) -> Result<ProcessState, LookupMiss>;

    /// Human-readable cgroup membership, used only for logging
    fn cgroup_membership(&self, pid: Pid) -> Result<String, LookupMiss>;
}

/// Live inspector backed by procfs
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsInspector;

impl ProcfsInspector {
    pub fn new() -> Self {
        Self
    }

    fn process(pid: Pid) -> Result<Process, LookupMiss> {
        Process::new(pid).map_err(|e| miss(pid, e))
    }
}

impl ProcessInspector for ProcfsInspector {
    fn owner(&self, pid: Pid) -> Result<TaskRecord, LookupMiss> {
        let process = Self::process(pid)?;
        let uid = process.uid().map_err(|e| miss(pid, e))?;
        let status = process.status().map_err(|e| miss(pid, e))?;

        Ok(TaskRecord {
            pid,
            tgid: status.tgid,
            uid,
            // Kernel threads have no VmRSS line
            rss_bytes: status.vmrss.unwrap_or(0) * 1024,
        })
    }

    fn state(&self, pid: Pid) -> Result<ProcessState, LookupMiss> {
        let stat = Self::process(pid)?.stat().map_err(|e| miss(pid, e))?;
        Ok(ProcessState::from_code(stat.state))
    }

    fn cgroup_membership(&self, pid: Pid) -> Result<String, LookupMiss> {
        let content = fs::read_to_string(format!("/proc/{}/cgroup", pid))
            .map_err(|e| LookupMiss::new(pid, e.to_string()))?;
        Ok(format_membership(&content))
    }
}

fn miss(pid: Pid, err: ProcError) -> LookupMiss {
    match err {
        ProcError::NotFound(_) => LookupMiss::new(pid, "process no longer exists"),
        other => LookupMiss::new(pid, other.to_string()),
    }
}

/// Condense `/proc/<pid>/cgroup` into `path;path;...`
///
/// Lines look like `7:memory:/batch/job1`. Only memory-controller paths are
/// kept; an empty path becomes `/`. On a unified hierarchy (`0::/path`) there
/// is no memory line, so every path is listed instead.
pub fn format_membership(content: &str) -> String {
    let mut memory = String::new();
    let mut all = String::new();

    for line in content.lines() {
        let mut fields = line.splitn(3, ':');
        let (Some(_id), Some(controllers), Some(path)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let path = if path.is_empty() { "/" } else { path };

        if controllers.split(',').any(|c| c == "memory") {
            memory.push_str(path);
            memory.push(';');
        }
        all.push_str(path);
        all.push(';');
    }

    if memory.is_empty() {
        all
    } else {
        memory
    }
}
