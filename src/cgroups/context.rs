//! Where the agent looks and where it puts victims
//!
//! ```text
//! /sys/fs/cgroup/memory/              ← memory_mount   (root tasks: bookkeeping)
//! ├── batch/                          ← subtree        (watched, walked)
//! │   ├── memory.oom_control
//! │   └── job-*/tasks
//! └── purgatory/tasks                 ← quarantine     (victims parked here)
//! /sys/fs/cgroup/freezer/             ← freezer_mount  (root tasks: bookkeeping)
//! └── purgatory/tasks                 ← quarantine, freezer side
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::walker::TASKS_FILE;
use crate::error::ReaperError;
use crate::process::Pid;

/// Memory-controller file carrying the `under_oom` flag
pub const OOM_CONTROL_FILE: &str = "memory.oom_control";

/// Everything one invocation needs to know about the cgroup layout
#[derive(Debug, Clone)]
pub struct CgroupContext {
    /// Root of the memory controller hierarchy
    pub memory_mount: PathBuf,
    /// Watched subtree, relative to `memory_mount`
    pub subtree: String,
    /// Root of the freezer controller hierarchy
    pub freezer_mount: PathBuf,
    /// Where victims are parked before being signaled
    pub quarantine: QuarantineCgroup,
}

impl CgroupContext {
    pub fn new(
        memory_mount: impl Into<PathBuf>,
        subtree: impl Into<String>,
        freezer_mount: impl Into<PathBuf>,
        quarantine: QuarantineCgroup,
    ) -> Self {
        Self {
            memory_mount: memory_mount.into(),
            subtree: subtree.into(),
            freezer_mount: freezer_mount.into(),
            quarantine,
        }
    }

    /// `<memory_mount>/<subtree>`
    pub fn subtree_path(&self) -> PathBuf {
        self.memory_mount
            .join(self.subtree.trim_start_matches('/'))
    }

    /// Reject layouts the kill pass cannot work with
    ///
    /// The subtree must be a real child of the mount, and purgatory must sit
    /// outside it: quarantined tasks may never be walked again.
    pub fn validate(&self) -> Result<(), ReaperError> {
        let subtree = self.subtree_path();
        if self.subtree.trim_matches('/').is_empty() {
            return Err(ReaperError::config(
                &subtree,
                "subtree must name a cgroup below the memory mount",
            ));
        }
        if let Some(dir) = self
            .quarantine
            .controllers()
            .iter()
            .find(|dir| dir.starts_with(&subtree))
        {
            return Err(ReaperError::config(
                dir,
                format!("quarantine cgroup lies inside watched subtree {}", subtree.display()),
            ));
        }
        Ok(())
    }

    /// `<memory_mount>/<subtree>/memory.oom_control`
    pub fn oom_control_path(&self) -> PathBuf {
        self.subtree_path().join(OOM_CONTROL_FILE)
    }

    /// Task list of the root memory cgroup
    pub fn memory_root_tasks(&self) -> PathBuf {
        self.memory_mount.join(TASKS_FILE)
    }

    /// Task list of the root freezer cgroup
    pub fn freezer_root_tasks(&self) -> PathBuf {
        self.freezer_mount.join(TASKS_FILE)
    }
}

/// Handle on the quarantine ("purgatory") cgroup
///
/// The group may exist under several controller hierarchies; attaching a
/// task moves it in every one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantineCgroup {
    controllers: Vec<PathBuf>,
}

impl QuarantineCgroup {
    /// `controllers` are the group's directories, one per hierarchy
    pub fn new(controllers: Vec<PathBuf>) -> Self {
        Self { controllers }
    }

    pub fn controllers(&self) -> &[PathBuf] {
        &self.controllers
    }

    /// Move `pid` into the quarantine group in every hierarchy
    ///
    /// All hierarchies are attempted even if one fails; the first failure
    /// is returned.
    pub fn attach(&self, pid: Pid) -> io::Result<()> {
        let mut first_err = None;
        for dir in &self.controllers {
            if let Err(e) = append_pid(&dir.join(TASKS_FILE), pid) {
                let e = io::Error::new(e.kind(), format!("{}: {}", dir.display(), e));
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Open a cgroup task list for writing PIDs
///
/// cgroupfs takes one id per write(2), so callers must not buffer.
pub fn open_task_list(path: &Path) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

/// Write one PID as a single write call
pub fn write_pid(file: &mut File, pid: Pid) -> io::Result<()> {
    file.write_all(format!("{}\n", pid).as_bytes())
}

fn append_pid(path: &Path, pid: Pid) -> io::Result<()> {
    let mut file = open_task_list(path)?;
    write_pid(&mut file, pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_context_paths() {
        let ctx = CgroupContext::new(
            "/sys/fs/cgroup/memory",
            "/batch",
            "/sys/fs/cgroup/freezer",
            QuarantineCgroup::new(vec![]),
        );
        assert_eq!(ctx.subtree_path(), PathBuf::from("/sys/fs/cgroup/memory/batch"));
        assert_eq!(
            ctx.oom_control_path(),
            PathBuf::from("/sys/fs/cgroup/memory/batch/memory.oom_control")
        );
        assert_eq!(ctx.memory_root_tasks(), PathBuf::from("/sys/fs/cgroup/memory/tasks"));
        assert_eq!(ctx.freezer_root_tasks(), PathBuf::from("/sys/fs/cgroup/freezer/tasks"));
    }

    #[test]
    fn test_empty_subtree_is_mount_root() {
        let ctx = CgroupContext::new("/m", "", "/f", QuarantineCgroup::new(vec![]));
        assert_eq!(ctx.subtree_path(), PathBuf::from("/m/"));
    }

    #[test]
    fn test_validate_rejects_mount_root_subtree() {
        let ctx = CgroupContext::new("/m", "/", "/f", QuarantineCgroup::new(vec![]));
        assert!(matches!(ctx.validate(), Err(ReaperError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_purgatory_inside_subtree() {
        let ctx = CgroupContext::new(
            "/m",
            "batch",
            "/f",
            QuarantineCgroup::new(vec![PathBuf::from("/m/batch/purgatory")]),
        );
        assert!(matches!(ctx.validate(), Err(ReaperError::Config { .. })));

        let ctx = CgroupContext::new(
            "/m",
            "batch",
            "/f",
            QuarantineCgroup::new(vec![PathBuf::from("/m/purgatory"), PathBuf::from("/f/purgatory")]),
        );
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn test_attach_writes_every_hierarchy() {
        let tmp = tempfile::tempdir().unwrap();
        let mem = tmp.path().join("memory/purgatory");
        let frz = tmp.path().join("freezer/purgatory");
        fs::create_dir_all(&mem).unwrap();
        fs::create_dir_all(&frz).unwrap();

        let quarantine = QuarantineCgroup::new(vec![mem.clone(), frz.clone()]);
        quarantine.attach(10).unwrap();
        quarantine.attach(11).unwrap();

        assert_eq!(fs::read_to_string(mem.join("tasks")).unwrap(), "10\n11\n");
        assert_eq!(fs::read_to_string(frz.join("tasks")).unwrap(), "10\n11\n");
    }

    #[test]
    fn test_attach_continues_past_broken_hierarchy() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good");
        fs::create_dir_all(&good).unwrap();

        let quarantine =
            QuarantineCgroup::new(vec![tmp.path().join("missing"), good.clone()]);
        assert!(quarantine.attach(5).is_err());
        assert_eq!(fs::read_to_string(good.join("tasks")).unwrap(), "5\n");
    }
}
