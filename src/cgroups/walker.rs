//! Best-effort recursive walk of a cgroup v1 subtree
//!
//! ```text
//! <mount>/<subtree>/          ← visited, tasks read
//! ├── tasks                   ← PIDs directly at this level
//! ├── memory.limit_in_bytes   ← file: stat("x/") gives ENOTDIR, skipped silently
//! ├── .hidden/                ← dot entries never descended into
//! └── job1/                   ← visited, tasks read
//!     └── tasks
//! ```
//!
//! The hierarchy changes underneath us while we walk it. Nothing found here
//! is fatal: a failed branch is reported to the visitor and the walk goes on.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use tracing::warn;

use crate::process::Pid;

/// Name of the per-level task list in a cgroup v1 hierarchy
pub const TASKS_FILE: &str = "tasks";

/// Receives everything the walker finds
pub trait TaskVisitor {
    /// PIDs listed directly in `cgroup`'s task file (possibly empty)
    fn on_tasks(&mut self, cgroup: &Path, pids: &[Pid]);

    /// A branch could not be inspected and was abandoned
    fn on_error(&mut self, path: &Path, err: &io::Error);
}

/// Walks a cgroup subtree, feeding each level's task list to a visitor
#[derive(Debug, Default)]
pub struct CgroupTreeWalker {
    visited: HashSet<(u64, u64)>,
}

impl CgroupTreeWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit `root` and every directory beneath it, once each
    pub fn walk<V: TaskVisitor>(root: &Path, visitor: &mut V) {
        let mut walker = Self::new();
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => walker.visit(root, &meta, visitor),
            Ok(_) => visitor.on_error(
                root,
                &io::Error::new(io::ErrorKind::InvalidInput, "cgroup root is not a directory"),
            ),
            Err(e) => visitor.on_error(root, &e),
        }
    }

    fn visit<V: TaskVisitor>(&mut self, dir: &Path, meta: &fs::Metadata, visitor: &mut V) {
        if !self.visited.insert((meta.dev(), meta.ino())) {
            return;
        }

        match read_tasks(&dir.join(TASKS_FILE)) {
            Ok(pids) => visitor.on_tasks(dir, &pids),
            Err(e) => {
                visitor.on_error(&dir.join(TASKS_FILE), &e);
                visitor.on_tasks(dir, &[]);
            }
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                visitor.on_error(dir, &e);
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    visitor.on_error(dir, &e);
                    continue;
                }
            };
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            // Trailing separator: regular files fail with ENOTDIR instead of
            // succeeding, which is how files are told apart from branches.
            let path = entry.path().join("");
            match fs::metadata(&path) {
                Ok(child) if child.is_dir() => self.visit(&entry.path(), &child, visitor),
                Ok(_) => {}
                Err(e) if is_not_a_directory(&e) => {}
                Err(e) => visitor.on_error(&entry.path(), &e),
            }
        }
    }
}

fn is_not_a_directory(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENOTDIR)
}

/// Parse a `tasks` file. Missing or empty means no tasks.
pub fn read_tasks(path: &Path) -> io::Result<Vec<Pid>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(parse_tasks(path, &content))
}

fn parse_tasks(path: &Path, content: &str) -> Vec<Pid> {
    content
        .split_whitespace()
        .filter_map(|token| match token.parse::<Pid>() {
            Ok(pid) if pid > 0 => Some(pid),
            _ => {
                warn!(path = %path.display(), token, "Ignoring malformed task id");
                None
            }
        })
        .collect()
}
