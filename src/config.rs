//! On-disk configuration
//!
//! ```json
//! {
//!   "memory_mount": "/sys/fs/cgroup/memory",
//!   "subtree": "batch",
//!   "freezer_mount": "/sys/fs/cgroup/freezer",
//!   "purgatory": ["/sys/fs/cgroup/memory/purgatory", "/sys/fs/cgroup/freezer/purgatory"],
//!   "log_filter": "info,oomreaper=debug",
//!   "json_logs": false
//! }
//! ```
//!
//! Every field except `subtree` is optional. The whole memory hierarchy is
//! never a valid target: it would include purgatory itself.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cgroups::{CgroupContext, QuarantineCgroup};
use crate::error::ReaperError;

/// Default config location for the binary
pub const DEFAULT_CONFIG_PATH: &str = "/etc/oomreaper/config.json";

const DEFAULT_MEMORY_MOUNT: &str = "/sys/fs/cgroup/memory";
const DEFAULT_FREEZER_MOUNT: &str = "/sys/fs/cgroup/freezer";
const PURGATORY_NAME: &str = "purgatory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperConfig {
    pub memory_mount: PathBuf,
    pub subtree: String,
    pub freezer_mount: PathBuf,
    /// Quarantine directories; empty means `purgatory` under both mounts
    pub purgatory: Vec<PathBuf>,
    pub log_filter: Option<String>,
    pub json_logs: bool,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            memory_mount: PathBuf::from(DEFAULT_MEMORY_MOUNT),
            subtree: String::new(),
            freezer_mount: PathBuf::from(DEFAULT_FREEZER_MOUNT),
            purgatory: Vec::new(),
            log_filter: None,
            json_logs: false,
        }
    }
}

impl ReaperConfig {
    pub fn from_file(path: &Path) -> Result<Self, ReaperError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ReaperError::config(path, format!("cannot read config: {}", e)))?;
        Self::from_json(path, &content)
    }

    pub fn from_json(path: &Path, content: &str) -> Result<Self, ReaperError> {
        serde_json::from_str(content)
            .map_err(|e| ReaperError::config(path, format!("invalid config: {}", e)))
    }

    /// Quarantine directories after defaulting
    pub fn purgatory_dirs(&self) -> Vec<PathBuf> {
        if !self.purgatory.is_empty() {
            return self.purgatory.clone();
        }
        vec![
            self.memory_mount.join(PURGATORY_NAME),
            self.freezer_mount.join(PURGATORY_NAME),
        ]
    }

    /// Validated context; fails if the layout would let purgatory be walked
    pub fn context(&self) -> Result<CgroupContext, ReaperError> {
        let ctx = CgroupContext::new(
            &self.memory_mount,
            self.subtree.clone(),
            &self.freezer_mount,
            QuarantineCgroup::new(self.purgatory_dirs()),
        );
        ctx.validate()?;
        Ok(ctx)
    }
}
