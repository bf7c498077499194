//! `memory.oom_control` probe
//!
//! The file is a whitespace-separated key/value stream:
//!
//! ```text
//! oom_kill_disable 1
//! under_oom 0
//! oom_kill 3
//! ```
//!
//! Only `under_oom` matters. If it is missing the memory controller is not
//! where we were told it is, and the caller must stop rather than guess.

use std::fs;
use std::path::Path;

use tracing::error;

use super::context::CgroupContext;
use crate::error::ReaperError;
use crate::metrics;

const UNDER_OOM_KEY: &str = "under_oom";

/// Whether the subtree's memory controller reports OOM pressure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OomStatus {
    UnderOom,
    NotUnderOom,
}

impl OomStatus {
    pub fn is_under_oom(&self) -> bool {
        matches!(self, OomStatus::UnderOom)
    }
}

/// Read the subtree's OOM flag
///
/// Read-only. Fails with [`ReaperError::Config`] when the control file is
/// unreadable or does not carry a well-formed `under_oom` entry.
pub fn probe_oom(ctx: &CgroupContext) -> Result<OomStatus, ReaperError> {
    let path = ctx.oom_control_path();
    let result = fs::read_to_string(&path)
        .map_err(|e| ReaperError::config(&path, format!("cannot read OOM control: {}", e)))
        .and_then(|content| parse_oom_control(&path, &content));

    match &result {
        Ok(status) => metrics::record_probe(*status),
        Err(e) => {
            metrics::record_probe_failure();
            error!(alert = true, path = %path.display(), error = %e, "OOM control probe failed");
        }
    }
    result
}

/// Find `under_oom` in the token stream and interpret the following token
pub fn parse_oom_control(path: &Path, content: &str) -> Result<OomStatus, ReaperError> {
    let mut tokens = content.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != UNDER_OOM_KEY {
            continue;
        }
        return match tokens.next() {
            Some("1") => Ok(OomStatus::UnderOom),
            Some("0") => Ok(OomStatus::NotUnderOom),
            Some(other) => Err(ReaperError::config(
                path,
                format!("unexpected {} value {:?}", UNDER_OOM_KEY, other),
            )),
            None => Err(ReaperError::config(
                path,
                format!("{} has no value", UNDER_OOM_KEY),
            )),
        };
    }
    Err(ReaperError::config(
        path,
        format!("{} key not found", UNDER_OOM_KEY),
    ))
}
