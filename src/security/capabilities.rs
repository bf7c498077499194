//! Capability preflight for the reaper
//!
//! The kill pass needs to:
//!
//! ```text
//! ┌────────────────────┬──────────────────────────────────────────────┐
//! │ Capability         │ Used for                                     │
//! ├────────────────────┼──────────────────────────────────────────────┤
//! │ CAP_KILL           │ SIGKILL tasks owned by other users           │
//! │ CAP_SYS_ADMIN      │ move tasks between cgroups                   │
//! │ CAP_DAC_OVERRIDE   │ write root-owned cgroup task lists           │
//! └────────────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! A missing capability does not stop a pass (per-PID failures are already
//! isolated), but it turns every kill into a logged failure, so the binary
//! warns about it up front.

use std::io;

use caps::{CapSet, Capability, CapsHashSet};

/// Capabilities the kill pass relies on
pub const REQUIRED_CAPS: [Capability; 3] = [
    Capability::CAP_KILL,
    Capability::CAP_SYS_ADMIN,
    Capability::CAP_DAC_OVERRIDE,
];

/// Names of required capabilities absent from `effective`
pub fn missing_capabilities(effective: &CapsHashSet) -> Vec<&'static str> {
    REQUIRED_CAPS
        .iter()
        .filter(|cap| !effective.contains(*cap))
        .map(|cap| cap_name(*cap))
        .collect()
}

/// Check this process's effective set
pub fn preflight() -> Result<Vec<&'static str>, io::Error> {
    let effective = caps::read(None, CapSet::Effective)
        .map_err(|e| io::Error::new(io::ErrorKind::PermissionDenied, e.to_string()))?;
    Ok(missing_capabilities(&effective))
}

fn cap_name(cap: Capability) -> &'static str {
    match cap {
        Capability::CAP_KILL => "CAP_KILL",
        Capability::CAP_SYS_ADMIN => "CAP_SYS_ADMIN",
        Capability::CAP_DAC_OVERRIDE => "CAP_DAC_OVERRIDE",
        _ => "UNKNOWN_CAP",
    }
}
