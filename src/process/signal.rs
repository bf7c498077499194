//! Termination signal delivery

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid as NixPid;

use super::Pid;

/// Delivers the unblockable termination signal to one task
pub trait Signaller {
    fn terminate(&self, pid: Pid) -> Result<(), String>;
}

/// Live signaller: `kill(pid, SIGKILL)`
#[derive(Debug, Default, Clone, Copy)]
pub struct SigkillSignaller;

impl Signaller for SigkillSignaller {
    fn terminate(&self, pid: Pid) -> Result<(), String> {
        // pid <= 0 would address a whole process group
        if pid <= 0 {
            return Err(format!("refusing to signal non-positive pid {}", pid));
        }
        kill(NixPid::from_raw(pid), Signal::SIGKILL).map_err(|errno| errno.desc().to_string())
    }
}
