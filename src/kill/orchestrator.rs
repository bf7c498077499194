//! The kill pass
//!
//! ```text
//! snapshot ──► 1. quarantine every PID      (out of the limited pool first)
//!          ──► per PID:
//!                2. resolve owner + state + cgroups
//!                3. SIGKILL unless D or Z, audit log with the outcome
//!                4. PID → root freezer tasks, root memory tasks
//! ```
//!
//! Nothing here is transactional. A failure on one PID is logged, recorded
//! in the report, and the loop moves on.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, error, warn};

use crate::cgroups::context::{open_task_list, write_pid};
use crate::cgroups::CgroupContext;
use crate::error::{KillStep, KillStepFailure};
use crate::metrics;
use crate::process::{Pid, ProcessInspector, ProcessState, Signaller, Uid};
use crate::victim::VictimSnapshot;

/// What happened to each snapshotted PID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillReport {
    pub uid: Uid,
    /// Victim's aggregate RSS at selection time
    pub rss_bytes: u64,
    pub quarantined: Vec<Pid>,
    pub signaled: Vec<Pid>,
    /// Left alone because of their state (D or Z)
    pub skipped: Vec<(Pid, ProcessState)>,
    /// Gone before the kill step could resolve them
    pub vanished: Vec<Pid>,
    pub failures: Vec<KillStepFailure>,
}

impl KillReport {
    fn fail(&mut self, pid: Pid, step: KillStep, reason: impl Into<String>) {
        let failure = KillStepFailure {
            pid,
            step,
            reason: reason.into(),
        };
        warn!(pid, step = %step, reason = %failure.reason, "Kill step failed");
        metrics::record_step_failure(step);
        self.failures.push(failure);
    }
}

/// Runs the quarantine / gate / signal / bookkeeping protocol
pub struct KillOrchestrator<'a, I: ProcessInspector + ?Sized, S: Signaller + ?Sized> {
    ctx: &'a CgroupContext,
    inspector: &'a I,
    signaller: &'a S,
}

impl<'a, I: ProcessInspector + ?Sized, S: Signaller + ?Sized> KillOrchestrator<'a, I, S> {
    pub fn new(ctx: &'a CgroupContext, inspector: &'a I, signaller: &'a S) -> Self {
        Self {
            ctx,
            inspector,
            signaller,
        }
    }

    /// Act on every PID in `snapshot`, and only those
    pub fn execute(&self, snapshot: &VictimSnapshot, rss_bytes: u64) -> KillReport {
        let mut report = KillReport {
            uid: snapshot.uid,
            rss_bytes,
            ..KillReport::default()
        };

        self.quarantine(snapshot, &mut report);

        // Opened once per pass; a missing file disables that step only
        let mut freezer = open_bookkeeping(&self.ctx.freezer_root_tasks());
        let mut memory = open_bookkeeping(&self.ctx.memory_root_tasks());

        for &pid in snapshot.pids() {
            if !self.terminate(pid, &mut report) {
                continue;
            }
            record(&mut freezer, pid, KillStep::FreezerBookkeeping, &mut report);
            record(&mut memory, pid, KillStep::MemoryBookkeeping, &mut report);
        }

        report
    }

    /// Step 1: park every task before any signal goes out
    fn quarantine(&self, snapshot: &VictimSnapshot, report: &mut KillReport) {
        for &pid in snapshot.pids() {
            match self.ctx.quarantine.attach(pid) {
                Ok(()) => report.quarantined.push(pid),
                Err(e) => report.fail(pid, KillStep::Quarantine, e.to_string()),
            }
        }
    }

    /// Steps 2 and 3. Returns false if the task is already gone.
    fn terminate(&self, pid: Pid, report: &mut KillReport) -> bool {
        let uid = match self.inspector.owner(pid) {
            Ok(record) => record.uid,
            Err(miss) => {
                debug!(pid, reason = %miss.reason, "Victim task vanished before kill");
                report.vanished.push(pid);
                return false;
            }
        };
        let state = match self.inspector.state(pid) {
            Ok(state) => state,
            Err(miss) => {
                debug!(pid, reason = %miss.reason, "Victim task vanished before state check");
                report.vanished.push(pid);
                return false;
            }
        };
        let cgroups = self
            .inspector
            .cgroup_membership(pid)
            .unwrap_or_else(|miss| format!("<unavailable: {}>", miss.reason));

        if !state.is_signalable() {
            error!(alert = true, uid, pid, cgroups = %cgroups, state = %state, outcome = "skipped", "Not killing task");
            metrics::record_skipped(state);
            report.skipped.push((pid, state));
            return true;
        }

        match self.signaller.terminate(pid) {
            Ok(()) => {
                error!(alert = true, uid, pid, cgroups = %cgroups, state = %state, outcome = "signaled", "Killed task");
                metrics::record_signaled();
                report.signaled.push(pid);
            }
            Err(reason) => {
                error!(alert = true, uid, pid, cgroups = %cgroups, state = %state, outcome = "signal_failed", error = %reason, "Kill signal rejected");
                report.fail(pid, KillStep::Signal, reason);
            }
        }
        true
    }
}

/// Root task list handle, or the reason it could not be opened
type Bookkeeping = Result<File, String>;

fn open_bookkeeping(path: &Path) -> Bookkeeping {
    open_task_list(path).map_err(|e| {
        error!(alert = true, path = %path.display(), error = %e, "Cannot open root task list");
        format!("{}: {}", path.display(), e)
    })
}

/// Step 4, best-effort
fn record(file: &mut Bookkeeping, pid: Pid, step: KillStep, report: &mut KillReport) {
    let result: io::Result<()> = match file {
        Ok(file) => write_pid(file, pid),
        Err(reason) => {
            report.fail(pid, step, reason.clone());
            return;
        }
    };
    if let Err(e) = result {
        report.fail(pid, step, e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroups::QuarantineCgroup;
    use crate::error::LookupMiss;
    use crate::process::TaskRecord;
    use crate::telemetry::capture_logs;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    struct States(HashMap<Pid, ProcessState>);

    impl ProcessInspector for States {
        fn owner(&self, pid: Pid) -> Result<TaskRecord, LookupMiss> {
            self.0
                .get(&pid)
                .map(|_| TaskRecord { pid, tgid: pid, uid: 1000, rss_bytes: 0 })
                .ok_or_else(|| LookupMiss::new(pid, "gone"))
        }

        fn state(&self, pid: Pid) -> Result<ProcessState, LookupMiss> {
            self.0.get(&pid).copied().ok_or_else(|| LookupMiss::new(pid, "gone"))
        }

        fn cgroup_membership(&self, _pid: Pid) -> Result<String, LookupMiss> {
            Ok("/purgatory;".to_string())
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<Pid>>,
        reject: Vec<Pid>,
    }

    impl Signaller for Recorder {
        fn terminate(&self, pid: Pid) -> Result<(), String> {
            if self.reject.contains(&pid) {
                return Err("Operation not permitted".to_string());
            }
            self.sent.borrow_mut().push(pid);
            Ok(())
        }
    }

    struct Layout {
        _tmp: tempfile::TempDir,
        ctx: CgroupContext,
        purgatory: PathBuf,
    }

    fn layout() -> Layout {
        let tmp = tempfile::tempdir().unwrap();
        let memory = tmp.path().join("memory");
        let freezer = tmp.path().join("freezer");
        let purgatory = memory.join("purgatory");
        fs::create_dir_all(&purgatory).unwrap();
        fs::create_dir_all(&freezer).unwrap();
        let ctx = CgroupContext::new(
            &memory,
            "batch",
            &freezer,
            QuarantineCgroup::new(vec![purgatory.clone()]),
        );
        Layout { _tmp: tmp, ctx, purgatory }
    }

    fn snapshot(uid: Uid, pids: &[Pid]) -> VictimSnapshot {
        let mut snapshot = VictimSnapshot::new(uid);
        for &pid in pids {
            snapshot.push(pid);
        }
        snapshot
    }

    #[test]
    fn test_never_signals_zombie_or_d_state() {
        let layout = layout();
        let states = States(
            [
                (10, ProcessState::Runnable('R')),
                (11, ProcessState::Zombie),
                (12, ProcessState::UninterruptibleSleep),
                (13, ProcessState::Runnable('S')),
            ]
            .into_iter()
            .collect(),
        );
        let signaller = Recorder::default();

        let report = KillOrchestrator::new(&layout.ctx, &states, &signaller)
            .execute(&snapshot(1000, &[10, 11, 12, 13]), 0);

        assert_eq!(*signaller.sent.borrow(), vec![10, 13]);
        assert_eq!(report.signaled, vec![10, 13]);
        assert_eq!(
            report.skipped,
            vec![(11, ProcessState::Zombie), (12, ProcessState::UninterruptibleSleep)]
        );
        assert_eq!(report.quarantined, vec![10, 11, 12, 13]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_quarantine_and_bookkeeping_files() {
        let layout = layout();
        let states = States(
            [(10, ProcessState::Runnable('R')), (11, ProcessState::Runnable('R'))]
                .into_iter()
                .collect(),
        );
        let signaller = Recorder::default();

        KillOrchestrator::new(&layout.ctx, &states, &signaller)
            .execute(&snapshot(1000, &[10, 11]), 300);

        assert_eq!(fs::read_to_string(layout.purgatory.join("tasks")).unwrap(), "10\n11\n");
        assert_eq!(fs::read_to_string(layout.ctx.memory_root_tasks()).unwrap(), "10\n11\n");
        assert_eq!(fs::read_to_string(layout.ctx.freezer_root_tasks()).unwrap(), "10\n11\n");
    }

    /// Reads purgatory at signal time
    struct PurgatoryWitness {
        tasks: PathBuf,
        seen: RefCell<Vec<String>>,
    }

    impl Signaller for PurgatoryWitness {
        fn terminate(&self, _pid: Pid) -> Result<(), String> {
            let listed = fs::read_to_string(&self.tasks).unwrap_or_default();
            self.seen.borrow_mut().push(listed);
            Ok(())
        }
    }

    #[test]
    fn test_whole_snapshot_quarantined_before_first_signal() {
        let layout = layout();
        let states = States(
            [
                (10, ProcessState::Runnable('R')),
                (11, ProcessState::Runnable('S')),
                (12, ProcessState::Runnable('R')),
            ]
            .into_iter()
            .collect(),
        );
        let witness = PurgatoryWitness {
            tasks: layout.purgatory.join("tasks"),
            seen: RefCell::new(Vec::new()),
        };

        let report = KillOrchestrator::new(&layout.ctx, &states, &witness)
            .execute(&snapshot(1000, &[10, 11, 12]), 0);

        assert_eq!(report.signaled, vec![10, 11, 12]);
        let seen = witness.seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|listed| listed == "10\n11\n12\n"));
    }

    #[test]
    fn test_rejected_signal_is_not_logged_as_signaled() {
        let layout = layout();
        let states = States([(10, ProcessState::Runnable('R'))].into_iter().collect());
        let signaller = Recorder {
            reject: vec![10],
            ..Recorder::default()
        };

        let (report, logs) = capture_logs(|| {
            KillOrchestrator::new(&layout.ctx, &states, &signaller)
                .execute(&snapshot(1000, &[10]), 0)
        });

        assert!(report.signaled.is_empty());
        assert!(logs.contains("signal_failed"));
        assert!(!logs.contains("signaled"));
    }

    #[test]
    fn test_vanished_task_is_not_signaled_or_recorded() {
        let layout = layout();
        let states = States([(10, ProcessState::Runnable('R'))].into_iter().collect());
        let signaller = Recorder::default();

        let report = KillOrchestrator::new(&layout.ctx, &states, &signaller)
            .execute(&snapshot(1000, &[10, 99]), 0);

        assert_eq!(report.vanished, vec![99]);
        assert_eq!(report.signaled, vec![10]);
        assert_eq!(fs::read_to_string(layout.ctx.memory_root_tasks()).unwrap(), "10\n");
    }

    #[test]
    fn test_rejected_signal_does_not_stop_pass() {
        let layout = layout();
        let states = States(
            [(10, ProcessState::Runnable('R')), (11, ProcessState::Runnable('R'))]
                .into_iter()
                .collect(),
        );
        let signaller = Recorder {
            reject: vec![10],
            ..Recorder::default()
        };

        let report = KillOrchestrator::new(&layout.ctx, &states, &signaller)
            .execute(&snapshot(1000, &[10, 11]), 0);

        assert_eq!(report.signaled, vec![11]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].pid, 10);
        assert_eq!(report.failures[0].step, KillStep::Signal);
    }

    #[test]
    fn test_unopenable_bookkeeping_is_isolated() {
        let mut layout = layout();
        layout.ctx.freezer_mount = layout.ctx.freezer_mount.join("not-mounted");
        let states = States(
            [(10, ProcessState::Runnable('R')), (11, ProcessState::Runnable('R'))]
                .into_iter()
                .collect(),
        );
        let signaller = Recorder::default();

        let report = KillOrchestrator::new(&layout.ctx, &states, &signaller)
            .execute(&snapshot(1000, &[10, 11]), 0);

        assert_eq!(report.signaled, vec![10, 11]);
        let steps: Vec<_> = report.failures.iter().map(|f| (f.pid, f.step)).collect();
        assert_eq!(
            steps,
            vec![(10, KillStep::FreezerBookkeeping), (11, KillStep::FreezerBookkeeping)]
        );
        assert_eq!(fs::read_to_string(layout.ctx.memory_root_tasks()).unwrap(), "10\n11\n");
    }

    #[test]
    fn test_failed_quarantine_still_signals() {
        let mut layout = layout();
        layout.ctx.quarantine = QuarantineCgroup::new(vec![layout.purgatory.join("missing")]);
        let states = States([(10, ProcessState::Runnable('R'))].into_iter().collect());
        let signaller = Recorder::default();

        let report = KillOrchestrator::new(&layout.ctx, &states, &signaller)
            .execute(&snapshot(1000, &[10]), 0);

        assert!(report.quarantined.is_empty());
        assert_eq!(report.failures[0].step, KillStep::Quarantine);
        assert_eq!(report.signaled, vec![10]);
    }
}
