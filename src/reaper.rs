//! Entry points: `probe_oom` and `find_victim`
//!
//! A [`Reaper`] holds no state between calls. Each `find_victim` is one
//! pass from context to either a kill report or "nothing to kill". Callers
//! must not run two passes against the same subtree at once.

use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::cgroups::{self, CgroupContext, OomStatus};
use crate::error::ReaperError;
use crate::kill::{KillOrchestrator, KillReport};
use crate::metrics;
use crate::process::{ProcessInspector, ProcfsInspector, SigkillSignaller, Signaller};
use crate::victim::{select_victim, MemoryAggregator, VictimSnapshot};

/// Result of one `find_victim` pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VictimOutcome {
    /// A user was selected and the kill protocol ran
    Killed(KillReport),
    /// The subtree had no trackable tasks
    NoVictim,
}

/// Context plus the two external collaborators
pub struct Reaper<I: ProcessInspector = ProcfsInspector, S: Signaller = SigkillSignaller> {
    ctx: CgroupContext,
    inspector: I,
    signaller: S,
}

impl Reaper {
    /// Reaper backed by procfs and `kill(2)`
    pub fn live(ctx: CgroupContext) -> Self {
        Self::new(ctx, ProcfsInspector::new(), SigkillSignaller)
    }
}

impl<I: ProcessInspector, S: Signaller> Reaper<I, S> {
    pub fn new(ctx: CgroupContext, inspector: I, signaller: S) -> Self {
        Self {
            ctx,
            inspector,
            signaller,
        }
    }

    pub fn context(&self) -> &CgroupContext {
        &self.ctx
    }

    /// Read the subtree's `under_oom` flag
    pub fn probe_oom(&self) -> Result<OomStatus, ReaperError> {
        cgroups::probe_oom(&self.ctx)
    }

    /// Select the heaviest user in the subtree and kill all their tasks there
    pub fn find_victim(&self) -> VictimOutcome {
        let pass_id = Uuid::now_v7();
        let root = self.ctx.subtree_path();
        let span = info_span!("kill_pass", pass_id = %pass_id, subtree = %root.display());
        let _guard = span.enter();

        let aggregate = MemoryAggregator::collect(&self.inspector, &root);
        let Some(victim) = select_victim(&aggregate) else {
            warn!("No trackable tasks in subtree, nothing to kill");
            metrics::record_pass("no_victim");
            return VictimOutcome::NoVictim;
        };
        info!(
            uid = victim.uid,
            rss_bytes = victim.rss_bytes,
            users = aggregate.len(),
            "Selected victim"
        );

        let snapshot = VictimSnapshot::capture(&self.inspector, &root, victim.uid);
        info!(uid = victim.uid, tasks = snapshot.len(), "Captured victim snapshot");

        let report = KillOrchestrator::new(&self.ctx, &self.inspector, &self.signaller)
            .execute(&snapshot, victim.rss_bytes);
        info!(
            uid = report.uid,
            signaled = report.signaled.len(),
            skipped = report.skipped.len(),
            vanished = report.vanished.len(),
            failures = report.failures.len(),
            "Kill pass complete"
        );
        metrics::record_pass("killed");
        VictimOutcome::Killed(report)
    }
}

/// Probe with the given context
pub fn probe_oom(ctx: &CgroupContext) -> Result<OomStatus, ReaperError> {
    cgroups::probe_oom(ctx)
}

/// One live kill pass against `ctx`
pub fn find_victim(ctx: &CgroupContext) -> VictimOutcome {
    Reaper::live(ctx.clone()).find_victim()
}
