//! Prometheus metrics for the OOM reaper
//!
//! All metrics live in the default registry; `gather_text()` renders them
//! for whatever exporter the surrounding daemon runs.

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_int_counter, CounterVec, Encoder, IntCounter, TextEncoder};

use crate::cgroups::OomStatus;
use crate::error::KillStep;
use crate::process::ProcessState;

lazy_static! {
    // ─────────────────────────────────────────────────────────────────────────────
    // Probe Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// OOM-control probes by result.
    ///
    /// Labels:
    /// - result: "under_oom", "not_under_oom" or "config_error"
    pub static ref OOM_PROBES: CounterVec = register_counter_vec!(
        "oomreaper_probes_total",
        "memory.oom_control probes by result",
        &["result"]
    ).expect("failed to register OOM_PROBES metric");

    // ─────────────────────────────────────────────────────────────────────────────
    // Kill Pass Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Kill passes by outcome ("killed" or "no_victim").
    pub static ref KILL_PASSES: CounterVec = register_counter_vec!(
        "oomreaper_passes_total",
        "find_victim invocations by outcome",
        &["outcome"]
    ).expect("failed to register KILL_PASSES metric");

    /// Tasks that were sent SIGKILL.
    pub static ref TASKS_SIGNALED: IntCounter = register_int_counter!(
        "oomreaper_tasks_signaled_total",
        "Tasks sent SIGKILL"
    ).expect("failed to register TASKS_SIGNALED metric");

    /// Tasks left alone because of their scheduling state.
    ///
    /// Labels:
    /// - state: single-letter process state ("D" or "Z")
    pub static ref TASKS_SKIPPED: CounterVec = register_counter_vec!(
        "oomreaper_tasks_skipped_total",
        "Snapshotted tasks not signaled because of their state",
        &["state"]
    ).expect("failed to register TASKS_SKIPPED metric");

    /// Per-PID failures inside a kill pass, by protocol step.
    pub static ref KILL_STEP_FAILURES: CounterVec = register_counter_vec!(
        "oomreaper_kill_step_failures_total",
        "Isolated per-task failures during kill passes",
        &["step"]
    ).expect("failed to register KILL_STEP_FAILURES metric");
}

pub fn record_probe(status: OomStatus) {
    let result = match status {
        OomStatus::UnderOom => "under_oom",
        OomStatus::NotUnderOom => "not_under_oom",
    };
    OOM_PROBES.with_label_values(&[result]).inc();
}

pub fn record_probe_failure() {
    OOM_PROBES.with_label_values(&["config_error"]).inc();
}

pub fn record_pass(outcome: &str) {
    KILL_PASSES.with_label_values(&[outcome]).inc();
}

pub fn record_signaled() {
    TASKS_SIGNALED.inc();
}

pub fn record_skipped(state: ProcessState) {
    let code = state.code().to_string();
    TASKS_SKIPPED.with_label_values(&[code.as_str()]).inc();
}

pub fn record_step_failure(step: KillStep) {
    KILL_STEP_FAILURES.with_label_values(&[step.as_str()]).inc();
}

/// Render the default registry in the text exposition format
pub fn gather_text() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_exported() {
        record_signaled();
        record_skipped(ProcessState::Zombie);
        record_step_failure(KillStep::Quarantine);

        let text = gather_text();
        assert!(text.contains("oomreaper_tasks_signaled_total"));
        assert!(text.contains("oomreaper_tasks_skipped_total{state=\"Z\"}"));
        assert!(text.contains("oomreaper_kill_step_failures_total{step=\"quarantine\"}"));
    }
}
