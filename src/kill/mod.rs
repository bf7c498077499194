//! Kill pass: quarantine, state gate, SIGKILL, root task-list bookkeeping

pub mod orchestrator;

pub use orchestrator::{KillOrchestrator, KillReport};
