//! Privilege checks for the reaper
//!
//! The reaper signals other users' tasks and rewrites cgroup membership,
//! which only works with the right capabilities. See `capabilities`.

pub mod capabilities;

pub use capabilities::{missing_capabilities, preflight, REQUIRED_CAPS};
