//! Pick the heaviest user

use super::aggregate::UserMemoryAggregate;
use crate::process::Uid;

/// The user chosen for termination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Victim {
    pub uid: Uid,
    pub rss_bytes: u64,
}

/// UID with the largest total; ties go to the lowest UID.
///
/// `None` on an empty aggregate. Whether that is notable is the caller's call.
pub fn select_victim(aggregate: &UserMemoryAggregate) -> Option<Victim> {
    let mut best: Option<Victim> = None;
    // Ascending UID order, strict comparison: the first maximum wins
    for (uid, rss_bytes) in aggregate.iter() {
        if best.map_or(true, |b| rss_bytes > b.rss_bytes) {
            best = Some(Victim { uid, rss_bytes });
        }
    }
    best
}
