//! Monotonic id generation.
//!
//! Each engine/executor owns its own generator, so ids depend only on the
//! order of calls within one run, never on process-wide state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Separator between a lineage root and a derivation tag.
pub const LINEAGE_SEPARATOR: char = '~';

#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Next counter value (starts at 1).
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// `prefix_N`.
    pub fn fresh(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.next())
    }

    /// `root~tagN`, where `root` is the parent's lineage root. Keeps derived
    /// ids short no matter how many generations a lineage survives.
    pub fn derive(&self, parent_id: &str, tag: &str) -> String {
        format!(
            "{}{LINEAGE_SEPARATOR}{tag}{}",
            lineage_root(parent_id),
            self.next()
        )
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// The id a lineage started from: everything before the first separator.
pub fn lineage_root(id: &str) -> &str {
    id.split(LINEAGE_SEPARATOR).next().unwrap_or(id)
}
