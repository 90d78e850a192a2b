use std::collections::BTreeMap;

use parking_lot::Mutex;

/// Number of fetch attempts per status code within one group.
///
/// Shared by every copy of a group, so policies see what all of its
/// requests observed. No response at all counts as status `-1`.
#[derive(Debug, Default)]
pub struct LinkGroupStats {
    counts: Mutex<BTreeMap<i32, usize>>,
}

impl LinkGroupStats {
    pub fn record(&self, status: i32) {
        *self.counts.lock().entry(status).or_default() += 1;
    }

    pub fn count(&self, status: i32) -> usize {
        self.counts.lock().get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.lock().values().sum()
    }

    /// All non-zero counts, by status.
    pub fn snapshot(&self) -> BTreeMap<i32, usize> {
        self.counts.lock().clone()
    }
}
