/// Remembers the change counter of the last successful generation.
///
/// The check is the update: a call that observes a new counter stores it and
/// reports `true`, so it must run once per entry point, before the work it
/// gates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyCache {
    last_change_count: Option<u64>,
}

impl DirtyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_change_count(&self) -> Option<u64> {
        self.last_change_count
    }

    pub fn is_computed(&self) -> bool {
        self.last_change_count.is_some()
    }

    /// Returns `true` when `current` differs from the stored counter (or
    /// nothing was computed yet) and records it.
    pub fn check_and_update(&mut self, current: u64) -> bool {
        if self.last_change_count == Some(current) {
            return false;
        }
        self.last_change_count = Some(current);
        true
    }

    /// Forgets the stored counter so the next check reports a change.
    pub fn invalidate(&mut self) {
        self.last_change_count = None;
    }
}
