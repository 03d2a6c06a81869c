use crate::SnapshotDiff;

/// Which appearance refresh an observed change needs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshVerdict {
    /// Only slots cleared and restored inside the window changed
    CheapRefresh,
    FullRecompute,
}

/// Decides between the cheap and the expensive appearance refresh
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshGate;

impl RefreshGate {
    pub fn new() -> Self {
        Self
    }

    /// Cheap iff at least one slot was restored inside the window and nothing
    /// else changed
    pub fn classify(&self, diff: &SnapshotDiff) -> RefreshVerdict {
        let pure_restore = diff.restored > 0
            && diff.cleared == 0
            && diff.late_restores == 0
            && diff.new_equips == 0
            && diff.swaps == 0;
        if pure_restore {
            RefreshVerdict::CheapRefresh
        } else {
            RefreshVerdict::FullRecompute
        }
    }
}
