use crate::{LocalPendingStore, LocalSnapshot, RemotePendingTable, UnappliedPresence};

/// Everything the classifier reads and mutates between events
#[derive(Default)]
pub struct PendingState {
    pub local: LocalPendingStore,
    pub remote: RemotePendingTable,
    pub snapshot: LocalSnapshot,
    /// Presence values of the current message not yet applied by the host
    pub unapplied: UnappliedPresence,
}

impl PendingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no clear is pending anywhere
    pub fn is_idle(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.local.active_count() + self.remote.active_count()
    }

    /// Abandons every pending record and forgets the local entity
    pub fn clear_all(&mut self) {
        self.local.clear_all();
        self.remote.clear_all();
        self.snapshot.invalidate();
        self.unapplied.clear();
    }
}
