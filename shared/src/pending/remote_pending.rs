use log::trace;

use crate::{
    constants::{REMOTE_PROBE_LIMIT, REMOTE_TABLE_CAPACITY},
    elapsed_since, EntityHandle, EntityId, Millis, PendingError, Slot,
};

/// Pending clear on one slot of a non-local entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemotePending {
    pub entity: EntityId,
    pub slot: Slot,
    pub timestamp: Millis,
    /// Handle resolved when the clear was suppressed, used to replay it
    pub handle: EntityHandle,
    pub active: bool,
}

impl RemotePending {
    fn vacant() -> Self {
        Self {
            entity: EntityId::NULL,
            slot: Slot::default(),
            timestamp: 0,
            handle: EntityHandle::new(0),
            active: false,
        }
    }

    fn matches(&self, entity: EntityId, slot: Slot) -> bool {
        self.active && self.entity == entity && self.slot == slot
    }
}

/// Open-addressed table keyed by (entity, slot) with bounded linear probing.
///
/// Released entries become vacant immediately; there are no tombstones.
/// Because of that, lookups scan the whole probe window instead of stopping
/// at the first vacancy, and inserts only pick a vacancy after ruling out a
/// live entry for the same key further along the window.
pub struct RemotePendingTable {
    entries: Box<[RemotePending]>,
    active_count: usize,
}

impl RemotePendingTable {
    pub fn new() -> Self {
        Self::with_capacity(REMOTE_TABLE_CAPACITY)
    }

    /// Capacity should be prime and about twice the expected peak load
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![RemotePending::vacant(); capacity.max(1)].into_boxed_slice(),
            active_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    fn home(&self, entity: EntityId, slot: Slot) -> usize {
        let mut hash = entity.to_u64() ^ (slot.index() as u64).wrapping_mul(2_654_435_761);
        hash ^= hash >> 33;
        hash = hash.wrapping_mul(0xff51_afd7_ed55_8ccd);
        hash ^= hash >> 33;
        (hash % self.entries.len() as u64) as usize
    }

    fn probe_window(&self, entity: EntityId, slot: Slot) -> impl Iterator<Item = usize> {
        let home = self.home(entity, slot);
        let capacity = self.entries.len();
        (0..REMOTE_PROBE_LIMIT.min(capacity)).map(move |probe| (home + probe) % capacity)
    }

    fn position(&self, entity: EntityId, slot: Slot) -> Option<usize> {
        if self.active_count == 0 {
            return None;
        }
        self.probe_window(entity, slot)
            .find(|index| self.entries[*index].matches(entity, slot))
    }

    pub fn find(&self, entity: EntityId, slot: Slot) -> Option<&RemotePending> {
        self.position(entity, slot).map(|index| &self.entries[index])
    }

    pub fn contains(&self, entity: EntityId, slot: Slot) -> bool {
        self.position(entity, slot).is_some()
    }

    /// Records a pending clear, refreshing an existing record for the same key
    pub fn insert(
        &mut self,
        entity: EntityId,
        slot: Slot,
        handle: EntityHandle,
        now: Millis,
    ) -> Result<(), PendingError> {
        let mut vacancy = None;
        let mut existing = None;
        for index in self.probe_window(entity, slot) {
            let entry = &self.entries[index];
            if entry.matches(entity, slot) {
                existing = Some(index);
                break;
            }
            if !entry.active && vacancy.is_none() {
                vacancy = Some(index);
            }
        }

        let Some(index) = existing.or(vacancy) else {
            trace!(
                "RemotePendingTable: no room for {} slot {:?} ({} active)",
                entity,
                slot,
                self.active_count
            );
            return Err(PendingError::CapacityExhausted {
                entity,
                slot,
                probes: REMOTE_PROBE_LIMIT.min(self.entries.len()),
            });
        };

        if existing.is_none() {
            self.active_count += 1;
        }
        self.entries[index] = RemotePending {
            entity,
            slot,
            timestamp: now,
            handle,
            active: true,
        };
        Ok(())
    }

    pub fn release(&mut self, entity: EntityId, slot: Slot) -> Option<RemotePending> {
        let index = self.position(entity, slot)?;
        let released = self.entries[index];
        self.entries[index] = RemotePending::vacant();
        self.active_count -= 1;
        Some(released)
    }

    /// Releases every record at least `timeout` old, handing each to `on_expired`
    pub fn drain_expired(
        &mut self,
        now: Millis,
        timeout: Millis,
        mut on_expired: impl FnMut(RemotePending),
    ) {
        if self.active_count == 0 {
            return;
        }
        for entry in self.entries.iter_mut() {
            if entry.active && elapsed_since(now, entry.timestamp) >= timeout {
                let expired = *entry;
                *entry = RemotePending::vacant();
                self.active_count -= 1;
                on_expired(expired);
                if self.active_count == 0 {
                    break;
                }
            }
        }
    }

    /// Abandons every record
    pub fn clear_all(&mut self) {
        if self.active_count == 0 {
            return;
        }
        self.entries.fill(RemotePending::vacant());
        self.active_count = 0;
    }
}

impl Default for RemotePendingTable {
    fn default() -> Self {
        Self::new()
    }
}
