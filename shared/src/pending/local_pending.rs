use crate::{constants::SLOT_COUNT, elapsed_since, Millis, Slot};

/// Pending clear on one slot of the local entity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalPending {
    pub slot: Slot,
    /// Presence value the suppressed clear would have removed
    pub original_value: u32,
    pub captured_payload: u32,
    pub has_payload: bool,
    pub timestamp: Millis,
    pub active: bool,
}

/// Slot-indexed pending table for the local entity. No key lookup, one record per slot.
pub struct LocalPendingStore {
    records: [LocalPending; SLOT_COUNT],
    active_count: usize,
}

impl LocalPendingStore {
    pub fn new() -> Self {
        let mut records = [LocalPending::default(); SLOT_COUNT];
        for slot in Slot::all() {
            records[slot.index()].slot = slot;
        }
        Self {
            records,
            active_count: 0,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// Active record for `slot`
    pub fn get(&self, slot: Slot) -> Option<&LocalPending> {
        let record = &self.records[slot.index()];
        record.active.then_some(record)
    }

    /// Starts (or restarts) tracking a clear. Any previously captured payload is dropped.
    pub fn arm(&mut self, slot: Slot, original_value: u32, now: Millis) {
        let record = &mut self.records[slot.index()];
        if !record.active {
            self.active_count += 1;
        }
        record.original_value = original_value;
        record.captured_payload = 0;
        record.has_payload = false;
        record.timestamp = now;
        record.active = true;
    }

    /// Records a payload for an active slot. Returns false if nothing is pending there.
    pub fn capture(&mut self, slot: Slot, payload: u32) -> bool {
        let record = &mut self.records[slot.index()];
        if !record.active {
            return false;
        }
        record.captured_payload = payload;
        record.has_payload = true;
        true
    }

    /// Removes the record for `slot`, returning it if it was active
    pub fn release(&mut self, slot: Slot) -> Option<LocalPending> {
        let record = &mut self.records[slot.index()];
        if !record.active {
            return None;
        }
        let released = *record;
        *record = LocalPending {
            slot,
            ..Default::default()
        };
        self.active_count -= 1;
        Some(released)
    }

    /// Releases every record at least `timeout` old, handing each to `on_expired`
    pub fn drain_expired(
        &mut self,
        now: Millis,
        timeout: Millis,
        mut on_expired: impl FnMut(LocalPending),
    ) {
        if self.active_count == 0 {
            return;
        }
        for slot in Slot::all() {
            let record = &self.records[slot.index()];
            if record.active && elapsed_since(now, record.timestamp) >= timeout {
                if let Some(expired) = self.release(slot) {
                    on_expired(expired);
                }
            }
        }
    }

    /// Abandons every record
    pub fn clear_all(&mut self) {
        *self = Self::new();
    }
}

impl Default for LocalPendingStore {
    fn default() -> Self {
        Self::new()
    }
}
