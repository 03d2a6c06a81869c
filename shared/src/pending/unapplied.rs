use crate::{EntityHandle, Slot};

/// Presence values handed on earlier in the message being classified. The
/// host applies them only after the whole message has been classified, so
/// the store does not reflect them yet.
#[derive(Debug, Default)]
pub struct UnappliedPresence {
    writes: Vec<(EntityHandle, Slot, u32)>,
}

impl UnappliedPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later values for the same slot replace earlier ones
    pub fn record(&mut self, handle: EntityHandle, slot: Slot, value: u32) {
        match self
            .writes
            .iter_mut()
            .find(|(h, s, _)| *h == handle && *s == slot)
        {
            Some(write) => write.2 = value,
            None => self.writes.push((handle, slot, value)),
        }
    }

    pub fn get(&self, handle: EntityHandle, slot: Slot) -> Option<u32> {
        self.writes
            .iter()
            .find(|(h, s, _)| *h == handle && *s == slot)
            .map(|(_, _, value)| *value)
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}
