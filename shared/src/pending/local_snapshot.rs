use log::debug;

use crate::{
    constants::SLOT_COUNT, EntityHandle, EntityId, EntityStore, Field, OccupantWord, Slot,
};

/// Last-known state of the local entity's slots.
///
/// Presence values are tracked here instead of read back from the store
/// because a suppressed clear leaves the store untouched while the host
/// believes the slot is empty.
pub struct LocalSnapshot {
    entity: EntityId,
    handle: Option<EntityHandle>,
    presence: [u32; SLOT_COUNT],
    occupants: [u64; SLOT_COUNT],
    valid: bool,
}

impl LocalSnapshot {
    pub fn new() -> Self {
        Self {
            entity: EntityId::NULL,
            handle: None,
            presence: [0; SLOT_COUNT],
            occupants: [0; SLOT_COUNT],
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Reads the local entity's slots from the store if not already cached.
    /// Returns false if there is no local entity or it cannot be read.
    pub fn ensure_primed(&mut self, store: &dyn EntityStore) -> bool {
        if self.valid {
            return true;
        }
        let Some(entity) = store.local_entity() else {
            return false;
        };
        let Ok(handle) = store.resolve(entity) else {
            return false;
        };

        let mut presence = [0; SLOT_COUNT];
        let mut occupants = [0; SLOT_COUNT];
        for slot in Slot::all() {
            let (Ok(value), Ok(occupant)) = (
                store.read_field(handle, Field::Presence(slot)),
                store.occupant(handle, slot),
            ) else {
                debug!("LocalSnapshot: local entity {} unreadable at slot {:?}", entity, slot);
                return false;
            };
            presence[slot.index()] = value;
            occupants[slot.index()] = occupant.to_u64();
        }

        self.entity = entity;
        self.handle = Some(handle);
        self.presence = presence;
        self.occupants = occupants;
        self.valid = true;
        true
    }

    pub fn invalidate(&mut self) {
        *self = Self::new();
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.valid.then_some(self.entity)
    }

    pub fn handle(&self) -> Option<EntityHandle> {
        self.handle.filter(|_| self.valid)
    }

    pub fn is_local(&self, entity: EntityId) -> bool {
        self.valid && !entity.is_null() && entity == self.entity
    }

    pub fn presence(&self, slot: Slot) -> u32 {
        self.presence[slot.index()]
    }

    pub fn set_presence(&mut self, slot: Slot, value: u32) {
        self.presence[slot.index()] = value;
    }

    pub fn occupant(&self, slot: Slot) -> EntityId {
        EntityId::from_u64(self.occupants[slot.index()])
    }

    pub fn occupant_word(&self, slot: Slot, word: OccupantWord) -> u32 {
        let occupant = self.occupants[slot.index()];
        match word {
            OccupantWord::Low => occupant as u32,
            OccupantWord::High => (occupant >> 32) as u32,
        }
    }

    pub fn set_occupant_word(&mut self, slot: Slot, word: OccupantWord, value: u32) {
        let occupant = &mut self.occupants[slot.index()];
        *occupant = match word {
            OccupantWord::Low => (*occupant & 0xFFFF_FFFF_0000_0000) | u64::from(value),
            OccupantWord::High => (*occupant & 0x0000_0000_FFFF_FFFF) | (u64::from(value) << 32),
        };
    }

    /// Slot currently occupied by `item`
    pub fn slot_of_occupant(&self, item: EntityId) -> Option<Slot> {
        if !self.valid || item.is_null() {
            return None;
        }
        Slot::all().find(|slot| self.occupants[slot.index()] == item.to_u64())
    }
}

impl Default for LocalSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
