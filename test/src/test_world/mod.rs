/// HashMap-backed EntityStore for scenario tests
use std::collections::HashMap;

use coalesce_shared::{
    EntityHandle, EntityId, EntityStore, EntityStoreError, Field, FieldLayout, FieldRef,
    OccupantWord, Slot, SLOT_COUNT,
};

// TestEntity - the fields the engine can see on one entity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestEntity {
    pub presence: [u32; SLOT_COUNT],
    pub occupants: [u64; SLOT_COUNT],
    pub payload: u32,
}

// TestWorld - entities by id, with handles that change on respawn
pub struct TestWorld {
    local: Option<EntityId>,
    handles: HashMap<EntityId, EntityHandle>,
    entities: HashMap<EntityHandle, (EntityId, TestEntity)>,
    next_handle: u64,
    /// Every write that reached the store, in order
    pub writes: Vec<(EntityId, Field, u32)>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self {
            local: None,
            handles: HashMap::new(),
            entities: HashMap::new(),
            next_handle: 1,
            writes: Vec::new(),
        }
    }
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity`, replacing any previous incarnation under a new handle
    pub fn spawn(&mut self, entity: EntityId) -> EntityHandle {
        self.despawn(entity);
        let handle = EntityHandle::new(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(entity, handle);
        self.entities.insert(handle, (entity, TestEntity::default()));
        handle
    }

    pub fn despawn(&mut self, entity: EntityId) {
        if let Some(handle) = self.handles.remove(&entity) {
            self.entities.remove(&handle);
        }
    }

    pub fn set_local(&mut self, entity: Option<EntityId>) {
        self.local = entity;
    }

    pub fn handle(&self, entity: EntityId) -> Option<EntityHandle> {
        self.handles.get(&entity).copied()
    }

    pub fn entity(&self, entity: EntityId) -> Option<&TestEntity> {
        let handle = self.handles.get(&entity)?;
        self.entities.get(handle).map(|(_, data)| data)
    }

    fn entity_mut(&mut self, entity: EntityId) -> Option<&mut TestEntity> {
        let handle = self.handles.get(&entity)?;
        self.entities.get_mut(handle).map(|(_, data)| data)
    }

    /// Puts `item` into `slot` of `actor` with the given visible value
    pub fn equip(&mut self, actor: EntityId, slot: Slot, item: EntityId, presence: u32) {
        if let Some(data) = self.entity_mut(actor) {
            data.occupants[slot.index()] = item.to_u64();
            data.presence[slot.index()] = presence;
        }
    }

    pub fn presence(&self, actor: EntityId, slot: Slot) -> u32 {
        self.entity(actor)
            .map(|data| data.presence[slot.index()])
            .unwrap_or(0)
    }

    pub fn payload(&self, item: EntityId) -> u32 {
        self.entity(item).map(|data| data.payload).unwrap_or(0)
    }

    pub fn set_payload(&mut self, item: EntityId, value: u32) {
        if let Some(data) = self.entity_mut(item) {
            data.payload = value;
        }
    }

    /// Applies a raw field write the way the host would after the engine let it through
    pub fn apply(&mut self, layout: &FieldLayout, entity: EntityId, field_index: u16, value: u32) {
        let Some(data) = self.entity_mut(entity) else {
            return;
        };
        match layout.classify(field_index) {
            FieldRef::Presence(slot) => data.presence[slot.index()] = value,
            FieldRef::Payload => data.payload = value,
            FieldRef::Occupant { slot, word } => {
                let occupant = &mut data.occupants[slot.index()];
                *occupant = match word {
                    OccupantWord::Low => (*occupant & !0xFFFF_FFFF) | u64::from(value),
                    OccupantWord::High => (*occupant & 0xFFFF_FFFF) | (u64::from(value) << 32),
                };
            }
            FieldRef::Other(_) => {}
        }
    }

    fn by_handle(&self, handle: EntityHandle) -> Result<&(EntityId, TestEntity), EntityStoreError> {
        self.entities
            .get(&handle)
            .ok_or(EntityStoreError::StaleHandle { handle })
    }
}

impl EntityStore for TestWorld {
    fn local_entity(&self) -> Option<EntityId> {
        self.local
    }

    fn resolve(&self, entity: EntityId) -> Result<EntityHandle, EntityStoreError> {
        self.handle(entity)
            .ok_or(EntityStoreError::MissingEntity { entity })
    }

    fn read_field(&self, handle: EntityHandle, field: Field) -> Result<u32, EntityStoreError> {
        let (_, data) = self.by_handle(handle)?;
        Ok(match field {
            Field::Presence(slot) => data.presence[slot.index()],
            Field::Payload => data.payload,
        })
    }

    fn write_field(
        &mut self,
        handle: EntityHandle,
        field: Field,
        value: u32,
    ) -> Result<(), EntityStoreError> {
        let Some((entity, data)) = self.entities.get_mut(&handle) else {
            return Err(EntityStoreError::StaleHandle { handle });
        };
        match field {
            Field::Presence(slot) => data.presence[slot.index()] = value,
            Field::Payload => data.payload = value,
        }
        self.writes.push((*entity, field, value));
        Ok(())
    }

    fn occupant(&self, handle: EntityHandle, slot: Slot) -> Result<EntityId, EntityStoreError> {
        let (_, data) = self.by_handle(handle)?;
        Ok(EntityId::from_u64(data.occupants[slot.index()]))
    }
}
