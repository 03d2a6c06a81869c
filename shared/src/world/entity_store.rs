use crate::{EntityId, EntityStoreError, Field, Slot};

/// Opaque reference to a live entity, valid until the store says otherwise
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityHandle(u64);

impl EntityHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The live object model the engine observes.
///
/// Only named fields are ever addressed; how they map to storage is up to the
/// implementor. Every operation may fail because the entity went away.
pub trait EntityStore {
    /// The distinguished "self" entity, if one currently exists
    fn local_entity(&self) -> Option<EntityId>;

    fn resolve(&self, entity: EntityId) -> Result<EntityHandle, EntityStoreError>;

    fn read_field(&self, handle: EntityHandle, field: Field) -> Result<u32, EntityStoreError>;

    fn write_field(
        &mut self,
        handle: EntityHandle,
        field: Field,
        value: u32,
    ) -> Result<(), EntityStoreError>;

    /// Id of the item currently occupying `slot`, `EntityId::NULL` if empty
    fn occupant(&self, handle: EntityHandle, slot: Slot) -> Result<EntityId, EntityStoreError>;
}
