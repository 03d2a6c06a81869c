use crate::{EntityId, FieldRef};

/// A single field mutation, already resolved against the field layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldEvent {
    pub entity: EntityId,
    pub field: FieldRef,
    pub value: u32,
    /// True iff `entity` is the store's local entity
    pub is_local: bool,
}

impl FieldEvent {
    pub fn new(entity: EntityId, field: FieldRef, value: u32, is_local: bool) -> Self {
        Self {
            entity,
            field,
            value,
            is_local,
        }
    }
}
