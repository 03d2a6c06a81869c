use crate::EntityId;

/// One decoded field value, located by message and group for later rewriting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldChange {
    /// Position of the message within a concatenated payload
    pub message: u32,
    /// Position of the field group within its message
    pub group: u32,
    pub entity: EntityId,
    pub field_index: u16,
    pub value: u32,
}
