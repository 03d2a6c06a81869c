use std::fmt;

const TAG_SHIFT: u32 = 48;
const TAG_ACTOR: u16 = 0x0000;
const TAG_ITEM: u16 = 0x4000;

/// Routing class carried in the high 16 bits of an [`EntityId`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A character-like entity owning slots (the local entity is one of these)
    Actor,
    /// An object that can occupy a slot and carries payload fields
    Item,
    Unknown(u16),
}

// EntityId
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct EntityId(u64);

impl EntityId {
    pub const NULL: EntityId = EntityId(0);

    pub fn from_u64(value: u64) -> Self {
        EntityId(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }

    /// Builds an id from a type tag and a 48-bit counter
    pub fn from_parts(tag: u16, counter: u64) -> Self {
        EntityId((u64::from(tag) << TAG_SHIFT) | (counter & ((1 << TAG_SHIFT) - 1)))
    }

    pub fn actor(counter: u64) -> Self {
        Self::from_parts(TAG_ACTOR, counter)
    }

    pub fn item(counter: u64) -> Self {
        Self::from_parts(TAG_ITEM, counter)
    }

    pub fn tag(&self) -> u16 {
        (self.0 >> TAG_SHIFT) as u16
    }

    pub fn kind(&self) -> EntityKind {
        match self.tag() {
            TAG_ACTOR => EntityKind::Actor,
            TAG_ITEM => EntityKind::Item,
            other => EntityKind::Unknown(other),
        }
    }

    /// Null ids are never actors, even though their tag is zero
    pub fn is_actor(&self) -> bool {
        !self.is_null() && self.kind() == EntityKind::Actor
    }

    pub fn is_item(&self) -> bool {
        self.kind() == EntityKind::Item
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({:#018x})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
