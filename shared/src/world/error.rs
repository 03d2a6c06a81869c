use thiserror::Error;

use crate::{EntityHandle, EntityId, Field};

/// Errors reported by an [`EntityStore`](crate::EntityStore)
///
/// Every variant degrades to pass-through in the engine; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityStoreError {
    /// The entity no longer exists in the store
    #[error("Entity {entity} not found in store")]
    MissingEntity { entity: EntityId },

    /// A previously resolved handle no longer refers to a live entity
    #[error("Handle {handle:?} no longer resolves to a live entity")]
    StaleHandle { handle: EntityHandle },

    /// The entity exists but does not carry the requested field
    #[error("Field {field:?} unavailable on handle {handle:?}")]
    FieldUnavailable { handle: EntityHandle, field: Field },
}

/// Errors raised when building a [`FieldLayout`](crate::FieldLayout)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Every presence field would share one index
    #[error("Presence stride must be greater than 0")]
    ZeroPresenceStride,

    /// The last index of a tracked range does not fit in a `u16`
    #[error("{fields} fields extend past field index 65534")]
    IndexOverflow { fields: &'static str },

    /// Two tracked ranges share indices, so a field would classify two ways
    #[error("{first} fields overlap {second} fields")]
    OverlappingRanges {
        first: &'static str,
        second: &'static str,
    },
}
