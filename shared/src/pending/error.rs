use thiserror::Error;

use crate::{EntityId, Slot};

/// Errors raised by the pending stores
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PendingError {
    /// No free or matching entry within the probe bound. The triggering event
    /// must pass through unmodified.
    #[error("Remote pending table exhausted for entity {entity}, slot {slot:?} after {probes} probes")]
    CapacityExhausted {
        entity: EntityId,
        slot: Slot,
        probes: usize,
    },
}
