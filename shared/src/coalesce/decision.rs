use crate::{EntityId, Field, Slot};

/// A field write the engine held back, in a form that can be re-issued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuppressedWrite {
    pub entity: EntityId,
    pub field: Field,
    pub value: u32,
}

impl SuppressedWrite {
    /// The presence clear of `slot`
    pub fn clear(entity: EntityId, slot: Slot) -> Self {
        Self {
            entity,
            field: Field::Presence(slot),
            value: 0,
        }
    }

    pub fn payload(item: EntityId, value: u32) -> Self {
        Self {
            entity: item,
            field: Field::Payload,
            value,
        }
    }
}

/// Writes to apply immediately, clear first
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Replay {
    pub clear: Option<SuppressedWrite>,
    pub payload: Option<SuppressedWrite>,
}

impl Replay {
    pub fn clear(write: SuppressedWrite) -> Self {
        Self {
            clear: Some(write),
            payload: None,
        }
    }

    pub fn payload(write: SuppressedWrite) -> Self {
        Self {
            clear: None,
            payload: Some(write),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clear.is_none() && self.payload.is_none()
    }

    pub fn writes(&self) -> impl Iterator<Item = &SuppressedWrite> {
        self.clear.iter().chain(self.payload.iter())
    }
}

/// Consistency signal emitted after a coalesced restore
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A local slot went through clear and restore without a visible change
    SlotRestored { entity: EntityId, slot: Slot },
    /// An entity's appearance was refreshed through the cheap path
    AppearanceRestored { entity: EntityId },
}

/// Why an event was let through untouched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassReason {
    /// Engine disabled or not the instance owner
    Disabled,
    /// Field or entity the engine does not track
    Unrelated,
    /// Write that does not start or finish a tracked transition
    NoTransition,
    /// Restore or payload write with nothing pending
    NotPending,
    /// Restore to a different value, or an ownership change
    Genuine,
    /// Restore arriving after the coalescing window
    Expired,
    /// No room to track a remote clear
    CapacityExhausted,
    /// Entity could not be resolved or read
    MissingEntity,
}

/// What a suppressed event stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suppression {
    /// The clear half of a transition, now pending
    Clear,
    /// A payload for a pending local slot, captured for later
    PayloadCaptured,
    /// The restore half of a transition. The captured payload, if any, is
    /// applied directly in place of the two presence writes.
    Restore {
        payload: Option<SuppressedWrite>,
        notify: Option<Notification>,
    },
}

/// Outcome of classifying one event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Let the event through unchanged
    PassThrough(PassReason),
    /// Swallow the event
    Suppress(Suppression),
    /// Re-issue held-back writes now, then let the event through
    ForceReplay(Replay),
}

impl Decision {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Decision::Suppress(_))
    }

    /// True iff the triggering event must reach the store
    pub fn passes_through(&self) -> bool {
        !self.is_suppressed()
    }
}
