use log::trace;

use crate::{
    constants::PAYLOAD_TERMINAL_SENTINEL, elapsed_since, Decision, EntityHandle, EntityId,
    EntityStore, EntityStoreError, Field, FieldEvent, FieldRef, LocalPending, Millis,
    Notification, OccupantWord, PassReason, PendingState, Replay, Slot, SuppressedWrite,
    Suppression,
};

/// The coalescing state machine.
///
/// Per (entity, slot) a presence clear moves the slot from idle to pending, a
/// payload write for the slot's occupant is captured while pending, and a
/// restore of the original value inside the window resolves the pair without
/// either presence write reaching the store. Anything else resolves the
/// pending record so that every held-back write is re-issued or made moot.
///
/// The classifier only updates pending state. It never writes to the store;
/// the caller executes the returned [`Decision`].
pub struct Classifier {
    timeout: Millis,
}

impl Classifier {
    pub fn new(timeout: Millis) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Millis {
        self.timeout
    }

    pub fn classify(
        &self,
        state: &mut PendingState,
        store: &dyn EntityStore,
        event: FieldEvent,
        now: Millis,
    ) -> Decision {
        match event.field {
            FieldRef::Other(_) => Decision::PassThrough(PassReason::Unrelated),
            FieldRef::Payload => {
                if !event.entity.is_item() {
                    return Decision::PassThrough(PassReason::Unrelated);
                }
                self.local_payload(state, event.entity, event.value, now)
            }
            FieldRef::Presence(slot) => {
                if !event.entity.is_actor() {
                    return Decision::PassThrough(PassReason::Unrelated);
                }
                if event.is_local {
                    self.local_presence(state, event.entity, slot, event.value, now)
                } else {
                    self.remote_presence(state, store, event.entity, slot, event.value, now)
                }
            }
            FieldRef::Occupant { slot, word } => {
                if !event.entity.is_actor() {
                    return Decision::PassThrough(PassReason::Unrelated);
                }
                if event.is_local {
                    local_occupant(state, event.entity, slot, word, event.value)
                } else {
                    remote_occupant(state, event.entity, slot, word, event.value)
                }
            }
        }
    }

    fn local_presence(
        &self,
        state: &mut PendingState,
        entity: EntityId,
        slot: Slot,
        value: u32,
        now: Millis,
    ) -> Decision {
        if value == 0 {
            if state.local.get(slot).is_some() {
                return Decision::Suppress(Suppression::Clear);
            }
            let previous = state.snapshot.presence(slot);
            if previous == 0 {
                return Decision::PassThrough(PassReason::NoTransition);
            }
            // the store keeps `previous` until the clear is replayed
            state.local.arm(slot, previous, now);
            trace!("Classifier: local slot {:?} cleared from {}", slot, previous);
            return Decision::Suppress(Suppression::Clear);
        }

        let Some(record) = state.local.release(slot) else {
            state.snapshot.set_presence(slot, value);
            return Decision::PassThrough(PassReason::NoTransition);
        };

        if elapsed_since(now, record.timestamp) >= self.timeout {
            state.snapshot.set_presence(slot, value);
            return replay_captured(state, &record, PassReason::Expired);
        }
        if value != record.original_value {
            state.snapshot.set_presence(slot, value);
            return replay_captured(state, &record, PassReason::Genuine);
        }

        if !record.has_payload {
            return Decision::Suppress(Suppression::Restore {
                payload: None,
                notify: Some(Notification::SlotRestored { entity, slot }),
            });
        }
        let payload = SuppressedWrite::payload(state.snapshot.occupant(slot), record.captured_payload);
        if record.captured_payload == PAYLOAD_TERMINAL_SENTINEL {
            // the host must observe the restore itself for the terminal state
            return Decision::ForceReplay(Replay::payload(payload));
        }
        Decision::Suppress(Suppression::Restore {
            payload: Some(payload),
            notify: Some(Notification::SlotRestored { entity, slot }),
        })
    }

    fn local_payload(
        &self,
        state: &mut PendingState,
        item: EntityId,
        value: u32,
        now: Millis,
    ) -> Decision {
        if state.local.is_empty() {
            return Decision::PassThrough(PassReason::NotPending);
        }
        let Some(slot) = state.snapshot.slot_of_occupant(item) else {
            return Decision::PassThrough(PassReason::NotPending);
        };
        let Some(record) = state.local.get(slot) else {
            return Decision::PassThrough(PassReason::NotPending);
        };
        if elapsed_since(now, record.timestamp) >= self.timeout {
            return Decision::PassThrough(PassReason::Expired);
        }
        state.local.capture(slot, value);
        Decision::Suppress(Suppression::PayloadCaptured)
    }

    fn remote_presence(
        &self,
        state: &mut PendingState,
        store: &dyn EntityStore,
        entity: EntityId,
        slot: Slot,
        value: u32,
        now: Millis,
    ) -> Decision {
        if value == 0 {
            if state.remote.contains(entity, slot) {
                return Decision::Suppress(Suppression::Clear);
            }
            let Ok(handle) = store.resolve(entity) else {
                return Decision::PassThrough(PassReason::MissingEntity);
            };
            let Ok(current) = current_presence(state, store, handle, slot) else {
                return Decision::PassThrough(PassReason::MissingEntity);
            };
            if current == 0 {
                return Decision::PassThrough(PassReason::NoTransition);
            }
            return match state.remote.insert(entity, slot, handle, now) {
                Ok(()) => Decision::Suppress(Suppression::Clear),
                Err(err) => {
                    trace!("Classifier: {}", err);
                    Decision::PassThrough(PassReason::CapacityExhausted)
                }
            };
        }

        let Some(record) = state.remote.release(entity, slot) else {
            return Decision::PassThrough(PassReason::NoTransition);
        };
        if elapsed_since(now, record.timestamp) >= self.timeout {
            return Decision::PassThrough(PassReason::Expired);
        }
        let current = store
            .resolve(entity)
            .and_then(|handle| current_presence(state, store, handle, slot));
        match current {
            Ok(current) if current == value => Decision::Suppress(Suppression::Restore {
                payload: None,
                notify: None,
            }),
            Ok(_) => Decision::PassThrough(PassReason::Genuine),
            Err(_) => Decision::PassThrough(PassReason::MissingEntity),
        }
    }
}

/// Any change of a pending slot's occupant means the clear was a real removal
fn local_occupant(
    state: &mut PendingState,
    entity: EntityId,
    slot: Slot,
    word: OccupantWord,
    value: u32,
) -> Decision {
    let previous_item = state.snapshot.occupant(slot);
    let previous_word = state.snapshot.occupant_word(slot, word);
    state.snapshot.set_occupant_word(slot, word, value);
    if previous_word == value {
        return Decision::PassThrough(PassReason::NoTransition);
    }
    let Some(record) = state.local.release(slot) else {
        return Decision::PassThrough(PassReason::NoTransition);
    };

    trace!("Classifier: occupant of pending local slot {:?} changed", slot);
    state.snapshot.set_presence(slot, 0);
    Decision::ForceReplay(Replay {
        clear: Some(SuppressedWrite::clear(entity, slot)),
        payload: record
            .has_payload
            .then(|| SuppressedWrite::payload(previous_item, record.captured_payload)),
    })
}

/// Without an occupant cache only an emptied low word is recognisable as a removal
fn remote_occupant(
    state: &mut PendingState,
    entity: EntityId,
    slot: Slot,
    word: OccupantWord,
    value: u32,
) -> Decision {
    if word != OccupantWord::Low || value != 0 {
        return Decision::PassThrough(PassReason::NoTransition);
    }
    if state.remote.release(entity, slot).is_none() {
        return Decision::PassThrough(PassReason::NoTransition);
    }
    Decision::ForceReplay(Replay::clear(SuppressedWrite::clear(entity, slot)))
}

/// The store's presence value, or the one an earlier write of the same
/// message will leave there
fn current_presence(
    state: &PendingState,
    store: &dyn EntityStore,
    handle: EntityHandle,
    slot: Slot,
) -> Result<u32, EntityStoreError> {
    match state.unapplied.get(handle, slot) {
        Some(value) => Ok(value),
        None => store.read_field(handle, Field::Presence(slot)),
    }
}

fn replay_captured(state: &PendingState, record: &LocalPending, reason: PassReason) -> Decision {
    if !record.has_payload {
        return Decision::PassThrough(reason);
    }
    Decision::ForceReplay(Replay::payload(SuppressedWrite::payload(
        state.snapshot.occupant(record.slot),
        record.captured_payload,
    )))
}
