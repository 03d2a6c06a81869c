use crate::{EntityHandle, EntityStore, EntityStoreError, SuppressedWrite};

/// Re-issues a write the engine held back.
///
/// Implementations must write straight to the store and never route the
/// write back through the engine, or the replay would be classified again.
pub trait Replayer {
    fn replay(
        &mut self,
        store: &mut dyn EntityStore,
        handle: EntityHandle,
        write: &SuppressedWrite,
    ) -> Result<(), EntityStoreError>;
}

/// Replays by writing the field directly
#[derive(Default)]
pub struct StoreReplayer;

impl Replayer for StoreReplayer {
    fn replay(
        &mut self,
        store: &mut dyn EntityStore,
        handle: EntityHandle,
        write: &SuppressedWrite,
    ) -> Result<(), EntityStoreError> {
        store.write_field(handle, write.field, write.value)
    }
}
