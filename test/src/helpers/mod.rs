
pub use guards::{AlwaysOwner, NeverOwner};
pub use manual_clock::ManualClock;
pub use recorders::{RecordingRefresher, RecordingReplayer, RecordingSink};
pub use scenario::{Scenario, ITEM_PAYLOAD, MY_SLOT_VALUE, OTHER_SLOT_VALUE};
pub use test_host::TestHost;

use coalesce_shared::Slot;

/// Slot by index, for tests that know the index is in range
pub fn slot(index: usize) -> Slot {
    Slot::try_new(index).expect("slot index out of range")
}
