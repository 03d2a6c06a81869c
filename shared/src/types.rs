use crate::constants::SLOT_COUNT;

/// Wrapping millisecond tick, as produced by a [`Clock`](crate::Clock)
pub type Millis = u32;

/// Age of `then` at `now`, correct across tick wrap-around
pub fn elapsed_since(now: Millis, then: Millis) -> Millis {
    now.wrapping_sub(then)
}

/// One of the `SLOT_COUNT` equipment-like sub-positions of an entity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(u8);

impl Slot {
    pub fn try_new(index: usize) -> Option<Self> {
        if index < SLOT_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT as u8).map(Slot)
    }
}
