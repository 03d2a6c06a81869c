use std::ops::Range;

use crate::{constants::SLOT_COUNT, LayoutError, Slot};

/// Named fields the engine reads and writes through an [`EntityStore`](crate::EntityStore)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// What visibly occupies a slot of an actor; zero means empty
    Presence(Slot),
    /// Secondary attribute of an item (wear state)
    Payload,
}

/// Half of a 64-bit occupant id, which is written as two 32-bit fields
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OccupantWord {
    Low,
    High,
}

/// A raw field index resolved against a [`FieldLayout`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Presence(Slot),
    Payload,
    Occupant { slot: Slot, word: OccupantWord },
    /// Any index the engine does not track, including off-stride presence indices
    Other(u16),
}

/// Maps raw field indices of the observed object model to [`FieldRef`]s.
///
/// The payload index and the presence and occupant ranges are disjoint and
/// lie below `u16::MAX`, so every tracked index classifies exactly one way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    presence_base: u16,
    presence_stride: u16,
    payload: u16,
    presence: Range<u16>,
    occupants: Range<u16>,
}

impl FieldLayout {
    pub fn try_new(
        presence_base: u16,
        presence_stride: u16,
        payload: u16,
        occupant_base: u16,
        occupant_first_slot: u16,
    ) -> Result<Self, LayoutError> {
        if presence_stride == 0 {
            return Err(LayoutError::ZeroPresenceStride);
        }
        let slots = SLOT_COUNT as u16;
        let presence_end = presence_stride
            .checked_mul(slots - 1)
            .and_then(|span| span.checked_add(presence_base))
            .and_then(|last| last.checked_add(1))
            .ok_or(LayoutError::IndexOverflow { fields: "Presence" })?;
        let occupant_start = occupant_first_slot
            .checked_mul(2)
            .and_then(|offset| offset.checked_add(occupant_base));
        let occupants = occupant_start
            .and_then(|start| Some(start..start.checked_add(2 * slots)?))
            .ok_or(LayoutError::IndexOverflow { fields: "Occupant" })?;
        if payload == u16::MAX {
            return Err(LayoutError::IndexOverflow { fields: "Payload" });
        }

        let presence = presence_base..presence_end;
        if presence.contains(&payload) {
            return Err(LayoutError::OverlappingRanges {
                first: "Payload",
                second: "Presence",
            });
        }
        if occupants.contains(&payload) {
            return Err(LayoutError::OverlappingRanges {
                first: "Payload",
                second: "Occupant",
            });
        }
        if presence.start < occupants.end && occupants.start < presence.end {
            return Err(LayoutError::OverlappingRanges {
                first: "Presence",
                second: "Occupant",
            });
        }

        Ok(Self {
            presence_base,
            presence_stride,
            payload,
            presence,
            occupants,
        })
    }

    pub fn classify(&self, index: u16) -> FieldRef {
        if index == self.payload {
            return FieldRef::Payload;
        }
        if self.presence.contains(&index) {
            let offset = index - self.presence_base;
            if offset % self.presence_stride == 0 {
                if let Some(slot) = Slot::try_new(usize::from(offset / self.presence_stride)) {
                    return FieldRef::Presence(slot);
                }
            }
            return FieldRef::Other(index);
        }
        if self.occupants.contains(&index) {
            let offset = index - self.occupants.start;
            let word = if offset % 2 == 0 {
                OccupantWord::Low
            } else {
                OccupantWord::High
            };
            if let Some(slot) = Slot::try_new(usize::from(offset / 2)) {
                return FieldRef::Occupant { slot, word };
            }
        }
        FieldRef::Other(index)
    }

    pub fn presence_index(&self, slot: Slot) -> u16 {
        self.presence_base + self.presence_stride * slot.index() as u16
    }

    pub fn payload_index(&self) -> u16 {
        self.payload
    }

    pub fn occupant_index(&self, slot: Slot, word: OccupantWord) -> u16 {
        let low = self.occupants.start + 2 * slot.index() as u16;
        match word {
            OccupantWord::Low => low,
            OccupantWord::High => low + 1,
        }
    }

    /// Smallest range covering every presence field
    pub fn presence_range(&self) -> Range<u16> {
        self.presence.clone()
    }

    pub fn occupant_range(&self) -> Range<u16> {
        self.occupants.clone()
    }

    /// Every index range holding a tracked field, sorted by start.
    /// Indices inside a range may still classify as `Other`.
    pub fn ranges_of_interest(&self) -> [Range<u16>; 3] {
        let mut ranges = [
            self.payload..self.payload + 1,
            self.presence_range(),
            self.occupant_range(),
        ];
        ranges.sort_by_key(|range| range.start);
        ranges
    }
}

impl Default for FieldLayout {
    /// Presence of slot `s` at `248 + 12·s`, payload at `46`, occupant ids
    /// as word pairs starting at `474 + 2·5`
    fn default() -> Self {
        Self {
            presence_base: 248,
            presence_stride: 12,
            payload: 46,
            presence: 248..465,
            occupants: 484..522,
        }
    }
}
