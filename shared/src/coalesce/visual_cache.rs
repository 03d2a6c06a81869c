use crate::{
    constants::{SLOT_COUNT, VISUAL_CACHE_CAPACITY},
    elapsed_since, EntityId, Millis,
};

/// A slot seen going empty: when, and what it held before
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObservedClear {
    pub at: Millis,
    pub previous: u32,
}

/// Last observed presence values of one entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualSnapshot {
    /// `EntityId::NULL` marks an empty cache entry
    pub entity: EntityId,
    pub last_seen: Millis,
    pub presence: [u32; SLOT_COUNT],
    /// The last clear seen on each slot, while inside the window
    pub clears: [Option<ObservedClear>; SLOT_COUNT],
    pub has_pending_clear: bool,
}

impl VisualSnapshot {
    fn empty() -> Self {
        Self {
            entity: EntityId::NULL,
            last_seen: 0,
            presence: [0; SLOT_COUNT],
            clears: [None; SLOT_COUNT],
            has_pending_clear: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.entity.is_null()
    }
}

/// Per-slot transition counts between two observations of an entity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// nonzero → zero
    pub cleared: usize,
    /// zero → the value held before a clear seen inside the window
    pub restored: usize,
    /// zero → nonzero after a clear seen outside the window
    pub late_restores: usize,
    /// zero → nonzero with no clear on record
    pub new_equips: usize,
    /// nonzero → different nonzero, including through a recent clear
    pub swaps: usize,
}

/// Fixed-size cache of [`VisualSnapshot`]s. When full, an observation of a new
/// entity evicts the entry seen least recently.
pub struct VisualSnapshotCache {
    entries: Box<[VisualSnapshot]>,
}

impl VisualSnapshotCache {
    pub fn new() -> Self {
        Self::with_capacity(VISUAL_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![VisualSnapshot::empty(); capacity.max(1)].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, entity: EntityId) -> Option<&VisualSnapshot> {
        if entity.is_null() {
            return None;
        }
        self.entries.iter().find(|entry| entry.entity == entity)
    }

    /// Records `presence` as the entity's current state and reports how it
    /// differs from the previous observation. An entity seen for the first
    /// time is compared against all-empty slots.
    pub fn observe(
        &mut self,
        entity: EntityId,
        presence: &[u32; SLOT_COUNT],
        now: Millis,
        timeout: Millis,
    ) -> SnapshotDiff {
        let index = self.entry_for(entity, now);
        let entry = &mut self.entries[index];
        entry.last_seen = now;

        let mut diff = SnapshotDiff::default();
        for slot in 0..SLOT_COUNT {
            let cached = entry.presence[slot];
            let current = presence[slot];
            if cached == current {
                continue;
            }
            if current == 0 {
                diff.cleared += 1;
                entry.clears[slot] = Some(ObservedClear {
                    at: now,
                    previous: cached,
                });
            } else if cached == 0 {
                match entry.clears[slot].take() {
                    Some(clear) if elapsed_since(now, clear.at) >= timeout => {
                        diff.late_restores += 1
                    }
                    Some(clear) if clear.previous == current => diff.restored += 1,
                    Some(_) => diff.swaps += 1,
                    None => diff.new_equips += 1,
                }
            } else {
                diff.swaps += 1;
                entry.clears[slot] = None;
            }
        }
        entry.presence = *presence;

        entry.has_pending_clear = false;
        for clear in entry.clears.iter_mut() {
            match clear {
                Some(observed) if elapsed_since(now, observed.at) >= timeout => *clear = None,
                Some(_) => entry.has_pending_clear = true,
                None => {}
            }
        }
        diff
    }

    /// Forgets an entity, so its next observation starts from scratch
    pub fn invalidate(&mut self, entity: EntityId) {
        if entity.is_null() {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.entity == entity) {
            *entry = VisualSnapshot::empty();
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(VisualSnapshot::empty());
    }

    fn entry_for(&mut self, entity: EntityId, now: Millis) -> usize {
        let mut vacancy = None;
        let mut oldest = 0;
        let mut oldest_age = 0;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.entity == entity {
                return index;
            }
            if entry.is_empty() {
                vacancy = vacancy.or(Some(index));
                continue;
            }
            let age = elapsed_since(now, entry.last_seen);
            if age >= oldest_age {
                oldest = index;
                oldest_age = age;
            }
        }

        let index = vacancy.unwrap_or(oldest);
        self.entries[index] = VisualSnapshot {
            entity,
            ..VisualSnapshot::empty()
        };
        index
    }
}

impl Default for VisualSnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}
