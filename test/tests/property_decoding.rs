/// PROPERTY-BASED TESTS: sparse update decoding
///
/// Key invariants:
/// 1. Decoding is a pure function of the bytes
/// 2. Arbitrary bytes never panic, and a failed decode leaves the output as it was
/// 3. Every tracked field written is decoded with its value, nothing else is
/// 4. Rewriting without removals preserves every decoded change
use std::collections::BTreeMap;

use proptest::prelude::*;

use coalesce_shared::{
    EntityId, FieldChange, FieldLayout, FieldRef, UpdateDecoder, UpdateEncoder, UpdateGroup,
};

fn entity_strategy() -> impl Strategy<Value = EntityId> {
    prop_oneof![
        (1u64..1_000).prop_map(EntityId::actor),
        (1u64..1_000).prop_map(EntityId::item),
        any::<u64>().prop_map(EntityId::from_u64),
    ]
}

fn group_strategy() -> impl Strategy<Value = UpdateGroup> {
    (
        entity_strategy(),
        prop::collection::btree_map(0u16..600, any::<u32>(), 0..40),
    )
        .prop_map(|(entity, fields): (EntityId, BTreeMap<u16, u32>)| UpdateGroup {
            entity,
            fields: fields.into_iter().collect(),
        })
}

fn decode(bytes: &[u8]) -> Result<Vec<FieldChange>, coalesce_shared::DecodeError> {
    let mut out = Vec::new();
    UpdateDecoder::new(FieldLayout::default())
        .decode_concatenated(bytes, &mut out)
        .map(|_| out)
}

proptest! {
    #[test]
    fn prop_decoding_is_idempotent(groups in prop::collection::vec(group_strategy(), 0..8)) {
        let bytes = UpdateEncoder::new().encode(&groups).unwrap();
        let first = decode(&bytes);
        let second = decode(&bytes);
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_tracked_fields_decode_exactly(groups in prop::collection::vec(group_strategy(), 0..8)) {
        let layout = FieldLayout::default();
        let bytes = UpdateEncoder::new().encode(&groups).unwrap();
        let decoded = decode(&bytes).unwrap();

        let expected: Vec<(u32, EntityId, u16, u32)> = groups
            .iter()
            .enumerate()
            .flat_map(|(group, update)| {
                let layout = &layout;
                update
                    .fields
                    .iter()
                    .filter(move |(index, _)| !matches!(layout.classify(*index), FieldRef::Other(_)))
                    .map(move |(index, value)| (group as u32, update.entity, *index, *value))
            })
            .collect();
        let actual: Vec<(u32, EntityId, u16, u32)> = decoded
            .iter()
            .map(|change| (change.group, change.entity, change.field_index, change.value))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let sentinel = FieldChange {
            message: 7,
            group: 7,
            entity: EntityId::actor(7),
            field_index: 7,
            value: 7,
        };
        let mut out = vec![sentinel];
        let decoder = UpdateDecoder::new(FieldLayout::default());
        if decoder.decode_concatenated(&bytes, &mut out).is_err() {
            prop_assert_eq!(out, vec![sentinel]);
        }
        let _ = UpdateEncoder::new().rewrite(&bytes, &[]);
    }

    #[test]
    fn prop_rewrite_without_removals_preserves_changes(
        groups in prop::collection::vec(group_strategy(), 1..8)
    ) {
        prop_assume!(groups.iter().any(|group| !group.fields.is_empty()));
        let bytes = UpdateEncoder::new().encode(&groups).unwrap();
        let rewritten = UpdateEncoder::new().rewrite(&bytes, &[]).unwrap().unwrap();

        let strip = |changes: Vec<FieldChange>| -> Vec<(EntityId, u16, u32)> {
            changes.into_iter().map(|c| (c.entity, c.field_index, c.value)).collect()
        };
        prop_assert_eq!(strip(decode(&rewritten).unwrap()), strip(decode(&bytes).unwrap()));
    }

    #[test]
    fn prop_rewrite_removes_exactly_the_requested_values(
        groups in prop::collection::vec(group_strategy(), 1..8),
        keep_every in 2usize..4,
    ) {
        let bytes = UpdateEncoder::new().encode(&groups).unwrap();
        let decoded = decode(&bytes).unwrap();
        let (kept, removed): (Vec<(usize, FieldChange)>, Vec<(usize, FieldChange)>) =
            decoded.into_iter().enumerate().partition(|(n, _)| n % keep_every == 0);
        let removed: Vec<FieldChange> = removed.into_iter().map(|(_, c)| c).collect();
        let kept: Vec<(EntityId, u16, u32)> = kept
            .into_iter()
            .map(|(_, c)| (c.entity, c.field_index, c.value))
            .collect();

        match UpdateEncoder::new().rewrite(&bytes, &removed).unwrap() {
            Some(rewritten) => {
                let after: Vec<(EntityId, u16, u32)> = decode(&rewritten)
                    .unwrap()
                    .into_iter()
                    .map(|c| (c.entity, c.field_index, c.value))
                    .collect();
                prop_assert_eq!(after, kept);
            }
            None => prop_assert!(kept.is_empty()),
        }
    }
}
