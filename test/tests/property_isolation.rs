/// PROPERTY-BASED TESTS: coalescing never changes the end state
///
/// Key invariants:
/// 1. Once every window has passed, each presence value equals what applying
///    every write in order would have produced
/// 2. Events on one entity never change the outcome for another
use proptest::prelude::*;

use coalesce_shared::{Decision, EntityId};
use coalesce_test::{slot, TestHost};

const ACTORS: usize = 3;
const SLOTS: usize = 3;

#[derive(Clone, Copy, Debug)]
struct Write {
    actor: usize,
    slot: usize,
    value: u32,
    delay: u32,
}

fn write_strategy() -> impl Strategy<Value = Write> {
    (0..ACTORS, 0..SLOTS, 0u32..3, 0u32..80).prop_map(|(actor, slot, value, delay)| Write {
        actor,
        slot,
        value,
        delay,
    })
}

fn actor(index: usize) -> EntityId {
    EntityId::actor(index as u64 + 1)
}

/// Runs `writes` through an engine; actor 0 is the local entity. With
/// `only` set, writes to every other actor just let time pass. Returns the end
/// state and the decisions made for `only` (or for every write).
fn run(writes: &[Write], only: Option<usize>) -> (Vec<[u32; SLOTS]>, Vec<Decision>) {
    let mut host = TestHost::new();
    let mut engine = TestHost::engine();
    for index in 0..ACTORS {
        host.world.spawn(actor(index));
        for s in 0..SLOTS {
            host.world.equip(actor(index), slot(s), EntityId::item(100 + s as u64), 1);
        }
    }
    host.world.set_local(Some(actor(0)));

    let mut decisions = Vec::new();
    for write in writes {
        host.clock.advance(write.delay);
        if only.is_some_and(|only| only != write.actor) {
            continue;
        }
        let index = engine.layout().presence_index(slot(write.slot));
        decisions.push(host.write(&mut engine, actor(write.actor), index, write.value));
    }
    host.clock.advance(1_000);
    engine.tick(&mut host.context());

    let end_state = (0..ACTORS)
        .map(|index| {
            let mut values = [0; SLOTS];
            for (s, value) in values.iter_mut().enumerate() {
                *value = host.world.presence(actor(index), slot(s));
            }
            values
        })
        .collect();
    (end_state, decisions)
}

fn naive(writes: &[Write]) -> Vec<[u32; SLOTS]> {
    let mut state = vec![[1u32; SLOTS]; ACTORS];
    for write in writes {
        state[write.actor][write.slot] = write.value;
    }
    state
}

proptest! {
    #[test]
    fn prop_end_state_matches_plain_application(
        writes in prop::collection::vec(write_strategy(), 0..60)
    ) {
        let (end_state, _) = run(&writes, None);
        prop_assert_eq!(end_state, naive(&writes));
    }

    #[test]
    fn prop_other_entities_do_not_interfere(
        writes in prop::collection::vec(write_strategy(), 0..60),
        watched in 0..ACTORS,
    ) {
        let (_, all) = run(&writes, None);
        let (_, alone) = run(&writes, Some(watched));

        let watched_in_all: Vec<Decision> = writes
            .iter()
            .zip(all)
            .filter(|(write, _)| write.actor == watched)
            .map(|(_, decision)| decision)
            .collect();
        prop_assert_eq!(watched_in_all, alone);
    }
}
