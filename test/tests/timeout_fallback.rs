/// Pending clears that are never restored are applied once the window passes
use coalesce_shared::{Decision, Field, PassReason, SuppressedWrite, SweepReport};
use coalesce_test::{Scenario, TestHost, MY_SLOT_VALUE, OTHER_SLOT_VALUE};

#[test]
fn tick_replays_expired_local_clear() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    host.write(&mut engine, s.me, s.presence_index(slot), 0);
    host.clock.advance(99);
    assert!(engine.tick(&mut host.context()).is_empty());
    assert_eq!(host.world.presence(s.me, slot), MY_SLOT_VALUE);

    host.clock.advance(1);
    let report = engine.tick(&mut host.context());
    assert_eq!(
        report,
        SweepReport {
            local_replayed: 1,
            ..Default::default()
        }
    );
    assert_eq!(host.world.presence(s.me, slot), 0);
    assert_eq!(host.replayer.replayed, vec![SuppressedWrite::clear(s.me, slot)]);
    assert_eq!(engine.pending_local(), 0);
}

#[test]
fn late_restore_is_not_lost() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    host.write(&mut engine, s.me, s.presence_index(slot), 0);
    host.clock.advance(150);
    let restore = host.write(&mut engine, s.me, s.presence_index(slot), MY_SLOT_VALUE);

    // the sweep ahead of classification applied the clear
    assert_eq!(restore, Decision::PassThrough(PassReason::NoTransition));
    assert_eq!(
        host.world.writes,
        vec![(s.me, Field::Presence(slot), 0)]
    );
    assert_eq!(host.world.presence(s.me, slot), MY_SLOT_VALUE);
}

#[test]
fn expired_clear_replays_captured_payload() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    host.write(&mut engine, s.me, s.presence_index(slot), 0);
    host.write(&mut engine, s.my_item, s.payload_index(), 42);
    host.clock.advance(100);
    engine.tick(&mut host.context());

    assert_eq!(host.world.presence(s.me, slot), 0);
    assert_eq!(host.world.payload(s.my_item), 42);
}

#[test]
fn remote_slots_of_one_entity_get_one_recompute() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let handle = host.world.handle(s.other).unwrap();

    host.write(&mut engine, s.other, s.presence_index(Scenario::slot()), 0);
    host.write(&mut engine, s.other, s.presence_index(Scenario::second_slot()), 0);
    assert_eq!(engine.pending_remote(), 2);

    host.clock.advance(100);
    let report = engine.tick(&mut host.context());

    assert_eq!(report.remote_replayed, 2);
    assert_eq!(report.recomputes, 1);
    assert_eq!(host.refresher.recomputes, vec![handle]);
    assert_eq!(host.world.presence(s.other, Scenario::slot()), 0);
    assert_eq!(host.world.presence(s.other, Scenario::second_slot()), 0);
}

#[test]
fn despawned_remote_entity_is_dropped_without_writes() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();

    host.write(&mut engine, s.other, s.presence_index(Scenario::slot()), 0);
    host.world.despawn(s.other);
    host.clock.advance(100);
    let report = engine.tick(&mut host.context());

    assert_eq!(
        report,
        SweepReport {
            dropped: 1,
            ..Default::default()
        }
    );
    assert!(host.world.writes.is_empty());
    assert!(host.refresher.recomputes.is_empty());
    assert_eq!(engine.pending_remote(), 0);
}

#[test]
fn respawned_remote_entity_is_dropped_without_writes() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();

    host.write(&mut engine, s.other, s.presence_index(Scenario::slot()), 0);
    host.world.spawn(s.other);
    host.world.equip(s.other, Scenario::slot(), s.other_item, OTHER_SLOT_VALUE);
    host.clock.advance(100);
    let report = engine.tick(&mut host.context());

    assert_eq!(report.dropped, 1);
    assert!(host.world.writes.is_empty());
    assert_eq!(host.world.presence(s.other, Scenario::slot()), OTHER_SLOT_VALUE);
}

#[test]
fn clock_wrap_does_not_expire_early() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    host.clock.set(u32::MAX - 10);
    host.write(&mut engine, s.me, s.presence_index(slot), 0);
    host.clock.advance(50);
    assert!(engine.tick(&mut host.context()).is_empty());

    let restore = host.write(&mut engine, s.me, s.presence_index(slot), MY_SLOT_VALUE);
    assert!(restore.is_suppressed());
}
