/// Clear, payload and restore inside the window collapse into one payload write
use coalesce_shared::{
    CoalesceConfig, CoalesceEngine, Decision, Field, FieldLayout, Notification, PassReason,
    Suppression, SuppressedWrite,
};
use coalesce_test::{
    AlwaysOwner, Scenario, TestHost, ITEM_PAYLOAD, MY_SLOT_VALUE, OTHER_SLOT_VALUE,
};

fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

#[test]
fn local_transition_applies_payload_directly() {
    init_logging();
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    host.clock.set(1_000);
    let clear = host.write(&mut engine, s.me, s.presence_index(slot), 0);
    assert_eq!(clear, Decision::Suppress(Suppression::Clear));
    assert_eq!(host.world.presence(s.me, slot), MY_SLOT_VALUE);
    assert_eq!(engine.pending_local(), 1);

    host.clock.advance(5);
    let payload = host.write(&mut engine, s.my_item, s.payload_index(), 42);
    assert_eq!(payload, Decision::Suppress(Suppression::PayloadCaptured));
    assert_eq!(host.world.payload(s.my_item), ITEM_PAYLOAD);

    host.clock.advance(5);
    let restore = host.write(&mut engine, s.me, s.presence_index(slot), MY_SLOT_VALUE);
    assert_eq!(
        restore,
        Decision::Suppress(Suppression::Restore {
            payload: Some(SuppressedWrite::payload(s.my_item, 42)),
            notify: Some(Notification::SlotRestored { entity: s.me, slot }),
        })
    );

    // exactly one write reached the store, and the slot never went empty
    assert_eq!(host.world.writes, vec![(s.my_item, Field::Payload, 42)]);
    assert_eq!(host.world.payload(s.my_item), 42);
    assert_eq!(host.world.presence(s.me, slot), MY_SLOT_VALUE);
    assert_eq!(
        host.sink.notifications,
        vec![Notification::SlotRestored { entity: s.me, slot }]
    );
    assert_eq!(engine.pending_local(), 0);

    // nothing left to resolve once the window has passed
    host.clock.advance(500);
    assert!(engine.tick(&mut host.context()).is_empty());
    assert!(host.refresher.recomputes.is_empty());
    assert_eq!(host.world.writes.len(), 1);
}

#[test]
fn local_transition_without_payload_still_notifies() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    host.write(&mut engine, s.me, s.presence_index(slot), 0);
    host.clock.advance(99);
    let restore = host.write(&mut engine, s.me, s.presence_index(slot), MY_SLOT_VALUE);

    assert!(restore.is_suppressed());
    assert!(host.world.writes.is_empty());
    assert_eq!(host.sink.notifications.len(), 1);
}

#[test]
fn remote_transition_is_suppressed_silently() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    let clear = host.write(&mut engine, s.other, s.presence_index(slot), 0);
    assert_eq!(clear, Decision::Suppress(Suppression::Clear));
    assert_eq!(engine.pending_remote(), 1);

    host.clock.advance(20);
    let restore = host.write(&mut engine, s.other, s.presence_index(slot), OTHER_SLOT_VALUE);
    assert_eq!(
        restore,
        Decision::Suppress(Suppression::Restore {
            payload: None,
            notify: None
        })
    );

    assert_eq!(host.world.presence(s.other, slot), OTHER_SLOT_VALUE);
    assert!(host.world.writes.is_empty());
    assert!(host.sink.notifications.is_empty());
    assert_eq!(engine.pending_remote(), 0);
}

#[test]
fn payload_for_unequipped_item_passes() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();

    host.write(&mut engine, s.me, s.presence_index(Scenario::slot()), 0);
    let payload = host.write(&mut engine, s.other_item, s.payload_index(), 3);

    assert_eq!(payload, Decision::PassThrough(PassReason::NotPending));
    assert_eq!(host.world.payload(s.other_item), 3);
}

#[test]
fn restore_to_a_different_value_passes_and_replays_captured_payload() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();
    let slot = Scenario::slot();

    host.write(&mut engine, s.me, s.presence_index(slot), 0);
    host.write(&mut engine, s.my_item, s.payload_index(), 42);
    let restore = host.write(&mut engine, s.me, s.presence_index(slot), MY_SLOT_VALUE + 1);

    assert!(restore.passes_through());
    assert_eq!(host.world.presence(s.me, slot), MY_SLOT_VALUE + 1);
    assert_eq!(host.world.payload(s.my_item), 42);
    assert!(host.sink.notifications.is_empty());
}

#[test]
fn unrelated_fields_and_entities_pass() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();

    assert_eq!(
        host.write(&mut engine, s.me, 3, 0),
        Decision::PassThrough(PassReason::Unrelated)
    );
    // inside the presence range but off the slot stride
    assert_eq!(
        host.write(&mut engine, s.me, s.presence_index(Scenario::slot()) + 1, 0),
        Decision::PassThrough(PassReason::Unrelated)
    );
    // presence index on an item
    assert_eq!(
        host.write(&mut engine, s.my_item, s.presence_index(Scenario::slot()), 0),
        Decision::PassThrough(PassReason::Unrelated)
    );
    assert_eq!(engine.state().active_count(), 0);
}

#[test]
fn local_entity_change_abandons_local_pending() {
    let (mut host, s) = TestHost::populated();
    let mut engine = TestHost::engine();

    host.write(&mut engine, s.me, s.presence_index(Scenario::slot()), 0);
    assert_eq!(engine.pending_local(), 1);

    host.world.set_local(Some(s.other));
    host.write(&mut engine, s.other, 3, 1);

    assert_eq!(engine.pending_local(), 0);
    assert!(engine.state().snapshot.is_local(s.other));
}

#[test]
fn custom_layout_is_honoured() {
    let (mut host, s) = TestHost::populated();
    let layout = FieldLayout::try_new(100, 2, 10, 200, 0).unwrap();
    let mut engine = CoalesceEngine::with_layout(
        CoalesceConfig::default(),
        layout.clone(),
        Box::new(AlwaysOwner),
    )
    .unwrap();
    let slot = Scenario::slot();

    let clear = host.write(&mut engine, s.other, layout.presence_index(slot), 0);
    assert_eq!(clear, Decision::Suppress(Suppression::Clear));
    // the default layout's index is just another field now
    let unrelated = host.write(&mut engine, s.other, s.presence_index(slot), 0);
    assert_eq!(unrelated, Decision::PassThrough(PassReason::Unrelated));

    host.clock.advance(10);
    let restore = host.write(
        &mut engine,
        s.other,
        layout.presence_index(slot),
        OTHER_SLOT_VALUE,
    );
    assert!(restore.is_suppressed());
    assert_eq!(host.world.presence(s.other, slot), OTHER_SLOT_VALUE);
}
