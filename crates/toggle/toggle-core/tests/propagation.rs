use anyhow::Result;
use toggle_core::{Config, ToggleEvent, ToggleRecord, ToggleWorld, ValueType};

fn ring() -> Result<ToggleWorld> {
    let doc = toggle_test_fixtures::scenes::load("sync_ring")?;
    let mut world = ToggleWorld::default();
    world.load_document(doc)?;
    Ok(world)
}

#[test]
fn sync_ring_converges_from_any_member() -> Result<()> {
    let mut world = ring()?;
    let ids = world.toggle_ids();
    assert_eq!(ids.len(), 4);

    world.set_index_value(ids[0], 3);
    for id in &ids {
        assert_eq!(world.index_value(*id), Some(3));
    }
    world.set_index_value(ids[2], 1);
    for id in &ids {
        assert_eq!(world.mask_value(*id), Some(2));
    }
    Ok(())
}

#[test]
fn each_ring_member_commits_once_per_write() -> Result<()> {
    let mut world = ring()?;
    let ids = world.toggle_ids();
    world.drain_events();
    world.set_index_value(ids[1], 2);
    let changed = world
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, ToggleEvent::ValueChanged { .. }))
        .count();
    assert_eq!(changed, 4);
    Ok(())
}

#[test]
fn deep_hierarchy_propagates_to_every_level() {
    let mut world = ToggleWorld::default();
    let mut parent = None;
    let mut toggles = Vec::new();
    for depth in 0..6 {
        let object = world.spawn_object(&format!("level{depth}"), parent).unwrap();
        toggles.push(world.add_toggle(ToggleRecord::new(object, ValueType::Index, 4)).unwrap());
        parent = Some(object);
    }
    world.set_index_value(toggles[0], 3);
    assert!(toggles.iter().all(|t| world.index_value(*t) == Some(3)));

    // A write below the root only flows downward
    world.set_index_value(toggles[3], 1);
    assert_eq!(world.index_value(toggles[2]), Some(3));
    assert_eq!(world.index_value(toggles[5]), Some(1));
}

#[test]
fn event_buffer_is_bounded() {
    let cfg = Config {
        max_events: 3,
        ..Config::default()
    };
    let mut world = ToggleWorld::new(cfg);
    let object = world.spawn_object("counter", None).unwrap();
    let t = world.add_toggle(ToggleRecord::new(object, ValueType::Count, 8)).unwrap();
    for n in 0..8 {
        world.set_count_value(t, n);
    }
    let events = world.drain_events();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events.last(),
        Some(&ToggleEvent::ValueChanged { toggle: t, object, value: 0b111_1111 })
    );
}

#[test]
fn events_can_be_disabled() {
    let cfg = Config {
        emit_events: false,
        ..Config::default()
    };
    let mut world = ToggleWorld::new(cfg);
    let object = world.spawn_object("quiet", None).unwrap();
    let t = world.add_toggle(ToggleRecord::new(object, ValueType::Boolean, 2)).unwrap();
    world.set_boolean_value(t, true);
    assert!(world.outputs().is_empty());
    assert_eq!(world.toggle_of(object), Some(t));
}
