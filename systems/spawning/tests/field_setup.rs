use battlefield_core::{Command, Event, TeamId};
use battlefield_system_spawning::{Config, FieldSetup, Scenario};
use battlefield_world::{self as world, query, World};

fn build_world(seed: u64, scenario: Scenario) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut setup = FieldSetup::new(Config::new(seed, scenario));

    let mut commands = Vec::new();
    setup.setup(query::battle_grid(&world), &mut commands);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    (world, events)
}

#[test]
fn every_setup_command_is_accepted_by_the_world() {
    for scenario in [Scenario::Skirmish, Scenario::ArcherLine, Scenario::Duel] {
        let (_world, events) = build_world(99, scenario);
        assert!(
            !events.iter().any(|event| matches!(
                event,
                Event::UnitSpawnRejected { .. } | Event::TreePlacementRejected { .. }
            )),
            "setup emitted a rejected placement for {scenario:?}"
        );
    }
}

#[test]
fn skirmish_fields_hold_two_opposing_squads() {
    let (world, _events) = build_world(4, Scenario::Skirmish);
    let view = query::unit_view(&world);

    let friendly = view
        .iter()
        .filter(|unit| unit.team == TeamId::new(0))
        .count();
    let enemy = view
        .iter()
        .filter(|unit| unit.team == TeamId::new(1))
        .count();

    assert_eq!(friendly, 10);
    assert_eq!(enemy, 10);
}

#[test]
fn planted_fields_replay_identically() {
    let (first, _) = build_world(1234, Scenario::Skirmish);
    let (second, _) = build_world(1234, Scenario::Skirmish);

    assert_eq!(
        query::unit_view(&first).into_vec(),
        query::unit_view(&second).into_vec(),
    );
    assert_eq!(query::walkable_cells(&first), query::walkable_cells(&second));
}

#[test]
fn trees_leave_room_to_maneuver() {
    let (world, _) = build_world(2024, Scenario::Skirmish);
    let open = query::walkable_cells(&world).len();
    let grid = query::battle_grid(&world);
    let total = (grid.columns() * grid.rows()) as usize;

    // Walls, scatter, and twenty units must still leave most cells open.
    assert!(open > total / 2, "field too crowded: {open}/{total} open");
}

#[test]
fn setup_commands_can_be_replayed_through_apply() {
    let mut setup = FieldSetup::new(Config::new(77, Scenario::Duel));
    let mut world = World::new();
    let mut commands = Vec::new();
    setup.setup(query::battle_grid(&world), &mut commands);

    assert!(commands
        .iter()
        .any(|command| matches!(command, Command::SpawnUnit { .. })));
    assert!(commands
        .iter()
        .any(|command| matches!(command, Command::PlaceTree { .. })));

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert!(query::unit_view(&world).iter().count() == 2);
}
