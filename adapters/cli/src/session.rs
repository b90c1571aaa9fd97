//! Headless session that wires field setup, the AI planner, and the world.

use std::time::Duration;

use battlefield_core::{Command, Controller, Event, InputState, UnitId};
use battlefield_system_ai::AiPlanner;
use battlefield_system_spawning::{FieldSetup, Scenario};
use battlefield_world::{self as world, query, World};

/// Seed salt separating the planner's random stream from field setup.
const PLANNER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Parameters describing the battle a session should run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionConfig {
    pub(crate) seed: u64,
    pub(crate) scenario: Scenario,
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) cell_length: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scenario: Scenario::Skirmish,
            columns: 30,
            rows: 10,
            cell_length: 57.0,
        }
    }
}

/// One running battle: the world plus the systems driving it.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    planner: AiPlanner,
    events: Vec<Event>,
}

impl Session {
    /// Builds the battlefield and rosters the squads for the configuration.
    pub(crate) fn new(config: &SessionConfig) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureGrid {
                columns: config.columns,
                rows: config.rows,
                cell_length: config.cell_length,
            },
            &mut events,
        );

        let mut setup = FieldSetup::new(battlefield_system_spawning::Config::new(
            config.seed,
            config.scenario,
        ));
        let mut commands = Vec::new();
        setup.setup(query::battle_grid(&world), &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        let planner = AiPlanner::new(battlefield_system_ai::Config::new(
            config.seed ^ PLANNER_SEED_SALT,
        ));

        Self {
            world,
            planner,
            events,
        }
    }

    /// Advances the whole simulation one step.
    ///
    /// The tick follows the fixed control flow: the world advances clocks and
    /// resolves weapons and projectiles, then the player's intent and the AI
    /// planner's decisions are applied against the fresh snapshot.
    pub(crate) fn tick(&mut self, dt: Duration, input: &InputState) -> &[Event] {
        self.events.clear();
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        if let Some(player) = self.player_unit() {
            if let Some(command) = player_command(player, input) {
                world::apply(&mut self.world, command, &mut self.events);
            }
        }

        let unit_view = query::unit_view(&self.world);
        let occupancy_view = query::occupancy_view(&self.world);
        let mut commands = Vec::new();
        self.planner
            .handle(&self.events, &unit_view, occupancy_view, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut self.events);
        }

        &self.events
    }

    /// Read-only access to the underlying world for reporting.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    fn player_unit(&self) -> Option<UnitId> {
        query::unit_view(&self.world)
            .iter()
            .find(|unit| unit.controller == Controller::Player && unit.is_alive())
            .map(|unit| unit.id)
    }
}

/// Converts held player intent into at most one command, attack first.
fn player_command(unit: UnitId, input: &InputState) -> Option<Command> {
    if input.attack {
        return Some(Command::FightUnit { unit });
    }

    let step = input.step();
    (!step.is_zero()).then_some(Command::MoveUnit { unit, step })
}
