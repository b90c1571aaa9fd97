#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Grid Battlefield.
//!
//! The world owns every unit, tree, and projectile. Adapters and systems
//! mutate it exclusively through [`apply`], which executes one [`Command`]
//! and appends the resulting [`Event`] values for systems to react to.

mod animation;

use std::time::Duration;

use animation::AnimationTrack;
use battlefield_core::{
    projection, AttackStyle, BattleGrid, CellCoord, Command, Controller, Event, Facing, Health,
    Occupant, PlacementError, ScreenPoint, StepDelta, TeamId, TreeKind, UnitClass, UnitId,
    WeaponKind, ACTION_WINDOW,
};

const DEFAULT_COLUMNS: u32 = 30;
const DEFAULT_ROWS: u32 = 10;
const DEFAULT_CELL_LENGTH: f32 = 57.0;

const WALK_FRAMES: u32 = 8;
const WALK_PARTS: u32 = 2;
const WALK_FRAME_TIME: Duration = Duration::from_millis(100);

const ATTACK_FRAMES: u32 = 16;
const ATTACK_PARTS: u32 = 2;
const ATTACK_FRAME_TIME: Duration = Duration::from_millis(50);

const FLASH_EXTENSION: u32 = 4;

/// Represents the authoritative battlefield state.
#[derive(Debug)]
pub struct World {
    grid: BattleGrid,
    units: Vec<Unit>,
    trees: Vec<Tree>,
    projectiles: Vec<Projectile>,
    occupancy: OccupancyGrid,
    next_unit: u32,
    tick_index: u64,
}

impl World {
    /// Creates a new battlefield world ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        let grid = BattleGrid::new(DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_CELL_LENGTH);
        Self {
            units: Vec::new(),
            trees: Vec::new(),
            projectiles: Vec::new(),
            occupancy: OccupancyGrid::new(grid.columns(), grid.rows()),
            next_unit: 0,
            tick_index: 0,
            grid,
        }
    }

    fn unit_index(&self, unit: UnitId) -> Option<usize> {
        self.units.iter().position(|candidate| candidate.id == unit)
    }

    fn allocate_unit_id(&mut self) -> UnitId {
        let id = UnitId::new(self.next_unit);
        self.next_unit = self.next_unit.saturating_add(1);
        id
    }

    fn spawn_unit(
        &mut self,
        class: UnitClass,
        team: TeamId,
        controller: Controller,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        if !self.grid.contains(cell) {
            out_events.push(Event::UnitSpawnRejected {
                cell,
                reason: PlacementError::OutOfBounds,
            });
            return;
        }

        if !self.occupancy.can_enter(cell) {
            out_events.push(Event::UnitSpawnRejected {
                cell,
                reason: PlacementError::Occupied,
            });
            return;
        }

        let id = self.allocate_unit_id();
        let unit = Unit::spawn(id, class, team, controller, cell, &self.grid);
        self.occupancy.occupy(Occupant::Unit(id), cell);
        self.units.push(unit);
        out_events.push(Event::UnitSpawned {
            unit: id,
            class,
            team,
            cell,
        });
    }

    fn place_tree(
        &mut self,
        cell: CellCoord,
        kind: TreeKind,
        flipped: bool,
        brightness: f32,
        out_events: &mut Vec<Event>,
    ) {
        if !self.grid.contains(cell) {
            out_events.push(Event::TreePlacementRejected {
                cell,
                reason: PlacementError::OutOfBounds,
            });
            return;
        }

        if !self.occupancy.can_enter(cell) {
            out_events.push(Event::TreePlacementRejected {
                cell,
                reason: PlacementError::Occupied,
            });
            return;
        }

        self.occupancy.occupy(Occupant::Obstacle, cell);
        self.trees.push(Tree {
            cell,
            kind,
            flipped,
            brightness,
        });
        out_events.push(Event::TreePlaced { cell, kind });
    }

    fn move_unit(&mut self, unit: UnitId, step: StepDelta, out_events: &mut Vec<Event>) {
        if step.is_zero() {
            return;
        }

        let Some(index) = self.unit_index(unit) else {
            return;
        };

        if !self.units[index].alive() || !self.units[index].ready() {
            return;
        }

        // Facing follows the attempted horizontal direction even when the
        // destination turns out to be blocked.
        if let Some(facing) = Facing::from_step(step.dx()) {
            if self.units[index].facing != facing {
                self.units[index].facing = facing;
                out_events.push(Event::UnitFacingChanged { unit, facing });
            }
        }

        let from = self.units[index].cell;
        let Some(destination) = self.resolve_step(from, step) else {
            return;
        };

        self.occupancy.vacate(from);
        self.occupancy.occupy(Occupant::Unit(unit), destination);
        self.units[index].commit_move(destination, &self.grid);
        out_events.push(Event::UnitMoved {
            unit,
            from,
            to: destination,
        });
    }

    /// A blocked diagonal degrades to its horizontal and then its vertical
    /// component before the move fails outright.
    fn resolve_step(&self, from: CellCoord, step: StepDelta) -> Option<CellCoord> {
        let mut attempts = [Some(step), None, None];
        if step.is_diagonal() {
            attempts[1] = Some(step.horizontal());
            attempts[2] = Some(step.vertical());
        }

        attempts
            .into_iter()
            .flatten()
            .filter_map(|attempt| from.offset(attempt))
            .find(|cell| self.grid.contains(*cell) && self.occupancy.can_enter(*cell))
    }

    fn fight_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        let Some(index) = self.unit_index(unit) else {
            return;
        };

        let subject = &mut self.units[index];
        if !subject.alive() || !subject.ready() {
            return;
        }

        subject.begin_fight();
        out_events.push(Event::UnitFought { unit });
    }

    fn face_unit(&mut self, unit: UnitId, facing: Facing, out_events: &mut Vec<Event>) {
        let Some(index) = self.unit_index(unit) else {
            return;
        };

        let subject = &mut self.units[index];
        if !subject.alive() || !subject.ready() {
            return;
        }

        if subject.facing != facing {
            subject.facing = facing;
            out_events.push(Event::UnitFacingChanged { unit, facing });
        }
        subject.consume_window();
    }

    fn rest_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        let Some(index) = self.unit_index(unit) else {
            return;
        };

        let subject = &mut self.units[index];
        if !subject.alive() || !subject.ready() {
            return;
        }

        subject.consume_window();
        out_events.push(Event::UnitRested { unit });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        self.occupancy.rebuild(&self.units, &self.trees);

        for unit in self.units.iter_mut() {
            unit.advance_time(dt);
        }

        self.resolve_weapons(out_events);
        self.advance_projectiles(out_events);
    }

    /// Resolves hit frames against the occupancy snapshot taken at tick start.
    fn resolve_weapons(&mut self, out_events: &mut Vec<Event>) {
        let mut strikes: Vec<(usize, CellCoord)> = Vec::new();
        let mut shots: Vec<usize> = Vec::new();

        for (index, unit) in self.units.iter().enumerate() {
            if !unit.alive() || !unit.fighting {
                continue;
            }
            if !unit.weapon.ready() || !unit.attack_track.is_hit_frame() {
                continue;
            }

            match unit.weapon.kind.style() {
                AttackStyle::Melee => {
                    let ahead = StepDelta::clamped(unit.facing.sign(), 0);
                    if let Some(cell) = unit.cell.offset(ahead) {
                        if self.grid.contains(cell) {
                            strikes.push((index, cell));
                        }
                    }
                }
                AttackStyle::Ranged { .. } => shots.push(index),
            }
        }

        for (attacker, cell) in strikes {
            let target = match self.occupancy.occupant(cell) {
                Some(Occupant::Unit(id)) => self.unit_index(id),
                _ => None,
            };
            let attacker_team = self.units[attacker].team;
            let Some(target_index) = target.filter(|&candidate| {
                let unit = &self.units[candidate];
                unit.alive() && unit.team.opposes(attacker_team)
            }) else {
                continue;
            };

            let damage = self.units[attacker].weapon.kind.damage();
            self.units[attacker].weapon.rearm();
            self.damage_unit(target_index, damage, out_events);
        }

        for shooter in shots {
            let unit = &mut self.units[shooter];
            let AttackStyle::Ranged { speed } = unit.weapon.kind.style() else {
                continue;
            };

            let origin = projection::cell_to_screen(unit.cell, &self.grid);
            let projectile = Projectile {
                team: unit.team,
                damage: unit.weapon.kind.damage(),
                x: origin.x,
                y: origin.y,
                row: unit.cell.row(),
                cell: unit.cell,
                velocity: speed * unit.facing.sign() as f32,
            };
            unit.weapon.rearm();
            out_events.push(Event::ProjectileLaunched {
                team: projectile.team,
                from: projectile.cell,
            });
            self.projectiles.push(projectile);
        }
    }

    fn advance_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let mut survivors = Vec::with_capacity(self.projectiles.len());

        for mut projectile in std::mem::take(&mut self.projectiles) {
            projectile.x += projectile.velocity;

            let Some(column) = projection::column_at(projectile.x, projectile.row, &self.grid)
            else {
                out_events.push(Event::ProjectileExpired {
                    team: projectile.team,
                    row: projectile.row,
                });
                continue;
            };

            projectile.cell = CellCoord::new(column, projectile.row);
            let target = match self.occupancy.occupant(projectile.cell) {
                Some(Occupant::Unit(id)) => self.unit_index(id),
                _ => None,
            };
            let struck = target.filter(|&candidate| {
                let unit = &self.units[candidate];
                unit.alive() && unit.team.opposes(projectile.team)
            });

            match struck {
                Some(target_index) => {
                    out_events.push(Event::ProjectileStruck {
                        team: projectile.team,
                        target: self.units[target_index].id,
                        cell: projectile.cell,
                    });
                    self.damage_unit(target_index, projectile.damage, out_events);
                }
                None => survivors.push(projectile),
            }
        }

        self.projectiles = survivors;
    }

    fn damage_unit(&mut self, index: usize, damage: u32, out_events: &mut Vec<Event>) {
        let subject = &mut self.units[index];
        let was_alive = subject.alive();
        let remaining = subject.hit(damage);
        let id = subject.id;
        let cell = subject.cell;

        out_events.push(Event::UnitDamaged {
            unit: id,
            damage,
            remaining,
        });

        if was_alive && remaining.is_depleted() {
            out_events.push(Event::UnitDied { unit: id, cell });
            self.occupancy.vacate(cell);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            columns,
            rows,
            cell_length,
        } => {
            world.grid = BattleGrid::new(columns, rows, cell_length);
            world.units.clear();
            world.trees.clear();
            world.projectiles.clear();
            world.occupancy = OccupancyGrid::new(columns, rows);
            world.next_unit = 0;
            world.tick_index = 0;
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnUnit {
            class,
            team,
            controller,
            cell,
        } => world.spawn_unit(class, team, controller, cell, out_events),
        Command::PlaceTree {
            cell,
            kind,
            flipped,
            brightness,
        } => world.place_tree(cell, kind, flipped, brightness, out_events),
        Command::MoveUnit { unit, step } => world.move_unit(unit, step, out_events),
        Command::FightUnit { unit } => world.fight_unit(unit, out_events),
        Command::FaceUnit { unit, facing } => world.face_unit(unit, facing, out_events),
        Command::RestUnit { unit } => world.rest_unit(unit, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Unit, World};
    use battlefield_core::{
        projection, BattleGrid, CellCoord, OccupancyView, ProjectileSnapshot, ProjectileView,
        ScreenPoint, SpritePhase, TreeSnapshot, UnitSnapshot, UnitView,
    };

    /// Provides read-only access to the battlefield grid definition.
    #[must_use]
    pub fn battle_grid(world: &World) -> &BattleGrid {
        &world.grid
    }

    /// Captures a read-only view of every unit on the battlefield.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(unit_snapshot).collect())
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        let (columns, rows) = world.occupancy.dimensions();
        OccupancyView::new(world.occupancy.cells(), columns, rows)
    }

    /// Captures a read-only view of every projectile in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .iter()
                .map(|projectile| ProjectileSnapshot {
                    team: projectile.team,
                    damage: projectile.damage,
                    position: ScreenPoint::new(projectile.x, projectile.y),
                    cell: projectile.cell,
                    facing: projectile.facing(),
                })
                .collect(),
        )
    }

    /// Captures the planted trees together with their screen anchors.
    #[must_use]
    pub fn trees(world: &World) -> Vec<TreeSnapshot> {
        world
            .trees
            .iter()
            .map(|tree| TreeSnapshot {
                cell: tree.cell,
                kind: tree.kind,
                flipped: tree.flipped,
                brightness: tree.brightness,
                screen: projection::cell_to_screen(tree.cell, &world.grid),
            })
            .collect()
    }

    /// Enumerates every cell that is currently open for traversal.
    ///
    /// Intended for external debug overlays; the per-cell check is the same
    /// one movement validation uses.
    #[must_use]
    pub fn walkable_cells(world: &World) -> Vec<CellCoord> {
        let mut open = Vec::new();
        for row in 0..world.grid.rows() {
            for column in 0..world.grid.columns() {
                let cell = CellCoord::new(column, row);
                if world.occupancy.can_enter(cell) {
                    open.push(cell);
                }
            }
        }
        open
    }

    fn unit_snapshot(unit: &Unit) -> UnitSnapshot {
        let phase = if !unit.alive() {
            SpritePhase::Dead
        } else if unit.fighting {
            SpritePhase::Fight
        } else if unit.screen.is_moving() {
            SpritePhase::Walk
        } else {
            SpritePhase::Idle
        };

        let frame = if unit.fighting {
            unit.attack_track.current_frame()
        } else {
            unit.walk_track.current_frame()
        };

        UnitSnapshot {
            id: unit.id,
            team: unit.team,
            class: unit.class,
            controller: unit.controller,
            cell: unit.cell,
            facing: unit.facing,
            health: unit.health.current,
            max_health: unit.health.max,
            weapon: unit.weapon.kind,
            phase,
            frame,
            flash: unit.health.flash,
            ready_for_action: unit.alive() && unit.ready(),
            screen: unit.screen.position,
        }
    }
}

#[derive(Debug)]
struct Unit {
    id: UnitId,
    team: TeamId,
    class: UnitClass,
    controller: Controller,
    cell: CellCoord,
    facing: Facing,
    fighting: bool,
    health: HealthState,
    weapon: Weapon,
    action_clock: Duration,
    walk_track: AnimationTrack,
    attack_track: AnimationTrack,
    screen: ScreenMotion,
}

impl Unit {
    fn spawn(
        id: UnitId,
        class: UnitClass,
        team: TeamId,
        controller: Controller,
        cell: CellCoord,
        grid: &BattleGrid,
    ) -> Self {
        let position = projection::cell_to_screen(cell, grid);
        Self {
            id,
            team,
            class,
            controller,
            cell,
            facing: Facing::Left,
            fighting: false,
            health: HealthState::full(class.max_health()),
            weapon: Weapon::new(class.weapon()),
            action_clock: ACTION_WINDOW,
            walk_track: AnimationTrack::new(WALK_FRAMES, WALK_PARTS, WALK_FRAME_TIME),
            attack_track: AnimationTrack::new(ATTACK_FRAMES, ATTACK_PARTS, ATTACK_FRAME_TIME),
            screen: ScreenMotion::at(position),
        }
    }

    fn alive(&self) -> bool {
        !self.health.current.is_depleted()
    }

    fn ready(&self) -> bool {
        self.action_clock >= ACTION_WINDOW
    }

    fn consume_window(&mut self) {
        self.action_clock = Duration::ZERO;
    }

    fn advance_time(&mut self, dt: Duration) {
        self.health.tick_flash();

        if !self.alive() {
            // Let the interrupted track play out as the death pose settles.
            if self.fighting {
                self.attack_track.advance(dt);
            } else {
                self.walk_track.advance(dt);
            }
            return;
        }

        self.weapon.tick();
        self.action_clock = self.action_clock.saturating_add(dt);

        if self.fighting {
            self.attack_track.advance(dt);
        } else {
            self.walk_track.advance(dt);
        }

        if self.ready() {
            if self.fighting {
                self.fighting = false;
                self.walk_track.set_phase(self.attack_track.phase());
                self.walk_track.stop();
            } else {
                self.attack_track.set_phase(self.walk_track.phase());
            }
            self.screen.snap();
        } else if self.screen.is_moving() {
            let progress = (self.action_clock.as_secs_f32() / ACTION_WINDOW.as_secs_f32()).min(1.0);
            self.screen.interpolate(progress);
        }
    }

    fn commit_move(&mut self, destination: CellCoord, grid: &BattleGrid) {
        self.cell = destination;
        self.walk_track.reset();
        self.screen.begin(projection::cell_to_screen(destination, grid));
        self.consume_window();
    }

    fn begin_fight(&mut self) {
        self.fighting = true;
        self.attack_track.reset();
        self.consume_window();
    }

    fn hit(&mut self, damage: u32) -> Health {
        self.health.hit(damage)
    }
}

/// Owned hit-point bundle embedded in every unit.
#[derive(Clone, Copy, Debug)]
struct HealthState {
    current: Health,
    max: Health,
    flash: u32,
}

impl HealthState {
    fn full(max: Health) -> Self {
        Self {
            current: max,
            max,
            flash: 0,
        }
    }

    /// Applies damage unconditionally and extends the cosmetic flash counter.
    ///
    /// The counter only drives a size pulse in presentation; it never gates
    /// further hits.
    fn hit(&mut self, damage: u32) -> Health {
        self.current = self.current.damaged(damage);
        self.flash = self.flash.saturating_add(FLASH_EXTENSION);
        self.current
    }

    fn tick_flash(&mut self) {
        self.flash = self.flash.saturating_sub(1);
    }
}

#[derive(Clone, Copy, Debug)]
struct Weapon {
    kind: WeaponKind,
    cooldown: u32,
}

impl Weapon {
    fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            cooldown: kind.hit_cooldown(),
        }
    }

    fn tick(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    fn ready(&self) -> bool {
        self.cooldown == 0
    }

    fn rearm(&mut self) {
        self.cooldown = self.kind.hit_cooldown();
    }
}

#[derive(Clone, Copy, Debug)]
struct Tree {
    cell: CellCoord,
    kind: TreeKind,
    flipped: bool,
    brightness: f32,
}

#[derive(Clone, Copy, Debug)]
struct Projectile {
    team: TeamId,
    damage: u32,
    x: f32,
    y: f32,
    row: u32,
    cell: CellCoord,
    velocity: f32,
}

impl Projectile {
    fn facing(&self) -> Facing {
        if self.velocity < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

/// Screen-space interpolation state for one unit sprite.
#[derive(Clone, Copy, Debug)]
struct ScreenMotion {
    position: ScreenPoint,
    origin: ScreenPoint,
    target: ScreenPoint,
}

impl ScreenMotion {
    fn at(position: ScreenPoint) -> Self {
        Self {
            position,
            origin: position,
            target: position,
        }
    }

    fn begin(&mut self, target: ScreenPoint) {
        self.origin = self.position;
        self.target = target;
    }

    fn interpolate(&mut self, progress: f32) {
        self.position = ScreenPoint::new(
            self.origin.x + (self.target.x - self.origin.x) * progress,
            self.origin.y + (self.target.y - self.origin.y) * progress,
        );
    }

    fn snap(&mut self) {
        self.position = self.target;
        self.origin = self.target;
    }

    fn is_moving(&self) -> bool {
        self.position.x != self.target.x || self.position.y != self.target.y
    }
}

/// Dense occupancy grid mirroring the battlefield dimensions.
#[derive(Clone, Debug)]
struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<Occupant>>,
}

impl OccupancyGrid {
    fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    fn rebuild(&mut self, units: &[Unit], trees: &[Tree]) {
        self.cells.fill(None);
        for tree in trees {
            if let Some(index) = self.index(tree.cell) {
                self.cells[index] = Some(Occupant::Obstacle);
            }
        }
        for unit in units {
            if !unit.alive() {
                continue;
            }
            if let Some(index) = self.index(unit.cell) {
                self.cells[index] = Some(Occupant::Unit(unit.id));
            }
        }
    }

    /// Reports whether the cell is in bounds and free; out-of-bounds cells
    /// can never be entered.
    pub(crate) fn can_enter(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .is_some_and(|index| self.cells.get(index).copied().unwrap_or(None).is_none())
    }

    fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, occupant: Occupant, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(occupant);
            }
        }
    }

    fn vacate(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    pub(crate) fn cells(&self) -> &[Option<Occupant>] {
        &self.cells
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}
