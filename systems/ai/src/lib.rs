#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic AI planner that turns world snapshots into unit commands.
//!
//! The planner consumes immutable views, remembers one target per unit, and
//! emits at most one command per AI unit per tick: scan, rest, attack, or a
//! single pathfinding step toward an attack position. All randomness flows
//! through a seeded generator so identical inputs replay identically.

use std::collections::{BTreeMap, VecDeque};

use battlefield_core::{
    CellCoord, Command, Controller, Event, Facing, OccupancyView, StepDelta, UnitId, UnitSnapshot,
    UnitView,
};
use pathfinding::prelude::astar;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const DEFAULT_REST_CHANCE: f64 = 0.05;
const DEFAULT_ATTACK_CHANCE: f64 = 0.06;

/// Configuration parameters required to construct the planner.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    rest_chance: f64,
    attack_chance: f64,
}

impl Config {
    /// Creates a configuration using the default decision chances.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            rest_chance: DEFAULT_REST_CHANCE,
            attack_chance: DEFAULT_ATTACK_CHANCE,
        }
    }

    /// Creates a configuration with explicit hesitation and attack chances.
    #[must_use]
    pub const fn with_tuning(rng_seed: u64, rest_chance: f64, attack_chance: f64) -> Self {
        Self {
            rng_seed,
            rest_chance,
            attack_chance,
        }
    }
}

/// Pure system that reacts to world ticks and emits unit commands.
#[derive(Debug)]
pub struct AiPlanner {
    rng: ChaCha8Rng,
    rest_chance: f64,
    attack_chance: f64,
    targets: BTreeMap<UnitId, UnitId>,
}

impl AiPlanner {
    /// Creates a new planner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            rest_chance: config.rest_chance,
            attack_chance: config.attack_chance,
            targets: BTreeMap::new(),
        }
    }

    /// Consumes world events and immutable views to emit unit commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        units: &UnitView,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        let roster: Vec<UnitSnapshot> = units.iter().copied().collect();

        for unit in &roster {
            if unit.controller != Controller::Ai || !unit.is_alive() || !unit.ready_for_action {
                continue;
            }

            self.plan_unit(unit, units, occupancy, out);
        }
    }

    fn plan_unit(
        &mut self,
        unit: &UnitSnapshot,
        units: &UnitView,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        let Some(mut target) = self.ensure_target(unit, units, occupancy) else {
            // Nobody reachable: reverse facing periodically to keep scanning.
            out.push(Command::FaceUnit {
                unit: unit.id,
                facing: unit.facing.flipped(),
            });
            return;
        };

        if !is_facing_in_range(unit, &target) {
            if let Some(adjacent) = adjacent_enemy(unit, units, occupancy) {
                let _ = self.targets.insert(unit.id, adjacent.id);
                target = adjacent;
            }
        }

        if self.rng.gen_bool(self.rest_chance) {
            out.push(Command::RestUnit { unit: unit.id });
            return;
        }

        if is_facing_in_range(unit, &target) {
            if self.rng.gen_bool(self.attack_chance) {
                out.push(Command::FightUnit { unit: unit.id });
            }
            return;
        }

        let goal = select_goal(unit.cell, unit.weapon.range(), target.cell, occupancy);
        let command = match goal {
            Some(goal) => match next_step(unit.cell, goal, occupancy) {
                Some(step) => Command::MoveUnit {
                    unit: unit.id,
                    step,
                },
                None => Command::FaceUnit {
                    unit: unit.id,
                    facing: facing_toward(unit, target.cell),
                },
            },
            // Already beside the target: a horizontal nudge either commits
            // the step or just turns the unit toward its target.
            None => Command::MoveUnit {
                unit: unit.id,
                step: step_toward_column(unit.cell, target.cell),
            },
        };
        out.push(command);
    }

    fn ensure_target(
        &mut self,
        unit: &UnitSnapshot,
        units: &UnitView,
        occupancy: OccupancyView<'_>,
    ) -> Option<UnitSnapshot> {
        let remembered = self
            .targets
            .get(&unit.id)
            .and_then(|target| units.get(*target))
            .filter(|target| target.is_alive())
            .copied();
        if remembered.is_some() {
            return remembered;
        }

        let found = search_target(unit, units, occupancy)?;
        let _ = self.targets.insert(unit.id, found.id);
        Some(found)
    }
}

/// Breadth-first search for the nearest living enemy.
///
/// Expansion prefers the cell ahead of the unit, then the vertical
/// neighbors, then the cell behind it, and visits each cell once. The
/// search floods through occupied cells so enemies behind obstacles are
/// still found.
fn search_target(
    unit: &UnitSnapshot,
    units: &UnitView,
    occupancy: OccupancyView<'_>,
) -> Option<UnitSnapshot> {
    let (columns, rows) = occupancy.dimensions();
    let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
    if cell_count == 0 {
        return None;
    }

    let index_of = |cell: CellCoord| -> Option<usize> {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        Some(row * columns as usize + column)
    };

    let mut visited = vec![false; cell_count];
    let mut queue = VecDeque::new();

    if let Some(start) = index_of(unit.cell) {
        visited[start] = true;
        queue.push_back(unit.cell);
    }

    let ahead = unit.facing.sign();
    let preference = [(ahead, 0), (0, -1), (0, 1), (-ahead, 0)];

    while let Some(cell) = queue.pop_front() {
        for (dx, dy) in preference {
            let Some(neighbor) = cell.offset(StepDelta::clamped(dx, dy)) else {
                continue;
            };
            if neighbor.column() >= columns || neighbor.row() >= rows {
                continue;
            }
            let Some(index) = index_of(neighbor) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;

            if let Some(occupant) = occupancy.unit_at(neighbor) {
                if let Some(candidate) = units.get(occupant) {
                    if candidate.is_alive() && candidate.team.opposes(unit.team) {
                        return Some(*candidate);
                    }
                }
            }

            queue.push_back(neighbor);
        }
    }

    None
}

/// Reports whether the unit is lined up with its target: same row, within
/// weapon range, and oriented toward it.
fn is_facing_in_range(unit: &UnitSnapshot, target: &UnitSnapshot) -> bool {
    if unit.cell.row() != target.cell.row() {
        return false;
    }

    let distance = unit.cell.column().abs_diff(target.cell.column());
    if distance == 0 || distance > unit.weapon.range() {
        return false;
    }

    match unit.facing {
        Facing::Left => target.cell.column() < unit.cell.column(),
        Facing::Right => target.cell.column() > unit.cell.column(),
    }
}

/// First living enemy standing on one of the unit's four neighbor cells.
fn adjacent_enemy(
    unit: &UnitSnapshot,
    units: &UnitView,
    occupancy: OccupancyView<'_>,
) -> Option<UnitSnapshot> {
    let ahead = unit.facing.sign();
    let neighbors = [(ahead, 0), (-ahead, 0), (0, -1), (0, 1)];

    for (dx, dy) in neighbors {
        let Some(cell) = unit.cell.offset(StepDelta::clamped(dx, dy)) else {
            continue;
        };
        let Some(occupant) = occupancy.unit_at(cell) else {
            continue;
        };
        if let Some(candidate) = units.get(occupant) {
            if candidate.is_alive() && candidate.team.opposes(unit.team) {
                return Some(*candidate);
            }
        }
    }

    None
}

/// Selects the cell an approaching unit should path toward.
///
/// The goal is the nearest walkable cell within `range` columns of the
/// target on the target's row, ranked by Manhattan distance to `origin`
/// with column and row as tie-breaks. A melee unit already beside its
/// target gets no goal; it only needs to turn. When every in-range cell is
/// closed, the search falls back to a breadth-first sweep for the nearest
/// walkable cell around the target.
#[must_use]
pub fn select_goal(
    origin: CellCoord,
    range: u32,
    target: CellCoord,
    occupancy: OccupancyView<'_>,
) -> Option<CellCoord> {
    if range == 1
        && origin.row() == target.row()
        && origin.column().abs_diff(target.column()) <= 1
    {
        return None;
    }

    let mut best: Option<GoalCandidate> = None;
    for distance in 0..=range {
        for side in [-1i64, 1] {
            let column = i64::from(target.column()) + side * i64::from(distance);
            let Ok(column) = u32::try_from(column) else {
                continue;
            };
            let cell = CellCoord::new(column, target.row());
            if !occupancy.is_walkable(cell) {
                continue;
            }

            let candidate = GoalCandidate {
                cell,
                distance: origin.manhattan_distance(cell),
            };
            best = Some(match best {
                None => candidate,
                Some(existing) => {
                    if candidate.precedes(existing) {
                        candidate
                    } else {
                        existing
                    }
                }
            });
        }
    }

    if let Some(candidate) = best {
        return Some(candidate.cell);
    }

    closest_open_cell(target, occupancy)
}

#[derive(Clone, Copy, Debug)]
struct GoalCandidate {
    cell: CellCoord,
    distance: u32,
}

impl GoalCandidate {
    fn precedes(self, other: GoalCandidate) -> bool {
        let rank = (self.distance, self.cell.column(), self.cell.row());
        let other_rank = (other.distance, other.cell.column(), other.cell.row());
        rank < other_rank
    }
}

/// Breadth-first search outward from `target` for the first walkable cell.
fn closest_open_cell(target: CellCoord, occupancy: OccupancyView<'_>) -> Option<CellCoord> {
    let (columns, rows) = occupancy.dimensions();
    let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
    if cell_count == 0 {
        return None;
    }

    let index_of = |cell: CellCoord| -> Option<usize> {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        Some(row * columns as usize + column)
    };

    let mut visited = vec![false; cell_count];
    let mut queue = VecDeque::new();

    if let Some(start) = index_of(target) {
        visited[start] = true;
        queue.push_back(target);
    }

    while let Some(cell) = queue.pop_front() {
        for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let Some(neighbor) = cell.offset(StepDelta::clamped(dx, dy)) else {
                continue;
            };
            if neighbor.column() >= columns || neighbor.row() >= rows {
                continue;
            }
            let Some(index) = index_of(neighbor) else {
                continue;
            };
            if visited[index] {
                continue;
            }

            if occupancy.is_walkable(neighbor) {
                return Some(neighbor);
            }

            visited[index] = true;
            queue.push_back(neighbor);
        }
    }

    None
}

/// One 8-directional shortest-path step from `from` toward `goal`.
fn next_step(from: CellCoord, goal: CellCoord, occupancy: OccupancyView<'_>) -> Option<StepDelta> {
    let (path, _cost) = astar(
        &from,
        |cell| successors(*cell, occupancy),
        |cell| cell.chebyshev_distance(goal),
        |cell| *cell == goal,
    )?;

    let next = path.get(1)?;
    let dx = i64::from(next.column()) - i64::from(from.column());
    let dy = i64::from(next.row()) - i64::from(from.row());
    let step = StepDelta::clamped(dx as i32, dy as i32);
    (!step.is_zero()).then_some(step)
}

fn successors(cell: CellCoord, occupancy: OccupancyView<'_>) -> Vec<(CellCoord, u32)> {
    let mut cells = Vec::with_capacity(8);
    for dy in [-1, 0, 1] {
        for dx in [-1, 0, 1] {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(neighbor) = cell.offset(StepDelta::clamped(dx, dy)) else {
                continue;
            };
            if occupancy.is_walkable(neighbor) {
                cells.push((neighbor, 1));
            }
        }
    }
    cells
}

fn facing_toward(unit: &UnitSnapshot, target: CellCoord) -> Facing {
    let dx = i64::from(target.column()) - i64::from(unit.cell.column());
    Facing::from_step(dx.signum() as i8).unwrap_or(unit.facing)
}

fn step_toward_column(origin: CellCoord, target: CellCoord) -> StepDelta {
    let dx = i64::from(target.column()) - i64::from(origin.column());
    StepDelta::clamped(dx.signum() as i32, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use battlefield_core::{
        Controller, Health, Occupant, ScreenPoint, SpritePhase, TeamId, UnitClass,
    };

    fn snapshot(id: u32, team: u8, class: UnitClass, cell: (u32, u32), facing: Facing) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            team: TeamId::new(team),
            class,
            controller: Controller::Ai,
            cell: CellCoord::new(cell.0, cell.1),
            facing,
            health: class.max_health(),
            max_health: class.max_health(),
            weapon: class.weapon(),
            phase: SpritePhase::Idle,
            frame: 0,
            flash: 0,
            ready_for_action: true,
            screen: ScreenPoint::new(0.0, 0.0),
        }
    }

    struct Board {
        cells: Vec<Option<Occupant>>,
        columns: u32,
        rows: u32,
    }

    impl Board {
        fn new(columns: u32, rows: u32) -> Self {
            Self {
                cells: vec![None; (columns * rows) as usize],
                columns,
                rows,
            }
        }

        fn with_units(mut self, units: &[UnitSnapshot]) -> Self {
            for unit in units {
                let index = (unit.cell.row() * self.columns + unit.cell.column()) as usize;
                self.cells[index] = Some(Occupant::Unit(unit.id));
            }
            self
        }

        fn with_obstacle(mut self, cell: (u32, u32)) -> Self {
            let index = (cell.1 * self.columns + cell.0) as usize;
            self.cells[index] = Some(Occupant::Obstacle);
            self
        }

        fn view(&self) -> OccupancyView<'_> {
            OccupancyView::new(&self.cells, self.columns, self.rows)
        }
    }

    fn tick_events() -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: std::time::Duration::from_millis(50),
        }]
    }

    #[test]
    fn flips_facing_when_no_enemy_is_reachable() {
        let lone = snapshot(1, 0, UnitClass::Militia, (5, 5), Facing::Left);
        let units = UnitView::from_snapshots(vec![lone]);
        let board = Board::new(30, 10).with_units(&[lone]);

        let mut planner = AiPlanner::new(Config::with_tuning(1, 0.0, 1.0));
        let mut out = Vec::new();
        planner.handle(&tick_events(), &units, board.view(), &mut out);

        assert_eq!(
            out,
            vec![Command::FaceUnit {
                unit: UnitId::new(1),
                facing: Facing::Right,
            }],
        );
    }

    #[test]
    fn prefers_the_enemy_ahead_when_distances_tie() {
        let hunter = snapshot(1, 0, UnitClass::Militia, (5, 5), Facing::Left);
        let ahead = snapshot(2, 1, UnitClass::Militia, (3, 5), Facing::Right);
        let behind = snapshot(3, 1, UnitClass::Militia, (7, 5), Facing::Left);
        let units = UnitView::from_snapshots(vec![hunter, ahead, behind]);
        let board = Board::new(30, 10).with_units(&[hunter, ahead, behind]);

        let mut planner = AiPlanner::new(Config::with_tuning(1, 0.0, 1.0));
        let mut out = Vec::new();
        planner.handle(&tick_events(), &units, board.view(), &mut out);

        assert_eq!(
            out,
            vec![Command::MoveUnit {
                unit: UnitId::new(1),
                step: StepDelta::clamped(-1, 0),
            }],
            "the unit should step toward the enemy found ahead"
        );
    }

    #[test]
    fn attacks_when_lined_up_with_its_target() {
        let hunter = snapshot(1, 0, UnitClass::Militia, (10, 5), Facing::Left);
        let prey = snapshot(2, 1, UnitClass::Militia, (9, 5), Facing::Right);
        let units = UnitView::from_snapshots(vec![hunter, prey]);
        let board = Board::new(30, 10).with_units(&[hunter, prey]);

        let mut planner = AiPlanner::new(Config::with_tuning(1, 0.0, 1.0));
        let mut out = Vec::new();
        planner.handle(&tick_events(), &units, board.view(), &mut out);

        assert_eq!(out, vec![Command::FightUnit { unit: UnitId::new(1) }]);
    }

    #[test]
    fn holds_position_when_lined_up_but_not_striking() {
        let hunter = snapshot(1, 0, UnitClass::Archer, (20, 5), Facing::Left);
        let prey = snapshot(2, 1, UnitClass::Militia, (14, 5), Facing::Right);
        let units = UnitView::from_snapshots(vec![hunter, prey]);
        let board = Board::new(30, 10).with_units(&[hunter, prey]);

        let mut planner = AiPlanner::new(Config::with_tuning(1, 0.0, 0.0));
        let mut out = Vec::new();
        planner.handle(&tick_events(), &units, board.view(), &mut out);

        assert!(out.is_empty(), "a lined-up unit holds its position");
    }

    #[test]
    fn dead_enemies_are_never_targeted() {
        let hunter = snapshot(1, 0, UnitClass::Militia, (5, 5), Facing::Left);
        let mut corpse = snapshot(2, 1, UnitClass::Militia, (3, 5), Facing::Right);
        corpse.health = Health::new(0);
        let units = UnitView::from_snapshots(vec![hunter, corpse]);
        // Dead units are absent from the occupancy grid.
        let board = Board::new(30, 10).with_units(&[hunter]);

        let mut planner = AiPlanner::new(Config::with_tuning(1, 0.0, 1.0));
        let mut out = Vec::new();
        planner.handle(&tick_events(), &units, board.view(), &mut out);

        assert_eq!(
            out,
            vec![Command::FaceUnit {
                unit: UnitId::new(1),
                facing: Facing::Right,
            }],
            "a battlefield of corpses leaves nothing to hunt"
        );
    }

    #[test]
    fn rest_chance_consumes_the_window() {
        let hunter = snapshot(1, 0, UnitClass::Militia, (5, 5), Facing::Left);
        let prey = snapshot(2, 1, UnitClass::Militia, (3, 5), Facing::Right);
        let units = UnitView::from_snapshots(vec![hunter, prey]);
        let board = Board::new(30, 10).with_units(&[hunter, prey]);

        let mut planner = AiPlanner::new(Config::with_tuning(1, 1.0, 1.0));
        let mut out = Vec::new();
        planner.handle(&tick_events(), &units, board.view(), &mut out);

        assert_eq!(out, vec![Command::RestUnit { unit: UnitId::new(1) }]);
    }

    #[test]
    fn goal_prefers_the_near_side_of_the_range_band() {
        let shooter = snapshot(1, 0, UnitClass::Archer, (27, 5), Facing::Right);
        let prey = snapshot(2, 1, UnitClass::Militia, (18, 5), Facing::Right);
        let board = Board::new(30, 10).with_units(&[shooter, prey]);

        let goal = select_goal(shooter.cell, 8, prey.cell, board.view());
        assert_eq!(
            goal,
            Some(CellCoord::new(26, 5)),
            "the in-range cell beside the shooter wins over the far side"
        );
    }

    #[test]
    fn goal_breaks_distance_ties_by_column() {
        let shooter = snapshot(1, 0, UnitClass::Archer, (25, 5), Facing::Right);
        let prey = snapshot(2, 1, UnitClass::Militia, (18, 5), Facing::Right);
        let board = Board::new(30, 10).with_units(&[shooter, prey]);

        let goal = select_goal(shooter.cell, 8, prey.cell, board.view());
        assert_eq!(goal, Some(CellCoord::new(24, 5)));
    }

    #[test]
    fn melee_unit_beside_its_target_gets_no_goal() {
        let brawler = snapshot(1, 0, UnitClass::Militia, (19, 5), Facing::Right);
        let prey = snapshot(2, 1, UnitClass::Militia, (18, 5), Facing::Right);
        let board = Board::new(30, 10).with_units(&[brawler, prey]);

        assert_eq!(select_goal(brawler.cell, 1, prey.cell, board.view()), None);
    }

    #[test]
    fn closed_range_band_falls_back_to_bfs_around_the_target() {
        let shooter = snapshot(1, 0, UnitClass::Militia, (25, 8), Facing::Left);
        let prey = snapshot(2, 1, UnitClass::Militia, (18, 5), Facing::Right);
        let mut board = Board::new(30, 10).with_units(&[shooter, prey]);
        for column in 17..=19 {
            board = board.with_obstacle((column, 5));
        }

        let goal = select_goal(shooter.cell, 1, prey.cell, board.view());
        assert_eq!(
            goal,
            Some(CellCoord::new(18, 4)),
            "the sweep should land on the first open cell around the target"
        );
    }

    #[test]
    fn pathfinding_failure_degrades_to_turning() {
        // Wall the hunter into a pocket so no path reaches the target.
        let hunter = snapshot(1, 0, UnitClass::Militia, (0, 0), Facing::Right);
        let prey = snapshot(2, 1, UnitClass::Militia, (5, 0), Facing::Left);
        let units = UnitView::from_snapshots(vec![hunter, prey]);
        let board = Board::new(30, 10)
            .with_units(&[hunter, prey])
            .with_obstacle((1, 0))
            .with_obstacle((1, 1))
            .with_obstacle((0, 1));

        let mut planner = AiPlanner::new(Config::with_tuning(1, 0.0, 1.0));
        let mut out = Vec::new();
        planner.handle(&tick_events(), &units, board.view(), &mut out);

        assert_eq!(
            out,
            vec![Command::FaceUnit {
                unit: UnitId::new(1),
                facing: Facing::Right,
            }],
        );
    }
}
