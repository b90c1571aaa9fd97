#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic field setup that emits tree and unit spawn commands.
//!
//! Given a seed and a scenario, the system plants the mirrored tree walls
//! that funnel combat toward the center, scatters a handful of extra trees
//! onto open cells, and rosters the opposing squads. Identical seeds always
//! produce identical battlefields.

use std::collections::HashSet;

use battlefield_core::{BattleGrid, CellCoord, Command, Controller, TeamId, TreeKind, UnitClass};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SCATTER_OAKS: u32 = 7;
const SCATTER_BIRCHES: u32 = 5;
const SCATTER_ATTEMPTS: u32 = 1_000;
const BRIGHTNESS_SPREAD: f32 = 0.4;

/// Opening roster the battlefield is seeded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Two ten-unit squads of randomly drawn classes facing each other.
    Skirmish,
    /// Two ten-unit squads of archers trading volleys across the field.
    ArcherLine,
    /// A player-controlled fighter against a lone enemy archer.
    Duel,
}

/// Configuration parameters required to construct the field setup system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    scenario: Scenario,
}

impl Config {
    /// Creates a new configuration for the provided seed and scenario.
    #[must_use]
    pub const fn new(rng_seed: u64, scenario: Scenario) -> Self {
        Self { rng_seed, scenario }
    }
}

/// Pure system that deterministically emits the opening battlefield.
#[derive(Debug)]
pub struct FieldSetup {
    rng: ChaCha8Rng,
    scenario: Scenario,
    emitted: bool,
}

impl FieldSetup {
    /// Creates a new field setup system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            scenario: config.scenario,
            emitted: false,
        }
    }

    /// Emits the setup command batch once; later calls are no-ops.
    pub fn setup(&mut self, grid: &BattleGrid, out: &mut Vec<Command>) {
        if self.emitted {
            return;
        }
        self.emitted = true;

        if grid.columns() == 0 || grid.rows() == 0 {
            return;
        }

        let roster = roster_for(self.scenario, grid, &mut self.rng);
        let mut claimed: HashSet<CellCoord> = roster.iter().map(|entry| entry.cell).collect();

        self.plant_border_walls(grid, &mut claimed, out);
        self.scatter_trees(grid, TreeKind::Oak, SCATTER_OAKS, &mut claimed, out);
        self.scatter_trees(grid, TreeKind::Birch, SCATTER_BIRCHES, &mut claimed, out);

        for entry in roster {
            out.push(Command::SpawnUnit {
                class: entry.class,
                team: entry.team,
                controller: entry.controller,
                cell: entry.cell,
            });
        }
    }

    /// Mirrored diagonal walls that narrow the field toward its back rows.
    fn plant_border_walls(
        &mut self,
        grid: &BattleGrid,
        claimed: &mut HashSet<CellCoord>,
        out: &mut Vec<Command>,
    ) {
        let rows = grid.rows();
        let columns = grid.columns();

        for row in 0..rows {
            let width = (rows - 1 - row) / 2;

            for column in 0..=width.min(columns.saturating_sub(1)) {
                self.plant(CellCoord::new(column, row), TreeKind::Oak, claimed, out);
            }
            for column in columns.saturating_sub(1 + width)..columns {
                self.plant(CellCoord::new(column, row), TreeKind::Oak, claimed, out);
            }
        }
    }

    fn scatter_trees(
        &mut self,
        grid: &BattleGrid,
        kind: TreeKind,
        count: u32,
        claimed: &mut HashSet<CellCoord>,
        out: &mut Vec<Command>,
    ) {
        for _ in 0..count {
            let Some(cell) = self.random_open_cell(grid, claimed) else {
                return;
            };
            self.plant(cell, kind, claimed, out);
        }
    }

    /// Rejection-samples an unclaimed cell, giving up on crowded grids.
    fn random_open_cell(
        &mut self,
        grid: &BattleGrid,
        claimed: &HashSet<CellCoord>,
    ) -> Option<CellCoord> {
        for _ in 0..SCATTER_ATTEMPTS {
            let column = self.rng.gen_range(0..grid.columns());
            let row = self.rng.gen_range(0..grid.rows());
            let cell = CellCoord::new(column, row);
            if !claimed.contains(&cell) {
                return Some(cell);
            }
        }
        None
    }

    fn plant(
        &mut self,
        cell: CellCoord,
        kind: TreeKind,
        claimed: &mut HashSet<CellCoord>,
        out: &mut Vec<Command>,
    ) {
        if !claimed.insert(cell) {
            return;
        }

        let flipped = self.rng.gen_bool(0.5);
        let brightness =
            self.rng.gen::<f32>() * BRIGHTNESS_SPREAD + (1.0 - BRIGHTNESS_SPREAD / 2.0);
        out.push(Command::PlaceTree {
            cell,
            kind,
            flipped,
            brightness,
        });
    }
}

#[derive(Clone, Copy, Debug)]
struct RosterEntry {
    class: UnitClass,
    team: TeamId,
    controller: Controller,
    cell: CellCoord,
}

fn roster_for(scenario: Scenario, grid: &BattleGrid, rng: &mut ChaCha8Rng) -> Vec<RosterEntry> {
    match scenario {
        Scenario::Skirmish => squads(grid, None, rng),
        Scenario::ArcherLine => squads(grid, Some(UnitClass::Archer), rng),
        Scenario::Duel => duel(grid),
    }
}

/// Two facing squads in paired columns around the field's vertical middle.
fn squads(
    grid: &BattleGrid,
    fixed_class: Option<UnitClass>,
    rng: &mut ChaCha8Rng,
) -> Vec<RosterEntry> {
    let mut roster = Vec::new();
    let rows = grid.rows();
    let columns = grid.columns();

    let friendly_columns = [5u32, 6];
    let enemy_columns = [18u32, 19];
    let first_row = rows / 3;
    let last_row = rows.saturating_sub(rows / 4).max(first_row);

    for row in first_row..last_row {
        for column in friendly_columns {
            if column < columns && row < rows {
                roster.push(RosterEntry {
                    class: fixed_class.unwrap_or_else(|| random_class(rng)),
                    team: TeamId::new(0),
                    controller: Controller::Ai,
                    cell: CellCoord::new(column, row),
                });
            }
        }
        for column in enemy_columns {
            if column < columns && row < rows {
                roster.push(RosterEntry {
                    class: fixed_class.unwrap_or_else(|| random_class(rng)),
                    team: TeamId::new(1),
                    controller: Controller::Ai,
                    cell: CellCoord::new(column, row),
                });
            }
        }
    }

    roster
}

/// Uniform draw over the three combat classes.
fn random_class(rng: &mut ChaCha8Rng) -> UnitClass {
    match rng.gen_range(0..3u8) {
        0 => UnitClass::Militia,
        1 => UnitClass::Knight,
        _ => UnitClass::Archer,
    }
}

fn duel(grid: &BattleGrid) -> Vec<RosterEntry> {
    let mut roster = Vec::new();
    let player_cell = CellCoord::new(5, grid.rows() / 2);
    if grid.contains(player_cell) {
        roster.push(RosterEntry {
            class: UnitClass::Militia,
            team: TeamId::new(0),
            controller: Controller::Player,
            cell: player_cell,
        });
    }

    let archer_cell = CellCoord::new(18, grid.rows().saturating_sub(3));
    if grid.contains(archer_cell) {
        roster.push(RosterEntry {
            class: UnitClass::Archer,
            team: TeamId::new(1),
            controller: Controller::Ai,
            cell: archer_cell,
        });
    }

    roster
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> BattleGrid {
        BattleGrid::new(30, 10, 57.0)
    }

    fn setup_commands(seed: u64, scenario: Scenario) -> Vec<Command> {
        let mut system = FieldSetup::new(Config::new(seed, scenario));
        let mut out = Vec::new();
        system.setup(&grid(), &mut out);
        out
    }

    #[test]
    fn identical_seeds_produce_identical_fields() {
        assert_eq!(
            setup_commands(7, Scenario::Skirmish),
            setup_commands(7, Scenario::Skirmish),
        );
    }

    #[test]
    fn setup_emits_only_once() {
        let mut system = FieldSetup::new(Config::new(3, Scenario::Duel));
        let mut first = Vec::new();
        system.setup(&grid(), &mut first);
        assert!(!first.is_empty());

        let mut second = Vec::new();
        system.setup(&grid(), &mut second);
        assert!(second.is_empty());
    }

    #[test]
    fn border_walls_taper_toward_the_back() {
        let commands = setup_commands(11, Scenario::Duel);
        let tree_cells: Vec<CellCoord> = commands
            .iter()
            .filter_map(|command| match command {
                Command::PlaceTree { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect();

        // Front row walls span five columns per side, the back row one.
        for column in 0..=4 {
            assert!(tree_cells.contains(&CellCoord::new(column, 0)));
            assert!(tree_cells.contains(&CellCoord::new(29 - column, 0)));
        }
        assert!(tree_cells.contains(&CellCoord::new(0, 9)));
        assert!(tree_cells.contains(&CellCoord::new(29, 9)));
    }

    #[test]
    fn trees_never_overlap_roster_cells() {
        let commands = setup_commands(23, Scenario::Skirmish);
        let mut cells = HashSet::new();
        let mut spawns = Vec::new();

        for command in &commands {
            match command {
                Command::PlaceTree { cell, .. } => {
                    assert!(cells.insert(*cell), "duplicate tree at {cell:?}");
                }
                Command::SpawnUnit { cell, .. } => spawns.push(*cell),
                _ => {}
            }
        }

        for spawn in spawns {
            assert!(
                !cells.contains(&spawn),
                "unit roster cell {spawn:?} holds a tree"
            );
        }
    }

    #[test]
    fn skirmish_rosters_two_opposing_squads() {
        let commands = setup_commands(5, Scenario::Skirmish);
        let mut teams = [0u32, 0];
        for command in &commands {
            if let Command::SpawnUnit { team, .. } = command {
                teams[usize::from(team.get())] += 1;
            }
        }
        assert_eq!(teams[0], teams[1], "squads must be evenly matched");
        assert!(teams[0] > 0);
    }

    #[test]
    fn archer_line_is_all_archers() {
        let commands = setup_commands(5, Scenario::ArcherLine);
        for command in &commands {
            if let Command::SpawnUnit { class, .. } = command {
                assert_eq!(*class, UnitClass::Archer);
            }
        }
    }

    #[test]
    fn duel_pairs_a_player_with_an_enemy_archer() {
        let commands = setup_commands(9, Scenario::Duel);
        let spawns: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnUnit {
                    class,
                    team,
                    controller,
                    ..
                } => Some((*class, *team, *controller)),
                _ => None,
            })
            .collect();

        assert_eq!(
            spawns,
            vec![
                (UnitClass::Militia, TeamId::new(0), Controller::Player),
                (UnitClass::Archer, TeamId::new(1), Controller::Ai),
            ],
        );
    }

    #[test]
    fn brightness_jitter_stays_within_the_spread() {
        let commands = setup_commands(31, Scenario::Skirmish);
        for command in &commands {
            if let Command::PlaceTree { brightness, .. } = command {
                assert!((0.8..=1.2).contains(brightness));
            }
        }
    }
}
