#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Grid Battlefield battles.

mod session;

use std::time::Duration;

use anyhow::{bail, Result};
use battlefield_core::{Event, InputState, TeamId};
use battlefield_system_spawning::Scenario;
use battlefield_world::{query, World};
use clap::Parser;

use session::{Session, SessionConfig};

const TICK: Duration = Duration::from_micros(16_667);

#[derive(Debug, Parser)]
#[command(
    name = "battlefield",
    about = "Runs a headless Grid Battlefield simulation and reports the outcome."
)]
struct Args {
    /// Seed shared by field setup and the AI planner.
    #[arg(long, default_value_t = 2024)]
    seed: u64,

    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 7_200)]
    ticks: u32,

    /// Opening roster: skirmish, archers, or duel.
    #[arg(long, default_value = "skirmish")]
    scenario: String,

    /// Number of grid columns.
    #[arg(long, default_value_t = 30)]
    columns: u32,

    /// Number of grid rows.
    #[arg(long, default_value_t = 10)]
    rows: u32,

    /// Print the final battlefield as a character map.
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let scenario = parse_scenario(&args.scenario)?;

    let config = SessionConfig {
        seed: args.seed,
        scenario,
        columns: args.columns,
        rows: args.rows,
        ..SessionConfig::default()
    };
    let mut session = Session::new(&config);

    let input = InputState::default();
    let mut first_blood = None;
    let mut casualties = 0u32;

    for tick_index in 0..args.ticks {
        for event in session.tick(TICK, &input) {
            match event {
                Event::UnitDamaged { .. } if first_blood.is_none() => {
                    first_blood = Some(tick_index);
                }
                Event::UnitDied { .. } => casualties += 1,
                _ => {}
            }
        }
    }

    print_report(session.world(), args.ticks, first_blood, casualties);
    if args.map {
        print_map(session.world());
    }

    Ok(())
}

fn parse_scenario(value: &str) -> Result<Scenario> {
    match value {
        "skirmish" => Ok(Scenario::Skirmish),
        "archers" => Ok(Scenario::ArcherLine),
        "duel" => Ok(Scenario::Duel),
        other => bail!("unknown scenario `{other}`; expected skirmish, archers, or duel"),
    }
}

fn print_report(world: &World, ticks: u32, first_blood: Option<u32>, casualties: u32) {
    println!("battle finished after {ticks} ticks");
    match first_blood {
        Some(tick) => println!("first blood on tick {tick}, {casualties} fallen in total"),
        None => println!("not a single blow landed"),
    }

    let view = query::unit_view(world);
    for team in [TeamId::new(0), TeamId::new(1)] {
        let mut standing = 0u32;
        let mut hit_points = 0i32;
        let mut fallen = 0u32;
        for unit in view.iter().filter(|unit| unit.team == team) {
            if unit.is_alive() {
                standing += 1;
                hit_points += unit.health.get();
            } else {
                fallen += 1;
            }
        }
        println!(
            "team {}: {standing} standing ({hit_points} hp), {fallen} fallen",
            team.get()
        );
    }
}

/// Draws the grid with the back row on top: trees `#`, fallen units `+`,
/// team zero `o`, team one `x`.
fn print_map(world: &World) {
    let grid = query::battle_grid(world);
    let columns = grid.columns() as usize;
    let rows = grid.rows() as usize;
    if columns == 0 || rows == 0 {
        return;
    }

    let mut cells = vec![b'.'; columns * rows];
    for tree in query::trees(world) {
        let index = tree.cell.row() as usize * columns + tree.cell.column() as usize;
        cells[index] = b'#';
    }
    for unit in query::unit_view(world).iter() {
        let index = unit.cell.row() as usize * columns + unit.cell.column() as usize;
        cells[index] = if !unit.is_alive() {
            b'+'
        } else if unit.team == TeamId::new(0) {
            b'o'
        } else {
            b'x'
        };
    }

    for row in (0..rows).rev() {
        let line = &cells[row * columns..(row + 1) * columns];
        println!("{}", String::from_utf8_lossy(line));
    }
}
