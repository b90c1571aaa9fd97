#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Battlefield engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Width of the presentation surface in world units.
pub const SCREEN_WIDTH: f32 = 1200.0;

/// Height of the presentation surface in world units.
pub const SCREEN_HEIGHT: f32 = 800.0;

/// Vertical margin between the bottom screen edge and the front grid row.
pub const BOTTOM_MARGIN: f32 = 30.0;

/// Extra vertical spacing inserted between successive grid rows.
pub const ROW_SPACING: f32 = 3.0;

/// Fraction of cell size lost between the front row and the back row.
pub const PERSPECTIVE_DROP: f32 = 0.35;

/// Minimum simulated time between two committed actions of one unit.
pub const ACTION_WINDOW: Duration = Duration::from_millis(400);

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Configures the battlefield grid, discarding all prior inhabitants.
    ConfigureGrid {
        /// Number of cell columns laid out in the grid.
        columns: u32,
        /// Number of cell rows laid out in the grid.
        rows: u32,
        /// Side length of a front-row cell measured in world units.
        cell_length: f32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new unit join the battlefield at the provided cell.
    SpawnUnit {
        /// Combat class assigned to the unit.
        class: UnitClass,
        /// Team the unit fights for.
        team: TeamId,
        /// Whether the unit obeys player input or the AI planner.
        controller: Controller,
        /// Cell the unit should occupy after spawning.
        cell: CellCoord,
    },
    /// Requests placement of a static tree obstacle.
    PlaceTree {
        /// Cell the tree should occupy.
        cell: CellCoord,
        /// Visual variant of the tree.
        kind: TreeKind,
        /// Whether the tree sprite is mirrored horizontally.
        flipped: bool,
        /// Brightness factor applied to the tree sprite.
        brightness: f32,
    },
    /// Requests that a unit advance one step in the provided direction.
    MoveUnit {
        /// Identifier of the unit attempting to move.
        unit: UnitId,
        /// Per-axis step, each component clamped to `{-1, 0, 1}`.
        step: StepDelta,
    },
    /// Requests that a unit begin an attack animation.
    FightUnit {
        /// Identifier of the attacking unit.
        unit: UnitId,
    },
    /// Requests that a unit turn to the provided facing.
    FaceUnit {
        /// Identifier of the turning unit.
        unit: UnitId,
        /// Facing the unit should adopt.
        facing: Facing,
    },
    /// Requests that a unit spend its action window doing nothing.
    RestUnit {
        /// Identifier of the hesitating unit.
        unit: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a unit joined the battlefield.
    UnitSpawned {
        /// Identifier assigned to the unit by the world.
        unit: UnitId,
        /// Combat class of the spawned unit.
        class: UnitClass,
        /// Team the unit fights for.
        team: TeamId,
        /// Cell the unit occupies after spawning.
        cell: CellCoord,
    },
    /// Reports that a unit spawn request was rejected.
    UnitSpawnRejected {
        /// Cell provided in the spawn request.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: PlacementError,
    },
    /// Confirms that a tree was planted.
    TreePlaced {
        /// Cell the tree occupies.
        cell: CellCoord,
        /// Visual variant of the tree.
        kind: TreeKind,
    },
    /// Reports that a tree placement request was rejected.
    TreePlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a unit moved between two cells.
    UnitMoved {
        /// Identifier of the unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before moving.
        from: CellCoord,
        /// Cell the unit occupies after the move committed.
        to: CellCoord,
    },
    /// Announces that a unit turned to a new facing.
    UnitFacingChanged {
        /// Identifier of the unit that turned.
        unit: UnitId,
        /// Facing the unit adopted.
        facing: Facing,
    },
    /// Confirms that a unit began an attack animation.
    UnitFought {
        /// Identifier of the attacking unit.
        unit: UnitId,
    },
    /// Confirms that a unit spent its action window idling.
    UnitRested {
        /// Identifier of the hesitating unit.
        unit: UnitId,
    },
    /// Reports that a unit took damage.
    UnitDamaged {
        /// Identifier of the wounded unit.
        unit: UnitId,
        /// Amount of damage applied.
        damage: u32,
        /// Hit points remaining after the damage landed.
        remaining: Health,
    },
    /// Announces that a unit's hit points reached zero.
    UnitDied {
        /// Identifier of the fallen unit.
        unit: UnitId,
        /// Cell the unit occupied when it fell.
        cell: CellCoord,
    },
    /// Confirms that a ranged weapon launched a projectile.
    ProjectileLaunched {
        /// Team of the shooting unit.
        team: TeamId,
        /// Cell the projectile launched from.
        from: CellCoord,
    },
    /// Confirms that a projectile struck an opposing unit.
    ProjectileStruck {
        /// Team of the shooting unit.
        team: TeamId,
        /// Identifier of the struck unit.
        target: UnitId,
        /// Cell the strike resolved in.
        cell: CellCoord,
    },
    /// Announces that a projectile left the grid without striking anyone.
    ProjectileExpired {
        /// Team of the shooting unit.
        team: TeamId,
        /// Row the projectile was flying along.
        row: u32,
    },
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of the team a unit fights for; opposing units differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(u8);

impl TeamId {
    /// Creates a new team identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether the other team counts as an opponent.
    #[must_use]
    pub const fn opposes(&self, other: TeamId) -> bool {
        self.0 != other.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the Chebyshev distance, the step count under diagonal moves.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Returns the cell displaced by the provided step, if no axis underflows.
    #[must_use]
    pub fn offset(self, step: StepDelta) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(i32::from(step.dx()))?;
        let row = self.row.checked_add_signed(i32::from(step.dy()))?;
        Some(CellCoord::new(column, row))
    }
}

/// Per-axis grid step with each component clamped to `{-1, 0, 1}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StepDelta {
    dx: i8,
    dy: i8,
}

impl StepDelta {
    /// Creates a step, clamping each component into `{-1, 0, 1}`.
    #[must_use]
    pub const fn clamped(dx: i32, dy: i32) -> Self {
        Self {
            dx: clamp_unit(dx),
            dy: clamp_unit(dy),
        }
    }

    /// Horizontal component of the step.
    #[must_use]
    pub const fn dx(&self) -> i8 {
        self.dx
    }

    /// Vertical component of the step.
    #[must_use]
    pub const fn dy(&self) -> i8 {
        self.dy
    }

    /// Reports whether the step moves along both axes at once.
    #[must_use]
    pub const fn is_diagonal(&self) -> bool {
        self.dx != 0 && self.dy != 0
    }

    /// Reports whether the step requests no movement at all.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// The horizontal portion of the step.
    #[must_use]
    pub const fn horizontal(&self) -> Self {
        Self { dx: self.dx, dy: 0 }
    }

    /// The vertical portion of the step.
    #[must_use]
    pub const fn vertical(&self) -> Self {
        Self { dx: 0, dy: self.dy }
    }
}

const fn clamp_unit(value: i32) -> i8 {
    if value > 0 {
        1
    } else if value < 0 {
        -1
    } else {
        0
    }
}

/// Horizontal orientation of a unit sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing toward decreasing column indices.
    Left,
    /// Facing toward increasing column indices.
    Right,
}

impl Facing {
    /// The opposite facing.
    #[must_use]
    pub const fn flipped(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Signed column direction of the facing.
    #[must_use]
    pub const fn sign(&self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }

    /// Derives a facing from a signed horizontal step, if nonzero.
    #[must_use]
    pub const fn from_step(dx: i8) -> Option<Self> {
        if dx > 0 {
            Some(Self::Right)
        } else if dx < 0 {
            Some(Self::Left)
        } else {
            None
        }
    }
}

/// Continuous position expressed in screen-space world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    /// Horizontal coordinate in world units.
    pub x: f32,
    /// Vertical coordinate in world units.
    pub y: f32,
}

impl ScreenPoint {
    /// Creates a new screen point from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Hit points carried by a unit; values at or below zero mean death.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Health(i32);

impl Health {
    /// Creates a new hit-point value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric hit-point value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Returns the hit points remaining after taking the provided damage.
    #[must_use]
    pub const fn damaged(&self, damage: u32) -> Self {
        Self(self.0 - damage as i32)
    }

    /// Reports whether the hit points have crossed the death threshold.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 <= 0
    }
}

/// Decides whether a unit obeys player input or the AI planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// The unit acts only on player intent carried by [`InputState`].
    Player,
    /// The unit acts on commands emitted by the AI planner.
    Ai,
}

/// Combat classes a unit can spawn as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    /// Basic melee fighter.
    Militia,
    /// Heavy melee fighter that cuts deeper per strike.
    Knight,
    /// Ranged fighter that looses arrows along its row.
    Archer,
}

impl UnitClass {
    /// The weapon a unit of this class carries.
    #[must_use]
    pub const fn weapon(self) -> WeaponKind {
        match self {
            Self::Militia => WeaponKind::Pitchfork,
            Self::Knight => WeaponKind::Longsword,
            Self::Archer => WeaponKind::Shortbow,
        }
    }

    /// Maximum hit points a unit of this class spawns with.
    #[must_use]
    pub const fn max_health(self) -> Health {
        match self {
            Self::Militia => Health::new(3),
            Self::Knight => Health::new(5),
            Self::Archer => Health::new(2),
        }
    }
}

/// Weapons that units carry into battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Farm tool pressed into melee service.
    Pitchfork,
    /// Knightly blade that cuts deeper than the pitchfork.
    Longsword,
    /// Bow that looses arrows along the shooter's row.
    Shortbow,
}

impl WeaponKind {
    /// Damage applied by one landed strike.
    #[must_use]
    pub const fn damage(self) -> u32 {
        match self {
            Self::Pitchfork => 1,
            Self::Longsword => 2,
            Self::Shortbow => 1,
        }
    }

    /// Attack range measured in cells along the row axis.
    #[must_use]
    pub const fn range(self) -> u32 {
        match self {
            Self::Pitchfork | Self::Longsword => 1,
            Self::Shortbow => 8,
        }
    }

    /// Ticks that must pass between two allowed strikes.
    #[must_use]
    pub const fn hit_cooldown(self) -> u32 {
        match self {
            Self::Pitchfork | Self::Longsword | Self::Shortbow => 5,
        }
    }

    /// How the weapon resolves a landed hit frame.
    #[must_use]
    pub const fn style(self) -> AttackStyle {
        match self {
            Self::Pitchfork | Self::Longsword => AttackStyle::Melee,
            Self::Shortbow => AttackStyle::Ranged { speed: 4.0 },
        }
    }
}

/// Resolution strategy a weapon uses when its hit frame lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttackStyle {
    /// Hit-scan against the single cell ahead of the wielder.
    Melee,
    /// Spawns a projectile travelling along the wielder's row.
    Ranged {
        /// Horizontal speed in world units per tick, before facing is applied.
        speed: f32,
    },
}

/// Visual variants of the static tree obstacles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeKind {
    /// Broad-crowned tree used for the border walls and most scatter.
    Oak,
    /// Slender tree mixed into the scattered plantings.
    Birch,
}

/// Animation-phase category exposed to rendering collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpritePhase {
    /// The unit is standing still.
    Idle,
    /// The unit is interpolating toward a committed cell.
    Walk,
    /// The unit is playing its attack animation.
    Fight,
    /// The unit has fallen and holds its death pose.
    Dead,
}

/// Reasons a spawn or placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies beyond the configured grid bounds.
    OutOfBounds,
    /// The requested cell already holds a living unit or an obstacle.
    Occupied,
}

/// Discrete player intent sampled by the input adapter each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    /// Whether the leftward movement key is held.
    pub left: bool,
    /// Whether the rightward movement key is held.
    pub right: bool,
    /// Whether the upward movement key is held.
    pub up: bool,
    /// Whether the downward movement key is held.
    pub down: bool,
    /// Whether the attack key is held.
    pub attack: bool,
}

impl InputState {
    /// Net movement step requested by the held directional keys.
    #[must_use]
    pub fn step(&self) -> StepDelta {
        let dx = i32::from(self.right) - i32::from(self.left);
        let dy = i32::from(self.up) - i32::from(self.down);
        StepDelta::clamped(dx, dy)
    }
}

/// Describes the discrete cell layout of the battlefield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BattleGrid {
    columns: u32,
    rows: u32,
    cell_length: f32,
}

impl BattleGrid {
    /// Creates a new battlefield grid description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, cell_length: f32) -> Self {
        Self {
            columns,
            rows,
            cell_length,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a front-row cell expressed in world units.
    #[must_use]
    pub const fn cell_length(&self) -> f32 {
        self.cell_length
    }

    /// Reports whether the provided cell lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }
}

/// Occupant recorded in a single occupancy cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// A living unit holds the cell.
    Unit(UnitId),
    /// A static obstacle holds the cell.
    Obstacle,
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<Occupant>],
    columns: u32,
    rows: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<Occupant>], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the occupant of the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell is in bounds and free of occupants.
    ///
    /// Cells beyond the grid bounds are never walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .is_some_and(|index| self.cells.get(index).copied().unwrap_or(None).is_none())
    }

    /// Returns the unit occupying the provided cell, if any.
    #[must_use]
    pub fn unit_at(&self, cell: CellCoord) -> Option<UnitId> {
        match self.occupant(cell) {
            Some(Occupant::Unit(unit)) => Some(unit),
            _ => None,
        }
    }

    /// Provides the dimensions of the underlying occupancy grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Team the unit fights for.
    pub team: TeamId,
    /// Combat class of the unit.
    pub class: UnitClass,
    /// Whether the unit obeys player input or the AI planner.
    pub controller: Controller,
    /// Grid cell currently occupied by the unit.
    pub cell: CellCoord,
    /// Horizontal orientation of the unit.
    pub facing: Facing,
    /// Hit points remaining.
    pub health: Health,
    /// Hit points the unit spawned with.
    pub max_health: Health,
    /// Weapon the unit carries.
    pub weapon: WeaponKind,
    /// Animation-phase category for rendering.
    pub phase: SpritePhase,
    /// Sub-frame index within the active animation track.
    pub frame: u32,
    /// Remaining ticks of the cosmetic post-hit size pulse.
    pub flash: u32,
    /// Indicates whether the action cooldown window has elapsed.
    pub ready_for_action: bool,
    /// Continuous screen-space position for rendering.
    pub screen: ScreenPoint,
}

impl UnitSnapshot {
    /// Reports whether the unit still participates in the simulation.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_depleted()
    }
}

/// Read-only snapshot describing all units on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the provided unit, if it exists.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Team of the shooting unit.
    pub team: TeamId,
    /// Damage the projectile applies on impact.
    pub damage: u32,
    /// Continuous screen-space position of the projectile.
    pub position: ScreenPoint,
    /// Grid cell derived from the continuous position this tick.
    pub cell: CellCoord,
    /// Horizontal orientation of the projectile sprite.
    pub facing: Facing,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<ProjectileSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no projectiles are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single planted tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeSnapshot {
    /// Cell the tree occupies.
    pub cell: CellCoord,
    /// Visual variant of the tree.
    pub kind: TreeKind,
    /// Whether the tree sprite is mirrored horizontally.
    pub flipped: bool,
    /// Brightness factor applied to the tree sprite.
    pub brightness: f32,
    /// Screen-space anchor of the tree sprite.
    pub screen: ScreenPoint,
}

/// Perspective projection between grid cells and screen-space positions.
///
/// The battlefield is drawn with a painter's perspective: rows further from
/// the viewer shrink by [`PERSPECTIVE_DROP`] and every row is centered
/// horizontally. The inverse transform used for projectile landing applies
/// the same row-dependent compression so the two directions agree on every
/// cell boundary.
pub mod projection {
    use super::{
        BattleGrid, CellCoord, ScreenPoint, BOTTOM_MARGIN, PERSPECTIVE_DROP, ROW_SPACING,
        SCREEN_WIDTH,
    };

    /// Size factor applied to cells of the provided row.
    #[must_use]
    pub fn perspective_factor(row: u32, rows: u32) -> f32 {
        if rows == 0 {
            return 1.0;
        }
        1.0 - (row as f32 / rows as f32) * PERSPECTIVE_DROP
    }

    /// Screen-space width of a cell in the provided row.
    #[must_use]
    pub fn cell_width(row: u32, grid: &BattleGrid) -> f32 {
        grid.cell_length() * perspective_factor(row, grid.rows())
    }

    /// Screen-space anchor of the provided cell's lower-left corner.
    #[must_use]
    pub fn cell_to_screen(cell: CellCoord, grid: &BattleGrid) -> ScreenPoint {
        let width = cell_width(cell.row(), grid);
        let x = cell.column() as f32 * width + row_origin(cell.row(), grid);
        let y = cell.row() as f32 * width + BOTTOM_MARGIN + ROW_SPACING * cell.row() as f32;
        ScreenPoint::new(x, y)
    }

    /// Column containing the provided screen abscissa within the given row.
    ///
    /// Returns `None` when the position falls outside the grid columns. The
    /// row-dependent horizontal compression is inverted here with the same
    /// factor the forward transform applies.
    #[must_use]
    pub fn column_at(screen_x: f32, row: u32, grid: &BattleGrid) -> Option<u32> {
        let width = cell_width(row, grid);
        if width <= 0.0 {
            return None;
        }

        let offset = (screen_x - row_origin(row, grid)) / width;
        if offset < 0.0 {
            return None;
        }

        let column = offset.floor() as u32;
        (column < grid.columns()).then_some(column)
    }

    fn row_origin(row: u32, grid: &BattleGrid) -> f32 {
        let width = cell_width(row, grid);
        SCREEN_WIDTH / 2.0 - grid.columns() as f32 * width / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::{
        projection, BattleGrid, CellCoord, Facing, Health, PlacementError, StepDelta, TeamId,
        UnitClass, UnitId, WeaponKind,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn chebyshev_distance_counts_diagonal_steps() {
        let origin = CellCoord::new(2, 2);
        assert_eq!(origin.chebyshev_distance(CellCoord::new(5, 4)), 3);
        assert_eq!(origin.chebyshev_distance(CellCoord::new(2, 7)), 5);
    }

    #[test]
    fn step_delta_clamps_components() {
        let step = StepDelta::clamped(7, -3);
        assert_eq!(step.dx(), 1);
        assert_eq!(step.dy(), -1);
        assert!(step.is_diagonal());
        assert!(step.horizontal().dy() == 0 && step.vertical().dx() == 0);
    }

    #[test]
    fn offset_rejects_steps_below_zero() {
        let cell = CellCoord::new(0, 3);
        assert_eq!(cell.offset(StepDelta::clamped(-1, 0)), None);
        assert_eq!(
            cell.offset(StepDelta::clamped(1, -1)),
            Some(CellCoord::new(1, 2))
        );
    }

    #[test]
    fn facing_flips_and_signs() {
        assert_eq!(Facing::Left.flipped(), Facing::Right);
        assert_eq!(Facing::Left.sign(), -1);
        assert_eq!(Facing::from_step(0), None);
        assert_eq!(Facing::from_step(-1), Some(Facing::Left));
    }

    #[test]
    fn health_crosses_death_threshold_without_clamping() {
        let health = Health::new(2);
        let wounded = health.damaged(5);
        assert_eq!(wounded.get(), -3);
        assert!(wounded.is_depleted());
        assert!(!health.is_depleted());
    }

    #[test]
    fn class_table_matches_tuning() {
        assert_eq!(UnitClass::Knight.weapon().damage(), 2);
        assert_eq!(UnitClass::Archer.weapon().range(), 8);
        assert_eq!(UnitClass::Militia.max_health(), Health::new(3));
    }

    #[test]
    fn projection_round_trips_cell_columns() {
        let grid = BattleGrid::new(30, 10, 57.0);
        for row in 0..grid.rows() {
            for column in [0, 1, 14, 29] {
                let cell = CellCoord::new(column, row);
                let screen = projection::cell_to_screen(cell, &grid);
                assert_eq!(
                    projection::column_at(screen.x, row, &grid),
                    Some(column),
                    "row {row} column {column}"
                );
            }
        }
    }

    #[test]
    fn projection_rejects_positions_off_grid() {
        let grid = BattleGrid::new(30, 10, 57.0);
        let front_left = projection::cell_to_screen(CellCoord::new(0, 0), &grid);
        assert_eq!(projection::column_at(front_left.x - 1.0, 0, &grid), None);
        let back_right = projection::cell_to_screen(CellCoord::new(29, 9), &grid);
        let width = projection::cell_width(9, &grid);
        assert_eq!(projection::column_at(back_right.x + width, 9, &grid), None);
    }

    #[test]
    fn back_rows_compress_toward_the_center() {
        let grid = BattleGrid::new(30, 10, 57.0);
        let front = projection::cell_to_screen(CellCoord::new(0, 0), &grid);
        let back = projection::cell_to_screen(CellCoord::new(0, 9), &grid);
        assert!(back.x > front.x, "back row should shift toward the center");
        assert!(projection::cell_width(9, &grid) < projection::cell_width(0, &grid));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn unit_id_round_trips_through_bincode() {
        assert_round_trip(&UnitId::new(42));
    }

    #[test]
    fn team_id_round_trips_through_bincode() {
        assert_round_trip(&TeamId::new(1));
    }

    #[test]
    fn weapon_kind_round_trips_through_bincode() {
        assert_round_trip(&WeaponKind::Shortbow);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::Occupied);
    }
}
