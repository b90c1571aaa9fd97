#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Grid Battlefield adapters.
//!
//! The simulation core never draws. Graphical adapters consume the
//! [`Scene`] composed here: a painter-ordered list of sprite instructions,
//! health bar geometry, and the debug grid overlay. Sprite sheets are loaded
//! by the adapter; [`SheetLayout`] validates their declared frame grids
//! before the first frame is presented.

use battlefield_core::{
    projection, BattleGrid, CellCoord, Facing, ProjectileView, SpritePhase, TreeKind, TreeSnapshot,
    UnitClass, UnitView,
};
use glam::Vec2;
use thiserror::Error;

/// Size multiplier applied to unit sprites relative to their cell.
pub const UNIT_SIZE_FACTOR: f32 = 1.7;

/// Size multiplier applied to tree sprites relative to their cell.
pub const TREE_SIZE_FACTOR: f32 = 2.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Keys naming the sprite sheets an adapter must supply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    /// Walking and fighting sheets of the militia class.
    Militia,
    /// Walking and fighting sheets of the knight class.
    Knight,
    /// Walking and fighting sheets of the archer class.
    Archer,
    /// Broad-crowned tree cutout.
    Oak,
    /// Slender tree cutout.
    Birch,
    /// Arrow projectile sprite.
    Arrow,
}

impl SpriteKey {
    /// Sprite key of a unit class.
    #[must_use]
    pub const fn for_class(class: UnitClass) -> Self {
        match class {
            UnitClass::Militia => Self::Militia,
            UnitClass::Knight => Self::Knight,
            UnitClass::Archer => Self::Archer,
        }
    }

    /// Sprite key of a tree variant.
    #[must_use]
    pub const fn for_tree(kind: TreeKind) -> Self {
        match kind {
            TreeKind::Oak => Self::Oak,
            TreeKind::Birch => Self::Birch,
        }
    }
}

/// Declared frame grid of a sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetLayout {
    /// Width of a single frame in pixels.
    pub frame_width: u32,
    /// Height of a single frame in pixels.
    pub frame_height: u32,
    /// Number of frame columns per sheet row.
    pub columns: u32,
    /// Total number of frames on the sheet.
    pub frame_count: u32,
}

impl SheetLayout {
    /// Validates the layout against the pixel dimensions of a loaded sheet.
    ///
    /// Runs at composition time, before the simulation is presented, so a
    /// mismatched asset aborts setup instead of corrupting playback.
    pub fn validate(&self, sheet_width: u32, sheet_height: u32) -> Result<(), SheetError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(SheetError::EmptyFrames);
        }
        if self.columns == 0 || self.frame_count == 0 {
            return Err(SheetError::EmptyGrid);
        }

        let rows = self.frame_count.div_ceil(self.columns);
        let required_width = self.columns * self.frame_width;
        let required_height = rows * self.frame_height;
        if required_width > sheet_width || required_height > sheet_height {
            return Err(SheetError::GridOverflow {
                required_width,
                required_height,
                sheet_width,
                sheet_height,
            });
        }

        Ok(())
    }
}

/// Reasons a declared sheet layout cannot be used.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    /// The layout declares zero-sized frames.
    #[error("sheet layout declares zero-sized frames")]
    EmptyFrames,
    /// The layout declares an empty frame grid.
    #[error("sheet layout declares an empty frame grid")]
    EmptyGrid,
    /// The declared frame grid does not fit on the loaded sheet.
    #[error(
        "frame grid needs {required_width}x{required_height} pixels \
         but the sheet is {sheet_width}x{sheet_height}"
    )]
    GridOverflow {
        /// Pixel width the declared grid requires.
        required_width: u32,
        /// Pixel height the declared grid requires.
        required_height: u32,
        /// Actual sheet width in pixels.
        sheet_width: u32,
        /// Actual sheet height in pixels.
        sheet_height: u32,
    },
}

/// One sprite to draw, in painter order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstruction {
    /// Which sheet the sprite comes from.
    pub key: SpriteKey,
    /// Screen-space anchor of the sprite.
    pub position: Vec2,
    /// Target on-screen width of the sprite in world units.
    pub size: f32,
    /// Horizontal mirroring of the sprite.
    pub facing: Facing,
    /// Animation-phase category selecting the sheet.
    pub phase: SpritePhase,
    /// Frame index within the selected sheet.
    pub frame: u32,
    /// Remaining ticks of the post-hit size pulse; zero when calm.
    pub flash: u32,
    /// Brightness factor applied to the sprite.
    pub brightness: f32,
}

/// Proportional bar geometry for one unit's hit points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HealthBar {
    /// Center of the full-width backing bar.
    pub background_center: Vec2,
    /// Width of the backing bar.
    pub background_width: f32,
    /// Center of the remaining-health bar.
    pub foreground_center: Vec2,
    /// Width of the remaining-health bar.
    pub foreground_width: f32,
    /// Height shared by both bars.
    pub height: f32,
}

/// Computes the backing and remaining-health bars above a unit.
///
/// The remaining bar keeps its left edge aligned with the backing bar, so
/// health drains from the right like the original presentation.
#[must_use]
pub fn health_bar(center: Vec2, width: f32, height: f32, fraction: f32) -> HealthBar {
    let fraction = fraction.clamp(0.0, 1.0);
    let foreground_width = width * fraction;
    HealthBar {
        background_center: center,
        background_width: width,
        foreground_center: Vec2::new(center.x - (width - foreground_width) / 2.0, center.y),
        foreground_width,
        height,
    }
}

/// Outline of one grid cell for the debug overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellOutline {
    /// Lower-left anchor of the cell.
    pub position: Vec2,
    /// Side length of the cell at its row's perspective.
    pub size: f32,
    /// Whether the cell is currently open for traversal.
    pub walkable: bool,
}

/// Complete description of one presentable frame.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Sprites in painter order, back rows first.
    pub sprites: Vec<SpriteInstruction>,
    /// Grid overlay outlines, front row first.
    pub overlay: Vec<CellOutline>,
}

/// Composes the presentable scene from read-only world views.
#[must_use]
pub fn compose_scene(
    grid: &BattleGrid,
    units: &UnitView,
    projectiles: &ProjectileView,
    trees: &[TreeSnapshot],
    walkable: &[CellCoord],
) -> Scene {
    let mut sprites = Vec::new();

    for unit in units.iter() {
        let width = projection::cell_width(unit.cell.row(), grid);
        sprites.push(SpriteInstruction {
            key: SpriteKey::for_class(unit.class),
            position: Vec2::new(unit.screen.x, unit.screen.y),
            size: width * UNIT_SIZE_FACTOR,
            facing: unit.facing,
            phase: unit.phase,
            frame: unit.frame,
            flash: unit.flash,
            brightness: 1.0,
        });
    }

    for tree in trees {
        let width = projection::cell_width(tree.cell.row(), grid);
        sprites.push(SpriteInstruction {
            key: SpriteKey::for_tree(tree.kind),
            position: Vec2::new(tree.screen.x, tree.screen.y),
            size: width * TREE_SIZE_FACTOR,
            facing: if tree.flipped {
                Facing::Right
            } else {
                Facing::Left
            },
            phase: SpritePhase::Idle,
            frame: 0,
            flash: 0,
            brightness: tree.brightness,
        });
    }

    for projectile in projectiles.iter() {
        let width = projection::cell_width(projectile.cell.row(), grid);
        sprites.push(SpriteInstruction {
            key: SpriteKey::Arrow,
            position: Vec2::new(projectile.position.x, projectile.position.y),
            size: width,
            facing: projectile.facing,
            phase: SpritePhase::Idle,
            frame: 0,
            flash: 0,
            brightness: 1.0,
        });
    }

    // Painter order: back rows first, then left to right.
    sprites.sort_by(|a, b| {
        b.position
            .y
            .total_cmp(&a.position.y)
            .then(a.position.x.total_cmp(&b.position.x))
    });

    Scene {
        sprites,
        overlay: grid_overlay(grid, walkable),
    }
}

fn grid_overlay(grid: &BattleGrid, walkable: &[CellCoord]) -> Vec<CellOutline> {
    let mut outlines = Vec::new();
    for row in 0..grid.rows() {
        let size = projection::cell_width(row, grid);
        for column in 0..grid.columns() {
            let cell = CellCoord::new(column, row);
            let anchor = projection::cell_to_screen(cell, grid);
            outlines.push(CellOutline {
                position: Vec2::new(anchor.x, anchor.y),
                size,
                walkable: walkable.contains(&cell),
            });
        }
    }
    outlines
}

#[cfg(test)]
mod tests {
    use super::*;
    use battlefield_core::{
        Controller, Health, ProjectileSnapshot, ScreenPoint, TeamId, UnitId, UnitSnapshot,
    };

    fn unit(id: u32, cell: (u32, u32), phase: SpritePhase) -> UnitSnapshot {
        let class = UnitClass::Militia;
        let grid = BattleGrid::new(30, 10, 57.0);
        let screen = projection::cell_to_screen(CellCoord::new(cell.0, cell.1), &grid);
        UnitSnapshot {
            id: UnitId::new(id),
            team: TeamId::new(0),
            class,
            controller: Controller::Ai,
            cell: CellCoord::new(cell.0, cell.1),
            facing: Facing::Left,
            health: class.max_health(),
            max_health: class.max_health(),
            weapon: class.weapon(),
            phase,
            frame: 0,
            flash: 0,
            ready_for_action: true,
            screen,
        }
    }

    #[test]
    fn sheet_layout_accepts_exact_grids() {
        let layout = SheetLayout {
            frame_width: 48,
            frame_height: 48,
            columns: 8,
            frame_count: 16,
        };
        assert_eq!(layout.validate(384, 96), Ok(()));
    }

    #[test]
    fn sheet_layout_rejects_overflowing_grids() {
        let layout = SheetLayout {
            frame_width: 48,
            frame_height: 48,
            columns: 8,
            frame_count: 16,
        };
        assert_eq!(
            layout.validate(384, 48),
            Err(SheetError::GridOverflow {
                required_width: 384,
                required_height: 96,
                sheet_width: 384,
                sheet_height: 48,
            }),
        );
    }

    #[test]
    fn sheet_layout_rejects_degenerate_declarations() {
        let layout = SheetLayout {
            frame_width: 0,
            frame_height: 48,
            columns: 8,
            frame_count: 16,
        };
        assert_eq!(layout.validate(384, 96), Err(SheetError::EmptyFrames));

        let layout = SheetLayout {
            frame_width: 48,
            frame_height: 48,
            columns: 0,
            frame_count: 16,
        };
        assert_eq!(layout.validate(384, 96), Err(SheetError::EmptyGrid));
    }

    #[test]
    fn health_bar_drains_from_the_right() {
        let bar = health_bar(Vec2::new(100.0, 50.0), 40.0, 3.0, 0.5);
        assert_eq!(bar.background_width, 40.0);
        assert_eq!(bar.foreground_width, 20.0);
        assert_eq!(bar.foreground_center, Vec2::new(90.0, 50.0));
    }

    #[test]
    fn scene_paints_back_rows_before_front_rows() {
        let grid = BattleGrid::new(30, 10, 57.0);
        let back = unit(1, (5, 8), SpritePhase::Idle);
        let front = unit(2, (5, 1), SpritePhase::Idle);
        let units = UnitView::from_snapshots(vec![front, back]);

        let scene = compose_scene(&grid, &units, &ProjectileView::default(), &[], &[]);
        assert_eq!(scene.sprites.len(), 2);
        assert!(
            scene.sprites[0].position.y > scene.sprites[1].position.y,
            "back row must be painted first"
        );
    }

    #[test]
    fn dead_units_stay_in_the_scene() {
        let grid = BattleGrid::new(30, 10, 57.0);
        let mut fallen = unit(1, (4, 4), SpritePhase::Dead);
        fallen.health = Health::new(0);
        let units = UnitView::from_snapshots(vec![fallen]);

        let scene = compose_scene(&grid, &units, &ProjectileView::default(), &[], &[]);
        assert_eq!(scene.sprites.len(), 1);
        assert_eq!(scene.sprites[0].phase, SpritePhase::Dead);
    }

    #[test]
    fn projectiles_render_at_their_continuous_position() {
        let grid = BattleGrid::new(30, 10, 57.0);
        let arrow = ProjectileSnapshot {
            team: TeamId::new(1),
            damage: 1,
            position: ScreenPoint::new(321.5, 120.0),
            cell: CellCoord::new(7, 2),
            facing: Facing::Left,
        };
        let projectiles = ProjectileView::from_snapshots(vec![arrow]);

        let scene = compose_scene(&grid, &UnitView::default(), &projectiles, &[], &[]);
        assert_eq!(scene.sprites[0].key, SpriteKey::Arrow);
        assert_eq!(scene.sprites[0].position, Vec2::new(321.5, 120.0));
    }

    #[test]
    fn overlay_flags_walkable_cells() {
        let grid = BattleGrid::new(3, 2, 10.0);
        let walkable = vec![CellCoord::new(0, 0), CellCoord::new(2, 1)];
        let scene = compose_scene(
            &grid,
            &UnitView::default(),
            &ProjectileView::default(),
            &[],
            &walkable,
        );

        assert_eq!(scene.overlay.len(), 6);
        let open = scene.overlay.iter().filter(|cell| cell.walkable).count();
        assert_eq!(open, 2);
    }
}
