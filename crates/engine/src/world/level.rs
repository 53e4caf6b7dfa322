use serde::Deserialize;
use thiserror::Error;

use super::geometry::{Size, Vec2};

pub type TileCode = u16;

pub const TILE_FLOOR: TileCode = 0;
pub const TILE_WALL: TileCode = 1;
pub const TILE_LAMP: TileCode = 2;
pub const TILE_CHEST_SPAWN: TileCode = 3;
pub const TILE_WATER: TileCode = 4;

pub const DEFAULT_TILE_SIZE: u32 = 32;
pub const DEFAULT_MAX_ROWS: usize = 128;
pub const DEFAULT_MAX_COLS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelConfig {
    pub tile_size: u32,
    pub max_rows: usize,
    pub max_cols: usize,
    pub blocking_tiles: Vec<TileCode>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            max_rows: DEFAULT_MAX_ROWS,
            max_cols: DEFAULT_MAX_COLS,
            blocking_tiles: vec![TILE_WALL, TILE_WATER],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelGridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("level grid must have at least one row and one column")]
    Empty,
    #[error("tile size must be non-zero")]
    ZeroTileSize,
}

/// Row-major tile codes with a collision map of identical dimensions.
///
/// Cell `(col, row)` covers pixels `[col * tile_size, (col + 1) * tile_size)` on x
/// and the same on y, with row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGrid {
    cols: usize,
    rows: usize,
    tile_size: u32,
    tiles: Vec<TileCode>,
    blocking: Vec<bool>,
}

impl LevelGrid {
    pub fn new(
        cols: usize,
        rows: usize,
        tile_size: u32,
        tiles: Vec<TileCode>,
        blocking_tiles: &[TileCode],
    ) -> Result<Self, LevelGridError> {
        if cols == 0 || rows == 0 {
            return Err(LevelGridError::Empty);
        }
        if tile_size == 0 {
            return Err(LevelGridError::ZeroTileSize);
        }
        let expected = cols * rows;
        let actual = tiles.len();
        if expected != actual {
            return Err(LevelGridError::TileCountMismatch { expected, actual });
        }
        let blocking = tiles
            .iter()
            .map(|code| blocking_tiles.contains(code))
            .collect();
        Ok(Self {
            cols,
            rows,
            tile_size,
            tiles,
            blocking,
        })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn pixel_width(&self) -> f32 {
        (self.cols as u64 * self.tile_size as u64) as f32
    }

    pub fn pixel_height(&self) -> f32 {
        (self.rows as u64 * self.tile_size as u64) as f32
    }

    pub fn index_of(&self, col: usize, row: usize) -> Option<usize> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn tile_at(&self, col: usize, row: usize) -> Option<TileCode> {
        self.index_of(col, row)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn is_blocking_cell(&self, col: usize, row: usize) -> bool {
        self.index_of(col, row)
            .and_then(|index| self.blocking.get(index).copied())
            .unwrap_or(true)
    }

    /// Top-left pixel of a cell.
    pub fn cell_origin(&self, col: usize, row: usize) -> Vec2 {
        Vec2 {
            x: (col as u64 * self.tile_size as u64) as f32,
            y: (row as u64 * self.tile_size as u64) as f32,
        }
    }

    /// Rectangle-vs-grid test: blocked when any covered cell is outside the grid or blocking.
    pub fn is_blocked(&self, x: f32, y: f32, width: u32, height: u32) -> bool {
        let Some((col_min, col_max)) = self.covered_span(x, width) else {
            return true;
        };
        let Some((row_min, row_max)) = self.covered_span(y, height) else {
            return true;
        };
        if col_min < 0 || row_min < 0 {
            return true;
        }
        if col_max >= self.cols as i64 || row_max >= self.rows as i64 {
            return true;
        }
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                if self.is_blocking_cell(col as usize, row as usize) {
                    return true;
                }
            }
        }
        false
    }

    /// Moves along x first (tested at the current y), then along y at the committed x.
    ///
    /// Each axis is committed only when its candidate rectangle is free, so a diagonal
    /// push into a wall slides along it.
    pub fn resolve_move(&self, position: Vec2, size: Size, delta: Vec2) -> Vec2 {
        let mut resolved = position;
        if delta.x != 0.0 {
            let candidate_x = resolved.x + delta.x;
            if !self.is_blocked(candidate_x, resolved.y, size.width, size.height) {
                resolved.x = candidate_x;
            }
        }
        if delta.y != 0.0 {
            let candidate_y = resolved.y + delta.y;
            if !self.is_blocked(resolved.x, candidate_y, size.width, size.height) {
                resolved.y = candidate_y;
            }
        }
        resolved
    }

    /// Keeps the rectangle inside the level, `margin` pixels away from the edges.
    pub fn clamp_to_bounds(&self, position: Vec2, size: Size, margin: f32) -> Vec2 {
        let mut clamped = position;
        if clamped.x < margin {
            clamped.x = margin;
        }
        if clamped.y < margin {
            clamped.y = margin;
        }
        let max_x = self.pixel_width() - margin;
        let max_y = self.pixel_height() - margin;
        if clamped.x + size.width as f32 > max_x {
            clamped.x = max_x - size.width as f32;
        }
        if clamped.y + size.height as f32 > max_y {
            clamped.y = max_y - size.height as f32;
        }
        clamped
    }

    fn covered_span(&self, start: f32, extent: u32) -> Option<(i64, i64)> {
        if !start.is_finite() {
            return None;
        }
        let tile = self.tile_size as f64;
        let first_px = (start as f64).floor();
        let last_px = (start as f64 + extent.max(1) as f64).ceil() - 1.0;
        let first = (first_px / tile).floor() as i64;
        let last = (last_px / tile).floor() as i64;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: u32 = DEFAULT_TILE_SIZE;

    /// Builds a grid from rows of '#' (wall) and '.' (floor).
    fn grid_from_ascii(rows: &[&str]) -> LevelGrid {
        let cols = rows[0].len();
        let tiles = rows
            .iter()
            .flat_map(|row| {
                row.chars()
                    .map(|ch| if ch == '#' { TILE_WALL } else { TILE_FLOOR })
            })
            .collect();
        LevelGrid::new(cols, rows.len(), TS, tiles, &[TILE_WALL, TILE_WATER]).expect("grid")
    }

    fn open_room() -> LevelGrid {
        grid_from_ascii(&[
            "######",
            "#....#",
            "#....#",
            "#....#",
            "######",
        ])
    }

    #[test]
    fn new_rejects_wrong_tile_count() {
        let result = LevelGrid::new(2, 2, TS, vec![0, 0, 0], &[]);
        assert_eq!(
            result,
            Err(LevelGridError::TileCountMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn collision_map_follows_blocking_set() {
        let grid = LevelGrid::new(3, 1, TS, vec![TILE_FLOOR, TILE_WALL, TILE_WATER], &[TILE_WATER])
            .expect("grid");
        assert!(!grid.is_blocking_cell(0, 0));
        assert!(!grid.is_blocking_cell(1, 0));
        assert!(grid.is_blocking_cell(2, 0));
        assert!(grid.is_blocking_cell(3, 0));
    }

    #[test]
    fn rect_inside_floor_is_free() {
        let grid = open_room();
        assert!(!grid.is_blocked(34.0, 34.0, 28, 28));
    }

    #[test]
    fn rect_spanning_two_tiles_is_blocked_by_either() {
        let grid = open_room();
        // Spans columns 4 and 5; column 5 is the right wall.
        assert!(grid.is_blocked(150.0, 40.0, 28, 28));
        // Exactly flush with the wall edge is still free.
        assert!(!grid.is_blocked(160.0 - 28.0, 40.0, 28, 28));
    }

    #[test]
    fn out_of_grid_is_blocked() {
        let grid = open_room();
        assert!(grid.is_blocked(-1.0, 40.0, 4, 4));
        assert!(grid.is_blocked(40.0, grid.pixel_height(), 4, 4));
        assert!(grid.is_blocked(f32::NAN, 40.0, 4, 4));
    }

    #[test]
    fn diagonal_into_wall_slides_along_free_axis() {
        let grid = open_room();
        let size = Size::square(28);
        let start = Vec2::new(160.0 - 28.0 - 1.0, 40.0);
        let resolved = grid.resolve_move(start, size, Vec2::new(5.0, 6.0));
        assert_eq!(resolved.x, start.x);
        assert_eq!(resolved.y, start.y + 6.0);
    }

    #[test]
    fn free_diagonal_commits_both_axes() {
        let grid = open_room();
        let resolved = grid.resolve_move(Vec2::new(40.0, 40.0), Size::square(28), Vec2::new(3.0, -2.0));
        assert_eq!(resolved, Vec2::new(43.0, 38.0));
    }

    #[test]
    fn resolved_moves_never_end_blocked() {
        let grid = grid_from_ascii(&[
            "########",
            "#......#",
            "#..#...#",
            "#...##.#",
            "#......#",
            "########",
        ]);
        let size = Size::square(20);
        let deltas = [
            Vec2::new(7.0, 0.0),
            Vec2::new(-9.0, 0.0),
            Vec2::new(0.0, 11.0),
            Vec2::new(0.0, -13.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(-15.0, 12.0),
            Vec2::new(40.0, -40.0),
        ];
        let mut checked = 0;
        for y in (0..grid.pixel_height() as i32).step_by(5) {
            for x in (0..grid.pixel_width() as i32).step_by(5) {
                let start = Vec2::new(x as f32 + 0.25, y as f32 + 0.5);
                if grid.is_blocked(start.x, start.y, size.width, size.height) {
                    continue;
                }
                for delta in deltas {
                    let end = grid.resolve_move(start, size, delta);
                    assert!(
                        !grid.is_blocked(end.x, end.y, size.width, size.height),
                        "start={start:?} delta={delta:?} end={end:?}"
                    );
                    checked += 1;
                }
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn clamp_keeps_rect_inside_margin() {
        let grid = open_room();
        let size = Size::square(28);
        let clamped = grid.clamp_to_bounds(Vec2::new(-10.0, 500.0), size, 2.0);
        assert_eq!(clamped.x, 2.0);
        assert_eq!(clamped.y, grid.pixel_height() - 2.0 - 28.0);
    }
}
