//! Tile Map
//!
//! Static grid of tile codes loaded once per session. Rows are Y, columns are X.
//! Rows may be ragged; any cell outside the grid reads as `None` and is never solid.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::aabb::Rect;

/// Edge length of one tile, in pixels.
pub const TILE_SIZE: f64 = 60.0;

/// Map loading errors.
#[derive(Debug, Error)]
pub enum MapError {
    /// Map file could not be read.
    #[error("failed to read map file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Map JSON is not a 2D array of integers.
    #[error("invalid map data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tile code enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileKind {
    /// Walkable floor
    Empty = 0,
    /// Always solid
    Wall = 1,
    /// Solid while its door is closed
    Door = 2,
    /// Walkable; interact here to hide
    HidingSpot = 3,
    /// Walkable objective marker
    Objective = 4,
}

impl TileKind {
    /// Decode a raw tile code. Unknown codes read as floor.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TileKind::Empty,
            1 => TileKind::Wall,
            2 => TileKind::Door,
            3 => TileKind::HidingSpot,
            4 => TileKind::Objective,
            other => {
                debug!(code = other, "Unknown tile code treated as empty");
                TileKind::Empty
            }
        }
    }
}

/// Integer tile coordinate. Orders by row, then column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Row (Y)
    pub y: i32,
    /// Column (X)
    pub x: i32,
}

impl TileCoord {
    /// Create a coordinate from column and row.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing the pixel `(px, py)`.
    #[inline]
    pub fn from_pixel(px: f64, py: f64) -> Self {
        Self::new(
            (px / TILE_SIZE).floor() as i32,
            (py / TILE_SIZE).floor() as i32,
        )
    }

    /// Manhattan distance to another tile.
    #[inline]
    pub fn manhattan(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Rook adjacency: Manhattan distance of exactly one.
    #[inline]
    pub fn is_rook_adjacent(self, other: TileCoord) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error parsing an `"x,y"` door key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tile key {0:?}, expected \"x,y\"")]
pub struct TileKeyError(pub String);

impl FromStr for TileCoord {
    type Err = TileKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TileKeyError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse::<i32>().map_err(|_| err())?;
        let y = y.trim().parse::<i32>().map_err(|_| err())?;
        Ok(Self::new(x, y))
    }
}

/// Immutable tile grid.
#[derive(Clone, Debug)]
pub struct TileMap {
    rows: Vec<Vec<TileKind>>,
}

impl TileMap {
    /// Build a map from raw tile codes.
    pub fn from_codes(codes: Vec<Vec<i64>>) -> Self {
        let rows = codes
            .into_iter()
            .map(|row| row.into_iter().map(TileKind::from_code).collect())
            .collect();
        Self { rows }
    }

    /// Parse a JSON 2D array of tile codes.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let codes: Vec<Vec<i64>> = serde_json::from_str(json)?;
        Ok(Self::from_codes(codes))
    }

    /// Load a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let map = Self::from_json(&text)?;
        debug!(path = %path.display(), width = map.width(), height = map.height(), "Loaded map");
        Ok(map)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Tile at a coordinate, or `None` outside the grid.
    pub fn tile(&self, coord: TileCoord) -> Option<TileKind> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        self.rows
            .get(coord.y as usize)
            .and_then(|row| row.get(coord.x as usize))
            .copied()
    }

    /// All coordinates holding the given tile kind, row-major.
    pub fn coords_of(&self, kind: TileKind) -> impl Iterator<Item = TileCoord> + '_ {
        self.rows.iter().enumerate().flat_map(move |(y, row)| {
            row.iter()
                .enumerate()
                .filter(move |(_, tile)| **tile == kind)
                .map(move |(x, _)| TileCoord::new(x as i32, y as i32))
        })
    }

    /// Tiles touched by a rectangle. Edges landing exactly on a tile
    /// boundary do not reach into the next tile.
    pub fn tiles_overlapping(rect: &Rect) -> impl Iterator<Item = TileCoord> {
        let (left, top, right, bottom) = tile_span(rect);
        (top..=bottom).flat_map(move |y| (left..=right).map(move |x| TileCoord::new(x, y)))
    }

    /// Tiles touched by a rectangle, limited to the grid plus a one-cell
    /// margin. Everything past the margin is empty, so nothing solid is
    /// skipped, and far-off rectangles yield nothing.
    pub fn tiles_within(&self, rect: &Rect) -> impl Iterator<Item = TileCoord> {
        let (left, top, right, bottom) = tile_span(rect);
        let max_x = i32::try_from(self.width()).unwrap_or(i32::MAX);
        let max_y = i32::try_from(self.height()).unwrap_or(i32::MAX);
        let (left, right) = (left.max(-1), right.min(max_x));
        let (top, bottom) = (top.max(-1), bottom.min(max_y));
        (top..=bottom).flat_map(move |y| (left..=right).map(move |x| TileCoord::new(x, y)))
    }
}

/// Inclusive tile bounds of a rectangle. Computed in `f64` so that far-off
/// coordinates saturate at the `i32` limits instead of overflowing.
fn tile_span(rect: &Rect) -> (i32, i32, i32, i32) {
    let left = (rect.x / TILE_SIZE).floor() as i32;
    let top = (rect.y / TILE_SIZE).floor() as i32;
    let right = ((rect.right() / TILE_SIZE).ceil() - 1.0) as i32;
    let bottom = ((rect.bottom() / TILE_SIZE).ceil() - 1.0) as i32;
    (left, top, right.max(left), bottom.max(top))
}

// =============================================================================
// TESTS
// =============================================================================
