//! Sparse spatial hash for 2D neighbour rejection.
//!
//! Cells are square and keyed by integer coordinates. With a cell size of
//! `min_distance / √2` a cell can hold at most one accepted sample, so each
//! occupied cell stores a single sample index. Only occupied cells are
//! allocated, so memory follows the number of samples rather than the area
//! of the disk divided by the spacing.

use glam::Vec2;
use std::collections::HashMap;

type CellKey = (i64, i64);

/// Hash grid storing at most one point index per occupied cell.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, u32>,
}

impl SpatialGrid {
    /// Create an empty grid sized for about `capacity` samples.
    /// `cell_size` must be positive.
    pub fn new(cell_size: f32, capacity: usize) -> Self {
        Self {
            cell_size,
            cells: HashMap::with_capacity(capacity),
        }
    }

    /// Integer cell coordinates for a world position.
    pub fn cell_of(&self, p: Vec2) -> CellKey {
        let c = (p / self.cell_size).floor();
        (c.x as i64, c.y as i64)
    }

    /// Record `index` as the occupant of the cell containing `p`.
    pub fn insert(&mut self, p: Vec2, index: u32) {
        self.cells.insert(self.cell_of(p), index);
    }

    /// Indices stored in the `(2·reach + 1)²` block of cells around `p`.
    pub fn neighbors(&self, p: Vec2, reach: i64) -> impl Iterator<Item = u32> + '_ {
        let (cx, cy) = self.cell_of(p);
        (cy - reach..=cy + reach).flat_map(move |y| {
            (cx - reach..=cx + reach).filter_map(move |x| self.cells.get(&(x, y)).copied())
        })
    }

    /// True when no stored point in the 5×5 neighbourhood lies closer than
    /// `min_distance` to `p`.
    pub fn is_clear(&self, p: Vec2, points: &[Vec2], min_distance: f32) -> bool {
        let min_sq = min_distance * min_distance;
        self.neighbors(p, 2)
            .all(|i| points[i as usize].distance_squared(p) >= min_sq)
    }
}
