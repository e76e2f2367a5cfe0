/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for efficient neighbor lookups.
 * It divides the toroidal world into uniform cells so that a neighbor query
 * only scans a small window of cells instead of every agent.
 *
 * Layout:
 * - One flat, row-major buffer of fixed-size cell slots (capacity per cell)
 * - A live count per cell, reset on every rebuild
 * - Slots hold indices into the agent buffer, never copies
 *
 * The buffers are allocated once and never resized for the life of the grid.
 */

use glam::Vec2;
use tracing::debug;

use crate::boid::Boid;
use crate::error::{try_alloc, FlockError, Result};
use crate::params::SimulationParams;

/// Row/column address of a cell. `row` follows y, `col` follows x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

/// Outcome of one rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Agents that found their cell full and are invisible to queries this tick.
    pub dropped: usize,
    pub occupied_cells: usize,
    pub max_occupancy: usize,
}

#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    grid_width: usize,
    grid_height: usize,
    cell_capacity: usize,
    slots: Vec<usize>,
    counts: Vec<usize>,
}

impl SpatialGrid {
    pub fn new(params: &SimulationParams) -> Result<Self> {
        let (grid_width, grid_height) = params.grid_dimensions();
        let cell_count = grid_width
            .checked_mul(grid_height)
            .ok_or(FlockError::AllocationFailure { what: "grid cells", requested: usize::MAX })?;
        let slot_count = cell_count
            .checked_mul(params.cell_capacity)
            .ok_or(FlockError::AllocationFailure { what: "grid slots", requested: usize::MAX })?;

        Ok(Self {
            cell_size: params.grid_resolution,
            grid_width,
            grid_height,
            cell_capacity: params.cell_capacity,
            slots: try_alloc("grid slots", slot_count, 0)?,
            counts: try_alloc("grid cell counts", cell_count, 0)?,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.counts.len()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions as `(width, height)` in cells.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.grid_width, self.grid_height)
    }

    pub fn cell_capacity(&self) -> usize {
        self.cell_capacity
    }

    // Convert world coordinates to the owning cell
    #[inline]
    pub fn cell_of(&self, position: Vec2) -> CellCoord {
        let col = ((position.x / self.cell_size).floor() as i64).rem_euclid(self.grid_width as i64);
        let row = ((position.y / self.cell_size).floor() as i64).rem_euclid(self.grid_height as i64);
        CellCoord {
            row: row as usize,
            col: col as usize,
        }
    }

    #[inline]
    fn cell_index(&self, row: usize, col: usize) -> usize {
        row * self.grid_width + col
    }

    /// Agent indices currently bucketed in the given cell.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &[usize] {
        let index = self.cell_index(row, col);
        let start = index * self.cell_capacity;
        &self.slots[start..start + self.counts[index]]
    }

    /// The `(2 * range + 1)^2` cells centered on `(row, col)`, wrapped around
    /// the torus. On an axis narrower than the window every cell of that axis
    /// is yielded once, so no cell is ever visited twice.
    pub fn cells_in_range(&self, row: usize, col: usize, range: usize) -> impl Iterator<Item = CellCoord> {
        let cols = axis_window(col, range, self.grid_width);
        axis_window(row, range, self.grid_height)
            .flat_map(move |row| cols.clone().map(move |col| CellCoord { row, col }))
    }

    /// Clear every cell and re-bucket all agents.
    ///
    /// Agents that land in a full cell are left out until the next rebuild
    /// and counted in the returned report.
    pub fn rebuild(&mut self, boids: &[Boid]) -> RebuildReport {
        self.counts.fill(0);

        let mut dropped = 0;
        for (boid_index, boid) in boids.iter().enumerate() {
            let CellCoord { row, col } = self.cell_of(boid.position);
            let cell = self.cell_index(row, col);
            let count = &mut self.counts[cell];
            if *count < self.cell_capacity {
                self.slots[cell * self.cell_capacity + *count] = boid_index;
                *count += 1;
            } else {
                dropped += 1;
            }
        }

        let (occupied_cells, max_occupancy) = self
            .counts
            .iter()
            .fold((0, 0), |(occupied, max), &count| {
                (occupied + usize::from(count > 0), max.max(count))
            });

        if dropped > 0 {
            debug!(
                dropped,
                cell_capacity = self.cell_capacity,
                "cell capacity exceeded during rebuild"
            );
        }

        RebuildReport {
            dropped,
            occupied_cells,
            max_occupancy,
        }
    }
}

// Wrapped indices of a `2 * range + 1` window along one axis of `len` cells
fn axis_window(center: usize, range: usize, len: usize) -> impl Iterator<Item = usize> + Clone {
    let span = 2 * range + 1;
    let (start, count) = if span <= len {
        (center as isize - range as isize, span)
    } else {
        (0, len)
    };
    let len = len as isize;
    (0..count).map(move |offset| (start + offset as isize).rem_euclid(len) as usize)
}
