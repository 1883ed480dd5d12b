//! Uniform spatial grid for broad-phase collision detection.
//!
//! The grid is rebuilt from scratch every frame: entities move every frame,
//! and a linear rebuild is cheaper and simpler than incremental maintenance
//! at the entity counts this game runs (low hundreds). Each active,
//! collidable entity is inserted into **every** cell its bounding circle
//! overlaps; a circle near a cell boundary spans several cells, and
//! inserting only the center cell would miss collisions at cell edges.
//!
//! Pair testing happens strictly within cells. Cross-cell pairs are
//! intentionally not tested, which bounds the cost but requires the cell
//! size to be at least the largest bounding diameter (validated by
//! [`SimConfig::validate`](crate::config::SimConfig::validate)); a pair that
//! can overlap then always shares at least one cell. Pairs that span several
//! shared cells are deduplicated so the same pair never produces two
//! collision events in one frame.
//!
//! Worst case degrades toward O(N²) only if every entity clusters into one
//! cell, an accepted trade-off at this scale.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::ComponentKind;
use crate::events::{EventQueue, GameEvent};
use crate::registry::Registry;

/// Uniform-bucket spatial index, rebuilt every frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Row-major cell buckets of entity store indices.
    cells: Vec<Vec<u32>>,
}

impl SpatialGrid {
    /// Creates a grid with the given cell edge length.
    ///
    /// The grid has no cells until the first [`SpatialGrid::rebuild`] sizes
    /// it to the window.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    /// Cell edge length, world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Current grid dimensions as (columns, rows).
    #[must_use]
    pub const fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Entity indices bucketed in the given cell. Out-of-range coordinates
    /// return an empty slice.
    #[must_use]
    pub fn cell_entities(&self, col: usize, row: usize) -> &[u32] {
        if col < self.cols && row < self.rows {
            &self.cells[row * self.cols + col]
        } else {
            &[]
        }
    }

    /// Clears and re-buckets every active, collidable entity.
    ///
    /// The grid is resized to cover `window` (at least one cell in each
    /// dimension). An entity is inserted into every cell its bounding
    /// circle's AABB overlaps; entities entirely outside the window are
    /// skipped. Only entities carrying an armed collision component are
    /// bucketed, so the cursor and exploding asteroids never reach pair
    /// testing.
    pub fn rebuild(&mut self, window: Vec2, registry: &Registry) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cols = ((window.x / self.cell_size).ceil() as usize).max(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rows = ((window.y / self.cell_size).ceil() as usize).max(1);

        if cols != self.cols || rows != self.rows {
            self.cols = cols;
            self.rows = rows;
            self.cells = vec![Vec::new(); cols * rows];
        } else {
            for cell in &mut self.cells {
                cell.clear();
            }
        }

        let circles = registry.circles();
        let mut bucketed = 0usize;
        for (index, entity) in registry.entities().iter().enumerate() {
            if !entity.is_active() {
                continue;
            }
            let armed = registry
                .component(entity.handle(), ComponentKind::Collision)
                .and_then(|c| c.as_collision())
                .is_some_and(|c| c.is_armed());
            if !armed {
                continue;
            }

            let circle = &circles[index];
            let Some((col_range, row_range)) = self.overlapped_cells(circle.center, circle.radius)
            else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation)]
            let index = index as u32;
            for row in row_range.clone() {
                for col in col_range.clone() {
                    self.cells[row * self.cols + col].push(index);
                }
            }
            bucketed += 1;
        }
        tracing::trace!(cols, rows, bucketed, "spatial grid rebuilt");
    }

    /// Tests every unordered in-cell pair with the exact circle test and
    /// pushes one [`GameEvent::Collision`] per overlapping pair.
    ///
    /// Returns the number of events pushed. A pair sharing several cells is
    /// tested once; the dedup set guarantees at most one event per pair per
    /// frame.
    pub fn detect_collisions(&self, registry: &Registry, events: &mut EventQueue) -> usize {
        let circles = registry.circles();
        let entities = registry.entities();
        let mut tested: HashSet<(u32, u32)> = HashSet::new();
        let mut pushed = 0usize;

        for cell in &self.cells {
            for i in 0..cell.len() {
                for j in (i + 1)..cell.len() {
                    let (a, b) = (cell[i], cell[j]);
                    let key = if a < b { (a, b) } else { (b, a) };
                    if !tested.insert(key) {
                        continue;
                    }
                    if circles[a as usize].overlaps(&circles[b as usize]) {
                        events.push(GameEvent::Collision {
                            first: entities[a as usize].handle(),
                            second: entities[b as usize].handle(),
                        });
                        pushed += 1;
                    }
                }
            }
        }
        pushed
    }

    /// Cell index ranges overlapped by a circle's AABB, or `None` when the
    /// circle lies entirely outside the grid.
    fn overlapped_cells(
        &self,
        center: Vec2,
        radius: f32,
    ) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
        let min = center - Vec2::splat(radius);
        let max = center + Vec2::splat(radius);

        #[allow(clippy::cast_possible_truncation)]
        let min_col = (min.x / self.cell_size).floor() as i64;
        #[allow(clippy::cast_possible_truncation)]
        let max_col = (max.x / self.cell_size).floor() as i64;
        #[allow(clippy::cast_possible_truncation)]
        let min_row = (min.y / self.cell_size).floor() as i64;
        #[allow(clippy::cast_possible_truncation)]
        let max_row = (max.y / self.cell_size).floor() as i64;

        let last_col = i64::try_from(self.cols).ok()? - 1;
        let last_row = i64::try_from(self.rows).ok()? - 1;
        if max_col < 0 || min_col > last_col || max_row < 0 || min_row > last_row {
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let cols = (min_col.max(0) as usize)..=(max_col.min(last_col) as usize);
        #[allow(clippy::cast_sign_loss)]
        let rows = (min_row.max(0) as usize)..=(max_row.min(last_row) as usize);
        Some((cols, rows))
    }
}
