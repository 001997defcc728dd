//! Per-cell elevation statistics.
//!
//! Each grid cell folds the heights of every point that ever landed on its
//! footprint into a fixed set of running statistics. The mean and spread
//! are maintained with Welford's online recurrence, and two cells can be
//! combined with the Chan parallel formula, so accumulation order does not
//! matter and tile-sized blocks can be fused after the fact.

use serde::{Deserialize, Serialize};

/// Aggregated height statistics for one grid cell.
///
/// `n_points == 0` means the cell has never been observed; every other
/// field is meaningless in that state and readers must treat the cell as
/// absent.
///
/// `m2` is the running sum of squared deviations from the mean, *not* the
/// variance. The finalized variance is only produced by [`Cell::variance`]
/// (and exported to the `VARIANCE` raster band). The sample count
/// saturates in practice long before `u32` wraps; overflow past ~4 billion
/// samples per cell is a documented boundary, not a checked error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Number of samples folded into this cell. 0 = never observed.
    pub n_points: u32,
    /// Lowest height seen.
    pub z_min: f32,
    /// Highest height seen.
    pub z_max: f32,
    /// Running mean height (Welford).
    pub z_mean: f32,
    /// Running sum of squared deviations from the mean (Welford M2).
    pub m2: f32,
    /// Timestamp of the last update, in seconds since the map's time base.
    pub last_update: f32,
}

impl Cell {
    /// An unobserved cell.
    pub const EMPTY: Cell = Cell {
        n_points: 0,
        z_min: 0.0,
        z_max: 0.0,
        z_mean: 0.0,
        m2: 0.0,
        last_update: 0.0,
    };

    /// Has this cell ever been observed?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_points == 0
    }

    /// Fold one height sample into the running statistics.
    ///
    /// `last_update` is deliberately left alone; the caller decides when a
    /// cell counts as "touched".
    #[inline]
    pub fn add_sample(&mut self, z: f32) {
        if self.n_points == 0 {
            self.n_points = 1;
            self.z_min = z;
            self.z_max = z;
            self.z_mean = z;
            self.m2 = 0.0;
            return;
        }
        let mean_old = self.z_mean;
        self.n_points += 1;
        let n = self.n_points as f32;
        self.z_mean = (mean_old * (n - 1.0) + z) / n;
        self.m2 += (z - mean_old) * (z - self.z_mean);
        if z < self.z_min {
            self.z_min = z;
        }
        if z > self.z_max {
            self.z_max = z;
        }
    }

    /// Fold another cell's statistics into this one (Chan's parallel
    /// combination). Associative up to floating-point rounding, so blocks
    /// of cells aggregated independently can be fused in any order.
    pub fn merge_from(&mut self, src: &Cell) {
        if src.n_points == 0 {
            return;
        }
        if self.n_points == 0 {
            *self = *src;
            return;
        }
        let n = self.n_points as f32;
        let m = src.n_points as f32;
        let total = n + m;
        let delta = src.z_mean - self.z_mean;
        self.z_mean = (self.z_mean * n + src.z_mean * m) / total;
        self.m2 += src.m2 + delta * delta * n * m / total;
        if src.z_min < self.z_min {
            self.z_min = src.z_min;
        }
        if src.z_max > self.z_max {
            self.z_max = src.z_max;
        }
        if src.last_update > self.last_update {
            self.last_update = src.last_update;
        }
        self.n_points += src.n_points;
    }

    /// Finalized (unbiased) variance: `m2 / (n - 1)` for `n >= 2`, else 0.
    #[inline]
    pub fn variance(&self) -> f32 {
        if self.n_points >= 2 {
            self.m2 / (self.n_points - 1) as f32
        } else {
            0.0
        }
    }
}
