//! Folding point clouds into the window.
//!
//! Static mode accumulates every sample forever. Dynamic mode first
//! aggregates the scan into a window-shaped scratch, classifies each
//! touched cell as flat or vertical by thresholding its single-scan
//! variance, and then reconciles with the persistent window: same class
//! accumulates, a fresh obstacle stashes the ground and takes over, a
//! vanished obstacle restores the stashed ground. A passing pedestrian
//! therefore never leaves a permanent hole in the terrain model.

use crate::core::{PointCloud, Transform};
use crate::error::Result;
use crate::raster::{Band, BandGrid};

use super::{cell_from_bands, ElevationMap};

impl ElevationMap {
    /// Merge one scan: transform the cloud to the custom frame, follow
    /// the robot with the window, and fold every in-window point into the
    /// model.
    ///
    /// The cloud is transformed in place (points with non-finite results
    /// are dropped); the robot position is taken from the transform's
    /// translation. Once aggregation starts the scan runs to completion;
    /// cancel before calling, not during.
    pub fn merge_cloud(&mut self, cloud: &mut PointCloud, tr: &Transform) -> Result<()> {
        cloud.transform(tr);
        let (robx, roby) = tr.translation();
        self.slide_to(robx, roby)?;
        if self.dynamic {
            self.merge_dynamic(cloud);
        } else {
            self.rasterize(cloud);
        }
        Ok(())
    }

    /// Static accumulation: every point folds straight into its cell.
    pub(super) fn rasterize(&mut self, cloud: &PointCloud) {
        let stamp = self.time.seconds();
        let mut dropped = 0usize;
        let mut touched = 0usize;
        for p in &cloud.points {
            match self.map.index_custom(p.x as f64, p.y as f64) {
                Some(idx) => {
                    let cell = &mut self.cells.cells_mut()[idx];
                    cell.add_sample(p.z);
                    cell.last_update = stamp;
                    touched += 1;
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!(
                "{} of {} points fell outside the window",
                dropped,
                cloud.len()
            );
        }
        if touched > 0 {
            self.map_sync = false;
        }
    }

    /// Dynamic reconciliation of one scan against the persistent window.
    pub(super) fn merge_dynamic(&mut self, cloud: &PointCloud) {
        self.scan.clear();
        let mut dropped = 0usize;
        let mut touched = 0usize;
        for p in &cloud.points {
            match self.map.index_custom(p.x as f64, p.y as f64) {
                Some(idx) => {
                    self.scan.cells_mut()[idx].add_sample(p.z);
                    touched += 1;
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!(
                "{} of {} points fell outside the window",
                dropped,
                cloud.len()
            );
        }
        if touched == 0 {
            return;
        }

        let threshold = self.variance_factor * self.scan_variance_mean();
        let stamp = self.time.seconds();
        for idx in 0..self.scan.len() {
            let observed = self.scan.cells()[idx];
            if observed.is_empty() {
                continue;
            }
            let vertical_now = observed.variance() > threshold;
            let cell = &mut self.cells.cells_mut()[idx];
            if cell.is_empty() {
                // virgin cell: adopt the scan and its class
                *cell = observed;
                self.vertical[idx] = vertical_now;
            } else if self.vertical[idx] == vertical_now {
                // same class: accumulate
                cell.merge_from(&observed);
            } else if !self.vertical[idx] {
                // flat -> vertical: remember the ground, expose the obstacle
                self.ground.cells_mut()[idx] = *cell;
                *cell = observed;
                self.vertical[idx] = true;
            } else {
                // vertical -> flat: the obstacle left, bring the ground back
                *cell = self.ground.cells()[idx];
                cell.merge_from(&observed);
                self.vertical[idx] = false;
            }
            cell.last_update = stamp;
        }
        self.map_sync = false;
    }

    /// Mean finalized variance over scan cells with at least 3 samples;
    /// 0 when no cell qualifies.
    fn scan_variance_mean(&self) -> f32 {
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for c in self.scan.cells() {
            if c.n_points >= 3 {
                sum += c.variance();
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    /// Fuse another elevation raster into the window by UTM lookup.
    ///
    /// Each non-empty source cell is combined into the window cell under
    /// its center coordinate; source cells outside the window are
    /// skipped. Band names must match.
    pub fn merge_grid(&mut self, other: &BandGrid) -> Result<()> {
        other.check_band_names(&Band::NAMES)?;
        let mut merged = 0usize;
        for row in 0..other.height() {
            for col in 0..other.width() {
                let src = cell_from_bands(other, row * other.width() + col);
                if src.is_empty() {
                    continue;
                }
                let (ux, uy) = other.point_pix2utm(col as f64 + 0.5, row as f64 + 0.5);
                let Some(idx) = self.map.index_utm(ux, uy) else {
                    continue;
                };
                self.cells.cells_mut()[idx].merge_from(&src);
                merged += 1;
            }
        }
        if merged > 0 {
            self.map_sync = false;
        }
        log::debug!(
            "fused {} of {} raster cells into the window",
            merged,
            other.width() * other.height()
        );
        Ok(())
    }
}
