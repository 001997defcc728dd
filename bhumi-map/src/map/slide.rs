//! The window slider.
//!
//! Whenever the robot leaves the central ninth of the window, the window
//! moves one tile toward it: tiles pushed off the 3x3 grid are persisted,
//! the cell array shifts in place, and tiles entering on the leading edge
//! are read back from disk. Order matters: evict before the shift
//! destroys slot contents, update the center before loads so filenames
//! resolve against the new tiling, and flush saves before loads in case a
//! diagonal move re-enters a tile that just left.
//!
//! A slide is not re-entrant and is not rolled back on failure: a failed
//! save surfaces an error but the displaced data still sits in its
//! pre-shift slot, so the in-memory window stays consistent.

use crate::core::Cell;
use crate::error::Result;
use crate::raster::BandGrid;

use super::{fill_cells_from_bands, write_cells_to_bands, ElevationMap};

/// Is `(sx, sy)` one of the nine window slots?
#[inline]
fn on_grid(sx: i32, sy: i32) -> bool {
    (-1..=1).contains(&sx) && (-1..=1).contains(&sy)
}

impl ElevationMap {
    /// Re-center the window on the robot if it left the central square.
    ///
    /// `robx`/`roby` are the robot position in the custom frame. With the
    /// robot inside the central `(0.25, 0.75)²` of normalized window
    /// coordinates this is a no-op and touches no file.
    pub fn slide_to(&mut self, robx: f64, roby: f64) -> Result<()> {
        let (px, py) = self.map.point_custom2pix(robx, roby);
        let cx = px / self.map.width() as f64;
        let cy = py / self.map.height() as f64;
        if cx > 0.25 && cx < 0.75 && cy > 0.25 && cy < 0.75 {
            return Ok(()); // robot is in the center square
        }

        let dx = if cx < 0.33 {
            -1
        } else if cx > 0.66 {
            1
        } else {
            0
        };
        let dy = if cy < 0.33 {
            -1
        } else if cy > 0.66 {
            1
        } else {
            0
        };
        debug_assert!(dx != 0 || dy != 0);
        log::debug!(
            "sliding window by ({}, {}) away from tile {}",
            dx,
            dy,
            self.current
        );

        // scratch raster and cell buffer for tile I/O, scoped to this slide
        let mut scratch = BandGrid::with_meta_of(&self.map, self.sw, self.sh);
        let mut tile_cells = vec![Cell::EMPTY; self.sw * self.sh];

        // evict every tile whose post-shift slot falls off the grid
        for sy in -1..=1 {
            for sx in -1..=1 {
                if !on_grid(sx - dx, sy - dy) {
                    if let Err(e) = self.save_tile(&mut scratch, &mut tile_cells, sx, sy) {
                        log::warn!("tile {} save failed: {}", self.current.offset(sx, sy), e);
                        return Err(e);
                    }
                }
            }
        }

        // shift in place; the trailing band is zeroed completely
        self.cells
            .shift(dx as isize * self.sw as isize, dy as isize * self.sh as isize);

        // the new center, so the loads below resolve the right filenames
        self.current = self.current.offset(dx, dy);

        // paint slots whose pre-shift source was off the grid; misses
        // leave the zeros the shift exposed
        for sy in -1..=1 {
            for sx in -1..=1 {
                if !on_grid(sx + dx, sy + dy) {
                    self.load_tile(sx, sy)?;
                }
            }
        }

        // classification state is window-local and does not survive a move
        self.ground.clear();
        self.vertical.fill(false);

        // re-anchor the affine one tile over, under the pre-slide transform
        let (ux, uy) = self
            .map
            .point_pix2utm(dx as f64 * self.sw as f64, dy as f64 * self.sh as f64);
        let (scale_x, scale_y) = (self.map.scale_x(), self.map.scale_y());
        self.map.set_transform(ux, uy, scale_x, scale_y);
        self.map_sync = false;
        Ok(())
    }

    /// Persist the tile in window slot `(sx, sy)` under its world-tile
    /// name. All-empty tiles are skipped: nothing was ever observed there,
    /// and a zero file would shadow nothing.
    pub(super) fn save_tile(
        &self,
        scratch: &mut BandGrid,
        tile_cells: &mut [Cell],
        sx: i32,
        sy: i32,
    ) -> Result<()> {
        let id = self.current.offset(sx, sy);
        if self.cells.tile_is_empty(sx, sy) {
            log::debug!("tile {} has no observations, skipping save", id);
            return Ok(());
        }
        self.cells.copy_tile(sx, sy, tile_cells);
        write_cells_to_bands(tile_cells, scratch);
        // the tile is georeferenced by its own top-left pixel
        let px0 = (sx + 1) as f64 * self.sw as f64;
        let py0 = (sy + 1) as f64 * self.sh as f64;
        let (ux, uy) = self.map.point_pix2utm(px0, py0);
        scratch.set_transform(ux, uy, self.map.scale_x(), self.map.scale_y());
        self.store.save(scratch, id)?;
        log::debug!("saved tile {}", id);
        Ok(())
    }

    /// Load the world tile for window slot `(sx, sy)` and paint it into
    /// the window. Returns `false` when no file exists (the slot keeps
    /// its zeros).
    pub(super) fn load_tile(&mut self, sx: i32, sy: i32) -> Result<bool> {
        let id = self.current.offset(sx, sy);
        let Some(grid) = self.store.load(id)? else {
            return Ok(false);
        };
        grid.check_band_names(&crate::raster::Band::NAMES)?;
        if grid.width() != self.sw || grid.height() != self.sh {
            return Err(crate::error::Error::Tile {
                path: self.store.path(id),
                message: format!(
                    "tile is {}x{}, window tiles are {}x{}",
                    grid.width(),
                    grid.height(),
                    self.sw,
                    self.sh
                ),
            });
        }
        let mut tile_cells = vec![Cell::EMPTY; self.sw * self.sh];
        fill_cells_from_bands(&grid, &mut tile_cells);
        self.cells.paste_tile(sx, sy, &tile_cells);
        self.map_sync = false;
        log::debug!("loaded tile {}", id);
        Ok(true)
    }

    /// Persist all nine resident tiles (mission-end checkpoint).
    pub fn save_all(&self) -> Result<()> {
        let mut scratch = BandGrid::with_meta_of(&self.map, self.sw, self.sh);
        let mut tile_cells = vec![Cell::EMPTY; self.sw * self.sh];
        for sy in -1..=1 {
            for sx in -1..=1 {
                self.save_tile(&mut scratch, &mut tile_cells, sx, sy)?;
            }
        }
        Ok(())
    }
}
