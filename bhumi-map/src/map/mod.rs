//! The sliding-window elevation map.
//!
//! [`ElevationMap`] owns the 3x3-tile cell window, its georeferenced band
//! mirror, and the dynamic-merge buffers. Feeding it point clouds keeps
//! the window centered on the robot (persisting displaced tiles, loading
//! newly exposed ones) and folds every in-window point into per-cell
//! height statistics.
//!
//! The band mirror is synchronized lazily: merge and slide operations
//! only flip a dirty flag, and [`ElevationMap::grid`] refreshes the six
//! raster bands on demand.

mod merge;
mod slide;

use std::path::Path;

use crate::config::ElevationMapConfig;
use crate::core::{Cell, TimeBase};
use crate::error::{Error, Result};
use crate::grid::CellGrid;
use crate::raster::{export_pgm, load_grid, Band, BandGrid};
use crate::tiles::{TileId, TileStore};

/// A bounded in-memory elevation model that follows the robot.
#[derive(Debug)]
pub struct ElevationMap {
    /// Georeferenced band mirror, refreshed on demand.
    map: BandGrid,
    /// The persistent cell window.
    cells: CellGrid,
    /// Per-scan aggregation scratch (dynamic mode).
    scan: CellGrid,
    /// Cached flat-ground state for cells currently covered by obstacles.
    ground: CellGrid,
    /// Current flat/vertical classification per cell.
    vertical: Vec<bool>,
    /// World-tile coordinates of the central tile.
    current: TileId,
    /// True while the band mirror matches the cell window.
    map_sync: bool,
    /// Tile width in pixels (window width / 3).
    sw: usize,
    /// Tile height in pixels (window height / 3).
    sh: usize,
    /// Use the dynamic merge policy instead of plain accumulation.
    dynamic: bool,
    /// Multiplier on the scan's mean variance for the vertical threshold.
    variance_factor: f32,
    /// Tile persistence.
    store: TileStore,
    /// Monotonic time base for `last_update` stamps.
    time: TimeBase,
}

impl ElevationMap {
    /// Create a map from configuration and resume any tiles a previous
    /// session persisted around the same origin.
    ///
    /// Pixel dimensions are rounded up to a multiple of 3 so the window
    /// is always exactly three tiles by three tiles.
    pub fn new(config: &ElevationMapConfig) -> Result<Self> {
        config.validate()?;
        let width = round_up_to_3((config.size_x / config.scale).ceil() as usize);
        let height = round_up_to_3((config.size_y / config.scale).ceil() as usize);

        let mut map = BandGrid::new();
        map.set_size(Band::COUNT, width, height);
        map.set_band_names(&Band::NAMES);
        map.set_transform(config.utm_x, config.utm_y, config.scale, -config.scale);
        map.set_custom_origin(config.custom_x, config.custom_y);
        map.set_utm(config.utm_zone, config.utm_north);

        let mut dem = Self {
            map,
            cells: CellGrid::new(width, height),
            scan: CellGrid::new(width, height),
            ground: CellGrid::new(width, height),
            vertical: vec![false; width * height],
            current: TileId::default(),
            map_sync: true,
            sw: width / 3,
            sh: height / 3,
            dynamic: config.dynamic_merge,
            variance_factor: config.variance_factor,
            store: TileStore::new(&config.tile_dir),
            time: TimeBase::now(),
        };
        // resume from tiles persisted by an earlier session, if any
        for sy in -1..=1 {
            for sx in -1..=1 {
                dem.load_tile(sx, sy)?;
            }
        }
        Ok(dem)
    }

    /// Re-open a map from a raster previously produced by this crate
    /// (a persisted tile or a full exported window).
    pub fn from_file(path: &Path, tile_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let grid = load_grid(path)?;
        Self::from_grid(grid, tile_dir)
    }

    /// Adopt an existing raster as the window.
    ///
    /// The raster's dimensions must split into 3x3 tiles (multiples of 3
    /// on both axes). Dynamic merging starts disabled; enable it with
    /// [`ElevationMap::set_dynamic_merge`] if the map will keep growing.
    pub fn from_grid(map: BandGrid, tile_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        map.check_band_names(&Band::NAMES)?;
        let width = map.width();
        let height = map.height();
        if width % 3 != 0 || height % 3 != 0 {
            return Err(Error::InvalidFormat(format!(
                "raster {}x{} is not tile-aligned (dimensions must be multiples of 3)",
                width, height
            )));
        }
        let mut cells = CellGrid::new(width, height);
        fill_cells_from_bands(&map, cells.cells_mut());
        Ok(Self {
            map,
            cells,
            scan: CellGrid::new(width, height),
            ground: CellGrid::new(width, height),
            vertical: vec![false; width * height],
            current: TileId::default(),
            map_sync: true,
            sw: width / 3,
            sh: height / 3,
            dynamic: false,
            variance_factor: ElevationMapConfig::default().variance_factor,
            store: TileStore::new(tile_dir),
            time: TimeBase::now(),
        })
    }

    /// The band mirror, refreshed if any cell changed since the last call.
    pub fn grid(&mut self) -> &BandGrid {
        if !self.map_sync {
            write_cells_to_bands(self.cells.cells(), &mut self.map);
            self.map_sync = true;
        }
        &self.map
    }

    /// The band mirror as-is, possibly stale.
    pub fn grid_unsynced(&self) -> &BandGrid {
        &self.map
    }

    /// True while the band mirror matches the cell window.
    pub fn is_synced(&self) -> bool {
        self.map_sync
    }

    /// The aggregated cells, row-major.
    pub fn cells(&self) -> &[Cell] {
        self.cells.cells()
    }

    /// The cell under a custom-frame coordinate, or `None` outside the
    /// window.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<&Cell> {
        self.map
            .index_custom(x, y)
            .map(|idx| &self.cells.cells()[idx])
    }

    /// World-tile coordinates of the central tile.
    pub fn current_tile(&self) -> TileId {
        self.current
    }

    /// Window width in pixels.
    pub fn width(&self) -> usize {
        self.cells.width()
    }

    /// Window height in pixels.
    pub fn height(&self) -> usize {
        self.cells.height()
    }

    /// Tile dimensions `(sw, sh)` in pixels.
    pub fn tile_dims(&self) -> (usize, usize) {
        (self.sw, self.sh)
    }

    /// Change the vertical-classification threshold multiplier.
    pub fn set_variance_factor(&mut self, factor: f32) {
        self.variance_factor = factor;
    }

    /// Switch between dynamic reconciliation and plain accumulation.
    pub fn set_dynamic_merge(&mut self, dynamic: bool) {
        self.dynamic = dynamic;
    }

    /// Export the mean-height band as an 8-bit grayscale PGM image.
    pub fn export_mean_pgm(&mut self, path: &Path) -> Result<()> {
        self.grid();
        export_pgm(&self.map, path, Band::ZMean.index())
    }
}

/// Next multiple of 3 at or above `n` (minimum 3).
fn round_up_to_3(n: usize) -> usize {
    n.max(1).div_ceil(3) * 3
}

/// Mirror cell statistics into the six elevation bands.
///
/// The `VARIANCE` band receives the finalized variance; consumers of the
/// raster never see the running M2.
pub(crate) fn write_cells_to_bands(cells: &[Cell], grid: &mut BandGrid) {
    debug_assert_eq!(cells.len(), grid.width() * grid.height());
    for (v, c) in grid.band_mut(Band::NPoints.index()).iter_mut().zip(cells) {
        *v = c.n_points as f32;
    }
    for (v, c) in grid.band_mut(Band::ZMax.index()).iter_mut().zip(cells) {
        *v = c.z_max;
    }
    for (v, c) in grid.band_mut(Band::ZMin.index()).iter_mut().zip(cells) {
        *v = c.z_min;
    }
    for (v, c) in grid.band_mut(Band::ZMean.index()).iter_mut().zip(cells) {
        *v = c.z_mean;
    }
    for (v, c) in grid.band_mut(Band::Variance.index()).iter_mut().zip(cells) {
        *v = c.variance();
    }
    for (v, c) in grid
        .band_mut(Band::LastUpdate.index())
        .iter_mut()
        .zip(cells)
    {
        *v = c.last_update;
    }
}

/// Rebuild cell statistics from the six elevation bands.
pub(crate) fn fill_cells_from_bands(grid: &BandGrid, cells: &mut [Cell]) {
    debug_assert_eq!(cells.len(), grid.width() * grid.height());
    for (idx, cell) in cells.iter_mut().enumerate() {
        *cell = cell_from_bands(grid, idx);
    }
}

/// One cell's statistics from the bands at `idx`.
pub(crate) fn cell_from_bands(grid: &BandGrid, idx: usize) -> Cell {
    let n_points = grid.band(Band::NPoints.index())[idx] as u32;
    if n_points == 0 {
        return Cell::EMPTY;
    }
    let variance = grid.band(Band::Variance.index())[idx];
    Cell {
        n_points,
        z_max: grid.band(Band::ZMax.index())[idx],
        z_min: grid.band(Band::ZMin.index())[idx],
        z_mean: grid.band(Band::ZMean.index())[idx],
        m2: if n_points >= 2 {
            variance * (n_points - 1) as f32
        } else {
            0.0
        },
        last_update: grid.band(Band::LastUpdate.index())[idx],
    }
}

/// Small-window config shared by the unit tests of this module tree.
///
/// 0.9 m x 0.9 m at 0.1 m/px: a 9x9 window of 3x3-pixel tiles. The custom
/// origin sits at the window center, so custom (0, 0) is pixel (4.5, 4.5)
/// and the robot starts centered.
#[cfg(test)]
pub(crate) fn test_config(dir: &Path) -> ElevationMapConfig {
    ElevationMapConfig {
        size_x: 0.9,
        size_y: 0.9,
        scale: 0.1,
        utm_x: 0.0,
        utm_y: 0.0,
        custom_x: 0.45,
        custom_y: -0.45,
        dynamic_merge: false,
        tile_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_three_by_three_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let dem = ElevationMap::new(&test_config(dir.path())).unwrap();
        assert_eq!(dem.width(), 9);
        assert_eq!(dem.height(), 9);
        assert_eq!(dem.tile_dims(), (3, 3));
        assert_eq!(dem.current_tile(), TileId::new(0, 0));
        assert!(dem.is_synced());
    }

    #[test]
    fn test_dimensions_round_up_to_tile_multiple() {
        assert_eq!(round_up_to_3(9), 9);
        assert_eq!(round_up_to_3(10), 12);
        assert_eq!(round_up_to_3(1), 3);

        let dir = tempfile::tempdir().unwrap();
        let config = ElevationMapConfig {
            size_x: 1.0, // ceil(1.0 / 0.1) = 10 -> 12
            ..test_config(dir.path())
        };
        let dem = ElevationMap::new(&config).unwrap();
        assert_eq!(dem.width(), 12);
        assert_eq!(dem.tile_dims().0, 4);
    }

    #[test]
    fn test_cell_at_center_and_outside() {
        let dir = tempfile::tempdir().unwrap();
        let dem = ElevationMap::new(&test_config(dir.path())).unwrap();
        assert!(dem.cell_at(0.0, 0.0).unwrap().is_empty());
        assert!(dem.cell_at(10.0, 0.0).is_none());
    }

    #[test]
    fn test_bands_round_trip_through_cells() {
        let mut grid = BandGrid::new();
        grid.set_size(Band::COUNT, 3, 3);
        grid.set_band_names(&Band::NAMES);
        let mut cells = vec![Cell::EMPTY; 9];
        cells[4].add_sample(1.0);
        cells[4].add_sample(3.0);
        cells[4].add_sample(2.0);
        cells[4].last_update = 12.5;
        write_cells_to_bands(&cells, &mut grid);
        assert_eq!(grid.band(Band::NPoints.index())[4], 3.0);
        assert_eq!(grid.band(Band::Variance.index())[4], 1.0);

        let mut back = vec![Cell::EMPTY; 9];
        fill_cells_from_bands(&grid, &mut back);
        assert_eq!(back[4].n_points, 3);
        assert_eq!(back[4].z_min, 1.0);
        assert_eq!(back[4].z_max, 3.0);
        assert_eq!(back[4].z_mean, 2.0);
        assert_eq!(back[4].last_update, 12.5);
        assert!((back[4].variance() - 1.0).abs() < 1e-6);
        // untouched cells stay absent
        assert!(back[0].is_empty());
    }

    #[test]
    fn test_from_grid_rejects_foreign_bands() {
        let mut grid = BandGrid::new();
        grid.set_size(2, 3, 3);
        grid.set_band_names(&["RED", "GREEN"]);
        assert!(matches!(
            ElevationMap::from_grid(grid, "."),
            Err(crate::error::Error::BandMismatch { .. })
        ));
    }

    #[test]
    fn test_from_grid_rejects_unaligned_dimensions() {
        // 4x4 cannot split into 3x3 tiles; the eastmost column would
        // belong to no tile and slides would miscenter
        let mut grid = BandGrid::new();
        grid.set_size(Band::COUNT, 4, 4);
        grid.set_band_names(&Band::NAMES);
        assert!(matches!(
            ElevationMap::from_grid(grid, "."),
            Err(crate::error::Error::InvalidFormat(_))
        ));
    }
}
