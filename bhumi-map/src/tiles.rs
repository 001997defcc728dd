//! Tile addressing and on-disk tile storage.
//!
//! The world is tiled into fixed-size sub-maps addressed by signed integer
//! coordinates. A tile's filename is derived from those two integers only,
//! so any session that anchors the same UTM origin finds the same files.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raster::{load_grid, save_grid, BandGrid};

/// World-tile coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId {
    /// Tile column in the world tiling.
    pub x: i32,
    /// Tile row in the world tiling.
    pub y: i32,
}

impl TileId {
    /// Create a tile id.
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile `(dx, dy)` away.
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Filename of a persisted tile.
pub fn tile_filename(id: TileId) -> String {
    format!("dem.{}.bhumi", id)
}

/// Loads and saves one tile-sized [`BandGrid`] per world tile, under a
/// fixed directory. The store borrows grids for the duration of one call
/// and retains nothing.
#[derive(Clone, Debug)]
pub struct TileStore {
    dir: PathBuf,
}

impl TileStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a tile is persisted under.
    pub fn path(&self, id: TileId) -> PathBuf {
        self.dir.join(tile_filename(id))
    }

    /// True if a file exists for this tile.
    pub fn exists(&self, id: TileId) -> bool {
        self.path(id).exists()
    }

    /// Load a tile. A missing file is not an error: the region simply has
    /// never been mapped, and the caller leaves it zeroed.
    pub fn load(&self, id: TileId) -> Result<Option<BandGrid>> {
        let path = self.path(id);
        if !path.exists() {
            return Ok(None);
        }
        load_grid(&path).map(Some)
    }

    /// Persist a tile, creating the store directory if needed.
    pub fn save(&self, grid: &BandGrid, id: TileId) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }
        save_grid(grid, &self.path(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Band;

    #[test]
    fn test_filename_carries_signed_coords() {
        assert_eq!(tile_filename(TileId::new(-3, 12)), "dem.-3x12.bhumi");
        assert_eq!(tile_filename(TileId::new(0, 0)), "dem.0x0.bhumi");
    }

    #[test]
    fn test_missing_tile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileStore::new(dir.path());
        assert!(!store.exists(TileId::new(5, 5)));
        assert!(store.load(TileId::new(5, 5)).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileStore::new(dir.path().join("tiles"));
        let mut grid = BandGrid::new();
        grid.set_size(Band::COUNT, 4, 4);
        grid.set_band_names(&Band::NAMES);
        grid.band_mut(Band::ZMean.index())[5] = 1.5;
        let id = TileId::new(-1, 2);
        store.save(&grid, id).unwrap();
        assert!(store.exists(id));
        let back = store.load(id).unwrap().unwrap();
        assert_eq!(back.band(Band::ZMean.index())[5], 1.5);
    }
}
