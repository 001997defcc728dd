//! Configuration for the elevation map.
//!
//! All parameters have defaults sized for a vehicle-mounted Velodyne-class
//! sensor: a 90 m x 90 m window at 0.1 m/pixel, three times the useful
//! sensor range, so a full scan always lands inside the window.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Elevation map configuration, loadable from YAML.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationMapConfig {
    /// Window width in meters. Default: 90.
    pub size_x: f64,

    /// Window height in meters. Default: 90.
    pub size_y: f64,

    /// Pixel size in meters. Default: 0.1.
    pub scale: f64,

    /// UTM easting of the custom-frame origin, meters.
    pub custom_x: f64,

    /// UTM northing of the custom-frame origin, meters.
    pub custom_y: f64,

    /// UTM easting of the window origin (top-left pixel), meters.
    pub utm_x: f64,

    /// UTM northing of the window origin (top-left pixel), meters.
    pub utm_y: f64,

    /// UTM zone number.
    pub utm_zone: u8,

    /// True in the northern hemisphere.
    pub utm_north: bool,

    /// Classify cells as flat/vertical per scan and reconcile against the
    /// ground cache, instead of accumulating every sample forever.
    /// Default: true.
    pub dynamic_merge: bool,

    /// Multiplier on the scan's mean cell variance used as the
    /// flat-vs-vertical threshold. Higher values tolerate rougher ground
    /// before a cell is declared vertical; 4-10 suits broken terrain.
    /// Default: 3.0.
    pub variance_factor: f32,

    /// Directory tile files are persisted under. Default: `"."`.
    pub tile_dir: PathBuf,
}

impl Default for ElevationMapConfig {
    fn default() -> Self {
        Self {
            size_x: 90.0,
            size_y: 90.0,
            scale: 0.1,
            custom_x: 0.0,
            custom_y: 0.0,
            utm_x: 0.0,
            utm_y: 0.0,
            utm_zone: 0,
            utm_north: true,
            dynamic_merge: true,
            variance_factor: 3.0,
            tile_dir: PathBuf::from("."),
        }
    }
}

impl ElevationMapConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Sanity-check the geometry.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale > 0.0) {
            return Err(Error::Config(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.size_x < 3.0 * self.scale || self.size_y < 3.0 * self.scale {
            return Err(Error::Config(format!(
                "window {}x{} m too small for 3x3 tiles at {} m/px",
                self.size_x, self.size_y, self.scale
            )));
        }
        if !(self.variance_factor > 0.0) {
            return Err(Error::Config(format!(
                "variance_factor must be positive, got {}",
                self.variance_factor
            )));
        }
        Ok(())
    }
}
