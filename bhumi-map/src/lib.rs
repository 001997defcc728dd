//! # Bhumi-Map: Sliding-Window 2.5D Elevation Mapping
//!
//! An unbounded digital elevation model for outdoor robots streaming
//! LiDAR point clouds. The world is tiled into fixed-size georeferenced
//! sub-maps persisted on disk; a 3x3-tile in-memory window follows the
//! robot, so memory stays bounded no matter how long the mission runs.
//!
//! ## Features
//!
//! - **Bounded memory**: only nine tiles are ever resident; displaced
//!   tiles are written to disk and re-entered tiles are read back
//! - **Streaming statistics**: each cell keeps count/min/max/mean/spread
//!   of height, folded in one pass (Welford) and fusable after the fact
//!   (Chan), so accumulation order never matters
//! - **Transient-obstacle robustness**: an optional dynamic merge policy
//!   classifies cells as flat ground or vertical obstacle per scan and
//!   caches the ground under obstacles, so a passing pedestrian does not
//!   leave a permanent hole in the terrain
//! - **Georeferenced I/O**: tiles carry a pixel-to-UTM affine and named
//!   f32 bands in a compact little-endian format
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bhumi_map::{ElevationMap, ElevationMapConfig, PointCloud, Point3, Transform};
//!
//! let config = ElevationMapConfig {
//!     utm_x: 377_016.0,
//!     utm_y: 4_824_425.0,
//!     custom_x: 377_061.0,
//!     custom_y: 4_824_380.0,
//!     tile_dir: "/var/lib/dem".into(),
//!     ..Default::default()
//! };
//! let mut dem = ElevationMap::new(&config)?;
//!
//! // per scan: cloud in the sensor frame + sensor-to-world transform
//! let mut cloud = PointCloud::from_points(&[Point3::new(1.0, 0.0, 0.2)]);
//! let sensor_to_world = Transform::IDENTITY;
//! dem.merge_cloud(&mut cloud, &sensor_to_world)?;
//!
//! // mission end: flush every resident tile
//! dem.save_all()?;
//! # Ok::<(), bhumi_map::Error>(())
//! ```
//!
//! ## Data Flow
//!
//! ```text
//!   LiDAR scan (sensor frame)
//!        │ transform (drop non-finite)
//!        ▼
//!   PointCloud (custom frame) ──► slide_to(robot) ──► tile store
//!        │                           window follows     (evict/load)
//!        ▼
//!   static: fold into cells     dynamic: scan buffer ──► classify
//!        │                           │   flat / vertical, reconcile
//!        ▼                           ▼   with ground cache
//!   cell window (3x3 tiles) ──► band mirror (on demand) ──► raster
//! ```
//!
//! ## Concurrency
//!
//! The core is single-threaded and cooperatively serial: each cloud is
//! one transform → slide → aggregate transaction, and nothing suspends
//! mid-transaction. To parallelize, pre-transform clouds on a worker
//! thread and hand them to the owning thread; the window and its
//! companion buffers have no internal lock.

pub mod config;
pub mod core;
pub mod error;
pub mod grid;
pub mod map;
pub mod raster;
pub mod tiles;

// Re-export main types at crate root
pub use config::ElevationMapConfig;
pub use core::{Cell, Point3, PointCloud, Pose6D, TimeBase, Transform};
pub use error::{Error, Result};
pub use map::ElevationMap;
pub use raster::{Band, BandGrid};
pub use tiles::{TileId, TileStore};
