//! Error types for bhumi-map
//!
//! # Error Recovery Strategies
//!
//! Different error types require different recovery approaches:
//!
//! ## Fatal Errors (Fix and Re-initialize)
//!
//! - **`BandMismatch`**: A raster was opened whose band names do not match
//!   the elevation band list. The file is not an elevation map produced by
//!   this crate (or it predates a band-layout change). Re-generate the map.
//!
//! - **`VersionMismatch`** / **`InvalidFormat`**: The tile file on disk is
//!   corrupt or was written by an incompatible version. The in-memory map
//!   is untouched; the affected window region stays zeroed.
//!
//! ## Transient Errors (Retry Recommended)
//!
//! - **`Io`**: Generic file I/O failure during a tile save or load. The
//!   window keeps its in-memory state; only durability for the affected
//!   tile is lost. The caller owns the retry policy.
//!
//! ## Configuration Errors (Fix and Restart)
//!
//! - **`Config`** / **`Yaml`**: The configuration file is invalid.
//!
//! Per-point conditions are never errors: samples that fall outside the
//! window are dropped silently, and points with non-finite coordinates are
//! discarded at the transform stage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in bhumi-map
///
/// See module-level documentation for recovery strategies.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("band names mismatch: expected {expected:?}, found {found:?}")]
    BandMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("tile {path:?}: {message}")]
    Tile { path: PathBuf, message: String },

    #[error("invalid raster format: {0}")]
    InvalidFormat(String),

    #[error("raster format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u8, found: u8 },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
