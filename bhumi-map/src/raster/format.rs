//! Native binary format for band-grid persistence.
//!
//! Layout, all integers and floats little-endian:
//! - Magic: `"BHUMI"` (5 bytes)
//! - Version: u8
//! - Width: u32, Height: u32, Band count: u16
//! - Geotransform: origin_x, origin_y, scale_x, scale_y (4 x f64)
//! - Custom origin: custom_x, custom_y (2 x f64)
//! - UTM zone: u8, north flag: u8
//! - Band names: per band, u16 length + UTF-8 bytes
//! - Band data: per band, width * height f32, row-major
//!
//! f32 pixels round-trip bit-exact, which the tile store relies on.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

use super::BandGrid;

/// Magic bytes identifying a bhumi raster file.
const MAGIC: &[u8; 5] = b"BHUMI";

/// Current format version.
const VERSION: u8 = 1;

/// Write a grid to disk.
pub fn save_grid(grid: &BandGrid, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    w.write_all(MAGIC)?;
    w.write_all(&[VERSION])?;
    w.write_all(&(grid.width() as u32).to_le_bytes())?;
    w.write_all(&(grid.height() as u32).to_le_bytes())?;
    w.write_all(&(grid.n_bands() as u16).to_le_bytes())?;

    let (origin_x, origin_y) = grid.origin_utm();
    let (custom_x, custom_y) = grid.custom_origin();
    for v in [
        origin_x,
        origin_y,
        grid.scale_x(),
        grid.scale_y(),
        custom_x,
        custom_y,
    ] {
        w.write_all(&v.to_le_bytes())?;
    }
    let (zone, north) = grid.utm_zone();
    w.write_all(&[zone, north as u8])?;

    for name in grid.band_names() {
        let bytes = name.as_bytes();
        w.write_all(&(bytes.len() as u16).to_le_bytes())?;
        w.write_all(bytes)?;
    }

    for i in 0..grid.n_bands() {
        for v in grid.band(i) {
            w.write_all(&v.to_le_bytes())?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Read a grid from disk.
pub fn load_grid(path: &Path) -> Result<BandGrid> {
    let file = File::open(path)?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 5];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::InvalidFormat("bad magic bytes".into()));
    }
    let version = read_u8(&mut r)?;
    if version != VERSION {
        return Err(Error::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }

    let width = read_u32(&mut r)? as usize;
    let height = read_u32(&mut r)? as usize;
    let n_bands = read_u16(&mut r)? as usize;
    if n_bands == 0 || width == 0 || height == 0 {
        return Err(Error::InvalidFormat(format!(
            "degenerate grid: {}x{} with {} bands",
            width, height, n_bands
        )));
    }

    let origin_x = read_f64(&mut r)?;
    let origin_y = read_f64(&mut r)?;
    let scale_x = read_f64(&mut r)?;
    let scale_y = read_f64(&mut r)?;
    let custom_x = read_f64(&mut r)?;
    let custom_y = read_f64(&mut r)?;
    let zone = read_u8(&mut r)?;
    let north = read_u8(&mut r)? != 0;

    let mut names = Vec::with_capacity(n_bands);
    for _ in 0..n_bands {
        let len = read_u16(&mut r)? as usize;
        let mut buf = vec![0u8; len];
        r.read_exact(&mut buf)?;
        let name = String::from_utf8(buf)
            .map_err(|_| Error::InvalidFormat("band name is not UTF-8".into()))?;
        names.push(name);
    }

    let mut grid = BandGrid::new();
    grid.set_size(n_bands, width, height);
    grid.set_transform(origin_x, origin_y, scale_x, scale_y);
    grid.set_custom_origin(custom_x, custom_y);
    grid.set_utm(zone, north);
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    grid.set_band_names(&name_refs);

    let mut buf = vec![0u8; width * height * 4];
    for i in 0..n_bands {
        r.read_exact(&mut buf)?;
        let band = grid.band_mut(i);
        for (pix, chunk) in band.iter_mut().zip(buf.chunks_exact(4)) {
            *pix = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
    }
    Ok(grid)
}

/// Export one band as an 8-bit grayscale PGM image (for display).
///
/// Pixel values are normalized over the band's finite range; a flat band
/// renders black.
pub fn export_pgm(grid: &BandGrid, path: &Path, band: usize) -> Result<()> {
    let data = grid.band(band);
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in data {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    let span = hi - lo;
    let pixels: Vec<u8> = data
        .iter()
        .map(|&v| {
            if !v.is_finite() || span <= 0.0 {
                0
            } else {
                (((v - lo) / span) * 255.0) as u8
            }
        })
        .collect();

    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    writeln!(w, "P5")?;
    writeln!(w, "{} {}", grid.width(), grid.height())?;
    writeln!(w, "255")?;
    w.write_all(&pixels)?;
    w.flush()?;
    Ok(())
}

fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_f64<R: Read>(r: &mut R) -> Result<f64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(f64::from_le_bytes(b))
}
