//! End-to-end dynamic merge scenarios: transient obstacles must not
//! leave permanent holes in the terrain model.

use std::path::Path;

use bhumi_map::{ElevationMap, ElevationMapConfig, Point3, PointCloud, Transform};

/// Same 9x9 window as the sliding tests, dynamic mode on.
fn dynamic_config(dir: &Path) -> ElevationMapConfig {
    ElevationMapConfig {
        size_x: 0.9,
        size_y: 0.9,
        scale: 0.1,
        utm_x: 0.0,
        utm_y: 0.0,
        custom_x: 0.45,
        custom_y: -0.45,
        dynamic_merge: true,
        variance_factor: 3.0,
        tile_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

/// Ten near-planar samples: 0.000, 0.001, ... 0.009.
fn flat_heights() -> Vec<f32> {
    (0..10).map(|i| i as f32 * 0.001).collect()
}

/// Ten samples spanning 4.5 m of vertical extent.
fn tall_heights() -> Vec<f32> {
    (0..10).map(|i| i as f32 * 0.5).collect()
}

fn push_column(cloud: &mut PointCloud, x: f32, y: f32, zs: &[f32]) {
    for &z in zs {
        cloud.push(Point3::new(x, y, z));
    }
}

/// A scan with a column of samples at the target cell plus flat ground
/// context in the neighboring cells, the way a real scan sweeps terrain
/// around whatever it hits.
fn scan_with_context(target_zs: &[f32]) -> PointCloud {
    let mut cloud = PointCloud::new();
    push_column(&mut cloud, 0.0, 0.0, target_zs);
    for (x, y) in [(0.1, 0.0), (-0.1, 0.0), (0.0, 0.1), (0.0, -0.1), (0.2, 0.0)] {
        push_column(&mut cloud, x, y, &flat_heights());
    }
    cloud
}

#[test]
fn test_obstacle_appears_then_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let mut dem = ElevationMap::new(&dynamic_config(dir.path())).unwrap();

    // scan 1: flat ground at the target cell
    let mut cloud = PointCloud::new();
    push_column(&mut cloud, 0.0, 0.0, &flat_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();
    let ground = *dem.cell_at(0.0, 0.0).unwrap();
    assert_eq!(ground.n_points, 10);
    assert!(ground.z_max <= 0.01);

    // scan 2: something tall parks on the cell; its single-scan variance
    // stands far above the scan's mean, so the cell flips to vertical
    // and the scan replaces (not augments) the cell
    let mut cloud = scan_with_context(&tall_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();
    let obstacle = *dem.cell_at(0.0, 0.0).unwrap();
    assert_eq!(obstacle.n_points, 10, "vertical scan replaces the cell");
    assert_eq!(obstacle.z_max, 4.5);

    // scan 3: the obstacle is gone; the cached ground comes back and the
    // new flat scan merges into it
    let mut cloud = PointCloud::new();
    push_column(&mut cloud, 0.0, 0.0, &flat_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();
    let restored = *dem.cell_at(0.0, 0.0).unwrap();
    assert_eq!(restored.n_points, 20, "ground plus the new flat scan");
    assert!(
        restored.z_max <= 0.01,
        "no trace of the obstacle may remain, got z_max {}",
        restored.z_max
    );
}

#[test]
fn test_same_class_scans_accumulate() {
    let dir = tempfile::tempdir().unwrap();
    let mut dem = ElevationMap::new(&dynamic_config(dir.path())).unwrap();

    for _ in 0..3 {
        let mut cloud = PointCloud::new();
        push_column(&mut cloud, 0.0, 0.0, &flat_heights());
        dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();
    }
    let cell = dem.cell_at(0.0, 0.0).unwrap();
    assert_eq!(cell.n_points, 30);
    assert!(cell.z_max <= 0.01);
}

#[test]
fn test_persistent_obstacle_accumulates_as_vertical() {
    let dir = tempfile::tempdir().unwrap();
    let mut dem = ElevationMap::new(&dynamic_config(dir.path())).unwrap();

    // ground first, then the same obstacle seen twice
    let mut cloud = PointCloud::new();
    push_column(&mut cloud, 0.0, 0.0, &flat_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();

    let mut cloud = scan_with_context(&tall_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();
    let mut cloud = scan_with_context(&tall_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();

    // second vertical scan merges into the first instead of replacing it
    let cell = dem.cell_at(0.0, 0.0).unwrap();
    assert_eq!(cell.n_points, 20);
    assert_eq!(cell.z_max, 4.5);
}

#[test]
fn test_context_cells_stay_flat() {
    let dir = tempfile::tempdir().unwrap();
    let mut dem = ElevationMap::new(&dynamic_config(dir.path())).unwrap();

    let mut cloud = scan_with_context(&tall_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();

    // the flat context around the obstacle is adopted as ground
    let cell = dem.cell_at(0.1, 0.0).unwrap();
    assert_eq!(cell.n_points, 10);
    assert!(cell.z_max <= 0.01);
}

#[test]
fn test_timestamps_advance_on_touched_cells() {
    let dir = tempfile::tempdir().unwrap();
    let mut dem = ElevationMap::new(&dynamic_config(dir.path())).unwrap();

    let mut cloud = PointCloud::new();
    push_column(&mut cloud, 0.0, 0.0, &flat_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();
    let first = dem.cell_at(0.0, 0.0).unwrap().last_update;

    std::thread::sleep(std::time::Duration::from_millis(5));
    let mut cloud = PointCloud::new();
    push_column(&mut cloud, 0.0, 0.0, &flat_heights());
    dem.merge_cloud(&mut cloud, &Transform::IDENTITY).unwrap();
    let second = dem.cell_at(0.0, 0.0).unwrap().last_update;

    assert!(second > first);
}
