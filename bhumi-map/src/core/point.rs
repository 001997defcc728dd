//! Point and point-cloud types.

use serde::{Deserialize, Serialize};

/// A 3D point in meters (sensor or custom frame).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate in meters.
    pub x: f32,
    /// Y coordinate in meters.
    pub y: f32,
    /// Z coordinate (height) in meters.
    pub z: f32,
}

impl Point3 {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// All three coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A LiDAR point cloud.
///
/// Owned storage so transforms can run in place; one scan is typically
/// tens of thousands of points, so re-allocating per scan is avoided.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    /// The points, in whatever frame the producer filled them in.
    pub points: Vec<Point3>,
}

impl PointCloud {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cloud from a point slice.
    pub fn from_points(points: &[Point3]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the cloud holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a point.
    #[inline]
    pub fn push(&mut self, p: Point3) {
        self.points.push(p);
    }
}
