//! Rigid-body transforms between the sensor frame and the custom frame.

use serde::{Deserialize, Serialize};

use super::point::{Point3, PointCloud};

/// Row-major 3x4 affine transform (rotation + translation, implicit
/// homogeneous 1). Double precision: the translation part carries
/// georeferenced magnitudes that f32 would truncate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    m: [f64; 12],
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Transform = Transform {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        ],
    };

    /// Build from the first three rows of a row-major 4x4 matrix.
    pub fn from_rows(m: [f64; 12]) -> Self {
        Self { m }
    }

    /// A pure translation.
    pub fn translation_only(x: f64, y: f64, z: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.m[3] = x;
        t.m[7] = y;
        t.m[11] = z;
        t
    }

    /// Apply to a single point.
    #[inline]
    pub fn apply(&self, p: Point3) -> Point3 {
        let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);
        let m = &self.m;
        Point3::new(
            (m[0] * x + m[1] * y + m[2] * z + m[3]) as f32,
            (m[4] * x + m[5] * y + m[6] * z + m[7]) as f32,
            (m[8] * x + m[9] * y + m[10] * z + m[11]) as f32,
        )
    }

    /// Translation components `(x, y)`: the sensor position in the
    /// target frame.
    #[inline]
    pub fn translation(&self) -> (f64, f64) {
        (self.m[3], self.m[7])
    }

    /// Build from a yaw/pitch/roll pose (ZYX convention).
    pub fn from_pose(pose: &Pose6D) -> Self {
        let (sa, ca) = pose.yaw.sin_cos();
        let (sb, cb) = pose.pitch.sin_cos();
        let (sg, cg) = pose.roll.sin_cos();
        Self {
            m: [
                ca * cb,
                ca * sb * sg - sa * cg,
                ca * sb * cg + sa * sg,
                pose.x,
                sa * cb,
                sa * sb * sg + ca * cg,
                sa * sb * cg - ca * sg,
                pose.y,
                -sb,
                cb * sg,
                cb * cg,
                pose.z,
            ],
        }
    }

    /// Recover the yaw/pitch/roll pose (ZYX convention).
    pub fn to_pose(&self) -> Pose6D {
        let m = &self.m;
        let d = (m[0] * m[0] + m[4] * m[4]).sqrt();
        let (yaw, roll) = if d.abs() > 1e-10 {
            (m[4].atan2(m[0]), m[9].atan2(m[10]))
        } else {
            ((-m[1]).atan2(m[5]), 0.0)
        };
        Pose6D {
            yaw,
            pitch: (-m[8]).atan2(d),
            roll,
            x: m[3],
            y: m[7],
            z: m[11],
        }
    }
}

/// A 6-DOF pose: yaw/pitch/roll in radians, position in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose6D {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pose6D {
    /// Create a pose from angles and position.
    pub fn new(yaw: f64, pitch: f64, roll: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            yaw,
            pitch,
            roll,
            x,
            y,
            z,
        }
    }
}

impl PointCloud {
    /// Transform every point in place and drop points whose transformed
    /// coordinates are not finite. Numeric garbage is discarded here, at
    /// the frame boundary, so the aggregation stages never see it.
    pub fn transform(&mut self, tr: &Transform) {
        for p in &mut self.points {
            *p = tr.apply(*p);
        }
        self.points.retain(|p| p.is_finite());
    }
}
