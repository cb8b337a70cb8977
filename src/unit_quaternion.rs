//! Unit quaternion type.

use vector3d::Vector3d;

/// A unit quaternion.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug)]
pub struct UnitQuaternion {
    // vector part
    pub x: f64,
    pub y: f64,
    pub z: f64,
    // scalar part
    pub w: f64,
}

impl UnitQuaternion {
    /// The quaternion for a right-handed rotation by `angle` about
    /// `axis`.  The axis need not be normalized, but must not be zero.
    pub fn from_axis_angle(axis: Vector3d<f64>, angle: f64) -> Self {
        let n = axis.norm2().sqrt();
        assert!(n > 0.0, "cannot rotate about a zero-length axis");
        let (s, c) = (0.5 * angle).sin_cos();
        let u = axis * (s / n);
        UnitQuaternion {
            x: u.x,
            y: u.y,
            z: u.z,
            w: c,
        }
    }
    /// The vector part.
    pub fn vector(self) -> Vector3d<f64> {
        Vector3d::new(self.x, self.y, self.z)
    }
}

#[test]
fn axis_angle_gives_unit_norm() {
    let q = UnitQuaternion::from_axis_angle(Vector3d::new(1.0, 2.0, -0.5), 0.7);
    assert!((q.vector().norm2() + q.w * q.w - 1.0).abs() < 1e-15);
    assert!((q.w - 0.35f64.cos()).abs() < 1e-15);
}
