//! 3D rotation type.

use crate::unit_quaternion::UnitQuaternion;
use vector3d::Vector3d;

/// 3D rotation.
#[derive(Copy, Clone, Debug)]
pub struct Rotation {
    /// The underlying quaternion.
    pub q: UnitQuaternion,
}

impl Rotation {
    /// A right-handed rotation by `angle` radians about `axis`.
    pub fn about_axis(axis: Vector3d<f64>, angle: f64) -> Self {
        Rotation {
            q: UnitQuaternion::from_axis_angle(axis, angle),
        }
    }
}

impl std::ops::Mul<Vector3d<f64>> for Rotation {
    type Output = Vector3d<f64>;
    fn mul(self, v: Vector3d<f64>) -> Vector3d<f64> {
        // https://gamedev.stackexchange.com/a/50545
        let u = self.q.vector();
        let s = self.q.w;
        u * (u.dot(v) * 2.0) + v * (s * s - u.norm2()) + u.cross(v) * (s * 2.0)
    }
}

#[cfg(test)]
fn close(a: Vector3d<f64>, b: Vector3d<f64>) -> bool {
    (a - b).norm2() < 1e-24
}

#[test]
fn quarter_turn_about_z() {
    let r = Rotation::about_axis(Vector3d::new(0.0, 0.0, 2.0), 0.5 * std::f64::consts::PI);
    assert!(close(r * Vector3d::new(1.0, 0.0, 0.0), Vector3d::new(0.0, 1.0, 0.0)));
    assert!(close(r * Vector3d::new(0.0, 1.0, 0.0), Vector3d::new(-1.0, 0.0, 0.0)));
    assert!(close(r * Vector3d::new(0.0, 0.0, 1.0), Vector3d::new(0.0, 0.0, 1.0)));
}

#[test]
fn rotation_preserves_length_and_axis_projection() {
    let axis = Vector3d::new(0.3, -1.2, 0.8);
    let v = Vector3d::new(1.5, 0.25, -2.0);
    let r = Rotation::about_axis(axis, 1.234);
    let w = r * v;
    assert!((w.norm2() - v.norm2()).abs() < 1e-12);
    assert!((w.dot(axis) - v.dot(axis)).abs() < 1e-12);
    assert!(close(Rotation::about_axis(axis, -1.234) * w, v));
}

#[test]
fn composed_rotations_add_angles() {
    let axis = Vector3d::new(1.0, 1.0, 0.0);
    let v = Vector3d::new(0.0, 0.3, 1.0);
    let both = Rotation::about_axis(axis, 0.4) * (Rotation::about_axis(axis, 0.9) * v);
    assert!(close(both, Rotation::about_axis(axis, 1.3) * v));
}
