//! Vector geometry needed to build chains one bond at a time.
//!
//! All angles are in radians.  Every inverse cosine in the crate goes
//! through [`clamped_acos`], since a dot product of two unit vectors
//! can land a few ulps outside `[-1, 1]`.

use crate::rotation::Rotation;
use vector3d::Vector3d;

/// `acos` of `x` after clamping `x` into `[-1, 1]`.
pub fn clamped_acos(x: f64) -> f64 {
    if x >= 1.0 {
        0.0
    } else if x <= -1.0 {
        std::f64::consts::PI
    } else {
        x.acos()
    }
}

/// The vector scaled to unit length.
pub fn normalized(v: Vector3d<f64>) -> Vector3d<f64> {
    v * (1.0 / v.norm2().sqrt())
}

/// Rotate `v` by `angle` about `axis`, right-handed.
pub fn rotate_about(v: Vector3d<f64>, axis: Vector3d<f64>, angle: f64) -> Vector3d<f64> {
    Rotation::about_axis(axis, angle) * v
}

/// The angle between two vectors, which need not be normalized.
pub fn angle_between(a: Vector3d<f64>, b: Vector3d<f64>) -> f64 {
    clamped_acos(a.dot(b) / (a.norm2() * b.norm2()).sqrt())
}

/// The bond angle at `center` formed with `left` and `right`.
pub fn bond_angle(left: Vector3d<f64>, center: Vector3d<f64>, right: Vector3d<f64>) -> f64 {
    angle_between(left - center, right - center)
}

/// The dihedral angle of `p1-p2-p3-p4`, in `[0, 2π)`.  The cis
/// conformation is zero and trans is `π`.
pub fn dihedral(
    p1: Vector3d<f64>,
    p2: Vector3d<f64>,
    p3: Vector3d<f64>,
    p4: Vector3d<f64>,
) -> f64 {
    let b1 = p2 - p1;
    let b2 = p3 - p2;
    let b3 = p4 - p3;
    let n1 = b1.cross(b2);
    let n2 = b2.cross(b3);
    let y = b2.norm2().sqrt() * b1.dot(n2);
    let x = n1.dot(n2);
    let phi = y.atan2(x);
    if phi < 0.0 {
        phi + 2.0 * std::f64::consts::PI
    } else {
        phi
    }
}

/// A unit vector perpendicular to the unit vector `axis`.  We start
/// from the coordinate axis that `axis` projects least onto, which can
/// never be parallel to it.
pub fn perpendicular_unit(axis: Vector3d<f64>) -> Vector3d<f64> {
    let (ax, ay, az) = (axis.x.abs(), axis.y.abs(), axis.z.abs());
    let seed = if ax <= ay && ax <= az {
        Vector3d::new(1.0, 0.0, 0.0)
    } else if ay <= az {
        Vector3d::new(0.0, 1.0, 0.0)
    } else {
        Vector3d::new(0.0, 0.0, 1.0)
    };
    normalized(seed - axis * seed.dot(axis))
}

/// The unit component of `v` perpendicular to the unit vector `axis`,
/// or `None` when `v` is (nearly) parallel to `axis`.
pub fn radial_unit(v: Vector3d<f64>, axis: Vector3d<f64>) -> Option<Vector3d<f64>> {
    let radial = v - axis * v.dot(axis);
    let r2 = radial.norm2();
    if r2 > 1e-20 * v.norm2() {
        Some(radial * (1.0 / r2.sqrt()))
    } else {
        None
    }
}

/// The geometric center of a set of positions.
pub fn center(positions: &[Vector3d<f64>]) -> Vector3d<f64> {
    let mut total = Vector3d::new(0.0, 0.0, 0.0);
    for &r in positions {
        total = total + r;
    }
    total * (1.0 / positions.len() as f64)
}

/// Convert degrees to radians.
pub fn degrees(d: f64) -> f64 {
    d * std::f64::consts::PI / 180.0
}

#[test]
fn acos_never_returns_nan() {
    assert_eq!(clamped_acos(1.0 + 1e-15), 0.0);
    assert_eq!(clamped_acos(-1.0 - 1e-15), std::f64::consts::PI);
    let v = normalized(Vector3d::new(0.1, 0.7, 0.3));
    assert!(!angle_between(v, v).is_nan());
    assert!(!angle_between(v, v * -1.0).is_nan());
}

#[test]
fn tetrahedral_bond_angle() {
    let theta = bond_angle(
        Vector3d::new(1.0, 1.0, 1.0),
        Vector3d::new(0.0, 0.0, 0.0),
        Vector3d::new(-1.0, -1.0, 1.0),
    );
    assert!((theta - (-1.0f64 / 3.0).acos()).abs() < 1e-14);
}

#[test]
fn dihedral_conventions() {
    let c = Vector3d::new(1.0, 0.0, 0.0);
    let b = Vector3d::new(0.0, 0.0, 0.0);
    let a = Vector3d::new(0.0, 0.0, 1.0);
    for &phi in &[0.0, 0.3, 1.9, std::f64::consts::PI, 4.0, 6.0] {
        let d = a + Vector3d::new(phi.cos(), phi.sin(), 0.5);
        let measured = dihedral(c, b, a, d);
        println!("phi {} measured {}", phi, measured);
        assert!((measured - phi).abs() < 1e-12);
    }
}

#[test]
fn perpendicular_is_perpendicular() {
    for &axis in &[
        Vector3d::new(1.0, 0.0, 0.0),
        Vector3d::new(0.0, 0.0, -1.0),
        normalized(Vector3d::new(0.2, -0.9, 0.4)),
        normalized(Vector3d::new(1.0, 1.0, 1.0)),
    ] {
        let p = perpendicular_unit(axis);
        assert!(p.dot(axis).abs() < 1e-14);
        assert!((p.norm2() - 1.0).abs() < 1e-14);
    }
}

#[test]
fn radial_of_parallel_vector_is_none() {
    let axis = Vector3d::new(0.0, 1.0, 0.0);
    assert!(radial_unit(Vector3d::new(0.0, -3.0, 0.0), axis).is_none());
    let r = radial_unit(Vector3d::new(2.0, 5.0, 0.0), axis).unwrap();
    assert!((r - Vector3d::new(1.0, 0.0, 0.0)).norm2() < 1e-28);
}

#[test]
fn center_of_two_points() {
    let c = center(&[Vector3d::new(0.0, 2.0, 4.0), Vector3d::new(2.0, 0.0, -4.0)]);
    assert_eq!(c, Vector3d::new(1.0, 1.0, 0.0));
}
