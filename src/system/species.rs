//! The fixed topology of one kind of chain.

use super::*;

use crate::geometry::{degrees, normalized, perpendicular_unit};

/// The geometry shared by every chain of a species.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SpeciesGeometry {
    /// The number of atoms in each chain.
    pub chain_length: usize,
    /// The bond length.
    pub bond_length: Length,
    /// The bond angle, in radians.
    pub bond_angle: f64,
    /// The smallest permitted torsion angle, in radians.
    pub lower_torsion: f64,
    /// The largest permitted torsion angle, in radians.
    pub upper_torsion: f64,
}

impl Default for SpeciesGeometry {
    /// The united-atom hexane model with bonds of 0.4σ.
    fn default() -> Self {
        SpeciesGeometry {
            chain_length: 6,
            bond_length: 0.4,
            bond_angle: (-1.0f64 / 3.0).acos(),
            lower_torsion: degrees(108.68878),
            upper_torsion: degrees(251.31122),
        }
    }
}

impl SpeciesGeometry {
    /// Half the width of the torsion window.
    pub fn torsion_limit(&self) -> f64 {
        0.5 * (self.upper_torsion - self.lower_torsion)
    }
    /// The torsion at the middle of the window.
    pub fn torsion_center(&self) -> f64 {
        0.5 * (self.upper_torsion + self.lower_torsion)
    }
    /// The all-trans zig-zag conformation, starting at `origin` and
    /// running along `axis`, with the zig-zag in the plane of `axis`
    /// and `up`.
    pub fn all_trans(&self, origin: Position, axis: Position, up: Position) -> Vec<Position> {
        let axis = normalized(axis);
        let up = match crate::geometry::radial_unit(up, axis) {
            Some(u) => u,
            None => perpendicular_unit(axis),
        };
        let half = 0.5 * self.bond_angle;
        let along = axis * (self.bond_length * half.sin());
        let across = up * (self.bond_length * half.cos());
        (0..self.chain_length)
            .map(|i| {
                let zig = if i % 2 == 0 { 0.0 } else { 1.0 };
                origin + along * (i as f64) + across * zig
            })
            .collect()
    }
    /// The length of an all-trans chain along its axis.
    pub fn extent(&self) -> Length {
        (self.chain_length.max(1) - 1) as f64 * self.bond_length * (0.5 * self.bond_angle).sin()
    }
}

#[test]
fn all_trans_has_right_geometry() {
    use crate::geometry::{bond_angle, dihedral};
    let s = SpeciesGeometry::default();
    let chain = s.all_trans(
        Vector3d::new(1.0, 2.0, 3.0),
        Vector3d::new(0.0, 1.0, 1.0),
        Vector3d::new(1.0, 0.0, 0.0),
    );
    assert_eq!(chain.len(), 6);
    for w in chain.windows(2) {
        assert!(((w[1] - w[0]).norm2().sqrt() - s.bond_length).abs() < 1e-14);
    }
    for w in chain.windows(3) {
        assert!((bond_angle(w[0], w[1], w[2]) - s.bond_angle).abs() < 1e-7);
    }
    for w in chain.windows(4) {
        let phi = dihedral(w[0], w[1], w[2], w[3]);
        assert!((phi - std::f64::consts::PI).abs() < 1e-7);
    }
}

#[test]
fn torsion_window_is_centered_on_trans() {
    let s = SpeciesGeometry::default();
    assert!((s.torsion_center() - std::f64::consts::PI).abs() < 1e-6);
    assert!((s.torsion_limit() - degrees(71.31122)).abs() < 1e-12);
}
