//! Checking that chains still have the geometry of their species.

use crate::geometry::{bond_angle, dihedral};
use crate::system::{MoleculeSource, Position, SpeciesGeometry};

/// A way in which a chain has the wrong shape.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryViolation {
    /// A bond of the wrong length.
    BondLength {
        /// The molecule.
        molecule: usize,
        /// The first atom of the bond.
        atom: usize,
        /// The length we found.
        length: f64,
    },
    /// A bond angle that is off.
    BondAngle {
        /// The molecule.
        molecule: usize,
        /// The atom at the vertex of the angle.
        atom: usize,
        /// The angle we found, in radians.
        angle: f64,
    },
    /// A torsion outside of the permitted window.
    Torsion {
        /// The molecule.
        molecule: usize,
        /// The first atom of the four.
        atom: usize,
        /// The torsion we found, in radians.
        torsion: f64,
    },
}

impl std::fmt::Display for GeometryViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            GeometryViolation::BondLength {
                molecule,
                atom,
                length,
            } => write!(
                f,
                "molecule {} has bond {}-{} of length {}",
                molecule,
                atom,
                atom + 1,
                length
            ),
            GeometryViolation::BondAngle {
                molecule,
                atom,
                angle,
            } => write!(
                f,
                "molecule {} has bond angle {} at atom {}",
                molecule, angle, atom
            ),
            GeometryViolation::Torsion {
                molecule,
                atom,
                torsion,
            } => write!(
                f,
                "molecule {} has torsion {} starting at atom {}",
                molecule, torsion, atom
            ),
        }
    }
}

impl std::error::Error for GeometryViolation {}

/// Checks bond lengths, bond angles and torsions against a species.
#[derive(Clone, Debug)]
pub struct ConfigurationValidator {
    /// What the chains should look like.
    pub species: SpeciesGeometry,
    /// How far a bond length may stray.
    pub length_tolerance: f64,
    /// How far a bond angle may stray, in radians.
    pub angle_tolerance: f64,
}

impl ConfigurationValidator {
    /// A validator with the usual tolerances.
    pub fn new(species: SpeciesGeometry) -> Self {
        ConfigurationValidator {
            species,
            length_tolerance: 5e-6,
            angle_tolerance: 5e-7,
        }
    }

    /// Check a single chain, labelled `molecule` in any violation.
    pub fn check_chain(&self, molecule: usize, chain: &[Position]) -> Result<(), GeometryViolation> {
        let s = &self.species;
        for (atom, w) in chain.windows(2).enumerate() {
            let length = (w[1] - w[0]).norm2().sqrt();
            if (length - s.bond_length).abs() > self.length_tolerance {
                return Err(GeometryViolation::BondLength {
                    molecule,
                    atom,
                    length,
                });
            }
        }
        for (atom, w) in chain.windows(3).enumerate() {
            let angle = bond_angle(w[0], w[1], w[2]);
            if (angle - s.bond_angle).abs() > self.angle_tolerance {
                return Err(GeometryViolation::BondAngle {
                    molecule,
                    atom: atom + 1,
                    angle,
                });
            }
        }
        for (atom, w) in chain.windows(4).enumerate() {
            let torsion = dihedral(w[0], w[1], w[2], w[3]);
            if torsion < s.lower_torsion - self.angle_tolerance
                || torsion > s.upper_torsion + self.angle_tolerance
            {
                return Err(GeometryViolation::Torsion {
                    molecule,
                    atom,
                    torsion,
                });
            }
        }
        Ok(())
    }

    /// Check every molecule of a system.
    pub fn check<M: MoleculeSource + ?Sized>(&self, system: &M) -> Result<(), GeometryViolation> {
        for m in 0..system.num_molecules() {
            self.check_chain(m, system.molecule(m))?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn mk_chain() -> Vec<Position> {
    SpeciesGeometry::default().all_trans(
        Position::new(0.0, 0.0, 0.0),
        Position::new(1.0, 1.0, 0.0),
        Position::new(0.0, 0.0, 1.0),
    )
}

#[test]
fn all_trans_is_valid() {
    let v = ConfigurationValidator::new(SpeciesGeometry::default());
    assert_eq!(v.check_chain(0, &mk_chain()), Ok(()));
}

#[test]
fn stretched_bond_is_caught() {
    let v = ConfigurationValidator::new(SpeciesGeometry::default());
    let mut chain = mk_chain();
    chain[5] = chain[5] + Position::new(0.0, 0.0, 1e-3);
    match v.check_chain(3, &chain) {
        Err(GeometryViolation::BondLength { molecule, atom, .. }) => {
            assert_eq!((molecule, atom), (3, 4));
        }
        e => panic!("unexpected {:?}", e),
    }
}

#[test]
fn bent_angle_is_caught() {
    let v = ConfigurationValidator::new(SpeciesGeometry::default());
    let mut chain = mk_chain();
    // Swing the last atom within the plane of the zig-zag, keeping its
    // bond length.
    let bond = chain[5] - chain[4];
    let normal = Position::new(1.0, -1.0, 0.0);
    chain[5] = chain[4] + crate::geometry::rotate_about(bond, normal, 1e-3);
    match v.check_chain(0, &chain) {
        Err(GeometryViolation::BondAngle { atom, .. }) => assert_eq!(atom, 4),
        e => panic!("unexpected {:?}", e),
    }
}

#[test]
fn cis_torsion_is_caught() {
    let s = SpeciesGeometry::default();
    let v = ConfigurationValidator::new(s);
    let mut chain = mk_chain();
    // A half turn of the last atom about the 3-4 bond turns trans
    // into cis.
    let axis = crate::geometry::normalized(chain[4] - chain[3]);
    let bond = chain[5] - chain[4];
    let radial = bond - axis * bond.dot(axis);
    chain[5] = chain[5] - radial * 2.0;
    match v.check_chain(0, &chain) {
        Err(e @ GeometryViolation::Torsion { .. }) => println!("{}", e),
        e => panic!("unexpected {:?}", e),
    }
}
