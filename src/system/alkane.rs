//! A periodic box of short alkane chains.
//!
//! Positions are stored unwrapped, so a bond is always just the
//! difference of two positions.  Distances between atoms use the
//! nearest periodic image.

use super::*;

use auto_args::AutoArgs;
use rand::Rng;

/// How atoms on different molecules (or far apart on the same
/// molecule) interact.
#[derive(Serialize, Deserialize, Debug, AutoArgs, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// No interaction at all
    Ideal,
    /// Hard spheres of the given diameter
    HardSphere {
        /// The diameter
        sigma: Length,
    },
    /// Purely repulsive Weeks-Chandler-Andersen spheres
    SoftSphere {
        /// The well depth of the underlying Lennard-Jones potential
        epsilon: Energy,
        /// The diameter
        sigma: Length,
    },
}

impl Interaction {
    /// The pair energy at squared separation `r2`.
    pub fn pair(&self, r2: f64) -> Energy {
        match *self {
            Interaction::Ideal => 0.0,
            Interaction::HardSphere { sigma } => {
                if r2 < sigma * sigma {
                    std::f64::INFINITY
                } else {
                    0.0
                }
            }
            Interaction::SoftSphere { epsilon, sigma } => {
                let s2 = sigma * sigma / r2;
                if s2 > 2.0f64.powf(-1.0 / 3.0) {
                    let s6 = s2 * s2 * s2;
                    4.0 * epsilon * (s6 * s6 - s6) + epsilon
                } else {
                    0.0
                }
            }
        }
    }
    /// The separation beyond which the pair energy vanishes.
    pub fn range(&self) -> Length {
        match *self {
            Interaction::Ideal => 0.0,
            Interaction::HardSphere { sigma } => sigma,
            Interaction::SoftSphere { sigma, .. } => 2.0f64.powf(1.0 / 6.0) * sigma,
        }
    }
}

/// The parameters needed to configure a box of alkanes.
///
/// These parameters are normally set via command-line arguments.
#[derive(Serialize, Deserialize, Debug, AutoArgs, Clone)]
pub struct AlkaneParams {
    /// The number of lattice cells along each side of the box
    pub cells: usize,
    /// The spacing between neighboring molecules, relative to the
    /// closest spacing that does not overlap
    pub expansion: f64,
    /// The interaction between atoms
    pub _interaction: Interaction,
    /// The number of atoms in each chain, if not hexane
    pub chain_length: Option<usize>,
}

impl Default for AlkaneParams {
    fn default() -> Self {
        AlkaneParams {
            cells: 3,
            expansion: 1.1,
            _interaction: Interaction::HardSphere { sigma: 1.0 },
            chain_length: None,
        }
    }
}

/// A box of alkanes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Alkanes {
    /// The dimensions of the periodic box.
    pub box_diagonal: Position,
    /// The chain topology.
    pub species: SpeciesGeometry,
    /// The interaction between atoms.
    pub interaction: Interaction,
    /// Atom positions, molecule after molecule.
    pub positions: Vec<Position>,
}

impl Alkanes {
    /// The displacement from `b` to the nearest image of `a`.
    pub fn closest_displacement(&self, a: Position, b: Position) -> Position {
        let mut d = a - b;
        d.x -= self.box_diagonal.x * (d.x / self.box_diagonal.x).round();
        d.y -= self.box_diagonal.y * (d.y / self.box_diagonal.y).round();
        d.z -= self.box_diagonal.z * (d.z / self.box_diagonal.z).round();
        d
    }
    /// Whether two atoms of the same molecule are far enough apart
    /// along the chain to interact.
    fn intramolecular(i: usize, j: usize) -> bool {
        (i as isize - j as isize).abs() >= 4
    }
    /// The total energy, computed from scratch.
    pub fn compute_energy(&self) -> Energy {
        let n = self.species.chain_length;
        let mut e = 0.0;
        for (i, &r1) in self.positions.iter().enumerate() {
            for (j, &r2) in self.positions.iter().enumerate().take(i) {
                if i / n == j / n && !Self::intramolecular(i % n, j % n) {
                    continue;
                }
                e += self.interaction.pair(self.closest_displacement(r1, r2).norm2());
            }
        }
        e
    }
}

impl From<AlkaneParams> for Alkanes {
    fn from(params: AlkaneParams) -> Alkanes {
        assert!(params.cells > 0, "we need at least one lattice cell");
        let mut species = SpeciesGeometry::default();
        if let Some(n) = params.chain_length {
            species.chain_length = n;
        }
        let reach = params._interaction.range();
        // The chains lie along x, zig-zagging in the xy plane.
        let zig = species.bond_length * (0.5 * species.bond_angle).cos();
        let spacing = Vector3d::new(
            (species.extent() + reach) * params.expansion,
            (zig + reach) * params.expansion,
            reach * params.expansion,
        );
        // Even ideal chains need a box with some volume.
        let spacing = Vector3d::new(
            spacing.x.max(species.extent() + species.bond_length),
            spacing.y.max(zig + species.bond_length),
            spacing.z.max(species.bond_length),
        );
        let cells = params.cells;
        let box_diagonal = spacing * (cells as f64);
        let mut positions = Vec::with_capacity(cells * cells * cells * species.chain_length);
        for i in 0..cells {
            for j in 0..cells {
                for k in 0..cells {
                    let origin = Vector3d::new(
                        i as f64 * spacing.x,
                        j as f64 * spacing.y,
                        k as f64 * spacing.z,
                    );
                    positions.extend(species.all_trans(
                        origin,
                        Vector3d::new(1.0, 0.0, 0.0),
                        Vector3d::new(0.0, 1.0, 0.0),
                    ));
                }
            }
        }
        let alkanes = Alkanes {
            box_diagonal,
            species,
            interaction: params._interaction,
            positions,
        };
        if !alkanes.compute_energy().is_finite() {
            panic!("The lattice is too dense for these molecules, sorry!");
        }
        alkanes
    }
}

impl MoleculeSource for Alkanes {
    fn num_molecules(&self) -> usize {
        self.positions.len() / self.species.chain_length
    }
    fn molecule(&self, which: usize) -> &[Position] {
        let n = self.species.chain_length;
        &self.positions[which * n..(which + 1) * n]
    }
    fn molecule_mut(&mut self, which: usize) -> &mut [Position] {
        let n = self.species.chain_length;
        &mut self.positions[which * n..(which + 1) * n]
    }
}

impl PotentialEvaluator for Alkanes {
    fn energy_of(&self, molecule: usize, atom: usize, placed: &[bool]) -> Energy {
        if let Interaction::Ideal = self.interaction {
            return 0.0;
        }
        let n = self.species.chain_length;
        let r = self.positions[molecule * n + atom];
        let mut e = 0.0;
        for (m, chain) in self.positions.chunks(n).enumerate() {
            for (j, &r2) in chain.iter().enumerate() {
                if m == molecule && (!placed[j] || !Self::intramolecular(atom, j)) {
                    continue;
                }
                e += self.interaction.pair(self.closest_displacement(r, r2).norm2());
                if e == std::f64::INFINITY {
                    return e;
                }
            }
        }
        e
    }
}

impl Species for Alkanes {
    fn species(&self) -> SpeciesGeometry {
        self.species
    }
}

impl TrialPositionSource for Alkanes {
    fn random_position_in_box(&self, rng: &mut MyRng) -> Position {
        Vector3d::new(
            self.box_diagonal.x * rng.gen::<f64>(),
            self.box_diagonal.y * rng.gen::<f64>(),
            self.box_diagonal.z * rng.gen::<f64>(),
        )
    }
}

#[cfg(test)]
fn mk_alkanes(interaction: Interaction) -> Alkanes {
    let mut params = AlkaneParams::default();
    params._interaction = interaction;
    params.cells = 2;
    Alkanes::from(params)
}

#[test]
fn lattice_has_no_overlaps() {
    let hs = mk_alkanes(Interaction::HardSphere { sigma: 1.0 });
    assert_eq!(hs.num_molecules(), 8);
    assert_eq!(hs.compute_energy(), 0.0);
    let soft = mk_alkanes(Interaction::SoftSphere {
        epsilon: 1.0,
        sigma: 1.0,
    });
    assert_eq!(soft.compute_energy(), 0.0);
}

#[test]
#[should_panic]
fn crowded_lattice_is_refused() {
    let mut params = AlkaneParams::default();
    params.expansion = 0.5;
    Alkanes::from(params);
}

#[test]
fn overlap_is_infinite() {
    let mut hs = mk_alkanes(Interaction::HardSphere { sigma: 1.0 });
    let other = hs.molecule(1)[2];
    hs.molecule_mut(0)[3] = other + Vector3d::new(0.1, 0.0, 0.0);
    let placed = vec![true; 6];
    assert_eq!(hs.energy_of(0, 3, &placed), std::f64::INFINITY);
    assert_eq!(hs.compute_energy(), std::f64::INFINITY);
}

#[test]
fn unplaced_atoms_are_ignored() {
    let mut soft = mk_alkanes(Interaction::SoftSphere {
        epsilon: 1.0,
        sigma: 1.0,
    });
    // Fold the end of molecule 0 back next to its first atom.
    let first = soft.molecule(0)[0];
    soft.molecule_mut(0)[5] = first + Vector3d::new(0.3, -0.1, 0.0);
    let mut placed = vec![false; 6];
    assert_eq!(soft.energy_of(0, 5, &placed), 0.0);
    placed[0] = true;
    assert!(soft.energy_of(0, 5, &placed) > 0.0);
    // Nearby atoms along the chain never interact.
    placed[0] = false;
    placed[2] = true;
    placed[3] = true;
    placed[4] = true;
    assert_eq!(soft.energy_of(0, 5, &placed), 0.0);
}

#[test]
fn energy_of_sums_to_twice_the_total() {
    let mut soft = mk_alkanes(Interaction::SoftSphere {
        epsilon: 1.0,
        sigma: 1.0,
    });
    let shift = soft.molecule(1)[0] - soft.molecule(0)[0];
    let nudge = crate::geometry::normalized(shift) * (shift.norm2().sqrt() - 0.8);
    soft.translate(0, nudge);
    let placed = vec![true; 6];
    let mut sum = 0.0;
    for m in 0..soft.num_molecules() {
        for a in 0..6 {
            sum += soft.energy_of(m, a, &placed);
        }
    }
    let total = soft.compute_energy();
    println!("sum {} vs total {}", sum, total);
    assert!(total > 0.0);
    assert!((sum - 2.0 * total).abs() < 1e-10 * total);
}

#[test]
fn random_positions_are_in_the_box() {
    use rand::SeedableRng;
    let hs = mk_alkanes(Interaction::HardSphere { sigma: 1.0 });
    let mut rng = MyRng::seed_from_u64(1);
    for _ in 0..1000 {
        let r = hs.random_position_in_box(&mut rng);
        assert!(r.x >= 0.0 && r.x < hs.box_diagonal.x);
        assert!(r.y >= 0.0 && r.y < hs.box_diagonal.y);
        assert!(r.z >= 0.0 && r.z < hs.box_diagonal.z);
    }
}
