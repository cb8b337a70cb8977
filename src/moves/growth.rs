//! How candidate positions are generated for each atom of a growing
//! chain.
//!
//! The atom being placed is `order[k]`, and the atoms `order[k-1]`,
//! `order[k-2]` and `order[k-3]` (when they exist) are already in
//! place.  The number of atoms already placed decides how the
//! candidate is built:
//!
//! * none: anywhere in the box,
//! * one: a free bond in a random direction,
//! * two: a bond that also makes a bond angle,
//! * three or more: a bond that also makes a torsion angle.

use crate::geometry::{
    clamped_acos, dihedral, normalized, perpendicular_unit, radial_unit, rotate_about,
};
use crate::rng::{self, MyRng};
use crate::system::{Energy, Position, SpeciesGeometry, TrialPositionSource};
use auto_args::AutoArgs;

/// The coefficients of the torsion energy
///
/// `c0 + c1 (1 + cos φ) + c2 (1 - cos 2φ) + c3 (1 + cos 3φ)`
///
/// where `φ = π` is trans.
#[derive(Serialize, Deserialize, Debug, AutoArgs, Clone, Copy, PartialEq)]
pub struct TorsionSeries {
    /// constant term
    pub c0: Energy,
    /// coefficient of 1 + cos φ
    pub c1: Energy,
    /// coefficient of 1 - cos 2φ
    pub c2: Energy,
    /// coefficient of 1 + cos 3φ
    pub c3: Energy,
}

impl TorsionSeries {
    /// The torsion energy at dihedral angle `phi`.
    pub fn energy(&self, phi: f64) -> Energy {
        self.c0
            + self.c1 * (1.0 + phi.cos())
            + self.c2 * (1.0 - (2.0 * phi).cos())
            + self.c3 * (1.0 + (3.0 * phi).cos())
    }
}

/// The parameters of flexible growth.
#[derive(Serialize, Deserialize, Debug, AutoArgs, Clone, Copy, PartialEq)]
pub struct FlexibleParams {
    /// The harmonic bond-bending constant, per radian squared
    pub bend_constant: Energy,
    /// The torsion energy
    pub _torsion: TorsionSeries,
}

impl Default for FlexibleParams {
    /// TraPPE-UA alkane bending and torsion, in units of the CH2 well
    /// depth of 46 K.
    fn default() -> Self {
        FlexibleParams {
            bend_constant: 62500.0 / 46.0,
            _torsion: TorsionSeries {
                c0: 0.0,
                c1: 355.03 / 46.0,
                c2: -68.19 / 46.0,
                c3: 791.32 / 46.0,
            },
        }
    }
}

impl FlexibleParams {
    /// The torsion energy series.
    pub fn torsion(&self) -> &TorsionSeries {
        &self._torsion
    }
}

/// Which growth policy to use.
#[derive(Serialize, Deserialize, Debug, AutoArgs, Clone, Copy, PartialEq)]
pub enum GrowthParams {
    /// Fixed bond length and angle, torsion uniform within its window
    Rigid,
    /// Bond angles and torsions sampled from their Boltzmann factors
    Flexible(FlexibleParams),
}

impl Default for GrowthParams {
    fn default() -> Self {
        GrowthParams::Rigid
    }
}

/// Growth where bond angles and torsions are drawn by rejection
/// against their own Boltzmann factors.  Bond lengths are fixed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FlexibleChainGrowth {
    /// The chain topology.  Its bond angle is the equilibrium angle.
    pub species: SpeciesGeometry,
    /// Bending and torsion parameters.
    pub params: FlexibleParams,
}

/// Growth for chains locked into a crystal model: bond length and
/// bond angle are fixed and only the torsion is sampled, uniformly
/// within its window.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RigidLatticeGrowth {
    /// The chain topology.
    pub species: SpeciesGeometry,
}

impl RigidLatticeGrowth {
    /// Rigid growth of chains of this species.
    pub fn new(species: SpeciesGeometry) -> Self {
        if species.chain_length < 3 {
            panic!(
                "rigid lattice growth needs chains of at least 3 atoms, not {}",
                species.chain_length
            );
        }
        RigidLatticeGrowth { species }
    }
}

/// The way a chain is grown, chosen when the move is built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum GrowthPolicy {
    /// Energetic bond-angle and torsion sampling.
    Flexible(FlexibleChainGrowth),
    /// Fixed geometry, uniform torsion window.
    RigidLattice(RigidLatticeGrowth),
}

impl GrowthPolicy {
    /// Build the policy described by `params` for chains of `species`.
    pub fn new(params: GrowthParams, species: SpeciesGeometry) -> Self {
        match params {
            GrowthParams::Rigid => GrowthPolicy::RigidLattice(RigidLatticeGrowth::new(species)),
            GrowthParams::Flexible(params) => {
                GrowthPolicy::Flexible(FlexibleChainGrowth { species, params })
            }
        }
    }

    /// The chain topology.
    pub fn species(&self) -> &SpeciesGeometry {
        match self {
            GrowthPolicy::Flexible(f) => &f.species,
            GrowthPolicy::RigidLattice(r) => &r.species,
        }
    }

    /// The position in growth order of the first atom to regrow in a
    /// chain of `n` atoms.  Flexible growth may regrow the whole chain;
    /// rigid growth always keeps at least the first atom and regrows
    /// at least the last one.
    pub fn start_index(&self, n: usize, rng: &mut MyRng) -> usize {
        match self {
            GrowthPolicy::Flexible(_) => rng::uniform_int(rng, n),
            GrowthPolicy::RigidLattice(_) => 1 + rng::uniform_int(rng, n - 2),
        }
    }

    /// The bending energy at bond angle `theta`.
    ///
    /// # Panics
    ///
    /// Rigid growth has no bending energy, since its angles are fixed
    /// by construction.  Asking for one means the wrong policy is in
    /// use.
    pub fn bond_angle_energy(&self, theta: f64) -> Energy {
        match self {
            GrowthPolicy::Flexible(f) => {
                let d = theta - f.species.bond_angle;
                0.5 * f.params.bend_constant * d * d
            }
            GrowthPolicy::RigidLattice(_) => {
                panic!("rigid lattice growth fixes the bond angle and has no bending energy")
            }
        }
    }

    /// The torsion energy at dihedral angle `phi`.
    ///
    /// # Panics
    ///
    /// Rigid growth has no torsion energy.
    pub fn torsion_energy(&self, phi: f64) -> Energy {
        match self {
            GrowthPolicy::Flexible(f) => f.params.torsion().energy(phi),
            GrowthPolicy::RigidLattice(_) => {
                panic!("rigid lattice growth samples torsions uniformly and has no torsion energy")
            }
        }
    }

    /// A candidate position for atom `order[k]` of `chain`.
    pub fn trial_position<T: TrialPositionSource + ?Sized>(
        &self,
        source: &T,
        chain: &[Position],
        order: &[usize],
        k: usize,
        beta: f64,
        rng: &mut MyRng,
    ) -> Position {
        match k {
            0 => source.random_position_in_box(rng),
            1 => self.random_bond(chain[order[0]], rng),
            2 => self.random_bond_with_angle(chain[order[1]], chain[order[0]], beta, rng),
            _ => self.random_bond_with_angle_and_torsion(
                chain[order[k - 1]],
                chain[order[k - 2]],
                chain[order[k - 3]],
                beta,
                rng,
            ),
        }
    }

    /// A bond from `a` in a uniformly random direction.
    pub fn random_bond(&self, a: Position, rng: &mut MyRng) -> Position {
        a + rng::vector(rng) * self.species().bond_length
    }

    /// A bond from `a`, making a bond angle with the bond from `a` to
    /// `b`.
    pub fn random_bond_with_angle(
        &self,
        a: Position,
        b: Position,
        beta: f64,
        rng: &mut MyRng,
    ) -> Position {
        let axial = normalized(b - a);
        match self {
            GrowthPolicy::Flexible(f) => {
                let length = f.species.bond_length;
                loop {
                    let d = rng::vector(rng);
                    let theta = clamped_acos(d.dot(axial));
                    let u = self.bond_angle_energy(theta);
                    if rng::uniform01(rng) < (-beta * u).exp() {
                        return a + d * length;
                    }
                }
            }
            GrowthPolicy::RigidLattice(r) => {
                let radial = perpendicular_unit(axial);
                let spin = rng::uniform_in(rng, 0.0, 2.0 * std::f64::consts::PI);
                let radial = rotate_about(radial, axial, spin);
                a + r.bond(axial, radial)
            }
        }
    }

    /// A bond from `a`, making a bond angle with the bond from `a` to
    /// `b` and a torsion angle with `c-b-a`.
    pub fn random_bond_with_angle_and_torsion(
        &self,
        a: Position,
        b: Position,
        c: Position,
        beta: f64,
        rng: &mut MyRng,
    ) -> Position {
        let axial = normalized(b - a);
        match self {
            GrowthPolicy::Flexible(f) => {
                let length = f.species.bond_length;
                loop {
                    let d = rng::vector(rng);
                    let next = a + d * length;
                    let theta = clamped_acos(d.dot(axial));
                    let phi = dihedral(c, b, a, next);
                    let u = self.bond_angle_energy(theta) + self.torsion_energy(phi);
                    if rng::uniform01(rng) < (-beta * u).exp() {
                        return next;
                    }
                }
            }
            GrowthPolicy::RigidLattice(r) => {
                let limit = r.species.torsion_limit();
                let phi = r.species.torsion_center() + rng::uniform_in(rng, -limit, limit);
                // The direction from the b-a axis towards c is the cis
                // direction, from which the torsion is measured.
                let cis = match radial_unit(c - b, axial) {
                    Some(v) => v,
                    None => perpendicular_unit(axial),
                };
                let radial = rotate_about(cis, axial * -1.0, phi);
                a + r.bond(axial, normalized(radial))
            }
        }
    }
}

impl RigidLatticeGrowth {
    /// The bond that makes the fixed bond angle with the unit vector
    /// `axial` (pointing back along the previous bond), leaning
    /// towards the unit vector `radial`.
    fn bond(&self, axial: Position, radial: Position) -> Position {
        let (s, c) = self.species.bond_angle.sin_cos();
        let length = self.species.bond_length;
        axial * (length * c) + radial * (length * s)
    }
}

#[cfg(test)]
use crate::geometry::bond_angle;
#[cfg(test)]
use rand::SeedableRng;

#[cfg(test)]
struct NoBox;
#[cfg(test)]
impl TrialPositionSource for NoBox {
    fn random_position_in_box(&self, _rng: &mut MyRng) -> Position {
        Position::new(0.5, 0.5, 0.5)
    }
}

#[cfg(test)]
fn rigid() -> GrowthPolicy {
    GrowthPolicy::new(GrowthParams::Rigid, SpeciesGeometry::default())
}

#[cfg(test)]
fn flexible() -> GrowthPolicy {
    GrowthPolicy::new(GrowthParams::Flexible(FlexibleParams::default()), SpeciesGeometry::default())
}

#[test]
#[should_panic]
fn rigid_has_no_bending_energy() {
    rigid().bond_angle_energy(1.9);
}

#[test]
#[should_panic]
fn rigid_has_no_torsion_energy() {
    rigid().torsion_energy(3.0);
}

#[test]
#[should_panic]
fn rigid_needs_three_atoms() {
    let mut species = SpeciesGeometry::default();
    species.chain_length = 2;
    RigidLatticeGrowth::new(species);
}

#[test]
fn rigid_start_is_interior() {
    let mut rng = MyRng::seed_from_u64(1);
    let policy = rigid();
    let mut seen = [false; 6];
    for _ in 0..1000 {
        let s = policy.start_index(6, &mut rng);
        assert!(s >= 1 && s <= 4);
        seen[s] = true;
    }
    assert_eq!(seen, [false, true, true, true, true, false]);
}

#[test]
fn flexible_start_can_be_anywhere() {
    let mut rng = MyRng::seed_from_u64(1);
    let policy = flexible();
    let mut seen = [false; 6];
    for _ in 0..1000 {
        seen[policy.start_index(6, &mut rng)] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn rigid_third_atom_has_fixed_angle() {
    let mut rng = MyRng::seed_from_u64(2);
    let policy = rigid();
    let s = SpeciesGeometry::default();
    let b = Position::new(0.1, 0.2, 0.3);
    let a = b + normalized(Position::new(0.3, -1.0, 0.2)) * s.bond_length;
    for _ in 0..1000 {
        let r = policy.random_bond_with_angle(a, b, 1.0, &mut rng);
        assert!(((r - a).norm2().sqrt() - s.bond_length).abs() < 1e-12);
        assert!((bond_angle(b, a, r) - s.bond_angle).abs() < 1e-9);
    }
}

#[test]
fn rigid_torsion_stays_in_window() {
    let mut rng = MyRng::seed_from_u64(3);
    let policy = rigid();
    let s = SpeciesGeometry::default();
    let chain = s.all_trans(
        Position::new(0.0, 0.0, 0.0),
        Position::new(0.2, 1.0, -0.3),
        Position::new(1.0, 0.0, 0.0),
    );
    let (c, b, a) = (chain[0], chain[1], chain[2]);
    let (mut lowest, mut highest) = (10.0f64, -10.0f64);
    for _ in 0..10000 {
        let r = policy.random_bond_with_angle_and_torsion(a, b, c, 1.0, &mut rng);
        assert!(((r - a).norm2().sqrt() - s.bond_length).abs() < 1e-12);
        assert!((bond_angle(b, a, r) - s.bond_angle).abs() < 1e-9);
        let phi = dihedral(c, b, a, r);
        assert!(phi >= s.lower_torsion - 1e-9 && phi <= s.upper_torsion + 1e-9);
        lowest = lowest.min(phi);
        highest = highest.max(phi);
    }
    // The whole window gets explored.
    assert!(lowest < s.lower_torsion + 0.01);
    assert!(highest > s.upper_torsion - 0.01);
}

#[test]
fn trial_position_dispatches_on_placed_atoms() {
    let mut rng = MyRng::seed_from_u64(4);
    let policy = rigid();
    let s = SpeciesGeometry::default();
    let chain = s.all_trans(
        Position::new(1.0, 1.0, 1.0),
        Position::new(1.0, 0.0, 0.0),
        Position::new(0.0, 1.0, 0.0),
    );
    let order: Vec<usize> = (0..6).rev().collect();
    assert_eq!(
        policy.trial_position(&NoBox, &chain, &order, 0, 1.0, &mut rng),
        Position::new(0.5, 0.5, 0.5)
    );
    let r = policy.trial_position(&NoBox, &chain, &order, 1, 1.0, &mut rng);
    assert!(((r - chain[5]).norm2().sqrt() - s.bond_length).abs() < 1e-12);
    let r = policy.trial_position(&NoBox, &chain, &order, 4, 1.0, &mut rng);
    assert!((bond_angle(chain[3], chain[2], r) - s.bond_angle).abs() < 1e-9);
}

#[test]
fn flexible_angles_follow_bending_energy() {
    let mut rng = MyRng::seed_from_u64(5);
    let policy = flexible();
    let s = SpeciesGeometry::default();
    let b = Position::new(0.0, 0.0, 0.0);
    let a = Position::new(0.0, 0.0, s.bond_length);
    let mut total = 0.0;
    let n = 2000;
    for _ in 0..n {
        let r = policy.random_bond_with_angle(a, b, 1.0, &mut rng);
        assert!(((r - a).norm2().sqrt() - s.bond_length).abs() < 1e-12);
        let d = bond_angle(b, a, r) - s.bond_angle;
        total += d * d;
    }
    // With a stiff spring the angle fluctuates by about sqrt(T/k).
    let rms = (total / n as f64).sqrt();
    let expected = (46.0 / 62500.0f64).sqrt();
    println!("rms angle deviation {} vs {}", rms, expected);
    assert!(rms > 0.7 * expected && rms < 1.3 * expected);
}

#[test]
fn flexible_torsions_prefer_trans() {
    let mut rng = MyRng::seed_from_u64(6);
    let policy = flexible();
    let s = SpeciesGeometry::default();
    let chain = s.all_trans(
        Position::new(0.0, 0.0, 0.0),
        Position::new(1.0, 0.0, 0.0),
        Position::new(0.0, 1.0, 0.0),
    );
    let (c, b, a) = (chain[0], chain[1], chain[2]);
    let mut trans = 0;
    let n = 1000;
    for _ in 0..n {
        let r = policy.random_bond_with_angle_and_torsion(a, b, c, 1.0, &mut rng);
        let phi = dihedral(c, b, a, r);
        if (phi - std::f64::consts::PI).abs() < 1.0 {
            trans += 1;
        }
    }
    println!("{} of {} torsions were near trans", trans, n);
    assert!(trans > n / 2);
}

#[test]
fn torsion_energy_vanishes_at_trans() {
    let t = *FlexibleParams::default().torsion();
    assert!(t.energy(std::f64::consts::PI).abs() < 1e-12);
    assert!(t.energy(1.0) > 0.0);
}

#[test]
fn flexible_torsion_energy_uses_its_series() {
    let mut params = FlexibleParams::default();
    params._torsion.c0 = 2.5;
    let policy = GrowthPolicy::new(GrowthParams::Flexible(params), SpeciesGeometry::default());
    for &phi in &[0.0, 1.0, std::f64::consts::PI, 4.0] {
        assert_eq!(policy.torsion_energy(phi), params.torsion().energy(phi));
    }
    assert!((policy.torsion_energy(std::f64::consts::PI) - 2.5).abs() < 1e-12);
}
