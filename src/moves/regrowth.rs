//! Configurational-bias regrowth of a single chain.

use super::*;

use crate::rng;
use crate::system::ChainSystem;

/// Regrow part of a randomly chosen chain, one atom at a time, picking
/// each atom from `num_trial` candidates according to its Boltzmann
/// weight.
///
/// The old configuration is retraced through the same machinery, with
/// the actual old position standing in for one of the candidates, so
/// that `weight_ratio` exactly compensates for the bias.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChainRegrowthMove {
    /// How candidate positions are generated.
    pub policy: GrowthPolicy,
    /// The number of candidates for each atom.
    pub num_trial: usize,
    /// The temperature used in the Boltzmann weights.
    pub temperature: f64,
    #[serde(skip)]
    molecule: Option<usize>,
    #[serde(skip)]
    saved: SavedState,
    #[serde(skip)]
    grown: Vec<Position>,
    #[serde(skip)]
    order: Vec<usize>,
    #[serde(skip)]
    start: usize,
    #[serde(skip)]
    placed: Vec<bool>,
    #[serde(skip)]
    batch: TrialBatch,
    #[serde(skip)]
    weight: Rosenbluth,
}

impl ChainRegrowthMove {
    /// A new move.
    pub fn new(policy: GrowthPolicy, num_trial: usize, temperature: f64) -> Self {
        assert!(num_trial > 0, "we need at least one trial position");
        assert!(temperature > 0.0, "the temperature must be positive");
        ChainRegrowthMove {
            policy,
            num_trial,
            temperature,
            molecule: None,
            saved: SavedState::default(),
            grown: Vec::new(),
            order: Vec::new(),
            start: 0,
            placed: Vec::new(),
            batch: TrialBatch::default(),
            weight: Rosenbluth::default(),
        }
    }

    /// The inverse temperature.
    pub fn beta(&self) -> f64 {
        1.0 / self.temperature
    }

    /// The molecule of the most recent trial.
    pub fn molecule(&self) -> Option<usize> {
        self.molecule
    }

    /// The Rosenbluth weights of the most recent trial.
    pub fn rosenbluth(&self) -> Rosenbluth {
        self.weight
    }

    /// `w_new/w_old` for the most recent trial, or zero after a hard
    /// reject.
    pub fn weight_ratio(&self) -> f64 {
        if self.weight.new == 0.0 {
            0.0
        } else {
            self.weight.ratio()
        }
    }

    /// Every atom of the molecule of the most recent trial.
    pub fn affected_atoms(&self) -> Option<AffectedAtoms> {
        self.molecule.map(|molecule| AffectedAtoms {
            molecule,
            num_atoms: self.saved.positions().len(),
        })
    }

    /// The atoms regrown in the most recent trial, in the order they
    /// were placed.
    pub fn regrown_atoms(&self) -> &[usize] {
        &self.order[self.start..]
    }

    /// Regrow molecule `which`.  Returns `false` if some growth step
    /// had no candidate with nonzero weight, in which case the chain
    /// is already back where it started.
    pub fn propose_molecule<S: ChainSystem + ?Sized>(
        &mut self,
        system: &mut S,
        which: usize,
        rng: &mut MyRng,
    ) -> bool {
        let n = system.molecule(which).len();
        self.molecule = Some(which);
        self.saved.save(system.molecule(which));
        self.batch.resize(self.num_trial);

        self.order.clear();
        if rng::uniform01(rng) < 0.5 {
            self.order.extend(0..n);
        } else {
            self.order.extend((0..n).rev());
        }
        self.start = self.policy.start_index(n, rng);

        let new = match self.grow(system, which, false, rng) {
            Some(w) => w,
            None => return self.hard_reject(system, which),
        };
        self.grown.clear();
        self.grown.extend_from_slice(system.molecule(which));

        self.saved.restore(system.molecule_mut(which));
        let old = match self.grow(system, which, true, rng) {
            Some(w) => w,
            None => return self.hard_reject(system, which),
        };
        system.molecule_mut(which).copy_from_slice(&self.grown);
        self.weight = Rosenbluth { new, old };
        true
    }

    fn hard_reject<S: ChainSystem + ?Sized>(&mut self, system: &mut S, which: usize) -> bool {
        self.saved.restore(system.molecule_mut(which));
        self.weight = Rosenbluth { new: 0.0, old: 1.0 };
        false
    }

    /// Place every atom from `start` onwards, returning the Rosenbluth
    /// weight.  When retracing, the atoms are put back where they were.
    fn grow<S: ChainSystem + ?Sized>(
        &mut self,
        system: &mut S,
        which: usize,
        retrace: bool,
        rng: &mut MyRng,
    ) -> Option<f64> {
        let n = self.order.len();
        self.placed.clear();
        self.placed.resize(n, false);
        for &atom in &self.order[..self.start] {
            self.placed[atom] = true;
        }
        let mut w = 1.0;
        for k in self.start..n {
            w *= self.place(system, which, k, retrace, rng)?;
            self.placed[self.order[k]] = true;
        }
        Some(w)
    }

    /// One growth step: generate the candidates for atom `order[k]`,
    /// weigh them, and leave the chosen (or old) one in place.
    fn place<S: ChainSystem + ?Sized>(
        &mut self,
        system: &mut S,
        which: usize,
        k: usize,
        retrace: bool,
        rng: &mut MyRng,
    ) -> Option<f64> {
        let atom = self.order[k];
        let n = self.order.len();
        let beta = self.beta();
        let terminal = k == self.start || k == n - 1;
        let old = self.saved.positions()[atom];
        self.batch.clear();
        for t in 0..self.num_trial {
            let r = if retrace && t == 0 {
                old
            } else {
                self.policy
                    .trial_position(&*system, system.molecule(which), &self.order, k, beta, rng)
            };
            system.molecule_mut(which)[atom] = r;
            let u = system.energy_of(which, atom, &self.placed);
            self.batch
                .set(t, r, boltzmann_weight(u, beta, terminal, self.num_trial));
        }
        if !(self.batch.sum > 0.0) {
            return None;
        }
        system.molecule_mut(which)[atom] = if retrace {
            old
        } else {
            self.batch.positions[self.batch.select(rng::uniform01(rng))]
        };
        Some(self.batch.sum)
    }
}

impl<S: ChainSystem + ?Sized> McMove<S> for ChainRegrowthMove {
    fn propose(&mut self, system: &mut S, rng: &mut MyRng) -> bool {
        let which = system.pick_random_molecule(rng);
        self.propose_molecule(system, which, rng)
    }
    fn weight_ratio(&self) -> f64 {
        ChainRegrowthMove::weight_ratio(self)
    }
    fn on_accept(&mut self, _system: &mut S) {}
    fn on_reject(&mut self, system: &mut S) {
        if let Some(which) = self.molecule {
            self.saved.restore(system.molecule_mut(which));
        }
    }
    fn affected_atoms(&self) -> Option<AffectedAtoms> {
        ChainRegrowthMove::affected_atoms(self)
    }
}

#[cfg(test)]
use crate::system::{MoleculeSource, PotentialEvaluator, SpeciesGeometry, TrialPositionSource};
#[cfg(test)]
use rand::SeedableRng;

#[cfg(test)]
#[derive(Clone, Copy, Debug)]
enum Field {
    Zero,
    /// Each atom is pulled towards the origin.
    Tether(f64),
    /// The chain ends may never be placed.
    NoEnds,
}

#[cfg(test)]
#[derive(Clone, Debug)]
struct Chains {
    n: usize,
    field: Field,
    positions: Vec<Position>,
}

#[cfg(test)]
impl MoleculeSource for Chains {
    fn num_molecules(&self) -> usize {
        self.positions.len() / self.n
    }
    fn molecule(&self, which: usize) -> &[Position] {
        &self.positions[which * self.n..(which + 1) * self.n]
    }
    fn molecule_mut(&mut self, which: usize) -> &mut [Position] {
        &mut self.positions[which * self.n..(which + 1) * self.n]
    }
}

#[cfg(test)]
impl PotentialEvaluator for Chains {
    fn energy_of(&self, molecule: usize, atom: usize, _placed: &[bool]) -> Energy {
        match self.field {
            Field::Zero => 0.0,
            Field::Tether(k) => k * self.molecule(molecule)[atom].norm2(),
            Field::NoEnds => {
                if atom == 0 || atom == self.n - 1 {
                    std::f64::INFINITY
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
impl TrialPositionSource for Chains {
    fn random_position_in_box(&self, rng: &mut MyRng) -> Position {
        Position::new(
            rng::uniform01(rng),
            rng::uniform01(rng),
            rng::uniform01(rng),
        )
    }
}

#[cfg(test)]
fn mk_chains(field: Field) -> Chains {
    let s = SpeciesGeometry::default();
    let mut positions = s.all_trans(
        Position::new(0.0, 0.0, 0.0),
        Position::new(1.0, 0.0, 0.0),
        Position::new(0.0, 1.0, 0.0),
    );
    positions.extend(s.all_trans(
        Position::new(0.0, 0.0, 1.0),
        Position::new(0.0, 1.0, 0.0),
        Position::new(0.0, 0.0, 1.0),
    ));
    Chains {
        n: s.chain_length,
        field,
        positions,
    }
}

#[cfg(test)]
fn rigid_move(num_trial: usize) -> ChainRegrowthMove {
    ChainRegrowthMove::new(
        GrowthPolicy::new(GrowthParams::Rigid, SpeciesGeometry::default()),
        num_trial,
        1.0,
    )
}

#[cfg(test)]
fn flexible_move(num_trial: usize) -> ChainRegrowthMove {
    ChainRegrowthMove::new(
        GrowthPolicy::new(
            GrowthParams::Flexible(super::growth::FlexibleParams::default()),
            SpeciesGeometry::default(),
        ),
        num_trial,
        1.0,
    )
}

#[test]
fn zero_energy_gives_unit_ratio() {
    let mut rng = MyRng::seed_from_u64(1);
    let mut chains = mk_chains(Field::Zero);
    let mut mv = rigid_move(20);
    for _ in 0..1000 {
        assert!(mv.propose(&mut chains, &mut rng));
        assert_eq!(mv.weight_ratio(), 1.0);
        mv.on_accept(&mut chains);
    }
}

#[test]
fn rejection_restores_exactly() {
    let mut rng = MyRng::seed_from_u64(2);
    let mut chains = mk_chains(Field::Tether(1.0));
    let original = chains.positions.clone();
    for mv in &mut [rigid_move(5), flexible_move(5)] {
        for _ in 0..100 {
            assert!(mv.propose(&mut chains, &mut rng));
            assert_ne!(chains.positions, original);
            mv.on_reject(&mut chains);
            assert_eq!(chains.positions, original);
            // A second rejection changes nothing.
            mv.on_reject(&mut chains);
            assert_eq!(chains.positions, original);
        }
    }
}

#[test]
fn weights_are_positive() {
    let mut rng = MyRng::seed_from_u64(3);
    let mut chains = mk_chains(Field::Tether(2.0));
    let mut mv = flexible_move(8);
    for i in 0..200 {
        assert!(mv.propose(&mut chains, &mut rng));
        let w = mv.rosenbluth();
        assert!(w.new > 0.0 && w.old > 0.0);
        assert!(mv.weight_ratio() > 0.0);
        if i % 2 == 0 {
            mv.on_accept(&mut chains);
        } else {
            mv.on_reject(&mut chains);
        }
    }
}

#[test]
fn infinite_energy_is_a_hard_reject() {
    let mut rng = MyRng::seed_from_u64(4);
    let mut chains = mk_chains(Field::NoEnds);
    let original = chains.positions.clone();
    let mut mv = rigid_move(20);
    for _ in 0..100 {
        assert!(!mv.propose(&mut chains, &mut rng));
        assert_eq!(chains.positions, original);
        assert_eq!(mv.weight_ratio(), 0.0);
        mv.on_reject(&mut chains);
        assert_eq!(chains.positions, original);
    }
}

#[test]
fn single_trial_retrace_is_the_boltzmann_factor() {
    let mut rng = MyRng::seed_from_u64(5);
    let k = 0.7;
    let mut chains = mk_chains(Field::Tether(k));
    let mut mv = rigid_move(1);
    for _ in 0..100 {
        let which = chains.pick_random_molecule(&mut rng);
        let before = chains.molecule(which).to_vec();
        assert!(mv.propose_molecule(&mut chains, which, &mut rng));
        let mut expected = 1.0;
        for &atom in mv.regrown_atoms() {
            expected *= (-mv.beta() * k * before[atom].norm2()).exp();
        }
        let old = mv.rosenbluth().old;
        println!("old weight {} vs {}", old, expected);
        assert!((old - expected).abs() <= 1e-12 * expected);
        mv.on_reject(&mut chains);
    }
}

#[test]
fn affected_atoms_are_the_regrown_molecule() {
    let mut rng = MyRng::seed_from_u64(6);
    let mut chains = mk_chains(Field::Zero);
    let mut mv = rigid_move(3);
    assert_eq!(mv.affected_atoms(), None);
    assert!(mv.propose_molecule(&mut chains, 1, &mut rng));
    assert_eq!(
        mv.affected_atoms(),
        Some(AffectedAtoms {
            molecule: 1,
            num_atoms: 6
        })
    );
    // Rigid regrowth never moves the first atom in growth order.
    let regrown = mv.regrown_atoms();
    assert!(regrown.len() >= 1 && regrown.len() <= 5);
}

#[test]
fn rigid_regrowth_keeps_bonds() {
    use crate::geometry::bond_angle;
    let mut rng = MyRng::seed_from_u64(7);
    let mut chains = mk_chains(Field::Tether(0.1));
    let mut mv = rigid_move(10);
    let s = SpeciesGeometry::default();
    for _ in 0..500 {
        if mv.propose(&mut chains, &mut rng) {
            mv.on_accept(&mut chains);
        }
        for m in 0..2 {
            let chain = chains.molecule(m);
            for w in chain.windows(2) {
                assert!(((w[1] - w[0]).norm2().sqrt() - s.bond_length).abs() < 5e-6);
            }
            for w in chain.windows(3) {
                assert!((bond_angle(w[0], w[1], w[2]) - s.bond_angle).abs() < 5e-7);
            }
        }
    }
}
