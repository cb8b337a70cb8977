//! Monte Carlo moves that regrow chain molecules with configurational
//! bias.
//!
//! A move is driven by an outer integrator in four steps: `propose`
//! changes the system and reports whether a trial was made at all,
//! `weight_ratio` (together with `energy_change`) gives the bias that
//! enters the acceptance test, and exactly one of `on_accept` or
//! `on_reject` finishes the trial.

use crate::rng::MyRng;
use crate::system::{AtomIndex, Energy, Position};

pub mod combined;
pub mod growth;
pub mod regrowth;

pub use self::combined::CombinedTranslationMove;
pub use self::growth::{FlexibleChainGrowth, GrowthParams, GrowthPolicy, RigidLatticeGrowth};
pub use self::regrowth::ChainRegrowthMove;

/// A trial move as seen by the outer integrator.
pub trait McMove<S: ?Sized> {
    /// Attempt a trial.  A `false` return means the trial was rejected
    /// outright and the system has already been restored.
    fn propose(&mut self, system: &mut S, rng: &mut MyRng) -> bool;
    /// The factor this trial contributes to the acceptance probability.
    fn weight_ratio(&self) -> f64;
    /// Any change in energy that should enter the acceptance test on
    /// top of `weight_ratio`.
    fn energy_change(&self) -> Energy {
        0.0
    }
    /// The trial was accepted.
    fn on_accept(&mut self, system: &mut S);
    /// The trial was rejected, so put everything back.
    fn on_reject(&mut self, system: &mut S);
    /// The atoms moved by the most recent trial.
    fn affected_atoms(&self) -> Option<AffectedAtoms>;
}

/// Every atom of one molecule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectedAtoms {
    /// The molecule.
    pub molecule: usize,
    /// The number of atoms in it.
    pub num_atoms: usize,
}

impl IntoIterator for AffectedAtoms {
    type Item = AtomIndex;
    type IntoIter = Box<dyn Iterator<Item = AtomIndex>>;
    fn into_iter(self) -> Self::IntoIter {
        let molecule = self.molecule;
        Box::new((0..self.num_atoms).map(move |atom| AtomIndex { molecule, atom }))
    }
}

/// The candidate positions for placing one atom, with their
/// unnormalized Boltzmann weights.
#[derive(Clone, Debug, Default)]
pub struct TrialBatch {
    /// The candidate positions.
    pub positions: Vec<Position>,
    /// The weight of each candidate.
    pub weights: Vec<f64>,
    /// The sum of `weights`.
    pub sum: f64,
}

impl TrialBatch {
    /// Make room for `num_trial` candidates.  This only allocates the
    /// first time.
    pub fn resize(&mut self, num_trial: usize) {
        self.positions.resize(num_trial, Position::default());
        self.weights.resize(num_trial, 0.0);
    }
    /// Forget the candidates of the previous step.
    pub fn clear(&mut self) {
        self.sum = 0.0;
    }
    /// Record candidate `which`.
    pub fn set(&mut self, which: usize, r: Position, weight: f64) {
        self.positions[which] = r;
        self.weights[which] = weight;
        self.sum += weight;
    }
    /// Choose a candidate with probability proportional to its weight,
    /// given a uniform random number `u` in `[0, 1)`.
    pub fn select(&self, u: f64) -> usize {
        let mut running = 0.0;
        for (i, &w) in self.weights.iter().enumerate() {
            running += w / self.sum;
            if running > u {
                return i;
            }
        }
        // Roundoff can leave the total just short of one.
        self.weights
            .iter()
            .rposition(|&w| w > 0.0)
            .unwrap_or(self.weights.len() - 1)
    }
}

/// The weight `exp(-βU)` of one candidate.  The first and last atoms
/// placed in a trial carry an extra factor of `num_trial`.
pub fn boltzmann_weight(energy: Energy, beta: f64, terminal: bool, num_trial: usize) -> f64 {
    let w = (-beta * energy).exp();
    if terminal {
        w * num_trial as f64
    } else {
        w
    }
}

/// The positions of a molecule before a trial.
#[derive(Clone, Debug, Default)]
pub struct SavedState {
    positions: Vec<Position>,
}

impl SavedState {
    /// Remember these positions.
    pub fn save(&mut self, positions: &[Position]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
    }
    /// Write the remembered positions back, exactly.
    pub fn restore(&self, positions: &mut [Position]) {
        positions.copy_from_slice(&self.positions);
    }
    /// The remembered positions.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }
}

/// The Rosenbluth weights of the new and old configurations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rosenbluth {
    /// The weight of the newly grown chain.
    pub new: f64,
    /// The weight of the retraced old chain.
    pub old: f64,
}

impl Rosenbluth {
    /// `new/old`, the factor entering the acceptance probability.
    pub fn ratio(&self) -> f64 {
        self.new / self.old
    }
}

#[test]
fn terminal_weight_carries_num_trial() {
    for &e in &[0.0, 0.5, 3.25, -1.0] {
        let inner = boltzmann_weight(e, 1.3, false, 20);
        let end = boltzmann_weight(e, 1.3, true, 20);
        assert_eq!(end, 20.0 * inner);
        assert_eq!(inner, (-1.3 * e).exp());
    }
    assert_eq!(boltzmann_weight(std::f64::INFINITY, 1.0, true, 20), 0.0);
}

#[test]
fn selection_follows_cumulative_weights() {
    let mut batch = TrialBatch::default();
    batch.resize(4);
    batch.clear();
    for (i, &w) in [1.0, 0.0, 3.0, 4.0].iter().enumerate() {
        batch.set(i, Position::new(i as f64, 0.0, 0.0), w);
    }
    assert_eq!(batch.sum, 8.0);
    assert_eq!(batch.select(0.0), 0);
    assert_eq!(batch.select(0.124), 0);
    assert_eq!(batch.select(0.126), 2);
    assert_eq!(batch.select(0.49), 2);
    assert_eq!(batch.select(0.51), 3);
    // A candidate with no weight is never chosen.
    for i in 0..100 {
        assert_ne!(batch.select(i as f64 / 100.0), 1);
    }
}

#[test]
fn selection_defaults_to_last_candidate() {
    let mut batch = TrialBatch::default();
    batch.resize(3);
    batch.clear();
    for i in 0..3 {
        batch.set(i, Position::default(), 0.1);
    }
    // Pretend roundoff made the total slightly too large.
    batch.sum = 0.30000001;
    assert_eq!(batch.select(0.9999999999), 2);
}

#[test]
fn saved_state_restores_exactly() {
    let original = vec![Position::new(0.1, 0.2, 0.3), Position::new(1.0 / 3.0, 2.0, -7.5)];
    let mut saved = SavedState::default();
    saved.save(&original);
    let mut moved = vec![Position::default(); 2];
    saved.restore(&mut moved);
    assert_eq!(moved, original);
}

#[test]
fn affected_atoms_lists_the_molecule() {
    let atoms: Vec<_> = AffectedAtoms {
        molecule: 3,
        num_atoms: 6,
    }
    .into_iter()
    .collect();
    assert_eq!(atoms.len(), 6);
    assert_eq!(atoms[5], AtomIndex { molecule: 3, atom: 5 });
}
