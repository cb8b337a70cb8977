//! Regrowth that leaves the center of the molecule where it was.

use super::*;

use crate::system::ChainSystem;

/// A [`ChainRegrowthMove`] followed by the translation that puts the
/// geometric center of the molecule back where it started, so that
/// only the internal conformation changes.
///
/// The regrowth bias is only valid where the chain was grown, so the
/// energy change caused by the translation enters the acceptance test
/// through `energy_change`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CombinedTranslationMove {
    /// The regrowth that does the real work.
    pub inner: ChainRegrowthMove,
    #[serde(skip)]
    delta: Position,
    #[serde(skip)]
    translated: bool,
    #[serde(skip)]
    energy_change: Energy,
    #[serde(skip)]
    placed: Vec<bool>,
}

impl CombinedTranslationMove {
    /// Wrap a regrowth move.
    pub fn new(inner: ChainRegrowthMove) -> Self {
        CombinedTranslationMove {
            inner,
            delta: Position::default(),
            translated: false,
            energy_change: 0.0,
            placed: Vec::new(),
        }
    }

    /// The translation applied by the most recent trial.
    pub fn delta(&self) -> Position {
        self.delta
    }

    /// The energy of molecule `which`, counting each of its bonds to
    /// other molecules once.
    fn molecule_energy<S: ChainSystem + ?Sized>(&mut self, system: &S, which: usize) -> Energy {
        let n = system.molecule(which).len();
        self.placed.clear();
        self.placed.resize(n, true);
        let mut e = 0.0;
        for atom in 0..n {
            e += system.energy_of(which, atom, &self.placed);
            if e == std::f64::INFINITY {
                return e;
            }
        }
        e
    }
}

impl<S: ChainSystem + ?Sized> McMove<S> for CombinedTranslationMove {
    fn propose(&mut self, system: &mut S, rng: &mut MyRng) -> bool {
        self.translated = false;
        self.energy_change = 0.0;
        let which = system.pick_random_molecule(rng);
        let old_center = system.center(which);
        if !self.inner.propose_molecule(system, which, rng) {
            return false;
        }
        let grown = self.molecule_energy(system, which);
        self.delta = old_center - system.center(which);
        system.translate(which, self.delta);
        let moved = self.molecule_energy(system, which);
        if moved == std::f64::INFINITY {
            // The inner move restores every atom, translation included.
            self.inner.on_reject(system);
            self.energy_change = std::f64::INFINITY;
            return false;
        }
        // Intramolecular terms are unchanged by a translation and cancel.
        self.energy_change = moved - grown;
        self.translated = true;
        true
    }
    fn weight_ratio(&self) -> f64 {
        if self.energy_change == std::f64::INFINITY {
            0.0
        } else {
            self.inner.weight_ratio()
        }
    }
    fn energy_change(&self) -> Energy {
        self.energy_change
    }
    fn on_accept(&mut self, system: &mut S) {
        self.translated = false;
        self.inner.on_accept(system);
    }
    fn on_reject(&mut self, system: &mut S) {
        if let Some(which) = self.inner.molecule() {
            if self.translated {
                system.translate(which, self.delta * -1.0);
                self.translated = false;
            }
        }
        self.inner.on_reject(system);
    }
    fn affected_atoms(&self) -> Option<AffectedAtoms> {
        self.inner.affected_atoms()
    }
}

#[cfg(test)]
use crate::system::alkane::{AlkaneParams, Alkanes, Interaction};
#[cfg(test)]
use crate::system::{MoleculeSource, SpeciesGeometry};
#[cfg(test)]
use rand::SeedableRng;

#[cfg(test)]
fn mk_move() -> CombinedTranslationMove {
    CombinedTranslationMove::new(ChainRegrowthMove::new(
        GrowthPolicy::new(GrowthParams::Rigid, SpeciesGeometry::default()),
        10,
        1.0,
    ))
}

#[cfg(test)]
fn mk_alkanes() -> Alkanes {
    let mut params = AlkaneParams::default();
    params.cells = 2;
    params._interaction = Interaction::Ideal;
    Alkanes::from(params)
}

#[test]
fn center_is_restored() {
    let mut rng = MyRng::seed_from_u64(1);
    let mut alkanes = mk_alkanes();
    let mut mv = mk_move();
    for _ in 0..500 {
        let centers: Vec<_> = (0..alkanes.num_molecules())
            .map(|m| alkanes.center(m))
            .collect();
        assert!(mv.propose(&mut alkanes, &mut rng));
        assert_eq!(McMove::<Alkanes>::weight_ratio(&mv), 1.0);
        assert_eq!(McMove::<Alkanes>::energy_change(&mv), 0.0);
        for (m, &c) in centers.iter().enumerate() {
            assert!((alkanes.center(m) - c).norm2() < 1e-24);
        }
        mv.on_accept(&mut alkanes);
    }
}

#[test]
fn rejection_undoes_translation_and_regrowth() {
    let mut rng = MyRng::seed_from_u64(2);
    let mut alkanes = mk_alkanes();
    let original = alkanes.positions.clone();
    let mut mv = mk_move();
    for _ in 0..200 {
        assert!(mv.propose(&mut alkanes, &mut rng));
        assert!(mv.delta().norm2() > 0.0);
        mv.on_reject(&mut alkanes);
        assert_eq!(alkanes.positions, original);
    }
}

#[test]
fn translation_into_a_neighbor_is_refused() {
    let mut rng = MyRng::seed_from_u64(3);
    let mut params = AlkaneParams::default();
    params.cells = 2;
    let mut alkanes = Alkanes::from(params);
    let mut mv = mk_move();
    let mut refused = 0;
    for _ in 0..2_000 {
        let before = alkanes.positions.clone();
        if mv.propose(&mut alkanes, &mut rng) {
            assert_eq!(alkanes.compute_energy(), 0.0);
            assert_eq!(McMove::<Alkanes>::energy_change(&mv), 0.0);
            mv.on_accept(&mut alkanes);
        } else {
            assert_eq!(alkanes.positions, before);
            assert_eq!(McMove::<Alkanes>::weight_ratio(&mv), 0.0);
            refused += 1;
        }
    }
    println!("refused {} of 2000", refused);
}

#[test]
fn soft_energy_change_matches_total() {
    let mut rng = MyRng::seed_from_u64(4);
    let mut params = AlkaneParams::default();
    params.cells = 2;
    params._interaction = Interaction::SoftSphere {
        epsilon: 1.0,
        sigma: 1.0,
    };
    let mut alkanes = Alkanes::from(params);
    let mut mv = mk_move();
    for _ in 0..200 {
        if !mv.propose(&mut alkanes, &mut rng) {
            continue;
        }
        let which = mv.inner.molecule().unwrap();
        let after = alkanes.compute_energy();
        // Undo only the translation to see the energy of the grown chain.
        alkanes.translate(which, mv.delta() * -1.0);
        let grown = alkanes.compute_energy();
        alkanes.translate(which, mv.delta());
        let de = McMove::<Alkanes>::energy_change(&mv);
        assert!(
            (de - (after - grown)).abs() < 1e-9 * (1.0 + after.abs() + grown.abs()),
            "{} vs {}",
            de,
            after - grown
        );
        mv.on_reject(&mut alkanes);
    }
}
