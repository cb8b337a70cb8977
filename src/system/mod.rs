//! Systems hold the molecules that moves act upon, and know the
//! energy of each atom.

use crate::rng::MyRng;
use vector3d::Vector3d;

pub mod alkane;
pub mod species;

pub use self::species::SpeciesGeometry;

/// An energy, in units of the well depth ε.
pub type Energy = f64;

/// A distance, in units of the atom diameter σ.
pub type Length = f64;

/// A position (or displacement) in space.
pub type Position = Vector3d<Length>;

/// Names one atom of one molecule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtomIndex {
    /// Which molecule.
    pub molecule: usize,
    /// Which atom within the molecule, in chain order.
    pub atom: usize,
}

/// Something holding a set of linear chain molecules.
pub trait MoleculeSource {
    /// The number of molecules.
    fn num_molecules(&self) -> usize;
    /// The atom positions of a molecule, in chain order.
    fn molecule(&self, which: usize) -> &[Position];
    /// Mutable access to the atom positions of a molecule.
    fn molecule_mut(&mut self, which: usize) -> &mut [Position];
    /// Pick a molecule uniformly at random.
    fn pick_random_molecule(&self, rng: &mut MyRng) -> usize {
        crate::rng::uniform_int(rng, self.num_molecules())
    }
    /// The geometric center of a molecule.
    fn center(&self, which: usize) -> Position {
        crate::geometry::center(self.molecule(which))
    }
    /// Shift every atom of a molecule by `delta`.
    fn translate(&mut self, which: usize, delta: Position) {
        for r in self.molecule_mut(which).iter_mut() {
            *r = *r + delta;
        }
    }
}

/// Something that knows the interaction energy of an atom.
pub trait PotentialEvaluator {
    /// The energy of atom `atom` of molecule `molecule` at its currently
    /// stored position, interacting with every atom of every other
    /// molecule, plus those atoms `j` of its own molecule for which
    /// `placed[j]` is true.  May be infinite.
    fn energy_of(&self, molecule: usize, atom: usize, placed: &[bool]) -> Energy;
}

/// Something with a volume that a chain may be grown into.
pub trait TrialPositionSource {
    /// A position uniformly distributed in the simulation volume.
    fn random_position_in_box(&self, rng: &mut MyRng) -> Position;
}

/// Something whose chains all share one geometry.
pub trait Species {
    /// The geometry of every chain.
    fn species(&self) -> SpeciesGeometry;
}

/// Everything a chain regrowth move needs from a system.
pub trait ChainSystem: MoleculeSource + PotentialEvaluator + TrialPositionSource {}

impl<S: MoleculeSource + PotentialEvaluator + TrialPositionSource> ChainSystem for S {}
