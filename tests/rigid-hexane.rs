use cbmc::moves::{
    ChainRegrowthMove, CombinedTranslationMove, GrowthParams, GrowthPolicy, McMove,
};
use cbmc::rng::MyRng;
use cbmc::system::alkane::{AlkaneParams, Alkanes, Interaction};
use cbmc::system::{
    Energy, MoleculeSource, Position, PotentialEvaluator, Species, SpeciesGeometry,
    TrialPositionSource,
};
use cbmc::validate::ConfigurationValidator;
use rand::SeedableRng;

fn ideal_hexanes(cells: usize) -> Alkanes {
    let mut params = AlkaneParams::default();
    params.cells = cells;
    params._interaction = Interaction::Ideal;
    Alkanes::from(params)
}

fn rigid_move(species: SpeciesGeometry) -> ChainRegrowthMove {
    ChainRegrowthMove::new(GrowthPolicy::new(GrowthParams::Rigid, species), 20, 1.0)
}

#[test]
fn ideal_rigid_hexane_always_has_unit_ratio() {
    let mut rng = MyRng::seed_from_u64(2019);
    let mut alkanes = ideal_hexanes(1);
    let species = alkanes.species();
    let validator = ConfigurationValidator::new(species);
    let mut mv = rigid_move(species);
    for i in 0..10_000 {
        assert!(mv.propose(&mut alkanes, &mut rng));
        assert_eq!(mv.weight_ratio(), 1.0, "trial {}", i);
        mv.on_accept(&mut alkanes);
        if let Err(e) = validator.check(&alkanes) {
            panic!("after trial {}: {}", i, e);
        }
    }
}

#[test]
fn combined_move_keeps_geometry_and_center() {
    let mut rng = MyRng::seed_from_u64(7);
    let mut alkanes = ideal_hexanes(2);
    let species = alkanes.species();
    let validator = ConfigurationValidator::new(species);
    let mut mv = CombinedTranslationMove::new(rigid_move(species));
    for i in 0..2_000 {
        let centers: Vec<Position> = (0..alkanes.num_molecules())
            .map(|m| alkanes.center(m))
            .collect();
        assert!(mv.propose(&mut alkanes, &mut rng));
        assert_eq!(McMove::<Alkanes>::weight_ratio(&mv), 1.0);
        if i % 3 == 0 {
            let before = alkanes.positions.clone();
            mv.on_reject(&mut alkanes);
            assert_ne!(alkanes.positions, before);
        } else {
            mv.on_accept(&mut alkanes);
        }
        for (m, &c) in centers.iter().enumerate() {
            assert!((alkanes.center(m) - c).norm2() < 1e-20);
        }
        validator.check(&alkanes).unwrap();
    }
}

#[test]
fn hard_sphere_hexanes_never_overlap() {
    let mut rng = MyRng::seed_from_u64(3);
    let mut params = AlkaneParams::default();
    params.cells = 2;
    let mut alkanes = Alkanes::from(params);
    let mut mv = rigid_move(alkanes.species());
    let mut accepted = 0;
    for _ in 0..2_000 {
        if mv.propose(&mut alkanes, &mut rng) && rand::Rng::gen::<f64>(&mut rng) < mv.weight_ratio() {
            mv.on_accept(&mut alkanes);
            accepted += 1;
        } else {
            mv.on_reject(&mut alkanes);
        }
        assert_eq!(alkanes.compute_energy(), 0.0);
    }
    println!("accepted {} of 2000", accepted);
    assert!(accepted > 0);
}

/// A single chain in an impenetrable field that forbids one atom from
/// ever being placed.
struct Forbidden {
    chain: Vec<Position>,
}

impl MoleculeSource for Forbidden {
    fn num_molecules(&self) -> usize {
        1
    }
    fn molecule(&self, _which: usize) -> &[Position] {
        &self.chain
    }
    fn molecule_mut(&mut self, _which: usize) -> &mut [Position] {
        &mut self.chain
    }
}

impl PotentialEvaluator for Forbidden {
    fn energy_of(&self, _molecule: usize, atom: usize, _placed: &[bool]) -> Energy {
        if atom == 0 || atom == self.chain.len() - 1 {
            std::f64::INFINITY
        } else {
            0.0
        }
    }
}

impl TrialPositionSource for Forbidden {
    fn random_position_in_box(&self, _rng: &mut MyRng) -> Position {
        Position::new(0.0, 0.0, 0.0)
    }
}

#[test]
fn infinite_energy_leaves_chain_alone() {
    let mut rng = MyRng::seed_from_u64(11);
    let species = SpeciesGeometry::default();
    let mut sys = Forbidden {
        chain: species.all_trans(
            Position::new(0.5, 0.5, 0.5),
            Position::new(0.0, 0.0, 1.0),
            Position::new(1.0, 0.0, 0.0),
        ),
    };
    let original = sys.chain.clone();
    let mut mv = rigid_move(species);
    let mut combined = CombinedTranslationMove::new(rigid_move(species));
    for _ in 0..100 {
        assert!(!mv.propose(&mut sys, &mut rng));
        assert_eq!(sys.chain, original);
        assert!(!combined.propose(&mut sys, &mut rng));
        assert_eq!(sys.chain, original);
        combined.on_reject(&mut sys);
        assert_eq!(sys.chain, original);
    }
}

#[test]
#[should_panic]
fn rigid_policy_refuses_torsion_energy() {
    GrowthPolicy::new(GrowthParams::Rigid, SpeciesGeometry::default()).torsion_energy(3.0);
}
