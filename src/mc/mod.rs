//! The outer Monte Carlo loop, which chooses moves and decides
//! whether to accept them.

pub mod plugin;

use crate::atomicfile::AtomicFile;
use crate::moves::{
    AffectedAtoms, ChainRegrowthMove, CombinedTranslationMove, GrowthParams, GrowthPolicy, McMove,
};
use crate::rng::{self, MyRng};
use crate::system::*;

use auto_args::AutoArgs;
use rand::SeedableRng;
use std::path::PathBuf;

/// The version of the code, as reported by git.
pub const VERSION: &str = git_version::git_version!(
    args = ["--always", "--dirty"],
    fallback = "unknown"
);

/// A Monte Carlo algorithm.
pub trait MonteCarlo {
    /// Make one random move, collecting appropriate statistics.
    fn move_once(&mut self);

    /// The number of moves that have been made.
    fn num_moves(&self) -> u64;

    /// The number of rejected moves.
    fn num_rejected_moves(&self) -> u64;
}

/// The parameters needed to configure a simulation.
#[derive(Debug, AutoArgs, Clone)]
pub struct MCParams {
    /// The seed for the random number generator.
    pub seed: Option<u64>,
    /// The temperature, in units of the well depth.
    pub temperature: f64,
    /// The number of trial positions for each atom (default 20).
    pub num_trial: Option<usize>,
    /// How the chains are regrown.
    pub _growth: GrowthParams,
    /// How often to regrow in place, relative to the other moves.
    pub regrowth_weight: Option<f64>,
    /// How often to regrow and recenter, relative to the other moves.
    pub combined_weight: Option<f64>,
    /// report input
    pub _report: plugin::ReportParams,
    /// save input
    pub _save: plugin::SaveParams,
}

impl Default for MCParams {
    fn default() -> Self {
        MCParams {
            seed: None,
            temperature: 1.0,
            num_trial: None,
            _growth: GrowthParams::default(),
            regrowth_weight: None,
            combined_weight: None,
            _report: plugin::ReportParams::default(),
            _save: plugin::SaveParams::default(),
        }
    }
}

#[derive(AutoArgs, Debug)]
#[allow(non_camel_case_types)]
enum Params<MP, SP> {
    _Params {
        _sys: SP,
        _mc: MP,
        save_as: Option<PathBuf>,
    },
    ResumeFrom(PathBuf),
}

/// Either of the chain moves.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum MoveKind {
    /// Regrow a chain in place.
    Regrowth(ChainRegrowthMove),
    /// Regrow a chain and put its center back.
    Combined(CombinedTranslationMove),
}

impl MoveKind {
    /// A short name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            MoveKind::Regrowth(_) => "regrowth",
            MoveKind::Combined(_) => "combined",
        }
    }
}

impl<S: ChainSystem + ?Sized> McMove<S> for MoveKind {
    fn propose(&mut self, system: &mut S, rng: &mut MyRng) -> bool {
        match self {
            MoveKind::Regrowth(m) => m.propose(system, rng),
            MoveKind::Combined(m) => m.propose(system, rng),
        }
    }
    fn weight_ratio(&self) -> f64 {
        match self {
            MoveKind::Regrowth(m) => m.weight_ratio(),
            MoveKind::Combined(m) => McMove::<S>::weight_ratio(m),
        }
    }
    fn energy_change(&self) -> Energy {
        match self {
            MoveKind::Regrowth(m) => McMove::<S>::energy_change(m),
            MoveKind::Combined(m) => McMove::<S>::energy_change(m),
        }
    }
    fn on_accept(&mut self, system: &mut S) {
        match self {
            MoveKind::Regrowth(m) => m.on_accept(system),
            MoveKind::Combined(m) => m.on_accept(system),
        }
    }
    fn on_reject(&mut self, system: &mut S) {
        match self {
            MoveKind::Regrowth(m) => m.on_reject(system),
            MoveKind::Combined(m) => m.on_reject(system),
        }
    }
    fn affected_atoms(&self) -> Option<AffectedAtoms> {
        match self {
            MoveKind::Regrowth(m) => m.affected_atoms(),
            MoveKind::Combined(m) => McMove::<S>::affected_atoms(m),
        }
    }
}

/// How a move has fared.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MoveStatistics {
    /// The number of times the move was tried.
    pub attempted: u64,
    /// The number of times it was accepted.
    pub accepted: u64,
    /// The number of times no chain could be grown at all.
    pub hard_rejected: u64,
}

impl MoveStatistics {
    /// The fraction of attempts that were accepted.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

/// A move, how often to make it, and how it has done.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlannedMove {
    /// The relative frequency of this move.
    pub weight: f64,
    /// The move itself.
    pub kind: MoveKind,
    /// What has happened so far.
    pub stats: MoveStatistics,
}

/// A simulation of chain molecules.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChainMC<S> {
    /// The random number generator.
    pub rng: MyRng,
    /// Where to save the resume file.
    pub save_as: PathBuf,
    /// The number of MC moves we have done
    pub moves: u64,
    /// Number of rejected moves
    pub rejected_moves: u64,
    /// The temperature
    pub temperature: f64,
    /// The moves we choose from
    pub move_plan: Vec<PlannedMove>,

    /// The system itself
    pub system: S,

    report: plugin::Report,
    save: plugin::Save,
}

impl<S: ChainSystem + Species + serde::Serialize + serde::de::DeserializeOwned> ChainMC<S> {
    /// Set up a simulation of `system`.
    pub fn from_params(params: MCParams, system: S, save_as: PathBuf) -> Self {
        let rng = MyRng::seed_from_u64(params.seed.unwrap_or(0));
        let num_trial = params.num_trial.unwrap_or(20);
        let policy = GrowthPolicy::new(params._growth, system.species());
        let regrowth = ChainRegrowthMove::new(policy, num_trial, params.temperature);
        let mut move_plan = Vec::new();
        let regrowth_weight = params.regrowth_weight.unwrap_or(1.0);
        let combined_weight = params.combined_weight.unwrap_or(1.0);
        if regrowth_weight > 0.0 {
            move_plan.push(PlannedMove {
                weight: regrowth_weight,
                kind: MoveKind::Regrowth(regrowth.clone()),
                stats: MoveStatistics::default(),
            });
        }
        if combined_weight > 0.0 {
            move_plan.push(PlannedMove {
                weight: combined_weight,
                kind: MoveKind::Combined(CombinedTranslationMove::new(regrowth)),
                stats: MoveStatistics::default(),
            });
        }
        assert!(!move_plan.is_empty(), "we need at least one kind of move");
        ChainMC {
            rng,
            save_as,
            moves: 0,
            rejected_moves: 0,
            temperature: params.temperature,
            move_plan,
            system,
            report: plugin::Report::from(params._report),
            save: plugin::Save::from(params._save),
        }
    }

    /// Create a new simulation from command-line flags.
    pub fn from_args<A: AutoArgs + Into<S>>() -> Self {
        println!("git version: {}", VERSION);
        match <Params<MCParams, A>>::from_args() {
            Params::_Params { _sys, _mc, save_as } => {
                if let Some(ref save_as) = save_as {
                    if let Ok(f) = std::fs::File::open(save_as) {
                        let mut s = match save_as.extension().and_then(|x| x.to_str()) {
                            Some("yaml") => serde_yaml::from_reader::<_, Self>(&f)
                                .expect("error parsing save-as file"),
                            Some("json") => serde_json::from_reader::<_, Self>(&f)
                                .expect("error parsing save-as file"),
                            Some("cbor") => serde_cbor::from_reader::<Self, _>(&f)
                                .expect("error parsing save-as file"),
                            _ => panic!("I don't know how to read file {:?}", f),
                        };
                        println!("Resuming from file {:?}", save_as);
                        s.report.update_from(_mc._report);
                        s.save.update_from(_mc._save);
                        return s;
                    }
                }
                let save_as = save_as.unwrap_or_else(|| PathBuf::from("resume.yaml"));
                Self::from_params(_mc, _sys.into(), save_as)
            }
            Params::ResumeFrom(p) => {
                let f = std::fs::File::open(&p)
                    .unwrap_or_else(|e| panic!("error reading file {:?}: {}", &p, e));
                match p.extension().and_then(|x| x.to_str()) {
                    Some("yaml") => serde_yaml::from_reader(&f).expect("error reading checkpoint?!"),
                    Some("json") => serde_json::from_reader(&f).expect("error reading checkpoint?!"),
                    Some("cbor") => serde_cbor::from_reader(&f).expect("error reading checkpoint?!"),
                    _ => panic!("I don't know how to read file {:?}", f),
                }
            }
        }
    }

    /// Create a simulation checkpoint.
    pub fn checkpoint(&mut self) {
        self.report.print(self.moves);
        if !self.report.quiet {
            println!(
                "    Rejected {:.2}% of {} moves",
                100.0 * self.rejected_moves as f64 / self.moves.max(1) as f64,
                self.moves
            );
            for m in self.move_plan.iter() {
                println!(
                    "    {:>8}: accepted {:.2}% of {} ({} could not grow)",
                    m.kind.name(),
                    100.0 * m.stats.acceptance_ratio(),
                    m.stats.attempted,
                    m.stats.hard_rejected
                );
            }
        }
        let f = AtomicFile::create(&self.save_as)
            .unwrap_or_else(|e| panic!("error creating file {:?}: {}", self.save_as, e));
        match self.save_as.extension().and_then(|x| x.to_str()) {
            Some("yaml") => serde_yaml::to_writer(&f, self).expect("error writing checkpoint?!"),
            Some("json") => serde_json::to_writer(&f, self).expect("error writing checkpoint?!"),
            Some("cbor") => serde_cbor::to_writer(&f, self).expect("error writing checkpoint?!"),
            _ => panic!("I don't know how to create file {:?}", self.save_as),
        }
        f.commit()
            .unwrap_or_else(|e| panic!("error saving {:?}: {}", self.save_as, e));
    }

    /// Run until the report says we are done, saving along the way.
    pub fn run(&mut self) {
        while !self.report.am_all_done(self.moves) {
            self.move_once();
            if self.save.shall_i_save(self.moves) {
                self.checkpoint();
            }
        }
        self.checkpoint();
        if !self.report.quiet {
            println!("All done!");
        }
    }

    fn pick_move(&mut self) -> usize {
        let total: f64 = self.move_plan.iter().map(|m| m.weight).sum();
        let mut x = rng::uniform01(&mut self.rng) * total;
        for (i, m) in self.move_plan.iter().enumerate() {
            if x < m.weight {
                return i;
            }
            x -= m.weight;
        }
        self.move_plan.len() - 1
    }
}

impl<S: ChainSystem + Species + serde::Serialize + serde::de::DeserializeOwned> MonteCarlo
    for ChainMC<S>
{
    fn move_once(&mut self) {
        self.moves += 1;
        let i = self.pick_move();
        let beta = 1.0 / self.temperature;
        let planned = &mut self.move_plan[i];
        planned.stats.attempted += 1;
        if !planned.kind.propose(&mut self.system, &mut self.rng) {
            planned.stats.hard_rejected += 1;
            self.rejected_moves += 1;
            return;
        }
        let de = McMove::<S>::energy_change(&planned.kind);
        let p = McMove::<S>::weight_ratio(&planned.kind) * (-beta * de).exp();
        if p >= 1.0 || rng::uniform01(&mut self.rng) < p {
            planned.kind.on_accept(&mut self.system);
            planned.stats.accepted += 1;
        } else {
            planned.kind.on_reject(&mut self.system);
            self.rejected_moves += 1;
        }
    }
    fn num_moves(&self) -> u64 {
        self.moves
    }
    fn num_rejected_moves(&self) -> u64 {
        self.rejected_moves
    }
}

#[cfg(test)]
use crate::system::alkane::{AlkaneParams, Alkanes, Interaction};

#[cfg(test)]
fn mk_mc(interaction: Interaction, save_as: PathBuf) -> ChainMC<Alkanes> {
    let mut sys = AlkaneParams::default();
    sys.cells = 2;
    sys._interaction = interaction;
    let mut params = MCParams::default();
    params.seed = Some(17);
    params.num_trial = Some(8);
    ChainMC::from_params(params, Alkanes::from(sys), save_as)
}

#[test]
fn ideal_chains_always_accept() {
    let mut mc = mk_mc(Interaction::Ideal, PathBuf::from("unused.yaml"));
    for _ in 0..2000 {
        mc.move_once();
    }
    assert_eq!(mc.num_moves(), 2000);
    assert_eq!(mc.num_rejected_moves(), 0);
    let attempted: u64 = mc.move_plan.iter().map(|m| m.stats.attempted).sum();
    assert_eq!(attempted, 2000);
    for m in mc.move_plan.iter() {
        assert!(m.stats.attempted > 0);
        assert_eq!(m.stats.acceptance_ratio(), 1.0);
    }
}

#[test]
fn hard_spheres_keep_rigid_geometry() {
    let mut mc = mk_mc(Interaction::HardSphere { sigma: 1.0 }, PathBuf::from("unused.yaml"));
    let validator = crate::validate::ConfigurationValidator::new(mc.system.species());
    for _ in 0..2000 {
        mc.move_once();
        assert_eq!(validator.check(&mc.system), Ok(()));
        assert_eq!(mc.system.compute_energy(), 0.0);
    }
    let stats: Vec<_> = mc.move_plan.iter().map(|m| m.stats.clone()).collect();
    println!("statistics: {:?}", stats);
    for s in stats {
        assert!(s.accepted + s.hard_rejected <= s.attempted);
    }
}

#[test]
fn recentering_never_overlaps_hard_spheres() {
    let mut sys = AlkaneParams::default();
    sys.cells = 2;
    sys._interaction = Interaction::HardSphere { sigma: 1.0 };
    let mut params = MCParams::default();
    params.seed = Some(5);
    params.num_trial = Some(8);
    params.regrowth_weight = Some(0.0);
    params.combined_weight = Some(1.0);
    let mut mc = ChainMC::from_params(params, Alkanes::from(sys), PathBuf::from("unused.yaml"));
    assert_eq!(mc.move_plan.len(), 1);
    for i in 0..5000 {
        mc.move_once();
        assert_eq!(mc.system.compute_energy(), 0.0, "after move {}", i);
    }
    println!("statistics: {:?}", mc.move_plan[0].stats);
    assert!(mc.move_plan[0].stats.accepted > 0);
}

#[test]
fn checkpoints_can_be_read_back() {
    let dir = tempfile::tempdir().expect("Unable to create temp directory");
    for &ext in &["yaml", "json", "cbor"] {
        let save_as = dir.path().join(format!("resume.{}", ext));
        let mut mc = mk_mc(Interaction::HardSphere { sigma: 1.0 }, save_as.clone());
        for _ in 0..100 {
            mc.move_once();
        }
        mc.checkpoint();
        let f = std::fs::File::open(&save_as).unwrap();
        let mut back: ChainMC<Alkanes> = match ext {
            "yaml" => serde_yaml::from_reader(&f).unwrap(),
            "json" => serde_json::from_reader(&f).unwrap(),
            _ => serde_cbor::from_reader(&f).unwrap(),
        };
        assert_eq!(back.moves, mc.moves);
        assert_eq!(back.move_plan.len(), mc.move_plan.len());
        for (a, b) in back.system.positions.iter().zip(mc.system.positions.iter()) {
            assert!((*a - *b).norm2() < 1e-24);
        }
        if ext == "json" {
            continue;
        }
        // The restored simulation carries on exactly as the original.
        for _ in 0..100 {
            mc.move_once();
            back.move_once();
        }
        assert_eq!(back.system.positions, mc.system.positions);
        assert_eq!(back.rejected_moves, mc.rejected_moves);
    }
}
