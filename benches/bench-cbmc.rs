#[macro_use]
extern crate criterion;

use criterion::Criterion;
use rand::SeedableRng;

use cbmc::mc::{ChainMC, MCParams, MonteCarlo};
use cbmc::moves::{ChainRegrowthMove, GrowthParams, GrowthPolicy, McMove};
use cbmc::moves::growth::FlexibleParams;
use cbmc::rng::{vector, MyRng};
use cbmc::system::alkane::{AlkaneParams, Alkanes, Interaction};
use cbmc::system::{PotentialEvaluator, Species};

fn gen_alkanes(cells: usize) -> Alkanes {
    let mut params = AlkaneParams::default();
    params.cells = cells;
    params._interaction = Interaction::HardSphere { sigma: 1.0 };
    Alkanes::from(params)
}

fn gen_mc(cells: usize) -> ChainMC<Alkanes> {
    let mut params = MCParams::default();
    params.seed = Some(1);
    let fname = std::path::PathBuf::from("bench.yaml");
    let mut mc = ChainMC::from_params(params, gen_alkanes(cells), fname);
    // Randomize things a bit before beginning.
    for _ in 0..cells * cells * cells * 100 {
        mc.move_once();
    }
    mc
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = MyRng::seed_from_u64(0);
    c.bench_function("rng::vector", move |b| b.iter(|| vector(&mut rng)));

    c.bench_function_over_inputs(
        "rigid_propose",
        move |b, &&cells| {
            let mut alkanes = gen_alkanes(cells);
            let mut rng = MyRng::seed_from_u64(2);
            let mut mv = ChainRegrowthMove::new(
                GrowthPolicy::new(GrowthParams::Rigid, alkanes.species()),
                20,
                1.0,
            );
            b.iter(|| {
                mv.propose(&mut alkanes, &mut rng);
                mv.on_reject(&mut alkanes);
            })
        },
        &[2, 3, 4],
    );

    c.bench_function_over_inputs(
        "flexible_propose",
        move |b, &&cells| {
            let mut alkanes = gen_alkanes(cells);
            let mut rng = MyRng::seed_from_u64(2);
            let mut mv = ChainRegrowthMove::new(
                GrowthPolicy::new(
                    GrowthParams::Flexible(FlexibleParams::default()),
                    alkanes.species(),
                ),
                20,
                1.0,
            );
            b.iter(|| {
                mv.propose(&mut alkanes, &mut rng);
                mv.on_reject(&mut alkanes);
            })
        },
        &[2, 3],
    );

    c.bench_function_over_inputs(
        "chain_mc_move_once",
        move |b, &&cells| {
            let mut mc = gen_mc(cells);
            b.iter(|| mc.move_once())
        },
        &[2, 3],
    );

    c.bench_function("energy_of", move |b| {
        let alkanes = gen_alkanes(3);
        let placed = vec![true; 6];
        b.iter(|| alkanes.energy_of(13, 2, &placed))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
