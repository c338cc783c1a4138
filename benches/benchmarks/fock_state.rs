use criterion::{black_box, criterion_group, Criterion};
use bcsvmc::FockConfiguration;

const SEED: u64 = 42;

pub fn bench_propose_undo(c: &mut Criterion) {
    let mut conf = FockConfiguration::new(64, false, SEED);
    conf.init_spins(28, 28).unwrap();
    c.bench_function("Propose and undo hop 64 sites", |b| {
        b.iter(|| {
            black_box(conf.propose_up_hop());
            conf.undo();
        })
    });
}

pub fn bench_op_hop(c: &mut Criterion) {
    let mut conf = FockConfiguration::new(64, true, SEED);
    conf.init_spins(32, 32).unwrap();
    c.bench_function("Hop operator with sign 64 sites", |b| {
        b.iter(|| {
            black_box(conf.op_hop_up(black_box(3), black_box(40)));
            conf.undo();
        })
    });
}

criterion_group!(benches, bench_propose_undo, bench_op_hop,);
