use criterion::{black_box, criterion_group, BenchmarkId, Criterion};
use bcsvmc::{Ansatz, ConfigurationSampler, SamplerParams, SquareLattice};

const SEED: u64 = 1434;
const VPARAMS: [f64; 2] = [0.25, -0.3];

fn ready_sampler(l: usize) -> ConfigurationSampler<bcsvmc::BcsWavefunction> {
    let lattice = SquareLattice::new(l, l).unwrap();
    let params = SamplerParams { allow_double_occupancy: false, ..SamplerParams::default() };
    let mut sampler = ConfigurationSampler::init(&lattice, Ansatz::DWaveBcs, 0.125, params, SEED).unwrap();
    sampler.build(&VPARAMS).unwrap();
    sampler.init_state().unwrap();
    sampler
}

pub fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sweep projected d-wave BCS");
    group.significance_level(0.1).sample_size(100);
    for l in [4, 6, 8, 10] {
        let mut sampler = ready_sampler(l);
        group.bench_with_input(BenchmarkId::from_parameter(l * l), &l, |b, _| {
            b.iter(|| sampler.update_state().unwrap())
        });
    }
    group.finish();
}

pub fn bench_local_energy(c: &mut Criterion) {
    let mut sampler = ready_sampler(8);
    c.bench_function("Local energy 8x8", |b| b.iter(|| black_box(sampler.energy())));
}

pub fn bench_refresh(c: &mut Criterion) {
    let mut sampler = ready_sampler(8);
    c.bench_function("Inverse refresh 8x8", |b| b.iter(|| sampler.refresh_inverse().unwrap()));
}

criterion_group!(benches, bench_sweep, bench_local_energy, bench_refresh,);
