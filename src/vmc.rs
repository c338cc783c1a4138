use log::{debug, info};
use rayon::prelude::*;

use crate::errors::VmcError;
use crate::lattice::SquareLattice;
use crate::sampler::ConfigurationSampler;
use crate::statistics::{BinnedObservable, ChainEstimate, StatisticsSink};
use crate::wavefunction::{Ansatz, AmplitudeProvider};
use crate::SamplerParams;

/// Names of the measured observables, in sample order.
pub const OBSERVABLES: [&str; 2] = ["Energy", "DoubleOccupancy"];

/// Length of the Markov chain.
/// * __`num_samples`__ - Number of measurements.
/// * __`warmup_steps`__ - Sweeps discarded before the first measurement.
/// * __`interval`__ - Sweeps between two measurements.
#[derive(Debug, Clone, Copy)]
pub struct VmcParams {
    pub num_samples: usize,
    pub warmup_steps: usize,
    pub interval: usize,
}

impl Default for VmcParams {
    fn default() -> Self {
        VmcParams { num_samples: 5000, warmup_steps: 500, interval: 1 }
    }
}

/// Energy per site and double occupancy density of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct VmcResults {
    pub energy: f64,
    pub energy_error: f64,
    pub double_occupancy: f64,
    pub double_occupancy_error: f64,
    pub tau: Option<f64>,
    pub converged: bool,
    pub acceptance_ratio: f64,
    pub num_samples: usize,
}

impl VmcResults {
    fn from_observable(obs: &BinnedObservable, acceptance_ratio: f64) -> Self {
        let energy = obs.estimate(0);
        let dblocc = obs.estimate(1);
        VmcResults {
            energy: energy.mean,
            energy_error: energy.stddev,
            double_occupancy: dblocc.mean,
            double_occupancy_error: dblocc.stddev,
            tau: obs.tau(0),
            converged: obs.is_converged(0),
            acceptance_ratio,
            num_samples: obs.sample_count(),
        }
    }
}

/// Builds the amplitudes for `vparams`, draws a starting configuration,
/// thermalises, then pushes `[energy, double occupancy]` to `sink` every
/// `interval` sweeps.
pub fn run_simulation<A, S>(
    sampler: &mut ConfigurationSampler<A>,
    vparams: &[f64],
    params: &VmcParams,
    sink: &mut S,
) -> Result<(), VmcError>
where
    A: AmplitudeProvider,
    S: StatisticsSink,
{
    sampler.build(vparams)?;
    sampler.init_state()?;

    info!("Starting the warmup phase.");
    for _ in 0..params.warmup_steps {
        sampler.update_state()?;
    }

    info!("Starting the sampling phase.");
    let interval = params.interval.max(1);
    let report = (params.num_samples / 10).max(1);
    for n in 0..params.num_samples {
        for _ in 0..interval {
            sampler.update_state()?;
        }
        let sample = [sampler.energy(), sampler.double_occupancy_density()];
        sink.push(&sample);
        if (n + 1) % report == 0 {
            info!("Sample {}/{}, running energy: {:.6}", n + 1, params.num_samples, sink.mean()[0]);
        }
    }
    sampler.print_stats();
    Ok(())
}

/// Runs one BCS chain from scratch.
pub fn run_chain(
    lattice: &SquareLattice,
    ansatz: Ansatz,
    hole_doping: f64,
    vparams: &[f64],
    sampler_params: SamplerParams,
    params: &VmcParams,
    seed: u64,
) -> Result<VmcResults, VmcError> {
    let mut sampler = ConfigurationSampler::init(lattice, ansatz, hole_doping, sampler_params, seed)?;
    let mut obs = BinnedObservable::new("Observables", OBSERVABLES.len());
    run_simulation(&mut sampler, vparams, params, &mut obs)?;
    debug!("Chain with seed {} done:\n{}", seed, obs);
    Ok(VmcResults::from_observable(&obs, sampler.stats().acceptance_ratio()))
}

/// Merges independent chains. The error bars follow
/// [ChainEstimate::combine], the autocorrelation time is the largest one.
pub fn combine_chains(chains: &[VmcResults]) -> Option<VmcResults> {
    let energy: Vec<ChainEstimate> = chains
        .iter()
        .map(|c| ChainEstimate { mean: c.energy, stddev: c.energy_error, num_samples: c.num_samples })
        .collect();
    let dblocc: Vec<ChainEstimate> = chains
        .iter()
        .map(|c| ChainEstimate { mean: c.double_occupancy, stddev: c.double_occupancy_error, num_samples: c.num_samples })
        .collect();
    let energy = ChainEstimate::combine(&energy)?;
    let dblocc = ChainEstimate::combine(&dblocc)?;
    let tau = chains.iter().map(|c| c.tau).try_fold(0.0f64, |acc, t| t.map(|t| acc.max(t)));
    Some(VmcResults {
        energy: energy.mean,
        energy_error: energy.stddev,
        double_occupancy: dblocc.mean,
        double_occupancy_error: dblocc.stddev,
        tau,
        converged: chains.iter().all(|c| c.converged),
        acceptance_ratio: chains.iter().map(|c| c.acceptance_ratio).sum::<f64>() / chains.len() as f64,
        num_samples: energy.num_samples,
    })
}

/// One chain per seed on the rayon pool. Each chain owns its configuration
/// and matrices, only the final estimates are shared.
pub fn run_independent_chains(
    lattice: &SquareLattice,
    ansatz: Ansatz,
    hole_doping: f64,
    vparams: &[f64],
    sampler_params: SamplerParams,
    params: &VmcParams,
    seeds: &[u64],
) -> Result<Option<VmcResults>, VmcError> {
    let chains = seeds
        .par_iter()
        .map(|&seed| run_chain(lattice, ansatz, hole_doping, vparams, sampler_params, params, seed))
        .collect::<Result<Vec<VmcResults>, VmcError>>()?;
    Ok(combine_chains(&chains))
}

#[cfg(test)]
mod test {
    use super::*;

    fn chain(energy: f64, error: f64, tau: Option<f64>) -> VmcResults {
        VmcResults {
            energy,
            energy_error: error,
            double_occupancy: 0.0,
            double_occupancy_error: 0.0,
            tau,
            converged: tau.is_some(),
            acceptance_ratio: 50.0,
            num_samples: 100,
        }
    }

    #[test]
    fn test_combine_chains() {
        let total = combine_chains(&[chain(-1.0, 0.03, Some(2.0)), chain(-2.0, 0.04, Some(3.0))]).unwrap();
        assert!((total.energy + 1.5).abs() < 1e-12);
        assert!((total.energy_error - 0.025).abs() < 1e-12);
        assert_eq!(total.tau, Some(3.0));
        assert!(total.converged);
        assert_eq!(total.num_samples, 200);
    }

    #[test]
    fn test_combine_unconverged() {
        let total = combine_chains(&[chain(-1.0, 0.03, None), chain(-2.0, 0.04, Some(3.0))]).unwrap();
        assert_eq!(total.tau, None);
        assert!(!total.converged);
        assert!(combine_chains(&[]).is_none());
    }
}
