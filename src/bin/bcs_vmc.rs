use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::RngCore;
use rand_mt::Mt64;
use rayon::prelude::*;
use std::error::Error;
use std::path::PathBuf;

use bcsvmc::parse::vparams::parse_vparams_def;
use bcsvmc::vmc::{combine_chains, run_chain};
use bcsvmc::{Ansatz, SamplerParams, SquareLattice, VmcParams, VmcResults};

const SEED: u64 = 1434;
const L1: usize = 4;
const L2: usize = 4;
const HOLE_DOPING: f64 = 0.125;
const ANSATZ: Ansatz = Ansatz::DWaveBcs;
const DELTA: f64 = 0.25;
const MU: f64 = -0.3;
const NCHAINS: usize = 8;
const NMCSAMP: usize = 10_000;
const NMCWARMUP: usize = 1_000;
const MCSAMPLE_INTERVAL: usize = 2;
const REFRESH_CYCLE: usize = 100;
const ALLOW_DOUBLE_OCCUPANCY: bool = false;
const CONS_T: f64 = 1.0;
const CONS_U: f64 = 8.0;

fn log_system_parameters(sampler_params: &SamplerParams, params: &VmcParams, vparams: &[f64]) {
    info!("System parameter L1 x L2 = {} x {}", L1, L2);
    info!("System parameter HOLE_DOPING = {}", HOLE_DOPING);
    info!("System parameter ANSATZ = {:?}", ANSATZ);
    info!("System parameter NCHAINS = {}", NCHAINS);
    info!("System parameter NMCSAMP = {}", params.num_samples);
    info!("System parameter NMCWARMUP = {}", params.warmup_steps);
    info!("System parameter CONS_U = {}", sampler_params.cons_u);
    info!("System parameter CONS_T = {}", sampler_params.cons_t);
    info!("Variational parameters [delta, mu] = {:?}", vparams);
    debug!("System parameter REFRESH_CYCLE = {}", sampler_params.refresh_cycle);
    debug!("System parameter TOLERANCE_SHERMAN_MORRISON = {}", sampler_params.tolerance_sherman_morrison);
    debug!("System parameter TOLERANCE_SINGULARITY = {}", sampler_params.tolerance_singularity);
}

fn print_results(res: &VmcResults) {
    let tau = match res.tau {
        Some(t) => format!("{:.2}", t),
        None => "n/a".to_owned(),
    };
    let convergence = if res.converged { "CONVERGED".green() } else { "NOT_CONVD".red() };
    println!("{}", "Results".bold());
    println!("  Energy per site     : {:+.6} (+/- {:.6})", res.energy, res.energy_error);
    println!("  Double occupancy    : {:.6} (+/- {:.6})", res.double_occupancy, res.double_occupancy_error);
    println!("  Samples             : {}", res.num_samples);
    println!("  Autocorrelation time: {}", tau);
    println!("  Error bars          : {}", convergence);
    println!("  Acceptance          : {:.2}%", res.acceptance_ratio);
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let vparams = match std::env::args().nth(1) {
        Some(fp) => parse_vparams_def(&PathBuf::from(fp))?,
        None => vec![DELTA, MU],
    };
    let sampler_params = SamplerParams {
        allow_double_occupancy: ALLOW_DOUBLE_OCCUPANCY,
        refresh_cycle: REFRESH_CYCLE,
        cons_t: CONS_T,
        cons_u: CONS_U,
        ..SamplerParams::default()
    };
    let params = VmcParams {
        num_samples: NMCSAMP,
        warmup_steps: NMCWARMUP,
        interval: MCSAMPLE_INTERVAL,
    };
    log_system_parameters(&sampler_params, &params, &vparams);

    let lattice = SquareLattice::new(L1, L2)?;
    let mut rng = Mt64::new(SEED);
    let seeds: Vec<u64> = (0..NCHAINS).map(|_| rng.next_u64()).collect();

    let progress_bar = ProgressBar::new(NCHAINS as u64);
    progress_bar.set_prefix("Chains: ");
    progress_bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {prefix} {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );
    let chains = seeds
        .par_iter()
        .map(|&seed| {
            let res = run_chain(&lattice, ANSATZ, HOLE_DOPING, &vparams, sampler_params, &params, seed);
            progress_bar.inc(1);
            res
        })
        .collect::<Result<Vec<VmcResults>, _>>()?;
    progress_bar.finish_with_message("done");

    for (seed, chain) in seeds.iter().zip(chains.iter()) {
        debug!("Chain {}: E = {:.6} +/- {:.6}", seed, chain.energy, chain.energy_error);
    }
    if let Some(res) = combine_chains(&chains) {
        print_results(&res);
    }
    Ok(())
}
