//! Variational Monte Carlo sampling of projected BCS wave functions.
//!
//! The sampler walks over Fock configurations of up and down spins with
//! single particle hops, weighted by
//!
//! $$
//! P(x)\propto\left\vert\langle x\vert\psi\rangle\right\vert^2,\qquad
//! \langle x\vert\psi\rangle=\det\left\[\phi(i_a, j_b)\right\]_{a,b=1}^{K}
//! $$
//!
//! where $i_a$ are the up-spin sites and $j_b$ the down-spin sites. The ratio
//! of amplitudes after a hop is read from the maintained inverse of the
//! amplitude matrix, which is then updated in $O(K^2)$.
#[cfg(feature = "python-interface")]
use pyo3::prelude::*;

extern crate intel_mkl_src;

/// Inverse refresh period, in sweeps.
pub const DEFAULT_REFRESH_CYCLE: usize = 100;
/// Bounded retries of [sampler::ConfigurationSampler::init_state].
pub const MAX_INIT_ATTEMPTS: usize = 1000;
/// Smallest accepted reciprocal condition number of a starting matrix.
pub const TOLERANCE_SINGULARITY: f64 = 1e-15;
/// Determinant ratios below this modulus are dropped.
pub const TOLERANCE_RATIO: f64 = 1e-12;
/// Largest tolerated drift of the fast updates at a refresh.
pub const TOLERANCE_SHERMAN_MORRISON: f64 = 1e-8;

/// System parameters
/// * __`allow_double_occupancy`__ - Whether a site can hold both spins.
/// * __`refresh_cycle`__ - Sweeps between two exact inverse computations, `0`
/// never refreshes.
/// * __`cons_t`__, __`cons_u`__ - Hubbard's model $t$ and $U$.
/// * __`tolerance_singularity`__ - Threshold on the reciprocal condition
/// number of a starting configuration.
/// * __`tolerance_ratio`__ - Threshold on a determinant ratio.
/// * __`tolerance_sherman_morrison`__ - Warning threshold on the fast update
/// error.
/// * __`max_init_attempts`__ - Starting configurations tried before giving
/// up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerParams {
    pub allow_double_occupancy: bool,
    pub refresh_cycle: usize,
    pub cons_t: f64,
    pub cons_u: f64,
    pub tolerance_singularity: f64,
    pub tolerance_ratio: f64,
    pub tolerance_sherman_morrison: f64,
    pub max_init_attempts: usize,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            allow_double_occupancy: true,
            refresh_cycle: DEFAULT_REFRESH_CYCLE,
            cons_t: 1.0,
            cons_u: 4.0,
            tolerance_singularity: TOLERANCE_SINGULARITY,
            tolerance_ratio: TOLERANCE_RATIO,
            tolerance_sherman_morrison: TOLERANCE_SHERMAN_MORRISON,
            max_init_attempts: MAX_INIT_ATTEMPTS,
        }
    }
}

/// Input file parsing util.
/// # Subfiles
/// * __`vparams.csv`__ - Variationnal parameters of the wave function. In csv
/// format, 2 column. First column is the parameter identifier, second is its
/// value.
pub mod parse;

pub mod errors;

/// Random number streams of the moves.
pub mod random;

// Have the FockConfiguration struct at the root.
include!("fock_state.rs");

/// Dense complex linear algebra over BLAS and LAPACK.
pub mod matrix;

/// Lattice geometry
/// # Definition
/// Only the number of sites and the bond list are consumed by the sampler.
/// The square lattice also provides the momenta used to build the pair
/// amplitudes.
pub mod lattice;

/// Pair wave functions
/// # Definition
/// A pair wave function with the same number $K$ of up and down spins,
///
/// $$
/// \vert\psi\rangle=\left[
///     \sum_{i, j = 0}^{N_s-1}\phi(i,j)c_{i\uparrow}^\dagger c_{j\downarrow}^\dagger
/// \right]^{K} \vert 0\rangle,
/// $$
///
/// has the amplitude $\langle x\vert\psi\rangle=K!\det\[\phi(i_a,j_b)\]$ on the
/// configuration $x$.
pub mod wavefunction;

/// Metropolis sampler with fast updates.
/// # Fast update
/// After row $p$ of the amplitude matrix $A$ is replaced by $u$, the
/// determinant ratio is
///
/// $$
/// r=\frac{\det A'}{\det A}=\sum_k u_k A^{-1}_{kp}
/// $$
///
/// and the Sherman-Morrison formula gives, for $c\neq p$,
///
/// $$
/// A'^{-1}_{:,c}=A^{-1}_{:,c}-\frac{u\cdot A^{-1}_{:,c}}{r}A^{-1}_{:,p},\qquad
/// A'^{-1}_{:,p}=\frac{A^{-1}_{:,p}}{r}.
/// $$
///
/// The column case is the transpose.
pub mod sampler;

/// Binning analysis of the samples.
pub mod statistics;

/// Simulation driver
pub mod vmc;

pub use errors::VmcError;
pub use lattice::{Bond, Lattice, SquareLattice};
pub use matrix::ComplexMatrix;
pub use sampler::{ConfigurationSampler, MoveOutcome, SamplerStats};
pub use statistics::{BinnedObservable, ChainEstimate, StatisticsSink};
pub use vmc::{VmcParams, VmcResults};
pub use wavefunction::{Ansatz, AmplitudeProvider, AmplitudeTable, BcsWavefunction};

/// Energy per site and its error for a BCS wave function on an
/// $L_1\times L_2$ lattice, averaged over one chain per seed.
#[cfg(feature = "python-interface")]
#[pyfunction]
#[pyo3(signature = (l1, l2, delta, mu, hole_doping, dwave=true, num_samples=5000, seeds=vec![1]))]
fn bcs_energy(
    l1: usize,
    l2: usize,
    delta: f64,
    mu: f64,
    hole_doping: f64,
    dwave: bool,
    num_samples: usize,
    seeds: Vec<u64>,
) -> PyResult<(f64, f64)> {
    use pyo3::exceptions::PyValueError;

    let to_py = |e: VmcError| PyValueError::new_err(e.to_string());
    let lattice = SquareLattice::new(l1, l2).map_err(to_py)?;
    let ansatz = if dwave { Ansatz::DWaveBcs } else { Ansatz::SWaveBcs };
    let params = VmcParams { num_samples, ..VmcParams::default() };
    let sampler_params = SamplerParams { allow_double_occupancy: false, ..SamplerParams::default() };
    let res = vmc::run_independent_chains(&lattice, ansatz, hole_doping, &[delta, mu], sampler_params, &params, &seeds)
        .map_err(to_py)?
        .ok_or_else(|| PyValueError::new_err("At least one seed is needed."))?;
    Ok((res.energy, res.energy_error))
}

#[cfg(feature = "python-interface")]
#[pymodule]
fn bcsvmc(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use pyo3::wrap_pyfunction;

    m.add_function(wrap_pyfunction!(bcs_energy, m)?)?;
    Ok(())
}
