use blas::{zaxpy, zscal};
use log::{debug, error, info, trace, warn};
use num::complex::Complex;
use std::fmt;

use crate::errors::VmcError;
use crate::lattice::{Bond, Lattice, SquareLattice};
use crate::matrix::ComplexMatrix;
use crate::wavefunction::{Ansatz, AmplitudeProvider, BcsWavefunction};
use crate::{FockConfiguration, PendingMove, SamplerParams, Spin};

type C64 = Complex<f64>;

/// Result of a single attempted hop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// No hop of this species was possible.
    Infeasible,
    /// The determinant ratio was below `tolerance_ratio`.
    Singular,
    Rejected(C64),
    Accepted(C64),
}

/// Move counters since the last [ConfigurationSampler::init_state].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    pub num_sweeps: usize,
    pub num_proposed: usize,
    pub num_accepted: usize,
    pub num_singular: usize,
    pub num_refresh: usize,
}

impl SamplerStats {
    /// Accepted over proposed moves, in percent.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.num_proposed == 0 {
            return 0.0;
        }
        100.0 * self.num_accepted as f64 / self.num_proposed as f64
    }
}

impl fmt::Display for SamplerStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "sweeps = {}, proposed = {}, accepted = {}, singular = {}, acceptance = {:.2}%",
            self.num_sweeps,
            self.num_proposed,
            self.num_accepted,
            self.num_singular,
            self.acceptance_ratio()
        )
    }
}

/// Metropolis acceptance probability $\min(1, |r|^2)$ for a determinant
/// ratio $r$.
#[inline(always)]
pub fn transition_probability(ratio: C64) -> f64 {
    ratio.norm_sqr().min(1.0)
}

/// Sherman-Morrison update of $A^{-1}$ after row `p` of $A$ was replaced by
/// `new_row`, with $r$ the determinant ratio.
fn update_inverse_row(inv: &mut ComplexMatrix, new_row: &[C64], p: usize, ratio: C64, work: &mut [C64]) {
    let k = inv.n_rows();
    work.copy_from_slice(inv.column(p));
    for c in 0..k {
        if c == p {
            continue;
        }
        let beta = inv.dot_column(new_row, c) / ratio;
        unsafe {
            zaxpy(k as i32, -beta, work, 1, inv.column_mut(c), 1);
        }
    }
    unsafe {
        zscal(k as i32, ratio.inv(), inv.column_mut(p), 1);
    }
}

/// Column counterpart of [update_inverse_row], acting on the rows of
/// $A^{-1}$.
fn update_inverse_column(inv: &mut ComplexMatrix, new_col: &[C64], p: usize, ratio: C64, work: &mut [C64]) {
    let k = inv.n_rows();
    for (j, w) in work.iter_mut().enumerate() {
        *w = inv[(p, j)];
    }
    for r in 0..k {
        if r == p {
            continue;
        }
        let beta = inv.dot_row(r, new_col) / ratio;
        unsafe {
            zaxpy(k as i32, -beta, work, 1, &mut inv.as_mut_slice()[r..], k as i32);
        }
    }
    unsafe {
        zscal(k as i32, ratio.inv(), &mut inv.as_mut_slice()[p..], k as i32);
    }
}

/// Metropolis sampler of configurations weighted by
/// $|\det\[\phi(i_a, j_b)\]|^2$.
/// # State
/// The sampler owns the [FockConfiguration], the $K\times K$ amplitude
/// matrix (rows are up spins, columns are down spins, in particle order) and
/// its inverse. Accepted hops replace one row or one column and update the
/// inverse in $O(K^2)$. Every `refresh_cycle` sweeps the inverse is recomputed
/// from scratch.
pub struct ConfigurationSampler<A: AmplitudeProvider> {
    provider: A,
    bonds: Vec<Bond>,
    num_sites: usize,
    conf: FockConfiguration,
    params: SamplerParams,
    amplitude_matrix: ComplexMatrix,
    amplitude_inverse: ComplexMatrix,
    tracked_det: C64,
    new_row: Vec<C64>,
    new_col: Vec<C64>,
    work: Vec<C64>,
    stats: SamplerStats,
}

impl ConfigurationSampler<BcsWavefunction> {
    /// Sampler of a [BcsWavefunction] at the given hole doping.
    pub fn init(
        lattice: &SquareLattice,
        ansatz: Ansatz,
        hole_doping: f64,
        params: SamplerParams,
        seed: u64,
    ) -> Result<Self, VmcError> {
        let wf = BcsWavefunction::new(lattice, ansatz, hole_doping)?;
        let (num_upspins, num_dnspins) = (wf.num_upspins(), wf.num_dnspins());
        Self::with_provider(lattice, wf, num_upspins, num_dnspins, params, seed)
    }
}

impl<A: AmplitudeProvider> ConfigurationSampler<A> {
    pub fn with_provider<L: Lattice>(
        lattice: &L,
        provider: A,
        num_upspins: usize,
        num_dnspins: usize,
        params: SamplerParams,
        seed: u64,
    ) -> Result<Self, VmcError> {
        let num_sites = lattice.num_sites();
        if provider.num_sites() != num_sites {
            return Err(VmcError::SiteCountMismatch { lattice: num_sites, provider: provider.num_sites() });
        }
        if num_upspins != num_dnspins {
            return Err(VmcError::SpeciesMismatch { num_upspins, num_dnspins });
        }
        let mut conf = FockConfiguration::new(num_sites, params.allow_double_occupancy, seed);
        conf.init_spins(num_upspins, num_dnspins)?;
        let k = num_upspins;
        debug!(
            "Sampler on {} sites with {} up and {} down spins, {:?}.",
            num_sites, num_upspins, num_dnspins, params
        );
        Ok(ConfigurationSampler {
            provider,
            bonds: lattice.bonds().to_vec(),
            num_sites,
            conf,
            params,
            amplitude_matrix: ComplexMatrix::zeros(k, k),
            amplitude_inverse: ComplexMatrix::zeros(k, k),
            tracked_det: Complex::new(1.0, 0.0),
            new_row: vec![Complex::new(0.0, 0.0); k],
            new_col: vec![Complex::new(0.0, 0.0); k],
            work: vec![Complex::new(0.0, 0.0); k],
            stats: SamplerStats::default(),
        })
    }

    /// Rebuilds the amplitude table. The configuration and the matrices are
    /// left as they are until [ConfigurationSampler::init_state].
    pub fn build(&mut self, vparams: &[f64]) -> Result<(), VmcError> {
        self.provider.build(vparams)
    }

    fn rebuild_matrix(&mut self) {
        self.provider.amplitude_matrix(
            self.conf.upspin_sites(),
            self.conf.dnspin_sites(),
            &mut self.amplitude_matrix,
        );
    }

    /// Draws random configurations until the amplitude matrix is well
    /// conditioned, then inverts it and resets the counters.
    pub fn init_state(&mut self) -> Result<(), VmcError> {
        let mut rcond = 0.0;
        for attempt in 1..=self.params.max_init_attempts {
            self.conf.set_random();
            self.rebuild_matrix();
            rcond = self.amplitude_matrix.reciprocal_condition()?;
            debug!("Initial state attempt {}: {}, rcond = {:.2e}.", attempt, self.conf, rcond);
            if rcond > self.params.tolerance_singularity {
                self.amplitude_inverse = self.amplitude_matrix.inverse()?;
                self.tracked_det = self.amplitude_matrix.determinant()?;
                self.stats = SamplerStats::default();
                return Ok(());
            }
        }
        error!(
            "Wave function is ill conditioned for every trial configuration, last rcond = {:.2e}.",
            rcond
        );
        Err(VmcError::IllConditioned { attempts: self.params.max_init_attempts, rcond })
    }

    /// One sweep: an up-spin hop per up spin, then a down-spin hop per down
    /// spin. The inverse is refreshed every `refresh_cycle` sweeps.
    pub fn update_state(&mut self) -> Result<(), VmcError> {
        for _ in 0..self.conf.num_upspins() {
            self.do_upspin_hop();
        }
        for _ in 0..self.conf.num_dnspins() {
            self.do_dnspin_hop();
        }
        self.stats.num_sweeps += 1;
        if self.params.refresh_cycle > 0 && self.stats.num_sweeps % self.params.refresh_cycle == 0 {
            self.refresh_inverse()?;
        }
        Ok(())
    }

    /// Accept or reject the pending move given its determinant ratio.
    fn metropolis(&mut self, ratio: C64) -> MoveOutcome {
        if ratio.norm() < self.params.tolerance_ratio {
            self.conf.undo();
            self.stats.num_singular += 1;
            trace!("Singular ratio {:.2e}, move dropped.", ratio.norm());
            return MoveOutcome::Singular;
        }
        self.stats.num_proposed += 1;
        let proba = transition_probability(ratio);
        if self.conf.random_real() < proba {
            trace!("Ratio: {}, probability: {:.4}. Accept.", ratio, proba);
            self.conf.commit();
            self.tracked_det *= ratio;
            self.stats.num_accepted += 1;
            MoveOutcome::Accepted(ratio)
        } else {
            trace!("Ratio: {}, probability: {:.4}. Reject.", ratio, proba);
            self.conf.undo();
            MoveOutcome::Rejected(ratio)
        }
    }

    /// Attempts a single up-spin hop.
    pub fn do_upspin_hop(&mut self) -> MoveOutcome {
        if !self.conf.propose_up_hop() {
            return MoveOutcome::Infeasible;
        }
        let PendingMove::UpHop(hop) = *self.conf.pending_move() else {
            return MoveOutcome::Infeasible;
        };
        trace!("Proposed up hop {} -> {}: {}", hop.from, hop.to, self.conf);
        self.provider.amplitude_row(hop.to, self.conf.dnspin_sites(), &mut self.new_row);
        let ratio = self.amplitude_inverse.dot_column(&self.new_row, hop.particle);
        let outcome = self.metropolis(ratio);
        if let MoveOutcome::Accepted(_) = outcome {
            self.amplitude_matrix.set_row(hop.particle, &self.new_row);
            update_inverse_row(&mut self.amplitude_inverse, &self.new_row, hop.particle, ratio, &mut self.work);
        }
        outcome
    }

    /// Attempts a single down-spin hop.
    pub fn do_dnspin_hop(&mut self) -> MoveOutcome {
        if !self.conf.propose_down_hop() {
            return MoveOutcome::Infeasible;
        }
        let PendingMove::DownHop(hop) = *self.conf.pending_move() else {
            return MoveOutcome::Infeasible;
        };
        trace!("Proposed down hop {} -> {}: {}", hop.from, hop.to, self.conf);
        self.provider.amplitude_column(self.conf.upspin_sites(), hop.to, &mut self.new_col);
        let ratio = self.amplitude_inverse.dot_row(hop.particle, &self.new_col);
        let outcome = self.metropolis(ratio);
        if let MoveOutcome::Accepted(_) = outcome {
            self.amplitude_matrix.set_column(hop.particle, &self.new_col);
            update_inverse_column(&mut self.amplitude_inverse, &self.new_col, hop.particle, ratio, &mut self.work);
        }
        outcome
    }

    /// Recomputes the inverse from the amplitude matrix. Reports the drift of
    /// the incremental updates beforehand.
    pub fn refresh_inverse(&mut self) -> Result<(), VmcError> {
        let drift = self.inverse_drift();
        let exact_det = self.amplitude_matrix.determinant()?;
        let err = (exact_det - self.tracked_det).norm() / exact_det.norm().max(f64::MIN_POSITIVE);
        if exact_det.norm_sqr() < self.params.tolerance_singularity {
            warn!(
                "Amplitude matrix is probably singular, got determinant {:.2e} and Tolerence is : {:e}.",
                exact_det.norm(),
                self.params.tolerance_singularity
            );
        }
        if drift >= self.params.tolerance_sherman_morrison {
            warn!(
                "Sherman-Morrison drift of {:.2e} on the inverse. Tolerence is : {:e}.",
                drift, self.params.tolerance_sherman_morrison
            );
        }
        if err >= self.params.tolerance_sherman_morrison {
            warn!(
                "Sherman-Morrison update error of {:.2e} on the tracked determinant. Tolerence is : {:e}. Expected {}, got {}",
                err, self.params.tolerance_sherman_morrison, exact_det, self.tracked_det
            );
        }
        self.amplitude_inverse = self.amplitude_matrix.inverse()?;
        self.tracked_det = exact_det;
        self.stats.num_refresh += 1;
        debug!("Inverse refreshed after {} sweeps, drift was {:.2e}.", self.stats.num_sweeps, drift);
        Ok(())
    }

    /// $\langle x'|\psi\rangle/\langle x|\psi\rangle$ for
    /// $x'=c^\dagger_{j\sigma}c_{i\sigma}x$ or its conjugate, zero if neither
    /// applies.
    fn hop_ratio(&mut self, spin: Spin, i: usize, j: usize) -> C64 {
        let zero = Complex::new(0.0, 0.0);
        let applies = match spin {
            Spin::Up => self.conf.op_hop_up(i, j),
            Spin::Down => self.conf.op_hop_down(i, j),
        };
        if !applies {
            return zero;
        }
        let hop = match *self.conf.pending_move() {
            PendingMove::UpHop(hop) | PendingMove::DownHop(hop) => hop,
            // Number operator on an occupied site.
            _ => return Complex::new(1.0, 0.0),
        };
        if !self.params.allow_double_occupancy && self.conf.op_double_occupation(hop.to) == 1 {
            self.conf.undo();
            return zero;
        }
        // Rows and columns follow the particle labels, so no fermionic sign
        // enters the ratio.
        let ratio = match spin {
            Spin::Up => {
                self.provider.amplitude_row(hop.to, self.conf.dnspin_sites(), &mut self.new_row);
                self.amplitude_inverse.dot_column(&self.new_row, hop.particle)
            },
            Spin::Down => {
                self.provider.amplitude_column(self.conf.upspin_sites(), hop.to, &mut self.new_col);
                self.amplitude_inverse.dot_row(hop.particle, &self.new_col)
            },
        };
        self.conf.undo();
        ratio
    }

    /// Local energy per site of the Hubbard model
    /// $$
    /// H=-t\sum_{\langle i,j\rangle,\sigma}e^{i\theta_{ij}}\left(c^\dagger_{i\sigma}c_{j\sigma}+c^\dagger_{j\sigma}c_{i\sigma}\right)+U\sum_in_{i\uparrow}n_{i\downarrow}
    /// $$
    /// in the current configuration.
    pub fn energy(&mut self) -> f64 {
        let mut kinetic = Complex::new(0.0, 0.0);
        for b in 0..self.bonds.len() {
            let Bond { src, tgt, phase } = self.bonds[b];
            for spin in [Spin::Up, Spin::Down] {
                kinetic += phase * self.hop_ratio(spin, src, tgt);
            }
        }
        let potential = self.params.cons_u * self.conf.num_dblocc_sites() as f64;
        let e = -self.params.cons_t * kinetic.re + potential;
        trace!("Local energy {} for state {}", e, self.conf);
        e / self.num_sites as f64
    }

    pub fn double_occupancy_density(&self) -> f64 {
        self.conf.num_dblocc_sites() as f64 / self.num_sites as f64
    }

    /// $\max|AA^{-1}-I|$ for the maintained inverse.
    pub fn inverse_drift(&self) -> f64 {
        self.amplitude_matrix.matmul(&self.amplitude_inverse).identity_deviation()
    }

    /// Amplitude matrix rebuilt from the provider for the current
    /// configuration.
    pub fn amplitude_matrix_from_scratch(&self) -> ComplexMatrix {
        let k = self.conf.num_upspins();
        let mut out = ComplexMatrix::zeros(k, self.conf.num_dnspins());
        self.provider.amplitude_matrix(self.conf.upspin_sites(), self.conf.dnspin_sites(), &mut out);
        out
    }

    pub fn print_stats(&self) {
        info!("Sampler statistics: {}", self.stats);
    }

    pub fn stats(&self) -> &SamplerStats {
        &self.stats
    }

    pub fn configuration(&self) -> &FockConfiguration {
        &self.conf
    }

    pub fn amplitude_matrix(&self) -> &ComplexMatrix {
        &self.amplitude_matrix
    }

    pub fn amplitude_inverse(&self) -> &ComplexMatrix {
        &self.amplitude_inverse
    }

    /// Determinant of the amplitude matrix, tracked through the accepted
    /// ratios since the last refresh.
    pub fn tracked_determinant(&self) -> C64 {
        self.tracked_det
    }

    pub fn provider(&self) -> &A {
        &self.provider
    }

    pub fn params(&self) -> &SamplerParams {
        &self.params
    }

    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    pub fn reseed(&mut self, seed: u64) {
        self.conf.reseed(seed);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_matrix(n: usize, rng: &mut SmallRng) -> ComplexMatrix {
        ComplexMatrix::from_fn(n, n, |i, j| {
            let diag = if i == j { 2.0 } else { 0.0 };
            Complex::new(rng.gen::<f64>() - 0.5 + diag, rng.gen::<f64>() - 0.5)
        })
    }

    #[test]
    fn test_transition_probability_is_clamped() {
        assert_eq!(transition_probability(Complex::new(3.0, 4.0)), 1.0);
        assert!((transition_probability(Complex::new(0.3, 0.4)) - 0.25).abs() < 1e-15);
        assert_eq!(transition_probability(Complex::new(0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_update_inverse_row() {
        let mut rng = SmallRng::seed_from_u64(42);
        let n = 6;
        let mut a = random_matrix(n, &mut rng);
        let mut inv = a.inverse().unwrap();
        let mut work = vec![Complex::new(0.0, 0.0); n];
        for step in 0..20 {
            let p = step % n;
            let new_row: Vec<C64> = (0..n)
                .map(|j| Complex::new(rng.gen::<f64>() - 0.5 + if j == p { 2.0 } else { 0.0 }, rng.gen::<f64>() - 0.5))
                .collect();
            let ratio = inv.dot_column(&new_row, p);
            let det_before = a.determinant().unwrap();
            a.set_row(p, &new_row);
            update_inverse_row(&mut inv, &new_row, p, ratio, &mut work);
            let det_after = a.determinant().unwrap();
            assert!((det_after - det_before * ratio).norm() < 1e-9 * det_after.norm());
            assert!(a.matmul(&inv).identity_deviation() < 1e-9);
        }
    }

    #[test]
    fn test_update_inverse_column() {
        let mut rng = SmallRng::seed_from_u64(7);
        let n = 5;
        let mut a = random_matrix(n, &mut rng);
        let mut inv = a.inverse().unwrap();
        let mut work = vec![Complex::new(0.0, 0.0); n];
        for step in 0..20 {
            let p = (3 * step) % n;
            let new_col: Vec<C64> = (0..n)
                .map(|i| Complex::new(rng.gen::<f64>() - 0.5 + if i == p { 2.0 } else { 0.0 }, rng.gen::<f64>() - 0.5))
                .collect();
            let ratio = inv.dot_row(p, &new_col);
            a.set_column(p, &new_col);
            update_inverse_column(&mut inv, &new_col, p, ratio, &mut work);
            assert!(a.matmul(&inv).identity_deviation() < 1e-9);
        }
    }

    #[test]
    fn test_stats_display() {
        let stats = SamplerStats { num_sweeps: 2, num_proposed: 4, num_accepted: 1, num_singular: 0, num_refresh: 0 };
        assert_eq!(stats.acceptance_ratio(), 25.0);
        assert_eq!(
            format!("{}", stats),
            "sweeps = 2, proposed = 4, accepted = 1, singular = 0, acceptance = 25.00%"
        );
    }
}
