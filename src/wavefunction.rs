use log::{debug, trace};
use num::complex::Complex;

use crate::errors::VmcError;
use crate::lattice::{Lattice, SquareLattice};
use crate::matrix::ComplexMatrix;

type C64 = Complex<f64>;

/// Pair amplitudes $\phi(i,j)$ between an up spin on site $i$ and a down
/// spin on site $j$.
///
/// Implementors only need [AmplitudeProvider::amplitude]; the row, column
/// and matrix queries gather it over lists of sites. All queries must be pure
/// between two calls to [AmplitudeProvider::build].
pub trait AmplitudeProvider {
    fn num_sites(&self) -> usize;
    fn num_vparams(&self) -> usize;
    /// Recomputes the table for the variational parameters `vparams`.
    fn build(&mut self, vparams: &[f64]) -> Result<(), VmcError>;
    fn amplitude(&self, site_a: usize, site_b: usize) -> C64;

    /// $\phi(\text{site}, j)$ for every $j$ in `cols`.
    fn amplitude_row(&self, site: usize, cols: &[usize], out: &mut [C64]) {
        for (o, &j) in out.iter_mut().zip(cols.iter()) {
            *o = self.amplitude(site, j);
        }
    }

    /// $\phi(i, \text{site})$ for every $i$ in `rows`.
    fn amplitude_column(&self, rows: &[usize], site: usize, out: &mut [C64]) {
        for (o, &i) in out.iter_mut().zip(rows.iter()) {
            *o = self.amplitude(i, site);
        }
    }

    fn amplitude_matrix(&self, rows: &[usize], cols: &[usize], out: &mut ComplexMatrix) {
        for (c, &j) in cols.iter().enumerate() {
            self.amplitude_column(rows, j, out.column_mut(c));
        }
    }
}

/// Dense table of pair amplitudes with no variational parameter.
#[derive(Debug, Clone)]
pub struct AmplitudeTable {
    table: ComplexMatrix,
}

impl AmplitudeTable {
    pub fn from_fn<F>(num_sites: usize, f: F) -> Self
    where
        F: FnMut(usize, usize) -> C64,
    {
        AmplitudeTable { table: ComplexMatrix::from_fn(num_sites, num_sites, f) }
    }

    pub fn zeros(num_sites: usize) -> Self {
        AmplitudeTable { table: ComplexMatrix::zeros(num_sites, num_sites) }
    }
}

impl AmplitudeProvider for AmplitudeTable {
    fn num_sites(&self) -> usize {
        self.table.n_rows()
    }

    fn num_vparams(&self) -> usize {
        0
    }

    fn build(&mut self, vparams: &[f64]) -> Result<(), VmcError> {
        if !vparams.is_empty() {
            return Err(VmcError::ParameterCount { expected: 0, got: vparams.len() });
        }
        Ok(())
    }

    #[inline(always)]
    fn amplitude(&self, site_a: usize, site_b: usize) -> C64 {
        self.table[(site_a, site_b)]
    }
}

/// Pairing symmetry of the BCS gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ansatz {
    /// $\Delta_k=\Delta$
    SWaveBcs,
    /// $\Delta_k=\Delta(\cos k_x-\cos k_y)$
    DWaveBcs,
}

/// Amplitude given to gapless momenta inside the Fermi sea.
const LARGE_AMPLITUDE: f64 = 100.0;

/// Projected BCS wave function on the square lattice.
/// # Definition
/// $$
/// \vert\psi\rangle=P_N\prod_k\left(1+\phi_k c^\dagger_{k\uparrow}c^\dagger_{-k\downarrow}\right)\vert0\rangle,
/// \qquad
/// \phi_k=\frac{2\Delta_k}{\varepsilon_k+\sqrt{\varepsilon_k^2+4\vert\Delta_k\vert^2}}
/// $$
/// with $\varepsilon_k=-2(\cos k_x+\cos k_y)-\mu$. The real space pair
/// amplitude is
/// $$
/// \phi(i,j)=\frac1N\sum_k\phi_k e^{ik\cdot(r_i-r_j)}
/// $$
/// and the amplitude of a configuration is $\det\[\phi(i_a, j_b)\]$ over the
/// up-spin sites $i_a$ and the down-spin sites $j_b$.
/// # Parameters
/// `vparams = [Δ, μ]`.
#[derive(Debug, Clone)]
pub struct BcsWavefunction {
    lattice: SquareLattice,
    ansatz: Ansatz,
    hole_doping: f64,
    num_upspins: usize,
    num_dnspins: usize,
    table: ComplexMatrix,
}

impl BcsWavefunction {
    /// Sets the particle numbers $N_\uparrow=N_\downarrow=\text{round}(\frac12(1-\delta)N)$.
    pub fn new(lattice: &SquareLattice, ansatz: Ansatz, hole_doping: f64) -> Result<Self, VmcError> {
        let num_sites = lattice.num_sites();
        let n = (0.5 * (1.0 - hole_doping) * num_sites as f64).round();
        if !n.is_finite() || n < 0.0 || n > num_sites as f64 {
            return Err(VmcError::HoleDoping { hole_doping });
        }
        let n = n as usize;
        // Doping actually realised by the rounded particle number.
        let hole_doping = 1.0 - (2 * n) as f64 / num_sites as f64;
        debug!("BCS wave function: {:?}, {} up and {} down spins, hole doping {}.", ansatz, n, n, hole_doping);
        Ok(BcsWavefunction {
            lattice: lattice.clone(),
            ansatz,
            hole_doping,
            num_upspins: n,
            num_dnspins: n,
            table: ComplexMatrix::zeros(num_sites, num_sites),
        })
    }

    pub fn num_upspins(&self) -> usize {
        self.num_upspins
    }

    pub fn num_dnspins(&self) -> usize {
        self.num_dnspins
    }

    pub fn hole_doping(&self) -> f64 {
        self.hole_doping
    }

    pub fn ansatz(&self) -> Ansatz {
        self.ansatz
    }

    fn gap(&self, delta: f64, kx: f64, ky: f64) -> f64 {
        match self.ansatz {
            Ansatz::SWaveBcs => delta,
            Ansatz::DWaveBcs => delta * (kx.cos() - ky.cos()),
        }
    }

    /// $\phi_k$ for every k-point of the lattice.
    pub fn pair_amplitudes_k(&self, delta: f64, mu: f64) -> Vec<C64> {
        self.lattice
            .kpoints()
            .iter()
            .map(|&(kx, ky)| {
                let ek = -2.0 * (kx.cos() + ky.cos()) - mu;
                let delta_k = Complex::new(self.gap(delta, kx, ky), 0.0);
                let deltak_sq = delta_k.norm_sqr();
                if deltak_sq.sqrt() < 1e-12 {
                    if ek < 0.0 {
                        LARGE_AMPLITUDE * Complex::new(0.0, delta_k.arg()).exp()
                    } else {
                        Complex::new(0.0, 0.0)
                    }
                } else {
                    2.0 * delta_k / (ek + (ek * ek + 4.0 * deltak_sq).sqrt())
                }
            })
            .collect()
    }
}

impl AmplitudeProvider for BcsWavefunction {
    fn num_sites(&self) -> usize {
        self.lattice.num_sites()
    }

    fn num_vparams(&self) -> usize {
        2
    }

    fn build(&mut self, vparams: &[f64]) -> Result<(), VmcError> {
        if vparams.len() != self.num_vparams() {
            return Err(VmcError::ParameterCount { expected: self.num_vparams(), got: vparams.len() });
        }
        let (delta, mu) = (vparams[0], vparams[1]);
        let phi_k = self.pair_amplitudes_k(delta, mu);
        let (l1, l2) = self.lattice.size();
        let num_sites = self.lattice.num_sites();

        // phi(i, j) only depends on r_i - r_j, tabulate it once per distance.
        let w1 = 2 * l1 - 1;
        let w2 = 2 * l2 - 1;
        let mut by_distance = vec![Complex::new(0.0, 0.0); w1 * w2];
        for (d, out) in by_distance.iter_mut().enumerate() {
            let dx = (d % w1) as f64 - (l1 - 1) as f64;
            let dy = (d / w1) as f64 - (l2 - 1) as f64;
            let mut sum = Complex::new(0.0, 0.0);
            for (&(kx, ky), &phi) in self.lattice.kpoints().iter().zip(phi_k.iter()) {
                sum += phi * Complex::new(0.0, kx * dx + ky * dy).exp();
            }
            *out = sum / num_sites as f64;
        }

        for j in 0..num_sites {
            let (xj, yj) = self.lattice.coordinates(j);
            for i in 0..num_sites {
                let (xi, yi) = self.lattice.coordinates(i);
                let d = (xi + l1 - 1 - xj) + (yi + l2 - 1 - yj) * w1;
                self.table[(i, j)] = by_distance[d];
            }
        }
        trace!("Built BCS amplitudes with delta = {}, mu = {}.", delta, mu);
        Ok(())
    }

    #[inline(always)]
    fn amplitude(&self, site_a: usize, site_b: usize) -> C64 {
        self.table[(site_a, site_b)]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_particle_numbers() {
        let lat = SquareLattice::new(4, 4).unwrap();
        let wf = BcsWavefunction::new(&lat, Ansatz::DWaveBcs, 0.5).unwrap();
        assert_eq!(wf.num_upspins(), 4);
        assert_eq!(wf.num_dnspins(), 4);
        assert!((wf.hole_doping() - 0.5).abs() < 1e-12);
        let wf = BcsWavefunction::new(&lat, Ansatz::SWaveBcs, 0.0).unwrap();
        assert_eq!(wf.num_upspins(), 8);
        assert!(BcsWavefunction::new(&lat, Ansatz::SWaveBcs, -1.5).is_err());
        assert!(BcsWavefunction::new(&lat, Ansatz::SWaveBcs, 3.5).is_err());
    }

    #[test]
    fn test_parameter_count() {
        let lat = SquareLattice::new(2, 2).unwrap();
        let mut wf = BcsWavefunction::new(&lat, Ansatz::SWaveBcs, 0.0).unwrap();
        assert_eq!(wf.build(&[1.0]), Err(VmcError::ParameterCount { expected: 2, got: 1 }));
        assert!(wf.build(&[1.0, 0.0]).is_ok());
    }

    #[test]
    fn test_table_matches_fourier_sum() {
        let lat = SquareLattice::new(4, 4).unwrap();
        let mut wf = BcsWavefunction::new(&lat, Ansatz::DWaveBcs, 0.25).unwrap();
        wf.build(&[0.3, -0.2]).unwrap();
        let phi_k = wf.pair_amplitudes_k(0.3, -0.2);
        for &(i, j) in &[(0, 0), (0, 5), (7, 2), (15, 0), (3, 12)] {
            let (xi, yi) = lat.coordinates(i);
            let (xj, yj) = lat.coordinates(j);
            let mut expected = Complex::new(0.0, 0.0);
            for (&(kx, ky), &phi) in lat.kpoints().iter().zip(phi_k.iter()) {
                let dr = (kx * (xi as f64 - xj as f64)) + ky * (yi as f64 - yj as f64);
                expected += phi * Complex::new(0.0, dr).exp();
            }
            expected /= 16.0;
            assert!((wf.amplitude(i, j) - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_gapless_fermi_sea() {
        let lat = SquareLattice::new(4, 4).unwrap();
        let wf = BcsWavefunction::new(&lat, Ansatz::SWaveBcs, 0.0).unwrap();
        for (phi, &(kx, ky)) in wf.pair_amplitudes_k(0.0, 0.0).iter().zip(lat.kpoints()) {
            let ek = -2.0 * (kx.cos() + ky.cos());
            if ek < 0.0 {
                assert!((phi.re - LARGE_AMPLITUDE).abs() < 1e-12);
            } else {
                assert_eq!(phi.norm(), 0.0);
            }
        }
    }

    #[test]
    fn test_provider_gathers() {
        let table = AmplitudeTable::from_fn(5, |i, j| Complex::new(i as f64, j as f64));
        let mut row = vec![Complex::new(0.0, 0.0); 2];
        table.amplitude_row(3, &[1, 4], &mut row);
        assert_eq!(row, vec![Complex::new(3.0, 1.0), Complex::new(3.0, 4.0)]);
        let mut col = vec![Complex::new(0.0, 0.0); 2];
        table.amplitude_column(&[0, 2], 4, &mut col);
        assert_eq!(col, vec![Complex::new(0.0, 4.0), Complex::new(2.0, 4.0)]);
        let mut m = ComplexMatrix::zeros(2, 3);
        table.amplitude_matrix(&[1, 2], &[0, 3, 4], &mut m);
        assert_eq!(m[(1, 2)], Complex::new(2.0, 4.0));
    }
}
