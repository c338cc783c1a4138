use std::fmt;

/// Number of binning levels.
pub const MAX_BIN_LEVEL: usize = 20;
/// Minimum number of samples for a level to give a trusted error bar.
pub const GOOD_SAMPLE_SIZE: usize = 30;

/// Accumulates samples and reports their statistics.
pub trait StatisticsSink {
    fn push(&mut self, sample: &[f64]);
    fn mean(&self) -> Vec<f64>;
    fn stddev(&self) -> Vec<f64>;
    fn sample_count(&self) -> usize;
    fn reset(&mut self);
}

/// One binning level. Every second sample closes a pair, whose average is
/// handed to the next level.
#[derive(Debug, Clone)]
struct DataBin {
    num_samples: usize,
    sum: Vec<f64>,
    sumsq: Vec<f64>,
    waiting: Option<Vec<f64>>,
}

impl DataBin {
    fn new(dim: usize) -> Self {
        DataBin { num_samples: 0, sum: vec![0.0; dim], sumsq: vec![0.0; dim], waiting: None }
    }

    /// Adds a sample, returns the pair average once a pair is complete.
    fn add(&mut self, sample: &[f64]) -> Option<Vec<f64>> {
        self.num_samples += 1;
        for (i, &x) in sample.iter().enumerate() {
            self.sum[i] += x;
            self.sumsq[i] += x * x;
        }
        match self.waiting.take() {
            Some(first) => Some(first.iter().zip(sample.iter()).map(|(a, b)| 0.5 * (a + b)).collect()),
            None => {
                self.waiting = Some(sample.to_vec());
                None
            },
        }
    }

    fn mean(&self) -> Vec<f64> {
        if self.num_samples == 0 {
            return vec![0.0; self.sum.len()];
        }
        self.sum.iter().map(|s| s / self.num_samples as f64).collect()
    }

    /// Standard error of the mean, infinite below two samples.
    fn stddev(&self) -> Vec<f64> {
        let n = self.num_samples as f64;
        if self.num_samples <= 1 {
            return vec![f64::INFINITY; self.sum.len()];
        }
        self.sum
            .iter()
            .zip(self.sumsq.iter())
            .map(|(s, sq)| {
                let mean = s / n;
                let variance = (sq / n - mean * mean).max(0.0);
                (variance / (n - 1.0)).sqrt()
            })
            .collect()
    }
}

/// Binning analysis of a vector observable.
/// # Definition
/// Level $0$ receives the raw samples, level $l+1$ the averages of
/// consecutive pairs of level $l$. The error bar is the standard error of the
/// deepest level still holding at least [GOOD_SAMPLE_SIZE] samples, which
/// accounts for the autocorrelation of the chain. The integrated
/// autocorrelation time is estimated as
/// $$
/// \tau=\left|\frac12\left(\frac{\sigma_d^2}{\sigma_0^2}-1\right)\right|.
/// $$
/// The error is converged when its least squares slope over the last levels
/// is below a tenth of the final error.
#[derive(Debug, Clone)]
pub struct BinnedObservable {
    name: String,
    dim: usize,
    bins: Vec<DataBin>,
}

impl BinnedObservable {
    pub fn new(name: &str, dim: usize) -> Self {
        BinnedObservable {
            name: name.to_owned(),
            dim,
            bins: (0..MAX_BIN_LEVEL).map(|_| DataBin::new(dim)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn push_scalar(&mut self, sample: f64) {
        self.push(&[sample]);
    }

    /// Index of the deepest level with enough samples.
    fn decorrelated_level(&self) -> usize {
        self.bins
            .iter()
            .take_while(|b| b.num_samples >= GOOD_SAMPLE_SIZE)
            .count()
            .saturating_sub(1)
    }

    fn level_errors(&self, component: usize) -> Vec<f64> {
        let d = self.decorrelated_level();
        (d.saturating_sub(3)..=d).map(|l| self.bins[l].stddev()[component]).collect()
    }

    /// Whether the error bar of `component` has stopped growing with the
    /// binning level.
    pub fn is_converged(&self, component: usize) -> bool {
        let d = self.decorrelated_level();
        let yv = self.level_errors(component);
        if yv.len() < 3 {
            return false;
        }
        let xv: Vec<f64> = (d + 1 - yv.len()..=d).map(|x| x as f64).collect();
        let n = xv.len() as f64;
        let sx: f64 = xv.iter().sum();
        let sy: f64 = yv.iter().sum();
        let sxx: f64 = xv.iter().map(|x| x * x).sum();
        let sxy: f64 = xv.iter().zip(yv.iter()).map(|(x, y)| x * y).sum();
        let slope = (sxy - sx * sy / n) / (sxx - sx * sx / n);
        match yv.last() {
            Some(&last) => slope.abs() < 0.1 * last,
            None => false,
        }
    }

    /// Autocorrelation time of `component`, `None` when the error has not
    /// converged or the raw error vanishes.
    pub fn tau(&self, component: usize) -> Option<f64> {
        let stddev_0 = self.bins[0].stddev()[component];
        if !(stddev_0 >= 1e-12) || !self.is_converged(component) {
            return None;
        }
        let stddev_d = self.bins[self.decorrelated_level()].stddev()[component];
        let r = stddev_d / stddev_0;
        Some((0.5 * (r * r - 1.0)).abs())
    }

    /// Mean and error of every level with more than one sample.
    pub fn levels(&self) -> Vec<(usize, Vec<f64>, Vec<f64>)> {
        self.bins
            .iter()
            .take_while(|b| b.num_samples > 1)
            .map(|b| (b.num_samples, b.mean(), b.stddev()))
            .collect()
    }

    /// Mean and error of `component`, as an independent chain result.
    pub fn estimate(&self, component: usize) -> ChainEstimate {
        ChainEstimate {
            mean: self.mean()[component],
            stddev: self.stddev()[component],
            num_samples: self.sample_count(),
        }
    }
}

impl StatisticsSink for BinnedObservable {
    fn push(&mut self, sample: &[f64]) {
        let mut value = sample.to_vec();
        for bin in self.bins.iter_mut() {
            match bin.add(&value) {
                Some(carry) => value = carry,
                None => break,
            }
        }
    }

    fn mean(&self) -> Vec<f64> {
        self.bins[0].mean()
    }

    fn stddev(&self) -> Vec<f64> {
        self.bins[self.decorrelated_level()].stddev()
    }

    fn sample_count(&self) -> usize {
        self.bins[0].num_samples
    }

    fn reset(&mut self) {
        self.bins = (0..MAX_BIN_LEVEL).map(|_| DataBin::new(self.dim)).collect();
    }
}

impl fmt::Display for BinnedObservable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "#{}", "-".repeat(36))?;
        writeln!(f, "# {}: (samples = {})", self.name, self.sample_count())?;
        writeln!(f, "{:<8}{:<16}{:<12}", "# i", "mean", "err")?;
        writeln!(f, "#{}", "-".repeat(36))?;
        let mean = self.mean();
        let stddev = self.stddev();
        for i in 0..self.dim {
            writeln!(f, "  {:<6}{:<16.6E}{:<12.6}", i, mean[i], stddev[i])?;
        }
        Ok(())
    }
}

/// Mean and error of one independent chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainEstimate {
    pub mean: f64,
    pub stddev: f64,
    pub num_samples: usize,
}

impl ChainEstimate {
    /// Combines independent chains: the mean of the means, with error
    /// $\sqrt{\sum_c\sigma_c^2}/n$.
    pub fn combine(chains: &[ChainEstimate]) -> Option<ChainEstimate> {
        if chains.is_empty() {
            return None;
        }
        let n = chains.len() as f64;
        let mean = chains.iter().map(|c| c.mean).sum::<f64>() / n;
        let stddev = chains.iter().map(|c| c.stddev * c.stddev).sum::<f64>().sqrt() / n;
        let num_samples = chains.iter().map(|c| c.num_samples).sum();
        Some(ChainEstimate { mean, stddev, num_samples })
    }
}
