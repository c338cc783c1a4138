use derive_more::Error;
use std::fmt;

/// Errors raised by the sampler.
/// # Taxonomy
/// * Configuration errors, raised while setting up the system. The caller
/// must fix the parameters.
/// * Degenerate ansatz, raised by
/// [`ConfigurationSampler::init_state`](crate::sampler::ConfigurationSampler::init_state)
/// once every allowed starting configuration was ill conditioned.
/// * Linear algebra failures reported by LAPACK.
///
/// A rejected or impossible move is never an error, it is folded into the
/// acceptance statistics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmcError {
    SpinCapacity {
        num_upspins: usize,
        num_dnspins: usize,
        num_sites: usize,
        double_occupancy: bool,
    },
    InvalidOccupation {
        details: String,
    },
    HoleDoping {
        hole_doping: f64,
    },
    LatticeSize {
        l1: usize,
        l2: usize,
    },
    SpeciesMismatch {
        num_upspins: usize,
        num_dnspins: usize,
    },
    IllConditioned {
        attempts: usize,
        rcond: f64,
    },
    Lapack {
        routine: &'static str,
        info: i32,
    },
    ParameterCount {
        expected: usize,
        got: usize,
    },
    SiteCountMismatch {
        lattice: usize,
        provider: usize,
    },
}

impl fmt::Display for VmcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VmcError::SpinCapacity { num_upspins, num_dnspins, num_sites, double_occupancy } => {
                write!(
                    f,
                    "Spin number exceeds capacity: {} up, {} down on {} sites (double occupancy allowed: {}).",
                    num_upspins, num_dnspins, num_sites, double_occupancy
                )
            },
            VmcError::InvalidOccupation { details } => {
                write!(f, "Invalid occupation: {}", details)
            },
            VmcError::HoleDoping { hole_doping } => {
                write!(f, "Hole doping {} is out of range.", hole_doping)
            },
            VmcError::LatticeSize { l1, l2 } => {
                write!(f, "Invalid lattice size {}x{}.", l1, l2)
            },
            VmcError::SpeciesMismatch { num_upspins, num_dnspins } => {
                write!(
                    f,
                    "Pair amplitude matrix must be square, got {} up and {} down spins.",
                    num_upspins, num_dnspins
                )
            },
            VmcError::IllConditioned { attempts, rcond } => {
                write!(
                    f,
                    "Configuration wave function ill conditioned after {} attempts (last rcond = {:.2e}).",
                    attempts, rcond
                )
            },
            VmcError::Lapack { routine, info } => {
                write!(f, "LAPACK routine {} failed with info = {}.", routine, info)
            },
            VmcError::ParameterCount { expected, got } => {
                write!(f, "Expected {} variational parameters, got {}.", expected, got)
            },
            VmcError::SiteCountMismatch { lattice, provider } => {
                write!(f, "Lattice has {} sites but the amplitudes are defined on {}.", lattice, provider)
            },
        }
    }
}
