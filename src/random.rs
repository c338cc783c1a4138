use rand::distributions::{Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_mt::Mt64;

use crate::Spin;

/// Random number streams used to generate moves.
/// # Definition
/// A single Mersenne-Twister engine drives one bounded integer generator per
/// move category: a lattice site, a particle of each species and a hole of
/// each species. The ranges are re-scoped every time the number of particles
/// changes. An empty category is given the degenerate range $\[0,0\]$; it is
/// the caller's job to never draw from it.
#[derive(Debug, Clone)]
pub struct MoveGenerator {
    engine: Mt64,
    site: Uniform<usize>,
    upspin: Uniform<usize>,
    dnspin: Uniform<usize>,
    uphole: Uniform<usize>,
    dnhole: Uniform<usize>,
    real: Uniform<f64>,
}

fn index_range(n: usize) -> Uniform<usize> {
    Uniform::new_inclusive(0, n.saturating_sub(1))
}

impl MoveGenerator {
    pub fn new(seed: u64) -> Self {
        MoveGenerator {
            engine: Mt64::new(seed),
            site: index_range(0),
            upspin: index_range(0),
            dnspin: index_range(0),
            uphole: index_range(0),
            dnhole: index_range(0),
            real: Uniform::new(0.0, 1.0),
        }
    }

    /// Restarts the engine. Ranges are kept.
    pub fn reseed(&mut self, seed: u64) {
        self.engine = Mt64::new(seed);
    }

    pub fn set_site_generator(&mut self, num_sites: usize) {
        self.site = index_range(num_sites);
    }

    pub fn set_particle_generator(&mut self, spin: Spin, num_particles: usize) {
        match spin {
            Spin::Up => self.upspin = index_range(num_particles),
            Spin::Down => self.dnspin = index_range(num_particles),
        }
    }

    pub fn set_hole_generator(&mut self, spin: Spin, num_holes: usize) {
        match spin {
            Spin::Up => self.uphole = index_range(num_holes),
            Spin::Down => self.dnhole = index_range(num_holes),
        }
    }

    #[inline(always)]
    pub fn random_site(&mut self) -> usize {
        self.site.sample(&mut self.engine)
    }

    #[inline(always)]
    pub fn random_particle(&mut self, spin: Spin) -> usize {
        match spin {
            Spin::Up => self.upspin.sample(&mut self.engine),
            Spin::Down => self.dnspin.sample(&mut self.engine),
        }
    }

    #[inline(always)]
    pub fn random_hole(&mut self, spin: Spin) -> usize {
        match spin {
            Spin::Up => self.uphole.sample(&mut self.engine),
            Spin::Down => self.dnhole.sample(&mut self.engine),
        }
    }

    /// Uniform real in $\[0,1)$, used for the acceptance draw.
    #[inline(always)]
    pub fn random_real(&mut self) -> f64 {
        self.real.sample(&mut self.engine)
    }

    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        values.shuffle(&mut self.engine);
    }

    /// Derives a fresh seed from the engine, for spawning other chains.
    pub fn next_seed(&mut self) -> u64 {
        self.engine.gen::<u64>()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ranges_are_respected() {
        let mut rng = MoveGenerator::new(42);
        rng.set_site_generator(16);
        rng.set_particle_generator(Spin::Up, 4);
        rng.set_particle_generator(Spin::Down, 3);
        rng.set_hole_generator(Spin::Up, 12);
        rng.set_hole_generator(Spin::Down, 13);
        for _ in 0..10_000 {
            assert!(rng.random_site() < 16);
            assert!(rng.random_particle(Spin::Up) < 4);
            assert!(rng.random_particle(Spin::Down) < 3);
            assert!(rng.random_hole(Spin::Up) < 12);
            assert!(rng.random_hole(Spin::Down) < 13);
            let x = rng.random_real();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_empty_species_is_degenerate() {
        let mut rng = MoveGenerator::new(7);
        rng.set_particle_generator(Spin::Up, 0);
        for _ in 0..100 {
            assert_eq!(rng.random_particle(Spin::Up), 0);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = MoveGenerator::new(1234);
        let mut b = MoveGenerator::new(1234);
        a.set_site_generator(100);
        b.set_site_generator(100);
        for _ in 0..100 {
            assert_eq!(a.random_site(), b.random_site());
        }
        a.reseed(1);
        b.reseed(1);
        assert_eq!(a.next_seed(), b.next_seed());
    }
}
