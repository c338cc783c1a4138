use std::fmt;

use crate::random::MoveGenerator;

/// Spin species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Up,
    Down,
}

/// A single particle hop of one species.
/// # Fields
/// * __`particle`__ - Index of the moving particle in the species' position
/// list.
/// * __`hole`__ - Index of the target hole in the species' hole list.
/// * __`from`__, __`to`__ - Site indices, in $\[0,N)$.
/// * __`delta_nd`__ - Change in the number of doubly occupied sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub particle: usize,
    pub hole: usize,
    pub from: usize,
    pub to: usize,
    pub delta_nd: i32,
}

/// Move proposed on a [FockConfiguration] and not yet committed or undone.
/// The occupation bits already reflect the move, the position and hole lists
/// do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingMove {
    #[default]
    None,
    UpHop(Hop),
    DownHop(Hop),
    Exchange { up: Hop, down: Hop },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SpeciesLists {
    particles: Vec<usize>,
    holes: Vec<usize>,
}

impl SpeciesLists {
    fn particle_index(&self, site: usize) -> Option<usize> {
        self.particles.iter().position(|&s| s == site)
    }

    fn hole_index(&self, site: usize) -> Option<usize> {
        self.holes.iter().position(|&s| s == site)
    }

    fn apply(&mut self, hop: &Hop) {
        self.particles[hop.particle] = hop.to;
        self.holes[hop.hole] = hop.from;
    }
}

/// Occupation number configuration for two spin species on $N$ sites.
/// # Layout
/// The occupation vector has $2N$ slots. Slots $\[0,N)$ are the up-spin
/// occupations, slots $\[N,2N)$ are the down-spin occupations. Alongside, each
/// species keeps the list of its occupied sites (particle index to site) and
/// of its holes.
/// # Moves
/// A configuration holds at most one [PendingMove]. Every proposal, including
/// the measurement operators [FockConfiguration::op_hop_up],
/// [FockConfiguration::op_hop_down] and [FockConfiguration::op_exchange_ud],
/// first undoes the previous pending move. The move is then decided by
/// [FockConfiguration::commit] or [FockConfiguration::undo].
#[derive(Debug, Clone)]
pub struct FockConfiguration {
    num_sites: usize,
    allow_double_occupancy: bool,
    state: Vec<bool>,
    up: SpeciesLists,
    dn: SpeciesLists,
    num_dblocc_sites: usize,
    pending: PendingMove,
    op_sign: i32,
    rng: MoveGenerator,
}

impl FockConfiguration {
    /// Empty configuration on `num_sites` sites. Call
    /// [FockConfiguration::init_spins] before proposing moves.
    pub fn new(num_sites: usize, allow_double_occupancy: bool, seed: u64) -> Self {
        let mut out = FockConfiguration {
            num_sites: 0,
            allow_double_occupancy,
            state: Vec::new(),
            up: SpeciesLists::default(),
            dn: SpeciesLists::default(),
            num_dblocc_sites: 0,
            pending: PendingMove::None,
            op_sign: 1,
            rng: MoveGenerator::new(seed),
        };
        out.init(num_sites, allow_double_occupancy);
        out
    }

    /// Resets everything and scopes the site generator to $\[0,N)$.
    pub fn init(&mut self, num_sites: usize, allow_double_occupancy: bool) {
        self.num_sites = num_sites;
        self.allow_double_occupancy = allow_double_occupancy;
        self.state = vec![false; 2 * num_sites];
        self.up = SpeciesLists::default();
        self.dn = SpeciesLists::default();
        self.num_dblocc_sites = 0;
        self.pending = PendingMove::None;
        self.op_sign = 1;
        self.rng.set_site_generator(num_sites);
    }

    fn check_capacity(&self, num_upspins: usize, num_dnspins: usize) -> Result<(), VmcError> {
        let over = num_upspins > self.num_sites || num_dnspins > self.num_sites;
        let crowded = !self.allow_double_occupancy && num_upspins + num_dnspins > self.num_sites;
        if over || crowded {
            return Err(VmcError::SpinCapacity {
                num_upspins,
                num_dnspins,
                num_sites: self.num_sites,
                double_occupancy: self.allow_double_occupancy,
            });
        }
        Ok(())
    }

    fn scope_generators(&mut self) {
        self.rng.set_particle_generator(Spin::Up, self.up.particles.len());
        self.rng.set_particle_generator(Spin::Down, self.dn.particles.len());
        self.rng.set_hole_generator(Spin::Up, self.up.holes.len());
        self.rng.set_hole_generator(Spin::Down, self.dn.holes.len());
    }

    /// Fixes the number of particles of each species and draws a random
    /// configuration.
    pub fn init_spins(&mut self, num_upspins: usize, num_dnspins: usize) -> Result<(), VmcError> {
        self.check_capacity(num_upspins, num_dnspins)?;
        self.up.particles = vec![0; num_upspins];
        self.up.holes = vec![0; self.num_sites - num_upspins];
        self.dn.particles = vec![0; num_dnspins];
        self.dn.holes = vec![0; self.num_sites - num_dnspins];
        self.scope_generators();
        self.set_random();
        Ok(())
    }

    /// Uniformly random configuration with the current particle numbers. When
    /// double occupancy is disallowed, the down spins are placed on up-spin
    /// holes only.
    pub fn set_random(&mut self) {
        let n = self.num_sites;
        let n_up = self.up.particles.len();
        let n_dn = self.dn.particles.len();
        self.pending = PendingMove::None;
        self.state.iter_mut().for_each(|b| *b = false);

        let mut sites: Vec<usize> = (0..n).collect();
        self.rng.shuffle(&mut sites);
        self.up.particles.copy_from_slice(&sites[..n_up]);
        self.up.holes.copy_from_slice(&sites[n_up..]);

        if self.allow_double_occupancy {
            let mut dn_sites: Vec<usize> = (0..n).collect();
            self.rng.shuffle(&mut dn_sites);
            self.dn.particles.copy_from_slice(&dn_sites[..n_dn]);
            self.dn.holes.copy_from_slice(&dn_sites[n_dn..]);
        } else {
            self.dn.particles.copy_from_slice(&sites[n_up..n_up + n_dn]);
            self.dn.holes.clear();
            self.dn.holes.extend_from_slice(&sites[..n_up]);
            self.dn.holes.extend_from_slice(&sites[n_up + n_dn..]);
        }

        for &s in self.up.particles.iter() {
            self.state[s] = true;
        }
        for &s in self.dn.particles.iter() {
            self.state[n + s] = true;
        }
        self.num_dblocc_sites = self.count_double_occupancy();
    }

    /// Places the particles on the given sites. The particle numbers become
    /// the lengths of the slices and the generators are re-scoped.
    pub fn set_occupations(&mut self, up_sites: &[usize], dn_sites: &[usize]) -> Result<(), VmcError> {
        self.check_capacity(up_sites.len(), dn_sites.len())?;
        let n = self.num_sites;
        let mut state = vec![false; 2 * n];
        for (offset, sites, name) in [(0, up_sites, "up"), (n, dn_sites, "down")] {
            for &s in sites {
                if s >= n {
                    return Err(VmcError::InvalidOccupation {
                        details: format!("{} spin on site {} of a {} site lattice", name, s, n),
                    });
                }
                if state[offset + s] {
                    return Err(VmcError::InvalidOccupation {
                        details: format!("two {} spins on site {}", name, s),
                    });
                }
                state[offset + s] = true;
            }
        }
        if !self.allow_double_occupancy {
            if let Some(s) = (0..n).find(|&s| state[s] && state[n + s]) {
                return Err(VmcError::InvalidOccupation {
                    details: format!("site {} is doubly occupied", s),
                });
            }
        }

        self.state = state;
        self.up.particles = up_sites.to_vec();
        self.up.holes = (0..n).filter(|&s| !self.state[s]).collect();
        self.dn.particles = dn_sites.to_vec();
        self.dn.holes = (0..n).filter(|&s| !self.state[n + s]).collect();
        self.pending = PendingMove::None;
        self.op_sign = 1;
        self.num_dblocc_sites = self.count_double_occupancy();
        self.scope_generators();
        Ok(())
    }

    #[inline(always)]
    fn slot(&self, spin: Spin, site: usize) -> usize {
        match spin {
            Spin::Up => site,
            Spin::Down => self.num_sites + site,
        }
    }

    fn lists(&self, spin: Spin) -> &SpeciesLists {
        match spin {
            Spin::Up => &self.up,
            Spin::Down => &self.dn,
        }
    }

    #[inline(always)]
    fn other_occupied(&self, spin: Spin, site: usize) -> bool {
        match spin {
            Spin::Up => self.state[self.num_sites + site],
            Spin::Down => self.state[site],
        }
    }

    /// Flips the occupation bits of a hop and returns its double occupancy
    /// increment.
    fn apply_bits(&mut self, spin: Spin, from: usize, to: usize) -> i32 {
        let fr = self.slot(spin, from);
        let tt = self.slot(spin, to);
        self.state[fr] = false;
        self.state[tt] = true;
        self.other_occupied(spin, to) as i32 - self.other_occupied(spin, from) as i32
    }

    fn revert_bits(&mut self, spin: Spin, hop: &Hop) {
        let fr = self.slot(spin, hop.from);
        let tt = self.slot(spin, hop.to);
        self.state[tt] = false;
        self.state[fr] = true;
    }

    fn propose_hop(&mut self, spin: Spin) -> bool {
        self.undo();
        let lists = self.lists(spin);
        if lists.particles.is_empty() || lists.holes.is_empty() {
            return false;
        }
        let particle = self.rng.random_particle(spin);
        let hole = self.rng.random_hole(spin);
        let lists = self.lists(spin);
        let from = lists.particles[particle];
        let to = lists.holes[hole];
        if !self.allow_double_occupancy && self.other_occupied(spin, to) {
            return false;
        }
        let delta_nd = self.apply_bits(spin, from, to);
        let hop = Hop { particle, hole, from, to, delta_nd };
        self.pending = match spin {
            Spin::Up => PendingMove::UpHop(hop),
            Spin::Down => PendingMove::DownHop(hop),
        };
        true
    }

    /// Proposes a hop of a random up spin to a random up-spin hole. Any
    /// previous pending move is undone first. Returns `false`, leaving no
    /// pending move, when no such hop is possible.
    pub fn propose_up_hop(&mut self) -> bool {
        self.propose_hop(Spin::Up)
    }

    /// Down-spin counterpart of [FockConfiguration::propose_up_hop].
    pub fn propose_down_hop(&mut self) -> bool {
        self.propose_hop(Spin::Down)
    }

    /// Proposes to swap a random up spin with a random down spin. Only valid
    /// when each target site is a hole of the arriving species.
    pub fn propose_exchange(&mut self) -> bool {
        self.undo();
        if self.up.particles.is_empty() || self.up.holes.is_empty() {
            return false;
        }
        if self.dn.particles.is_empty() || self.dn.holes.is_empty() {
            return false;
        }
        let up_particle = self.rng.random_particle(Spin::Up);
        let dn_particle = self.rng.random_particle(Spin::Down);
        let up_from = self.up.particles[up_particle];
        let dn_from = self.dn.particles[dn_particle];
        let up_hole = match self.up.hole_index(dn_from) {
            Some(h) => h,
            None => return false,
        };
        let dn_hole = match self.dn.hole_index(up_from) {
            Some(h) => h,
            None => return false,
        };
        self.apply_bits(Spin::Up, up_from, dn_from);
        self.apply_bits(Spin::Down, dn_from, up_from);
        self.pending = PendingMove::Exchange {
            up: Hop { particle: up_particle, hole: up_hole, from: up_from, to: dn_from, delta_nd: 0 },
            down: Hop { particle: dn_particle, hole: dn_hole, from: dn_from, to: up_from, delta_nd: 0 },
        };
        true
    }

    /// Makes the pending move permanent. No-op without a pending move.
    pub fn commit(&mut self) {
        match self.pending {
            PendingMove::None => {},
            PendingMove::UpHop(hop) => {
                self.up.apply(&hop);
                self.num_dblocc_sites = (self.num_dblocc_sites as i32 + hop.delta_nd) as usize;
            },
            PendingMove::DownHop(hop) => {
                self.dn.apply(&hop);
                self.num_dblocc_sites = (self.num_dblocc_sites as i32 + hop.delta_nd) as usize;
            },
            PendingMove::Exchange { up, down } => {
                self.up.apply(&up);
                self.dn.apply(&down);
            },
        }
        self.pending = PendingMove::None;
    }

    /// Restores the occupation bits touched by the pending move. Idempotent.
    pub fn undo(&mut self) {
        match self.pending {
            PendingMove::None => {},
            PendingMove::UpHop(hop) => self.revert_bits(Spin::Up, &hop),
            PendingMove::DownHop(hop) => self.revert_bits(Spin::Down, &hop),
            PendingMove::Exchange { up, down } => {
                self.revert_bits(Spin::Up, &up);
                self.revert_bits(Spin::Down, &down);
            },
        }
        self.pending = PendingMove::None;
    }

    #[inline(always)]
    pub fn op_occupation_up(&self, site: usize) -> usize {
        self.state[site] as usize
    }

    #[inline(always)]
    pub fn op_occupation_down(&self, site: usize) -> usize {
        self.state[self.num_sites + site] as usize
    }

    #[inline(always)]
    pub fn op_double_occupation(&self, site: usize) -> usize {
        (self.state[site] && self.state[self.num_sites + site]) as usize
    }

    /// Number of occupied slots of `spin` strictly between sites `a` and `b`.
    fn parity_between(&self, spin: Spin, a: usize, b: usize) -> usize {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if hi <= lo + 1 {
            return 0;
        }
        let offset = self.slot(spin, 0);
        self.state[offset + lo + 1..offset + hi].iter().filter(|&&occ| occ).count()
    }

    fn op_hop(&mut self, spin: Spin, i: usize, j: usize) -> bool {
        self.undo();
        let ni = self.state[self.slot(spin, i)];
        let nj = self.state[self.slot(spin, j)];
        let (from, to) = match (ni, nj) {
            (false, true) => (j, i),
            (true, false) => (i, j),
            _ if i == j && ni => {
                self.op_sign = 1;
                return true;
            },
            _ => return false,
        };
        let lists = self.lists(spin);
        let (particle, hole) = match (lists.particle_index(from), lists.hole_index(to)) {
            (Some(p), Some(h)) => (p, h),
            _ => return false,
        };
        let delta_nd = self.apply_bits(spin, from, to);
        self.op_sign = if self.parity_between(spin, from, to) % 2 == 0 { 1 } else { -1 };
        let hop = Hop { particle, hole, from, to, delta_nd };
        self.pending = match spin {
            Spin::Up => PendingMove::UpHop(hop),
            Spin::Down => PendingMove::DownHop(hop),
        };
        true
    }

    /// Applies $c^\dagger_{i\uparrow}c_{j\uparrow}$ or its conjugate, whichever
    /// connects an occupied site to an empty one. The fermionic sign is read
    /// with [FockConfiguration::op_sign] and the move stays pending. For
    /// $i=j$ on an occupied site, returns `true` with sign $+1$ and leaves the
    /// configuration untouched.
    pub fn op_hop_up(&mut self, i: usize, j: usize) -> bool {
        self.op_hop(Spin::Up, i, j)
    }

    /// Down-spin counterpart of [FockConfiguration::op_hop_up].
    pub fn op_hop_down(&mut self, i: usize, j: usize) -> bool {
        self.op_hop(Spin::Down, i, j)
    }

    /// Spin exchange $S^+_iS^-_j$ between sites holding one up and one down
    /// spin in opposite arrangement. Returns the fermionic sign, or $0$ when
    /// the sites do not admit the exchange.
    pub fn op_exchange_ud(&mut self, i: usize, j: usize) -> i32 {
        self.undo();
        if i == j {
            return 0;
        }
        let n = self.num_sites;
        let pattern = (self.state[i], self.state[j], self.state[n + i], self.state[n + j]);
        let (up_from, up_to) = match pattern {
            (true, false, false, true) => (i, j),
            (false, true, true, false) => (j, i),
            _ => return 0,
        };
        let (dn_from, dn_to) = (up_to, up_from);
        let (up_particle, up_hole) = match (self.up.particle_index(up_from), self.up.hole_index(up_to)) {
            (Some(p), Some(h)) => (p, h),
            _ => return 0,
        };
        let (dn_particle, dn_hole) = match (self.dn.particle_index(dn_from), self.dn.hole_index(dn_to)) {
            (Some(p), Some(h)) => (p, h),
            _ => return 0,
        };
        self.apply_bits(Spin::Up, up_from, up_to);
        self.apply_bits(Spin::Down, dn_from, dn_to);

        // Half-open interval [min, max) on each species, after the flip.
        let lo = i.min(j);
        let hi = i.max(j);
        let count = (lo..hi).filter(|&s| self.state[s]).count()
            + (lo..hi).filter(|&s| self.state[n + s]).count();
        self.op_sign = if count % 2 == 0 { 1 } else { -1 };
        self.pending = PendingMove::Exchange {
            up: Hop { particle: up_particle, hole: up_hole, from: up_from, to: up_to, delta_nd: 0 },
            down: Hop { particle: dn_particle, hole: dn_hole, from: dn_from, to: dn_to, delta_nd: 0 },
        };
        self.op_sign
    }

    /// Full recount of the doubly occupied sites.
    pub fn count_double_occupancy(&self) -> usize {
        (0..self.num_sites).filter(|&s| self.state[s] && self.state[self.num_sites + s]).count()
    }

    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    pub fn num_upspins(&self) -> usize {
        self.up.particles.len()
    }

    pub fn num_dnspins(&self) -> usize {
        self.dn.particles.len()
    }

    pub fn allow_double_occupancy(&self) -> bool {
        self.allow_double_occupancy
    }

    pub fn state(&self) -> &[bool] {
        &self.state
    }

    pub fn upspin_sites(&self) -> &[usize] {
        &self.up.particles
    }

    pub fn dnspin_sites(&self) -> &[usize] {
        &self.dn.particles
    }

    pub fn upspin_holes(&self) -> &[usize] {
        &self.up.holes
    }

    pub fn dnspin_holes(&self) -> &[usize] {
        &self.dn.holes
    }

    pub fn num_dblocc_sites(&self) -> usize {
        self.num_dblocc_sites
    }

    pub fn pending_move(&self) -> &PendingMove {
        &self.pending
    }

    /// Sign of the last measurement operator.
    pub fn op_sign(&self) -> i32 {
        self.op_sign
    }

    /// Double occupancy increment of the pending move.
    pub fn delta_nd(&self) -> i32 {
        match self.pending {
            PendingMove::UpHop(hop) | PendingMove::DownHop(hop) => hop.delta_nd,
            _ => 0,
        }
    }

    /// Acceptance draw, from the configuration's own engine.
    pub fn random_real(&mut self) -> f64 {
        self.rng.random_real()
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }
}

impl fmt::Display for FockConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let n = self.num_sites;
        let bits = |slots: &[bool]| -> String {
            slots.iter().map(|&b| if b { '1' } else { '0' }).collect()
        };
        write!(f, "|\u{2191} {}; \u{2193} {}\u{27E9}", bits(&self.state[..n]), bits(&self.state[n..]))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn check_lists(conf: &FockConfiguration) {
        let n = conf.num_sites();
        let mut seen_up = vec![false; n];
        for &s in conf.upspin_sites().iter().chain(conf.upspin_holes()) {
            assert!(!seen_up[s]);
            seen_up[s] = true;
        }
        let mut seen_dn = vec![false; n];
        for &s in conf.dnspin_sites().iter().chain(conf.dnspin_holes()) {
            assert!(!seen_dn[s]);
            seen_dn[s] = true;
        }
        for &s in conf.upspin_sites() {
            assert_eq!(conf.op_occupation_up(s), 1);
        }
        for &s in conf.dnspin_sites() {
            assert_eq!(conf.op_occupation_down(s), 1);
        }
        assert_eq!(conf.num_dblocc_sites(), conf.count_double_occupancy());
    }

    #[test]
    fn test_init_spins_capacity() {
        let mut conf = FockConfiguration::new(4, false, 42);
        assert!(conf.init_spins(3, 2).is_err());
        assert!(conf.init_spins(5, 0).is_err());
        assert!(conf.init_spins(2, 2).is_ok());
        assert_eq!(conf.num_dblocc_sites(), 0);

        let mut conf = FockConfiguration::new(4, true, 42);
        assert!(conf.init_spins(4, 4).is_ok());
        assert_eq!(conf.num_dblocc_sites(), 4);
        assert!(conf.init_spins(4, 5).is_err());
    }

    #[test]
    fn test_set_random_no_double_occupancy() {
        let mut conf = FockConfiguration::new(16, false, 42);
        conf.init_spins(7, 8).unwrap();
        for _ in 0..100 {
            conf.set_random();
            check_lists(&conf);
            assert_eq!(conf.num_dblocc_sites(), 0);
        }
    }

    #[test]
    fn test_propose_undo_restores_state() {
        let mut conf = FockConfiguration::new(10, true, 7);
        conf.init_spins(4, 6).unwrap();
        for step in 0..1000 {
            let before = conf.state().to_vec();
            let ok = match step % 3 {
                0 => conf.propose_up_hop(),
                1 => conf.propose_down_hop(),
                _ => conf.propose_exchange(),
            };
            if ok {
                assert_ne!(conf.pending_move(), &PendingMove::None);
            }
            conf.undo();
            assert_eq!(conf.state(), &before[..]);
            assert_eq!(conf.pending_move(), &PendingMove::None);
            check_lists(&conf);
        }
    }

    #[test]
    fn test_propose_commit_keeps_invariants() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut conf = FockConfiguration::new(12, true, 42);
        conf.init_spins(5, 7).unwrap();
        for _ in 0..5000 {
            let ok = match rng.gen_range(0..3) {
                0 => conf.propose_up_hop(),
                1 => conf.propose_down_hop(),
                _ => conf.propose_exchange(),
            };
            if !ok {
                continue;
            }
            let pending = *conf.pending_move();
            if rng.gen::<bool>() {
                conf.commit();
                if let PendingMove::UpHop(hop) = pending {
                    assert!(conf.upspin_sites().contains(&hop.to));
                    assert!(conf.upspin_holes().contains(&hop.from));
                }
                if let PendingMove::DownHop(hop) = pending {
                    assert!(conf.dnspin_sites().contains(&hop.to));
                    assert!(conf.dnspin_holes().contains(&hop.from));
                }
            } else {
                conf.undo();
            }
            check_lists(&conf);
            assert_eq!(conf.num_upspins(), 5);
            assert_eq!(conf.num_dnspins(), 7);
        }
    }

    #[test]
    fn test_proposal_auto_undoes() {
        let mut conf = FockConfiguration::new(8, true, 3);
        conf.init_spins(3, 3).unwrap();
        let before = conf.state().to_vec();
        assert!(conf.propose_up_hop());
        assert!(conf.propose_up_hop());
        conf.undo();
        assert_eq!(conf.state(), &before[..]);
    }

    #[test]
    fn test_no_move_possible() {
        let mut conf = FockConfiguration::new(4, true, 3);
        conf.init_spins(4, 0).unwrap();
        assert!(!conf.propose_up_hop());
        assert!(!conf.propose_down_hop());
        assert!(!conf.propose_exchange());
        assert_eq!(conf.pending_move(), &PendingMove::None);
    }

    #[test]
    fn test_op_hop_sign() {
        let mut conf = FockConfiguration::new(6, true, 3);
        conf.set_occupations(&[0, 2, 3], &[1]).unwrap();
        // Two up spins between 0 and 5.
        assert!(conf.op_hop_up(0, 5));
        assert_eq!(conf.op_sign(), 1);
        conf.undo();
        // Sites 2 and 3 lie between 0 and 4.
        assert!(conf.op_hop_up(4, 0));
        assert_eq!(conf.op_sign(), 1);
        conf.undo();
        assert!(conf.op_hop_up(3, 1));
        assert_eq!(conf.op_sign(), -1);
        conf.undo();
        assert!(!conf.op_hop_up(0, 2));
        assert!(conf.op_hop_up(2, 2));
        assert_eq!(conf.pending_move(), &PendingMove::None);
        assert!(!conf.op_hop_up(1, 1));
    }

    #[test]
    fn test_op_hop_down_uses_down_slots() {
        let mut conf = FockConfiguration::new(4, true, 3);
        conf.set_occupations(&[0, 1], &[2]).unwrap();
        assert!(conf.op_hop_down(2, 0));
        assert_eq!(conf.delta_nd(), 1);
        conf.commit();
        assert_eq!(conf.dnspin_sites(), &[0]);
        assert_eq!(conf.num_dblocc_sites(), 1);
        check_lists(&conf);
    }

    #[test]
    fn test_op_exchange() {
        let mut conf = FockConfiguration::new(5, false, 3);
        conf.set_occupations(&[0, 2], &[3]).unwrap();
        assert_eq!(conf.op_exchange_ud(3, 3), 0);
        assert_eq!(conf.op_exchange_ud(0, 2), 0);
        let before = conf.state().to_vec();
        let sign = conf.op_exchange_ud(0, 3);
        assert!(sign == 1 || sign == -1);
        assert_eq!(conf.op_occupation_up(3), 1);
        assert_eq!(conf.op_occupation_down(0), 1);
        conf.undo();
        assert_eq!(conf.state(), &before[..]);
        conf.op_exchange_ud(0, 3);
        conf.commit();
        check_lists(&conf);
        assert_eq!(conf.num_dblocc_sites(), 0);
    }

    #[test]
    fn test_set_occupations_validation() {
        let mut conf = FockConfiguration::new(4, false, 3);
        assert!(conf.set_occupations(&[0, 0], &[]).is_err());
        assert!(conf.set_occupations(&[4], &[]).is_err());
        assert!(conf.set_occupations(&[1], &[1]).is_err());
        assert!(conf.set_occupations(&[1], &[2]).is_ok());
        assert_eq!(format!("{}", conf), "|\u{2191} 0100; \u{2193} 0010\u{27E9}");
    }
}
