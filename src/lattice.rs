use std::f64::consts::PI;

use crate::errors::VmcError;

/// Nearest-neighbour bond from `src` to `tgt`. `phase` is $-1$ when the bond
/// crosses an antiperiodic boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub src: usize,
    pub tgt: usize,
    pub phase: f64,
}

/// What the sampler needs to know about the geometry.
pub trait Lattice {
    fn num_sites(&self) -> usize;
    fn bonds(&self) -> &[Bond];
}

/// Neighbour directions, in the order of [SquareLattice::neighbours].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right = 0,
    Top = 1,
    Left = 2,
    Bottom = 3,
}

/// $L_1\times L_2$ square lattice, periodic along $x$ and antiperiodic
/// along $y$.
/// # Numbering
/// Sites are numbered row by row,
/// ```text
///   12   13   14   15
///    8    9   10   11
///    4    5    6    7
///    0    1    2    3
/// ```
/// so that site $i$ sits at $(i \bmod L_1, \lfloor i/L_1\rfloor)$. Each site
/// owns its right and top bond.
/// # Momenta
/// $k_x=2\pi(n_1-\lfloor L_1/2\rfloor)/L_1$ and
/// $k_y=2\pi(n_2-\lfloor L_2/2\rfloor+\frac12)/L_2$, the half-integer shift
/// matching the antiperiodic boundary.
#[derive(Debug, Clone)]
pub struct SquareLattice {
    l1: usize,
    l2: usize,
    nn_table: Vec<[usize; 4]>,
    bonds: Vec<Bond>,
    kpoints: Vec<(f64, f64)>,
}

impl SquareLattice {
    pub fn new(l1: usize, l2: usize) -> Result<Self, VmcError> {
        if l1 < 1 || l2 < 1 {
            return Err(VmcError::LatticeSize { l1, l2 });
        }
        let num_sites = l1 * l2;
        let nn_table: Vec<[usize; 4]> = (0..num_sites)
            .map(|i| {
                let (x, y) = (i % l1, i / l1);
                [
                    (x + 1) % l1 + y * l1,
                    x + (y + 1) % l2 * l1,
                    (x + l1 - 1) % l1 + y * l1,
                    x + (y + l2 - 1) % l2 * l1,
                ]
            })
            .collect();

        let mut bonds = Vec::with_capacity(2 * num_sites);
        for (i, nn) in nn_table.iter().enumerate() {
            bonds.push(Bond { src: i, tgt: nn[Direction::Right as usize], phase: 1.0 });
            let top = nn[Direction::Top as usize];
            let phase = if top < i { -1.0 } else { 1.0 };
            bonds.push(Bond { src: i, tgt: top, phase });
        }

        let kpoints = (0..num_sites)
            .map(|i| {
                let n1 = (i % l1) as f64 - (l1 / 2) as f64;
                let n2 = (i / l1) as f64 - (l2 / 2) as f64;
                (2.0 * PI * n1 / l1 as f64, 2.0 * PI * (n2 + 0.5) / l2 as f64)
            })
            .collect();

        Ok(SquareLattice { l1, l2, nn_table, bonds, kpoints })
    }

    pub fn size(&self) -> (usize, usize) {
        (self.l1, self.l2)
    }

    #[inline(always)]
    pub fn coordinates(&self, site: usize) -> (usize, usize) {
        (site % self.l1, site / self.l1)
    }

    #[inline(always)]
    pub fn neighbour(&self, site: usize, direction: Direction) -> usize {
        self.nn_table[site][direction as usize]
    }

    pub fn neighbours(&self, site: usize) -> &[usize; 4] {
        &self.nn_table[site]
    }

    pub fn kpoints(&self) -> &[(f64, f64)] {
        &self.kpoints
    }
}

impl Lattice for SquareLattice {
    fn num_sites(&self) -> usize {
        self.l1 * self.l2
    }

    fn bonds(&self) -> &[Bond] {
        &self.bonds
    }
}
