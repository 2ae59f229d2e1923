use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Square `L×L` Ising lattice with periodic boundaries.
///
/// Spins are stored in row-major order as `i8` values that are always `+1` or
/// `-1`. The periodic neighbor table is built once at construction, so
/// neighbor lookups never recompute the wraparound.
#[derive(Debug, Clone)]
pub struct Lattice {
    /// Side length `L`.
    pub size: usize,
    /// Total number of sites (`L²`).
    pub n_spins: usize,
    spins: Vec<i8>,
    /// Layout: `neighbors[(site * 2 + dim) * 2 + dir]`, `dim = 0` rows,
    /// `dim = 1` columns, `dir = 0` forward (+1) and `dir = 1` backward (−1).
    neighbors: Vec<u32>,
}

impl Lattice {
    /// Lattice with every site drawn independently and uniformly from `{+1, -1}`.
    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Result<Self, SimError> {
        let mut lattice = Self::uniform(size, 1)?;
        for s in lattice.spins.iter_mut() {
            *s = if rng.gen::<bool>() { 1 } else { -1 };
        }
        Ok(lattice)
    }

    /// Lattice with every site set to `spin`, which must be `+1` or `-1`.
    pub fn uniform(size: usize, spin: i8) -> Result<Self, SimError> {
        if size < 1 {
            return Err(SimError::InvalidConfiguration(format!(
                "lattice_size must be >= 1, got {size}"
            )));
        }
        if spin != 1 && spin != -1 {
            return Err(SimError::InvalidConfiguration(format!(
                "spin must be +1 or -1, got {spin}"
            )));
        }
        let n_spins = size * size;
        Ok(Self {
            size,
            n_spins,
            spins: vec![spin; n_spins],
            neighbors: build_neighbors(size),
        })
    }

    #[inline]
    fn flat(&self, i: usize, j: usize) -> usize {
        assert!(
            i < self.size && j < self.size,
            "site ({i}, {j}) outside {0}x{0} lattice",
            self.size
        );
        i * self.size + j
    }

    /// Return the neighbor of site `flat_idx` along `dim`.
    /// `forward = true` means `+1`, `forward = false` means `-1`, both mod `L`.
    #[inline]
    pub fn neighbor(&self, flat_idx: usize, dim: usize, forward: bool) -> usize {
        self.neighbors[(flat_idx * 2 + dim) * 2 + (!forward as usize)] as usize
    }

    #[inline]
    pub fn spin(&self, i: usize, j: usize) -> i8 {
        self.spins[self.flat(i, j)]
    }

    /// Sum of the four spins at `(i±1 mod L, j)` and `(i, j±1 mod L)`.
    #[inline]
    pub fn neighbor_sum(&self, i: usize, j: usize) -> i32 {
        self.neighbor_sum_flat(self.flat(i, j))
    }

    #[inline]
    pub(crate) fn neighbor_sum_flat(&self, idx: usize) -> i32 {
        let mut h = 0i32;
        for dim in 0..2 {
            h += self.spins[self.neighbor(idx, dim, true)] as i32;
            h += self.spins[self.neighbor(idx, dim, false)] as i32;
        }
        h
    }

    /// Neighbor sum over bonds to other sites only.
    ///
    /// Differs from [`neighbor_sum`](Self::neighbor_sum) only for `L = 1`, where
    /// all four neighbors are the site itself and the sum is 0.
    #[inline]
    pub fn foreign_neighbor_sum(&self, i: usize, j: usize) -> i32 {
        let idx = self.flat(i, j);
        let mut h = 0i32;
        for dim in 0..2 {
            for forward in [true, false] {
                let n = self.neighbor(idx, dim, forward);
                if n != idx {
                    h += self.spins[n] as i32;
                }
            }
        }
        h
    }

    /// Negate the spin at `(i, j)`.
    #[inline]
    pub fn flip(&mut self, i: usize, j: usize) {
        let idx = self.flat(i, j);
        self.spins[idx] = -self.spins[idx];
    }

    /// Row-major view of all spins.
    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Copy the current configuration.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            size: self.size,
            spins: self.spins.clone(),
        }
    }
}

fn build_neighbors(size: usize) -> Vec<u32> {
    let n_spins = size * size;
    let mut neighbors = vec![0u32; n_spins * 4];
    let l = size as isize;

    for i in 0..size {
        for j in 0..size {
            let site = i * size + j;
            for (dir, sign) in [(0, 1isize), (1, -1isize)] {
                let row = (i as isize + sign).rem_euclid(l) as usize;
                let col = (j as isize + sign).rem_euclid(l) as usize;
                neighbors[(site * 2) * 2 + dir] = (row * size + j) as u32;
                neighbors[(site * 2 + 1) * 2 + dir] = (i * size + col) as u32;
            }
        }
    }
    neighbors
}

/// Frozen copy of a lattice configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub size: usize,
    /// Row-major spins, each `+1` or `-1`.
    pub spins: Vec<i8>,
}

impl Snapshot {
    pub fn get(&self, i: usize, j: usize) -> i8 {
        self.spins[i * self.size + j]
    }

    /// Spins grouped by row.
    pub fn rows(&self) -> impl Iterator<Item = &[i8]> {
        self.spins.chunks(self.size)
    }

    /// Magnetization per spin of this configuration.
    pub fn magnetization_per_spin(&self) -> f64 {
        let m: i64 = self.spins.iter().map(|&s| s as i64).sum();
        m as f64 / self.spins.len() as f64
    }
}

/// `#` for up spins, `.` for down spins, one line per row.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for &s in row {
                f.write_str(if s > 0 { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
