use crate::geometry::Lattice;

/// Total energy `-J Σ_<ij> s_i s_j` of the lattice.
///
/// Every site contributes `-J * s_i * h_i` with `h_i` its neighbor sum, which
/// counts each bond from both ends, so the sum is halved.
pub fn total_energy(lattice: &Lattice, coupling: f64) -> f64 {
    let spins = lattice.spins();
    let mut total = 0i64;
    for (idx, &s) in spins.iter().enumerate() {
        total += s as i64 * lattice.neighbor_sum_flat(idx) as i64;
    }
    -coupling * total as f64 / 2.0
}

/// Energy change from flipping the spin at `(i, j)`: `2 J s_ij h_ij`.
///
/// Self-bonds keep the same sign under a flip, so `h_ij` leaves them out. On
/// a 1x1 lattice the change is therefore always 0.
#[inline]
pub fn delta_energy(lattice: &Lattice, i: usize, j: usize, coupling: f64) -> f64 {
    2.0 * coupling * (lattice.spin(i, j) as i32 * lattice.foreign_neighbor_sum(i, j)) as f64
}

/// Total magnetization `Σ s_i`.
pub fn magnetization(lattice: &Lattice) -> i64 {
    lattice.spins().iter().map(|&s| s as i64).sum()
}
