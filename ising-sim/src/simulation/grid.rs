/// `n` linearly spaced temperatures over `[t_min, t_max]`, both ends included.
pub fn temperature_grid(t_min: f64, t_max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![t_min],
        _ => {
            let step = (t_max - t_min) / (n - 1) as f64;
            let mut temps: Vec<f64> = (0..n).map(|i| t_min + step * i as f64).collect();
            temps[n - 1] = t_max;
            temps
        }
    }
}

/// Seed of the generator owned by temperature point `index`.
#[inline]
pub fn point_seed(base_seed: u64, index: usize) -> u64 {
    base_seed.wrapping_add(index as u64)
}
