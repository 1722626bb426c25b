//! Beckmann multiple-scattering compensation table, grounded on
//! `intern/cycles/render/tables.cpp`: a 2D table over (roughness,
//! cos_theta) whose rows are independent, so each row is filled
//! concurrently with `rayon`.

use rayon::prelude::*;

pub const BECKMANN_TABLE_SIZE: usize = 64;

/// Row-major `BECKMANN_TABLE_SIZE x BECKMANN_TABLE_SIZE` table: row index is
/// the roughness bucket, column index is the cos(theta) bucket. Each entry
/// is the importance-sampling inverse-CDF value used to compensate energy
/// loss in single-scatter Beckmann evaluation.
#[derive(Clone, Debug)]
pub struct BeckmannTable {
    pub data: Vec<f32>,
}

impl BeckmannTable {
    pub fn build() -> Self {
        let mut data = vec![0.0f32; BECKMANN_TABLE_SIZE * BECKMANN_TABLE_SIZE];
        data.par_chunks_mut(BECKMANN_TABLE_SIZE)
            .enumerate()
            .for_each(|(row, slice)| {
                fill_row(row, slice);
            });
        BeckmannTable { data }
    }

    pub fn sample(&self, roughness: f32, cos_theta: f32) -> f32 {
        let row = ((roughness.clamp(0.0, 1.0)) * (BECKMANN_TABLE_SIZE - 1) as f32).round() as usize;
        let col = ((cos_theta.clamp(0.0, 1.0)) * (BECKMANN_TABLE_SIZE - 1) as f32).round() as usize;
        self.data[row * BECKMANN_TABLE_SIZE + col]
    }
}

/// Microfacet normal distribution function for the Beckmann model at
/// normal incidence, used as the unnormalized density integrated below.
fn beckmann_d(cos_theta: f32, alpha: f32) -> f32 {
    let cos2 = cos_theta * cos_theta;
    let tan2 = (1.0 - cos2) / cos2.max(1e-8);
    let alpha2 = alpha * alpha;
    (-tan2 / alpha2).exp() / (std::f32::consts::PI * alpha2 * cos2 * cos2)
}

fn fill_row(row: usize, slice: &mut [f32]) {
    let roughness = (row as f32 + 0.5) / BECKMANN_TABLE_SIZE as f32;
    let alpha = (roughness * roughness).max(1e-4);

    let mut cumulative = 0.0f32;
    let mut densities = [0.0f32; BECKMANN_TABLE_SIZE];
    for col in 0..BECKMANN_TABLE_SIZE {
        let cos_theta = (col as f32 + 0.5) / BECKMANN_TABLE_SIZE as f32;
        densities[col] = beckmann_d(cos_theta, alpha);
        cumulative += densities[col];
    }
    if cumulative <= 0.0 {
        return;
    }
    let mut running = 0.0f32;
    for col in 0..BECKMANN_TABLE_SIZE {
        running += densities[col];
        slice[col] = (running / cumulative).min(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_are_monotonic_cdfs() {
        let table = BeckmannTable::build();
        for row in 0..BECKMANN_TABLE_SIZE {
            let mut prev = 0.0f32;
            for col in 0..BECKMANN_TABLE_SIZE {
                let v = table.data[row * BECKMANN_TABLE_SIZE + col];
                assert!(v + 1e-5 >= prev, "row {} not monotonic at col {}", row, col);
                prev = v;
            }
        }
    }
}
