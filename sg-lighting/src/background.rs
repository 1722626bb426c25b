//! Background importance map and sun-disc detection, grounded on
//! `LightManager::device_update_background`/`background_cdf` in
//! `light.cpp` (read lines ~538-727): a row-parallel conditional CDF over
//! `luminance * sin(theta)`, a marginal CDF over row totals, and
//! sun-disc detection that falls back to plain map sampling whenever zero
//! or more than one sun candidate is present.

use rayon::prelude::*;

use crate::distribution::Distribution1D;

#[derive(Clone, Debug)]
pub struct BackgroundImportanceMap {
    pub width: usize,
    pub height: usize,
    /// One `Distribution1D` per row (conditional on that row being chosen).
    pub conditional: Vec<Distribution1D>,
    /// Distribution over rows (marginal), weighted by each row's total.
    pub marginal: Distribution1D,
}

impl BackgroundImportanceMap {
    /// `luminance` is a row-major `width * height` buffer of background
    /// radiance luminance samples over equirectangular (theta, phi).
    pub fn build(luminance: &[f32], width: usize, height: usize) -> Self {
        assert_eq!(luminance.len(), width * height);

        let rows: Vec<Distribution1D> = (0..height)
            .into_par_iter()
            .map(|row| background_cdf_row(&luminance[row * width..(row + 1) * width], row, height))
            .collect();

        let row_totals: Vec<f32> = rows.iter().map(|d| d.total_weight).collect();
        let marginal = Distribution1D::build(&row_totals);

        BackgroundImportanceMap {
            width,
            height,
            conditional: rows,
            marginal,
        }
    }

    /// Importance-sample a direction as (row, col, pdf) given two uniform
    /// random numbers.
    pub fn sample(&self, u0: f32, u1: f32) -> (usize, usize, f32) {
        let (row, u1_remapped) = self.marginal.sample(u0);
        let (col, _) = self.conditional[row].sample(u1_remapped);
        let row_pdf = self.marginal.pdf(row) * self.height as f32;
        let col_pdf = self.conditional[row].pdf(col) * self.width as f32;
        (row, col, row_pdf * col_pdf)
    }
}

/// Builds one row's conditional CDF, weighting each texel by
/// `luminance * sin(theta)` so texels near the poles (which cover less
/// solid angle per texel) are sampled proportionally less often.
fn background_cdf_row(row_luminance: &[f32], row: usize, height: usize) -> Distribution1D {
    let theta = std::f32::consts::PI * (row as f32 + 0.5) / height as f32;
    let sin_theta = theta.sin().max(1e-4);
    let weights: Vec<f32> = row_luminance.iter().map(|&l| l.max(0.0) * sin_theta).collect();
    Distribution1D::build(&weights)
}

/// A candidate sun disc found while scanning a background shader graph for
/// `SkyTextureNode`s in Nishita mode with the sun disc enabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunDisc {
    pub direction: [f32; 3],
    pub angular_diameter: f32,
    pub strength: f32,
}

pub struct SunSelection {
    pub sun: Option<SunDisc>,
    /// True if importance sampling should fall back to the full background
    /// map rather than sampling the sun disc directly.
    pub use_map_sampling: bool,
}

/// Mirrors `device_update_background`'s sun handling: a single candidate is
/// used directly; zero candidates means plain map sampling; more than one
/// is the fail-soft `MultipleSuns` condition — warn and fall back to map
/// sampling rather than arbitrarily picking one.
pub fn select_sun(candidates: &[SunDisc]) -> SunSelection {
    match candidates.len() {
        0 => SunSelection {
            sun: None,
            use_map_sampling: true,
        },
        1 => SunSelection {
            sun: Some(candidates[0]),
            use_map_sampling: false,
        },
        n => {
            log::warn!(
                "{} sun discs found in background graph; falling back to map sampling",
                n
            );
            SunSelection {
                sun: None,
                use_map_sampling: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_background_has_uniform_row_totals_weighted_by_sin() {
        let width = 8;
        let height = 4;
        let luminance = vec![1.0f32; width * height];
        let map = BackgroundImportanceMap::build(&luminance, width, height);
        // Equatorial rows (sin(theta) close to 1) should carry more weight
        // than rows near the poles.
        let equator_weight = map.conditional[height / 2].total_weight;
        let pole_weight = map.conditional[0].total_weight;
        assert!(equator_weight >= pole_weight);
    }

    #[test]
    fn zero_suns_falls_back_to_map_sampling() {
        let selection = select_sun(&[]);
        assert!(selection.use_map_sampling);
        assert!(selection.sun.is_none());
    }

    #[test]
    fn single_sun_is_used_directly() {
        let sun = SunDisc {
            direction: [0.0, 0.0, 1.0],
            angular_diameter: 0.00918,
            strength: 1.0,
        };
        let selection = select_sun(&[sun]);
        assert!(!selection.use_map_sampling);
        assert_eq!(selection.sun, Some(sun));
    }

    #[test]
    fn multiple_suns_falls_back_and_warns() {
        let a = SunDisc {
            direction: [1.0, 0.0, 0.0],
            angular_diameter: 0.01,
            strength: 1.0,
        };
        let b = SunDisc {
            direction: [0.0, 1.0, 0.0],
            angular_diameter: 0.01,
            strength: 1.0,
        };
        let selection = select_sun(&[a, b]);
        assert!(selection.use_map_sampling);
        assert!(selection.sun.is_none());
    }
}
