//! Orchestrates the two preprocessing passes, mirroring
//! `LightManager::device_update`'s role of calling
//! `device_update_distribution` followed by `device_update_background` in
//! sequence. The scene-side collaborators (mesh triangles, lamp objects,
//! a concrete background shader graph) are out of scope here, so both
//! passes are driven through small trait boundaries the caller implements.

use log::info;

use crate::background::{select_sun, BackgroundImportanceMap, SunDisc, SunSelection};
use crate::distribution::Distribution1D;

/// A single emissive contributor: a mesh triangle or a lamp. `power` is its
/// precomputed total radiant power, used as the unnormalized sampling
/// weight, matching how `device_update_distribution` weights each entry.
pub trait EmissivePrimitive {
    fn power(&self) -> f32;
}

/// A background shader's evaluated contribution: an equirectangular
/// luminance map plus any sun discs found while walking its graph.
pub trait BackgroundShader {
    fn luminance_map(&self) -> Option<(&[f32], usize, usize)>;
    fn sun_candidates(&self) -> Vec<SunDisc>;
}

#[derive(Clone, Debug, Default)]
pub struct LightingData {
    pub primitive_distribution: Distribution1D,
    pub background_map: Option<BackgroundImportanceMap>,
    pub sun: Option<SunDisc>,
    pub use_background_map_sampling: bool,
}

pub struct LightPreprocessor;

impl LightPreprocessor {
    /// Runs both preprocessing passes over the given emissive primitives and
    /// optional background shader, in the same order the original device
    /// update does: primitive distribution first, background second.
    pub fn preprocess<P: EmissivePrimitive, B: BackgroundShader>(
        primitives: &[P],
        background: Option<&B>,
    ) -> LightingData {
        let weights: Vec<f32> = primitives.iter().map(|p| p.power()).collect();
        let primitive_distribution = Distribution1D::build(&weights);
        info!(
            "built light distribution over {} emissive primitives (total power {})",
            primitives.len(),
            primitive_distribution.total_weight
        );

        let mut background_map = None;
        let mut sun_selection = SunSelection {
            sun: None,
            use_map_sampling: false,
        };

        if let Some(bg) = background {
            if let Some((luminance, width, height)) = bg.luminance_map() {
                background_map = Some(BackgroundImportanceMap::build(luminance, width, height));
            }
            sun_selection = select_sun(&bg.sun_candidates());
            // A sun disc still needs a fallback map behind it for rays
            // that miss the disc; only skip the map entirely if there is
            // truly nothing to sample.
            if sun_selection.sun.is_some() && background_map.is_none() {
                sun_selection.use_map_sampling = false;
            }
        }

        LightingData {
            primitive_distribution,
            background_map,
            sun: sun_selection.sun,
            use_background_map_sampling: sun_selection.use_map_sampling || sun_selection.sun.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lamp(f32);
    impl EmissivePrimitive for Lamp {
        fn power(&self) -> f32 {
            self.0
        }
    }

    struct FlatWhiteSky;
    impl BackgroundShader for FlatWhiteSky {
        fn luminance_map(&self) -> Option<(&[f32], usize, usize)> {
            None
        }
        fn sun_candidates(&self) -> Vec<SunDisc> {
            Vec::new()
        }
    }

    struct SkyWithSun {
        map: Vec<f32>,
        sun: SunDisc,
    }
    impl BackgroundShader for SkyWithSun {
        fn luminance_map(&self) -> Option<(&[f32], usize, usize)> {
            Some((&self.map, 4, 2))
        }
        fn sun_candidates(&self) -> Vec<SunDisc> {
            vec![self.sun]
        }
    }

    #[test]
    fn no_lamps_no_background_yields_empty_distribution() {
        let data = LightPreprocessor::preprocess::<Lamp, FlatWhiteSky>(&[], None);
        assert!(data.primitive_distribution.is_empty());
        assert!(data.background_map.is_none());
        assert!(data.use_background_map_sampling);
    }

    #[test]
    fn lamps_build_a_weighted_distribution() {
        let lamps = vec![Lamp(1.0), Lamp(3.0)];
        let data = LightPreprocessor::preprocess::<Lamp, FlatWhiteSky>(&lamps, None);
        assert_eq!(data.primitive_distribution.len(), 2);
        assert!(data.primitive_distribution.pdf(1) > data.primitive_distribution.pdf(0));
    }

    #[test]
    fn background_with_sun_keeps_both_map_and_disc() {
        let sky = SkyWithSun {
            map: vec![1.0; 8],
            sun: SunDisc {
                direction: [0.0, 1.0, 0.0],
                angular_diameter: 0.01,
                strength: 10.0,
            },
        };
        let data = LightPreprocessor::preprocess::<Lamp, _>(&[], Some(&sky));
        assert!(data.background_map.is_some());
        assert!(data.sun.is_some());
        assert!(!data.use_background_map_sampling);
    }
}
