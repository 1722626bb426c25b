//! Light and background preprocessing: builds the importance-sampling
//! structures a renderer needs before path tracing can begin — a
//! cumulative distribution over emissive primitives, a 2D background
//! importance map, and sun-disc detection. Grounded on `LightManager` in
//! `light.cpp`; scene-side concerns (actual mesh/BVH storage, device
//! upload) are out of scope and reached only through the
//! `EmissivePrimitive`/`BackgroundShader` trait boundaries in
//! `preprocessor`.

pub mod background;
pub mod distribution;
pub mod preprocessor;

pub use background::{BackgroundImportanceMap, SunDisc, SunSelection, select_sun};
pub use distribution::Distribution1D;
pub use preprocessor::{BackgroundShader, EmissivePrimitive, LightPreprocessor, LightingData};

#[cfg(test)]
mod tests {
    use super::*;

    struct Triangle(f32);
    impl EmissivePrimitive for Triangle {
        fn power(&self) -> f32 {
            self.0
        }
    }

    struct NoBackground;
    impl BackgroundShader for NoBackground {
        fn luminance_map(&self) -> Option<(&[f32], usize, usize)> {
            None
        }
        fn sun_candidates(&self) -> Vec<SunDisc> {
            Vec::new()
        }
    }

    #[test]
    fn preprocess_is_reachable_from_crate_root() {
        let triangles = vec![Triangle(2.0), Triangle(2.0)];
        let data = LightPreprocessor::preprocess::<Triangle, NoBackground>(&triangles, None);
        assert_eq!(data.primitive_distribution.len(), 2);
    }
}
