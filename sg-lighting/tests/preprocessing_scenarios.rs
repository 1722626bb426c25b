use sg_lighting::{BackgroundShader, EmissivePrimitive, LightPreprocessor, SunDisc};

struct Lamp {
    power: f32,
}

impl EmissivePrimitive for Lamp {
    fn power(&self) -> f32 {
        self.power
    }
}

struct OvercastSky {
    map: Vec<f32>,
    width: usize,
    height: usize,
}

impl BackgroundShader for OvercastSky {
    fn luminance_map(&self) -> Option<(&[f32], usize, usize)> {
        Some((&self.map, self.width, self.height))
    }
    fn sun_candidates(&self) -> Vec<SunDisc> {
        Vec::new()
    }
}

struct ClearSkyWithSun {
    map: Vec<f32>,
    width: usize,
    height: usize,
    sun: SunDisc,
}

impl BackgroundShader for ClearSkyWithSun {
    fn luminance_map(&self) -> Option<(&[f32], usize, usize)> {
        Some((&self.map, self.width, self.height))
    }
    fn sun_candidates(&self) -> Vec<SunDisc> {
        vec![self.sun]
    }
}

struct ConflictingSkyWithTwoSuns {
    suns: [SunDisc; 2],
}

impl BackgroundShader for ConflictingSkyWithTwoSuns {
    fn luminance_map(&self) -> Option<(&[f32], usize, usize)> {
        None
    }
    fn sun_candidates(&self) -> Vec<SunDisc> {
        self.suns.to_vec()
    }
}

#[test]
fn scene_with_no_lights_at_all_has_no_sampling_structures() {
    let data = LightPreprocessor::preprocess::<Lamp, OvercastSky>(&[], None);
    assert!(data.primitive_distribution.is_empty());
    assert!(data.background_map.is_none());
    assert!(data.sun.is_none());
    assert!(data.use_background_map_sampling);
}

#[test]
fn many_lamps_of_varying_power_are_all_reachable() {
    let lamps: Vec<Lamp> = (1..=5).map(|i| Lamp { power: i as f32 }).collect();
    let data = LightPreprocessor::preprocess::<Lamp, OvercastSky>(&lamps, None);
    assert_eq!(data.primitive_distribution.len(), 5);
    // Every lamp has strictly positive probability mass.
    for i in 0..5 {
        assert!(data.primitive_distribution.pdf(i) > 0.0);
    }
    // Brighter lamps get more mass than dimmer ones.
    assert!(data.primitive_distribution.pdf(4) > data.primitive_distribution.pdf(0));
}

#[test]
fn overcast_sky_builds_a_background_map_with_no_sun() {
    let sky = OvercastSky {
        map: vec![2.0; 16 * 8],
        width: 16,
        height: 8,
    };
    let data = LightPreprocessor::preprocess::<Lamp, _>(&[], Some(&sky));
    let map = data.background_map.expect("background map should be built");
    assert_eq!(map.width, 16);
    assert_eq!(map.height, 8);
    assert!(data.sun.is_none());
    assert!(data.use_background_map_sampling);
}

#[test]
fn clear_sky_keeps_the_sun_disc_alongside_the_map() {
    let sky = ClearSkyWithSun {
        map: vec![0.1; 16 * 8],
        width: 16,
        height: 8,
        sun: SunDisc {
            direction: [0.3, 0.9, 0.1],
            angular_diameter: 0.00918,
            strength: 1000.0,
        },
    };
    let data = LightPreprocessor::preprocess::<Lamp, _>(&[], Some(&sky));
    assert!(data.background_map.is_some());
    assert_eq!(data.sun, Some(sky.sun));
    assert!(!data.use_background_map_sampling);
}

#[test]
fn two_conflicting_suns_fall_back_to_map_sampling_with_no_chosen_sun() {
    let sky = ConflictingSkyWithTwoSuns {
        suns: [
            SunDisc {
                direction: [1.0, 0.0, 0.0],
                angular_diameter: 0.01,
                strength: 500.0,
            },
            SunDisc {
                direction: [-1.0, 0.0, 0.0],
                angular_diameter: 0.01,
                strength: 500.0,
            },
        ],
    };
    let data = LightPreprocessor::preprocess::<Lamp, _>(&[], Some(&sky));
    assert!(data.sun.is_none());
    assert!(data.use_background_map_sampling);
}

#[test]
fn lamps_and_background_are_independent_structures() {
    let lamps = vec![Lamp { power: 10.0 }];
    let sky = OvercastSky {
        map: vec![1.0; 4 * 2],
        width: 4,
        height: 2,
    };
    let data = LightPreprocessor::preprocess(&lamps, Some(&sky));
    assert_eq!(data.primitive_distribution.len(), 1);
    assert!(data.background_map.is_some());
}
