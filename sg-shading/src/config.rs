/// Scene-level shading knobs. Populated programmatically by the host; there
/// is no file-based configuration surface for this compiler core, so this
/// is a plain struct rather than something deserialized via `config`/`toml`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadingConfig {
    pub displacement_method: DisplacementMethod,
    pub use_mis: bool,
    pub volume_sampling_method: VolumeSamplingMethod,
    pub volume_interpolation_method: VolumeInterpolationMethod,
    pub heterogeneous_volume: bool,
    pub filter_glossy: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplacementMethod {
    Bump,
    True,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeSamplingMethod {
    Distance,
    Equiangular,
    MultipleImportance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeInterpolationMethod {
    Linear,
    Cubic,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        ShadingConfig {
            displacement_method: DisplacementMethod::Bump,
            use_mis: true,
            volume_sampling_method: VolumeSamplingMethod::MultipleImportance,
            volume_interpolation_method: VolumeInterpolationMethod::Linear,
            heterogeneous_volume: true,
            filter_glossy: 0.0,
        }
    }
}
