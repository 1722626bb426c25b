//! Shader lifecycle management: configuration, per-shader flags, the
//! Beckmann multiscatter compensation table, and the manager that drives
//! finalize + SVM codegen across every shader in a scene.

pub mod beckmann;
pub mod config;
pub mod flags;
pub mod manager;

pub use beckmann::{BeckmannTable, BECKMANN_TABLE_SIZE};
pub use config::{DisplacementMethod, ShadingConfig, VolumeInterpolationMethod, VolumeSamplingMethod};
pub use flags::ShaderFlags;
pub use manager::{Error, Result, Shader, ShaderManager};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shader_is_a_diffuse_surface() {
        let mut manager = ShaderManager::new(ShadingConfig::default());
        let idx = manager.add_default();
        assert_eq!(idx, 0);
        manager.compile_all().unwrap();
        assert!(manager.shaders[0].program.is_some());
    }
}
