use bitflags::bitflags;

bitflags! {
    /// Per-shader property flags, mirroring `ShaderInfo`'s flag bitset.
    #[derive(Default)]
    pub struct ShaderFlags: u16 {
        const USE_MIS = 0b0000_0000_0001;
        const HAS_SURFACE_TRANSPARENT = 0b0000_0000_0010;
        const HAS_SURFACE_EMISSION = 0b0000_0000_0100;
        const HAS_SURFACE_BSSRDF = 0b0000_0000_1000;
        const HAS_VOLUME = 0b0000_0001_0000;
        const HAS_DISPLACEMENT = 0b0000_0010_0000;
        const HAS_BUMP = 0b0000_0100_0000;
        const HETEROGENEOUS_VOLUME = 0b0000_1000_0000;
        const HAS_CONSTANT_EMISSION = 0b0001_0000_0000;
    }
}
