use bitflags::bitflags;

bitflags! {
    /// Closure-derived shader flags codegen can determine on its own by
    /// inspecting which closure/Bump instructions it actually emitted.
    /// Bit positions match `sg_shading::ShaderFlags` so the caller can OR
    /// this straight in via `bits()`; `sg-svm` can't depend on `sg-shading`
    /// (codegen sits below it in the crate graph), so the bits are the
    /// only thing that needs to stay in sync.
    #[derive(Default)]
    pub struct CompiledFlags: u16 {
        const HAS_SURFACE_TRANSPARENT = 0b0000_0000_0010;
        const HAS_SURFACE_EMISSION = 0b0000_0000_0100;
        const HAS_SURFACE_BSSRDF = 0b0000_0000_1000;
        const HAS_BUMP = 0b0000_0100_0000;
    }
}
