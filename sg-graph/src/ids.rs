use slotmap::new_key_type;

new_key_type! {
    /// Handle to a `ShaderNode` in a `ShaderGraph`. Stable across removal of
    /// other nodes: a generational slot rather than a raw index, since nodes
    /// are added and removed throughout the optimizer pipeline.
    pub struct NodeId;

    /// Handle to a `ShaderInput` socket.
    pub struct InputId;

    /// Handle to a `ShaderOutput` socket.
    pub struct OutputId;
}
