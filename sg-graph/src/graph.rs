use fxhash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use sg_types::{SocketFlags, SocketKind, SocketType, Value};

use crate::error::{Error, Result};
use crate::ids::{InputId, NodeId, OutputId};
use crate::nodes::{BumpTag, NodeKind};

/// One input socket. `link` points at the output driving it, if connected;
/// otherwise the node falls back to `default_value`.
#[derive(Clone, Debug)]
pub struct ShaderInput {
    pub parent: NodeId,
    pub name: &'static str,
    pub socket_type: SocketType,
    pub link: Option<OutputId>,
    pub default_value: Value,
}

impl ShaderInput {
    pub fn type_(&self) -> SocketType {
        self.socket_type
    }
}

/// One output socket. `links` lists every input it currently drives (an
/// output can fan out to many inputs, unlike an input which takes a single
/// link).
#[derive(Clone, Debug)]
pub struct ShaderOutput {
    pub parent: NodeId,
    pub name: &'static str,
    pub socket_type: SocketType,
    pub links: SmallVec<[InputId; 4]>,
}

/// A node in the shader graph: its kind (which determines socket shape and
/// fold/codegen behavior) plus its concrete input/output socket handles.
#[derive(Clone, Debug)]
pub struct ShaderNode {
    pub name: String,
    pub kind: NodeKind,
    pub inputs: SmallVec<[InputId; 4]>,
    pub outputs: SmallVec<[OutputId; 2]>,
    /// Set by the bump/displacement transform on cloned subgraph copies.
    pub bump: Option<BumpTag>,
}

/// Flat-arena shader graph IR: one `SlotMap` each for nodes, inputs, and
/// outputs, matching the "flat arena" storage note in the design notes —
/// `SlotMap` rather than `typed_arena::Arena` since nodes are removed
/// throughout the optimizer pipeline (proxy removal, dead code elimination,
/// cycle breaking), which a pure arena cannot support.
pub struct ShaderGraph {
    pub(crate) nodes: SlotMap<NodeId, ShaderNode>,
    pub(crate) inputs: SlotMap<InputId, ShaderInput>,
    pub(crate) outputs: SlotMap<OutputId, ShaderOutput>,
    pub(crate) output_node: NodeId,
    pub(crate) finalized: bool,
}

impl ShaderGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut inputs = SlotMap::with_key();
        let mut outputs = SlotMap::with_key();
        let output_node = Self::build_node(&mut nodes, &mut inputs, &mut outputs, NodeKind::Output, "Output".into());
        ShaderGraph {
            nodes,
            inputs,
            outputs,
            output_node,
            finalized: false,
        }
    }

    pub fn output_node(&self) -> NodeId {
        self.output_node
    }

    pub fn node(&self, id: NodeId) -> &ShaderNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ShaderNode {
        &mut self.nodes[id]
    }

    pub fn input(&self, id: InputId) -> &ShaderInput {
        &self.inputs[id]
    }

    pub fn output(&self, id: OutputId) -> &ShaderOutput {
        &self.outputs[id]
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().collect()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn build_node(
        nodes: &mut SlotMap<NodeId, ShaderNode>,
        inputs: &mut SlotMap<InputId, ShaderInput>,
        outputs: &mut SlotMap<OutputId, ShaderOutput>,
        kind: NodeKind,
        name: String,
    ) -> NodeId {
        let (in_specs, out_specs) = kind.sockets();
        nodes.insert_with_key(|node_id| {
            let mut in_ids = SmallVec::new();
            for (sock_name, ty) in &in_specs {
                let default_value = default_value_for(*ty);
                in_ids.push(inputs.insert(ShaderInput {
                    parent: node_id,
                    name: sock_name,
                    socket_type: *ty,
                    link: None,
                    default_value,
                }));
            }
            let mut out_ids = SmallVec::new();
            for (sock_name, ty) in &out_specs {
                out_ids.push(outputs.insert(ShaderOutput {
                    parent: node_id,
                    name: sock_name,
                    socket_type: *ty,
                    links: SmallVec::new(),
                }));
            }
            ShaderNode {
                name,
                kind,
                inputs: in_ids,
                outputs: out_ids,
                bump: None,
            }
        })
    }

    /// Add a node to the graph. Per `ShaderGraph::add`, the node is assigned
    /// a unique display name derived from its type the first time it's
    /// added under a bare type name.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let name = self.unique_name(kind.type_name());
        Self::build_node(&mut self.nodes, &mut self.inputs, &mut self.outputs, kind, name)
    }

    fn unique_name(&self, base: &str) -> String {
        let mut n = 0usize;
        loop {
            let candidate = if n == 0 {
                base.to_string()
            } else {
                format!("{}.{:03}", base, n)
            };
            if !self.nodes.values().any(|node| node.name == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn find_input(&self, node: NodeId, name: &str) -> Option<InputId> {
        self.nodes[node]
            .inputs
            .iter()
            .copied()
            .find(|&i| self.inputs[i].name == name)
    }

    pub fn find_output(&self, node: NodeId, name: &str) -> Option<OutputId> {
        self.nodes[node]
            .outputs
            .iter()
            .copied()
            .find(|&o| self.outputs[o].name == name)
    }

    /// Connect `from` (an output) to `to` (an input). Refuses (hard error,
    /// per the error handling design's two non-fail-soft cases) only if `to`
    /// is already linked or the graph is finalized; a `SocketKind` mismatch
    /// is not an error here, it's resolved by transparently splicing in an
    /// autoconvert node (`Convert` for two non-closure kinds, an `Emission`
    /// bridge for a non-closure output feeding a closure input), mirroring
    /// `ShaderGraph::connect`'s own `ConvertNode`/closure-bridge insertion.
    pub fn connect(&mut self, from: OutputId, to: InputId) -> Result<()> {
        if self.finalized {
            return Err(Error::AlreadyFinalized);
        }
        if let Some(existing) = self.inputs[to].link {
            return Err(Error::AlreadyConnected {
                from: self.outputs[existing].name.to_string(),
                to: self.inputs[to].name.to_string(),
            });
        }
        let from_kind = self.outputs[from].socket_type.kind;
        let to_kind = self.inputs[to].socket_type.kind;
        let source = if from_kind == to_kind {
            from
        } else {
            self.insert_autoconvert(from, to_kind)?
        };
        self.inputs[to].link = Some(source);
        self.outputs[source].links.push(to);
        Ok(())
    }

    /// Splice an autoconvert node between `from` and whatever eventually
    /// consumes it, returning the output that now matches `to_kind`. Invoked
    /// only on a `SocketKind` mismatch, so the fast path in `connect` never
    /// pays for this.
    fn insert_autoconvert(&mut self, from: OutputId, to_kind: SocketKind) -> Result<OutputId> {
        let from_kind = self.outputs[from].socket_type.kind;
        if to_kind == SocketKind::Closure {
            // Non-closure feeding a closure socket: bridge through an
            // Emission node, same as `ShaderGraph::connect` does for a
            // color/value driving a surface/volume slot directly.
            let emission = self.add(NodeKind::Emission);
            let color_in = self.find_input(emission, "Color").unwrap();
            let strength_in = self.find_input(emission, "Strength").unwrap();
            self.inputs[strength_in].default_value = Value::Float(1.0);
            self.connect(from, color_in)?;
            log::debug!("inserted Emission bridge for closure-typed input");
            return Ok(self.find_output(emission, "Emission").unwrap());
        }
        if from_kind == SocketKind::Closure {
            return Err(Error::Types(sg_types::Error::TypeMismatch {
                socket: self.outputs[from].name.to_string(),
                expected: to_kind,
                found: from_kind,
            }));
        }
        let convert = self.add(NodeKind::Convert {
            from: from_kind,
            to: to_kind,
        });
        let value_in = self.find_input(convert, "value_in").unwrap();
        self.connect(from, value_in)?;
        log::debug!("inserted Convert({:?} -> {:?}) autoconvert node", from_kind, to_kind);
        Ok(self.find_output(convert, "value_out").unwrap())
    }

    /// Disconnect every link out of `output`, leaving its driven inputs on
    /// their constant defaults.
    pub fn disconnect_output(&mut self, output: OutputId) {
        let links = std::mem::take(&mut self.outputs[output].links);
        for input in links {
            self.inputs[input].link = None;
        }
    }

    /// Disconnect a single input's incoming link, if any.
    pub fn disconnect_input(&mut self, input: InputId) {
        if let Some(from) = self.inputs[input].link.take() {
            self.outputs[from].links.retain(|&i| i != input);
        }
    }

    /// Disconnect `to` and connect it to `from` instead. Used heavily by the
    /// constant folder's `bypass()` to splice a node out of the graph.
    pub fn relink_input(&mut self, to: InputId, from: OutputId) -> Result<()> {
        self.disconnect_input(to);
        self.connect(from, to)
    }

    /// Move every outgoing link of `old_input`'s node (as if it were an
    /// output, i.e. closures feeding through a proxy) is not applicable here
    /// since inputs have at most one link; this `relink` overload handles
    /// the node-granular case: redirect every input across the graph that
    /// currently links to `old_output` so it links to `new_output` instead.
    pub fn relink_output(&mut self, old_output: OutputId, new_output: OutputId) {
        let links = std::mem::replace(&mut self.outputs[old_output].links, SmallVec::new());
        for input in &links {
            self.inputs[*input].link = Some(new_output);
        }
        self.outputs[new_output].links.extend(links);
    }

    /// Transitive closure of nodes feeding `start` (inclusive), computed by
    /// DFS over input links. Used by the bump/displacement transform to
    /// find the subgraph to clone.
    pub fn find_dependencies(&self, start: NodeId) -> Vec<NodeId> {
        let mut visited = FxHashMap::default();
        let mut order = Vec::new();
        self.find_dependencies_rec(start, &mut visited, &mut order);
        order
    }

    fn find_dependencies_rec(&self, node: NodeId, visited: &mut FxHashMap<NodeId, bool>, order: &mut Vec<NodeId>) {
        if visited.contains_key(&node) {
            return;
        }
        visited.insert(node, true);
        for &input in &self.nodes[node].inputs {
            if let Some(from) = self.inputs[input].link {
                self.find_dependencies_rec(self.outputs[from].parent, visited, order);
            }
        }
        order.push(node);
    }

    /// Deep-clone the given set of nodes (a dependency closure obtained from
    /// `find_dependencies`) and relink the clones' internal connections to
    /// each other, returning the map from original to clone. External
    /// (outside the set) links into the cloned subgraph are preserved by
    /// pointing the clone at the same outputs as the original.
    pub fn copy_nodes(&mut self, nodes: &[NodeId], tag: BumpTag) -> FxHashMap<NodeId, NodeId> {
        let mut clone_of = FxHashMap::default();
        for &orig in nodes {
            let kind = self.nodes[orig].kind.clone();
            let new_id = self.add(kind);
            self.nodes[new_id].bump = Some(tag);
            clone_of.insert(orig, new_id);
        }
        for &orig in nodes {
            let new_id = clone_of[&orig];
            let orig_inputs = self.nodes[orig].inputs.clone();
            let new_inputs = self.nodes[new_id].inputs.clone();
            for (orig_in, new_in) in orig_inputs.iter().zip(new_inputs.iter()) {
                if let Some(from) = self.inputs[*orig_in].link {
                    let from_node = self.outputs[from].parent;
                    let from_idx = self.nodes[from_node]
                        .outputs
                        .iter()
                        .position(|&o| o == from)
                        .unwrap();
                    let new_from = if let Some(&new_from_node) = clone_of.get(&from_node) {
                        self.nodes[new_from_node].outputs[from_idx]
                    } else {
                        from
                    };
                    let _ = self.connect(new_from, *new_in);
                } else {
                    self.inputs[*new_in].default_value = self.inputs[*orig_in].default_value.clone();
                }
            }
        }
        clone_of
    }

    /// Remove a node and every link touching it.
    pub fn remove_node(&mut self, id: NodeId) {
        let node = self.nodes.remove(id).expect("node already removed");
        for input in node.inputs {
            if let Some(from) = self.inputs[input].link {
                if let Some(out) = self.outputs.get_mut(from) {
                    out.links.retain(|&i| i != input);
                }
            }
            self.inputs.remove(input);
        }
        for output in node.outputs {
            let links = self.outputs.remove(output).map(|o| o.links).unwrap_or_default();
            for input in links {
                if let Some(inp) = self.inputs.get_mut(input) {
                    inp.link = None;
                }
            }
        }
    }

    /// Removes `Proxy`/autoconvert nodes inserted during authoring, splicing
    /// their single input directly to whatever they fed. Step 1 of
    /// `ShaderGraph::finalize` in the original.
    pub fn remove_proxy_nodes(&mut self) {
        let proxies: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Proxy))
            .map(|(id, _)| id)
            .collect();
        for proxy in proxies {
            let in_id = self.nodes[proxy].inputs[0];
            let out_id = self.nodes[proxy].outputs[0];
            if let Some(from) = self.inputs[in_id].link {
                self.relink_output(out_id, from);
            }
            log::debug!("removed proxy node {}", self.nodes[proxy].name);
            self.remove_node(proxy);
        }
    }

    /// Per-node expansion: nodes like `PrincipledBsdf` expand into a small
    /// subgraph of simpler closures. A no-op for nodes with no expansion.
    pub fn expand(&mut self) {
        let candidates: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::PrincipledBsdf))
            .map(|(id, _)| id)
            .collect();
        for node in candidates {
            self.expand_principled(node);
        }
    }

    fn expand_principled(&mut self, node: NodeId) {
        // PrincipledBsdf -> MixClosure(Transmission, TransparentBsdf, DiffuseBsdf)
        // mirrors `PrincipledBsdfNode::expand` folding transmission into a
        // transparency mix rather than modeling full multiscatter GGX.
        let base_color_in = self.find_input(node, "BaseColor").unwrap();
        let roughness_in = self.find_input(node, "Roughness").unwrap();
        let transmission_in = self.find_input(node, "Transmission").unwrap();
        let bsdf_out = self.find_output(node, "BSDF").unwrap();

        let diffuse = self.add(NodeKind::DiffuseBsdf);
        let transparent = self.add(NodeKind::TransparentBsdf);
        let mix = self.add(NodeKind::MixClosure);

        let diffuse_color_in = self.find_input(diffuse, "Color").unwrap();
        let diffuse_rough_in = self.find_input(diffuse, "Roughness").unwrap();
        if let Some(from) = self.inputs[base_color_in].link {
            let _ = self.connect(from, diffuse_color_in);
        } else {
            self.inputs[diffuse_color_in].default_value = self.inputs[base_color_in].default_value.clone();
        }
        if let Some(from) = self.inputs[roughness_in].link {
            let _ = self.connect(from, diffuse_rough_in);
        } else {
            self.inputs[diffuse_rough_in].default_value = self.inputs[roughness_in].default_value.clone();
        }

        let mix_fac_in = self.find_input(mix, "Fac").unwrap();
        let mix_c1_in = self.find_input(mix, "Closure1").unwrap();
        let mix_c2_in = self.find_input(mix, "Closure2").unwrap();
        if let Some(from) = self.inputs[transmission_in].link {
            let _ = self.connect(from, mix_fac_in);
        } else {
            self.inputs[mix_fac_in].default_value = self.inputs[transmission_in].default_value.clone();
        }
        let diffuse_out = self.find_output(diffuse, "BSDF").unwrap();
        let transparent_out = self.find_output(transparent, "BSDF").unwrap();
        let _ = self.connect(diffuse_out, mix_c1_in);
        let _ = self.connect(transparent_out, mix_c2_in);

        let mix_out = self.find_output(mix, "Closure").unwrap();
        self.relink_output(bsdf_out, mix_out);
        self.remove_node(node);
    }

    /// Fill in default-input autoconvert links: any unlinked socket flagged
    /// with one of the seven `LINK_*` hints gets wired to the corresponding
    /// `TextureCoordinateNode`/`GeometryNode` output, creating that node on
    /// first use. Mirrors `ShaderGraph::default_inputs`'s if/else-if chain
    /// exactly, including that the flags are checked independently of each
    /// other rather than as a single chained else-if.
    pub fn default_inputs(&mut self) {
        let mut texco: Option<NodeId> = None;
        let mut geom: Option<NodeId> = None;

        let unlinked: Vec<InputId> = self
            .inputs
            .iter()
            .filter(|(_, input)| input.link.is_none())
            .map(|(id, _)| id)
            .collect();
        for input in unlinked {
            let flags = self.inputs[input].socket_type.flags;
            let mut texco_out = None;
            if flags.contains(SocketFlags::LINK_TEXTURE_GENERATED) {
                texco_out = Some("Generated");
            } else if flags.contains(SocketFlags::LINK_TEXTURE_UV) {
                texco_out = Some("UV");
            }
            if let Some(name) = texco_out {
                if self.inputs[input].link.is_none() {
                    if texco.is_none() {
                        texco = Some(self.add(NodeKind::TextureCoordinate));
                    }
                    let out = self.find_output(texco.unwrap(), name).unwrap();
                    let _ = self.connect(out, input);
                }
            }

            let mut geom_out = None;
            if flags.contains(SocketFlags::LINK_TEXTURE_NORMAL) || flags.contains(SocketFlags::LINK_NORMAL) {
                geom_out = Some("Normal");
            } else if flags.contains(SocketFlags::LINK_POSITION) {
                geom_out = Some("Position");
            } else if flags.contains(SocketFlags::LINK_INCOMING) {
                geom_out = Some("Incoming");
            } else if flags.contains(SocketFlags::LINK_TANGENT) {
                geom_out = Some("Tangent");
            }
            if let Some(name) = geom_out {
                if self.inputs[input].link.is_some() {
                    continue;
                }
                if geom.is_none() {
                    geom = Some(self.add(NodeKind::Geometry));
                }
                let out = self.find_output(geom.unwrap(), name).unwrap();
                let _ = self.connect(out, input);
            }
        }
    }

    /// Sum of closure costs reachable from the output's Surface input,
    /// matching `ShaderGraph::get_num_closures`.
    pub fn get_num_closures(&self) -> usize {
        let Some(surface_in) = self.find_input(self.output_node, "Surface") else {
            return 0;
        };
        let Some(from) = self.inputs[surface_in].link else {
            return 0;
        };
        self.sum_closure_cost(self.outputs[from].parent)
    }

    fn sum_closure_cost(&self, node: NodeId) -> usize {
        let mut total = self.nodes[node].kind.closure_cost();
        for &input in &self.nodes[node].inputs {
            if let Some(from) = self.inputs[input].link {
                total += self.sum_closure_cost(self.outputs[from].parent);
            }
        }
        total
    }
}

fn default_value_for(ty: SocketType) -> Value {
    use sg_types::SocketKind::*;
    match ty.kind {
        Float => Value::Float(0.0),
        Int => Value::Int(0),
        Color | Vector | Point | Normal => Value::Float3(sg_types::Float3::ZERO),
        String => Value::String(String::new()),
        Closure => Value::Float(0.0),
    }
}

impl Default for ShaderGraph {
    fn default() -> Self {
        ShaderGraph::new()
    }
}
