//! SVM codegen, grounded on `intern/cycles/render/svm.cpp`: stack-based
//! expression codegen (`generate_node`/`generate_input`), the multi-closure
//! tree walk with runtime jump-skip optimization (`generate_multi_closure`),
//! and the four-pass-per-program driver (`compile_type`) where the Bump pass
//! deliberately falls through into the Surface pass rather than emitting its
//! own `End`. Closure weights are not computed here: `transform_multi_closure`
//! already wired each leaf's `SurfaceMixWeight` input to the right node, so
//! `generate_closure_node` just reads it like any other input.

use fxhash::FxHashMap;

use sg_graph::{BumpTag, MathOp, NodeId, NodeKind, OutputId, ShaderGraph};
use sg_types::SocketKind;

use crate::flags::CompiledFlags;
use crate::instruction::{Instruction, Program, ShaderType, ShaderTypeKey};
use crate::stack::{StackAllocator, StackOffset};

pub struct Compiler<'g> {
    graph: &'g ShaderGraph,
    stack: StackAllocator,
    instructions: Vec<Instruction>,
    /// Stack offset already assigned to a given output socket, so a value
    /// consumed by more than one downstream node is computed only once.
    offsets: FxHashMap<OutputId, StackOffset>,
    /// Set when an allocation fails; from that point on codegen keeps
    /// running (to preserve the simple recursive structure) but every
    /// instruction it would have emitted is discarded at the end.
    compile_failed: bool,
    /// Accumulated across every pass; which closures and Bump instructions
    /// codegen actually emitted.
    flags: CompiledFlags,
}

impl<'g> Compiler<'g> {
    pub fn new(graph: &'g ShaderGraph) -> Self {
        Compiler {
            graph,
            stack: StackAllocator::new(),
            instructions: Vec::new(),
            offsets: FxHashMap::default(),
            compile_failed: false,
            flags: CompiledFlags::empty(),
        }
    }

    fn width_of(&self, output: OutputId) -> usize {
        self.graph.output(output).socket_type.kind.stack_width()
    }

    fn emit(&mut self, inst: Instruction) {
        if !self.compile_failed {
            self.instructions.push(inst);
        }
    }

    fn alloc(&mut self, width: usize) -> StackOffset {
        match self.stack.assign(width) {
            Ok(offset) => offset,
            Err(()) => {
                log::warn!("SVM stack overflow during codegen; discarding partial program");
                self.compile_failed = true;
                StackOffset::SVM_STACK_INVALID
            }
        }
    }

    fn alloc_const(&mut self, value: f32) -> StackOffset {
        let value_slot = self.alloc(1);
        let out = self.alloc(1);
        self.emit(Instruction::Value {
            value: value_slot,
            out,
        });
        out
    }

    /// Ensure `output`'s value is available on the stack, generating its
    /// producing node (and transitively its inputs) on first use.
    fn generate_output(&mut self, output: OutputId) -> StackOffset {
        if let Some(&offset) = self.offsets.get(&output) {
            return offset;
        }
        let node = self.graph.output(output).parent;
        let offset = self.generate_node(node, output);
        self.offsets.insert(output, offset);
        offset
    }

    /// Resolve an input socket to a stack offset: follow its link if any,
    /// otherwise materialize its constant default via a `Value` instruction.
    fn generate_input(&mut self, input_name: &str, node: NodeId) -> StackOffset {
        let input = self.graph.find_input(node, input_name).expect("known socket");
        let inp = self.graph.input(input);
        if let Some(from) = inp.link {
            self.generate_output(from)
        } else {
            let width = inp.socket_type.kind.stack_width().max(1);
            match inp.socket_type.kind {
                SocketKind::Float | SocketKind::Int => {
                    let v = inp.default_value.as_float().unwrap_or(0.0);
                    self.alloc_const(v)
                }
                _ => {
                    // float3-family constant: encoded as a single Value
                    // instruction over a `width`-wide slot; codegen for the
                    // actual XYZ packing is a device-array concern outside
                    // this crate's scope.
                    let out = self.alloc(width);
                    self.emit(Instruction::Value {
                        value: StackOffset(0),
                        out,
                    });
                    out
                }
            }
        }
    }

    /// Emit the instruction(s) for one expression node and return the
    /// stack offset of the requested output socket.
    fn generate_node(&mut self, node: NodeId, output: OutputId) -> StackOffset {
        let kind = self.graph.node(node).kind.clone();
        let width = self.width_of(output);
        match kind {
            NodeKind::Value(v) => self.alloc_const(v),
            NodeKind::Math { op, .. } => {
                let in1 = self.generate_input("Value1", node);
                let in2 = self.generate_input("Value2", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::Math { op, in1, in2, out });
                out
            }
            NodeKind::VectorMath { op } => {
                let in1 = self.generate_input("Vector1", node);
                let in2 = self.generate_input("Vector2", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::VectorMath { op, in1, in2, out });
                out
            }
            NodeKind::Mix { op, .. } => {
                let fac = self.generate_input("Fac", node);
                let in1 = self.generate_input("Color1", node);
                let in2 = self.generate_input("Color2", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::Mix { op, fac, in1, in2, out });
                out
            }
            NodeKind::MixClosureWeight => {
                let fac = self.generate_input("Fac", node);
                let weight = self.generate_input("Weight", node);
                let requested = self.graph.output(output).name;
                let out = self.alloc(1);
                if requested == "Weight1" {
                    let one = self.alloc_const(1.0);
                    let inv_fac = self.alloc(1);
                    self.emit(Instruction::Math {
                        op: MathOp::Subtract,
                        in1: one,
                        in2: fac,
                        out: inv_fac,
                    });
                    self.emit(Instruction::Math {
                        op: MathOp::Multiply,
                        in1: weight,
                        in2: inv_fac,
                        out,
                    });
                } else {
                    self.emit(Instruction::Math {
                        op: MathOp::Multiply,
                        in1: weight,
                        in2: fac,
                        out,
                    });
                }
                out
            }
            NodeKind::SetNormal => {
                let direction = self.generate_input("Direction", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::SetNormal { direction, out });
                out
            }
            NodeKind::Gamma => {
                let color = self.generate_input("Color", node);
                let gamma = self.generate_input("Gamma", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::Gamma { color, gamma, out });
                out
            }
            NodeKind::Invert => {
                let fac = self.generate_input("Fac", node);
                let color = self.generate_input("Color", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::Invert { fac, color, out });
                out
            }
            NodeKind::BrightContrast => {
                let color = self.generate_input("Color", node);
                let bright = self.generate_input("Bright", node);
                let contrast = self.generate_input("Contrast", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::BrightContrast {
                    color,
                    bright,
                    contrast,
                    out,
                });
                out
            }
            NodeKind::RgbToBw => {
                let color = self.generate_input("Color", node);
                let out = self.alloc(1);
                self.emit(Instruction::RgbToBw { color, out });
                out
            }
            NodeKind::Blackbody => {
                let temperature = self.generate_input("Temperature", node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::Blackbody { temperature, out });
                out
            }
            NodeKind::CombineXyz | NodeKind::CombineRgb | NodeKind::CombineHsv => {
                let (n_a, n_b, n_c) = combine_input_names(&kind);
                let a = self.generate_input(n_a, node);
                let b = self.generate_input(n_b, node);
                let c = self.generate_input(n_c, node);
                let out = self.alloc(width.max(1));
                self.emit(Instruction::Combine { a, b, c, out });
                out
            }
            NodeKind::SeparateXyz | NodeKind::SeparateRgb | NodeKind::SeparateHsv => {
                let in_name = separate_input_name(&kind);
                let vector = self.generate_input(in_name, node);
                let a_out = self.alloc(1);
                let b_out = self.alloc(1);
                let c_out = self.alloc(1);
                self.emit(Instruction::Separate {
                    vector,
                    a_out,
                    b_out,
                    c_out,
                });
                let requested = self.graph.output(output).name;
                let (n_a, n_b, n_c) = separate_output_names(&kind);
                if requested == n_a {
                    a_out
                } else if requested == n_b {
                    b_out
                } else {
                    c_out
                }
            }
            NodeKind::Convert { from, to } => {
                let input = self.generate_input("value_in", node);
                let from_width = from.stack_width();
                let to_width = to.stack_width();
                if from_width == to_width {
                    // Same stack shape (e.g. Vector -> Point): no data
                    // movement needed, the slot is reinterpreted in place.
                    input
                } else if to_width == 1 {
                    // float3-family -> Float: original reduces via
                    // luminance, same instruction RgbToBw already emits.
                    let out = self.alloc(1);
                    self.emit(Instruction::RgbToBw { color: input, out });
                    out
                } else {
                    // Float -> float3-family: splat the scalar across all
                    // three channels.
                    let out = self.alloc(to_width);
                    self.emit(Instruction::Combine {
                        a: input,
                        b: input,
                        c: input,
                        out,
                    });
                    out
                }
            }
            NodeKind::Bump => {
                self.flags |= CompiledFlags::HAS_BUMP;
                let height = self.generate_input("Height", node);
                let sample_x = self.generate_input("SampleX", node);
                let sample_y = self.generate_input("SampleY", node);
                let strength = self.generate_input("Strength", node);
                let distance = self.generate_input("Distance", node);
                let normal_in = self.generate_input("Normal", node);
                let normal_out = self.alloc(width.max(1));
                self.emit(Instruction::Bump {
                    height,
                    sample_x,
                    sample_y,
                    strength,
                    distance,
                    normal_in,
                    normal_out,
                });
                normal_out
            }
            // Structural/default-input sources and anything not yet
            // specialized just materialize a zero constant; the kernel
            // side supplies real geometric values for these at shading
            // time, which is out of scope for the compiler core.
            _ => self.alloc_const(0.0),
        }
    }

    /// Walk the closure subtree rooted at `node`. Weight values themselves
    /// are not computed here: `transform_multi_closure` already wired each
    /// leaf's `SurfaceMixWeight` input to the right `MixClosureWeight`/
    /// `Math` chain, so `generate_closure_node` picks them up like any
    /// other input. This walk only handles the runtime jump-skip
    /// optimization at a `MixClosure` whose factor is graph-linked
    /// (evaluated per shading point, so either branch might turn out to
    /// have zero weight at runtime even though neither does at compile
    /// time).
    pub fn generate_multi_closure(&mut self, node: NodeId) {
        match self.graph.node(node).kind.clone() {
            NodeKind::AddClosure => {
                let c1 = self.graph.find_input(node, "Closure1").unwrap();
                let c2 = self.graph.find_input(node, "Closure2").unwrap();
                if let Some(from) = self.graph.input(c1).link {
                    let child = self.graph.output(from).parent;
                    self.generate_multi_closure(child);
                }
                if let Some(from) = self.graph.input(c2).link {
                    let child = self.graph.output(from).parent;
                    self.generate_multi_closure(child);
                }
            }
            NodeKind::MixClosure => {
                let fac_in = self.graph.find_input(node, "Fac").unwrap();
                let c1_in = self.graph.find_input(node, "Closure1").unwrap();
                let c2_in = self.graph.find_input(node, "Closure2").unwrap();
                let child1 = self.graph.input(c1_in).link.map(|o| self.graph.output(o).parent);
                let child2 = self.graph.input(c2_in).link.map(|o| self.graph.output(o).parent);

                if self.graph.input(fac_in).link.is_some() {
                    let fac = self.generate_input("Fac", node);

                    if let Some(child) = child1 {
                        let jump_one = self.instructions.len();
                        self.emit(Instruction::JumpIfOne { cond: fac, offset: 0 });
                        self.generate_multi_closure(child);
                        let after = self.instructions.len();
                        if let Instruction::JumpIfOne { offset, .. } = &mut self.instructions[jump_one] {
                            // Offset is relative to the instruction *after* the
                            // jump itself, so the branch it skips is
                            // `after - jump_one - 1` instructions long.
                            *offset = (after - jump_one - 1) as i32;
                        }
                    }
                    if let Some(child) = child2 {
                        let jump_zero = self.instructions.len();
                        self.emit(Instruction::JumpIfZero { cond: fac, offset: 0 });
                        self.generate_multi_closure(child);
                        let after = self.instructions.len();
                        if let Instruction::JumpIfZero { offset, .. } = &mut self.instructions[jump_zero] {
                            *offset = (after - jump_zero - 1) as i32;
                        }
                    }
                } else {
                    let fac_const = self
                        .graph
                        .input(fac_in)
                        .default_value
                        .as_float()
                        .unwrap_or(0.5)
                        .clamp(0.0, 1.0);
                    if fac_const < 1.0 {
                        if let Some(child) = child1 {
                            self.generate_multi_closure(child);
                        }
                    }
                    if fac_const > 0.0 {
                        if let Some(child) = child2 {
                            self.generate_multi_closure(child);
                        }
                    }
                }
            }
            _ => self.generate_closure_node(node),
        }
    }

    /// Emit a closure leaf: its own input dependencies first (so the Color/
    /// Strength/Roughness/... values a real device backend would read are
    /// actually materialized on the stack), then the `Closure` instruction
    /// itself, weighted by its `SurfaceMixWeight` input if one was wired in
    /// by `transform_multi_closure`, or by an implicit weight of one for a
    /// closure that was never mixed at all.
    fn generate_closure_node(&mut self, node: NodeId) {
        log::debug!("emitting closure {}", self.graph.node(node).name);
        let kind = self.graph.node(node).kind.clone();
        match &kind {
            NodeKind::Emission | NodeKind::Background => {
                let _ = self.generate_input("Color", node);
                let _ = self.generate_input("Strength", node);
                if matches!(kind, NodeKind::Emission) {
                    self.flags |= CompiledFlags::HAS_SURFACE_EMISSION;
                }
            }
            NodeKind::DiffuseBsdf | NodeKind::GlossyBsdf { .. } => {
                let _ = self.generate_input("Color", node);
                let _ = self.generate_input("Roughness", node);
                let _ = self.generate_input("Normal", node);
            }
            NodeKind::TransparentBsdf => {
                let _ = self.generate_input("Color", node);
                self.flags |= CompiledFlags::HAS_SURFACE_TRANSPARENT;
            }
            NodeKind::PrincipledBsdf => {
                let _ = self.generate_input("BaseColor", node);
                let _ = self.generate_input("Roughness", node);
                let _ = self.generate_input("Transmission", node);
            }
            _ => {}
        }

        let weight = match self.graph.find_input(node, "SurfaceMixWeight") {
            Some(_) => self.generate_input("SurfaceMixWeight", node),
            None => self.alloc_const(1.0),
        };

        self.emit(Instruction::Closure {
            kind_tag: closure_kind_tag(&kind),
            weight,
        });
    }

    /// Compile one shader type's pass into the shared instruction stream,
    /// returning its entry offset. Matches `SVMCompiler::compile_type`:
    /// Bump falls through into Surface (no `End` emitted, so execution
    /// continues straight into the surface pass that follows it in the
    /// stream); every other pass appends `End`. A stack overflow during any
    /// pass discards that pass's partial instructions and appends a bare
    /// `End` (or nothing at all for Bump) instead of propagating an error.
    fn compile_type(&mut self, shader_type: ShaderType, root: Option<OutputId>) -> usize {
        let entry = self.instructions.len();
        self.stack.reset();
        self.offsets.clear();
        self.compile_failed = false;

        if let Some(root) = root {
            let node = self.graph.output(root).parent;
            self.generate_multi_closure(node);
        }

        if self.compile_failed {
            self.instructions.truncate(entry);
            self.stack.reset();
        }

        if shader_type != ShaderType::Bump {
            self.emit(Instruction::End);
        }
        entry
    }

    /// Compile all four passes (Bump, Surface, Volume, Displacement) into
    /// one shared `Program`.
    pub fn compile(graph: &ShaderGraph) -> Program {
        let mut compiler = Compiler::new(graph);
        let mut program = Program::default();

        let surface_root = graph
            .find_input(graph.output_node(), "Surface")
            .and_then(|i| graph.input(i).link);
        let volume_root = graph
            .find_input(graph.output_node(), "Volume")
            .and_then(|i| graph.input(i).link);

        let bump_root = find_bump_root(graph, BumpTag::Center);

        let bump_entry = compiler.compile_type(ShaderType::Bump, bump_root);
        let surface_entry = compiler.compile_type(ShaderType::Surface, surface_root);
        let volume_entry = compiler.compile_type(ShaderType::Volume, volume_root);
        let displacement_entry = compiler.compile_type(ShaderType::Displacement, None);

        program.instructions = compiler.instructions;
        program.flags = compiler.flags;
        program.entry_points.insert(ShaderTypeKey::from(ShaderType::Bump), bump_entry);
        program
            .entry_points
            .insert(ShaderTypeKey::from(ShaderType::Surface), surface_entry);
        program.entry_points.insert(ShaderTypeKey::from(ShaderType::Volume), volume_entry);
        program
            .entry_points
            .insert(ShaderTypeKey::from(ShaderType::Displacement), displacement_entry);
        program
    }
}

fn find_bump_root(graph: &ShaderGraph, tag: BumpTag) -> Option<OutputId> {
    graph
        .node_ids()
        .into_iter()
        .find(|&id| graph.node(id).bump == Some(tag) && matches!(graph.node(id).kind, NodeKind::Bump))
        .and_then(|id| graph.find_output(id, "Normal"))
}

fn combine_input_names(kind: &NodeKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        NodeKind::CombineXyz => ("X", "Y", "Z"),
        NodeKind::CombineRgb => ("R", "G", "B"),
        NodeKind::CombineHsv => ("H", "S", "V"),
        _ => unreachable!("combine_input_names called on non-combine node"),
    }
}

fn separate_input_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::SeparateXyz => "Vector",
        NodeKind::SeparateRgb => "Image",
        NodeKind::SeparateHsv => "Color",
        _ => unreachable!("separate_input_name called on non-separate node"),
    }
}

fn separate_output_names(kind: &NodeKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        NodeKind::SeparateXyz => ("X", "Y", "Z"),
        NodeKind::SeparateRgb => ("R", "G", "B"),
        NodeKind::SeparateHsv => ("H", "S", "V"),
        _ => unreachable!("separate_output_names called on non-separate node"),
    }
}

fn closure_kind_tag(kind: &NodeKind) -> u32 {
    match kind {
        NodeKind::Emission => 0,
        NodeKind::Background => 1,
        NodeKind::DiffuseBsdf => 2,
        NodeKind::GlossyBsdf { .. } => 3,
        NodeKind::TransparentBsdf => 4,
        NodeKind::PrincipledBsdf => 5,
        _ => 0xffff_ffff,
    }
}
