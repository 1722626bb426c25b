//! Shader manager: owns the set of shaders in a scene, adds the implicit
//! default shader, and drives finalize+codegen across all of them.
//! Grounded on `ShaderManager`'s device-update lifecycle in
//! `intern/cycles/render/shader.cpp`.

use std::error;
use std::fmt;

use sg_graph::{optimize, NodeKind, ShaderGraph};
use sg_svm::{Compiler, Program};
use sg_types::Float3;

use crate::config::ShadingConfig;
use crate::flags::ShaderFlags;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Attempted to compile a shader that hasn't been finalized yet.
    NotFinalized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFinalized => write!(f, "shader graph must be finalized before compiling"),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

pub struct Shader {
    pub name: String,
    pub graph: ShaderGraph,
    pub flags: ShaderFlags,
    pub program: Option<Program>,
    /// The three RGB words the device-array layout stores alongside each
    /// shader's flag word whenever `HAS_CONSTANT_EMISSION` is set; zero
    /// otherwise.
    pub constant_emission: Float3,
}

impl Shader {
    pub fn new(name: impl Into<String>, graph: ShaderGraph) -> Self {
        Shader {
            name: name.into(),
            graph,
            flags: ShaderFlags::empty(),
            program: None,
            constant_emission: Float3::ZERO,
        }
    }

    /// True if the surface closure is a single `Emission` node with both
    /// `Color` and `Strength` unlinked, in which case `*emission` is the
    /// shader's constant radiance with no need to ever run its SVM program.
    pub fn is_constant_emission(&self, emission: &mut Float3) -> bool {
        let Some(surface_in) = self.graph.find_input(self.graph.output_node(), "Surface") else {
            return false;
        };
        let Some(from) = self.graph.input(surface_in).link else {
            return false;
        };
        let node = self.graph.output(from).parent;
        if !matches!(self.graph.node(node).kind, NodeKind::Emission) {
            return false;
        }
        let color_in = self.graph.find_input(node, "Color").unwrap();
        let strength_in = self.graph.find_input(node, "Strength").unwrap();
        if self.graph.input(color_in).link.is_some() || self.graph.input(strength_in).link.is_some() {
            return false;
        }
        let color = self.graph.input(color_in).default_value.as_float3().unwrap_or(Float3::ZERO);
        let strength = self.graph.input(strength_in).default_value.as_float().unwrap_or(0.0);
        *emission = color * Float3::splat(strength);
        true
    }

    fn compute_flags(&mut self) -> ShaderFlags {
        let mut flags = ShaderFlags::empty();
        if let Some(surface_in) = self.graph.find_input(self.graph.output_node(), "Surface") {
            if let Some(from) = self.graph.input(surface_in).link {
                let root = self.graph.output(from).parent;
                if contains_kind(&self.graph, root, &|k| matches!(k, NodeKind::TransparentBsdf)) {
                    flags |= ShaderFlags::HAS_SURFACE_TRANSPARENT;
                }
                if contains_kind(&self.graph, root, &|k| matches!(k, NodeKind::Emission)) {
                    flags |= ShaderFlags::HAS_SURFACE_EMISSION;
                }
            }
        }
        if self
            .graph
            .find_input(self.graph.output_node(), "Volume")
            .and_then(|i| self.graph.input(i).link)
            .is_some()
        {
            flags |= ShaderFlags::HAS_VOLUME;
        }
        if self
            .graph
            .find_input(self.graph.output_node(), "Displacement")
            .and_then(|i| self.graph.input(i).link)
            .is_some()
        {
            flags |= ShaderFlags::HAS_DISPLACEMENT;
        }
        let mut constant_emission = Float3::ZERO;
        if self.is_constant_emission(&mut constant_emission) {
            flags |= ShaderFlags::HAS_CONSTANT_EMISSION;
        }
        self.constant_emission = constant_emission;
        flags
    }

    /// Finalize the graph (if not already) and compile it to SVM.
    pub fn compile(&mut self, config: &ShadingConfig) -> Result<()> {
        if !self.graph.is_finalized() {
            optimize::finalize(&mut self.graph);
        }
        self.flags = self.compute_flags();
        if config.use_mis {
            self.flags |= ShaderFlags::USE_MIS;
        }
        if config.heterogeneous_volume {
            self.flags |= ShaderFlags::HETEROGENEOUS_VOLUME;
        }
        let program = Compiler::compile(&self.graph);
        self.flags |= program_flags(&program);
        self.program = Some(program);
        Ok(())
    }
}

fn program_flags(program: &Program) -> ShaderFlags {
    ShaderFlags::from_bits_truncate(program.flags.bits())
}

fn contains_kind(graph: &ShaderGraph, node: sg_graph::NodeId, pred: &dyn Fn(&NodeKind) -> bool) -> bool {
    if pred(&graph.node(node).kind) {
        return true;
    }
    graph.node(node).inputs.iter().any(|&input| {
        graph
            .input(input)
            .link
            .map(|from| contains_kind(graph, graph.output(from).parent, pred))
            .unwrap_or(false)
    })
}

#[derive(Default)]
pub struct ShaderManager {
    pub shaders: Vec<Shader>,
    pub config: ShadingConfig,
}

impl ShaderManager {
    pub fn new(config: ShadingConfig) -> Self {
        ShaderManager {
            shaders: Vec::new(),
            config,
        }
    }

    pub fn add(&mut self, shader: Shader) -> usize {
        let index = self.shaders.len();
        self.shaders.push(shader);
        index
    }

    /// Ensures shader index 0 always exists: a flat white diffuse surface,
    /// used whenever a mesh references no material. Mirrors
    /// `ShaderManager::add_default`.
    pub fn add_default(&mut self) -> usize {
        if !self.shaders.is_empty() {
            return 0;
        }
        let mut graph = ShaderGraph::new();
        let diffuse = graph.add(NodeKind::DiffuseBsdf);
        let surface_in = graph.find_input(graph.output_node(), "Surface").unwrap();
        graph
            .connect(graph.find_output(diffuse, "BSDF").unwrap(), surface_in)
            .unwrap();
        self.add(Shader::new("default", graph))
    }

    /// Finalize and compile every registered shader. Matches
    /// `ShaderManager::device_update`'s orchestration role without the
    /// device-memory upload step (out of scope for this crate).
    pub fn compile_all(&mut self) -> Result<()> {
        let config = self.config;
        for shader in &mut self.shaders {
            shader.compile(&config)?;
        }
        Ok(())
    }
}
