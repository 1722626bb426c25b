//! Concrete node catalog.
//!
//! Grounded on `intern/cycles/render/nodes.cpp`'s node type list, trimmed to
//! the subset that exercises every fold rule, optimizer pass, and codegen
//! path the compiler core needs (full BSDF/texture coverage is out of
//! scope).

use derivative::Derivative;

/// Fixed-size stack cost charged to any closure that carries a volume
/// component, matching the kernel's built-in volume stack size.
pub const VOLUME_STACK_SIZE: usize = 32;

use sg_types::{Float3, SocketFlags, SocketKind, SocketType, TYPE_CLOSURE, TYPE_COLOR, TYPE_FLOAT, TYPE_NORMAL, TYPE_VECTOR};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Sine,
    Cosine,
    Maximum,
    Minimum,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorMathOp {
    Add,
    Subtract,
    DotProduct,
    CrossProduct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixOp {
    Blend,
    Add,
    Subtract,
    Multiply,
    Divide,
    Light,
    Dodge,
    Burn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlossyDistribution {
    Sharp,
    Beckmann,
    Ggx,
    MultiGgx,
}

/// Which subgraph copy a node was cloned into by the bump/displacement
/// transform. Mirrors `ShaderNode::bump` in the original.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BumpTag {
    Center,
    Dx,
    Dy,
}

/// Tagged variant of every concrete node kind, carrying its per-kind
/// settings and constant payload. Kept as one flat enum-of-structs rather
/// than a trait object, since the optimizer/folder/codegen all need to
/// exhaustively match over node identity rather than dispatch through a
/// vtable.
#[derive(Derivative)]
#[derivative(Clone, Debug)]
pub enum NodeKind {
    Value(f32),
    Color(Float3),
    Math { op: MathOp, clamp: bool },
    VectorMath { op: VectorMathOp },
    Mix { op: MixOp, clamp: bool },
    Gamma,
    RgbToBw,
    BrightContrast,
    Invert,
    CombineXyz,
    SeparateXyz,
    CombineRgb,
    SeparateRgb,
    CombineHsv,
    SeparateHsv,
    Blackbody,
    Convert { from: SocketKind, to: SocketKind },
    Emission,
    Background,
    DiffuseBsdf,
    GlossyBsdf { distribution: GlossyDistribution },
    TransparentBsdf,
    PrincipledBsdf,
    AddClosure,
    MixClosure,
    MixClosureWeight,
    Bump,
    Displacement,
    VectorDisplacement,
    SetNormal,
    Geometry,
    TextureCoordinate,
    /// Sink node, always present at index 0 of a freshly constructed graph.
    Output,
    /// Inserted by the autoconvert pass, removed by `remove_proxy_nodes`.
    Proxy,
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Value(_) => "Value",
            NodeKind::Color(_) => "Color",
            NodeKind::Math { .. } => "Math",
            NodeKind::VectorMath { .. } => "VectorMath",
            NodeKind::Mix { .. } => "Mix",
            NodeKind::Gamma => "Gamma",
            NodeKind::RgbToBw => "RgbToBw",
            NodeKind::BrightContrast => "BrightContrast",
            NodeKind::Invert => "Invert",
            NodeKind::CombineXyz => "CombineXyz",
            NodeKind::SeparateXyz => "SeparateXyz",
            NodeKind::CombineRgb => "CombineRgb",
            NodeKind::SeparateRgb => "SeparateRgb",
            NodeKind::CombineHsv => "CombineHsv",
            NodeKind::SeparateHsv => "SeparateHsv",
            NodeKind::Blackbody => "Blackbody",
            NodeKind::Convert { .. } => "Convert",
            NodeKind::Emission => "Emission",
            NodeKind::Background => "Background",
            NodeKind::DiffuseBsdf => "DiffuseBsdf",
            NodeKind::GlossyBsdf { .. } => "GlossyBsdf",
            NodeKind::TransparentBsdf => "TransparentBsdf",
            NodeKind::PrincipledBsdf => "PrincipledBsdf",
            NodeKind::AddClosure => "AddClosure",
            NodeKind::MixClosure => "MixClosure",
            NodeKind::MixClosureWeight => "MixClosureWeight",
            NodeKind::Bump => "Bump",
            NodeKind::Displacement => "Displacement",
            NodeKind::VectorDisplacement => "VectorDisplacement",
            NodeKind::SetNormal => "SetNormal",
            NodeKind::Geometry => "Geometry",
            NodeKind::TextureCoordinate => "TextureCoordinate",
            NodeKind::Output => "Output",
            NodeKind::Proxy => "Proxy",
        }
    }

    /// Is this node a leaf/combiner of BSDF/BSSRDF/volume closures?
    pub fn is_closure(&self) -> bool {
        matches!(
            self,
            NodeKind::Emission
                | NodeKind::Background
                | NodeKind::DiffuseBsdf
                | NodeKind::GlossyBsdf { .. }
                | NodeKind::TransparentBsdf
                | NodeKind::PrincipledBsdf
                | NodeKind::AddClosure
                | NodeKind::MixClosure
        )
    }

    /// Per-kind closure "cost" used by `get_num_closures`, matching
    /// `ShaderNode::get_closure_type` cost accounting in `graph.cpp`.
    pub fn closure_cost(&self) -> usize {
        match self {
            NodeKind::PrincipledBsdf => 8,
            NodeKind::GlossyBsdf {
                distribution: GlossyDistribution::MultiGgx,
            } => 2,
            _ if self.is_closure() => 1,
            _ => 0,
        }
    }

    /// The input/output socket list for this node kind, used when
    /// constructing a `ShaderNode`. Structural (non-value) sockets carry
    /// `SocketFlags::SVM_INTERNAL` or texture-default flags exactly as the
    /// original's `default_inputs` pass expects to find them.
    pub fn sockets(&self) -> (Vec<(&'static str, SocketType)>, Vec<(&'static str, SocketType)>) {
        use SocketFlags as F;
        match self {
            NodeKind::Value(_) => (vec![], vec![("Value", TYPE_FLOAT)]),
            NodeKind::Color(_) => (vec![], vec![("Color", TYPE_COLOR)]),
            NodeKind::Math { .. } => (
                vec![("Value1", TYPE_FLOAT), ("Value2", TYPE_FLOAT)],
                vec![("Value", TYPE_FLOAT)],
            ),
            NodeKind::VectorMath { .. } => (
                vec![("Vector1", TYPE_VECTOR), ("Vector2", TYPE_VECTOR)],
                vec![("Vector", TYPE_VECTOR), ("Value", TYPE_FLOAT)],
            ),
            NodeKind::Mix { .. } => (
                vec![
                    ("Fac", TYPE_FLOAT),
                    ("Color1", TYPE_COLOR),
                    ("Color2", TYPE_COLOR),
                ],
                vec![("Color", TYPE_COLOR)],
            ),
            NodeKind::Gamma => (
                vec![("Color", TYPE_COLOR), ("Gamma", TYPE_FLOAT)],
                vec![("Color", TYPE_COLOR)],
            ),
            NodeKind::RgbToBw => (vec![("Color", TYPE_COLOR)], vec![("Val", TYPE_FLOAT)]),
            NodeKind::BrightContrast => (
                vec![
                    ("Color", TYPE_COLOR),
                    ("Bright", TYPE_FLOAT),
                    ("Contrast", TYPE_FLOAT),
                ],
                vec![("Color", TYPE_COLOR)],
            ),
            NodeKind::Invert => (
                vec![("Fac", TYPE_FLOAT), ("Color", TYPE_COLOR)],
                vec![("Color", TYPE_COLOR)],
            ),
            NodeKind::CombineXyz => (
                vec![("X", TYPE_FLOAT), ("Y", TYPE_FLOAT), ("Z", TYPE_FLOAT)],
                vec![("Vector", TYPE_VECTOR)],
            ),
            NodeKind::SeparateXyz => (
                vec![("Vector", TYPE_VECTOR)],
                vec![("X", TYPE_FLOAT), ("Y", TYPE_FLOAT), ("Z", TYPE_FLOAT)],
            ),
            NodeKind::CombineRgb => (
                vec![("R", TYPE_FLOAT), ("G", TYPE_FLOAT), ("B", TYPE_FLOAT)],
                vec![("Image", TYPE_COLOR)],
            ),
            NodeKind::SeparateRgb => (
                vec![("Image", TYPE_COLOR)],
                vec![("R", TYPE_FLOAT), ("G", TYPE_FLOAT), ("B", TYPE_FLOAT)],
            ),
            NodeKind::CombineHsv => (
                vec![("H", TYPE_FLOAT), ("S", TYPE_FLOAT), ("V", TYPE_FLOAT)],
                vec![("Color", TYPE_COLOR)],
            ),
            NodeKind::SeparateHsv => (
                vec![("Color", TYPE_COLOR)],
                vec![("H", TYPE_FLOAT), ("S", TYPE_FLOAT), ("V", TYPE_FLOAT)],
            ),
            NodeKind::Blackbody => (vec![("Temperature", TYPE_FLOAT)], vec![("Color", TYPE_COLOR)]),
            NodeKind::Convert { from, to } => {
                let in_ty = SocketType::new(*from);
                let out_ty = SocketType::new(*to);
                (vec![("value_in", in_ty)], vec![("value_out", out_ty)])
            }
            NodeKind::Emission => (
                vec![
                    ("Color", TYPE_COLOR),
                    ("Strength", TYPE_FLOAT),
                    ("SurfaceMixWeight", SocketType::with_flags(SocketKind::Float, F::SVM_INTERNAL)),
                ],
                vec![("Emission", TYPE_CLOSURE)],
            ),
            NodeKind::Background => (
                vec![
                    ("Color", TYPE_COLOR),
                    ("Strength", TYPE_FLOAT),
                    ("SurfaceMixWeight", SocketType::with_flags(SocketKind::Float, F::SVM_INTERNAL)),
                ],
                vec![("Background", TYPE_CLOSURE)],
            ),
            NodeKind::DiffuseBsdf => (
                vec![
                    ("Color", TYPE_COLOR),
                    ("Roughness", TYPE_FLOAT),
                    ("Normal", SocketType::with_flags(SocketKind::Normal, F::LINK_TEXTURE_NORMAL)),
                    ("SurfaceMixWeight", SocketType::with_flags(SocketKind::Float, F::SVM_INTERNAL)),
                ],
                vec![("BSDF", TYPE_CLOSURE)],
            ),
            NodeKind::GlossyBsdf { .. } => (
                vec![
                    ("Color", TYPE_COLOR),
                    ("Roughness", TYPE_FLOAT),
                    ("Normal", SocketType::with_flags(SocketKind::Normal, F::LINK_TEXTURE_NORMAL)),
                    ("SurfaceMixWeight", SocketType::with_flags(SocketKind::Float, F::SVM_INTERNAL)),
                ],
                vec![("BSDF", TYPE_CLOSURE)],
            ),
            NodeKind::TransparentBsdf => (
                vec![
                    ("Color", TYPE_COLOR),
                    ("SurfaceMixWeight", SocketType::with_flags(SocketKind::Float, F::SVM_INTERNAL)),
                ],
                vec![("BSDF", TYPE_CLOSURE)],
            ),
            NodeKind::PrincipledBsdf => (
                vec![
                    ("BaseColor", TYPE_COLOR),
                    ("Roughness", TYPE_FLOAT),
                    ("Transmission", TYPE_FLOAT),
                    ("SurfaceMixWeight", SocketType::with_flags(SocketKind::Float, F::SVM_INTERNAL)),
                ],
                vec![("BSDF", TYPE_CLOSURE)],
            ),
            NodeKind::AddClosure => (
                vec![("Closure1", TYPE_CLOSURE), ("Closure2", TYPE_CLOSURE)],
                vec![("Closure", TYPE_CLOSURE)],
            ),
            NodeKind::MixClosure => (
                vec![
                    ("Fac", TYPE_FLOAT),
                    ("Closure1", TYPE_CLOSURE),
                    ("Closure2", TYPE_CLOSURE),
                ],
                vec![("Closure", TYPE_CLOSURE)],
            ),
            NodeKind::MixClosureWeight => (
                vec![("Fac", TYPE_FLOAT), ("Weight", TYPE_FLOAT)],
                vec![("Weight1", TYPE_FLOAT), ("Weight2", TYPE_FLOAT)],
            ),
            NodeKind::Bump => (
                vec![
                    ("Height", TYPE_FLOAT),
                    ("SampleX", TYPE_FLOAT),
                    ("SampleY", TYPE_FLOAT),
                    ("Strength", TYPE_FLOAT),
                    ("Distance", TYPE_FLOAT),
                    ("Normal", SocketType::with_flags(SocketKind::Normal, F::LINK_TEXTURE_NORMAL)),
                ],
                vec![("Normal", TYPE_NORMAL)],
            ),
            NodeKind::Displacement => (
                vec![("Height", TYPE_FLOAT), ("Midlevel", TYPE_FLOAT), ("Scale", TYPE_FLOAT)],
                vec![("Displacement", TYPE_VECTOR)],
            ),
            NodeKind::VectorDisplacement => (
                vec![("Vector", TYPE_VECTOR), ("Midlevel", TYPE_FLOAT), ("Scale", TYPE_FLOAT)],
                vec![("Displacement", TYPE_VECTOR)],
            ),
            NodeKind::SetNormal => (vec![("Direction", TYPE_NORMAL)], vec![("Normal", TYPE_NORMAL)]),
            NodeKind::Geometry => (
                vec![],
                vec![
                    ("Position", TYPE_POINT_OUT),
                    ("Normal", TYPE_NORMAL),
                    ("Incoming", TYPE_VECTOR),
                    ("Tangent", TYPE_VECTOR),
                ],
            ),
            NodeKind::TextureCoordinate => (
                vec![],
                vec![("Generated", TYPE_POINT_OUT), ("Normal", TYPE_NORMAL), ("UV", TYPE_POINT_OUT)],
            ),
            NodeKind::Output => (
                vec![
                    ("Surface", TYPE_CLOSURE),
                    ("Volume", TYPE_CLOSURE),
                    ("Displacement", TYPE_VECTOR),
                    ("Normal", TYPE_NORMAL),
                ],
                vec![],
            ),
            NodeKind::Proxy => (vec![("value_in", TYPE_FLOAT)], vec![("value_out", TYPE_FLOAT)]),
        }
    }
}

// `Point` reads more naturally than threading `SocketKind::Point` through
// every match arm above.
const TYPE_POINT_OUT: SocketType = SocketType::new(SocketKind::Point);
