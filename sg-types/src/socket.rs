use bitflags::bitflags;

/// The scalar kind of a socket, independent of its array/linkage flags.
///
/// Mirrors the handful of `SocketType` primitive kinds a shader graph
/// actually needs to distinguish for type-checking and SVM stack sizing:
/// `Color`/`Vector`/`Point`/`Normal` are all 3-float in storage but kept
/// distinct so nodes can document intent and so autoconvert nodes know
/// what kind of conversion (if any) is semantically meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SocketKind {
    Float,
    Int,
    Color,
    Vector,
    Point,
    Normal,
    String,
    Closure,
}

impl SocketKind {
    /// Width in SVM stack slots (each slot is a `float4`/`Int4` word).
    pub fn stack_width(self) -> usize {
        match self {
            SocketKind::Float | SocketKind::Int => 1,
            SocketKind::Color
            | SocketKind::Vector
            | SocketKind::Point
            | SocketKind::Normal => 3,
            SocketKind::String => 1,
            SocketKind::Closure => 0,
        }
    }

    pub fn is_float3(self) -> bool {
        matches!(
            self,
            SocketKind::Color | SocketKind::Vector | SocketKind::Point | SocketKind::Normal
        )
    }
}

bitflags! {
    /// Flags carried alongside a socket's `SocketKind`.
    #[derive(Default)]
    pub struct SocketFlags: u16 {
        /// Input must be linked; the graph optimizer will not fall back to
        /// the constant default (used by a handful of structural sockets).
        const LINK_REQUIRED = 0b0000_0000_0001;
        /// Default autoconvert target is `TextureCoordinateNode::Generated`.
        const LINK_TEXTURE_GENERATED = 0b0000_0000_0010;
        /// Default autoconvert target is `TextureCoordinateNode::Normal`.
        const LINK_TEXTURE_NORMAL = 0b0000_0000_0100;
        /// Socket is only meaningful inside SVM codegen (not user-authorable).
        const SVM_INTERNAL = 0b0000_0000_1000;
        /// Default autoconvert target is `TextureCoordinateNode::UV`.
        const LINK_TEXTURE_UV = 0b0000_0001_0000;
        /// Default autoconvert target is `GeometryNode::Position`.
        const LINK_POSITION = 0b0000_0010_0000;
        /// Default autoconvert target is `GeometryNode::Normal`.
        const LINK_NORMAL = 0b0000_0100_0000;
        /// Default autoconvert target is `GeometryNode::Incoming`.
        const LINK_INCOMING = 0b0000_1000_0000;
        /// Default autoconvert target is `GeometryNode::Tangent`.
        const LINK_TANGENT = 0b0001_0000_0000;
    }
}

/// Full type of a socket: scalar kind plus flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SocketType {
    pub kind: SocketKind,
    pub flags: SocketFlags,
}

impl SocketType {
    pub const fn new(kind: SocketKind) -> Self {
        SocketType {
            kind,
            flags: SocketFlags::empty(),
        }
    }

    pub const fn with_flags(kind: SocketKind, flags: SocketFlags) -> Self {
        SocketType { kind, flags }
    }

    pub fn is_float3(self) -> bool {
        self.kind.is_float3()
    }
}

pub const TYPE_FLOAT: SocketType = SocketType::new(SocketKind::Float);
pub const TYPE_INT: SocketType = SocketType::new(SocketKind::Int);
pub const TYPE_COLOR: SocketType = SocketType::new(SocketKind::Color);
pub const TYPE_VECTOR: SocketType = SocketType::new(SocketKind::Vector);
pub const TYPE_POINT: SocketType = SocketType::new(SocketKind::Point);
pub const TYPE_NORMAL: SocketType = SocketType::new(SocketKind::Normal);
pub const TYPE_STRING: SocketType = SocketType::new(SocketKind::String);
pub const TYPE_CLOSURE: SocketType = SocketType::new(SocketKind::Closure);
