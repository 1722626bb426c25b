//! Socket & node type vocabulary shared by every shader-graph-compiler
//! crate: `SocketType`, constant `Value`s, and the process-wide node type
//! registry.

pub mod error;
pub mod registry;
pub mod socket;
pub mod value;

pub use error::{Error, Result};
pub use registry::{NodeType, Registry, SocketSpec, REGISTRY};
pub use socket::{
    SocketFlags, SocketKind, SocketType, TYPE_CLOSURE, TYPE_COLOR, TYPE_FLOAT, TYPE_INT,
    TYPE_NORMAL, TYPE_POINT, TYPE_STRING, TYPE_VECTOR,
};
pub use value::{Float3, Value, ValueKey};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_kind_stack_width() {
        assert_eq!(SocketKind::Float.stack_width(), 1);
        assert_eq!(SocketKind::Color.stack_width(), 3);
        assert_eq!(SocketKind::Closure.stack_width(), 0);
    }

    #[test]
    fn float3_saturate_clamps() {
        let v = Float3::new(-1.0, 0.5, 2.0).saturate();
        assert_eq!(v, Float3::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn registry_lookup_unknown_is_error() {
        let registry = Registry::new();
        assert!(registry.lookup("DoesNotExist").is_err());
    }
}
