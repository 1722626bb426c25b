use fxhash::FxHashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::socket::SocketType;
use crate::value::Value;

/// Static description of one input or output socket on a node type.
#[derive(Clone, Debug)]
pub struct SocketSpec {
    pub name: &'static str,
    pub socket_type: SocketType,
    /// Constant value used when the input is left unlinked. `None` for
    /// outputs and for inputs that have no meaningful default (closures).
    pub default: Option<Value>,
}

impl SocketSpec {
    pub const fn new(name: &'static str, socket_type: SocketType) -> Self {
        SocketSpec {
            name,
            socket_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Static description of a node type: its name and socket list. Keyed by
/// name rather than a numeric id since shader graph nodes are authored by
/// name, not decoded from a binary stream.
#[derive(Clone, Debug)]
pub struct NodeType {
    pub name: &'static str,
    pub inputs: Vec<SocketSpec>,
    pub outputs: Vec<SocketSpec>,
}

impl NodeType {
    pub fn input(&self, name: &str) -> Option<&SocketSpec> {
        self.inputs.iter().find(|s| s.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&SocketSpec> {
        self.outputs.iter().find(|s| s.name == name)
    }
}

/// Process-wide registry of node types, populated once at startup by each
/// node-catalog module (`sg-graph`'s `nodes` module calls `register` for
/// every concrete node type it defines).
pub struct Registry {
    types: RwLock<FxHashMap<&'static str, NodeType>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            types: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn register(&self, node_type: NodeType) {
        let mut types = self.types.write().unwrap();
        types.insert(node_type.name, node_type);
    }

    pub fn lookup(&self, name: &str) -> Result<NodeType> {
        let types = self.types.read().unwrap();
        types
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownNodeType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().unwrap().contains_key(name)
    }
}

lazy_static::lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
}
