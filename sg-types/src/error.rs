use std::error;
use std::fmt;

/// Errors surfaced at the registry/type-system API boundary.
///
/// Per the error handling design, graph-repair conditions (cycles, dangling
/// volume outputs, stack overflow, ...) are not modeled here: those are
/// fail-soft conditions the optimizer repairs in place and logs via `warn!`.
/// This enum only covers programmer misuse of the registry/type APIs.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// No node type is registered under this name.
    UnknownNodeType(String),
    /// The node type has no socket (input or output) with this name.
    UnknownSocket { node_type: String, socket: String },
    /// A value of the wrong `SocketType` was supplied for a constant input.
    TypeMismatch {
        socket: String,
        expected: SocketKind,
        found: SocketKind,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownNodeType(name) => write!(f, "unknown node type `{}`", name),
            Error::UnknownSocket { node_type, socket } => {
                write!(f, "node type `{}` has no socket `{}`", node_type, socket)
            }
            Error::TypeMismatch {
                socket,
                expected,
                found,
            } => write!(
                f,
                "socket `{}` expects {:?}, found {:?}",
                socket, expected, found
            ),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

use crate::socket::SocketKind;
