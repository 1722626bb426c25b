use std::error;
use std::fmt;

/// Programmer-facing misuse errors for the graph API. Per the error
/// handling design, graph-repair conditions (cycles, dangling volume
/// outputs, multiple suns, stack overflow) are *not* represented here: the
/// optimizer repairs those in place and logs a `warn!` instead of returning
/// `Err`.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Attempted to mutate a graph that has already been finalized.
    AlreadyFinalized,
    /// Attempted to `finalize()` a graph more than once.
    AlreadyConnected { from: String, to: String },
    /// `connect()`/`relink()` referenced a socket that isn't part of this
    /// graph's node set (caller passed a handle from a different graph).
    ForeignSocket,
    Types(sg_types::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AlreadyFinalized => write!(f, "graph has already been finalized"),
            Error::AlreadyConnected { from, to } => {
                write!(f, "input `{}` is already connected to `{}`", to, from)
            }
            Error::ForeignSocket => write!(f, "socket handle does not belong to this graph"),
            Error::Types(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for Error {}

impl From<sg_types::Error> for Error {
    fn from(e: sg_types::Error) -> Self {
        Error::Types(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
