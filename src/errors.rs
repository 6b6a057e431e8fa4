use crate::prelude::*;
use thiserror::Error;

/// The named error classes from the resolver's error taxonomy. Everything
/// else (I/O noise, serde noise, etc.) just propagates as `anyhow::Error`
/// with `.context(..)` attached at the call site.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("no cached metadata for {name} {version}")]
    MissingMetadata { name: Name, version: Version },

    #[error("package index lookup failed for {name}: {source}")]
    IndexLookup {
        name: Name,
        #[source]
        source: anyhow::Error,
    },

    #[error("solver exited without an optimal solution (status: {status:?})")]
    NoSolution { status: Option<String> },

    #[error("internal invariant violated: {0}")]
    Invariant(String),

    #[error("malformed CLI input: {0}")]
    InvalidInput(String),
}
