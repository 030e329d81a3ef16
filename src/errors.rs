use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for mapping generation.
///
/// Every variant is fatal for the processing unit that hits it; conditions
/// that merely degrade the output (unknown primitive names, unresolvable
/// import aliases) never surface here.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Source file or package directory could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source text was rejected by the Rust parser.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    /// An `es` attribute segment did not have the `key:value` shape.
    #[error("malformed es attribute `{segment}` on field `{field}`: expected key:value")]
    MalformedAttribute { field: String, segment: String },

    /// A declaration embeds or nests itself, directly or transitively.
    #[error("cyclic type reference while expanding `{name}`")]
    CyclicType { name: String },

    /// The mapping document could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of the mapping document failed.
    #[error("failed to serialize mapping document: {0}")]
    Serialize(#[from] serde_json::Error),
}
