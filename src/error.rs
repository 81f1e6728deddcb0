use std::path::PathBuf;

/// Fatal problems with a graph payload. A failed load leaves the previously
/// loaded graph in place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("invalid graph: node id `{id}` appears at index {first} and again at index {duplicate}")]
    InvalidGraph {
        id: String,
        first: usize,
        duplicate: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("zoom factor {0} must be finite and positive")]
    InvalidFactor(f32),
    #[error("{operation} rejected: input or resulting transform is not finite")]
    NonFinite { operation: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),
    #[error("{table} style table replaces the defaults but has no `default` entry")]
    MissingDefaultStyle { table: &'static str },
    #[error("invalid color `{value}` (expected #RGB, #RRGGBB or #RRGGBBAA)")]
    InvalidColor { value: String },
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
