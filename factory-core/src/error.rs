use thiserror::Error;

/// Failures while loading a module catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate module id `{0}`")]
    DuplicateId(String),
    #[error("module `{id}` has an invalid default position ({x}, {y})")]
    InvalidPosition { id: String, x: f64, y: f64 },
    #[error("spine position ({x}, {y}) is outside the canvas")]
    InvalidSpine { x: f64, y: f64 },
    #[error("module `{0}` has an empty namespace path")]
    EmptyPath(String),
}

/// Failures of the key-value persistence side channel.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("write to `{key}` rejected: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("could not serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
