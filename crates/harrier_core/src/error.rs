use thiserror::Error;

/// Failure of a single storage backend.
///
/// Recovered by falling through to the next backend or resolution stage
/// wherever one exists; only surfaced once every applicable stage is
/// exhausted.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

/// Resolution failure as reported by the facade.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No backend and no fallback version produced the object.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The version manifest could not be fetched or parsed. Fatal for any
    /// request depending on `latest` resolution.
    #[error("Version manifest unreadable: {0}")]
    Manifest(String),

    #[error("Invalid JSON object at {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ResolveError::NotFound(_) => true,
            ResolveError::Backend(err) => err.is_not_found(),
            _ => false,
        }
    }
}
