use thiserror::Error;

/// Top-level error type for the brepmesh engine.
#[derive(Debug, Error)]
pub enum BrepMeshError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Fatal failures reported by a kernel adapter.
///
/// These are passed through to the caller unmodified and are never cached.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum KernelError {
    #[error("incremental meshing failed: {0}")]
    Meshing(String),

    #[error("curve discretization did not converge: {0}")]
    Sampling(String),
}

/// Errors raised by the engine itself.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid triangulation: {0}")]
    InvalidTriangulation(String),
}

/// Convenience type alias for results using [`BrepMeshError`].
pub type Result<T> = std::result::Result<T, BrepMeshError>;
