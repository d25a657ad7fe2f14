//! Tessellation and mesh extraction of B-rep shapes.
//!
//! Shapes are meshed through a [`kernel::Kernel`] adapter, their face
//! triangulations and edge polygons are flattened into renderer-ready buffers
//! ([`tessellation::MeshResult`]), and results are memoized in a byte-budgeted
//! [`cache::TessellationCache`].

pub mod cache;
pub mod error;
pub mod kernel;
pub mod math;
pub mod tessellation;

pub use cache::{CacheConfig, CacheKey, TessellationCache};
pub use error::{BrepMeshError, Result};
pub use kernel::{BoundingBox, Kernel};
pub use tessellation::{compute_quality, MeshResult, TessellationParams};
