use std::time::Instant;

use tracing::{debug, info, trace};

use crate::error::{Result, TessellationError};
use crate::kernel::Kernel;

use super::{ExtractEdges, ExtractFaces, MeshResult, TessellationParams};

/// Progress of a [`Tessellator`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessellationState {
    /// Nothing computed yet.
    #[default]
    Idle,
    /// Kernel meshing in progress.
    Meshing,
    /// Reading face triangulations.
    FaceExtraction,
    /// Reading edge polygons.
    EdgeExtraction,
    /// All requested buffers are ready.
    Done,
    /// The kernel could not mesh the shape.
    Failed,
}

/// Meshes a shape through the kernel and extracts renderer buffers from it.
#[derive(Debug, Default)]
pub struct Tessellator {
    state: TessellationState,
    result: MeshResult,
}

impl Tessellator {
    /// Creates an idle tessellator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TessellationState {
        self.state
    }

    /// Meshes `shape` and extracts the buffers selected by `params`.
    ///
    /// Previous mesh data on the shape is discarded first. The kernel is asked
    /// to mesh in parallel only when the shape holds more than one solid.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` is invalid, or the kernel's meshing error
    /// unchanged if meshing fails (the state becomes
    /// [`TessellationState::Failed`]).
    pub fn compute<K: Kernel>(
        &mut self,
        kernel: &mut K,
        shape: &K::Shape,
        params: &TessellationParams,
    ) -> Result<()> {
        params.validate()?;
        self.result = MeshResult::default();
        if params.progress {
            info!(quality = params.quality, "tessellating shape");
        }

        self.state = TessellationState::Meshing;
        let solids = kernel.solid_count(shape);
        let parallel = solids > 1;
        let meshed = timed(params, "mesh incrementally", || {
            kernel.clean_mesh(shape);
            kernel.incremental_mesh(shape, params.quality, params.angular_tolerance, parallel)
        });
        if let Err(e) = meshed {
            self.state = TessellationState::Failed;
            debug!(error = %e, solids, "meshing failed");
            return Err(e.into());
        }

        let kernel: &K = kernel;
        if params.compute_faces {
            self.state = TessellationState::FaceExtraction;
            let faces = timed(params, "get nodes, triangles and normals", || {
                ExtractFaces::new(shape).execute(kernel)
            });
            self.result.vertices = faces.vertices;
            self.result.triangles = faces.triangles;
            self.result.normals = faces.normals;
        }

        if params.compute_edges {
            self.state = TessellationState::EdgeExtraction;
            self.result.edges = timed(params, "get edges", || {
                ExtractEdges::new(shape).execute(kernel)
            });
        }

        self.state = TessellationState::Done;
        trace!(
            vertices = self.result.vertex_count(),
            triangles = self.result.triangle_count(),
            segments = self.result.segment_count(),
            "tessellation done"
        );
        Ok(())
    }

    /// Consumes the tessellator, returning the extracted buffers.
    ///
    /// Buffers that were not requested are empty.
    #[must_use]
    pub fn into_result(self) -> MeshResult {
        self.result
    }
}

/// Tessellates one or more shapes as a single compound.
///
/// # Errors
///
/// Returns an error if `shapes` is empty, `params` is invalid, or the kernel
/// fails to mesh.
pub fn tessellate<K: Kernel>(
    kernel: &mut K,
    shapes: &[K::Shape],
    params: &TessellationParams,
) -> Result<MeshResult> {
    let shape = match shapes {
        [] => {
            return Err(
                TessellationError::InvalidParameters("no shapes to tessellate".into()).into(),
            )
        }
        [single] => single.clone(),
        many => kernel.make_compound(many),
    };
    let mut tessellator = Tessellator::new();
    tessellator.compute(kernel, &shape, params)?;
    Ok(tessellator.into_result())
}

/// Runs `f`, reporting its wall time at debug level when `params.debug` is set.
fn timed<T>(params: &TessellationParams, stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let value = f();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if params.debug {
        debug!(stage, elapsed_ms, "tessellation stage finished");
    } else {
        trace!(stage, elapsed_ms, "tessellation stage finished");
    }
    value
}
