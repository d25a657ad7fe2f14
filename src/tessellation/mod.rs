mod discretize;
mod extract_edges;
mod extract_faces;
mod tessellator;

pub use discretize::{DiscretizeEdge, DEFAULT_DEFLECTION};
pub use extract_edges::ExtractEdges;
pub use extract_faces::{ExtractFaces, FaceBuffers};
pub use tessellator::{tessellate, TessellationState, Tessellator};

use crate::error::{Result, TessellationError};
use crate::kernel::BoundingBox;
use crate::math::{is_positive_finite, round_sig, Point3};

/// Default deviation factor for [`compute_quality`].
pub const DEFAULT_DEVIATION: f64 = 0.1;

/// Parameters controlling a tessellation request.
///
/// `debug` and `progress` only select which log events are emitted; they never
/// change the output and are not part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationParams {
    /// Linear deflection handed to the kernel mesher.
    pub quality: f64,
    /// Maximum angle between adjacent facets, in radians.
    pub angular_tolerance: f64,
    /// Extract vertices, triangles and normals.
    pub compute_faces: bool,
    /// Extract edge segments.
    pub compute_edges: bool,
    /// Report per-stage timings at debug level instead of trace level.
    pub debug: bool,
    /// Emit an info event per computation.
    pub progress: bool,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            quality: 0.1,
            angular_tolerance: 0.2,
            compute_faces: true,
            compute_edges: true,
            debug: false,
            progress: false,
        }
    }
}

impl TessellationParams {
    /// Parameters with the given fidelity and both outputs enabled.
    #[must_use]
    pub fn new(quality: f64, angular_tolerance: f64) -> Self {
        Self {
            quality,
            angular_tolerance,
            ..Self::default()
        }
    }

    /// Checks that both tolerances are finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::InvalidParameters`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if !is_positive_finite(self.quality) {
            return Err(TessellationError::InvalidParameters(format!(
                "quality must be positive, got {}",
                self.quality
            ))
            .into());
        }
        if !is_positive_finite(self.angular_tolerance) {
            return Err(TessellationError::InvalidParameters(format!(
                "angular tolerance must be positive, got {}",
                self.angular_tolerance
            ))
            .into());
        }
        Ok(())
    }
}

/// Renderer-ready buffers for one tessellated shape.
///
/// All buffers are flat: `vertices` and `normals` hold `x, y, z` triplets,
/// `triangles` holds index triplets into `vertices`, and `edges` holds pairs of
/// points (six floats per segment) indexed independently of `vertices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshResult {
    /// Node positions, three floats per vertex.
    pub vertices: Vec<f32>,
    /// Vertex indices, three per triangle. Bounded by `u32::MAX` vertices.
    pub triangles: Vec<u32>,
    /// Unit normals aligned with `vertices`, or empty.
    pub normals: Vec<f32>,
    /// Edge segments, six floats per segment.
    pub edges: Vec<f32>,
}

impl MeshResult {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of normals.
    #[must_use]
    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    /// Number of edge segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.edges.len() / 6
    }

    /// Returns `true` if every buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.triangles.is_empty()
            && self.normals.is_empty()
            && self.edges.is_empty()
    }
}

/// Derives a meshing quality from a bounding box.
///
/// Box sizes and the result are rounded to two significant digits, so nearly
/// identical boxes map to the same value (and the same cache key).
#[must_use]
pub fn compute_quality(bb: &BoundingBox, deviation: f64) -> f64 {
    let size = round_sig(bb.xsize(), 2) + round_sig(bb.ysize(), 2) + round_sig(bb.zsize(), 2);
    round_sig(size / 300.0 * deviation, 2)
}

/// The 12 edges of `bb` as 24 consecutive points (72 floats).
///
/// Point order is fixed; renderers consume consecutive pairs positionally.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn bbox_edges(bb: &BoundingBox) -> Vec<f32> {
    let (x0, x1) = (bb.xmin, bb.xmax);
    let (y0, y1) = (bb.ymin, bb.ymax);
    let (z0, z1) = (bb.zmin, bb.zmax);
    let points = [
        Point3::new(x1, y1, z0),
        Point3::new(x1, y1, z1),
        Point3::new(x1, y0, z1),
        Point3::new(x1, y1, z1),
        Point3::new(x1, y0, z0),
        Point3::new(x1, y1, z0),
        Point3::new(x1, y0, z0),
        Point3::new(x1, y0, z1),
        Point3::new(x0, y1, z1),
        Point3::new(x1, y1, z1),
        Point3::new(x0, y1, z0),
        Point3::new(x1, y1, z0),
        Point3::new(x0, y1, z0),
        Point3::new(x0, y1, z1),
        Point3::new(x0, y0, z1),
        Point3::new(x1, y0, z1),
        Point3::new(x0, y0, z1),
        Point3::new(x0, y1, z1),
        Point3::new(x0, y0, z0),
        Point3::new(x1, y0, z0),
        Point3::new(x0, y0, z0),
        Point3::new(x0, y1, z0),
        Point3::new(x0, y0, z0),
        Point3::new(x0, y0, z1),
    ];
    points
        .iter()
        .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect()
}

/// Appends a point to a flat `f32` buffer.
#[allow(clippy::cast_possible_truncation)]
fn push_point(buffer: &mut Vec<f32>, p: &Point3) {
    buffer.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
}

/// Appends one segment per consecutive pair of `points`.
fn push_polyline(buffer: &mut Vec<f32>, points: &[Point3]) {
    for pair in points.windows(2) {
        push_point(buffer, &pair[0]);
        push_point(buffer, &pair[1]);
    }
}
