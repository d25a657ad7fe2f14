use tracing::{debug, trace, warn};

use crate::kernel::{Kernel, Orientation};

use super::push_point;

/// Flat face buffers of a meshed shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceBuffers {
    /// Node positions, three floats per vertex.
    pub vertices: Vec<f32>,
    /// Vertex indices, three per triangle.
    pub triangles: Vec<u32>,
    /// Unit normals aligned with `vertices`, or empty.
    pub normals: Vec<f32>,
}

/// Collects the triangulations of all faces of a meshed shape into flat
/// vertex, triangle and normal buffers.
///
/// The shape must have been meshed by the kernel beforehand. Faces without a
/// triangulation contribute nothing.
pub struct ExtractFaces<'a, S> {
    shape: &'a S,
}

impl<'a, S> ExtractFaces<'a, S> {
    /// Creates a new `ExtractFaces` operation.
    #[must_use]
    pub fn new(shape: &'a S) -> Self {
        Self { shape }
    }

    /// Executes the extraction.
    ///
    /// Normals are taken from the surface at each node's UV parameters. If any
    /// triangulated face has no UV data the normals buffer is left empty, so it
    /// is always either empty or aligned with the vertices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute<K>(&self, kernel: &K) -> FaceBuffers
    where
        K: Kernel<Shape = S>,
    {
        let mut buffers = FaceBuffers::default();
        let mut offset = 0usize;
        let mut missing_uv = false;

        for face in kernel.faces(self.shape) {
            let Some((triangulation, location)) = kernel.triangulation(&face) else {
                trace!("face has no triangulation, skipped");
                continue;
            };

            let node_count = triangulation.node_count();
            if node_count > 0 && last_index(offset, node_count).is_none() {
                warn!(
                    vertices = offset,
                    face_nodes = node_count,
                    "vertex count exceeds u32 indices, remaining faces skipped"
                );
                break;
            }

            let orientation = kernel.orientation(&face);
            let (i1, i2) = if orientation == Orientation::Reversed {
                (2, 1)
            } else {
                (1, 2)
            };
            let internal = orientation == Orientation::Internal;

            for node in triangulation.nodes() {
                push_point(&mut buffers.vertices, &location.transform_point(node));
            }

            for triangle in triangulation.triangles() {
                buffers.triangles.extend_from_slice(&[
                    (triangle[0] + offset) as u32,
                    (triangle[i1] + offset) as u32,
                    (triangle[i2] + offset) as u32,
                ]);
            }

            if let Some(uv_nodes) = triangulation.uv_nodes() {
                for uv in uv_nodes {
                    let mut normal = kernel.surface_normal(&face, uv.x, uv.y);
                    if normal.norm_squared() > 0.0 {
                        normal.normalize_mut();
                    }
                    if internal {
                        normal = -normal;
                    }
                    buffers.normals.extend_from_slice(&[
                        normal.x as f32,
                        normal.y as f32,
                        normal.z as f32,
                    ]);
                }
            } else {
                missing_uv = true;
            }

            offset += node_count;
        }

        if missing_uv && !buffers.normals.is_empty() {
            debug!(
                normals = buffers.normals.len() / 3,
                vertices = offset,
                "some faces lack uv nodes, dropping normals"
            );
            buffers.normals.clear();
        }

        buffers
    }
}

/// Index of the last node of a face starting at `offset`, if it fits in `u32`.
fn last_index(offset: usize, node_count: usize) -> Option<u32> {
    offset
        .checked_add(node_count - 1)
        .and_then(|index| u32::try_from(index).ok())
}
