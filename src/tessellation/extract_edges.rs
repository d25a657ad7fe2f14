use tracing::{trace, warn};

use crate::kernel::Kernel;
use crate::math::Point3;

use super::push_polyline;

/// Rebuilds edge polylines of a meshed shape from the polygons the mesher
/// recorded on adjacent face triangulations.
///
/// Reusing the face mesh nodes keeps the wireframe exactly on the shaded mesh.
pub struct ExtractEdges<'a, S> {
    shape: &'a S,
}

impl<'a, S> ExtractEdges<'a, S> {
    /// Creates a new `ExtractEdges` operation.
    #[must_use]
    pub fn new(shape: &'a S) -> Self {
        Self { shape }
    }

    /// Executes the extraction, returning flat segments (six floats each).
    ///
    /// Edges without an adjacent face, a triangulation on that face, or a
    /// polygon on that triangulation are skipped.
    pub fn execute<K>(&self, kernel: &K) -> Vec<f32>
    where
        K: Kernel<Shape = S>,
    {
        let mut segments = Vec::new();
        let mut points: Vec<Point3> = Vec::new();

        for edge in kernel.edges(self.shape) {
            let Some(face) = kernel.faces_adjacent_to(self.shape, &edge).into_iter().next() else {
                trace!("edge has no adjacent face, skipped");
                continue;
            };
            let Some((triangulation, location)) = kernel.triangulation(&face) else {
                trace!("adjacent face has no triangulation, skipped");
                continue;
            };
            let Some(polygon) = kernel.polygon_on_triangulation(&edge, &face) else {
                trace!("edge has no polygon on triangulation, skipped");
                continue;
            };

            let nodes = triangulation.nodes();
            points.clear();
            for &index in polygon.nodes() {
                let Some(node) = nodes.get(index) else {
                    break;
                };
                points.push(location.transform_point(node));
            }
            if points.len() != polygon.nodes().len() {
                warn!(
                    nodes = nodes.len(),
                    polygon = polygon.nodes().len(),
                    "polygon references a missing node, edge skipped"
                );
                continue;
            }

            push_polyline(&mut segments, &points);
        }

        segments
    }
}
