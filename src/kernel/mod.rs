//! Adapter boundary to the B-rep kernel.
//!
//! The engine only reads kernel data through [`Kernel`]. Each supported kernel
//! (or kernel version) gets one implementation of the trait, chosen once by the
//! host application. Differences such as 1-based node numbering or the shape of
//! the polygon-on-triangulation API are normalized inside the adapter, so
//! everything crossing this boundary uses 0-based indices.

pub mod memory;

pub use memory::MemoryKernel;

use crate::error::{KernelError, Result, TessellationError};
use crate::math::{Matrix4, Point2, Point3, Vector3, TOLERANCE};

/// Orientation of a face relative to its underlying surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Face normal agrees with the surface normal.
    #[default]
    Forward,
    /// Face normal is opposite to the surface normal; triangle winding flips.
    Reversed,
    /// Interior material boundary; normals are negated.
    Internal,
    /// Exterior boundary with no material on either side.
    External,
}

/// Homogeneous transform placing local triangulation coordinates into shape space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location(Matrix4);

impl Location {
    /// The identity placement.
    #[must_use]
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Wraps an arbitrary homogeneous matrix.
    #[must_use]
    pub fn from_matrix(matrix: Matrix4) -> Self {
        Self(matrix)
    }

    /// A pure translation.
    #[must_use]
    pub fn from_translation(offset: Vector3) -> Self {
        Self(Matrix4::new_translation(&offset))
    }

    /// Returns the underlying matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix4 {
        &self.0
    }

    /// Returns `true` if this location does not move anything.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.0.is_identity(TOLERANCE)
    }

    /// Transforms a point (rotation, scale and translation).
    #[must_use]
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        self.0.transform_point(p)
    }

    /// Transforms a direction (translation is ignored).
    #[must_use]
    pub fn transform_vector(&self, v: &Vector3) -> Vector3 {
        self.0.transform_vector(v)
    }

    /// Composes `self` after `inner`.
    #[must_use]
    pub fn then(&self, inner: &Location) -> Location {
        Location(self.0 * inner.0)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::identity()
    }
}

/// Mesh of a single face as produced by the kernel's mesher.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    nodes: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
    uv_nodes: Option<Vec<Point2>>,
}

impl Triangulation {
    /// Creates a triangulation without surface parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a triangle references a node that does not exist.
    pub fn new(nodes: Vec<Point3>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        if let Some(bad) = triangles
            .iter()
            .flatten()
            .find(|&&index| index >= nodes.len())
        {
            return Err(TessellationError::InvalidTriangulation(format!(
                "node index {bad} out of range for {} nodes",
                nodes.len()
            ))
            .into());
        }
        Ok(Self {
            nodes,
            triangles,
            uv_nodes: None,
        })
    }

    /// Attaches one `(u, v)` surface parameter pair per node.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of UV pairs differs from the node count.
    pub fn with_uv_nodes(mut self, uv_nodes: Vec<Point2>) -> Result<Self> {
        if uv_nodes.len() != self.nodes.len() {
            return Err(TessellationError::InvalidTriangulation(format!(
                "{} uv nodes for {} nodes",
                uv_nodes.len(),
                self.nodes.len()
            ))
            .into());
        }
        self.uv_nodes = Some(uv_nodes);
        Ok(self)
    }

    /// Node positions in local coordinates.
    #[must_use]
    pub fn nodes(&self) -> &[Point3] {
        &self.nodes
    }

    /// Triangles as 0-based node index triples, in kernel-native winding.
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Surface parameters of each node, if the mesher recorded them.
    #[must_use]
    pub fn uv_nodes(&self) -> Option<&[Point2]> {
        self.uv_nodes.as_deref()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// An edge's polyline, as 0-based indices into one adjacent face's triangulation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolygonOnTriangulation {
    nodes: Vec<usize>,
}

impl PolygonOnTriangulation {
    /// Creates a polygon from ordered node indices.
    #[must_use]
    pub fn new(nodes: Vec<usize>) -> Self {
        Self { nodes }
    }

    /// Ordered node indices.
    #[must_use]
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Number of segments between consecutive nodes.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum x coordinate.
    pub xmin: f64,
    /// Maximum x coordinate.
    pub xmax: f64,
    /// Minimum y coordinate.
    pub ymin: f64,
    /// Maximum y coordinate.
    pub ymax: f64,
    /// Minimum z coordinate.
    pub zmin: f64,
    /// Maximum z coordinate.
    pub zmax: f64,
}

impl BoundingBox {
    /// Creates a box from its six extents.
    #[must_use]
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64, zmin: f64, zmax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin,
            zmax,
        }
    }

    /// Creates a box from its minimum and maximum corners.
    #[must_use]
    pub fn from_corners(min: &Point3, max: &Point3) -> Self {
        Self::new(min.x, max.x, min.y, max.y, min.z, max.z)
    }

    /// Smallest box containing all `points`, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some(Self::from_corners(&min, &max))
    }

    /// Extent along x.
    #[must_use]
    pub fn xsize(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Extent along y.
    #[must_use]
    pub fn ysize(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Extent along z.
    #[must_use]
    pub fn zsize(&self) -> f64 {
        self.zmax - self.zmin
    }
}

/// Read access to a kernel's shapes, topology, and mesh records.
///
/// Only [`Kernel::clean_mesh`] and [`Kernel::incremental_mesh`] mutate kernel
/// state; everything else is a query over the most recent meshing pass.
pub trait Kernel {
    /// Handle to a shape (solid, shell, compound, ...).
    type Shape: Clone;
    /// Handle to a face.
    type Face: Clone;
    /// Handle to an edge.
    type Edge: Clone;

    /// Discards any triangulation and polygon data stored on `shape`.
    fn clean_mesh(&mut self, shape: &Self::Shape);

    /// Meshes every face of `shape`.
    ///
    /// `parallel` is a hint that the kernel may use its own worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Meshing`] if the mesher could not complete.
    fn incremental_mesh(
        &mut self,
        shape: &Self::Shape,
        linear_deflection: f64,
        angular_deflection: f64,
        parallel: bool,
    ) -> std::result::Result<(), KernelError>;

    /// Number of solids contained in `shape`.
    fn solid_count(&self, shape: &Self::Shape) -> usize;

    /// All faces of `shape`, each listed once, in a stable traversal order.
    fn faces(&self, shape: &Self::Shape) -> Vec<Self::Face>;

    /// All edges of `shape`, each listed once, in a stable traversal order.
    fn edges(&self, shape: &Self::Shape) -> Vec<Self::Edge>;

    /// Faces of `shape` bounded by `edge`, in the same order as [`Kernel::faces`].
    fn faces_adjacent_to(&self, shape: &Self::Shape, edge: &Self::Edge) -> Vec<Self::Face>;

    /// Orientation of `face`.
    fn orientation(&self, face: &Self::Face) -> Orientation;

    /// Current triangulation of `face` and the location to apply to its nodes.
    fn triangulation(&self, face: &Self::Face) -> Option<(&Triangulation, Location)>;

    /// Shape-space surface normal of `face` at `(u, v)`, already flipped for a
    /// reversed face. May be zero-length at singular points.
    fn surface_normal(&self, face: &Self::Face, u: f64, v: f64) -> Vector3;

    /// Polyline of `edge` on the current triangulation of `face`.
    fn polygon_on_triangulation(
        &self,
        edge: &Self::Edge,
        face: &Self::Face,
    ) -> Option<&PolygonOnTriangulation>;

    /// Adaptive sampling of the edge's curve within `deflection`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Sampling`] if the sampler did not converge.
    fn discretize(
        &self,
        edge: &Self::Edge,
        deflection: f64,
    ) -> std::result::Result<Vec<Point3>, KernelError>;

    /// Structural hash of `shape`. Not guaranteed collision-free.
    fn structural_hash(&self, shape: &Self::Shape) -> u64;

    /// Groups several shapes into one compound.
    fn make_compound(&mut self, shapes: &[Self::Shape]) -> Self::Shape;
}
