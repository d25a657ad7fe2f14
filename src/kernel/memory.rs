//! In-memory B-rep kernel.
//!
//! A small arena-based kernel that implements [`Kernel`] without any external
//! CAD library. Planar faces are meshed with a constrained Delaunay
//! triangulation; faces with a non-planar surface carry a triangulation prepared
//! by the caller, which the mesher installs as-is. It backs the engine's tests
//! and serves as the reference adapter for new kernel bindings.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use slotmap::{SecondaryMap, SlotMap};
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation as _};
use tracing::{debug, trace};

use crate::error::{KernelError, Result, TessellationError};
use crate::math::{is_positive_finite, Point2, Point3, Vector3, TOLERANCE};

use super::{Kernel, Location, Orientation, PolygonOnTriangulation, Triangulation};

/// Upper bound on the number of points produced by [`MemoryKernel::discretize`].
const MAX_CURVE_SAMPLES: usize = 100_000;

slotmap::new_key_type! {
    /// Unique identifier for a shape in the memory kernel.
    pub struct ShapeId;
}

slotmap::new_key_type! {
    /// Unique identifier for a face in the memory kernel.
    pub struct FaceId;
}

slotmap::new_key_type! {
    /// Unique identifier for an edge in the memory kernel.
    pub struct EdgeId;
}

/// A node of the shape tree.
#[derive(Debug, Clone)]
pub enum ShapeData {
    /// A closed volume bounded by faces.
    Solid(Vec<FaceId>),
    /// A set of connected faces.
    Shell(Vec<FaceId>),
    /// Free edges with no face.
    Wire(Vec<EdgeId>),
    /// A group of other shapes.
    Compound(Vec<ShapeId>),
}

/// The surface a face lies on, used for normal evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceSurface {
    /// A plane with a constant unit normal (local coordinates).
    Plane { normal: Vector3 },
    /// A unit sphere parametrized by longitude `u` and latitude `v`.
    Sphere,
    /// A surface whose normal vanishes everywhere.
    Degenerate,
}

impl FaceSurface {
    /// Local surface normal at `(u, v)`.
    #[must_use]
    pub fn normal(&self, u: f64, v: f64) -> Vector3 {
        match self {
            Self::Plane { normal } => *normal,
            Self::Sphere => Vector3::new(v.cos() * u.cos(), v.cos() * u.sin(), v.sin()),
            Self::Degenerate => Vector3::zeros(),
        }
    }
}

/// The geometric curve of an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeCurve {
    /// Straight segment.
    Line { start: Point3, end: Point3 },
    /// Circular arc from `start_angle` to `end_angle` in the `x_axis`/`y_axis` frame.
    Circle {
        center: Point3,
        x_axis: Vector3,
        y_axis: Vector3,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
}

impl EdgeCurve {
    /// Creates a circular arc around `normal`.
    #[must_use]
    pub fn circle(
        center: Point3,
        normal: Vector3,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Self {
        let (x_axis, y_axis) = plane_frame(&normal);
        Self::Circle {
            center,
            x_axis,
            y_axis,
            radius,
            start_angle,
            end_angle,
        }
    }

    fn sample(&self, deflection: f64) -> std::result::Result<Vec<Point3>, KernelError> {
        match self {
            Self::Line { start, end } => Ok(vec![*start, *end]),
            Self::Circle {
                center,
                x_axis,
                y_axis,
                radius,
                start_angle,
                end_angle,
            } => {
                let sweep = (end_angle - start_angle).abs();
                // Largest angular step whose chord stays within `deflection` of the arc.
                let step = if deflection >= *radius {
                    PI
                } else {
                    2.0 * (1.0 - deflection / radius).acos()
                };
                let count = (sweep / step).ceil();
                if !count.is_finite() || count > MAX_CURVE_SAMPLES as f64 {
                    return Err(KernelError::Sampling(format!(
                        "arc of radius {radius} needs too many points for deflection {deflection}"
                    )));
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let segments = (count as usize).max(1);
                #[allow(clippy::cast_precision_loss)]
                let points = (0..=segments)
                    .map(|i| {
                        let t = start_angle + (end_angle - start_angle) * i as f64 / segments as f64;
                        center + (x_axis * t.cos() + y_axis * t.sin()) * *radius
                    })
                    .collect();
                Ok(points)
            }
        }
    }
}

/// How a face obtains its triangulation when meshed.
#[derive(Debug, Clone)]
enum FaceSource {
    /// Planar polygon; boundary edge `i` runs from `boundary[i]` to `boundary[i + 1]`.
    Planar {
        origin: Point3,
        u_dir: Vector3,
        v_dir: Vector3,
        boundary: Vec<Point3>,
    },
    /// Triangulation supplied by the caller, plus per-edge polygons on it.
    Prepared {
        triangulation: Triangulation,
        polygons: Vec<(EdgeId, PolygonOnTriangulation)>,
    },
}

/// Data associated with a face.
#[derive(Debug, Clone)]
struct FaceData {
    orientation: Orientation,
    surface: FaceSurface,
    location: Location,
    edges: Vec<EdgeId>,
    source: FaceSource,
}

/// A face whose triangulation is provided up front.
#[derive(Debug, Clone)]
pub struct PreparedFace {
    triangulation: Triangulation,
    orientation: Orientation,
    surface: FaceSurface,
    location: Location,
    edges: Vec<(EdgeId, Option<PolygonOnTriangulation>)>,
}

impl PreparedFace {
    /// Starts a forward, planar (+Z) face at the identity location.
    #[must_use]
    pub fn new(triangulation: Triangulation) -> Self {
        Self {
            triangulation,
            orientation: Orientation::Forward,
            surface: FaceSurface::Plane {
                normal: Vector3::z(),
            },
            location: Location::identity(),
            edges: Vec::new(),
        }
    }

    #[must_use]
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn surface(mut self, surface: FaceSurface) -> Self {
        self.surface = surface;
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Adds a boundary edge. `polygon` is the edge's node list on this face's
    /// triangulation; `None` models an edge the mesher left without one.
    #[must_use]
    pub fn edge(mut self, edge: EdgeId, polygon: Option<PolygonOnTriangulation>) -> Self {
        self.edges.push((edge, polygon));
        self
    }
}

/// Arena-backed kernel holding shapes, faces, edges, and their mesh records.
#[derive(Debug, Default)]
pub struct MemoryKernel {
    shapes: SlotMap<ShapeId, ShapeData>,
    faces: SlotMap<FaceId, FaceData>,
    edges: SlotMap<EdgeId, Option<EdgeCurve>>,
    meshes: SecondaryMap<FaceId, Triangulation>,
    polygons: HashMap<(EdgeId, FaceId), PolygonOnTriangulation>,
    meshing_failure: Option<String>,
    mesh_calls: usize,
    clean_calls: usize,
    last_parallel_hint: Option<bool>,
}

impl MemoryKernel {
    /// Creates a new, empty kernel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an edge. `None` models an edge without a 3D curve.
    pub fn add_edge(&mut self, curve: Option<EdgeCurve>) -> EdgeId {
        self.edges.insert(curve)
    }

    /// Inserts a straight edge.
    pub fn add_line(&mut self, start: Point3, end: Point3) -> EdgeId {
        self.add_edge(Some(EdgeCurve::Line { start, end }))
    }

    /// Inserts a planar polygon face bounded by `edges`, where `edges[i]` runs
    /// from `boundary[i]` to `boundary[(i + 1) % n]`. The face normal follows
    /// the boundary's counter-clockwise direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary has fewer than three distinct points,
    /// is not planar enough to define a normal, or `edges` does not have one
    /// entry per boundary segment.
    pub fn add_planar_face(
        &mut self,
        boundary: Vec<Point3>,
        edges: Vec<EdgeId>,
        orientation: Orientation,
    ) -> Result<FaceId> {
        if boundary.len() < 3 {
            return Err(TessellationError::InvalidParameters(
                "planar face needs at least 3 boundary points".into(),
            )
            .into());
        }
        if edges.len() != boundary.len() {
            return Err(TessellationError::InvalidParameters(format!(
                "{} edges for {} boundary points",
                edges.len(),
                boundary.len()
            ))
            .into());
        }
        for (i, a) in boundary.iter().enumerate() {
            if boundary[i + 1..].iter().any(|b| (a - b).norm() < TOLERANCE) {
                return Err(TessellationError::InvalidParameters(
                    "duplicate boundary point".into(),
                )
                .into());
            }
        }

        // Newell's method: sum of cross products is twice the area vector.
        let area_vector = boundary
            .iter()
            .zip(boundary.iter().cycle().skip(1))
            .fold(Vector3::zeros(), |acc, (a, b)| acc + a.coords.cross(&b.coords));
        let len = area_vector.norm();
        if len < TOLERANCE {
            return Err(TessellationError::InvalidParameters(
                "planar face boundary has zero area".into(),
            )
            .into());
        }
        let normal = area_vector / len;
        let (u_dir, v_dir) = plane_frame(&normal);

        Ok(self.faces.insert(FaceData {
            orientation,
            surface: FaceSurface::Plane { normal },
            location: Location::identity(),
            edges,
            source: FaceSource::Planar {
                origin: boundary[0],
                u_dir,
                v_dir,
                boundary,
            },
        }))
    }

    /// Inserts a planar polygon face, creating a fresh line edge per segment.
    ///
    /// # Errors
    ///
    /// See [`MemoryKernel::add_planar_face`].
    pub fn add_polygon_face(
        &mut self,
        boundary: Vec<Point3>,
        orientation: Orientation,
    ) -> Result<FaceId> {
        let n = boundary.len();
        let edges = (0..n)
            .map(|i| self.add_line(boundary[i], boundary[(i + 1) % n]))
            .collect();
        self.add_planar_face(boundary, edges, orientation)
    }

    /// Inserts a face with a caller-provided triangulation.
    pub fn add_prepared_face(&mut self, face: PreparedFace) -> FaceId {
        let edges = face.edges.iter().map(|(edge, _)| *edge).collect();
        let polygons = face
            .edges
            .into_iter()
            .filter_map(|(edge, polygon)| polygon.map(|p| (edge, p)))
            .collect();
        self.faces.insert(FaceData {
            orientation: face.orientation,
            surface: face.surface,
            location: face.location,
            edges,
            source: FaceSource::Prepared {
                triangulation: face.triangulation,
                polygons,
            },
        })
    }

    /// Inserts a solid bounded by `faces`.
    pub fn add_solid(&mut self, faces: Vec<FaceId>) -> ShapeId {
        self.shapes.insert(ShapeData::Solid(faces))
    }

    /// Inserts an open shell.
    pub fn add_shell(&mut self, faces: Vec<FaceId>) -> ShapeId {
        self.shapes.insert(ShapeData::Shell(faces))
    }

    /// Inserts a wire of free edges.
    pub fn add_wire(&mut self, edges: Vec<EdgeId>) -> ShapeId {
        self.shapes.insert(ShapeData::Wire(edges))
    }

    /// Inserts a compound of existing shapes.
    pub fn add_compound(&mut self, children: Vec<ShapeId>) -> ShapeId {
        self.shapes.insert(ShapeData::Compound(children))
    }

    /// Builds an axis-aligned box solid with 6 faces and 12 shared edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the box is degenerate along any axis.
    pub fn add_box(&mut self, min: Point3, max: Point3) -> Result<ShapeId> {
        // Counter-clockwise seen from outside.
        const FACES: [[usize; 4]; 6] = [
            [0, 2, 3, 1], // -z
            [4, 5, 7, 6], // +z
            [0, 1, 5, 4], // -y
            [2, 6, 7, 3], // +y
            [0, 4, 6, 2], // -x
            [1, 3, 7, 5], // +x
        ];

        // Corner `i` takes max.x if bit 0 is set, max.y for bit 1, max.z for bit 2.
        let corner = |i: usize| {
            Point3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        };
        let mut edge_ids: HashMap<(usize, usize), EdgeId> = HashMap::new();
        let mut faces = Vec::with_capacity(FACES.len());
        for loop_corners in FACES {
            let mut edges = Vec::with_capacity(4);
            for k in 0..4 {
                let a = loop_corners[k];
                let b = loop_corners[(k + 1) % 4];
                let key = (a.min(b), a.max(b));
                let id = *edge_ids
                    .entry(key)
                    .or_insert_with(|| self.edges.insert(Some(EdgeCurve::Line {
                        start: corner(key.0),
                        end: corner(key.1),
                    })));
                edges.push(id);
            }
            let boundary = loop_corners.iter().map(|&i| corner(i)).collect();
            faces.push(self.add_planar_face(boundary, edges, Orientation::Forward)?);
        }
        Ok(self.add_solid(faces))
    }

    /// Overrides the placement of an existing face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn set_location(&mut self, face: FaceId, location: Location) -> Result<()> {
        let data = self.faces.get_mut(face).ok_or_else(|| {
            TessellationError::InvalidParameters("face not found".into())
        })?;
        data.location = location;
        Ok(())
    }

    /// Makes subsequent meshing calls fail with `reason`, or succeed again with `None`.
    pub fn fail_meshing(&mut self, reason: Option<String>) {
        self.meshing_failure = reason;
    }

    /// Number of [`Kernel::incremental_mesh`] calls so far.
    #[must_use]
    pub fn mesh_calls(&self) -> usize {
        self.mesh_calls
    }

    /// Number of [`Kernel::clean_mesh`] calls so far.
    #[must_use]
    pub fn clean_calls(&self) -> usize {
        self.clean_calls
    }

    /// The `parallel` hint passed to the most recent meshing call.
    #[must_use]
    pub fn last_parallel_hint(&self) -> Option<bool> {
        self.last_parallel_hint
    }

    /// Returns `true` if `face` currently carries a triangulation.
    #[must_use]
    pub fn is_meshed(&self, face: FaceId) -> bool {
        self.meshes.contains_key(face)
    }

    fn walk(&self, shape: ShapeId, faces: &mut Vec<FaceId>, edges: &mut Vec<EdgeId>) {
        let mut seen_faces: HashSet<FaceId> = faces.iter().copied().collect();
        let mut seen_edges: HashSet<EdgeId> = edges.iter().copied().collect();
        let mut stack = vec![shape];
        // Depth-first, children in declaration order.
        while let Some(id) = stack.pop() {
            let Some(data) = self.shapes.get(id) else {
                continue;
            };
            match data {
                ShapeData::Solid(fs) | ShapeData::Shell(fs) => {
                    for &face in fs {
                        if !seen_faces.insert(face) {
                            continue;
                        }
                        faces.push(face);
                        if let Some(face_data) = self.faces.get(face) {
                            for &edge in &face_data.edges {
                                if seen_edges.insert(edge) {
                                    edges.push(edge);
                                }
                            }
                        }
                    }
                }
                ShapeData::Wire(es) => {
                    for &edge in es {
                        if seen_edges.insert(edge) {
                            edges.push(edge);
                        }
                    }
                }
                ShapeData::Compound(children) => stack.extend(children.iter().rev()),
            }
        }
    }
}

impl Kernel for MemoryKernel {
    type Shape = ShapeId;
    type Face = FaceId;
    type Edge = EdgeId;

    fn clean_mesh(&mut self, shape: &ShapeId) {
        self.clean_calls += 1;
        let faces = self.faces(shape);
        for face in &faces {
            self.meshes.remove(*face);
        }
        let faces: HashSet<FaceId> = faces.into_iter().collect();
        self.polygons.retain(|(_, face), _| !faces.contains(face));
    }

    fn incremental_mesh(
        &mut self,
        shape: &ShapeId,
        linear_deflection: f64,
        angular_deflection: f64,
        parallel: bool,
    ) -> std::result::Result<(), KernelError> {
        self.mesh_calls += 1;
        self.last_parallel_hint = Some(parallel);
        if let Some(reason) = &self.meshing_failure {
            return Err(KernelError::Meshing(reason.clone()));
        }
        if !is_positive_finite(linear_deflection) || !is_positive_finite(angular_deflection) {
            return Err(KernelError::Meshing(format!(
                "deflections must be positive, got {linear_deflection} / {angular_deflection}"
            )));
        }

        for face in self.faces(shape) {
            if self.meshes.contains_key(face) {
                continue;
            }
            let Some(data) = self.faces.get(face) else {
                continue;
            };
            let (triangulation, polygons) = match &data.source {
                FaceSource::Planar {
                    origin,
                    u_dir,
                    v_dir,
                    boundary,
                } => {
                    let triangulation = mesh_planar_face(origin, u_dir, v_dir, boundary)?;
                    let n = boundary.len();
                    let polygons: Vec<_> = data
                        .edges
                        .iter()
                        .enumerate()
                        .map(|(i, &edge)| (edge, PolygonOnTriangulation::new(vec![i, (i + 1) % n])))
                        .collect();
                    (triangulation, polygons)
                }
                FaceSource::Prepared {
                    triangulation,
                    polygons,
                } => (triangulation.clone(), polygons.clone()),
            };
            trace!(
                nodes = triangulation.node_count(),
                triangles = triangulation.triangle_count(),
                "meshed face"
            );
            for (edge, polygon) in polygons {
                self.polygons.insert((edge, face), polygon);
            }
            self.meshes.insert(face, triangulation);
        }
        debug!(linear_deflection, angular_deflection, parallel, "memory kernel meshing done");
        Ok(())
    }

    fn solid_count(&self, shape: &ShapeId) -> usize {
        let mut count = 0;
        let mut stack = vec![*shape];
        while let Some(id) = stack.pop() {
            match self.shapes.get(id) {
                Some(ShapeData::Solid(_)) => count += 1,
                Some(ShapeData::Compound(children)) => stack.extend(children.iter().copied()),
                _ => {}
            }
        }
        count
    }

    fn faces(&self, shape: &ShapeId) -> Vec<FaceId> {
        let mut faces = Vec::new();
        self.walk(*shape, &mut faces, &mut Vec::new());
        faces
    }

    fn edges(&self, shape: &ShapeId) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        self.walk(*shape, &mut Vec::new(), &mut edges);
        edges
    }

    fn faces_adjacent_to(&self, shape: &ShapeId, edge: &EdgeId) -> Vec<FaceId> {
        self.faces(shape)
            .into_iter()
            .filter(|face| {
                self.faces
                    .get(*face)
                    .is_some_and(|data| data.edges.contains(edge))
            })
            .collect()
    }

    fn orientation(&self, face: &FaceId) -> Orientation {
        self.faces
            .get(*face)
            .map_or(Orientation::Forward, |data| data.orientation)
    }

    fn triangulation(&self, face: &FaceId) -> Option<(&Triangulation, Location)> {
        let location = self.faces.get(*face)?.location;
        self.meshes.get(*face).map(|t| (t, location))
    }

    fn surface_normal(&self, face: &FaceId, u: f64, v: f64) -> Vector3 {
        let Some(data) = self.faces.get(*face) else {
            return Vector3::zeros();
        };
        let normal = data.location.transform_vector(&data.surface.normal(u, v));
        if data.orientation == Orientation::Reversed {
            -normal
        } else {
            normal
        }
    }

    fn polygon_on_triangulation(
        &self,
        edge: &EdgeId,
        face: &FaceId,
    ) -> Option<&PolygonOnTriangulation> {
        self.polygons.get(&(*edge, *face))
    }

    fn discretize(
        &self,
        edge: &EdgeId,
        deflection: f64,
    ) -> std::result::Result<Vec<Point3>, KernelError> {
        if !is_positive_finite(deflection) {
            return Err(KernelError::Sampling(format!(
                "deflection must be positive and finite, got {deflection}"
            )));
        }
        match self.edges.get(*edge) {
            Some(Some(curve)) => curve.sample(deflection),
            Some(None) => Err(KernelError::Sampling("edge has no 3D curve".into())),
            None => Err(KernelError::Sampling("edge not found".into())),
        }
    }

    fn structural_hash(&self, shape: &ShapeId) -> u64 {
        let mut hasher = DefaultHasher::new();
        shape.hash(&mut hasher);
        hasher.finish()
    }

    fn make_compound(&mut self, shapes: &[ShapeId]) -> ShapeId {
        self.add_compound(shapes.to_vec())
    }
}

/// Orthonormal in-plane axes for `normal`, with `u × v = normal`.
fn plane_frame(normal: &Vector3) -> (Vector3, Vector3) {
    let normal = normal.normalize();
    let reference = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let v_dir = normal.cross(&reference).normalize();
    let u_dir = v_dir.cross(&normal);
    (u_dir, v_dir)
}

/// Triangulates a planar polygon with a constrained Delaunay triangulation.
///
/// Nodes keep the boundary order, so node `i` is `boundary[i]`.
fn mesh_planar_face(
    origin: &Point3,
    u_dir: &Vector3,
    v_dir: &Vector3,
    boundary: &[Point3],
) -> std::result::Result<Triangulation, KernelError> {
    let uv: Vec<Point2> = boundary
        .iter()
        .map(|p| {
            let d = p - origin;
            Point2::new(d.dot(u_dir), d.dot(v_dir))
        })
        .collect();

    let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
    let handles = insert_constraint_loop(&mut cdt, &uv)?;
    let node_of: HashMap<usize, usize> = handles
        .iter()
        .enumerate()
        .map(|(node, handle)| (handle.index(), node))
        .collect();

    let interior = classify_interior_faces(&cdt);
    let mut triangles = Vec::new();
    for face in cdt.inner_faces() {
        if !interior[face.fix().index()] {
            continue;
        }
        let mut triangle = [0usize; 3];
        for (slot, vertex) in face.vertices().iter().enumerate() {
            triangle[slot] = *node_of.get(&vertex.fix().index()).ok_or_else(|| {
                KernelError::Meshing("triangulation introduced an extra vertex".into())
            })?;
        }
        triangles.push(triangle);
    }

    Triangulation::new(boundary.to_vec(), triangles)
        .and_then(|t| t.with_uv_nodes(uv))
        .map_err(|e| KernelError::Meshing(e.to_string()))
}

/// Inserts a closed boundary loop as constraint edges, returning the vertex
/// handles in loop order.
fn insert_constraint_loop(
    cdt: &mut ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    points: &[Point2],
) -> std::result::Result<Vec<FixedVertexHandle>, KernelError> {
    let mut handles = Vec::with_capacity(points.len());
    for p in points {
        let h = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| KernelError::Meshing(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(KernelError::Meshing("boundary intersects itself".into()));
        }
        cdt.add_constraint(from, to);
    }

    Ok(handles)
}

/// Marks every face of `cdt` as inside the constraint loop or not, indexed by
/// face index.
///
/// Walks in from the hull; crossing a constraint edge flips the side.
fn classify_interior_faces(cdt: &ConstrainedDelaunayTriangulation<SpadePoint2<f64>>) -> Vec<bool> {
    let mut side: Vec<Option<bool>> = vec![None; cdt.num_all_faces()];
    let outer = cdt.outer_face().fix();
    side[outer.index()] = Some(false);

    let mut stack: Vec<_> = cdt
        .directed_edges()
        .filter(|edge| edge.face().fix() == outer)
        .map(|edge| (edge, false))
        .collect();
    while let Some((edge, from_inside)) = stack.pop() {
        let Some(face) = edge.rev().face().as_inner() else {
            continue;
        };
        let slot = &mut side[face.fix().index()];
        if slot.is_some() {
            continue;
        }
        let inside = from_inside ^ cdt.is_constraint_edge(edge.as_undirected().fix());
        *slot = Some(inside);
        stack.extend(face.adjacent_edges().into_iter().map(|next| (next, inside)));
    }

    side.into_iter().map(|s| s == Some(true)).collect()
}
