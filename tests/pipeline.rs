#![allow(clippy::unwrap_used)]

use brepmesh::kernel::memory::{EdgeCurve, FaceSurface, PreparedFace};
use brepmesh::kernel::{Kernel, Location, MemoryKernel, Orientation, PolygonOnTriangulation, Triangulation};
use brepmesh::math::{Point2, Point3, Vector3};
use brepmesh::tessellation::{bbox_edges, tessellate, DiscretizeEdge, DEFAULT_DEVIATION};
use brepmesh::{compute_quality, BoundingBox, TessellationCache, TessellationParams};
use std::f64::consts::FRAC_PI_2;

/// A quarter sphere patch with uv nodes, to exercise curved-surface normals.
fn sphere_patch() -> Triangulation {
    let uv = vec![
        Point2::new(0.0, 0.0),
        Point2::new(FRAC_PI_2, 0.0),
        Point2::new(0.0, FRAC_PI_2 - 1e-3),
    ];
    let nodes = uv
        .iter()
        .map(|p| Point3::new(p.y.cos() * p.x.cos(), p.y.cos() * p.x.sin(), p.y.sin()))
        .collect();
    Triangulation::new(nodes, vec![[0, 1, 2]])
        .unwrap()
        .with_uv_nodes(uv)
        .unwrap()
}

#[test]
fn quality_from_mesh_bounds_drives_tessellation() {
    let mut kernel = MemoryKernel::new();
    let solid = kernel
        .add_box(Point3::new(-5.0, -5.0, 0.0), Point3::new(5.0, 5.0, 20.0))
        .unwrap();

    let corners = [Point3::new(-5.0, -5.0, 0.0), Point3::new(5.0, 5.0, 20.0)];
    let bb = BoundingBox::from_points(&corners).unwrap();
    let quality = compute_quality(&bb, DEFAULT_DEVIATION);
    assert!((quality - 0.013).abs() < 1e-12);

    let cache = TessellationCache::default();
    let result = cache
        .tessellate(&mut kernel, &[solid], &TessellationParams::new(quality, 0.2))
        .unwrap();
    assert_eq!(result.vertex_count(), 24);
    assert_eq!(result.normals.len(), result.vertices.len());
}

#[test]
fn indices_never_reach_later_faces() {
    let mut kernel = MemoryKernel::new();
    let solid = kernel
        .add_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
        .unwrap();
    let extra = kernel
        .add_polygon_face(
            vec![
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(5.0, 1.0, 0.0),
                Point3::new(4.0, 2.0, 0.0),
                Point3::new(3.0, 1.0, 0.0),
            ],
            Orientation::Reversed,
        )
        .unwrap();
    let shell = kernel.add_shell(vec![extra]);

    let result = tessellate(&mut kernel, &[solid, shell], &TessellationParams::default()).unwrap();
    assert_eq!(result.vertex_count(), 24 + 5);
    assert_eq!(result.triangle_count(), 12 + 3);

    // Each face occupies a contiguous node range; its triangles stay inside it.
    let mut start = 0u32;
    let mut triangles = result.triangles.chunks(3);
    let compound = kernel.add_compound(vec![solid, shell]);
    for face in kernel.faces(&compound) {
        let (tri, _) = kernel.triangulation(&face).unwrap();
        let end = start + tri.node_count() as u32;
        for _ in 0..tri.triangle_count() {
            let t = triangles.next().unwrap();
            assert!(t.iter().all(|&i| (start..end).contains(&i)));
        }
        start = end;
    }
    assert_eq!(start as usize, result.vertex_count());
}

#[test]
fn reversed_planar_face_flips_winding_and_normal() {
    let mut kernel = MemoryKernel::new();
    let boundary = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let forward = kernel
        .add_polygon_face(boundary.clone(), Orientation::Forward)
        .unwrap();
    let reversed = kernel
        .add_polygon_face(boundary, Orientation::Reversed)
        .unwrap();
    let forward = kernel.add_shell(vec![forward]);
    let reversed = kernel.add_shell(vec![reversed]);
    let params = TessellationParams::default();

    let f = tessellate(&mut kernel, &[forward], &params).unwrap();
    let r = tessellate(&mut kernel, &[reversed], &params).unwrap();
    assert_eq!(f.triangles.len(), 3);
    assert_eq!(r.triangles, vec![f.triangles[0], f.triangles[2], f.triangles[1]]);
    assert!((f.normals[2] - 1.0).abs() < 1e-6);
    assert!((r.normals[2] + 1.0).abs() < 1e-6);
}

#[test]
fn curved_prepared_face_with_wireframe() {
    let mut kernel = MemoryKernel::new();
    let arc = kernel.add_edge(Some(EdgeCurve::circle(
        Point3::origin(),
        Vector3::z(),
        1.0,
        0.0,
        FRAC_PI_2,
    )));
    let meridian = kernel.add_edge(None);
    let face = kernel.add_prepared_face(
        PreparedFace::new(sphere_patch())
            .surface(FaceSurface::Sphere)
            .location(Location::from_translation(Vector3::new(0.0, 0.0, 1.0)))
            .edge(arc, Some(PolygonOnTriangulation::new(vec![0, 1])))
            .edge(meridian, None),
    );
    let shell = kernel.add_shell(vec![face]);

    let result = tessellate(&mut kernel, &[shell], &TessellationParams::default()).unwrap();
    assert_eq!(result.vertex_count(), 3);
    assert_eq!(result.normal_count(), 3);
    for (n, v) in result.normals.chunks(3).zip(result.vertices.chunks(3)) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
        // Unit sphere centred at (0, 0, 1): the normal is the offset from the centre.
        assert!((n[2] - (v[2] - 1.0)).abs() < 1e-5);
    }
    assert_eq!(result.segment_count(), 1);
    assert_eq!(&result.edges[..3], &[1.0, 0.0, 1.0]);

    // The arc can also be discretized on its own; the meridian has no curve.
    let arc_segments = DiscretizeEdge::new(&arc, 0.01).execute(&kernel).unwrap();
    assert!(arc_segments.len() / 6 > 1);
    assert!(DiscretizeEdge::new(&meridian, 0.01).execute(&kernel).is_err());
}

#[test]
fn normals_are_empty_or_aligned() {
    let mut kernel = MemoryKernel::new();
    let plain = Triangulation::new(
        vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
        vec![[0, 1, 2]],
    )
    .unwrap();
    let a = kernel.add_prepared_face(PreparedFace::new(plain));
    let b = kernel.add_prepared_face(PreparedFace::new(sphere_patch()).surface(FaceSurface::Sphere));
    let solid = kernel.add_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).unwrap();
    let params = TessellationParams::default();

    let only_plain = kernel.add_shell(vec![a]);
    let only_uv = kernel.add_shell(vec![b]);
    let mixed = kernel.add_shell(vec![a, b]);
    for shapes in [vec![only_plain], vec![only_uv], vec![mixed], vec![solid, mixed]] {
        let result = tessellate(&mut kernel, &shapes, &params).unwrap();
        assert!(result.normals.is_empty() || result.normals.len() == result.vertices.len());
    }
}

#[test]
fn bbox_wireframe_starts_on_xmax_ymax() {
    let edges = bbox_edges(&BoundingBox::new(0.0, 1.0, 0.0, 1.0, 0.0, 1.0));
    assert_eq!(&edges[..6], &[1.0, 1.0, 0.0, 1.0, 1.0, 1.0]);
    assert_eq!(edges.len(), 24 * 3);
}
