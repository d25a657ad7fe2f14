#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::thread;

use brepmesh::error::{BrepMeshError, KernelError};
use brepmesh::kernel::memory::ShapeId;
use brepmesh::kernel::MemoryKernel;
use brepmesh::math::Point3;
use brepmesh::{CacheConfig, CacheKey, TessellationCache, TessellationParams};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn kernel_with_box() -> (MemoryKernel, ShapeId) {
    let mut kernel = MemoryKernel::new();
    let solid = kernel
        .add_box(Point3::origin(), Point3::new(10.0, 5.0, 2.0))
        .unwrap();
    (kernel, solid)
}

#[test]
fn second_identical_request_does_no_kernel_work() {
    init_tracing();
    let (mut kernel, solid) = kernel_with_box();
    let cache = TessellationCache::default();
    let params = TessellationParams::new(0.05, 0.2);

    let first = cache.tessellate(&mut kernel, &[solid], &params).unwrap();
    let second = cache.tessellate(&mut kernel, &[solid], &params).unwrap();

    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(kernel.mesh_calls(), 1);
    assert_eq!(kernel.clean_calls(), 1);
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn logging_flags_share_an_entry() {
    init_tracing();
    let (mut kernel, solid) = kernel_with_box();
    let cache = TessellationCache::default();
    let quiet = TessellationParams::new(0.05, 0.2);
    let noisy = TessellationParams {
        debug: true,
        progress: true,
        ..quiet
    };

    cache.tessellate(&mut kernel, &[solid], &quiet).unwrap();
    cache.tessellate(&mut kernel, &[solid], &noisy).unwrap();
    assert_eq!(kernel.mesh_calls(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn different_quality_does_not_alias() {
    init_tracing();
    let (mut kernel, solid) = kernel_with_box();
    let cache = TessellationCache::default();

    cache
        .tessellate(&mut kernel, &[solid], &TessellationParams::new(0.05, 0.2))
        .unwrap();
    cache
        .tessellate(&mut kernel, &[solid], &TessellationParams::new(0.01, 0.2))
        .unwrap();

    assert_eq!(kernel.mesh_calls(), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn shape_lists_differing_after_the_first_do_not_alias() {
    init_tracing();
    let mut kernel = MemoryKernel::new();
    let a = kernel.add_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).unwrap();
    let b = kernel
        .add_box(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0))
        .unwrap();
    let c = kernel
        .add_box(Point3::new(4.0, 0.0, 0.0), Point3::new(5.0, 2.0, 2.0))
        .unwrap();
    let params = TessellationParams::default();

    assert_ne!(
        CacheKey::new(&kernel, &[a, b], &params),
        CacheKey::new(&kernel, &[a, c], &params)
    );

    let cache = TessellationCache::default();
    let ab = cache.tessellate(&mut kernel, &[a, b], &params).unwrap();
    let ac = cache.tessellate(&mut kernel, &[a, c], &params).unwrap();
    assert_ne!(ab.vertices, ac.vertices);
    assert_eq!(kernel.mesh_calls(), 2);
}

#[test]
fn meshing_failure_is_not_cached() {
    init_tracing();
    let (mut kernel, solid) = kernel_with_box();
    let cache = TessellationCache::default();
    let params = TessellationParams::default();

    kernel.fail_meshing(Some("deflection not reached".into()));
    let err = cache.tessellate(&mut kernel, &[solid], &params).unwrap_err();
    assert!(matches!(err, BrepMeshError::Kernel(KernelError::Meshing(_))));
    assert!(cache.is_empty());
    assert!(!cache.contains(&CacheKey::new(&kernel, &[solid], &params)));

    kernel.fail_meshing(None);
    let result = cache.tessellate(&mut kernel, &[solid], &params).unwrap();
    assert_eq!(result.vertex_count(), 24);
    assert_eq!(kernel.mesh_calls(), 2);
    assert_eq!(cache.len(), 1);
}

#[test]
fn budget_evicts_older_results() {
    init_tracing();
    let (mut kernel, solid) = kernel_with_box();
    let params = TessellationParams::default();
    let sizing = TessellationCache::default();
    let weight = {
        use brepmesh::cache::CacheWeight;
        sizing.tessellate(&mut kernel, &[solid], &params).unwrap().weight()
    };

    let cache = TessellationCache::new(CacheConfig {
        capacity_bytes: weight,
    });
    let first = cache
        .tessellate(&mut kernel, &[solid], &TessellationParams::new(0.1, 0.2))
        .unwrap();
    cache
        .tessellate(&mut kernel, &[solid], &TessellationParams::new(0.2, 0.2))
        .unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.size_bytes(), weight);
    assert_eq!(cache.stats().evictions, 1);
    // The evicted result is still usable by whoever holds it.
    assert_eq!(first.vertex_count(), 24);
}

#[test]
fn concurrent_callers_mesh_once() {
    init_tracing();
    let cache = TessellationCache::default();
    let params = TessellationParams::new(0.05, 0.2);

    let (cache_ref, params_ref) = (&cache, &params);

    let mesh_calls: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(move || {
                    // Identical construction yields the same shape id, hence the same key.
                    let (mut kernel, solid) = kernel_with_box();
                    let result = cache_ref
                        .tessellate(&mut kernel, &[solid], params_ref)
                        .unwrap();
                    assert_eq!(result.vertex_count(), 24);
                    kernel.mesh_calls()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(mesh_calls, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().inserted, 1);
}
