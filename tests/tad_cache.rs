//! Integration tests for the TAD cache
//!
//! Covers the decomposition semantics end to end, interning, and the
//! coupling between the TAD cache and the shape cache.

mod common;

use common::create_cpu_client;
use shapr::cache::{CacheContext, TadDescriptor};
use shapr::dtype::DType;
use shapr::error::Error;
use shapr::runtime::cpu::CpuRuntime;
use shapr::shape::{Order, ShapeDescriptor};

fn shape_info(shape: &[i64]) -> Vec<i64> {
    ShapeDescriptor::from_shape(DType::F32, Order::C, shape).to_shape_info()
}

// =============================================================================
// Decomposition semantics
// =============================================================================

#[test]
fn middle_dim_of_2x3x4() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();

    let pack = context
        .tads()
        .tad_for_dimensions(&shape_info(&[2, 3, 4]), &[1], &device)
        .unwrap();

    assert_eq!(pack.number_of_tads(), 8);
    assert_eq!(pack.primary_offsets(), [0, 1, 2, 3, 12, 13, 14, 15]);

    let tad = ShapeDescriptor::from_shape_info(pack.primary_shape_info()).unwrap();
    assert_eq!(tad.rank(), 1);
    assert_eq!(tad.shape(), [3]);
    assert_eq!(tad.strides(), [4]);
    assert_eq!(tad.dtype(), DType::F32);
    assert_eq!(tad.order(), Order::C);
}

#[test]
fn leading_dims_of_2x3x4() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();

    let pack = context
        .tads()
        .tad_for_dimensions(&shape_info(&[2, 3, 4]), &[0, 1], &device)
        .unwrap();

    assert_eq!(pack.number_of_tads(), 4);
    assert_eq!(pack.primary_offsets(), [0, 1, 2, 3]);

    let tad = ShapeDescriptor::from_shape_info(pack.primary_shape_info()).unwrap();
    assert_eq!(tad.shape(), [2, 3]);
    assert_eq!(tad.strides(), [12, 4]);
}

#[test]
fn trailing_dim_of_f_order_base() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();
    let base = ShapeDescriptor::from_shape(DType::F64, Order::F, &[2, 3]).to_shape_info();

    let pack = context
        .tads()
        .tad_for_dimensions(&base, &[1], &device)
        .unwrap();

    // f-order strides of [2, 3] are [1, 2]; tads step over dim 0
    assert_eq!(pack.number_of_tads(), 2);
    assert_eq!(pack.primary_offsets(), [0, 1]);
    let tad = ShapeDescriptor::from_shape_info(pack.primary_shape_info()).unwrap();
    assert_eq!(tad.shape(), [3]);
    assert_eq!(tad.strides(), [2]);
}

#[test]
fn keep_unities_preserves_base_rank() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();

    let pack = context
        .tads()
        .tad_for_dimensions_keep_unities(&shape_info(&[2, 3, 4]), &[1], &device)
        .unwrap();

    assert_eq!(pack.number_of_tads(), 8);
    assert_eq!(pack.primary_offsets(), [0, 1, 2, 3, 12, 13, 14, 15]);

    let tad = ShapeDescriptor::from_shape_info(pack.primary_shape_info()).unwrap();
    assert_eq!(tad.rank(), 3);
    assert_eq!(tad.shape(), [1, 3, 1]);
    assert_eq!(tad.strides(), [12, 4, 1]);
}

#[test]
fn degenerate_axes_yield_the_whole_array() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();
    let info = shape_info(&[2, 3, 4]);

    for axis in [&[] as &[usize], &[0, 1, 2]] {
        let pack = context
            .tads()
            .tad_for_dimensions(&info, axis, &device)
            .unwrap();
        assert_eq!(pack.number_of_tads(), 1);
        assert_eq!(pack.primary_offsets(), [0]);
        assert_eq!(pack.primary_shape_info(), info);
    }
}

#[test]
fn empty_base_yields_zero_tads() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();

    let pack = context
        .tads()
        .tad_for_dimensions(&shape_info(&[2, 0, 4]), &[1], &device)
        .unwrap();

    assert_eq!(pack.number_of_tads(), 0);
    assert!(pack.primary_offsets().is_empty());
    assert!(pack.offsets().is_empty());
}

// =============================================================================
// Interning
// =============================================================================

#[test]
fn identical_requests_share_one_pack() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();
    let info = shape_info(&[2, 3, 4]);

    let first = context
        .tads()
        .tad_for_dimensions(&info, &[1], &device)
        .unwrap();
    let second = context
        .tads()
        .tad_for_dimensions(&info, &[1], &device)
        .unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(
        first.shapes().primary_ptr(),
        second.shapes().primary_ptr()
    );
    assert_eq!(context.tads().total_cached_entries(), 1);
}

#[test]
fn axis_order_does_not_split_entries() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();
    let info = shape_info(&[2, 3, 4]);

    let forward = context
        .tads()
        .tad_for_dimensions(&info, &[0, 2], &device)
        .unwrap();
    let backward = context
        .tads()
        .tad_for_dimensions(&info, &[2, 0], &device)
        .unwrap();

    assert!(forward.ptr_eq(&backward));
    assert_eq!(context.tads().total_cached_entries(), 1);
}

#[test]
fn pack_shape_buffer_is_interned_in_shape_cache() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();

    let pack = context
        .tads()
        .tad_for_dimensions(&shape_info(&[2, 3, 4]), &[1], &device)
        .unwrap();
    let tad = ShapeDescriptor::from_shape_info(pack.primary_shape_info()).unwrap();
    let direct = context
        .shapes()
        .buffer_for_descriptor(&tad, &device)
        .unwrap();

    assert!(pack.shapes().ptr_eq(&direct));
}

#[test]
fn descriptor_path_matches_dimension_path() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();
    let base = ShapeDescriptor::from_shape(DType::F32, Order::C, &[2, 3, 4]);

    let by_dims = context
        .tads()
        .tad_for_dimensions(&base.to_shape_info(), &[1], &device)
        .unwrap();
    let descriptor = TadDescriptor::new(base, &[1], false).unwrap();
    let by_descriptor = context
        .tads()
        .tad_for_descriptor(&descriptor, &device)
        .unwrap();

    assert!(by_dims.ptr_eq(&by_descriptor));
    assert_eq!(descriptor.axis(), [1]);
    assert!(!descriptor.keep_unities());
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn bad_axes_cache_nothing() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();
    let info = shape_info(&[2, 3, 4]);

    let err = context
        .tads()
        .tad_for_dimensions(&info, &[3], &device)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDimension { dim: 3, rank: 3 }));

    let err = context
        .tads()
        .tad_for_dimensions(&info, &[1, 1], &device)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDimension { .. }));

    assert_eq!(context.tads().total_cached_entries(), 0);
    assert_eq!(context.shapes().total_cached_entries(), 0);
}

#[test]
fn malformed_base_rejected() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();

    let err = context
        .tads()
        .tad_for_dimensions(&[9, 9], &[0], &device)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedShapeInfo { .. }));
    assert_eq!(context.tads().total_cached_entries(), 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_tad_requests_intern_to_one_entry() {
    let (_client, device) = create_cpu_client();
    let context = CacheContext::<CpuRuntime>::new();
    let info = shape_info(&[2, 3, 4]);

    let packs: Vec<_> = std::thread::scope(|scope| {
        let threads: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    context
                        .tads()
                        .tad_for_dimensions(&info, &[1], &device)
                        .unwrap()
                })
            })
            .collect();
        threads.into_iter().map(|t| t.join().unwrap()).collect()
    });

    for other in &packs[1..] {
        assert!(packs[0].ptr_eq(other));
    }
    assert_eq!(context.tads().total_cached_entries(), 1);
}
