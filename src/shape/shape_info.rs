//! The flat shape-info encoding
//!
//! Every array's metadata travels through kernels as one `i64` buffer:
//!
//! ```text
//! [rank, shape[0] .. shape[rank-1], strides[0] .. strides[rank-1], extra, ews, order]
//! ```
//!
//! The buffer has `2 * rank + 4` words. `extra` packs the dtype code in
//! its low byte and the empty flag in bit 8. `ews` is the element-wise
//! stride: 1 for dense linear traversal, `k > 1` for a uniform stepped
//! traversal, 0 when no linear traversal exists. `order` holds the ASCII
//! code of `'c'` or `'f'`.
//!
//! The accessors in this module index directly and expect a well-formed
//! buffer (anything produced by this crate qualifies); the strict decoding
//! path is [`ShapeDescriptor::from_shape_info`](super::ShapeDescriptor::from_shape_info).

use super::{Order, Shape, Strides};
use crate::dtype::DType;

/// Bit of the `extra` word marking an empty array
pub const EMPTY_BIT: i64 = 1 << 8;

/// Mask of the `extra` word carrying the dtype code
pub const DTYPE_MASK: i64 = 0xFF;

/// Number of `i64` words in a shape-info buffer of the given rank
#[inline]
pub const fn shape_info_length(rank: usize) -> usize {
    2 * rank + 4
}

/// Rank stored in the leading word
#[inline]
pub fn rank(shape_info: &[i64]) -> usize {
    shape_info[0] as usize
}

/// Extent words
#[inline]
pub fn shape(shape_info: &[i64]) -> &[i64] {
    let r = rank(shape_info);
    &shape_info[1..1 + r]
}

/// Stride words
#[inline]
pub fn strides(shape_info: &[i64]) -> &[i64] {
    let r = rank(shape_info);
    &shape_info[1 + r..1 + 2 * r]
}

/// The packed `extra` word
#[inline]
pub fn extra(shape_info: &[i64]) -> i64 {
    shape_info[shape_info_length(rank(shape_info)) - 3]
}

/// Element-wise stride word
#[inline]
pub fn ews(shape_info: &[i64]) -> i64 {
    shape_info[shape_info_length(rank(shape_info)) - 2]
}

/// Order word, decoded leniently: anything but `'f'` reads as `Order::C`
#[inline]
pub fn order(shape_info: &[i64]) -> Order {
    if shape_info[shape_info_length(rank(shape_info)) - 1] == Order::F.code() {
        Order::F
    } else {
        Order::C
    }
}

/// Dtype code of the `extra` word, `None` when it names no known dtype
#[inline]
pub fn dtype(shape_info: &[i64]) -> Option<DType> {
    DType::try_from_code((extra(shape_info) & DTYPE_MASK) as u8)
}

/// Whether the `extra` word carries the empty flag
#[inline]
pub fn is_empty(shape_info: &[i64]) -> bool {
    extra(shape_info) & EMPTY_BIT != 0
}

/// Total element count: product of extents, 0 for empty arrays, 1 for
/// scalars
pub fn arr_length(shape_info: &[i64]) -> i64 {
    if is_empty(shape_info) {
        0
    } else {
        shape(shape_info).iter().product()
    }
}

/// Pack a dtype code and empty flag into an `extra` word
#[inline]
pub const fn pack_extra(dtype: DType, empty: bool) -> i64 {
    let mut word = dtype.code() as i64;
    if empty {
        word |= EMPTY_BIT;
    }
    word
}

/// Compute dense strides for a shape in the given order
///
/// Row-major strides are suffix products, column-major strides are prefix
/// products. A zero extent zeroes every stride it feeds, which is
/// harmless: such shapes describe empty arrays.
pub fn compute_strides(order: Order, shape: &[i64]) -> Strides {
    let mut strides: Strides = Strides::with_capacity(shape.len());
    let mut stride = 1i64;

    match order {
        Order::C => {
            for &dim in shape.iter().rev() {
                strides.push(stride);
                stride *= dim;
            }
            strides.reverse();
        }
        Order::F => {
            for &dim in shape.iter() {
                strides.push(stride);
                stride *= dim;
            }
        }
    }

    strides
}

/// Compute strides for a shape whose dims are padded out to
/// `shape[i] + paddings[i]` allocated extents
///
/// Missing trailing paddings count as zero.
pub fn compute_padded_strides(order: Order, shape: &[i64], paddings: &[i64]) -> Strides {
    let padded: Shape = shape
        .iter()
        .enumerate()
        .map(|(i, &dim)| dim + paddings.get(i).copied().unwrap_or(0))
        .collect();
    compute_strides(order, &padded)
}

/// Classify the element-wise stride of a (shape, strides) pair
///
/// Returns 1 when the layout is dense in either order (unit dims are
/// ignored for the contiguity check), the single non-unit dim's stride
/// when the array is a common vector, and 0 otherwise. Scalars and empty
/// shapes classify as 1: their traversal is vacuous.
pub fn compute_ews(shape: &[i64], strides: &[i64]) -> i64 {
    if shape.is_empty() || shape.contains(&0) {
        return 1;
    }
    if is_dense(Order::C, shape, strides) || is_dense(Order::F, shape, strides) {
        return 1;
    }

    let mut non_unit = None;
    for (i, &dim) in shape.iter().enumerate() {
        if dim != 1 {
            if non_unit.is_some() {
                return 0;
            }
            non_unit = Some(i);
        }
    }
    match non_unit {
        Some(i) if strides[i] > 0 => strides[i],
        _ => 0,
    }
}

/// Whether strides describe a dense packing of the shape in `order`,
/// ignoring unit dims
fn is_dense(order: Order, shape: &[i64], strides: &[i64]) -> bool {
    let mut expected = 1i64;
    let mut check = |i: usize| {
        if shape[i] == 1 {
            return true;
        }
        if strides[i] != expected {
            return false;
        }
        expected *= shape[i];
        true
    };

    match order {
        Order::C => (0..shape.len()).rev().all(&mut check),
        Order::F => (0..shape.len()).all(&mut check),
    }
}
