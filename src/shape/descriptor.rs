//! ShapeDescriptor: the structural identity of an array's metadata

use std::fmt;

use super::shape_info::{
    self, compute_ews, compute_padded_strides, compute_strides, pack_extra, shape_info_length,
    DTYPE_MASK, EMPTY_BIT,
};
use super::{Order, Shape, Strides, MAX_RANK};
use crate::dtype::DType;
use crate::error::{Error, Result};

/// Immutable structural key describing an array's metadata
///
/// Two arrays with equal descriptors share rank, extents, strides,
/// element-wise stride, order, dtype and emptiness, and can therefore
/// share one cached shape-info buffer. Descriptors order lexicographically
/// over `(rank, shape, strides, ews, order, dtype, empty)`; that total
/// order is what keys the cache maps.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeDescriptor {
    /// Number of dimensions
    rank: usize,
    /// Extent along each dimension
    shape: Shape,
    /// Element stride along each dimension
    strides: Strides,
    /// Element-wise stride classification (1 dense, k stepped, 0 none)
    ews: i64,
    /// Physical element ordering
    order: Order,
    /// Element type
    dtype: DType,
    /// Empty-array flag: zero elements regardless of the extents
    empty: bool,
}

impl ShapeDescriptor {
    /// Create a descriptor from explicit shape and strides
    ///
    /// When `ews` is `None` the element-wise stride is classified from the
    /// strides; a `Some` value is stored verbatim. The empty flag is set
    /// automatically when any extent is zero.
    pub fn new(
        dtype: DType,
        order: Order,
        shape: &[i64],
        strides: &[i64],
        ews: Option<i64>,
    ) -> Self {
        let shape: Shape = shape.iter().copied().collect();
        let strides: Strides = strides.iter().copied().collect();
        let ews = match ews {
            Some(value) => value,
            // classification needs matching vectors; a mismatch is caught
            // later by validate()
            None if shape.len() == strides.len() => compute_ews(&shape, &strides),
            None => 0,
        };
        let empty = shape.contains(&0);
        Self {
            rank: shape.len(),
            shape,
            strides,
            ews,
            order,
            dtype,
            empty,
        }
    }

    /// Create a descriptor with dense strides computed for `order`
    pub fn from_shape(dtype: DType, order: Order, shape: &[i64]) -> Self {
        let strides = compute_strides(order, shape);
        let shape: Shape = shape.iter().copied().collect();
        let empty = shape.contains(&0);
        Self {
            rank: shape.len(),
            shape,
            strides,
            ews: 1,
            order,
            dtype,
            empty,
        }
    }

    /// Decode a flat shape-info buffer back into a descriptor
    ///
    /// This is the strict boundary: truncated buffers, out-of-range ranks,
    /// negative extents, unknown dtype codes and unknown order codes all
    /// fail with [`Error::MalformedShapeInfo`].
    pub fn from_shape_info(shape_info: &[i64]) -> Result<Self> {
        if shape_info.is_empty() {
            return Err(Error::malformed_shape_info("buffer has no rank word"));
        }
        let rank_word = shape_info[0];
        if rank_word < 0 || rank_word as usize > MAX_RANK {
            return Err(Error::malformed_shape_info(format!(
                "rank word {rank_word} outside 0..={MAX_RANK}"
            )));
        }
        let rank = rank_word as usize;
        let expected_len = shape_info_length(rank);
        if shape_info.len() != expected_len {
            return Err(Error::malformed_shape_info(format!(
                "rank {rank} needs {expected_len} words, buffer has {}",
                shape_info.len()
            )));
        }

        let shape: Shape = shape_info[1..1 + rank].iter().copied().collect();
        if let Some(&bad) = shape.iter().find(|&&extent| extent < 0) {
            return Err(Error::malformed_shape_info(format!(
                "negative extent {bad}"
            )));
        }
        let strides: Strides = shape_info[1 + rank..1 + 2 * rank].iter().copied().collect();

        let extra = shape_info[expected_len - 3];
        let dtype = DType::try_from_code((extra & DTYPE_MASK) as u8).ok_or_else(|| {
            Error::malformed_shape_info(format!("unknown dtype code {}", extra & DTYPE_MASK))
        })?;
        let empty = extra & EMPTY_BIT != 0 || shape.contains(&0);
        let ews = shape_info[expected_len - 2];
        let order = Order::from_code(shape_info[expected_len - 1])?;

        Ok(Self {
            rank,
            shape,
            strides,
            ews,
            order,
            dtype,
            empty,
        })
    }

    /// Descriptor of a rank-0 scalar
    pub fn scalar(dtype: DType) -> Self {
        Self {
            rank: 0,
            shape: Shape::new(),
            strides: Strides::new(),
            ews: 1,
            order: Order::C,
            dtype,
            empty: false,
        }
    }

    /// Descriptor of a dense rank-1 vector
    pub fn vector(length: i64, dtype: DType) -> Self {
        Self::from_shape(dtype, Order::C, &[length])
    }

    /// Descriptor of a rank-0 empty array (the empty flag set, no extents)
    pub fn empty(dtype: DType) -> Self {
        Self {
            rank: 0,
            shape: Shape::new(),
            strides: Strides::new(),
            ews: 1,
            order: Order::C,
            dtype,
            empty: true,
        }
    }

    /// Descriptor of a buffer whose dims are allocated wider than their
    /// extents
    ///
    /// `paddings[i]` extra elements are reserved along dim `i` (missing
    /// trailing paddings count as zero). With any non-zero padding the
    /// layout has no linear traversal, so ews is 0 and
    /// [`alloc_length`](Self::alloc_length) exceeds
    /// [`arr_length`](Self::arr_length).
    pub fn padded_buffer(dtype: DType, order: Order, shape: &[i64], paddings: &[i64]) -> Self {
        let strides = compute_padded_strides(order, shape, paddings);
        let padded = paddings.iter().any(|&p| p > 0);
        let shape: Shape = shape.iter().copied().collect();
        let ews = if padded { 0 } else { compute_ews(&shape, &strides) };
        let empty = shape.contains(&0);
        Self {
            rank: shape.len(),
            shape,
            strides,
            ews,
            order,
            dtype,
            empty,
        }
    }

    /// Check the descriptor's structural invariants
    ///
    /// Fails when the rank exceeds [`MAX_RANK`] or the shape/stride
    /// vectors disagree with the rank. Cache entry points reject invalid
    /// descriptors before touching any map.
    pub fn validate(&self) -> Result<()> {
        if self.rank > MAX_RANK {
            return Err(Error::rank_exceeds_limit(self.rank));
        }
        if self.shape.len() != self.rank || self.strides.len() != self.rank {
            return Err(Error::ShapeStrideMismatch {
                shape_len: self.shape.len(),
                strides_len: self.strides.len(),
                rank: self.rank,
            });
        }
        Ok(())
    }

    /// Total element count: product of extents, 0 when empty, 1 for
    /// scalars
    pub fn arr_length(&self) -> i64 {
        if self.empty {
            0
        } else {
            self.shape.iter().product()
        }
    }

    /// Element count a backing buffer must provide: the linear span
    /// `1 + Σ (extent-1)·|stride|`
    ///
    /// Equals [`arr_length`](Self::arr_length) for dense layouts and
    /// exceeds it when strides are wider than tightly packed.
    pub fn alloc_length(&self) -> i64 {
        if self.empty {
            return 0;
        }
        let mut span = 1i64;
        for (&extent, &stride) in self.shape.iter().zip(self.strides.iter()) {
            span += (extent - 1) * stride.abs();
        }
        span
    }

    /// Encode into a flat shape-info buffer of `2*rank + 4` words
    pub fn to_shape_info(&self) -> Vec<i64> {
        let mut buffer = Vec::with_capacity(self.shape_info_len());
        buffer.push(self.rank as i64);
        buffer.extend_from_slice(&self.shape);
        buffer.extend_from_slice(&self.strides);
        buffer.push(pack_extra(self.dtype, self.empty));
        buffer.push(self.ews);
        buffer.push(self.order.code());
        buffer
    }

    /// Number of words [`to_shape_info`](Self::to_shape_info) produces
    #[inline]
    pub fn shape_info_len(&self) -> usize {
        shape_info_length(self.rank)
    }

    /// Number of dimensions
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Extent along each dimension
    #[inline]
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Element stride along each dimension
    #[inline]
    pub fn strides(&self) -> &[i64] {
        &self.strides
    }

    /// Element-wise stride classification
    #[inline]
    pub fn ews(&self) -> i64 {
        self.ews
    }

    /// Physical element ordering
    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Whether the empty flag is set
    #[inline]
    pub fn is_empty_array(&self) -> bool {
        self.empty
    }

    /// Whether this describes a rank-0 scalar
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.rank == 0 && !self.empty
    }

    /// Whether this describes a rank-1 vector
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.rank == 1
    }
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShapeDescriptor {{ rank: {}, shape: {:?}, strides: {:?}, ews: {}, order: {}, dtype: {}, empty: {} }}",
            self.rank,
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.ews,
            self.order,
            self.dtype,
            self.empty
        )
    }
}
