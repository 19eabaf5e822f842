//! Sub-array geometry: TAD decompositions and derived descriptors
//!
//! Pure math over [`ShapeDescriptor`]s. The cache layer canonicalizes the
//! results; nothing here touches a map or a device.

use smallvec::SmallVec;

use super::{Dims, Shape, ShapeDescriptor, Strides, STACK_DIMS};
use crate::error::{Error, Result};

/// A computed tensor-along-dimension decomposition
pub struct TadDecomposition {
    /// Descriptor of a single tad
    pub descriptor: ShapeDescriptor,
    /// Element offset of each tad from the base array origin
    pub offsets: Vec<i64>,
    /// Number of tads tiling the base array
    pub num_tads: i64,
}

/// Require `axis` to be strictly increasing and within `0..rank`
///
/// Duplicates surface as a non-increasing pair.
pub fn check_axis(rank: usize, axis: &[usize]) -> Result<()> {
    for (i, &dim) in axis.iter().enumerate() {
        if dim >= rank {
            return Err(Error::invalid_dimension(dim, rank));
        }
        if i > 0 && axis[i - 1] >= dim {
            return Err(Error::invalid_dimension(dim, rank));
        }
    }
    Ok(())
}

/// Complement of `axis` in `0..rank`, ascending
pub fn dims_to_exclude(rank: usize, axis: &[usize]) -> Dims {
    let mut exclude = Dims::with_capacity(rank - axis.len());
    let mut next = axis.iter().copied().peekable();
    for dim in 0..rank {
        if next.peek() == Some(&dim) {
            next.next();
        } else {
            exclude.push(dim);
        }
    }
    exclude
}

/// Decompose `base` into tads spanning the dims in `axis`
///
/// `axis` must be sorted and unique (the tad descriptor normalizes it).
/// An empty axis and an axis covering every dim both yield one tad
/// coinciding with the whole array. With `keep_unities` the tad keeps the
/// base rank, carrying excluded dims as extent 1.
pub fn decompose(
    base: &ShapeDescriptor,
    axis: &[usize],
    keep_unities: bool,
) -> Result<TadDecomposition> {
    let rank = base.rank();
    check_axis(rank, axis)?;

    let degenerate = axis.is_empty() || axis.len() == rank;
    let descriptor = if degenerate {
        base.clone()
    } else {
        let (shape, strides) = select_dims(base, axis, keep_unities);
        ShapeDescriptor::new(base.dtype(), base.order(), &shape, &strides, None)
    };

    let base_len = base.arr_length();
    if base_len == 0 {
        // nothing to tile: zero tads, no offsets
        return Ok(TadDecomposition {
            descriptor,
            offsets: Vec::new(),
            num_tads: 0,
        });
    }
    if degenerate {
        return Ok(TadDecomposition {
            descriptor,
            offsets: vec![0],
            num_tads: 1,
        });
    }

    let tad_len: i64 = axis.iter().map(|&d| base.shape()[d]).product();
    if base_len % tad_len != 0 {
        return Err(Error::TadDecomposition {
            array_len: base_len,
            tad_len,
        });
    }

    let exclude = dims_to_exclude(rank, axis);
    let num_tads: i64 = exclude.iter().map(|&d| base.shape()[d]).product();
    let pairs: SmallVec<[(i64, i64); STACK_DIMS]> = exclude
        .iter()
        .map(|&d| (base.shape()[d], base.strides()[d]))
        .collect();
    let offsets = calc_offsets(&pairs, num_tads as usize);

    Ok(TadDecomposition {
        descriptor,
        offsets,
        num_tads,
    })
}

/// Descriptor of the sub-array selecting `dims` of `base`
///
/// Empty `dims` selects a point, i.e. a scalar; all dims select the whole
/// array.
pub fn sub_array_descriptor(base: &ShapeDescriptor, dims: &[usize]) -> Result<ShapeDescriptor> {
    check_axis(base.rank(), dims)?;
    if dims.is_empty() {
        return Ok(ShapeDescriptor::scalar(base.dtype()));
    }
    if dims.len() == base.rank() {
        return Ok(base.clone());
    }
    let (shape, strides) = select_dims(base, dims, false);
    Ok(ShapeDescriptor::new(
        base.dtype(),
        base.order(),
        &shape,
        &strides,
        None,
    ))
}

/// Descriptor broadcasting `min` against `max` by inserting unit dims
///
/// The result has `max`'s rank. `min`'s dims land at the positions in
/// `dims`, or right-aligned when `dims` is empty; every other dim gets
/// extent 1 with stride 0. Dtype and order come from `min`.
pub fn with_unities_for_broadcast(
    max: &ShapeDescriptor,
    min: &ShapeDescriptor,
    dims: &[usize],
) -> Result<ShapeDescriptor> {
    let max_rank = max.rank();
    let min_rank = min.rank();
    if min_rank > max_rank {
        return Err(Error::broadcast(min.shape(), max.shape()));
    }

    let positions: Dims = if dims.is_empty() {
        (max_rank - min_rank..max_rank).collect()
    } else {
        if dims.len() != min_rank {
            return Err(Error::broadcast(min.shape(), max.shape()));
        }
        check_axis(max_rank, dims)?;
        dims.iter().copied().collect()
    };

    let mut shape: Shape = SmallVec::from_elem(1, max_rank);
    let mut strides: Strides = SmallVec::from_elem(0, max_rank);
    for (i, &pos) in positions.iter().enumerate() {
        shape[pos] = min.shape()[i];
        strides[pos] = min.strides()[i];
    }

    Ok(ShapeDescriptor::new(
        min.dtype(),
        min.order(),
        &shape,
        &strides,
        None,
    ))
}

/// Descriptor with the listed unit dims excised, for reductions that
/// collapsed them
///
/// Every listed dim must exist and have extent 1.
pub fn with_no_unities_for_reduce(
    base: &ShapeDescriptor,
    dims_with_unities: &[usize],
) -> Result<ShapeDescriptor> {
    let rank = base.rank();
    check_axis(rank, dims_with_unities)?;
    for &dim in dims_with_unities {
        if base.shape()[dim] != 1 {
            return Err(Error::invalid_dimension(dim, rank));
        }
    }

    let keep = dims_to_exclude(rank, dims_with_unities);
    let shape: Shape = keep.iter().map(|&d| base.shape()[d]).collect();
    let strides: Strides = keep.iter().map(|&d| base.strides()[d]).collect();
    Ok(ShapeDescriptor::new(
        base.dtype(),
        base.order(),
        &shape,
        &strides,
        None,
    ))
}

/// Extent/stride pairs of the tad shape
fn select_dims(base: &ShapeDescriptor, axis: &[usize], keep_unities: bool) -> (Shape, Strides) {
    if keep_unities {
        let mut shape: Shape = base.shape().iter().copied().collect();
        let strides: Strides = base.strides().iter().copied().collect();
        let mut next = axis.iter().copied().peekable();
        for (dim, extent) in shape.iter_mut().enumerate() {
            if next.peek() == Some(&dim) {
                next.next();
            } else {
                *extent = 1;
            }
        }
        (shape, strides)
    } else {
        let shape: Shape = axis.iter().map(|&d| base.shape()[d]).collect();
        let strides: Strides = axis.iter().map(|&d| base.strides()[d]).collect();
        (shape, strides)
    }
}

/// Row-major odometer over (extent, stride) pairs
fn calc_offsets(dims: &[(i64, i64)], count: usize) -> Vec<i64> {
    let mut offsets = Vec::with_capacity(count);
    let n = dims.len();
    let mut idx: SmallVec<[i64; STACK_DIMS]> = SmallVec::from_elem(0, n);
    let mut current = 0i64;

    'outer: loop {
        offsets.push(current);
        let mut d = n;
        loop {
            if d == 0 {
                break 'outer;
            }
            d -= 1;
            idx[d] += 1;
            if idx[d] < dims[d].0 {
                current += dims[d].1;
                continue 'outer;
            }
            idx[d] = 0;
            current -= (dims[d].0 - 1) * dims[d].1;
        }
    }

    offsets
}
