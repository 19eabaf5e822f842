//! TadPack: one cached tensor-along-dimension decomposition

use super::{ConstantDataBuffer, ConstantOffsetsBuffer};
use crate::error::Result;
use crate::runtime::Runtime;

/// A cached TAD decomposition: the tad shape-info buffer, the per-tad
/// offset table, and the tad count
///
/// The shape buffer is itself a shape-cache entry, so packs for different
/// axes over the same base can share it. Cloning shares both buffers.
pub struct TadPack<R: Runtime> {
    shapes: ConstantDataBuffer<R>,
    offsets: ConstantOffsetsBuffer<R>,
    num_tads: i64,
}

impl<R: Runtime> TadPack<R> {
    /// Assemble a pack from its cached parts
    pub fn new(
        shapes: ConstantDataBuffer<R>,
        offsets: ConstantOffsetsBuffer<R>,
        num_tads: i64,
    ) -> Self {
        Self {
            shapes,
            offsets,
            num_tads,
        }
    }

    /// Host view of the tad shape-info
    #[inline]
    pub fn primary_shape_info(&self) -> &[i64] {
        self.shapes.primary_as()
    }

    /// Host view of the offset table
    #[inline]
    pub fn primary_offsets(&self) -> &[i64] {
        self.offsets.primary()
    }

    /// Device replica of the tad shape-info, if materialized
    #[inline]
    pub fn special_shape_info(&self) -> Option<u64> {
        self.shapes.special()
    }

    /// Device replica of the offset table, if materialized
    #[inline]
    pub fn special_offsets(&self) -> Option<u64> {
        self.offsets.special()
    }

    /// Shape-info address for the executing platform (read-time branch)
    pub fn platform_shape_info(&self) -> Result<u64> {
        self.shapes.platform_ptr()
    }

    /// Offset-table address for the executing platform (read-time branch)
    pub fn platform_offsets(&self) -> Result<u64> {
        self.offsets.platform_ptr()
    }

    /// Number of tads tiling the base array
    #[inline]
    pub fn number_of_tads(&self) -> i64 {
        self.num_tads
    }

    /// Number of words in the tad shape-info buffer
    #[inline]
    pub fn shape_info_length(&self) -> usize {
        self.shapes.len()
    }

    /// The tad shape buffer
    #[inline]
    pub fn shapes(&self) -> &ConstantDataBuffer<R> {
        &self.shapes
    }

    /// The offset table buffer
    #[inline]
    pub fn offsets(&self) -> &ConstantOffsetsBuffer<R> {
        &self.offsets
    }

    /// Check whether two packs share both underlying buffers
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.shapes.ptr_eq(&other.shapes) && self.offsets.ptr_eq(&other.offsets)
    }
}

impl<R: Runtime> Clone for TadPack<R> {
    /// Clone shares both buffers (zero-copy)
    fn clone(&self) -> Self {
        Self {
            shapes: self.shapes.clone(),
            offsets: self.offsets.clone(),
            num_tads: self.num_tads,
        }
    }
}

impl<R: Runtime> std::fmt::Debug for TadPack<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TadPack")
            .field("num_tads", &self.num_tads)
            .field("shape_info", &self.primary_shape_info())
            .field("offsets_len", &self.offsets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::CpuRuntime;
    use crate::runtime::Runtime;

    #[test]
    fn test_pack_accessors() {
        let device = CpuRuntime::default_device();
        // tad shape [3] with stride 4, from a [2, 3, 4] c-order base
        let shape_info: Vec<i64> = vec![1, 3, 4, 1, 0, 99];
        let shapes = ConstantDataBuffer::<CpuRuntime>::from_elements(&shape_info, &device);
        let offsets =
            ConstantOffsetsBuffer::from_offsets(&[0, 1, 2, 3, 12, 13, 14, 15], &device);
        let pack = TadPack::new(shapes, offsets, 8);

        assert_eq!(pack.number_of_tads(), 8);
        assert_eq!(pack.shape_info_length(), 6);
        assert_eq!(pack.primary_shape_info(), shape_info.as_slice());
        assert_eq!(pack.primary_offsets(), &[0, 1, 2, 3, 12, 13, 14, 15]);
        assert_eq!(pack.special_shape_info(), None);
        assert_eq!(pack.special_offsets(), None);

        let copy = pack.clone();
        assert!(pack.ptr_eq(&copy));
    }

    #[test]
    fn test_platform_on_cpu() {
        let device = CpuRuntime::default_device();
        let shapes = ConstantDataBuffer::<CpuRuntime>::from_elements(&[0i64, 1, 1, 99], &device);
        let offsets = ConstantOffsetsBuffer::from_offsets(&[0], &device);
        let pack = TadPack::new(shapes, offsets, 1);

        assert_eq!(
            pack.platform_shape_info().unwrap(),
            pack.shapes().primary_ptr()
        );
        assert_eq!(
            pack.platform_offsets().unwrap(),
            pack.offsets().primary_ptr()
        );
    }
}
