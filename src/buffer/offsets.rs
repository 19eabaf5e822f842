//! ConstantOffsetsBuffer: cached offset tables with the same residency
//! semantics as shape buffers

use super::ConstantDataBuffer;
use crate::error::Result;
use crate::runtime::Runtime;

/// An immutable table of element offsets with host/device residency
///
/// Offsets are element-unit displacements from a base array's origin.
/// This is a thin wrapper fixing the element type of a
/// [`ConstantDataBuffer`] to `i64`.
pub struct ConstantOffsetsBuffer<R: Runtime> {
    buffer: ConstantDataBuffer<R>,
}

impl<R: Runtime> ConstantOffsetsBuffer<R> {
    /// Create an offsets buffer holding a copy of `offsets` on the host
    pub fn from_offsets(offsets: &[i64], device: &R::Device) -> Self {
        Self {
            buffer: ConstantDataBuffer::from_elements(offsets, device),
        }
    }

    /// Host view of the offset table
    #[inline]
    pub fn primary(&self) -> &[i64] {
        self.buffer.primary_as()
    }

    /// Host address of the table
    #[inline]
    pub fn primary_ptr(&self) -> u64 {
        self.buffer.primary_ptr()
    }

    /// Device replica address, if one has been materialized
    #[inline]
    pub fn special(&self) -> Option<u64> {
        self.buffer.special()
    }

    /// Get or create the device replica
    pub fn materialize_special(&self) -> Result<u64> {
        self.buffer.materialize_special()
    }

    /// Address of the replica the executing platform reads
    pub fn platform_ptr(&self) -> Result<u64> {
        self.buffer.platform_ptr()
    }

    /// Number of offsets
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the table holds no offsets
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The underlying constant buffer
    #[inline]
    pub fn buffer(&self) -> &ConstantDataBuffer<R> {
        &self.buffer
    }

    /// Check whether two handles share the same storage
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.buffer.ptr_eq(&other.buffer)
    }
}

impl<R: Runtime> Clone for ConstantOffsetsBuffer<R> {
    /// Clone shares the storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<R: Runtime> std::fmt::Debug for ConstantOffsetsBuffer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantOffsetsBuffer")
            .field("len", &self.len())
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::CpuRuntime;
    use crate::runtime::Runtime;

    #[test]
    fn test_offsets_roundtrip() {
        let device = CpuRuntime::default_device();
        let table = ConstantOffsetsBuffer::<CpuRuntime>::from_offsets(&[0, 1, 2, 3], &device);
        assert_eq!(table.len(), 4);
        assert_eq!(table.primary(), &[0, 1, 2, 3]);
        assert_eq!(table.buffer().dtype(), crate::dtype::DType::I64);
    }

    #[test]
    fn test_empty_offsets() {
        let device = CpuRuntime::default_device();
        let table = ConstantOffsetsBuffer::<CpuRuntime>::from_offsets(&[], &device);
        assert!(table.is_empty());
        assert_eq!(table.primary(), &[] as &[i64]);
    }
}
