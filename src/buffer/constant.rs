//! ConstantDataBuffer: dual-residency immutable data with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::runtime::Runtime;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// An immutable buffer with a host replica and a lazily created device
/// replica
///
/// The host replica is materialized at construction and lives as long as
/// any handle does. The device replica is created on first request,
/// exactly once, and released when the last handle drops. Cloning a
/// handle shares the underlying storage, so pointer identity can stand in
/// for structural equality.
pub struct ConstantDataBuffer<R: Runtime> {
    inner: Arc<BufferInner<R>>,
}

struct BufferInner<R: Runtime> {
    /// Host replica in 8-byte aligned word storage; the first
    /// `len * dtype.size_in_bytes()` bytes are live, the rest is zero pad
    words: Box<[u64]>,
    /// Number of elements (not bytes)
    len: usize,
    /// Element type
    dtype: DType,
    /// Device the special replica belongs to
    device: R::Device,
    /// Device replica, published at most once
    special: OnceLock<u64>,
    /// Serializes the one-shot device upload
    upload: Mutex<()>,
}

impl<R: Runtime> ConstantDataBuffer<R> {
    /// Create a buffer holding a copy of `data` on the host
    pub fn from_elements<T: Element>(data: &[T], device: &R::Device) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut words = vec![0u64; bytes.len().div_ceil(8)].into_boxed_slice();
        bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);

        Self {
            inner: Arc::new(BufferInner {
                words,
                len: data.len(),
                dtype: T::DTYPE,
                device: device.clone(),
                special: OnceLock::new(),
                upload: Mutex::new(()),
            }),
        }
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if the buffer holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get the size of one element in bytes
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.inner.dtype.size_in_bytes()
    }

    /// Get the live size in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.inner.len * self.inner.dtype.size_in_bytes()
    }

    /// Get the device the special replica belongs to
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.inner.device
    }

    /// Typed view of the host replica
    ///
    /// The element size of `T` must match the buffer's dtype; debug
    /// builds assert it, release builds reinterpret without re-validating.
    #[inline]
    pub fn primary_as<T: bytemuck::Pod>(&self) -> &[T] {
        debug_assert_eq!(
            std::mem::size_of::<T>(),
            self.elem_size(),
            "typed view of a {} buffer with a {}-byte element",
            self.inner.dtype,
            std::mem::size_of::<T>()
        );
        let bytes = &bytemuck::cast_slice::<u64, u8>(&self.inner.words)[..self.byte_len()];
        bytemuck::cast_slice(bytes)
    }

    /// Host address of the replica, in the kernel-ABI pointer convention
    #[inline]
    pub fn primary_ptr(&self) -> u64 {
        self.inner.words.as_ptr() as u64
    }

    /// Device replica address, if one has been materialized
    ///
    /// Never allocates.
    #[inline]
    pub fn special(&self) -> Option<u64> {
        self.inner.special.get().copied()
    }

    /// Get or create the device replica
    ///
    /// The first successful caller allocates device memory, uploads the
    /// host replica and publishes the pointer; concurrent callers block on
    /// the upload lock and observe the published pointer. Afterwards every
    /// call is a lock-free read. On allocation or copy failure nothing is
    /// published and the error is returned; a later call starts over.
    pub fn materialize_special(&self) -> Result<u64> {
        if let Some(&ptr) = self.inner.special.get() {
            return Ok(ptr);
        }

        let _guard = self.inner.upload.lock();
        if let Some(&ptr) = self.inner.special.get() {
            return Ok(ptr);
        }

        let size = self.padded_byte_len();
        let ptr = R::allocate(size, &self.inner.device)?;
        if size > 0 {
            let bytes: &[u8] = bytemuck::cast_slice(&self.inner.words);
            if let Err(e) = R::copy_to_device(bytes, ptr, &self.inner.device) {
                R::deallocate(ptr, size, &self.inner.device);
                return Err(e);
            }
        }
        let _ = self.inner.special.set(ptr);
        Ok(ptr)
    }

    /// Address of the replica the executing platform reads
    ///
    /// CPU runtimes resolve to the host replica; device runtimes
    /// materialize and resolve to the device replica. The branch is taken
    /// at read time, never cached.
    pub fn platform_ptr(&self) -> Result<u64> {
        if R::is_cpu() {
            Ok(self.primary_ptr())
        } else {
            self.materialize_special()
        }
    }

    /// Check whether two handles share the same storage
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Allocated host bytes including the zero pad; device allocations
    /// use the same size so deallocation matches
    #[inline]
    fn padded_byte_len(&self) -> usize {
        self.inner.words.len() * 8
    }
}

impl<R: Runtime> Clone for ConstantDataBuffer<R> {
    /// Clone shares the storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Runtime> Drop for BufferInner<R> {
    fn drop(&mut self) {
        if let Some(&ptr) = self.special.get() {
            if ptr != 0 {
                R::deallocate(ptr, self.words.len() * 8, &self.device);
            }
        }
    }
}

impl<R: Runtime> std::fmt::Debug for ConstantDataBuffer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantDataBuffer")
            .field("primary", &format!("0x{:x}", self.primary_ptr()))
            .field("special", &self.special().map(|p| format!("0x{p:x}")))
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::CpuRuntime;
    use crate::runtime::Runtime;

    fn device() -> <CpuRuntime as Runtime>::Device {
        CpuRuntime::default_device()
    }

    #[test]
    fn test_from_elements_roundtrip() {
        let data: Vec<i64> = vec![3, 2, 3, 4, 1, 1, 1, 99];
        let buffer = ConstantDataBuffer::<CpuRuntime>::from_elements(&data, &device());
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.dtype(), DType::I64);
        assert_eq!(buffer.elem_size(), 8);
        assert_eq!(buffer.byte_len(), 64);
        assert_eq!(buffer.primary_as::<i64>(), data.as_slice());
    }

    #[test]
    fn test_partial_word_padding() {
        let data: Vec<i32> = vec![1, 2, 3];
        let buffer = ConstantDataBuffer::<CpuRuntime>::from_elements(&data, &device());
        assert_eq!(buffer.byte_len(), 12);
        assert_eq!(buffer.primary_as::<i32>(), data.as_slice());
    }

    #[test]
    fn test_clone_shares_storage() {
        let buffer = ConstantDataBuffer::<CpuRuntime>::from_elements(&[1i64, 2, 3], &device());
        let copy = buffer.clone();
        assert!(buffer.ptr_eq(&copy));
        assert_eq!(buffer.primary_ptr(), copy.primary_ptr());
        assert_eq!(buffer.ref_count(), 2);
    }

    #[test]
    fn test_special_is_lazy() {
        let buffer = ConstantDataBuffer::<CpuRuntime>::from_elements(&[1i64, 2], &device());
        assert_eq!(buffer.special(), None);
        let ptr = buffer.materialize_special().unwrap();
        assert_ne!(ptr, 0);
        assert_eq!(buffer.special(), Some(ptr));
        // repeated calls hand back the same replica
        assert_eq!(buffer.materialize_special().unwrap(), ptr);
    }

    #[test]
    fn test_platform_ptr_on_cpu_is_primary() {
        let buffer = ConstantDataBuffer::<CpuRuntime>::from_elements(&[7i64], &device());
        assert_eq!(buffer.platform_ptr().unwrap(), buffer.primary_ptr());
        assert_eq!(buffer.special(), None);
    }

    #[test]
    fn test_special_replica_holds_host_bytes() {
        let data = vec![5i64, 6, 7];
        let buffer = ConstantDataBuffer::<CpuRuntime>::from_elements(&data, &device());
        let ptr = buffer.materialize_special().unwrap();

        let mut readback = vec![0u8; buffer.byte_len()];
        CpuRuntime::copy_from_device(ptr, &mut readback, &device()).unwrap();
        assert_eq!(bytemuck::cast_slice::<u8, i64>(&readback), data.as_slice());
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = ConstantDataBuffer::<CpuRuntime>::from_elements::<i64>(&[], &device());
        assert!(buffer.is_empty());
        assert_eq!(buffer.byte_len(), 0);
        assert_eq!(buffer.materialize_special().unwrap(), 0);
    }
}
