//! Per-device interning cache for shape-info buffers

use crate::buffer::ConstantDataBuffer;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{Device, Runtime};
use crate::shape::sub_array;
use crate::shape::{Order, ShapeDescriptor};
use parking_lot::Mutex;
use std::collections::BTreeMap;

type Partition<R> = BTreeMap<ShapeDescriptor, ConstantDataBuffer<R>>;

/// Interning cache mapping shape descriptors to shared shape-info buffers
///
/// Entries are partitioned by device ordinal and held under one mutex.
/// Every entry point follows the same cache-aside rule: validate the
/// descriptor, resolve the partition, then return the cached handle or
/// insert a freshly encoded buffer. A given `(device, descriptor)` pair
/// resolves to the identical shared buffer for the life of the cache, so
/// callers may compare shape-info addresses instead of contents.
pub struct ShapeCache<R: Runtime> {
    partitions: Mutex<Vec<Partition<R>>>,
}

impl<R: Runtime> ShapeCache<R> {
    /// Create an empty cache with one partition per runtime device
    pub fn new() -> Self {
        let count = R::device_count().max(1);
        Self {
            partitions: Mutex::new((0..count).map(|_| Partition::new()).collect()),
        }
    }

    fn ordinal(partitions: &[Partition<R>], device: &R::Device) -> Result<usize> {
        let device_id = device.id();
        if device_id >= partitions.len() {
            return Err(Error::DeviceOutOfRange {
                device_id,
                device_count: partitions.len(),
            });
        }
        Ok(device_id)
    }

    /// Get or create the shared buffer for `descriptor` on `device`
    ///
    /// This is the canonical path; every other entry point funnels into
    /// it. The descriptor is validated before any map access, so a
    /// malformed descriptor never leaves a partial entry behind.
    pub fn buffer_for_descriptor(
        &self,
        descriptor: &ShapeDescriptor,
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        descriptor.validate()?;
        let mut partitions = self.partitions.lock();
        let ordinal = Self::ordinal(&partitions, device)?;
        let partition = &mut partitions[ordinal];
        if let Some(existing) = partition.get(descriptor) {
            return Ok(existing.clone());
        }
        let shape_info = descriptor.to_shape_info();
        let buffer = ConstantDataBuffer::from_elements(&shape_info, device);
        partition.insert(descriptor.clone(), buffer.clone());
        Ok(buffer)
    }

    /// Re-canonicalize a raw shape-info encoding through the cache
    pub fn buffer_for_shape_info(
        &self,
        shape_info: &[i64],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        let descriptor = ShapeDescriptor::from_shape_info(shape_info)?;
        self.buffer_for_descriptor(&descriptor, device)
    }

    /// Buffer for a dtype/order/shape tuple with derived dense strides
    pub fn buffer_for_shape(
        &self,
        dtype: DType,
        order: Order,
        shape: &[i64],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        let descriptor = ShapeDescriptor::from_shape(dtype, order, shape);
        self.buffer_for_descriptor(&descriptor, device)
    }

    /// Buffer for a shape with explicit strides
    pub fn buffer_for_shape_strides(
        &self,
        dtype: DType,
        order: Order,
        shape: &[i64],
        strides: &[i64],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        let descriptor = ShapeDescriptor::new(dtype, order, shape, strides, None);
        self.buffer_for_descriptor(&descriptor, device)
    }

    /// Alias spelling of [`buffer_for_shape`](Self::buffer_for_shape)
    /// kept for array-construction call sites
    pub fn create_shape_info(
        &self,
        dtype: DType,
        order: Order,
        shape: &[i64],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        self.buffer_for_shape(dtype, order, shape, device)
    }

    /// Canonicalize an externally built shape-info, copying its contents
    ///
    /// The caller keeps ownership of `shape_info`; the cache stores its
    /// own encoding.
    pub fn create_from_existing(
        &self,
        shape_info: &[i64],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        self.buffer_for_shape_info(shape_info, device)
    }

    /// Canonicalize an externally built shape-info, consuming it
    ///
    /// Ownership transfer replaces the original destroy-after-insert
    /// flag: the caller's allocation is released when this call returns.
    pub fn create_from_existing_owned(
        &self,
        shape_info: Vec<i64>,
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        self.buffer_for_shape_info(&shape_info, device)
    }

    /// Shape-info of a rank-0 scalar
    pub fn scalar_shape_info(
        &self,
        dtype: DType,
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        self.buffer_for_descriptor(&ShapeDescriptor::scalar(dtype), device)
    }

    /// Shape-info of a rank-1 dense vector
    pub fn vector_shape_info(
        &self,
        length: i64,
        dtype: DType,
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        self.buffer_for_descriptor(&ShapeDescriptor::vector(length, dtype), device)
    }

    /// Shape-info of an empty array
    pub fn empty_shape_info(
        &self,
        dtype: DType,
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        self.buffer_for_descriptor(&ShapeDescriptor::empty(dtype), device)
    }

    /// Whether `descriptor` already has a cached buffer on `device`
    ///
    /// Never inserts. Invalid descriptors and out-of-range devices probe
    /// as absent.
    pub fn has_buffer(&self, descriptor: &ShapeDescriptor, device: &R::Device) -> bool {
        if descriptor.validate().is_err() {
            return false;
        }
        let partitions = self.partitions.lock();
        match Self::ordinal(&partitions, device) {
            Ok(ordinal) => partitions[ordinal].contains_key(descriptor),
            Err(_) => false,
        }
    }

    /// Shape-info that reshapes `min` for broadcasting against `max`
    ///
    /// Keeps `min`'s extents and strides at the positions named by
    /// `dims` (right-aligned when `dims` is empty) and pads every other
    /// dimension with extent 1, stride 0, at `max`'s rank.
    pub fn shape_info_with_unities_for_broadcast(
        &self,
        max_shape_info: &[i64],
        min_shape_info: &[i64],
        dims: &[usize],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        let max = ShapeDescriptor::from_shape_info(max_shape_info)?;
        let min = ShapeDescriptor::from_shape_info(min_shape_info)?;
        let derived = sub_array::with_unities_for_broadcast(&max, &min, dims)?;
        self.buffer_for_descriptor(&derived, device)
    }

    /// Shape-info with the listed unit dimensions excised
    ///
    /// Each dimension in `dims_with_unities` must exist and have extent
    /// 1; remaining extents and strides keep their relative order.
    pub fn shape_info_with_no_unities_for_reduce(
        &self,
        shape_info: &[i64],
        dims_with_unities: &[usize],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        let base = ShapeDescriptor::from_shape_info(shape_info)?;
        let derived = sub_array::with_no_unities_for_reduce(&base, dims_with_unities)?;
        self.buffer_for_descriptor(&derived, device)
    }

    /// Shape-info of the sub-array selecting `dims` from `shape_info`
    pub fn sub_array_shape_info(
        &self,
        shape_info: &[i64],
        dims: &[usize],
        device: &R::Device,
    ) -> Result<ConstantDataBuffer<R>> {
        let base = ShapeDescriptor::from_shape_info(shape_info)?;
        let derived = sub_array::sub_array_descriptor(&base, dims)?;
        self.buffer_for_descriptor(&derived, device)
    }

    /// Number of cached entries in one device partition
    pub fn cached_entries_for_device(&self, device_id: usize) -> Result<usize> {
        let partitions = self.partitions.lock();
        if device_id >= partitions.len() {
            return Err(Error::DeviceOutOfRange {
                device_id,
                device_count: partitions.len(),
            });
        }
        Ok(partitions[device_id].len())
    }

    /// Number of cached entries across all device partitions
    pub fn total_cached_entries(&self) -> usize {
        self.partitions.lock().iter().map(|p| p.len()).sum()
    }
}

impl<R: Runtime> Default for ShapeCache<R> {
    fn default() -> Self {
        Self::new()
    }
}
