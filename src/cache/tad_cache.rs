//! Per-device interning cache for tensor-along-dimension packs

use crate::buffer::{ConstantOffsetsBuffer, TadPack};
use crate::error::{Error, Result};
use crate::runtime::{Device, Runtime};
use crate::shape::sub_array;
use crate::shape::{Dims, ShapeDescriptor};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ShapeCache;

type Partition<R> = BTreeMap<TadDescriptor, TadPack<R>>;

/// Cache key identifying one tensor-along-dimension decomposition
///
/// Two requests that differ only in axis order are the same
/// decomposition, so construction sorts the axis before it becomes part
/// of the key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TadDescriptor {
    base: ShapeDescriptor,
    axis: Dims,
    keep_unities: bool,
}

impl TadDescriptor {
    /// Build a key from a base descriptor and the dims each tad spans
    ///
    /// Fails on an invalid base, duplicate axis entries, or entries
    /// outside `0..base.rank()`.
    pub fn new(base: ShapeDescriptor, axis: &[usize], keep_unities: bool) -> Result<Self> {
        base.validate()?;
        let mut sorted: Dims = axis.iter().copied().collect();
        sorted.sort_unstable();
        sub_array::check_axis(base.rank(), &sorted)?;
        Ok(Self {
            base,
            axis: sorted,
            keep_unities,
        })
    }

    /// The base array descriptor
    #[inline]
    pub fn base(&self) -> &ShapeDescriptor {
        &self.base
    }

    /// The sorted dimensions each tad spans
    #[inline]
    pub fn axis(&self) -> &[usize] {
        &self.axis
    }

    /// Whether excluded dims stay in the tad shape as extent 1
    #[inline]
    pub fn keep_unities(&self) -> bool {
        self.keep_unities
    }
}

/// Interning cache mapping tad descriptors to shared [`TadPack`]s
///
/// Mirrors the shape cache's partition-per-device layout. Tad shape
/// buffers are canonicalized through the [`ShapeCache`], so a pack's
/// shape buffer is the same object any direct shape lookup returns.
pub struct TadCache<R: Runtime> {
    shapes: Arc<ShapeCache<R>>,
    partitions: Mutex<Vec<Partition<R>>>,
}

impl<R: Runtime> TadCache<R> {
    /// Create an empty cache canonicalizing through `shapes`
    pub fn new(shapes: Arc<ShapeCache<R>>) -> Self {
        let count = R::device_count().max(1);
        Self {
            shapes,
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

    /// The shape cache tad shape buffers resolve through
    #[inline]
    pub fn shape_cache(&self) -> &ShapeCache<R> {
        &self.shapes
    }

    /// Get or create the pack tiling `base_shape_info` along `dimensions`
    pub fn tad_for_dimensions(
        &self,
        base_shape_info: &[i64],
        dimensions: &[usize],
        device: &R::Device,
    ) -> Result<TadPack<R>> {
        let base = ShapeDescriptor::from_shape_info(base_shape_info)?;
        let descriptor = TadDescriptor::new(base, dimensions, false)?;
        self.tad_for_descriptor(&descriptor, device)
    }

    /// Like [`tad_for_dimensions`](Self::tad_for_dimensions), keeping
    /// excluded dims in the tad shape as extent 1
    pub fn tad_for_dimensions_keep_unities(
        &self,
        base_shape_info: &[i64],
        dimensions: &[usize],
        device: &R::Device,
    ) -> Result<TadPack<R>> {
        let base = ShapeDescriptor::from_shape_info(base_shape_info)?;
        let descriptor = TadDescriptor::new(base, dimensions, true)?;
        self.tad_for_descriptor(&descriptor, device)
    }

    /// Get or create the pack for an already-built descriptor
    ///
    /// On a miss the decomposition is computed under the cache mutex; a
    /// decomposition error propagates without caching anything. The shape
    /// cache mutex nests inside this one, never the other way around.
    pub fn tad_for_descriptor(
        &self,
        descriptor: &TadDescriptor,
        device: &R::Device,
    ) -> Result<TadPack<R>> {
        let mut partitions = self.partitions.lock();
        let ordinal = Self::ordinal(&partitions, device)?;
        if let Some(existing) = partitions[ordinal].get(descriptor) {
            return Ok(existing.clone());
        }

        let tads = sub_array::decompose(&descriptor.base, &descriptor.axis, descriptor.keep_unities)?;
        let shapes = self.shapes.buffer_for_descriptor(&tads.descriptor, device)?;
        let offsets = ConstantOffsetsBuffer::from_offsets(&tads.offsets, device);
        let pack = TadPack::new(shapes, offsets, tads.num_tads);
        partitions[ordinal].insert(descriptor.clone(), pack.clone());
        Ok(pack)
    }

    /// Number of cached packs in one device partition
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

    /// Number of cached packs across all device partitions
    pub fn total_cached_entries(&self) -> usize {
        self.partitions.lock().iter().map(|p| p.len()).sum()
    }
}
