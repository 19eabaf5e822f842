//! Runtime backends: the seam through which device memory is managed
//!
//! This module defines the `Runtime` trait and provides the CPU
//! implementation. Accelerator backends live out-of-tree and implement
//! the same traits.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity)
//! ├── Device (identifies a specific GPU/CPU)
//! ├── Client (owns stream/queue, synchronizes)
//! └── Allocator (memory management)
//! ```

mod allocator;

pub mod cpu;

pub use allocator::{Allocator, DefaultAllocator};

use crate::error::Result;

/// Core trait for compute backends
///
/// `Runtime` abstracts over different compute devices (CPU, GPU, etc.).
/// It uses static dispatch via generics for zero-cost abstraction.
///
/// # Associated Types
///
/// - `Device`: Identifies a specific compute unit (e.g., GPU 0, GPU 1)
/// - `Client`: Handles synchronization for a device
/// - `Allocator`: Memory management
///
/// # Example
///
/// ```ignore
/// use shapr::runtime::Runtime;
///
/// fn stage<R: Runtime>(bytes: &[u8], device: &R::Device) -> shapr::Result<u64> {
///     let ptr = R::allocate(bytes.len(), device)?;
///     R::copy_to_device(bytes, ptr, device)?;
///     Ok(ptr)
/// }
/// ```
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier type
    type Device: Device;

    /// Client for synchronization
    type Client: RuntimeClient<Self>;

    /// Memory allocator type
    type Allocator: Allocator;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Whether this backend executes on the host CPU
    ///
    /// Platform-residency accessors use this to decide between the host
    /// replica and the device replica of a constant buffer.
    fn is_cpu() -> bool;

    /// Number of devices this backend can address
    ///
    /// Caches partition their entries by device ordinal; the partition
    /// count is fixed to this value.
    fn device_count() -> usize;

    /// Allocate device memory
    ///
    /// Returns a device pointer (u64) that can be used for operations.
    /// Zero-size allocations succeed and return 0.
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Deallocate device memory
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Copy data from host to device
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Copy data from device to host
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Get the default device
    fn default_device() -> Self::Device;

    /// Get the default client for a device
    fn default_client(device: &Self::Device) -> Self::Client;
}

/// Trait for device identification
pub trait Device: Clone + Send + Sync + 'static {
    /// Unique identifier for this device
    ///
    /// Doubles as the cache partition ordinal, so it must be below the
    /// runtime's `device_count()`.
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}

/// Trait for runtime clients that handle synchronization
pub trait RuntimeClient<R: Runtime>: Clone + Send + Sync {
    /// Get the device this client operates on
    fn device(&self) -> &R::Device;

    /// Synchronize: wait for all pending operations to complete
    fn synchronize(&self);

    /// Get the allocator for this client
    fn allocator(&self) -> &R::Allocator;
}
