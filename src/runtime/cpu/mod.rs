//! CPU runtime implementation
//!
//! The CPU runtime uses standard heap allocation. "Device" pointers are
//! host pointers cast to `u64`, so host and device replicas of a constant
//! buffer live in the same address space and copies are plain memcpys.

mod client;
mod device;
mod runtime;

pub use client::{CpuAllocator, CpuClient};
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
