//! # shapr
//!
//! **Cached, immutable shape metadata for multi-backend tensor runtimes.**
//!
//! shapr interns the metadata a tensor runtime consults on every kernel
//! launch: flat shape-info encodings and tensor-along-dimension (TAD)
//! decompositions. Each distinct descriptor is materialized once per
//! device and shared for the life of the process, so hot paths compare
//! pointers instead of re-deriving strides and offsets.
//!
//! ## What's inside
//!
//! - **Shape descriptors**: dtype, order, extents, strides, and the
//!   element-wise-stride classification, with a lossless flat `i64`
//!   encoding
//! - **Shape cache**: per-device interning of shape-info buffers with
//!   derived constructors for broadcast, reduction, and sub-array views
//! - **TAD cache**: per-device interning of TAD packs (tad shape-info
//!   plus per-tad element offsets)
//! - **Dual residency**: every cached buffer holds a host replica and
//!   lazily materializes a device replica through the `Runtime` seam
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shapr::prelude::*;
//!
//! let context = CacheContext::<CpuRuntime>::new();
//! let device = CpuRuntime::default_device();
//!
//! let shape = context
//!     .shapes()
//!     .buffer_for_shape(DType::F32, Order::C, &[2, 3, 4], &device)?;
//! let rows = context
//!     .tads()
//!     .tad_for_dimensions(shape.primary_as::<i64>(), &[1], &device)?;
//!
//! assert_eq!(rows.number_of_tads(), 8);
//! ```
//!
//! ## Feature Flags
//!
//! - `f16`: Half-precision element types (F16, BF16)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod buffer;
pub mod cache;
pub mod dtype;
pub mod error;
pub mod runtime;
pub mod shape;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::buffer::{ConstantDataBuffer, ConstantOffsetsBuffer, TadPack};
    pub use crate::cache::{CacheContext, ShapeCache, TadCache, TadDescriptor};
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::runtime::cpu::CpuRuntime;
    pub use crate::runtime::{Device, Runtime, RuntimeClient};
    pub use crate::shape::{Order, ShapeDescriptor};
}

/// Runtime used when callers do not name one
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
