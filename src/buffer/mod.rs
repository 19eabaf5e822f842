//! Constant buffers: process-lifetime metadata with host/device residency
//!
//! A constant buffer is written once on the host and never mutated; its
//! device replica is created lazily, at most once, on first device-side
//! use. Handles share the underlying storage, so a cached buffer can be
//! handed to any number of consumers without copying.

mod constant;
mod offsets;
mod tad_pack;

pub use constant::ConstantDataBuffer;
pub use offsets::ConstantOffsetsBuffer;
pub use tad_pack::TadPack;
