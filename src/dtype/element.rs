//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};

/// Trait for types that can back a typed view of a constant buffer
///
/// This trait connects Rust's type system to the runtime dtype system.
/// It's implemented for all primitive numeric types.
///
/// # Bounds
/// - `Copy + Clone + Send + Sync + 'static` - Basic trait requirements
/// - `Pod + Zeroable` - Safe memory transmutation (bytemuck)
pub trait Element: Copy + Clone + Send + Sync + Pod + Zeroable + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for i64 {
    const DTYPE: DType = DType::I64;
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
}

impl Element for i16 {
    const DTYPE: DType = DType::I16;
}

impl Element for i8 {
    const DTYPE: DType = DType::I8;
}

impl Element for u64 {
    const DTYPE: DType = DType::U64;
}

impl Element for u32 {
    const DTYPE: DType = DType::U32;
}

impl Element for u16 {
    const DTYPE: DType = DType::U16;
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;
}

// Note: bool doesn't implement Pod, so we can't implement Element for it
// directly. Boolean buffers use u8 views.

// ============================================================================
// Half-precision floating point types (requires "f16" feature)
// ============================================================================

#[cfg(feature = "f16")]
impl Element for half::f16 {
    const DTYPE: DType = DType::F16;
}

#[cfg(feature = "f16")]
impl Element for half::bf16 {
    const DTYPE: DType = DType::BF16;
}
