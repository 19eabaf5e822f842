//! Shape metadata: descriptors, the flat shape-info encoding, and
//! sub-array geometry
//!
//! Everything in this module is pure data and math; caching and device
//! residency live in the `cache` and `buffer` modules.

mod descriptor;
pub mod shape_info;
pub(crate) mod sub_array;

pub use descriptor::ShapeDescriptor;

use smallvec::SmallVec;
use std::fmt;

use crate::error::{Error, Result};

/// Stack allocation threshold for dimensions
/// Most arrays have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Maximum supported rank of an array
pub const MAX_RANK: usize = 32;

/// Shape type: extents of an array
///
/// Extents are `i64` to match the flat shape-info encoding; zero extents
/// mark empty arrays.
pub type Shape = SmallVec<[i64; STACK_DIMS]>;

/// Strides type: element offsets between consecutive elements along each
/// dimension
///
/// Strides are in ELEMENTS, not bytes. Signed to support negative strides
/// (e.g., for flip views).
pub type Strides = SmallVec<[i64; STACK_DIMS]>;

/// Dimension list type: axis indices into a shape
pub type Dims = SmallVec<[usize; STACK_DIMS]>;

/// Physical element ordering of an array
///
/// Encoded in shape-info buffers as the ASCII code of the classic order
/// character: `'c'` (99) for row-major, `'f'` (102) for column-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Order {
    /// Row-major: the last dimension varies fastest
    C,
    /// Column-major: the first dimension varies fastest
    F,
}

impl Order {
    /// The classic order character (`'c'` or `'f'`)
    #[inline]
    pub const fn as_char(self) -> char {
        match self {
            Self::C => 'c',
            Self::F => 'f',
        }
    }

    /// The code stored in the trailing shape-info word
    #[inline]
    pub const fn code(self) -> i64 {
        self.as_char() as i64
    }

    /// Decode an order character
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'c' => Ok(Self::C),
            'f' => Ok(Self::F),
            other => Err(Error::malformed_shape_info(format!(
                "unknown order character '{other}'"
            ))),
        }
    }

    /// Decode the trailing shape-info word
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            99 => Ok(Self::C),
            102 => Ok(Self::F),
            other => Err(Error::malformed_shape_info(format!(
                "unknown order code {other}"
            ))),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
