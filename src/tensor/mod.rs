//! Tensor descriptors: element type, per-dimension size and stride.
//!
//! A [`TensorDescriptor`] only describes layout; the data itself lives in a
//! backend buffer handed to dispatch separately.
//!
//! # Example
//!
//! ```rust
//! use cobalt::tensor::{DataType, TensorDescriptor};
//!
//! // 4x8 column-major matrix: strides [1, 4]
//! let t = TensorDescriptor::contiguous(DataType::Single, &[4, 8]);
//! assert_eq!(t.strides(), vec![1, 4]);
//! assert_eq!(t.num_elements(), 32);
//! ```

mod layout;

use serde::{Deserialize, Serialize};

pub use layout::{checked_extent, compute_contiguous_strides, required_extent, StridedOffsets};

/// Maximum number of dimensions a tensor may have.
pub const MAX_DIMENSIONS: usize = 16;

/// Element type of a tensor or scalar operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Single,
    Double,
    SingleComplex,
    DoubleComplex,
}

impl DataType {
    #[inline]
    pub fn is_real(self) -> bool {
        matches!(self, DataType::Single | DataType::Double)
    }

    #[inline]
    pub fn is_complex(self) -> bool {
        !self.is_real()
    }

    /// True for double and double-complex.
    #[inline]
    pub fn is_double(self) -> bool {
        matches!(self, DataType::Double | DataType::DoubleComplex)
    }

    /// Size of one element in bytes.
    pub fn num_bytes(self) -> usize {
        match self {
            DataType::Single => 4,
            DataType::Double | DataType::SingleComplex => 8,
            DataType::DoubleComplex => 16,
        }
    }

    /// BLAS-style precision character (`S`, `D`, `C`, `Z`).
    pub fn to_char(self) -> char {
        match self {
            DataType::Single => 'S',
            DataType::Double => 'D',
            DataType::SingleComplex => 'C',
            DataType::DoubleComplex => 'Z',
        }
    }
}

/// Size and stride of one tensor dimension.
///
/// `stride` is the number of elements between consecutive entries along the
/// dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub stride: usize,
    pub size: usize,
}

impl Dimension {
    #[inline]
    pub fn new(stride: usize, size: usize) -> Self {
        Self { stride, size }
    }
}

/// Shape, layout and element type of one contraction operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDescriptor {
    data_type: DataType,
    dimensions: Vec<Dimension>,
}

impl TensorDescriptor {
    /// Create a descriptor from explicit dimensions.
    ///
    /// No validation happens here; out-of-range ranks, zero sizes and zero
    /// strides are reported by [`crate::validate_problem`].
    pub fn new(data_type: DataType, dimensions: Vec<Dimension>) -> Self {
        Self {
            data_type,
            dimensions,
        }
    }

    /// Create a densely packed column-major descriptor (dimension 0 fastest).
    pub fn contiguous(data_type: DataType, sizes: &[usize]) -> Self {
        let dimensions = compute_contiguous_strides(sizes)
            .into_iter()
            .zip(sizes)
            .map(|(stride, &size)| Dimension { stride, size })
            .collect();
        Self::new(data_type, dimensions)
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    #[inline]
    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.size).collect()
    }

    pub fn strides(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.stride).collect()
    }

    /// Number of logical elements, saturating at `usize::MAX`.
    pub fn num_elements(&self) -> usize {
        self.dimensions.iter().fold(1usize, |n, d| n.saturating_mul(d.size))
    }

    /// Elements a buffer must hold past `offset` to back this tensor.
    /// Saturates, so an unaddressable layout never fits a buffer.
    pub fn extent(&self) -> usize {
        required_extent(&self.dimensions)
    }

    /// [`Self::extent`], or `None` when the layout spans more than `usize::MAX`
    /// elements.
    pub fn checked_extent(&self) -> Option<usize> {
        checked_extent(&self.dimensions)
    }

    /// True when the layout is dense column-major.
    pub fn is_contiguous(&self) -> bool {
        self.strides() == compute_contiguous_strides(&self.sizes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_descriptor() {
        let t = TensorDescriptor::contiguous(DataType::Double, &[2, 3, 4]);
        assert_eq!(t.num_dimensions(), 3);
        assert_eq!(t.strides(), vec![1, 2, 6]);
        assert_eq!(t.sizes(), vec![2, 3, 4]);
        assert_eq!(t.num_elements(), 24);
        assert_eq!(t.extent(), 24);
        assert!(t.is_contiguous());
    }

    #[test]
    fn test_padded_layout_extent() {
        // leading dimension padded from 3 to 5
        let t = TensorDescriptor::new(
            DataType::Single,
            vec![Dimension::new(1, 3), Dimension::new(5, 2)],
        );
        assert!(!t.is_contiguous());
        assert_eq!(t.num_elements(), 6);
        assert_eq!(t.extent(), 8);
    }

    #[test]
    fn test_overflowing_shapes_saturate() {
        let sizes = [1 << 20, 1 << 20, 1 << 20, 1 << 20];
        let dims = sizes.iter().map(|&size| Dimension::new(1, size)).collect();
        let t = TensorDescriptor::new(DataType::Single, dims);
        assert_eq!(t.num_elements(), usize::MAX);
        assert_eq!(t.checked_extent(), Some(1 + 4 * ((1 << 20) - 1)));

        let t = TensorDescriptor::new(DataType::Single, vec![Dimension::new(usize::MAX, 3)]);
        assert_eq!(t.checked_extent(), None);
        assert_eq!(t.extent(), usize::MAX);
    }

    #[test]
    fn test_data_type_properties() {
        assert_eq!(DataType::Single.num_bytes(), 4);
        assert_eq!(DataType::DoubleComplex.num_bytes(), 16);
        assert!(DataType::SingleComplex.is_complex());
        assert!(DataType::DoubleComplex.is_double());
        assert!(!DataType::Single.is_double());
        assert_eq!(DataType::SingleComplex.to_char(), 'C');
    }
}
