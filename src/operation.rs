//! Operation descriptor: how the global index space maps onto A, B and C.
//!
//! Global index ids `0..rank(C)` address the dimensions of C in order. An id in
//! that range present in exactly one operand is a *free* index; present in both
//! it is a *batch* index. Ids `rank(C)..total` are *summation* indices and must
//! appear in both operands.
//!
//! ```text
//! C[i,j,k] = Σ_l Σ_m Σ_n A[n,l,i,m,j] · B[j,l,m,k,n]
//!   0,1,2        3   4   5   5 3 0 4 1     1 3 4 2 5
//!
//! free: i, k   batch: j   summation: l, m, n
//! index_assignments_a = [5, 3, 0, 4, 1]
//! index_assignments_b = [1, 3, 4, 2, 5]
//! ```

use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};

use crate::tensor::DataType;

/// Algebraic family of the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Contraction,
    Convolution,
}

/// Typed `alpha`/`beta` operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Single(f32),
    Double(f64),
    SingleComplex(Complex32),
    DoubleComplex(Complex64),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Single(_) => DataType::Single,
            Scalar::Double(_) => DataType::Double,
            Scalar::SingleComplex(_) => DataType::SingleComplex,
            Scalar::DoubleComplex(_) => DataType::DoubleComplex,
        }
    }

    /// Widen to a double-precision complex value.
    pub fn to_complex64(&self) -> Complex64 {
        match *self {
            Scalar::Single(v) => Complex64::new(v as f64, 0.0),
            Scalar::Double(v) => Complex64::new(v, 0.0),
            Scalar::SingleComplex(v) => Complex64::new(v.re as f64, v.im as f64),
            Scalar::DoubleComplex(v) => v,
        }
    }

    pub fn is_zero(&self) -> bool {
        let v = self.to_complex64();
        v.re == 0.0 && v.im == 0.0
    }

    pub fn is_one(&self) -> bool {
        let v = self.to_complex64();
        v.re == 1.0 && v.im == 0.0
    }
}

/// Role of a global index id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Free,
    Batch,
    Summation,
}

/// Generalized contraction `C = alpha · Σ A·B + beta · C`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub operation_type: OperationType,
    pub alpha: Scalar,
    pub beta: Scalar,
    pub num_indices_free: usize,
    pub num_indices_batch: usize,
    pub num_indices_summation: usize,
    pub index_assignments_a: Vec<usize>,
    pub index_assignments_b: Vec<usize>,
    /// Convolution only: one entry per summation index.
    pub pad: Vec<usize>,
    /// Convolution only: one entry per summation index.
    pub stride: Vec<usize>,
}

impl OperationDescriptor {
    /// Contraction with `alpha = 1`, `beta = 0` of the given scalar type.
    pub fn contraction(
        scalar_type: DataType,
        num_indices_free: usize,
        num_indices_batch: usize,
        num_indices_summation: usize,
        index_assignments_a: Vec<usize>,
        index_assignments_b: Vec<usize>,
    ) -> Self {
        Self {
            operation_type: OperationType::Contraction,
            alpha: scalar_one(scalar_type),
            beta: scalar_zero(scalar_type),
            num_indices_free,
            num_indices_batch,
            num_indices_summation,
            index_assignments_a,
            index_assignments_b,
            pad: Vec::new(),
            stride: Vec::new(),
        }
    }

    /// Set `alpha` and `beta`.
    pub fn with_scaling(mut self, alpha: Scalar, beta: Scalar) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    /// Turn into a convolution with per-summation-index `pad` and `stride`.
    pub fn with_convolution(mut self, pad: Vec<usize>, stride: Vec<usize>) -> Self {
        self.operation_type = OperationType::Convolution;
        self.pad = pad;
        self.stride = stride;
        self
    }

    /// Rank of C implied by the partition counts.
    #[inline]
    pub fn num_indices_c(&self) -> usize {
        self.num_indices_free + self.num_indices_batch
    }

    /// Size of the global index space.
    #[inline]
    pub fn total_indices(&self) -> usize {
        self.num_indices_free + self.num_indices_batch + self.num_indices_summation
    }

    /// Whether `beta` contributes (a zero beta overwrites C).
    #[inline]
    pub fn uses_beta(&self) -> bool {
        !self.beta.is_zero()
    }

    /// Classify `index` against the assignment lists.
    ///
    /// Returns `None` when the index is referenced by neither operand.
    pub fn classify(&self, index: usize) -> Option<IndexKind> {
        let in_a = self.index_assignments_a.contains(&index);
        let in_b = self.index_assignments_b.contains(&index);
        if !in_a && !in_b {
            return None;
        }
        if index >= self.num_indices_c() {
            return Some(IndexKind::Summation);
        }
        if in_a && in_b {
            Some(IndexKind::Batch)
        } else {
            Some(IndexKind::Free)
        }
    }

    /// Position of `index` within A's assignment list.
    pub fn position_in_a(&self, index: usize) -> Option<usize> {
        self.index_assignments_a.iter().position(|&i| i == index)
    }

    /// Position of `index` within B's assignment list.
    pub fn position_in_b(&self, index: usize) -> Option<usize> {
        self.index_assignments_b.iter().position(|&i| i == index)
    }
}

/// Multiplicative identity of the given type.
pub fn scalar_one(data_type: DataType) -> Scalar {
    match data_type {
        DataType::Single => Scalar::Single(1.0),
        DataType::Double => Scalar::Double(1.0),
        DataType::SingleComplex => Scalar::SingleComplex(Complex32::new(1.0, 0.0)),
        DataType::DoubleComplex => Scalar::DoubleComplex(Complex64::new(1.0, 0.0)),
    }
}

/// Additive identity of the given type.
pub fn scalar_zero(data_type: DataType) -> Scalar {
    match data_type {
        DataType::Single => Scalar::Single(0.0),
        DataType::Double => Scalar::Double(0.0),
        DataType::SingleComplex => Scalar::SingleComplex(Complex32::new(0.0, 0.0)),
        DataType::DoubleComplex => Scalar::DoubleComplex(Complex64::new(0.0, 0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_example() -> OperationDescriptor {
        OperationDescriptor::contraction(
            DataType::Single,
            2,
            1,
            3,
            vec![5, 3, 0, 4, 1],
            vec![1, 3, 4, 2, 5],
        )
    }

    #[test]
    fn test_classify_indices() {
        let op = header_example();
        assert_eq!(op.num_indices_c(), 3);
        assert_eq!(op.total_indices(), 6);
        assert_eq!(op.classify(0), Some(IndexKind::Free));
        assert_eq!(op.classify(1), Some(IndexKind::Batch));
        assert_eq!(op.classify(2), Some(IndexKind::Free));
        for l in 3..6 {
            assert_eq!(op.classify(l), Some(IndexKind::Summation));
        }
        assert_eq!(op.classify(6), None);
    }

    #[test]
    fn test_positions() {
        let op = header_example();
        assert_eq!(op.position_in_a(0), Some(2));
        assert_eq!(op.position_in_b(2), Some(3));
        assert_eq!(op.position_in_b(0), None);
    }

    #[test]
    fn test_scalar_identities() {
        assert!(scalar_one(DataType::DoubleComplex).is_one());
        assert!(scalar_zero(DataType::Single).is_zero());
        let op = header_example();
        assert!(!op.uses_beta());
        let op = op.with_scaling(Scalar::Single(2.0), Scalar::Single(0.5));
        assert!(op.uses_beta());
        assert_eq!(op.alpha.to_complex64(), Complex64::new(2.0, 0.0));
    }
}
