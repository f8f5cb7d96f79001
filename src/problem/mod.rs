//! Contraction problems: three tensors, an operation and a device profile.

mod builder;
mod characteristics;
mod family;

pub use builder::{GemmConfig, ProblemBuilder};
pub use characteristics::{num_flops, Operand, ProblemCharacteristics};
pub use family::FamilyKey;

use crate::device::DeviceProfile;
use crate::operation::OperationDescriptor;
use crate::tensor::TensorDescriptor;

/// One unit of work to be validated, matched to a solution and dispatched.
///
/// Construction never fails; use [`crate::validate_problem`] to check it.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    tensor_c: TensorDescriptor,
    tensor_a: TensorDescriptor,
    tensor_b: TensorDescriptor,
    device_profile: DeviceProfile,
    operation: OperationDescriptor,
}

impl Problem {
    pub fn new(
        tensor_c: TensorDescriptor,
        tensor_a: TensorDescriptor,
        tensor_b: TensorDescriptor,
        device_profile: DeviceProfile,
        operation: OperationDescriptor,
    ) -> Self {
        Self {
            tensor_c,
            tensor_a,
            tensor_b,
            device_profile,
            operation,
        }
    }

    /// Build a (batched) matrix multiplication problem.
    pub fn gemm(config: &GemmConfig) -> Self {
        config.build()
    }

    #[inline]
    pub fn tensor_c(&self) -> &TensorDescriptor {
        &self.tensor_c
    }

    #[inline]
    pub fn tensor_a(&self) -> &TensorDescriptor {
        &self.tensor_a
    }

    #[inline]
    pub fn tensor_b(&self) -> &TensorDescriptor {
        &self.tensor_b
    }

    #[inline]
    pub fn device_profile(&self) -> &DeviceProfile {
        &self.device_profile
    }

    #[inline]
    pub fn operation(&self) -> &OperationDescriptor {
        &self.operation
    }

    /// Canonical family key used for solution matching.
    pub fn family(&self) -> FamilyKey {
        FamilyKey::of(self)
    }

    /// Tile and unroll assignment; `None` unless the problem has at least
    /// two free indices and one summation index.
    pub fn characteristics(&self) -> Option<ProblemCharacteristics> {
        ProblemCharacteristics::of(self)
    }

    /// Size of global index `index`, looked up in A, then B, then C.
    pub fn index_size(&self, index: usize) -> Option<usize> {
        let op = &self.operation;
        if let Some(pos) = op.position_in_a(index) {
            return self.tensor_a.dimensions().get(pos).map(|d| d.size);
        }
        if let Some(pos) = op.position_in_b(index) {
            return self.tensor_b.dimensions().get(pos).map(|d| d.size);
        }
        self.tensor_c.dimensions().get(index).map(|d| d.size)
    }

    /// Same shape, layout and operation on a different device profile.
    pub fn with_device_profile(mut self, device_profile: DeviceProfile) -> Self {
        self.device_profile = device_profile;
        self
    }
}
