//! Builder pattern for problem construction.

use std::collections::{BTreeSet, HashMap};

use super::Problem;
use crate::device::{Device, DeviceProfile};
use crate::operation::{OperationDescriptor, Scalar};
use crate::status::{CobaltResult, Status};
use crate::tensor::{DataType, TensorDescriptor};

/// Builder that derives the index partition from the assignment lists.
///
/// Ids below `rank_c` address C; those found in both A and B become batch
/// indices, the rest free indices. Every other id is a summation index.
/// All tensors are laid out dense column-major.
///
/// # Example
///
/// ```rust
/// use cobalt::problem::ProblemBuilder;
/// use cobalt::device::Device;
/// use cobalt::tensor::DataType;
///
/// // C[i,j] = Σ_k A[i,k] · B[k,j]
/// let problem = ProblemBuilder::new(DataType::Single)
///     .a(&[0, 2])
///     .b(&[2, 1])
///     .rank_c(2)
///     .size(0, 64)
///     .size(1, 32)
///     .size(2, 16)
///     .device(Device::new("Fiji", 64, 1050))
///     .build()
///     .unwrap();
///
/// assert_eq!(problem.operation().num_indices_free, 2);
/// assert_eq!(problem.operation().num_indices_summation, 1);
/// ```
pub struct ProblemBuilder {
    data_type: DataType,
    assignments_a: Vec<usize>,
    assignments_b: Vec<usize>,
    rank_c: Option<usize>,
    size_dict: HashMap<usize, usize>,
    devices: Vec<Device>,
    scaling: Option<(Scalar, Scalar)>,
}

impl ProblemBuilder {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            assignments_a: Vec::new(),
            assignments_b: Vec::new(),
            rank_c: None,
            size_dict: HashMap::new(),
            devices: Vec::new(),
            scaling: None,
        }
    }

    /// Global index ids of A's dimensions, in order.
    pub fn a(mut self, indices: &[usize]) -> Self {
        self.assignments_a = indices.to_vec();
        self
    }

    /// Global index ids of B's dimensions, in order.
    pub fn b(mut self, indices: &[usize]) -> Self {
        self.assignments_b = indices.to_vec();
        self
    }

    /// Number of dimensions of C.
    pub fn rank_c(mut self, rank: usize) -> Self {
        self.rank_c = Some(rank);
        self
    }

    /// Set the size of one index.
    pub fn size(mut self, index: usize, size: usize) -> Self {
        self.size_dict.insert(index, size);
        self
    }

    /// Set multiple sizes at once.
    pub fn sizes(mut self, sizes: impl IntoIterator<Item = (usize, usize)>) -> Self {
        self.size_dict.extend(sizes);
        self
    }

    /// Append a device to the profile.
    pub fn device(mut self, device: Device) -> Self {
        self.devices.push(device);
        self
    }

    pub fn scaling(mut self, alpha: Scalar, beta: Scalar) -> Self {
        self.scaling = Some((alpha, beta));
        self
    }

    /// Build the problem.
    ///
    /// # Errors
    ///
    /// `ParametersInvalid` if the rank of C is missing or an index has no size.
    pub fn build(self) -> CobaltResult<Problem> {
        let rank_c = self.rank_c.ok_or(Status::ParametersInvalid)?;

        let size_of = |i: &usize| self.size_dict.get(i).copied().ok_or(Status::ParametersInvalid);
        let sizes_a = self.assignments_a.iter().map(size_of).collect::<CobaltResult<Vec<_>>>()?;
        let sizes_b = self.assignments_b.iter().map(size_of).collect::<CobaltResult<Vec<_>>>()?;
        let sizes_c = (0..rank_c).map(|i| size_of(&i)).collect::<CobaltResult<Vec<_>>>()?;

        let (free, batch, summation) = partition(&self.assignments_a, &self.assignments_b, rank_c);

        let mut operation = OperationDescriptor::contraction(
            self.data_type,
            free,
            batch,
            summation,
            self.assignments_a,
            self.assignments_b,
        );
        if let Some((alpha, beta)) = self.scaling {
            operation = operation.with_scaling(alpha, beta);
        }

        Ok(Problem::new(
            TensorDescriptor::contiguous(self.data_type, &sizes_c),
            TensorDescriptor::contiguous(self.data_type, &sizes_a),
            TensorDescriptor::contiguous(self.data_type, &sizes_b),
            DeviceProfile::new(self.devices),
            operation,
        ))
    }
}

/// Count (free, batch, summation) indices implied by the assignments.
fn partition(a: &[usize], b: &[usize], rank_c: usize) -> (usize, usize, usize) {
    let ids: BTreeSet<usize> = a.iter().chain(b).copied().collect();
    let mut free = 0;
    let mut batch = 0;
    let mut summation = 0;
    for id in ids {
        if id >= rank_c {
            summation += 1;
        } else if a.contains(&id) && b.contains(&id) {
            batch += 1;
        } else {
            free += 1;
        }
    }
    (free, batch, summation)
}

/// Matrix multiplication `C[m,n] = Σ_k op(A)[m,k] · op(B)[k,n]`, optionally batched.
#[derive(Debug, Clone)]
pub struct GemmConfig {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    /// Batch count; `None` for a plain GEMM.
    pub batch: Option<usize>,
    pub transpose_a: bool,
    pub transpose_b: bool,
    pub data_type: DataType,
    pub device: Device,
}

impl GemmConfig {
    pub fn new(m: usize, n: usize, k: usize, data_type: DataType, device: Device) -> Self {
        Self {
            m,
            n,
            k,
            batch: None,
            transpose_a: false,
            transpose_b: false,
            data_type,
            device,
        }
    }

    pub fn batched(mut self, batch: usize) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn transposed(mut self, transpose_a: bool, transpose_b: bool) -> Self {
        self.transpose_a = transpose_a;
        self.transpose_b = transpose_b;
        self
    }

    pub(super) fn build(&self) -> Problem {
        let sum = if self.batch.is_some() { 3 } else { 2 };

        let mut a = if self.transpose_a { vec![sum, 0] } else { vec![0, sum] };
        let mut b = if self.transpose_b { vec![1, sum] } else { vec![sum, 1] };
        let mut sizes_c = vec![self.m, self.n];
        if let Some(batch) = self.batch {
            a.push(2);
            b.push(2);
            sizes_c.push(batch);
        }

        let size = |i: usize| match i {
            0 => self.m,
            1 => self.n,
            2 if self.batch.is_some() => self.batch.unwrap_or(1),
            _ => self.k,
        };
        let sizes_a: Vec<usize> = a.iter().map(|&i| size(i)).collect();
        let sizes_b: Vec<usize> = b.iter().map(|&i| size(i)).collect();

        let operation = OperationDescriptor::contraction(
            self.data_type,
            2,
            usize::from(self.batch.is_some()),
            1,
            a,
            b,
        );

        Problem::new(
            TensorDescriptor::contiguous(self.data_type, &sizes_c),
            TensorDescriptor::contiguous(self.data_type, &sizes_a),
            TensorDescriptor::contiguous(self.data_type, &sizes_b),
            DeviceProfile::single(self.device.clone()),
            operation,
        )
    }
}
