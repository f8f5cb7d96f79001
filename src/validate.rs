//! Structural and semantic checks run before solution lookup.
//!
//! Checks run in a fixed order and the first failure is reported, so a given
//! malformed problem always yields the same status.

use std::collections::BTreeSet;

use crate::device::{MAX_DEVICES, MAX_DEVICE_NAME_LEN};
use crate::operation::{IndexKind, OperationDescriptor, OperationType};
use crate::problem::Problem;
use crate::status::{CobaltResult, Status};
use crate::tensor::{TensorDescriptor, MAX_DIMENSIONS};

/// Validate `problem`, returning `Status::Success` or the first failing check.
pub fn validate_problem(problem: &Problem) -> Status {
    match run_checks(problem) {
        Ok(()) => Status::Success,
        Err(status) => status,
    }
}

impl Problem {
    /// [`validate_problem`] as a `Result`.
    pub fn validate(&self) -> CobaltResult<()> {
        run_checks(self)
    }
}

fn run_checks(problem: &Problem) -> CobaltResult<()> {
    let a = problem.tensor_a();
    let b = problem.tensor_b();
    let c = problem.tensor_c();
    let op = problem.operation();

    check_tensors(a, b, c)?;
    check_ranks(a, b, c, op)?;
    check_duplicates(op)?;
    check_counts(a, b, op)?;
    check_unassigned(op)?;
    check_assignment_sizes(problem)?;
    check_parameters(problem)?;
    check_device_profile(problem)
}

fn check_tensors(a: &TensorDescriptor, b: &TensorDescriptor, c: &TensorDescriptor) -> CobaltResult<()> {
    let tensors = [(a, 0usize), (b, 1), (c, 2)];

    for (t, which) in tensors {
        let rank = t.num_dimensions();
        if rank == 0 || rank > MAX_DIMENSIONS {
            return Err(pick(
                which,
                [
                    Status::TensorNumDimensionsInvalidA,
                    Status::TensorNumDimensionsInvalidB,
                    Status::TensorNumDimensionsInvalidC,
                ],
            ));
        }
    }
    for (t, which) in tensors {
        if t.dimensions().iter().any(|d| d.size == 0) {
            return Err(pick(
                which,
                [
                    Status::TensorDimensionSizeInvalidA,
                    Status::TensorDimensionSizeInvalidB,
                    Status::TensorDimensionSizeInvalidC,
                ],
            ));
        }
    }
    for (t, which) in tensors {
        if t.dimensions().iter().any(|d| d.stride == 0) || t.checked_extent().is_none() {
            return Err(pick(
                which,
                [
                    Status::TensorDimensionStrideInvalidA,
                    Status::TensorDimensionStrideInvalidB,
                    Status::TensorDimensionStrideInvalidC,
                ],
            ));
        }
    }
    Ok(())
}

#[inline]
fn pick(which: usize, statuses: [Status; 3]) -> Status {
    statuses[which]
}

fn check_ranks(
    a: &TensorDescriptor,
    b: &TensorDescriptor,
    c: &TensorDescriptor,
    op: &OperationDescriptor,
) -> CobaltResult<()> {
    if a.num_dimensions() != op.index_assignments_a.len()
        || b.num_dimensions() != op.index_assignments_b.len()
    {
        return Err(Status::OperationOperandNumIndicesMismatch);
    }
    if c.num_dimensions() != op.num_indices_c() {
        return Err(Status::OperandNumDimensionsMismatch);
    }
    Ok(())
}

fn check_duplicates(op: &OperationDescriptor) -> CobaltResult<()> {
    if has_duplicate(&op.index_assignments_a) {
        return Err(Status::OperationIndexAssignmentDuplicateA);
    }
    if has_duplicate(&op.index_assignments_b) {
        return Err(Status::OperationIndexAssignmentDuplicateB);
    }
    Ok(())
}

fn has_duplicate(ids: &[usize]) -> bool {
    let mut seen = BTreeSet::new();
    !ids.iter().all(|id| seen.insert(*id))
}

fn check_counts(a: &TensorDescriptor, b: &TensorDescriptor, op: &OperationDescriptor) -> CobaltResult<()> {
    let total = op.total_indices();
    if total == 0 || total > a.num_dimensions() + b.num_dimensions() {
        return Err(Status::OperationNumIndicesInvalid);
    }

    let ids: BTreeSet<usize> = op
        .index_assignments_a
        .iter()
        .chain(&op.index_assignments_b)
        .copied()
        .collect();

    let mut free = 0;
    let mut batch = 0;
    let mut summation = 0;
    for id in ids {
        match op.classify(id) {
            Some(IndexKind::Free) => free += 1,
            Some(IndexKind::Batch) => batch += 1,
            Some(IndexKind::Summation) => summation += 1,
            None => {}
        }
    }

    if free != op.num_indices_free {
        return Err(Status::OperationNumFreeIndicesInvalid);
    }
    if summation != op.num_indices_summation {
        return Err(Status::OperationNumSummationIndicesInvalid);
    }
    if batch != op.num_indices_batch {
        return Err(Status::OperationNumIndicesMismatch);
    }
    Ok(())
}

/// With the counts in agreement, an id past the total always leaves a gap
/// below it, so the gap is what gets reported.
fn check_unassigned(op: &OperationDescriptor) -> CobaltResult<()> {
    if (0..op.total_indices()).any(|id| op.classify(id).is_none()) {
        return Err(Status::OperationIndexUnassigned);
    }
    Ok(())
}

/// Free, batch and summation indices against the sizes they must agree with.
fn check_assignment_sizes(problem: &Problem) -> CobaltResult<()> {
    let op = problem.operation();
    let rank_c = op.num_indices_c();
    let size_a = |id: usize| {
        op.position_in_a(id)
            .and_then(|p| problem.tensor_a().dimensions().get(p))
            .map(|d| d.size)
    };
    let size_b = |id: usize| {
        op.position_in_b(id)
            .and_then(|p| problem.tensor_b().dimensions().get(p))
            .map(|d| d.size)
    };
    let size_c = |id: usize| problem.tensor_c().dimensions().get(id).map(|d| d.size);

    for id in 0..rank_c {
        if op.classify(id) != Some(IndexKind::Free) {
            continue;
        }
        let operand = size_a(id).or_else(|| size_b(id));
        if operand.is_none() || operand != size_c(id) {
            return Err(Status::OperationFreeIndexAssignmentsInvalid);
        }
    }

    for id in 0..rank_c {
        if op.classify(id) != Some(IndexKind::Batch) {
            continue;
        }
        let (sa, sb, sc) = (size_a(id), size_b(id), size_c(id));
        if sa.is_none() || sa != sb || sa != sc {
            return Err(Status::OperationBatchIndexAssignmentsInvalid);
        }
    }

    // Convolution windows may differ in size; checked with the parameters.
    let same_size = op.operation_type == OperationType::Contraction;
    for id in rank_c..op.total_indices() {
        let (sa, sb) = (size_a(id), size_b(id));
        if sa.is_none() || sb.is_none() || (same_size && sa != sb) {
            return Err(Status::OperationSummationIndexAssignmentsInvalid);
        }
    }
    Ok(())
}

fn check_parameters(problem: &Problem) -> CobaltResult<()> {
    let op = problem.operation();
    let tensors_real = problem.tensor_c().data_type().is_real();
    if tensors_real && (op.alpha.data_type().is_complex() || op.beta.data_type().is_complex()) {
        return Err(Status::ParametersInvalid);
    }

    if op.operation_type == OperationType::Convolution {
        let n = op.num_indices_summation;
        if op.pad.len() != n || op.stride.len() != n || op.stride.contains(&0) {
            return Err(Status::ParametersInvalid);
        }
        let rank_c = op.num_indices_c();
        for (k, pad) in op.pad.iter().enumerate() {
            let id = rank_c + k;
            let window = op
                .position_in_b(id)
                .and_then(|p| problem.tensor_b().dimensions().get(p))
                .map(|d| d.size);
            let input = op
                .position_in_a(id)
                .and_then(|p| problem.tensor_a().dimensions().get(p))
                .map(|d| d.size);
            match (input, window) {
                (Some(input), Some(window))
                    if pad.saturating_mul(2).saturating_add(input) >= window => {}
                _ => return Err(Status::ParametersInvalid),
            }
        }
    }
    Ok(())
}

fn check_device_profile(problem: &Problem) -> CobaltResult<()> {
    let profile = problem.device_profile();
    if profile.num_devices() == 0 || profile.num_devices() > MAX_DEVICES {
        return Err(Status::DeviceProfileNumDevicesInvalid);
    }
    if profile
        .devices
        .iter()
        .any(|d| d.name.is_empty() || d.name.len() > MAX_DEVICE_NAME_LEN)
    {
        return Err(Status::DeviceProfileDeviceNameInvalid);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceProfile};
    use crate::operation::Scalar;
    use crate::problem::{GemmConfig, ProblemBuilder};
    use crate::tensor::{DataType, Dimension};
    use num_complex::Complex64;

    fn fiji() -> Device {
        Device::new("Fiji", 64, 1050)
    }

    fn gemm() -> Problem {
        Problem::gemm(&GemmConfig::new(16, 8, 4, DataType::Single, fiji()))
    }

    fn with_operation(p: &Problem, op: OperationDescriptor) -> Problem {
        Problem::new(
            p.tensor_c().clone(),
            p.tensor_a().clone(),
            p.tensor_b().clone(),
            p.device_profile().clone(),
            op,
        )
    }

    #[test]
    fn test_valid_gemm() {
        assert_eq!(validate_problem(&gemm()), Status::Success);
        assert!(gemm().validate().is_ok());
    }

    #[test]
    fn test_zero_rank_a() {
        let p = gemm();
        let q = Problem::new(
            p.tensor_c().clone(),
            TensorDescriptor::new(DataType::Single, vec![]),
            p.tensor_b().clone(),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        assert_eq!(validate_problem(&q), Status::TensorNumDimensionsInvalidA);
    }

    #[test]
    fn test_zero_stride_c() {
        let p = gemm();
        let q = Problem::new(
            TensorDescriptor::new(
                DataType::Single,
                vec![Dimension::new(1, 16), Dimension::new(0, 8)],
            ),
            p.tensor_a().clone(),
            p.tensor_b().clone(),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        assert_eq!(validate_problem(&q), Status::TensorDimensionStrideInvalidC);
    }

    #[test]
    fn test_size_before_stride() {
        let p = gemm();
        let q = Problem::new(
            p.tensor_c().clone(),
            TensorDescriptor::new(
                DataType::Single,
                vec![Dimension::new(0, 16), Dimension::new(16, 4)],
            ),
            TensorDescriptor::new(
                DataType::Single,
                vec![Dimension::new(1, 0), Dimension::new(4, 8)],
            ),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        assert_eq!(validate_problem(&q), Status::TensorDimensionSizeInvalidB);
    }

    #[test]
    fn test_assignment_length_mismatch() {
        let p = gemm();
        let mut op = p.operation().clone();
        op.index_assignments_a.push(1);
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::OperationOperandNumIndicesMismatch
        );
    }

    #[test]
    fn test_rank_c_mismatch() {
        let p = gemm();
        let mut op = p.operation().clone();
        op.num_indices_batch = 1;
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::OperandNumDimensionsMismatch
        );
    }

    #[test]
    fn test_duplicate_b() {
        let p = gemm();
        let mut op = p.operation().clone();
        op.index_assignments_b = vec![1, 1];
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::OperationIndexAssignmentDuplicateB
        );
    }

    #[test]
    fn test_too_many_declared_indices() {
        let p = gemm();
        let mut op = p.operation().clone();
        op.num_indices_summation = 5;
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::OperationNumIndicesInvalid
        );
    }

    #[test]
    fn test_free_count() {
        // C[i,j] with A[i,k] B[k,i]: index 1 never appears
        let p = gemm();
        let mut op = p.operation().clone();
        op.index_assignments_b = vec![2, 0];
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::OperationNumFreeIndicesInvalid
        );
    }

    #[test]
    fn test_gap_in_assignments() {
        // two summation ids 2 and 3, but B references 4 instead of 3
        let p = ProblemBuilder::new(DataType::Single)
            .a(&[0, 2, 3])
            .b(&[2, 4, 1])
            .rank_c(2)
            .sizes([(0, 4), (1, 4), (2, 3), (3, 3), (4, 3)])
            .device(fiji())
            .build()
            .unwrap();
        let mut op = p.operation().clone();
        op.num_indices_summation = 2;
        // A has {2,3}, B has {2,4}: summation ids {2,3,4} != 2
        assert_eq!(
            validate_problem(&with_operation(&p, op.clone())),
            Status::OperationNumSummationIndicesInvalid
        );
        op.index_assignments_a = vec![0, 2, 4];
        op.index_assignments_b = vec![2, 4, 1];
        let q = with_operation(&p, op);
        assert_eq!(validate_problem(&q), Status::OperationIndexUnassigned);
    }

    #[test]
    fn test_unaddressable_stride() {
        let p = gemm();
        let half = usize::MAX / 2 + 1;
        let q = Problem::new(
            p.tensor_c().clone(),
            p.tensor_a().clone(),
            TensorDescriptor::new(
                DataType::Single,
                vec![Dimension::new(1, 4), Dimension::new(half, 8)],
            ),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        assert_eq!(validate_problem(&q), Status::TensorDimensionStrideInvalidB);
    }

    #[test]
    fn test_huge_convolution_pad() {
        let p = gemm();
        let op = p.operation().clone().with_convolution(vec![usize::MAX], vec![1]);
        assert_eq!(validate_problem(&with_operation(&p, op)), Status::Success);
    }

    #[test]
    fn test_free_size_mismatch() {
        let p = gemm();
        let q = Problem::new(
            TensorDescriptor::contiguous(DataType::Single, &[16, 9]),
            p.tensor_a().clone(),
            p.tensor_b().clone(),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        assert_eq!(
            validate_problem(&q),
            Status::OperationFreeIndexAssignmentsInvalid
        );
    }

    #[test]
    fn test_batch_size_mismatch() {
        let p = Problem::gemm(&GemmConfig::new(4, 4, 4, DataType::Double, fiji()).batched(2));
        let q = Problem::new(
            p.tensor_c().clone(),
            p.tensor_a().clone(),
            TensorDescriptor::contiguous(DataType::Double, &[4, 4, 3]),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        assert_eq!(
            validate_problem(&q),
            Status::OperationBatchIndexAssignmentsInvalid
        );
    }

    #[test]
    fn test_summation_size_mismatch() {
        let p = gemm();
        let q = Problem::new(
            p.tensor_c().clone(),
            p.tensor_a().clone(),
            TensorDescriptor::contiguous(DataType::Single, &[5, 8]),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        assert_eq!(
            validate_problem(&q),
            Status::OperationSummationIndexAssignmentsInvalid
        );
    }

    #[test]
    fn test_complex_scaling_on_real_tensors() {
        let p = gemm();
        let op = p.operation().clone().with_scaling(
            Scalar::DoubleComplex(Complex64::new(1.0, 1.0)),
            Scalar::Single(0.0),
        );
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::ParametersInvalid
        );
    }

    #[test]
    fn test_convolution_parameters() {
        let p = gemm();
        let op = p.operation().clone().with_convolution(vec![0, 0], vec![1]);
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::ParametersInvalid
        );
        let op = p.operation().clone().with_convolution(vec![1], vec![1]);
        assert_eq!(validate_problem(&with_operation(&p, op)), Status::Success);
        let op = p.operation().clone().with_convolution(vec![1], vec![0]);
        assert_eq!(
            validate_problem(&with_operation(&p, op)),
            Status::ParametersInvalid
        );
    }

    #[test]
    fn test_device_profile() {
        let empty = gemm().with_device_profile(DeviceProfile::default());
        assert_eq!(
            validate_problem(&empty),
            Status::DeviceProfileNumDevicesInvalid
        );

        let two = gemm().with_device_profile(DeviceProfile::new(vec![fiji(), fiji()]));
        assert_eq!(validate_problem(&two), Status::DeviceProfileNumDevicesInvalid);

        let unnamed = gemm().with_device_profile(DeviceProfile::single(Device::new("", 1, 1)));
        assert_eq!(
            validate_problem(&unnamed),
            Status::DeviceProfileDeviceNameInvalid
        );

        let long = "x".repeat(MAX_DEVICE_NAME_LEN + 1);
        let long = gemm().with_device_profile(DeviceProfile::single(Device::new(long, 1, 1)));
        assert_eq!(validate_problem(&long), Status::DeviceProfileDeviceNameInvalid);
    }

    #[test]
    fn test_header_example_valid() {
        let p = ProblemBuilder::new(DataType::Single)
            .a(&[5, 3, 0, 4, 1])
            .b(&[1, 3, 4, 2, 5])
            .rank_c(3)
            .sizes([(0, 4), (1, 2), (2, 8), (3, 3), (4, 5), (5, 7)])
            .device(fiji())
            .build()
            .unwrap();
        assert_eq!(validate_problem(&p), Status::Success);
    }
}
