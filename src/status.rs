//! Result codes shared by validation, selection and dispatch.
//!
//! Every public operation reports through [`Status`]. The codes are split into
//! three disjoint numeric ranges so callers can classify a result without
//! matching individual variants:
//!
//! | Range             | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `0`               | success                                   |
//! | `0x0001..=0x0FFF` | validation error (problem/control invalid)|
//! | `0x1000..=0x1FFF` | performance warning (correct but slow)    |

/// First code of the validation-error range.
pub const VALIDATION_ERROR_MIN: u32 = 0x0001;
/// Last code of the validation-error range.
pub const VALIDATION_ERROR_MAX: u32 = 0x0FFF;
/// First code of the performance-warning range.
pub const PERFORMANCE_WARNING_MIN: u32 = 0x1000;
/// Last code of the performance-warning range.
pub const PERFORMANCE_WARNING_MAX: u32 = 0x1FFF;

/// Result alias used across the crate.
pub type CobaltResult<T> = Result<T, Status>;

/// Closed set of result codes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Status {
    #[default]
    #[error("success")]
    Success = 0,

    // tensor errors
    #[error("tensor A has an invalid number of dimensions")]
    TensorNumDimensionsInvalidA = 0x0001,
    #[error("tensor B has an invalid number of dimensions")]
    TensorNumDimensionsInvalidB = 0x0002,
    #[error("tensor C has an invalid number of dimensions")]
    TensorNumDimensionsInvalidC = 0x0003,
    #[error("tensor A has a dimension of size zero")]
    TensorDimensionSizeInvalidA = 0x0004,
    #[error("tensor B has a dimension of size zero")]
    TensorDimensionSizeInvalidB = 0x0005,
    #[error("tensor C has a dimension of size zero")]
    TensorDimensionSizeInvalidC = 0x0006,
    #[error("tensor A has an invalid stride")]
    TensorDimensionStrideInvalidA = 0x0007,
    #[error("tensor B has an invalid stride")]
    TensorDimensionStrideInvalidB = 0x0008,
    #[error("tensor C has an invalid stride")]
    TensorDimensionStrideInvalidC = 0x0009,

    // operation errors
    #[error("tensor C rank does not match the number of free and batch indices")]
    OperandNumDimensionsMismatch = 0x0010,
    #[error("operand rank does not match its index assignment count")]
    OperationOperandNumIndicesMismatch = 0x0011,
    #[error("number of batch indices is inconsistent")]
    OperationNumIndicesMismatch = 0x0012,
    #[error("index assignment of A is out of range")]
    OperationIndexAssignmentInvalidA = 0x0013,
    #[error("index assignment of B is out of range")]
    OperationIndexAssignmentInvalidB = 0x0014,
    #[error("index assignment of A repeats an index")]
    OperationIndexAssignmentDuplicateA = 0x0015,
    #[error("index assignment of B repeats an index")]
    OperationIndexAssignmentDuplicateB = 0x0016,
    #[error("number of indices is invalid")]
    OperationNumIndicesInvalid = 0x0017,
    #[error("number of free indices is invalid")]
    OperationNumFreeIndicesInvalid = 0x0018,
    #[error("number of summation indices is invalid")]
    OperationNumSummationIndicesInvalid = 0x0019,
    #[error("an index is not assigned to A or B")]
    OperationIndexUnassigned = 0x001A,
    #[error("free index assignments do not match tensor C")]
    OperationFreeIndexAssignmentsInvalid = 0x001B,
    #[error("batch index assignments are invalid")]
    OperationBatchIndexAssignmentsInvalid = 0x001C,
    #[error("summation index assignments are invalid")]
    OperationSummationIndexAssignmentsInvalid = 0x001D,

    // device profile errors
    #[error("device name is invalid")]
    DeviceProfileDeviceNameInvalid = 0x0020,
    #[error("number of devices is invalid")]
    DeviceProfileNumDevicesInvalid = 0x0021,

    // selection errors
    #[error("no solution exists for the operation type")]
    OperationTypeNotFound = 0x0030,
    #[error("no solution exists for the device profile")]
    DeviceProfileNotFound = 0x0031,
    #[error("problem is not supported")]
    ProblemNotSupported = 0x0032,
    #[error("no solution was found for the problem")]
    ProblemNotFound = 0x0033,

    // control errors
    #[error("execution control is invalid")]
    ControlInvalid = 0x0040,
    #[error("execution dependencies are invalid")]
    DependencyInvalid = 0x0041,

    // misc
    #[error("operation parameters are invalid")]
    ParametersInvalid = 0x0050,
    #[error("library is not initialized")]
    NotInitialized = 0x0051,

    // performance warnings
    #[error("problem is too small to use the device efficiently")]
    PerformanceWarningProblemSizeTooSmall = 0x1000,
}

impl Status {
    /// Numeric code of this status.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a status by numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        ALL.iter().copied().find(|s| s.code() == code)
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// True when the code lies in the validation-error range.
    #[inline]
    pub fn is_validation_error(self) -> bool {
        (VALIDATION_ERROR_MIN..=VALIDATION_ERROR_MAX).contains(&self.code())
    }

    /// True when the code lies in the performance-warning range.
    #[inline]
    pub fn is_performance_warning(self) -> bool {
        (PERFORMANCE_WARNING_MIN..=PERFORMANCE_WARNING_MAX).contains(&self.code())
    }

    /// True for the codes reported when no usable solution exists.
    pub fn is_selection_error(self) -> bool {
        matches!(
            self,
            Status::OperationTypeNotFound
                | Status::DeviceProfileNotFound
                | Status::ProblemNotSupported
                | Status::ProblemNotFound
        )
    }

    /// True when retrying on another device profile cannot help.
    ///
    /// `ProblemNotSupported` marks a deliberate limitation; `ProblemNotFound`
    /// and `DeviceProfileNotFound` are coverage gaps.
    pub fn is_permanent(self) -> bool {
        self == Status::ProblemNotSupported
    }

    /// Split into `Ok` (success or warning) and `Err` (validation error).
    #[inline]
    pub fn into_result(self) -> CobaltResult<Status> {
        if self.is_validation_error() {
            Err(self)
        } else {
            Ok(self)
        }
    }
}

/// Free-function form of [`Status::is_validation_error`].
pub fn status_is_validation_error(status: Status) -> bool {
    status.is_validation_error()
}

/// Free-function form of [`Status::is_performance_warning`].
pub fn status_is_performance_warning(status: Status) -> bool {
    status.is_performance_warning()
}

const ALL: &[Status] = &[
    Status::Success,
    Status::TensorNumDimensionsInvalidA,
    Status::TensorNumDimensionsInvalidB,
    Status::TensorNumDimensionsInvalidC,
    Status::TensorDimensionSizeInvalidA,
    Status::TensorDimensionSizeInvalidB,
    Status::TensorDimensionSizeInvalidC,
    Status::TensorDimensionStrideInvalidA,
    Status::TensorDimensionStrideInvalidB,
    Status::TensorDimensionStrideInvalidC,
    Status::OperandNumDimensionsMismatch,
    Status::OperationOperandNumIndicesMismatch,
    Status::OperationNumIndicesMismatch,
    Status::OperationIndexAssignmentInvalidA,
    Status::OperationIndexAssignmentInvalidB,
    Status::OperationIndexAssignmentDuplicateA,
    Status::OperationIndexAssignmentDuplicateB,
    Status::OperationNumIndicesInvalid,
    Status::OperationNumFreeIndicesInvalid,
    Status::OperationNumSummationIndicesInvalid,
    Status::OperationIndexUnassigned,
    Status::OperationFreeIndexAssignmentsInvalid,
    Status::OperationBatchIndexAssignmentsInvalid,
    Status::OperationSummationIndexAssignmentsInvalid,
    Status::DeviceProfileDeviceNameInvalid,
    Status::DeviceProfileNumDevicesInvalid,
    Status::OperationTypeNotFound,
    Status::DeviceProfileNotFound,
    Status::ProblemNotSupported,
    Status::ProblemNotFound,
    Status::ControlInvalid,
    Status::DependencyInvalid,
    Status::ParametersInvalid,
    Status::NotInitialized,
    Status::PerformanceWarningProblemSizeTooSmall,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_are_disjoint() {
        for &s in ALL {
            let classes = [s.is_success(), s.is_validation_error(), s.is_performance_warning()];
            assert_eq!(
                classes.iter().filter(|&&c| c).count(),
                1,
                "{:?} must belong to exactly one range",
                s
            );
        }
    }

    #[test]
    fn test_code_roundtrip() {
        for &s in ALL {
            assert_eq!(Status::from_code(s.code()), Some(s));
        }
        assert_eq!(Status::from_code(0x0FFF), None);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Status::Success.into_result(), Ok(Status::Success));
        assert_eq!(
            Status::PerformanceWarningProblemSizeTooSmall.into_result(),
            Ok(Status::PerformanceWarningProblemSizeTooSmall)
        );
        assert_eq!(
            Status::ProblemNotFound.into_result(),
            Err(Status::ProblemNotFound)
        );
    }

    #[test]
    fn test_selection_errors() {
        assert!(Status::ProblemNotSupported.is_selection_error());
        assert!(Status::ProblemNotSupported.is_permanent());
        assert!(!Status::ProblemNotFound.is_permanent());
        assert!(!Status::ControlInvalid.is_selection_error());
    }
}
