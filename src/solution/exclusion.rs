//! Problem families that are unsupported by design.

use crate::problem::Problem;

/// Rule marking a family as deliberately unsupported.
///
/// Consulted only when no registered solution matches, to tell
/// `ProblemNotSupported` apart from `ProblemNotFound`.
pub trait Exclusion: Send + Sync {
    fn name(&self) -> &str;

    fn excludes(&self, problem: &Problem) -> bool;
}

/// Pure outer products and element-wise products: nothing to unroll over.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSummationIndex;

impl Exclusion for NoSummationIndex {
    fn name(&self) -> &str {
        "no-summation-index"
    }

    fn excludes(&self, problem: &Problem) -> bool {
        problem.operation().num_indices_summation == 0
    }
}

/// Fewer than two free indices leave no 2-D tile to distribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleFreeIndex;

impl Exclusion for SingleFreeIndex {
    fn name(&self) -> &str {
        "single-free-index"
    }

    fn excludes(&self, problem: &Problem) -> bool {
        problem.operation().num_indices_free < 2
    }
}

/// Operands of differing element types.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedDataTypes;

impl Exclusion for MixedDataTypes {
    fn name(&self) -> &str {
        "mixed-data-types"
    }

    fn excludes(&self, problem: &Problem) -> bool {
        let c = problem.tensor_c().data_type();
        problem.tensor_a().data_type() != c || problem.tensor_b().data_type() != c
    }
}

/// The exclusions a registry starts with.
pub fn default_exclusions() -> Vec<Box<dyn Exclusion>> {
    vec![
        Box::new(NoSummationIndex),
        Box::new(SingleFreeIndex),
        Box::new(MixedDataTypes),
    ]
}
