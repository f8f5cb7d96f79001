//! Solution registry and the selection algorithm.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::exclusion::{default_exclusions, Exclusion};
use super::policy::{SelectionPolicy, TileEfficiency};
use super::{Solution, SolutionHandle};
use crate::backend::Backend;
use crate::problem::{FamilyKey, Problem};
use crate::status::{CobaltResult, Status};

/// Problem elements per compute unit below which a device is underused.
pub const DEFAULT_ELEMENTS_PER_COMPUTE_UNIT: usize = 64;

/// Lookup key: a family on an ordered list of device names.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct RegistryKey {
    devices: Vec<String>,
    family: FamilyKey,
}

impl RegistryKey {
    fn of(problem: &Problem) -> Self {
        Self {
            devices: problem.device_profile().names(),
            family: problem.family(),
        }
    }
}

/// Read-only collection of solutions, populated once through
/// [`RegistryBuilder`].
///
/// Lookups take `&self` and never lock, so one registry can serve any
/// number of threads.
pub struct Registry<B: Backend> {
    solutions: Vec<Arc<dyn Solution<B>>>,
    index: HashMap<RegistryKey, Vec<usize>>,
    exclusions: Vec<Box<dyn Exclusion>>,
    policy: Box<dyn SelectionPolicy>,
    small_problem_threshold: Option<usize>,
}

impl<B: Backend> Registry<B> {
    pub fn builder() -> RegistryBuilder<B> {
        RegistryBuilder::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Registered solutions in registration order.
    pub fn solutions(&self) -> impl Iterator<Item = &Arc<dyn Solution<B>>> {
        self.solutions.iter()
    }

    /// Validate `problem`, then select a solution for it.
    ///
    /// Validation failures are returned unchanged.
    pub fn get_solution(&self, problem: &Problem) -> CobaltResult<SolutionHandle<B>> {
        problem.validate()?;
        self.select(problem)
    }

    /// Select the best registered solution for an already validated problem.
    ///
    /// # Errors
    ///
    /// - `OperationTypeNotFound`: no solution performs this operation type
    /// - `DeviceProfileNotFound`: none of those targets the problem's devices
    /// - `ProblemNotSupported`: no match, and the family is excluded by design
    /// - `ProblemNotFound`: no match for a family that could be supported
    pub fn select(&self, problem: &Problem) -> CobaltResult<SolutionHandle<B>> {
        let operation_type = problem.operation().operation_type;
        let mut of_type = self
            .solutions
            .iter()
            .filter(|s| s.descriptor().family.operation_type == operation_type)
            .peekable();
        if of_type.peek().is_none() {
            tracing::debug!(?operation_type, "no solution for operation type");
            return Err(Status::OperationTypeNotFound);
        }
        if !of_type.any(|s| s.descriptor().device_profile.matches(problem.device_profile())) {
            tracing::debug!(
                devices = ?problem.device_profile().names(),
                "no solution for device profile"
            );
            return Err(Status::DeviceProfileNotFound);
        }

        let key = RegistryKey::of(problem);
        let candidates = match self.index.get(&key) {
            Some(candidates) if !candidates.is_empty() => candidates,
            _ => return Err(self.explain_miss(problem, &key.family)),
        };

        let characteristics = problem.characteristics();
        let mut best: Option<(usize, f64)> = None;
        for &i in candidates {
            let descriptor = self.solutions[i].descriptor();
            let mut score = self.policy.score(problem, characteristics.as_ref(), descriptor);
            if score.is_nan() {
                score = f64::NEG_INFINITY;
            }
            tracing::trace!(solution = %descriptor.name, score, "scored candidate");
            // strictly greater: ties keep the earlier registration
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        let (index, _) = best.ok_or(Status::ProblemNotFound)?;
        let solution = Arc::clone(&self.solutions[index]);

        let status = self.size_status(problem);
        if status.is_performance_warning() {
            tracing::warn!(
                family = %key.family,
                elements = problem.tensor_c().num_elements(),
                threshold = self.threshold_for(problem),
                "problem too small to occupy the device"
            );
        }
        tracing::debug!(
            family = %key.family,
            solution = %solution.descriptor().name,
            candidates = candidates.len(),
            "selected solution"
        );
        Ok(SolutionHandle::new(solution, problem.clone(), status))
    }

    fn explain_miss(&self, problem: &Problem, family: &FamilyKey) -> Status {
        if let Some(rule) = self.exclusions.iter().find(|rule| rule.excludes(problem)) {
            tracing::debug!(%family, exclusion = rule.name(), "family not supported");
            Status::ProblemNotSupported
        } else {
            tracing::debug!(%family, "no solution registered for family");
            Status::ProblemNotFound
        }
    }

    /// Element count of C below which selection warns.
    pub fn threshold_for(&self, problem: &Problem) -> usize {
        self.small_problem_threshold.unwrap_or_else(|| {
            problem
                .device_profile()
                .devices
                .first()
                .map_or(0, |d| {
                    d.num_compute_units
                        .saturating_mul(DEFAULT_ELEMENTS_PER_COMPUTE_UNIT)
                })
        })
    }

    fn size_status(&self, problem: &Problem) -> Status {
        if problem.tensor_c().num_elements() < self.threshold_for(problem) {
            Status::PerformanceWarningProblemSizeTooSmall
        } else {
            Status::Success
        }
    }
}

impl<B: Backend> fmt::Debug for Registry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("backend", &B::name())
            .field("solutions", &self.solutions.len())
            .field("families", &self.index.len())
            .field("exclusions", &self.exclusions.iter().map(|e| e.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// One-time population of a [`Registry`].
pub struct RegistryBuilder<B: Backend> {
    solutions: Vec<Arc<dyn Solution<B>>>,
    exclusions: Vec<Box<dyn Exclusion>>,
    policy: Box<dyn SelectionPolicy>,
    small_problem_threshold: Option<usize>,
}

impl<B: Backend> RegistryBuilder<B> {
    /// Empty builder with the default exclusions and [`TileEfficiency`].
    pub fn new() -> Self {
        Self {
            solutions: Vec::new(),
            exclusions: default_exclusions(),
            policy: Box::new(TileEfficiency::default()),
            small_problem_threshold: None,
        }
    }

    /// Register a solution; earlier registrations win ties.
    pub fn solution(mut self, solution: impl Solution<B> + 'static) -> Self {
        self.solutions.push(Arc::new(solution));
        self
    }

    pub fn solutions<S>(mut self, solutions: impl IntoIterator<Item = S>) -> Self
    where
        S: Solution<B> + 'static,
    {
        self.solutions
            .extend(solutions.into_iter().map(|s| Arc::new(s) as Arc<dyn Solution<B>>));
        self
    }

    pub fn exclusion(mut self, exclusion: impl Exclusion + 'static) -> Self {
        self.exclusions.push(Box::new(exclusion));
        self
    }

    /// Drop all exclusions, including the defaults.
    pub fn clear_exclusions(mut self) -> Self {
        self.exclusions.clear();
        self
    }

    pub fn policy(mut self, policy: impl SelectionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Fixed C element count below which selection warns, instead of the
    /// per-compute-unit default.
    pub fn small_problem_threshold(mut self, threshold: usize) -> Self {
        self.small_problem_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Registry<B> {
        let mut index: HashMap<RegistryKey, Vec<usize>> = HashMap::new();
        for (i, solution) in self.solutions.iter().enumerate() {
            let descriptor = solution.descriptor();
            let key = RegistryKey {
                devices: descriptor.device_profile.names(),
                family: descriptor.family.clone(),
            };
            index.entry(key).or_default().push(i);
        }
        tracing::debug!(
            backend = B::name(),
            solutions = self.solutions.len(),
            families = index.len(),
            "registry built"
        );
        Registry {
            solutions: self.solutions,
            index,
            exclusions: self.exclusions,
            policy: self.policy,
            small_problem_threshold: self.small_problem_threshold,
        }
    }
}

impl<B: Backend> Default for RegistryBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}
