//! Solutions and their selection.
//!
//! A [`Solution`] is a prebuilt kernel for one problem family on one device
//! profile. The [`Registry`] maps a validated [`Problem`] onto the best
//! registered solution, or reports why none applies:
//!
//! ```text
//! Problem ──► operation type ──► device profile ──► family key ──► policy
//!               │                  │                  │              │
//!   OperationTypeNotFound  DeviceProfileNotFound  ProblemNotSupported  Success
//!                                                 ProblemNotFound      (or warning)
//! ```

mod exclusion;
mod host;
mod manifest;
mod policy;
mod registry;

pub use exclusion::{default_exclusions, Exclusion, MixedDataTypes, NoSummationIndex, SingleFreeIndex};
pub use host::HostContraction;
pub use manifest::{Manifest, ManifestError, ManifestSolution};
pub use policy::{FirstRegistered, SelectionPolicy, TileEfficiency};
pub use registry::{Registry, RegistryBuilder};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::control::TensorData;
use crate::device::DeviceProfile;
use crate::problem::{FamilyKey, Problem};
use crate::status::{CobaltResult, Status};

/// Work decomposition a solution was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileConfig {
    /// Macro tile extent along d0.
    pub macro0: usize,
    /// Macro tile extent along d1.
    pub macro1: usize,
    /// Summation depth per loop iteration.
    pub unroll: usize,
}

impl TileConfig {
    pub fn new(macro0: usize, macro1: usize, unroll: usize) -> Self {
        Self {
            macro0,
            macro1,
            unroll,
        }
    }
}

impl fmt::Display for TileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MT{}x{}_U{}", self.macro0, self.macro1, self.unroll)
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self::new(16, 16, 8)
    }
}

/// Static metadata the selector matches on.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionDescriptor {
    pub name: String,
    pub device_profile: DeviceProfile,
    pub family: FamilyKey,
    pub tile: TileConfig,
}

impl SolutionDescriptor {
    /// Descriptor named after its family and tile, e.g. `Cij_Aik_Bkj_SSS_MT16x16_U8`.
    pub fn new(device_profile: DeviceProfile, family: FamilyKey, tile: TileConfig) -> Self {
        let name = format!("{family}_{tile}");
        Self {
            name,
            device_profile,
            family,
            tile,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A prebuilt kernel for one problem family on one device profile.
pub trait Solution<B: Backend>: Send + Sync {
    fn descriptor(&self) -> &SolutionDescriptor;

    /// Reject operands this solution cannot run with, before any work for
    /// them reaches a queue.
    ///
    /// Called by [`crate::enqueue_solution`] once the buffers are known to
    /// back their tensors. The default accepts everything.
    fn check_operands(
        &self,
        _problem: &Problem,
        _c: &TensorData<B>,
        _a: &TensorData<B>,
        _b: &TensorData<B>,
    ) -> CobaltResult<()> {
        Ok(())
    }

    /// Submit one execution of `problem` to `queue` and return without
    /// waiting for it.
    ///
    /// `problem` belongs to this solution's family and has been validated;
    /// buffers have been checked against its tensors.
    fn enqueue(
        &self,
        problem: &Problem,
        c: &TensorData<B>,
        a: &TensorData<B>,
        b: &TensorData<B>,
        queue: &B::Queue,
    ) -> CobaltResult<()>;
}

/// A selected solution bound to the problem it was selected for.
pub struct SolutionHandle<B: Backend> {
    solution: Arc<dyn Solution<B>>,
    problem: Arc<Problem>,
    status: Status,
}

impl<B: Backend> SolutionHandle<B> {
    pub(crate) fn new(solution: Arc<dyn Solution<B>>, problem: Problem, status: Status) -> Self {
        Self {
            solution,
            problem: Arc::new(problem),
            status,
        }
    }

    pub fn solution(&self) -> &Arc<dyn Solution<B>> {
        &self.solution
    }

    pub fn descriptor(&self) -> &SolutionDescriptor {
        self.solution.descriptor()
    }

    pub fn name(&self) -> &str {
        &self.solution.descriptor().name
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// `Success` or the performance warning raised at selection.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether both handles refer to the same registered solution.
    pub fn same_solution(&self, other: &SolutionHandle<B>) -> bool {
        Arc::ptr_eq(&self.solution, &other.solution)
    }
}

impl<B: Backend> Clone for SolutionHandle<B> {
    fn clone(&self) -> Self {
        Self {
            solution: Arc::clone(&self.solution),
            problem: Arc::clone(&self.problem),
            status: self.status,
        }
    }
}

impl<B: Backend> fmt::Debug for SolutionHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionHandle")
            .field("solution", &self.name())
            .field("status", &self.status)
            .finish()
    }
}
