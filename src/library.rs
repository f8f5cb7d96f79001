//! Setup and teardown.
//!
//! [`Library`] owns a populated [`Registry`]. The free functions keep one
//! library in a process-wide slot for callers that prefer not to thread a
//! handle through; selection through them fails with `NotInitialized`
//! outside the setup/teardown window.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;

use crate::backend::Host;
use crate::config::LibraryConfig;
use crate::logging::{init_with_config, LoggingError};
use crate::problem::Problem;
use crate::solution::{Manifest, ManifestError, Registry, SolutionHandle};
use crate::status::{CobaltResult, Status};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("library is already set up")]
    AlreadyInitialized,
}

/// A set-up library: the host registry populated from a manifest.
#[derive(Debug, Clone)]
pub struct Library {
    registry: Arc<Registry<Host>>,
}

impl Library {
    /// Install logging if configured, load the manifest and build the registry.
    pub fn setup(config: &LibraryConfig) -> Result<Self, SetupError> {
        if let Some(logging) = &config.logging {
            match init_with_config(logging) {
                // the application installed its own subscriber
                Ok(()) | Err(LoggingError::AlreadySet) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let manifest = match &config.manifest {
            Some(path) => Manifest::from_path(path)?,
            None => Manifest::builtin(config.device_or_host()),
        };

        let mut builder = Registry::<Host>::builder().solutions(manifest.host_solutions()?);
        if let Some(threshold) = config.small_problem_threshold {
            builder = builder.small_problem_threshold(threshold);
        }
        let registry = builder.build();

        tracing::info!(
            devices = ?manifest.devices.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            solutions = registry.len(),
            "library set up"
        );
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> &Arc<Registry<Host>> {
        &self.registry
    }

    /// Validate `problem` and select a solution for it.
    pub fn get_solution(&self, problem: &Problem) -> CobaltResult<SolutionHandle<Host>> {
        self.registry.get_solution(problem)
    }

    /// Release the registry. Handles already obtained stay usable.
    pub fn teardown(self) {
        tracing::info!(solutions = self.registry.len(), "library torn down");
    }
}

static LIBRARY: Lazy<RwLock<Option<Library>>> = Lazy::new(|| RwLock::new(None));

/// Set up the process-wide library.
pub fn setup(config: &LibraryConfig) -> Result<(), SetupError> {
    let mut slot = LIBRARY.write();
    if slot.is_some() {
        return Err(SetupError::AlreadyInitialized);
    }
    *slot = Some(Library::setup(config)?);
    Ok(())
}

/// Tear down the process-wide library.
pub fn teardown() -> CobaltResult<()> {
    let library = LIBRARY.write().take().ok_or(Status::NotInitialized)?;
    library.teardown();
    Ok(())
}

pub fn is_initialized() -> bool {
    LIBRARY.read().is_some()
}

/// Select through the process-wide library.
pub fn get_solution(problem: &Problem) -> CobaltResult<SolutionHandle<Host>> {
    // clone out so selection runs without holding the slot
    let library = LIBRARY.read().clone().ok_or(Status::NotInitialized)?;
    library.get_solution(problem)
}
