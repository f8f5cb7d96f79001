//! Library configuration.
//!
//! # Environment Variables
//!
//! - `COBALT_MANIFEST`: path of a solution manifest to load at setup
//! - `COBALT_SMALL_PROBLEM_THRESHOLD`: C element count below which selection warns
//! - `COBALT_LOG_LEVEL` / `COBALT_LOG_FORMAT`: see [`crate::logging`]

use std::env;
use std::path::PathBuf;

use crate::device::Device;
use crate::logging::LoggingConfig;

const MANIFEST_ENV: &str = "COBALT_MANIFEST";
const SMALL_PROBLEM_THRESHOLD_ENV: &str = "COBALT_SMALL_PROBLEM_THRESHOLD";

/// Settings consumed by [`crate::Library::setup`].
#[derive(Debug, Clone, Default)]
pub struct LibraryConfig {
    /// Manifest to register solutions from; the built-in GEMM manifest when unset.
    pub manifest: Option<PathBuf>,
    /// Device the built-in manifest targets; [`host_device`] when unset.
    pub device: Option<Device>,
    /// Fixed warning threshold; 64 elements per compute unit when unset.
    pub small_problem_threshold: Option<usize>,
    /// Subscriber to install at setup; none when unset.
    pub logging: Option<LoggingConfig>,
}

impl LibraryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_small_problem_threshold(mut self, threshold: usize) -> Self {
        self.small_problem_threshold = Some(threshold);
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Manifest path, threshold and logging settings from the environment.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::new().with_logging(LoggingConfig::from_env());

        if let Ok(path) = env::var(MANIFEST_ENV) {
            if !path.is_empty() {
                config.manifest = Some(PathBuf::from(path));
            }
        }

        if let Ok(threshold) = env::var(SMALL_PROBLEM_THRESHOLD_ENV) {
            if let Ok(threshold) = threshold.parse::<usize>() {
                config.small_problem_threshold = Some(threshold);
            }
        }

        config
    }

    /// The configured device, or the host.
    pub fn device_or_host(&self) -> Device {
        self.device.clone().unwrap_or_else(host_device)
    }
}

/// The machine this process runs on, one compute unit per hardware thread.
pub fn host_device() -> Device {
    let threads = std::thread::available_parallelism().map_or(1, |n| n.get());
    Device::new("Host", threads, 0)
}
