//! JSON description of the solutions to register at setup.
//!
//! ```json
//! {
//!   "devices": [{ "name": "Host", "num_compute_units": 8 }],
//!   "solutions": [{
//!     "device": "Host",
//!     "data_type": "single",
//!     "rank_c": 2,
//!     "index_assignments_a": [0, 2],
//!     "index_assignments_b": [2, 1],
//!     "tiles": [{ "macro0": 16, "macro1": 16, "unroll": 8 }]
//!   }]
//! }
//! ```
//!
//! Index counts are not written out; they follow from `rank_c` and the
//! assignment lists the same way [`ProblemBuilder`] derives them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{HostContraction, SolutionDescriptor, TileConfig};
use crate::device::{Device, DeviceProfile};
use crate::operation::OperationType;
use crate::problem::{FamilyKey, Problem, ProblemBuilder};
use crate::tensor::DataType;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("solution {index}: unknown device {device:?}")]
    UnknownDevice { index: usize, device: String },

    #[error("solution {index}: {reason}")]
    InvalidSolution { index: usize, reason: String },
}

/// Devices and the solution families built for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub devices: Vec<Device>,
    #[serde(default)]
    pub solutions: Vec<ManifestSolution>,
}

/// One family on one device, with the tiles it was built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSolution {
    pub device: String,
    #[serde(default = "default_operation_type")]
    pub operation_type: OperationType,
    pub data_type: DataType,
    pub rank_c: usize,
    pub index_assignments_a: Vec<usize>,
    pub index_assignments_b: Vec<usize>,
    #[serde(default = "default_tiles")]
    pub tiles: Vec<TileConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_operation_type() -> OperationType {
    OperationType::Contraction
}

fn default_tiles() -> Vec<TileConfig> {
    vec![TileConfig::default()]
}

/// Tiles the built-in manifest registers for every family.
const BUILTIN_TILES: [(usize, usize, usize); 6] = [
    (8, 8, 8),
    (16, 16, 8),
    (32, 32, 16),
    (64, 64, 16),
    (16, 64, 16),
    (64, 16, 16),
];

impl Manifest {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_json(&contents)?;
        tracing::info!(
            path = %path.display(),
            devices = manifest.devices.len(),
            families = manifest.solutions.len(),
            "loaded solution manifest"
        );
        Ok(manifest)
    }

    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain and batched GEMM in all four transpose combinations and all
    /// four data types, on `device`.
    pub fn builtin(device: Device) -> Self {
        let tiles: Vec<TileConfig> = BUILTIN_TILES
            .iter()
            .map(|&(m0, m1, u)| TileConfig::new(m0, m1, u))
            .collect();
        let mut solutions = Vec::new();
        for data_type in [
            DataType::Single,
            DataType::Double,
            DataType::SingleComplex,
            DataType::DoubleComplex,
        ] {
            for batched in [false, true] {
                for (transpose_a, transpose_b) in
                    [(false, false), (false, true), (true, false), (true, true)]
                {
                    let (rank_c, sum) = if batched { (3, 3) } else { (2, 2) };
                    let mut a = if transpose_a { vec![sum, 0] } else { vec![0, sum] };
                    let mut b = if transpose_b { vec![1, sum] } else { vec![sum, 1] };
                    if batched {
                        a.push(2);
                        b.push(2);
                    }
                    solutions.push(ManifestSolution {
                        device: device.name.clone(),
                        operation_type: OperationType::Contraction,
                        data_type,
                        rank_c,
                        index_assignments_a: a,
                        index_assignments_b: b,
                        tiles: tiles.clone(),
                        name: None,
                    });
                }
            }
        }
        Self {
            devices: vec![device],
            solutions,
        }
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// One host solution per entry and tile, in manifest order.
    pub fn host_solutions(&self) -> Result<Vec<HostContraction>, ManifestError> {
        let mut out = Vec::new();
        for (index, entry) in self.solutions.iter().enumerate() {
            let device = self
                .device(&entry.device)
                .ok_or_else(|| ManifestError::UnknownDevice {
                    index,
                    device: entry.device.clone(),
                })?;
            let invalid = |reason: String| ManifestError::InvalidSolution { index, reason };

            if entry.operation_type != OperationType::Contraction {
                return Err(invalid("host solutions only perform contractions".into()));
            }
            if entry.tiles.is_empty() {
                return Err(invalid("no tiles".into()));
            }
            if let Some(tile) = entry.tiles.iter().find(|t| t.macro0 == 0 || t.macro1 == 0 || t.unroll == 0) {
                return Err(invalid(format!("tile {tile} has a zero extent")));
            }

            let family = entry.family(device).map_err(invalid)?;
            let profile = DeviceProfile::single(device.clone());
            for &tile in &entry.tiles {
                let mut descriptor = SolutionDescriptor::new(profile.clone(), family.clone(), tile);
                if let Some(name) = &entry.name {
                    descriptor = descriptor.with_name(format!("{name}_{tile}"));
                }
                out.push(HostContraction::new(descriptor));
            }
        }
        Ok(out)
    }
}

impl ManifestSolution {
    /// Family of this entry, checked by validating a unit-sized problem of it.
    fn family(&self, device: &Device) -> Result<FamilyKey, String> {
        self.sample_problem(device).map(|p| p.family())
    }

    fn sample_problem(&self, device: &Device) -> Result<Problem, String> {
        let ids: BTreeSet<usize> = (0..self.rank_c)
            .chain(self.index_assignments_a.iter().copied())
            .chain(self.index_assignments_b.iter().copied())
            .collect();
        let problem = ProblemBuilder::new(self.data_type)
            .a(&self.index_assignments_a)
            .b(&self.index_assignments_b)
            .rank_c(self.rank_c)
            .sizes(ids.into_iter().map(|id| (id, 1)))
            .device(device.clone())
            .build()
            .map_err(|status| status.to_string())?;
        problem.validate().map_err(|status| status.to_string())?;
        Ok(problem)
    }
}
