//! Ranking of candidate solutions for one problem.

use super::{SolutionDescriptor, TileConfig};
use crate::problem::{Problem, ProblemCharacteristics};

/// Scores candidates of the same family; the highest score wins.
///
/// Equal scores keep registration order. A NaN score ranks below every
/// other candidate.
pub trait SelectionPolicy: Send + Sync {
    fn score(
        &self,
        problem: &Problem,
        characteristics: Option<&ProblemCharacteristics>,
        solution: &SolutionDescriptor,
    ) -> f64;
}

/// Every candidate scores the same, so the first registered one wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstRegistered;

impl SelectionPolicy for FirstRegistered {
    fn score(&self, _: &Problem, _: Option<&ProblemCharacteristics>, _: &SolutionDescriptor) -> f64 {
        0.0
    }
}

/// Estimates throughput from how well the problem fills the solution's tiles.
///
/// The score is the useful fraction of each macro tile and unroll step,
/// weighted by the log of the tile volume so that larger tiles win when
/// they fit equally well. Skinny problems prefer tiles elongated along
/// their wide dimension.
#[derive(Debug, Clone, Copy)]
pub struct TileEfficiency {
    pub skinny_bonus: f64,
}

impl Default for TileEfficiency {
    fn default() -> Self {
        Self { skinny_bonus: 1.25 }
    }
}

impl SelectionPolicy for TileEfficiency {
    fn score(
        &self,
        _problem: &Problem,
        characteristics: Option<&ProblemCharacteristics>,
        solution: &SolutionDescriptor,
    ) -> f64 {
        let Some(pc) = characteristics else {
            return 0.0;
        };
        let tile = solution.tile;
        let fill = efficiency(pc.size_d0, tile.macro0)
            * efficiency(pc.size_d1, tile.macro1)
            * efficiency(pc.size_unroll, tile.unroll);
        let volume = tile.macro0 as f64 * tile.macro1 as f64 * tile.unroll as f64;
        let mut score = fill * (1.0 + volume).log2();
        if skinny_match(pc, &tile) {
            score *= self.skinny_bonus;
        }
        score
    }
}

/// Fraction of `size` covered by whole tiles of `tile`.
fn efficiency(size: usize, tile: usize) -> f64 {
    if size == 0 || tile == 0 {
        return 0.0;
    }
    let padded = size.div_ceil(tile) as f64 * tile as f64;
    size as f64 / padded
}

fn skinny_match(pc: &ProblemCharacteristics, tile: &TileConfig) -> bool {
    (pc.skinny_d0 && tile.macro0 < tile.macro1) || (pc.skinny_d1 && tile.macro1 < tile.macro0)
}
