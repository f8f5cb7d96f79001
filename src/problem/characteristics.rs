//! Size-dependent traits of a problem that steer solution choice.

use super::Problem;

/// A problem dimension narrower than this is "thin"...
pub const SKINNY_THIN: usize = 32;
/// ...and skinny when the other tile dimension exceeds this.
pub const SKINNY_WIDE: usize = 1024;

/// Operand a free index belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    A,
    B,
}

/// Tile and unroll assignment of a problem.
///
/// `d0` and `d1` are the two free indices a kernel tiles over: `d0` has the
/// smallest stride in C and `d1` is the next free index, taken from the
/// other operand when one exists. The unroll index is the summation index
/// with the smallest combined A+B stride, the earlier one in A on a tie.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemCharacteristics {
    pub index_d0: usize,
    pub index_d1: usize,
    pub operand_d0: Operand,
    pub operand_d1: Operand,
    pub size_d0: usize,
    pub size_d1: usize,
    pub index_unroll: usize,
    pub size_unroll: usize,
    pub skinny_d0: bool,
    pub skinny_d1: bool,
    /// Floating point operations of one execution.
    pub flops: f64,
}

impl ProblemCharacteristics {
    /// Returns `None` when the problem has fewer than two free indices or no
    /// summation index, or when an index is missing from its operand.
    pub fn of(problem: &Problem) -> Option<Self> {
        let op = problem.operation();
        let rank_c = op.num_indices_c();
        let dims_a = problem.tensor_a().dimensions();
        let dims_b = problem.tensor_b().dimensions();

        // (stride in owning operand, id, operand)
        let mut free: Vec<(usize, usize, Operand)> = Vec::new();
        for id in 0..rank_c {
            match (op.position_in_a(id), op.position_in_b(id)) {
                (Some(pos), None) => free.push((dims_a.get(pos)?.stride, id, Operand::A)),
                (None, Some(pos)) => free.push((dims_b.get(pos)?.stride, id, Operand::B)),
                _ => {}
            }
        }
        if free.len() < 2 {
            return None;
        }

        // descending stride; stable so equal strides keep id order
        free.sort_by(|x, y| y.0.cmp(&x.0));
        let last = free.len() - 1;
        if free[last].2 == free[last - 1].2 {
            if let Some(pos) = free[..last - 1].iter().rposition(|f| f.2 != free[last].2) {
                let moved = free.remove(pos);
                free.insert(last - 1, moved);
            }
        }

        let dims_c = problem.tensor_c().dimensions();
        let c_stride = |id: usize| dims_c.get(id).map(|d| d.stride);
        let (mut d0, mut d1) = (free[last], free[last - 1]);
        if c_stride(d0.1)? > c_stride(d1.1)? {
            std::mem::swap(&mut d0, &mut d1);
        }

        // walk A in position order: equal strides go to the index that comes
        // first in A, whatever its label
        let mut unroll: Option<(usize, usize)> = None;
        for (pa, &id) in op.index_assignments_a.iter().enumerate() {
            if id < rank_c {
                continue;
            }
            let pb = op.position_in_b(id)?;
            let stride = dims_a.get(pa)?.stride.saturating_add(dims_b.get(pb)?.stride);
            if unroll.map_or(true, |(best, _)| stride < best) {
                unroll = Some((stride, id));
            }
        }
        let (_, index_unroll) = unroll?;

        let size_d0 = problem.index_size(d0.1)?;
        let size_d1 = problem.index_size(d1.1)?;
        let size_unroll = problem.index_size(index_unroll)?;

        Some(Self {
            index_d0: d0.1,
            index_d1: d1.1,
            operand_d0: d0.2,
            operand_d1: d1.2,
            size_d0,
            size_d1,
            index_unroll,
            size_unroll,
            skinny_d0: size_d0 < SKINNY_THIN && size_d1 > SKINNY_WIDE,
            skinny_d1: size_d1 < SKINNY_THIN && size_d0 > SKINNY_WIDE,
            flops: num_flops(problem),
        })
    }

    #[inline]
    pub fn is_skinny(&self) -> bool {
        self.skinny_d0 || self.skinny_d1
    }
}

/// Multiply-add count times two; complex multiply-adds count four times.
pub fn num_flops(problem: &Problem) -> f64 {
    let total = problem.operation().total_indices();
    let points: f64 = (0..total)
        .map(|id| problem.index_size(id).unwrap_or(1) as f64)
        .product();
    let per_point = if problem.tensor_c().data_type().is_complex() { 8.0 } else { 2.0 };
    points * per_point
}
