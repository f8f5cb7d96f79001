//! Stride arithmetic shared by descriptors and the host kernels.

use super::Dimension;

/// Column-major strides for a dense tensor of the given shape.
pub fn compute_contiguous_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![];
    }

    let mut strides = vec![1usize; shape.len()];
    for i in 1..shape.len() {
        strides[i] = strides[i - 1].saturating_mul(shape[i - 1]);
    }
    strides
}

/// Number of elements spanned by a strided layout, `1 + Σ (size-1)·stride`,
/// saturating at `usize::MAX`.
///
/// Returns 0 when any dimension is empty.
pub fn required_extent(dimensions: &[Dimension]) -> usize {
    checked_extent(dimensions).unwrap_or(usize::MAX)
}

/// [`required_extent`], or `None` when it does not fit in a `usize`.
pub fn checked_extent(dimensions: &[Dimension]) -> Option<usize> {
    if dimensions.iter().any(|d| d.size == 0) {
        return Some(0);
    }
    dimensions.iter().try_fold(1usize, |extent, d| {
        (d.size - 1).checked_mul(d.stride)?.checked_add(extent)
    })
}

/// Iterator over the linear offsets of a strided tensor in column-major
/// element order (dimension 0 varies fastest).
pub struct StridedOffsets<'a> {
    dimensions: &'a [Dimension],
    coords: Vec<usize>,
    offset: usize,
    remaining: usize,
}

impl<'a> StridedOffsets<'a> {
    pub fn new(dimensions: &'a [Dimension], base: usize) -> Self {
        let remaining = dimensions.iter().fold(1usize, |n, d| n.saturating_mul(d.size));
        Self {
            dimensions,
            coords: vec![0; dimensions.len()],
            offset: base,
            remaining,
        }
    }
}

impl Iterator for StridedOffsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.offset;
        self.remaining -= 1;

        // Increment coordinates, first dimension first
        for (dim, coord) in self.dimensions.iter().zip(self.coords.iter_mut()) {
            *coord += 1;
            self.offset += dim.stride;
            if *coord < dim.size {
                break;
            }
            self.offset -= dim.stride * dim.size;
            *coord = 0;
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
