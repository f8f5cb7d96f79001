//! Host tensor contraction via gather→permute→GEMM→permute→scatter.

use super::element::Element;
use crate::problem::Problem;
use crate::tensor::{compute_contiguous_strides, Dimension, StridedOffsets};

/// Offsets of the three operands within their buffers, in elements.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Offsets {
    pub c: usize,
    pub a: usize,
    pub b: usize,
}

/// Classify index ids into batch, left-only, right-only, and contracted.
///
/// - batch: in both A and B, and in C
/// - left: only in A (free indices from A)
/// - right: only in B (free indices from B)
/// - contracted: in both A and B, but not in C
pub(super) fn classify_modes(
    modes_a: &[usize],
    modes_b: &[usize],
    rank_c: usize,
) -> (Vec<usize>, Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut batch = Vec::new();
    let mut left = Vec::new();
    let mut contracted = Vec::new();

    for &m in modes_a {
        if modes_b.contains(&m) {
            if m < rank_c {
                batch.push(m);
            } else {
                contracted.push(m);
            }
        } else {
            left.push(m);
        }
    }

    let right: Vec<usize> = modes_b
        .iter()
        .filter(|m| !modes_a.contains(m))
        .copied()
        .collect();

    (batch, left, right, contracted)
}

fn mode_position(modes: &[usize], mode: usize) -> Option<usize> {
    modes.iter().position(|&m| m == mode)
}

/// Permutation reordering `current` to `[first..., second..., third...]`.
fn compute_permutation(
    current: &[usize],
    first: &[usize],
    second: &[usize],
    third: &[usize],
) -> Option<Vec<usize>> {
    first
        .iter()
        .chain(second)
        .chain(third)
        .map(|&m| mode_position(current, m))
        .collect()
}

/// Copy a strided operand into a dense column-major vector.
fn gather<T: Element>(data: &[T], dims: &[Dimension], offset: usize) -> Vec<T> {
    StridedOffsets::new(dims, offset)
        .map(|i| data[i])
        .collect()
}

/// Permute dense column-major data according to axis permutation.
fn permute_data<T: Element>(data: &[T], shape: &[usize], perm: &[usize]) -> Vec<T> {
    if perm.iter().enumerate().all(|(i, &p)| i == p) {
        return data.to_vec();
    }

    let new_shape: Vec<usize> = perm.iter().map(|&p| shape[p]).collect();
    let numel: usize = shape.iter().product();
    let mut result = vec![T::zero(); numel];
    let old_strides = compute_contiguous_strides(shape);
    let mut new_coords = vec![0; shape.len()];

    for (new_idx, result_elem) in result.iter_mut().enumerate() {
        // new linear index to new multi-index
        let mut remaining = new_idx;
        for (coord, &size) in new_coords.iter_mut().zip(&new_shape) {
            *coord = remaining % size;
            remaining /= size;
        }

        // map to old coordinates via the permutation
        let old_idx: usize = perm
            .iter()
            .enumerate()
            .map(|(new_dim, &old_dim)| new_coords[new_dim] * old_strides[old_dim])
            .sum();

        *result_elem = data[old_idx];
    }

    result
}

/// `C = alpha · contract(A, B) + beta · C` for a validated problem.
///
/// A zero `beta` overwrites C without reading it. Returns `None` if the
/// problem's index assignments are inconsistent, leaving C untouched.
pub(crate) fn contract<T: Element>(
    problem: &Problem,
    c: &mut [T],
    a: &[T],
    b: &[T],
    offsets: Offsets,
) -> Option<()> {
    let op = problem.operation();
    let rank_c = op.num_indices_c();
    let modes_a = &op.index_assignments_a;
    let modes_b = &op.index_assignments_b;
    let size = |id: usize| problem.index_size(id);
    let product = |modes: &[usize]| -> Option<usize> {
        modes.iter().map(|&id| size(id)).product::<Option<usize>>()
    };

    // 1. Gather operands into dense column-major order
    let a_dense = gather(a, problem.tensor_a().dimensions(), offsets.a);
    let b_dense = gather(b, problem.tensor_b().dimensions(), offsets.b);

    // 2. Classify modes
    let (batch, left, right, contracted) = classify_modes(modes_a, modes_b, rank_c);

    // 3. Fused GEMM dimensions
    let batch_size = product(&batch)?;
    let m = product(&left)?;
    let n = product(&right)?;
    let k = product(&contracted)?;

    // 4. A to [left, contracted, batch], B to [contracted, right, batch]
    let a_perm = compute_permutation(modes_a, &left, &contracted, &batch)?;
    let a_gemm = permute_data(&a_dense, &problem.tensor_a().sizes(), &a_perm);
    let b_perm = compute_permutation(modes_b, &contracted, &right, &batch)?;
    let b_gemm = permute_data(&b_dense, &problem.tensor_b().sizes(), &b_perm);

    // 5. One GEMM per batch entry; batch varies slowest
    let mut c_gemm = Vec::with_capacity(batch_size * m * n);
    for l in 0..batch_size {
        let a_slice = &a_gemm[l * m * k..(l + 1) * m * k];
        let b_slice = &b_gemm[l * k * n..(l + 1) * k * n];
        c_gemm.extend(T::gemm(a_slice, m, k, b_slice, n));
    }

    // 6. Reorder [left, right, batch] to C's index order
    let current: Vec<usize> = left.iter().chain(&right).chain(&batch).copied().collect();
    let current_shape: Vec<usize> = current.iter().map(|&id| size(id)).collect::<Option<_>>()?;
    let out_perm: Vec<usize> = (0..rank_c)
        .map(|id| mode_position(&current, id))
        .collect::<Option<_>>()?;
    let result = permute_data(&c_gemm, &current_shape, &out_perm);

    // 7. Scatter with scaling
    let alpha = T::from_scalar(&op.alpha);
    let beta = T::from_scalar(&op.beta);
    let overwrite = !op.uses_beta();
    for (dst, value) in StridedOffsets::new(problem.tensor_c().dimensions(), offsets.c).zip(result) {
        c[dst] = if overwrite {
            alpha * value
        } else {
            alpha * value + beta * c[dst]
        };
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceProfile};
    use crate::operation::{OperationDescriptor, Scalar};
    use crate::problem::{GemmConfig, ProblemBuilder};
    use crate::tensor::{DataType, TensorDescriptor};

    fn fiji() -> Device {
        Device::new("Fiji", 64, 1050)
    }

    #[test]
    fn test_classify_modes() {
        // C[i,j,k] = Σ A[n,l,i,m,j] B[j,l,m,k,n]
        let (batch, left, right, contracted) =
            classify_modes(&[5, 3, 0, 4, 1], &[1, 3, 4, 2, 5], 3);
        assert_eq!(batch, vec![1]);
        assert_eq!(left, vec![0]);
        assert_eq!(right, vec![2]);
        assert_eq!(contracted, vec![5, 3, 4]);
    }

    #[test]
    fn test_permute_transpose() {
        // 2x3 column-major → 3x2
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = permute_data(&data, &[2, 3], &[1, 0]);
        assert_eq!(t, vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_gemm_contract() {
        // A = [1 3; 2 4], B = [5 7; 6 8] column-major
        let p = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Double, fiji()));
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let b = vec![5.0f64, 6.0, 7.0, 8.0];
        let mut c = vec![f64::NAN; 4];
        contract(&p, &mut c, &a, &b, Offsets::default()).unwrap();
        // [1*5+3*6, 2*5+4*6, 1*7+3*8, 2*7+4*8]
        assert_eq!(c, vec![23.0, 34.0, 31.0, 46.0]);
    }

    #[test]
    fn test_transposed_a_with_beta() {
        let p = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Single, fiji()).transposed(true, false));
        let op = p
            .operation()
            .clone()
            .with_scaling(Scalar::Single(2.0), Scalar::Single(1.0));
        let p = Problem::new(
            p.tensor_c().clone(),
            p.tensor_a().clone(),
            p.tensor_b().clone(),
            p.device_profile().clone(),
            op,
        );
        // A stored as Aᵀ: A[k,i]
        let a = vec![1.0f32, 3.0, 2.0, 4.0];
        let b = vec![5.0f32, 6.0, 7.0, 8.0];
        let mut c = vec![1.0f32; 4];
        contract(&p, &mut c, &a, &b, Offsets::default()).unwrap();
        assert_eq!(c, vec![47.0, 69.0, 63.0, 93.0]);
    }

    #[test]
    fn test_strided_operands_and_offsets() {
        // A is 2x2 inside a 3-row buffer at offset 1; C padded the same way
        let a_desc = TensorDescriptor::new(DataType::Double, vec![Dimension::new(1, 2), Dimension::new(3, 2)]);
        let b_desc = TensorDescriptor::contiguous(DataType::Double, &[2, 2]);
        let c_desc = TensorDescriptor::new(DataType::Double, vec![Dimension::new(1, 2), Dimension::new(3, 2)]);
        let op = OperationDescriptor::contraction(DataType::Double, 2, 0, 1, vec![0, 2], vec![2, 1]);
        let p = Problem::new(c_desc, a_desc, b_desc, DeviceProfile::single(fiji()), op);

        let a = vec![0.0, 1.0, 2.0, 0.0, 3.0, 4.0, 0.0];
        let b = vec![5.0, 6.0, 7.0, 8.0];
        let mut c = vec![-1.0; 7];
        let offsets = Offsets { c: 1, a: 1, b: 0 };
        contract(&p, &mut c, &a, &b, offsets).unwrap();
        assert_eq!(c, vec![-1.0, 23.0, 34.0, -1.0, 31.0, 46.0, -1.0]);
    }

    #[test]
    fn test_batched_matches_loop() {
        let p = Problem::gemm(&GemmConfig::new(3, 2, 4, DataType::Double, fiji()).batched(2));
        let a: Vec<f64> = (0..24).map(|x| x as f64).collect();
        let b: Vec<f64> = (0..16).map(|x| (x % 5) as f64).collect();
        let mut c = vec![0.0; 12];
        contract(&p, &mut c, &a, &b, Offsets::default()).unwrap();

        // A[i,k,l] at i + 3k + 12l, B[k,j,l] at k + 4j + 8l, C[i,j,l] at i + 3j + 6l
        for l in 0..2 {
            for j in 0..2 {
                for i in 0..3 {
                    let expected: f64 = (0..4).map(|k| a[i + 3 * k + 12 * l] * b[k + 4 * j + 8 * l]).sum();
                    assert_eq!(c[i + 3 * j + 6 * l], expected);
                }
            }
        }
    }

    #[test]
    fn test_header_example_against_naive() {
        // C[i,j,k] = Σ_lmn A[n,l,i,m,j] B[j,l,m,k,n]
        let sizes = [2usize, 3, 2, 2, 3, 2];
        let p = ProblemBuilder::new(DataType::Double)
            .a(&[5, 3, 0, 4, 1])
            .b(&[1, 3, 4, 2, 5])
            .rank_c(3)
            .sizes(sizes.iter().copied().enumerate())
            .device(fiji())
            .build()
            .unwrap();
        let a: Vec<f64> = (0..p.tensor_a().num_elements()).map(|x| (x % 7) as f64 - 3.0).collect();
        let b: Vec<f64> = (0..p.tensor_b().num_elements()).map(|x| (x % 5) as f64 * 0.5).collect();
        let mut c = vec![0.0; p.tensor_c().num_elements()];
        contract(&p, &mut c, &a, &b, Offsets::default()).unwrap();

        let at = |dims: &[Dimension], coords: &[usize]| -> usize {
            dims.iter().zip(coords).map(|(d, &x)| d.stride * x).sum()
        };
        let (da, db, dc) = (
            p.tensor_a().dimensions(),
            p.tensor_b().dimensions(),
            p.tensor_c().dimensions(),
        );
        for i in 0..sizes[0] {
            for j in 0..sizes[1] {
                for k in 0..sizes[2] {
                    let mut acc = 0.0;
                    for l in 0..sizes[3] {
                        for m in 0..sizes[4] {
                            for n in 0..sizes[5] {
                                acc += a[at(da, &[n, l, i, m, j])] * b[at(db, &[j, l, m, k, n])];
                            }
                        }
                    }
                    let got = c[at(dc, &[i, j, k])];
                    assert!((got - acc).abs() < 1e-9, "C[{i},{j},{k}] = {got}, expected {acc}");
                }
            }
        }
    }
}
