//! Element types the host kernels operate on.

use num_complex::{Complex32, Complex64};
use num_traits::{One, Zero};

use super::buffer::HostStorage;
use crate::operation::Scalar;
use crate::tensor::DataType;

/// Scalar type storable in a [`HostStorage`] and usable by the host GEMM.
pub trait Element:
    Copy
    + Send
    + Sync
    + Default
    + std::fmt::Debug
    + PartialEq
    + Zero
    + One
    + std::ops::Mul<Output = Self>
    + 'static
{
    const DATA_TYPE: DataType;

    /// Convert an `alpha`/`beta` operand, dropping imaginary parts for real types.
    fn from_scalar(scalar: &Scalar) -> Self;

    fn slice(storage: &HostStorage) -> Option<&[Self]>;

    fn slice_mut(storage: &mut HostStorage) -> Option<&mut [Self]>;

    fn into_storage(data: Vec<Self>) -> HostStorage;

    /// Column-major `C[m,n] = A[m,k] · B[k,n]`.
    fn gemm(a: &[Self], m: usize, k: usize, b: &[Self], n: usize) -> Vec<Self> {
        generic_gemm(a, m, k, b, n)
    }
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::Single;

    fn from_scalar(scalar: &Scalar) -> Self {
        scalar.to_complex64().re as f32
    }

    fn slice(storage: &HostStorage) -> Option<&[Self]> {
        match storage {
            HostStorage::Single(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut HostStorage) -> Option<&mut [Self]> {
        match storage {
            HostStorage::Single(v) => Some(v),
            _ => None,
        }
    }

    fn into_storage(data: Vec<Self>) -> HostStorage {
        HostStorage::Single(data)
    }

    fn gemm(a: &[f32], m: usize, k: usize, b: &[f32], n: usize) -> Vec<f32> {
        faer_gemm_f32(a, m, k, b, n)
    }
}

impl Element for f64 {
    const DATA_TYPE: DataType = DataType::Double;

    fn from_scalar(scalar: &Scalar) -> Self {
        scalar.to_complex64().re
    }

    fn slice(storage: &HostStorage) -> Option<&[Self]> {
        match storage {
            HostStorage::Double(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut HostStorage) -> Option<&mut [Self]> {
        match storage {
            HostStorage::Double(v) => Some(v),
            _ => None,
        }
    }

    fn into_storage(data: Vec<Self>) -> HostStorage {
        HostStorage::Double(data)
    }

    fn gemm(a: &[f64], m: usize, k: usize, b: &[f64], n: usize) -> Vec<f64> {
        faer_gemm_f64(a, m, k, b, n)
    }
}

impl Element for Complex32 {
    const DATA_TYPE: DataType = DataType::SingleComplex;

    fn from_scalar(scalar: &Scalar) -> Self {
        let v = scalar.to_complex64();
        Complex32::new(v.re as f32, v.im as f32)
    }

    fn slice(storage: &HostStorage) -> Option<&[Self]> {
        match storage {
            HostStorage::SingleComplex(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut HostStorage) -> Option<&mut [Self]> {
        match storage {
            HostStorage::SingleComplex(v) => Some(v),
            _ => None,
        }
    }

    fn into_storage(data: Vec<Self>) -> HostStorage {
        HostStorage::SingleComplex(data)
    }
}

impl Element for Complex64 {
    const DATA_TYPE: DataType = DataType::DoubleComplex;

    fn from_scalar(scalar: &Scalar) -> Self {
        scalar.to_complex64()
    }

    fn slice(storage: &HostStorage) -> Option<&[Self]> {
        match storage {
            HostStorage::DoubleComplex(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut HostStorage) -> Option<&mut [Self]> {
        match storage {
            HostStorage::DoubleComplex(v) => Some(v),
            _ => None,
        }
    }

    fn into_storage(data: Vec<Self>) -> HostStorage {
        HostStorage::DoubleComplex(data)
    }
}

/// GEMM using faer for f32 (column-major layout).
fn faer_gemm_f32(a: &[f32], m: usize, k: usize, b: &[f32], n: usize) -> Vec<f32> {
    use faer::Mat;

    // Column-major: element (i, j) is at index j * nrows + i
    let a_mat = Mat::from_fn(m, k, |i, j| a[j * m + i]);
    let b_mat = Mat::from_fn(k, n, |i, j| b[j * k + i]);

    let c_mat = &a_mat * &b_mat;

    let mut c = vec![0.0f32; m * n];
    for j in 0..n {
        for i in 0..m {
            c[j * m + i] = c_mat[(i, j)];
        }
    }
    c
}

/// GEMM using faer for f64 (column-major layout).
fn faer_gemm_f64(a: &[f64], m: usize, k: usize, b: &[f64], n: usize) -> Vec<f64> {
    use faer::Mat;

    let a_mat = Mat::from_fn(m, k, |i, j| a[j * m + i]);
    let b_mat = Mat::from_fn(k, n, |i, j| b[j * k + i]);

    let c_mat = &a_mat * &b_mat;

    let mut c = vec![0.0f64; m * n];
    for j in 0..n {
        for i in 0..m {
            c[j * m + i] = c_mat[(i, j)];
        }
    }
    c
}

/// Triple-loop GEMM (column-major layout).
fn generic_gemm<T: Element>(a: &[T], m: usize, k: usize, b: &[T], n: usize) -> Vec<T> {
    let mut c = vec![T::zero(); m * n];

    for j in 0..n {
        for i in 0..m {
            let mut acc = T::zero();
            for kk in 0..k {
                acc = acc + a[kk * m + i] * b[j * k + kk]; // A[i, kk] · B[kk, j]
            }
            c[j * m + i] = acc;
        }
    }

    c
}
