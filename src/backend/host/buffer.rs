//! Host memory buffers.

use std::sync::Arc;

use num_complex::{Complex32, Complex64};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::element::Element;
use crate::tensor::DataType;

/// Typed element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum HostStorage {
    Single(Vec<f32>),
    Double(Vec<f64>),
    SingleComplex(Vec<Complex32>),
    DoubleComplex(Vec<Complex64>),
}

impl HostStorage {
    /// Zero-initialized storage of `len` elements.
    pub fn zeros(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Single => HostStorage::Single(vec![0.0; len]),
            DataType::Double => HostStorage::Double(vec![0.0; len]),
            DataType::SingleComplex => HostStorage::SingleComplex(vec![Complex32::default(); len]),
            DataType::DoubleComplex => HostStorage::DoubleComplex(vec![Complex64::default(); len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HostStorage::Single(v) => v.len(),
            HostStorage::Double(v) => v.len(),
            HostStorage::SingleComplex(v) => v.len(),
            HostStorage::DoubleComplex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            HostStorage::Single(_) => DataType::Single,
            HostStorage::Double(_) => DataType::Double,
            HostStorage::SingleComplex(_) => DataType::SingleComplex,
            HostStorage::DoubleComplex(_) => DataType::DoubleComplex,
        }
    }
}

/// Shared handle to host memory.
///
/// Clones alias the same storage. Queued kernels hold a clone until they
/// run, so the caller may drop its handle right after enqueueing.
#[derive(Debug, Clone)]
pub struct HostBuffer {
    storage: Arc<RwLock<HostStorage>>,
}

impl HostBuffer {
    pub fn new(storage: HostStorage) -> Self {
        Self {
            storage: Arc::new(RwLock::new(storage)),
        }
    }

    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        Self::new(T::into_storage(data))
    }

    pub fn zeros(data_type: DataType, len: usize) -> Self {
        Self::new(HostStorage::zeros(data_type, len))
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        self.storage.read().data_type()
    }

    /// Copy out the contents; `None` if `T` is not the stored type.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        T::slice(&self.storage.read()).map(<[T]>::to_vec)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, HostStorage> {
        self.storage.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, HostStorage> {
        self.storage.write()
    }

    /// Whether both handles alias the same storage.
    pub fn ptr_eq(&self, other: &HostBuffer) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}
