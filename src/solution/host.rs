//! Reference solution executing on the host backend.

use num_complex::{Complex32, Complex64};

use crate::backend::{contract, Element, Host, HostBuffer, HostQueue, HostStorage, Offsets};
use crate::control::TensorData;
use crate::problem::Problem;
use crate::status::{CobaltResult, Status};
use crate::tensor::DataType;

use super::{Solution, SolutionDescriptor};

/// Host contraction for one family.
///
/// The tile in the descriptor only steers selection; the kernel is the same
/// for every tile.
#[derive(Debug, Clone)]
pub struct HostContraction {
    descriptor: SolutionDescriptor,
}

impl HostContraction {
    pub fn new(descriptor: SolutionDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &SolutionDescriptor {
        &self.descriptor
    }
}

impl Solution<Host> for HostContraction {
    fn descriptor(&self) -> &SolutionDescriptor {
        &self.descriptor
    }

    fn check_operands(
        &self,
        problem: &Problem,
        c: &TensorData<Host>,
        a: &TensorData<Host>,
        b: &TensorData<Host>,
    ) -> CobaltResult<()> {
        // C is written under its lock while A and B are read
        if c.buffer.ptr_eq(&a.buffer) || c.buffer.ptr_eq(&b.buffer) {
            tracing::debug!(solution = %self.descriptor.name, "output aliases an input");
            return Err(Status::ControlInvalid);
        }
        // one kernel instantiation per call: no mixed precision
        let data_type = problem.tensor_c().data_type();
        if problem.tensor_a().data_type() != data_type || problem.tensor_b().data_type() != data_type {
            tracing::debug!(
                solution = %self.descriptor.name,
                c = ?data_type,
                a = ?problem.tensor_a().data_type(),
                b = ?problem.tensor_b().data_type(),
                "mixed element types"
            );
            return Err(Status::ControlInvalid);
        }
        let backed = [(c, problem.tensor_c()), (a, problem.tensor_a()), (b, problem.tensor_b())]
            .iter()
            .all(|(data, tensor)| data.fits(tensor));
        if !backed {
            return Err(Status::ControlInvalid);
        }
        Ok(())
    }

    fn enqueue(
        &self,
        problem: &Problem,
        c: &TensorData<Host>,
        a: &TensorData<Host>,
        b: &TensorData<Host>,
        queue: &HostQueue,
    ) -> CobaltResult<()> {
        self.check_operands(problem, c, a, b)?;

        let problem = problem.clone();
        let (buffer_c, buffer_a, buffer_b) = (c.buffer.clone(), a.buffer.clone(), b.buffer.clone());
        let offsets = Offsets {
            c: c.offset,
            a: a.offset,
            b: b.offset,
        };
        let name = self.descriptor.name.clone();

        queue.submit(move || {
            if execute(&problem, &buffer_c, &buffer_a, &buffer_b, offsets).is_none() {
                tracing::error!(solution = %name, "host contraction skipped: operand mismatch");
            }
        })
    }
}

fn execute(
    problem: &Problem,
    c: &HostBuffer,
    a: &HostBuffer,
    b: &HostBuffer,
    offsets: Offsets,
) -> Option<()> {
    let mut storage_c = c.write();
    let storage_a = a.read();
    let guard_b = if b.ptr_eq(a) { None } else { Some(b.read()) };
    let storage_b: &HostStorage = guard_b.as_deref().unwrap_or(&*storage_a);

    match problem.tensor_c().data_type() {
        DataType::Single => run::<f32>(problem, &mut storage_c, &storage_a, storage_b, offsets),
        DataType::Double => run::<f64>(problem, &mut storage_c, &storage_a, storage_b, offsets),
        DataType::SingleComplex => {
            run::<Complex32>(problem, &mut storage_c, &storage_a, storage_b, offsets)
        }
        DataType::DoubleComplex => {
            run::<Complex64>(problem, &mut storage_c, &storage_a, storage_b, offsets)
        }
    }
}

fn run<T: Element>(
    problem: &Problem,
    c: &mut HostStorage,
    a: &HostStorage,
    b: &HostStorage,
    offsets: Offsets,
) -> Option<()> {
    contract::<T>(problem, T::slice_mut(c)?, T::slice(a)?, T::slice(b)?, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Queue;
    use crate::device::Device;
    use crate::problem::GemmConfig;
    use crate::solution::TileConfig;
    use crate::tensor::TensorDescriptor;

    fn solution(problem: &Problem) -> HostContraction {
        HostContraction::new(SolutionDescriptor::new(
            problem.device_profile().clone(),
            problem.family(),
            TileConfig::default(),
        ))
    }

    #[test]
    fn test_enqueue_runs_on_queue() {
        let p = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Single, Device::new("Host", 1, 0)));
        let a = HostBuffer::from_vec(vec![1.0f32, 2.0, 3.0, 4.0]);
        let b = HostBuffer::from_vec(vec![5.0f32, 6.0, 7.0, 8.0]);
        let c = HostBuffer::zeros(DataType::Single, 4);
        let queue = HostQueue::new("host-solution").unwrap();

        solution(&p)
            .enqueue(
                &p,
                &TensorData::new(c.clone()),
                &TensorData::new(a),
                &TensorData::new(b),
                &queue,
            )
            .unwrap();
        queue.finish().unwrap();
        assert_eq!(c.to_vec::<f32>(), Some(vec![23.0, 34.0, 31.0, 46.0]));
    }

    #[test]
    fn test_shared_input_buffer() {
        // C = A · A with A and B the same buffer
        let p = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Double, Device::new("Host", 1, 0)));
        let a = HostBuffer::from_vec(vec![1.0f64, 2.0, 3.0, 4.0]);
        let c = HostBuffer::zeros(DataType::Double, 4);
        let queue = HostQueue::new("host-shared").unwrap();
        let data_a = TensorData::new(a);

        solution(&p)
            .enqueue(&p, &TensorData::new(c.clone()), &data_a, &data_a, &queue)
            .unwrap();
        queue.finish().unwrap();
        assert_eq!(c.to_vec::<f64>(), Some(vec![7.0, 10.0, 15.0, 22.0]));
    }

    #[test]
    fn test_output_aliasing_input_rejected() {
        let p = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Single, Device::new("Host", 1, 0)));
        let a = TensorData::new(HostBuffer::zeros(DataType::Single, 4));
        let b = TensorData::new(HostBuffer::zeros(DataType::Single, 4));
        let queue = HostQueue::new("host-alias").unwrap();
        assert_eq!(solution(&p).check_operands(&p, &b, &a, &b), Err(Status::ControlInvalid));
        assert_eq!(
            solution(&p).enqueue(&p, &a, &a, &b, &queue),
            Err(Status::ControlInvalid)
        );
        assert_eq!(queue.num_submitted(), 0);
    }

    #[test]
    fn test_mixed_element_types_rejected() {
        // C and A single, B double
        let p = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Single, Device::new("Host", 1, 0)));
        let mixed = Problem::new(
            p.tensor_c().clone(),
            p.tensor_a().clone(),
            TensorDescriptor::contiguous(DataType::Double, &[2, 2]),
            p.device_profile().clone(),
            p.operation().clone(),
        );
        let c = TensorData::new(HostBuffer::zeros(DataType::Single, 4));
        let a = TensorData::new(HostBuffer::zeros(DataType::Single, 4));
        let b = TensorData::new(HostBuffer::zeros(DataType::Double, 4));
        let queue = HostQueue::new("host-mixed").unwrap();

        assert_eq!(solution(&p).check_operands(&mixed, &c, &a, &b), Err(Status::ControlInvalid));
        assert_eq!(solution(&p).enqueue(&mixed, &c, &a, &b, &queue), Err(Status::ControlInvalid));
        assert_eq!(queue.num_submitted(), 0);
    }

    #[test]
    fn test_direct_enqueue_checks_buffer_extent() {
        let p = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Single, Device::new("Host", 1, 0)));
        let short = TensorData::new(HostBuffer::zeros(DataType::Single, 3));
        let full = TensorData::new(HostBuffer::zeros(DataType::Single, 4));
        let c = TensorData::new(HostBuffer::zeros(DataType::Single, 4));
        let queue = HostQueue::new("host-short").unwrap();
        assert_eq!(solution(&p).enqueue(&p, &c, &short, &full, &queue), Err(Status::ControlInvalid));
        assert_eq!(queue.num_submitted(), 0);
    }
}
