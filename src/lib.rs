//! # Cobalt
//!
//! Tensor-contraction problem validation, solution selection and
//! asynchronous dispatch.
//!
//! ## Features
//!
//! - **Validation**: deterministic fail-fast checks with a closed [`Status`] code set
//! - **Selection**: canonical family lookup per device profile, with pluggable
//!   exclusion rules and performance estimates
//! - **Dispatch**: explicit queues and dependency events; enqueue returns
//!   before the work runs
//! - **Host runtime**: worker-thread queues and a reference contraction kernel
//!   for all four data types
//!
//! ## Quick Start
//!
//! ```rust
//! use cobalt::backend::{HostBuffer, HostQueue, Event};
//! use cobalt::{enqueue_solution, ExecutionControl, GemmConfig, Host, Library, LibraryConfig, Problem, TensorData};
//! use cobalt::device::Device;
//! use cobalt::tensor::DataType;
//!
//! let device = Device::new("Host", 1, 0);
//! let library = Library::setup(&LibraryConfig::new().with_device(device.clone())).unwrap();
//!
//! // C[m,n] = Σ_k A[m,k] · B[k,n]
//! let problem = Problem::gemm(&GemmConfig::new(2, 2, 2, DataType::Single, device));
//! let handle = library.get_solution(&problem).unwrap();
//!
//! let a = TensorData::new(HostBuffer::from_vec(vec![1.0f32, 2.0, 3.0, 4.0]));
//! let b = TensorData::new(HostBuffer::from_vec(vec![5.0f32, 6.0, 7.0, 8.0]));
//! let c = TensorData::new(HostBuffer::zeros(DataType::Single, 4));
//!
//! let queues = [HostQueue::new("compute").unwrap()];
//! let mut control = ExecutionControl::<Host>::new(&queues).with_output_events(1);
//! enqueue_solution(&handle, &c, &a, &b, &mut control).unwrap();
//! control.output_events()[0].wait();
//!
//! assert_eq!(c.buffer.to_vec::<f32>(), Some(vec![23.0, 34.0, 31.0, 46.0]));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         User API                            │
//! │   validate_problem(problem) → Status                        │
//! │   get_solution(problem) → SolutionHandle                    │
//! │   enqueue_solution(handle, c, a, b, control) → Status       │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Registry                            │
//! │   (device names, family key) → candidates → policy score    │
//! │   exclusions: ProblemNotSupported vs ProblemNotFound        │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Backend<Queue, Event, Buffer>               │
//! │   Host: worker-thread queues, gather → GEMM → scatter       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod control;
pub mod device;
pub mod library;
pub mod logging;
pub mod operation;
pub mod problem;
pub mod solution;
pub mod status;
pub mod tensor;
pub mod timing;
mod validate;

// Re-exports
pub use backend::{Backend, Host};
pub use config::LibraryConfig;
pub use control::{enqueue_solution, ExecutionControl, TensorData};
pub use device::{Device, DeviceProfile};
pub use library::{get_solution, setup, teardown, Library, SetupError};
pub use operation::{OperationDescriptor, OperationType, Scalar};
pub use problem::{GemmConfig, Problem, ProblemBuilder};
pub use solution::{Registry, Solution, SolutionHandle};
pub use status::{status_is_performance_warning, status_is_validation_error, CobaltResult, Status};
pub use tensor::{DataType, Dimension, TensorDescriptor};
pub use timing::{time_solution, Timing, TimingConfig};
pub use validate::validate_problem;
