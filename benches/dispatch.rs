//! Dispatch benchmark for the built-in host GEMM solutions
//!
//! Run benchmark:    cargo bench --bench dispatch
//! Larger problems:  cargo bench --bench dispatch -- --large
//! Profile:          samply record cargo bench --bench dispatch

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cobalt::backend::{HostBuffer, HostQueue};
use cobalt::config::host_device;
use cobalt::{
    time_solution, DataType, ExecutionControl, GemmConfig, Host, Library, LibraryConfig, Problem,
    TensorData, TimingConfig,
};

fn random_buffer(rng: &mut StdRng, len: usize) -> HostBuffer {
    HostBuffer::from_vec((0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
}

fn run_benchmark(sizes: &[usize]) {
    let device = host_device();
    let library = match Library::setup(&LibraryConfig::new().with_device(device.clone())) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("setup failed: {e}");
            std::process::exit(1);
        }
    };
    let mut rng = StdRng::seed_from_u64(42);
    let queues = [HostQueue::new("bench").expect("queue")];

    println!(
        "{:>6} {:>6} {:<24} {:>12} {:>10}",
        "size", "trans", "solution", "median", "GFLOP/s"
    );
    for &n in sizes {
        for (ta, tb) in [(false, false), (true, false), (false, true), (true, true)] {
            let config = GemmConfig::new(n, n, n, DataType::Single, device.clone()).transposed(ta, tb);
            let problem = Problem::gemm(&config);

            let start = Instant::now();
            let handle = library.get_solution(&problem).expect("built-in GEMM");
            let select = start.elapsed();

            let a = TensorData::new(random_buffer(&mut rng, n * n));
            let b = TensorData::new(random_buffer(&mut rng, n * n));
            let c = TensorData::new(HostBuffer::zeros(DataType::Single, n * n));
            let mut control = ExecutionControl::<Host>::new(&queues);

            let timing = time_solution(&handle, &c, &a, &b, &mut control, TimingConfig::default())
                .expect("timing");
            let flops = problem.characteristics().map_or(0.0, |pc| pc.flops);
            let per_enqueue = timing.per_enqueue().as_secs_f64();
            let trans = format!("{}{}", if ta { 'T' } else { 'N' }, if tb { 'T' } else { 'N' });
            println!(
                "{:>6} {:>6} {:<24} {:>12?} {:>10.2}   (select {:?})",
                n,
                trans,
                handle.name(),
                timing.median,
                flops / per_enqueue / 1e9,
                select
            );
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--large") {
        run_benchmark(&[256, 512, 1024]);
    } else {
        run_benchmark(&[32, 64, 128, 256]);
    }
}
