//! Amortized dispatch timing by sample median.
//!
//! Each sample enqueues the same solution several times back to back and
//! waits for every queue to drain; the median sample resists scheduling
//! jitter better than the mean.

use std::time::{Duration, Instant};

use crate::backend::{Backend, Queue};
use crate::control::{enqueue_solution, ExecutionControl, TensorData};
use crate::solution::SolutionHandle;
use crate::status::{CobaltResult, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Back-to-back enqueues per sample.
    pub enqueues_per_sample: usize,
    pub samples: usize,
    /// Untimed enqueues before the first sample.
    pub warmup: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enqueues_per_sample: 6,
            samples: 5,
            warmup: 1,
        }
    }
}

impl TimingConfig {
    pub fn new(enqueues_per_sample: usize, samples: usize) -> Self {
        Self {
            enqueues_per_sample,
            samples,
            ..Self::default()
        }
    }

    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }
}

/// Wall-clock spans of each sample, in sample order.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    pub samples: Vec<Duration>,
    pub median: Duration,
    pub enqueues_per_sample: usize,
}

impl Timing {
    /// Median span of a single enqueue.
    pub fn per_enqueue(&self) -> Duration {
        let n = u32::try_from(self.enqueues_per_sample).unwrap_or(u32::MAX).max(1);
        self.median / n
    }
}

/// Middle element of the sorted spans; mean of the two middle ones for an
/// even count. `None` when empty.
pub fn median(samples: &[Duration]) -> Option<Duration> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2)
    }
}

/// Time `handle` on `control`'s queues.
///
/// # Errors
///
/// `ParametersInvalid` for a config with no samples or no enqueues, and any
/// error [`enqueue_solution`] reports.
pub fn time_solution<B: Backend>(
    handle: &SolutionHandle<B>,
    c: &TensorData<B>,
    a: &TensorData<B>,
    b: &TensorData<B>,
    control: &mut ExecutionControl<'_, B>,
    config: TimingConfig,
) -> CobaltResult<Timing> {
    if config.samples == 0 || config.enqueues_per_sample == 0 {
        return Err(Status::ParametersInvalid);
    }

    for _ in 0..config.warmup {
        enqueue_solution(handle, c, a, b, control)?;
    }
    finish_all(control)?;

    let mut samples = Vec::with_capacity(config.samples);
    for _ in 0..config.samples {
        let start = Instant::now();
        for _ in 0..config.enqueues_per_sample {
            enqueue_solution(handle, c, a, b, control)?;
        }
        finish_all(control)?;
        samples.push(start.elapsed());
    }

    let median = median(&samples).ok_or(Status::ParametersInvalid)?;
    tracing::debug!(
        solution = handle.name(),
        samples = samples.len(),
        enqueues_per_sample = config.enqueues_per_sample,
        median_us = median.as_micros() as u64,
        "timed solution"
    );
    Ok(Timing {
        samples,
        median,
        enqueues_per_sample: config.enqueues_per_sample,
    })
}

fn finish_all<B: Backend>(control: &ExecutionControl<'_, B>) -> CobaltResult<()> {
    for queue in control.queues() {
        queue.finish()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[ms(5), ms(1), ms(9), ms(3), ms(7)]), Some(ms(5)));
    }

    #[test]
    fn test_median_even() {
        assert_eq!(median(&[ms(4), ms(1), ms(2), ms(10)]), Some(ms(3)));
    }

    #[test]
    fn test_median_resists_outlier() {
        assert_eq!(median(&[ms(2), ms(2), ms(1000)]), Some(ms(2)));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_per_enqueue() {
        let timing = Timing {
            samples: vec![ms(6)],
            median: ms(6),
            enqueues_per_sample: 6,
        };
        assert_eq!(timing.per_enqueue(), ms(1));
    }
}
