//! Benchmark Harness
//!
//! Times repeated engine operations and summarizes their latencies.

use std::time::{Duration, Instant};

/// Latency distribution of a run
#[derive(Debug, Clone)]
pub struct LatencyStats {
    pub completed: u64,
    pub duration: Duration,
    pub avg_latency: Duration,
    pub p50_latency: Duration,
    pub p99_latency: Duration,
    pub max_latency: Duration,
    pub ops_per_sec: f64,
}

impl LatencyStats {
    pub fn from_latencies(latencies: &[Duration], duration: Duration) -> Self {
        if latencies.is_empty() {
            return Self {
                completed: 0,
                duration,
                avg_latency: Duration::ZERO,
                p50_latency: Duration::ZERO,
                p99_latency: Duration::ZERO,
                max_latency: Duration::ZERO,
                ops_per_sec: 0.0,
            };
        }
        let mut sorted = latencies.to_vec();
        sorted.sort();
        let sum: Duration = latencies.iter().sum();
        let last = sorted.len() - 1;
        let percentile = |p: f64| sorted[((sorted.len() as f64 * p) as usize).min(last)];
        let secs = duration.as_secs_f64();
        Self {
            completed: latencies.len() as u64,
            duration,
            avg_latency: sum / latencies.len() as u32,
            p50_latency: percentile(0.50),
            p99_latency: percentile(0.99),
            max_latency: sorted[last],
            ops_per_sec: if secs > 0.0 {
                latencies.len() as f64 / secs
            } else {
                0.0
            },
        }
    }

    pub fn report(&self) -> String {
        format!(
            "Completed: {}, Ops/s: {:.0}, Avg: {:.3}ms, P50: {:.3}ms, P99: {:.3}ms, Max: {:.3}ms",
            self.completed,
            self.ops_per_sec,
            self.avg_latency.as_secs_f64() * 1000.0,
            self.p50_latency.as_secs_f64() * 1000.0,
            self.p99_latency.as_secs_f64() * 1000.0,
            self.max_latency.as_secs_f64() * 1000.0
        )
    }
}

/// Named, fixed-iteration benchmark
pub struct Benchmark {
    name: String,
    iterations: u64,
    warmup: u64,
}

impl Benchmark {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            iterations: 1000,
            warmup: 0,
        }
    }

    pub fn iterations(mut self, n: u64) -> Self {
        self.iterations = n;
        self
    }

    /// Untimed calls made before measuring
    pub fn warmup(mut self, n: u64) -> Self {
        self.warmup = n;
        self
    }

    pub fn run<F: FnMut()>(&self, mut f: F) -> BenchmarkResult {
        for _ in 0..self.warmup {
            f();
        }

        let start = Instant::now();
        let mut latencies = Vec::with_capacity(self.iterations as usize);
        for _ in 0..self.iterations {
            let t = Instant::now();
            f();
            latencies.push(t.elapsed());
        }
        let total = start.elapsed();

        BenchmarkResult {
            name: self.name.clone(),
            stats: LatencyStats::from_latencies(&latencies, total),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub name: String,
    pub stats: LatencyStats,
}

impl BenchmarkResult {
    pub fn report(&self) -> String {
        format!("{}: {}", self.name, self.stats.report())
    }
}
