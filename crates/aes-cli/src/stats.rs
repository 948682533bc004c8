//! Summary statistics for the `bench` command.

use std::time::Duration;

use aes_link::BLOCK_LEN;

/// Hardware time for `cycles` at `clock_mhz`, in microseconds.
pub fn cycles_to_us(cycles: f64, clock_mhz: f64) -> f64 {
    cycles / clock_mhz
}

/// Blocks pushed through the link over a fixed wall-clock window.
#[derive(Debug, Clone, Copy)]
pub struct Throughput {
    pub blocks: u64,
    pub elapsed: Duration,
    pub total_cycles: u64,
}

impl Throughput {
    pub fn blocks_per_sec(&self) -> f64 {
        self.blocks as f64 / self.elapsed.as_secs_f64()
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.blocks_per_sec() * BLOCK_LEN as f64
    }

    pub fn kbps(&self) -> f64 {
        self.bytes_per_sec() * 8.0 / 1000.0
    }

    pub fn avg_cycles(&self) -> f64 {
        if self.blocks == 0 {
            return 0.0;
        }
        self.total_cycles as f64 / self.blocks as f64
    }
}

/// Round-trip latency distribution, in milliseconds, plus hardware cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Latency {
    pub samples: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_cycles: u32,
    pub max_cycles: u32,
    pub avg_cycles: f64,
}

impl Latency {
    /// Summarizes paired samples; `None` when there are none.
    pub fn from_samples(mut latencies_ms: Vec<f64>, cycles: &[u32]) -> Option<Self> {
        if latencies_ms.is_empty() || cycles.is_empty() {
            return None;
        }
        latencies_ms.sort_by(f64::total_cmp);
        let n = latencies_ms.len();
        // Nearest-rank below: index floor(n * q).
        let rank = |q: f64| latencies_ms[((n as f64 * q) as usize).min(n - 1)];

        Some(Self {
            samples: n,
            min_ms: latencies_ms[0],
            max_ms: latencies_ms[n - 1],
            avg_ms: latencies_ms.iter().sum::<f64>() / n as f64,
            median_ms: latencies_ms[n / 2],
            p95_ms: rank(0.95),
            p99_ms: rank(0.99),
            min_cycles: cycles.iter().copied().min()?,
            max_cycles: cycles.iter().copied().max()?,
            avg_cycles: cycles.iter().map(|&c| u64::from(c)).sum::<u64>() as f64
                / cycles.len() as f64,
        })
    }
}
