use std::{num::NonZeroUsize, time::Duration};

pub const PING_TIMEOUT: Duration = Duration::from_secs(2);
pub const TCP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WORKERS: usize = 128;

/// How a sweep fans out its probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// One probe at a time, in scan order.
    Sequential,
    /// At most `workers` probes in flight.
    Concurrent { workers: NonZeroUsize },
}

impl Default for SweepMode {
    fn default() -> Self {
        SweepMode::Concurrent {
            workers: NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub ping_timeout: Duration,
    pub tcp_timeout: Duration,
    pub mode: SweepMode,
    /// Stop a sweep on the first target that can't be resolved instead of
    /// recording it as unreachable and moving on.
    pub abort_on_unresolved: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ping_timeout: PING_TIMEOUT,
            tcp_timeout: TCP_TIMEOUT,
            mode: SweepMode::default(),
            abort_on_unresolved: true,
        }
    }
}

impl ScanConfig {
    pub fn sequential(mut self) -> Self {
        self.mode = SweepMode::Sequential;
        self
    }

    /// Zero workers falls back to sequential sweeps.
    pub fn workers(mut self, workers: usize) -> Self {
        self.mode = match NonZeroUsize::new(workers) {
            Some(workers) => SweepMode::Concurrent { workers },
            None => SweepMode::Sequential,
        };
        self
    }

    pub fn keep_going(mut self) -> Self {
        self.abort_on_unresolved = false;
        self
    }

    pub fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub fn tcp_timeout(mut self, timeout: Duration) -> Self {
        self.tcp_timeout = timeout;
        self
    }
}
