use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use rayon::{
    prelude::{IntoParallelRefIterator, ParallelIterator},
    ThreadPoolBuilder,
};

use crate::{
    config::SweepMode,
    error::ScanError,
    report::Reporter,
    scan::{PortStatus, ProbeEngine, Transport},
};

mod host;
mod port;
mod web;

pub use web::WEB_PORTS;

/// Stops a sweep from dispatching new probes, either on request or once a
/// deadline passes. Probes already in flight still run to their timeout.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    stopped: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            stopped: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn after(budget: Duration) -> Self {
        Self::with_deadline(Instant::now() + budget)
    }

    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stopped.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Results of a sweep in scan order, independent of completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport<I, S> {
    pub entries: Vec<(I, S)>,
    pub elapsed: Duration,
}

impl<I, S> SweepReport<I, S> {
    fn new(entries: Vec<(I, S)>, elapsed: Duration) -> Self {
        Self { entries, elapsed }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (I, S)> {
        self.entries.iter()
    }
}

impl<I: Copy> SweepReport<I, bool> {
    pub fn live(&self) -> impl Iterator<Item = I> + '_ {
        self.entries.iter().filter(|(_, up)| *up).map(|(id, _)| *id)
    }
}

impl SweepReport<u16, PortStatus> {
    pub fn open(&self) -> impl Iterator<Item = u16> + '_ {
        self.with_status(PortStatus::Open)
    }

    pub fn with_status(&self, status: PortStatus) -> impl Iterator<Item = u16> + '_ {
        self.entries
            .iter()
            .filter(move |(_, s)| *s == status)
            .map(|(port, _)| *port)
    }

    pub fn count(&self, status: PortStatus) -> usize {
        self.with_status(status).count()
    }
}

/// Composes single probes of a [`ProbeEngine`] into host and port sweeps.
pub struct Sweeper<'e, T, R> {
    engine: &'e ProbeEngine<T, R>,
    cancel: Cancellation,
}

impl<'e, T: Transport, R: Reporter> Sweeper<'e, T, R> {
    pub fn new(engine: &'e ProbeEngine<T, R>) -> Self {
        Self {
            engine,
            cancel: Cancellation::new(),
        }
    }

    pub fn cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn engine(&self) -> &ProbeEngine<T, R> {
        self.engine
    }

    /// Runs `probe` for every id, sequentially or on a bounded pool, and keeps
    /// the input order in the output. The first error halts dispatch and is
    /// returned once in-flight probes finish.
    fn fan_out<I, S, F>(&self, ids: &[I], probe: F) -> Result<Vec<(I, S)>, ScanError>
    where
        I: Copy + Send + Sync,
        S: Send,
        F: Fn(I) -> Result<S, ScanError> + Sync,
    {
        let halted = AtomicBool::new(false);
        let failure: Mutex<Option<ScanError>> = Mutex::new(None);

        let run = |id: I| -> Option<(I, S)> {
            if halted.load(Ordering::SeqCst) || self.cancel.is_cancelled() {
                return None;
            }

            match probe(id) {
                Ok(status) => Some((id, status)),
                Err(e) => {
                    halted.store(true, Ordering::SeqCst);
                    if let Ok(mut slot) = failure.lock() {
                        slot.get_or_insert(e);
                    }
                    None
                }
            }
        };

        let entries: Vec<(I, S)> = match self.engine.config().mode {
            SweepMode::Sequential => ids.iter().copied().map_while(run).collect(),
            SweepMode::Concurrent { workers } => {
                log::debug!("Sweeping {} targets with {} workers", ids.len(), workers);

                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers.get())
                    .thread_name(|i| format!("sweep-{}", i))
                    .build()
                    .map_err(ScanError::WorkerPoolFailed)?;
                pool.install(|| ids.par_iter().copied().filter_map(run).collect())
            }
        };

        let failure = failure
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match failure {
            Some(e) => Err(e),
            None => Ok(entries),
        }
    }
}
