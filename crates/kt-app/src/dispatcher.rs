//! Off-thread trace computation.
//!
//! Integrations run on a rayon pool. Each run sends one [`Completion`] over an
//! mpsc channel; the owning thread pulls completions and is the only place
//! results are written into traces. Every submission gets a generation
//! number: a newer submission for the same trace supersedes (and cancels) the
//! older one, whose completion is then dropped on arrival.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use kt_core::{AccumulatingTimer, TraceId};
use kt_model::{TraceConfig, TraceOutcome};
use kt_sim::{CancelToken, SimResult, TrackLoader, integrate_with_cancel};

use crate::error::{AppError, AppResult};

/// Result of one integration run, as delivered to the owning thread.
#[derive(Debug)]
pub struct Completion {
    pub trace: TraceId,
    pub generation: u64,
    pub result: SimResult<TraceOutcome>,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    cancel: CancelToken,
}

/// Totals over accepted runs. Superseded and cancelled runs are not counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchStats {
    pub completed: u64,
    pub total_compute_s: f64,
    pub average_compute_s: f64,
}

pub struct Dispatcher {
    pool: ThreadPool,
    tracks: Arc<dyn TrackLoader>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: HashMap<TraceId, InFlight>,
    next_generation: u64,
    timer: Arc<AccumulatingTimer>,
}

impl Dispatcher {
    /// Build a dispatcher with `threads` workers (0 lets rayon decide).
    pub fn new(threads: usize, tracks: Arc<dyn TrackLoader>) -> AppResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("kt-worker-{i}"))
            .build()
            .map_err(|e| AppError::Pool(e.to_string()))?;
        let (tx, rx) = channel();
        Ok(Self {
            pool,
            tracks,
            tx,
            rx,
            in_flight: HashMap::new(),
            next_generation: 0,
            timer: Arc::new(AccumulatingTimer::new()),
        })
    }

    /// Start computing `trace` with a snapshot of its configuration.
    ///
    /// A run already in flight for the same trace is cancelled. Returns the
    /// generation of the new run.
    pub fn compute_one(&mut self, trace: TraceId, config: TraceConfig) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = CancelToken::new();
        if let Some(previous) = self.in_flight.insert(
            trace,
            InFlight {
                generation,
                cancel: cancel.clone(),
            },
        ) {
            previous.cancel.cancel();
            debug!(?trace, superseded = previous.generation, "computation superseded");
        }

        let tracks = Arc::clone(&self.tracks);
        let tx = self.tx.clone();
        debug!(?trace, generation, "computation dispatched");
        self.pool.spawn(move || {
            let result = integrate_with_cancel(&config, tracks.as_ref(), &cancel);
            // The receiver only goes away with the dispatcher itself.
            let _ = tx.send(Completion {
                trace,
                generation,
                result,
            });
        });
        generation
    }

    /// Start computing every given trace. Runs are independent and may finish
    /// in any order.
    pub fn compute_all(
        &mut self,
        traces: impl IntoIterator<Item = (TraceId, TraceConfig)>,
    ) -> usize {
        let mut dispatched = 0;
        for (trace, config) in traces {
            self.compute_one(trace, config);
            dispatched += 1;
        }
        dispatched
    }

    /// Cancel the run in flight for `trace`. Its completion will be dropped.
    pub fn cancel(&mut self, trace: TraceId) -> bool {
        match self.in_flight.remove(&trace) {
            Some(run) => {
                run.cancel.cancel();
                debug!(?trace, generation = run.generation, "computation cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let traces: Vec<TraceId> = self.in_flight.keys().copied().collect();
        traces.into_iter().filter(|t| self.cancel(*t)).count()
    }

    pub fn is_running(&self, trace: TraceId) -> bool {
        self.in_flight.contains_key(&trace)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Next current completion, without blocking.
    pub fn try_next(&mut self) -> Option<Completion> {
        while let Ok(completion) = self.rx.try_recv() {
            if self.accept(&completion) {
                return Some(completion);
            }
        }
        None
    }

    /// Next current completion, waiting up to `timeout`. Returns `None` at
    /// once when nothing is in flight.
    pub fn wait_next(&mut self, timeout: Duration) -> Option<Completion> {
        let deadline = Instant::now() + timeout;
        while !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(completion) if self.accept(&completion) => return Some(completion),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            completed: self.timer.count(),
            total_compute_s: self.timer.total_seconds(),
            average_compute_s: self.timer.average_seconds(),
        }
    }

    fn accept(&mut self, completion: &Completion) -> bool {
        let current = self
            .in_flight
            .get(&completion.trace)
            .is_some_and(|run| run.generation == completion.generation);
        if current {
            self.in_flight.remove(&completion.trace);
            if let Ok(outcome) = &completion.result {
                self.timer.record(outcome.compute_time);
            }
        } else {
            debug!(
                trace = ?completion.trace,
                generation = completion.generation,
                "stale completion dropped"
            );
        }
        current
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("threads", &self.pool.current_num_threads())
            .field("in_flight", &self.in_flight)
            .field("next_generation", &self.next_generation)
            .finish_non_exhaustive()
    }
}
