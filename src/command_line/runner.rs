//! Isolated, deadline-bounded engine runs with peak-memory sampling.
//!
//! Every (formula, engine) pair runs on its own worker thread. The caller
//! waits on a channel until the deadline; when it passes the run's
//! [`Interrupt`] is triggered so the engine stops at its next check, and the
//! caller moves on after a short grace period whether or not the worker has
//! exited.

use anyhow::{Result, anyhow};
use classical_sat::sat::cnf::Formula;
use classical_sat::sat::solver::{Budget, Interrupt, SolutionStats, SolverType, Verdict};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};
use tracing::{debug, warn};

/// DPLL recurses once per decision.
const WORKER_STACK_SIZE: usize = 256 * 1024 * 1024;

const GRACE_PERIOD: Duration = Duration::from_millis(250);

const SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Resource limits applied to every run of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Limits {
    pub timeout: Duration,
    pub max_clauses: Option<usize>,
}

/// A run that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Run {
    pub verdict: Verdict,
    pub elapsed: Duration,
    pub peak_kib: f64,
    pub stats: SolutionStats,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    Completed(Run),
    TimedOut(Duration),
    Aborted(String),
}

/// How a worker finished relative to its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Deadline<T> {
    Finished(T),
    Expired,
    /// The worker dropped its sender without answering, i.e. it panicked.
    Lost,
}

/// Runs `job` on a named worker thread and waits at most `timeout` for it.
///
/// On expiry `interrupt` is triggered and the worker gets [`GRACE_PERIOD`]
/// to wind down before it is left running detached.
pub(crate) fn run_with_deadline<T, F>(
    name: &str,
    timeout: Duration,
    interrupt: &Interrupt,
    job: F,
) -> Result<Deadline<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = channel::bounded(1);
    let handle = thread::Builder::new()
        .name(format!("{name}-worker"))
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || {
            // The receiver is gone once the deadline has passed.
            let _ = tx.send(job());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(value) => {
            let _ = handle.join();
            Ok(Deadline::Finished(value))
        }
        Err(RecvTimeoutError::Timeout) => {
            interrupt.trigger();
            if rx.recv_timeout(GRACE_PERIOD).is_ok() {
                let _ = handle.join();
            } else {
                warn!("{name}: worker still running after the grace period, detaching");
            }
            Ok(Deadline::Expired)
        }
        Err(RecvTimeoutError::Disconnected) => {
            let _ = handle.join();
            Ok(Deadline::Lost)
        }
    }
}

/// Solves `formula` with `kind` under `limits`.
///
/// # Errors
///
/// Only when a worker or sampler thread cannot be spawned, or allocator
/// statistics are unavailable. Engine failures are reported as
/// [`Outcome::Aborted`].
pub(crate) fn run_engine(kind: SolverType, formula: &Formula, limits: Limits) -> Result<Outcome> {
    let interrupt = Interrupt::new();
    let budget = Budget::default()
        .with_max_clauses(limits.max_clauses)
        .with_interrupt(interrupt.clone());
    let formula = formula.clone();

    let sampler = MemorySampler::start()?;
    let finished = run_with_deadline(&kind.to_string(), limits.timeout, &interrupt, move || {
        let start = Instant::now();
        let mut solver = kind.to_impl(formula, budget);
        let result = solver.solve();
        (result, start.elapsed(), solver.stats())
    });
    let peak_kib = sampler.finish();

    let outcome = match finished? {
        Deadline::Finished((Ok(verdict), elapsed, stats)) => Outcome::Completed(Run {
            verdict,
            elapsed,
            peak_kib,
            stats,
        }),
        Deadline::Finished((Err(e), _, _)) => Outcome::Aborted(e.to_string()),
        Deadline::Expired => Outcome::TimedOut(limits.timeout),
        Deadline::Lost => Outcome::Aborted("worker exited without a result".to_string()),
    };
    debug!("{kind}: {outcome:?}");

    Ok(outcome)
}

/// Companion thread recording the highest jemalloc `allocated` figure seen
/// while it runs.
struct MemorySampler {
    stop: Sender<()>,
    handle: JoinHandle<usize>,
    baseline: usize,
}

impl MemorySampler {
    fn start() -> Result<Self> {
        let epoch_mib = epoch::mib().map_err(|e| anyhow!("jemalloc epoch unavailable: {e}"))?;
        let allocated =
            stats::allocated::mib().map_err(|e| anyhow!("jemalloc stats unavailable: {e}"))?;
        epoch_mib
            .advance()
            .map_err(|e| anyhow!("failed to refresh jemalloc stats: {e}"))?;
        let baseline = allocated
            .read()
            .map_err(|e| anyhow!("failed to read jemalloc stats: {e}"))?;

        let (stop, stopped) = channel::bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("memory-sampler".to_string())
            .spawn(move || {
                let mut peak = baseline;
                loop {
                    if epoch_mib.advance().is_ok() {
                        if let Ok(now) = allocated.read() {
                            peak = peak.max(now);
                        }
                    }
                    if !matches!(stopped.recv_timeout(SAMPLE_INTERVAL), Err(RecvTimeoutError::Timeout)) {
                        break peak;
                    }
                }
            })?;

        Ok(Self {
            stop,
            handle,
            baseline,
        })
    }

    /// Stops sampling and returns the peak above the baseline, in KiB.
    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> f64 {
        drop(self.stop);
        let peak = self.handle.join().unwrap_or(self.baseline);
        peak.saturating_sub(self.baseline) as f64 / 1024.0
    }
}
