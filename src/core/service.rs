//! The timer service: registration surface, lifecycle, and shutdown.
//!
//! A `TimerService` owns one dedicated dispatch thread. The thread blocks on
//! a readiness multiplexer covering a shutdown signal, a control channel for
//! new registrations, and every registered periodic source; due callbacks run
//! inline on that thread, strictly serialized.
//!
//! # Design
//!
//! - **No polling**: the dispatch thread sleeps inside one blocking wait
//! - **Registration travels with the wake**: a new callback is handed to the
//!   loop over the control channel together with its armed source, so the
//!   loop can never observe a tick for a registration it does not yet hold
//! - **Clean shutdown**: `close` raises the shutdown signal and joins the
//!   dispatch thread before returning

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::TimerServiceConfig;

use super::dispatch::{self, ControlMsg};
use super::error::TimerError;
use super::source::{PeriodicSource, ShutdownSignal, SourceId};

/// Lifecycle states of a [`TimerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed, dispatch thread not yet confirmed running.
    Created,
    /// Dispatch loop is running; registration is allowed.
    Running,
    /// Shutdown has been signalled; the dispatch thread is winding down.
    ShuttingDown,
    /// The dispatch thread has exited; the service is inert.
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A registered periodic callback, executed on the dispatch thread.
pub(crate) type Callback = Box<dyn FnMut() + Send + 'static>;

/// Associates one periodic source with the callback it drives.
///
/// Owned by the dispatch thread for the life of the service; there is no
/// per-registration removal.
pub(crate) struct TimerRegistration {
    pub(crate) source: PeriodicSource,
    pub(crate) callback: Callback,
}

/// Internal counters for service statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct ServiceCounters {
    pub(crate) registered_timers: AtomicUsize,
    pub(crate) fired_ticks: AtomicU64,
    pub(crate) coalesced_ticks: AtomicU64,
}

impl ServiceCounters {
    /// Get a snapshot of current statistics.
    pub(crate) fn snapshot(&self) -> ServiceStats {
        ServiceStats {
            registered_timers: self.registered_timers.load(Ordering::Relaxed),
            fired_ticks: self.fired_ticks.load(Ordering::Relaxed),
            coalesced_ticks: self.coalesced_ticks.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about timer registrations and dispatch activity.
#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    /// Number of callbacks registered over the service's lifetime.
    pub registered_timers: usize,
    /// Total callback invocations performed by the dispatch loop.
    pub fired_ticks: u64,
    /// Elapsed periods that were drained without replay because the
    /// dispatch thread was busy when they fired.
    pub coalesced_ticks: u64,
}

/// State shared between the service handle and its dispatch thread.
pub(crate) struct ServiceShared {
    pub(crate) state: Mutex<ServiceState>,
    pub(crate) counters: ServiceCounters,
}

/// A multi-timer callback scheduler backed by one dispatch thread.
///
/// All registered callbacks execute on that single thread, strictly
/// serialized; a slow callback delays every other one. The only blocking
/// operations are the dispatch thread's own multiplexer wait and the join
/// performed by [`close`](TimerService::close).
///
/// # Example
///
/// ```
/// use tickmux::core::TimerService;
///
/// let service = TimerService::new().unwrap();
/// service.close().unwrap();
/// ```
pub struct TimerService {
    /// Service configuration.
    config: TimerServiceConfig,

    /// State and counters shared with the dispatch thread.
    shared: Arc<ServiceShared>,

    /// Registration hand-off to the dispatch loop.
    control_tx: Sender<ControlMsg>,

    /// Wake source used exactly once to unblock the loop for teardown.
    shutdown: ShutdownSignal,

    /// Dispatch thread handle. Taken exactly once; a concurrent `close`
    /// blocks on the mutex until the join completes.
    dispatch: Mutex<Option<JoinHandle<()>>>,

    /// Source identifier allocator (lock-free atomic).
    next_source_id: AtomicU64,
}

impl TimerService {
    /// Create a timer service with the default configuration.
    ///
    /// The dispatch thread starts immediately.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::ResourceExhausted` if the OS refuses to spawn
    /// the dispatch thread.
    pub fn new() -> Result<Self, TimerError> {
        Self::with_config(TimerServiceConfig::default())
    }

    /// Create a timer service with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidConfig` if the configuration fails
    /// validation, or `TimerError::ResourceExhausted` if the OS refuses to
    /// spawn the dispatch thread. Neither failure leaves a half-started
    /// loop behind.
    pub fn with_config(config: TimerServiceConfig) -> Result<Self, TimerError> {
        config.validate().map_err(TimerError::InvalidConfig)?;

        let (shutdown, shutdown_rx) = ShutdownSignal::new();
        let (control_tx, control_rx) = bounded(config.control_queue_depth);
        let shared = Arc::new(ServiceShared {
            state: Mutex::new(ServiceState::Created),
            counters: ServiceCounters::default(),
        });

        let loop_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .stack_size(config.thread_stack_size)
            .spawn(move || dispatch::run(&loop_shared, &control_rx, &shutdown_rx))
            .map_err(|e| {
                TimerError::ResourceExhausted(format!("failed to spawn dispatch thread: {e}"))
            })?;

        *shared.state.lock() = ServiceState::Running;

        info!(
            thread = %config.thread_name,
            max_timers = config.max_timers,
            "timer service started"
        );

        Ok(Self {
            config,
            shared,
            control_tx,
            shutdown,
            dispatch: Mutex::new(Some(handle)),
            next_source_id: AtomicU64::new(0),
        })
    }

    /// Register a periodic callback.
    ///
    /// The callback first fires one full `period` after registration (never
    /// immediately) and then once per period until the service is closed.
    /// There is no per-callback cancellation. May be called from any thread
    /// concurrently with the dispatch loop, and never blocks waiting for a
    /// tick.
    ///
    /// `Duration` cannot be negative, so the strictly-positive period
    /// invariant collapses to "non-zero" here.
    ///
    /// # Errors
    ///
    /// - `TimerError::InvalidPeriod` if `period` is zero (no side effects)
    /// - `TimerError::InvalidState` if the service is not running
    /// - `TimerError::ResourceExhausted` if the timer limit is reached or
    ///   the control queue is full
    pub fn add_callback<F>(&self, period: Duration, callback: F) -> Result<(), TimerError>
    where
        F: FnMut() + Send + 'static,
    {
        if period.is_zero() {
            return Err(TimerError::InvalidPeriod);
        }

        // The state lock is held across the hand-off so a concurrent close()
        // cannot slip between the Running check and the multiplexer
        // registration.
        let mut state = self.shared.state.lock();
        if *state != ServiceState::Running {
            return Err(TimerError::InvalidState(*state));
        }

        let registered = self
            .shared
            .counters
            .registered_timers
            .load(Ordering::Relaxed);
        if registered >= self.config.max_timers {
            return Err(TimerError::ResourceExhausted(format!(
                "timer limit reached ({} max)",
                self.config.max_timers
            )));
        }

        let id = SourceId::new(self.next_source_id.fetch_add(1, Ordering::Relaxed));
        let registration = TimerRegistration {
            source: PeriodicSource::arm(id, period),
            callback: Box::new(callback),
        };

        match self.control_tx.try_send(ControlMsg::Register(registration)) {
            Ok(()) => {
                self.shared
                    .counters
                    .registered_timers
                    .fetch_add(1, Ordering::Relaxed);
                debug!(
                    source = id.as_u64(),
                    period_ms = period.as_millis() as u64,
                    "callback registered"
                );
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(TimerError::ResourceExhausted(
                "control queue full".to_string(),
            )),
            Err(TrySendError::Disconnected(_)) => {
                // The dispatch thread is gone without a close(); report the
                // terminal state rather than pretending to register.
                *state = ServiceState::Stopped;
                Err(TimerError::InvalidState(ServiceState::Stopped))
            }
        }
    }

    /// Get current service statistics.
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        self.shared.counters.snapshot()
    }

    /// Get the service's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self.shared.state.lock()
    }

    /// Shut the service down and wait for the dispatch thread to stop.
    ///
    /// Idempotent: the shutdown signal is raised at most once, and the
    /// thread is joined exactly once. A concurrent second call blocks until
    /// the join completes, then returns. Safe to call even if no callback
    /// was ever registered.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::WaitFailed` if the dispatch thread panicked;
    /// the service still ends in `Stopped`.
    pub fn close(&self) -> Result<(), TimerError> {
        {
            let mut state = self.shared.state.lock();
            if matches!(*state, ServiceState::Created | ServiceState::Running) {
                *state = ServiceState::ShuttingDown;
                info!("timer service shutting down");
            }
        }

        self.shutdown.raise();

        let mut dispatch = self.dispatch.lock();
        if let Some(handle) = dispatch.take() {
            let joined = handle.join();
            *self.shared.state.lock() = ServiceState::Stopped;
            joined.map_err(|_| TimerError::WaitFailed("dispatch thread panicked".to_string()))?;
            debug!("dispatch thread joined");
        }
        Ok(())
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "timer service close failed during drop");
        }
    }
}
