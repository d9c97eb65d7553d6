//! Wake sources for the dispatch loop: periodic tick sources and the
//! shutdown signal.

use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

/// Stable identifier for a registered periodic source.
///
/// Allocated from a monotonic counter; never reused while the owning service
/// is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SourceId(u64);

impl SourceId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) const fn as_u64(self) -> u64 {
        self.0
    }
}

/// A repeating timer that becomes ready once per elapsed period.
///
/// Backed by a tick channel: the first tick arrives one full period after
/// arming (no immediate fire on registration), then one per period. The
/// channel holds at most one pending tick, so periods that elapse while the
/// dispatcher is busy coalesce rather than replay.
pub(crate) struct PeriodicSource {
    id: SourceId,
    period: Duration,
    ticks: Receiver<Instant>,
}

impl PeriodicSource {
    /// Arm a new source firing every `period`.
    pub(crate) fn arm(id: SourceId, period: Duration) -> Self {
        Self {
            id,
            period,
            ticks: crossbeam_channel::tick(period),
        }
    }

    pub(crate) const fn id(&self) -> SourceId {
        self.id
    }

    pub(crate) const fn period(&self) -> Duration {
        self.period
    }

    /// The receiver registered with the multiplexer.
    pub(crate) const fn ticks(&self) -> &Receiver<Instant> {
        &self.ticks
    }

    /// Drain any ticks still pending beyond the one already received.
    ///
    /// Returns the number of coalesced ticks discarded; missed periods are
    /// never replayed.
    pub(crate) fn drain(&self) -> u64 {
        let mut coalesced = 0;
        while self.ticks.try_recv().is_ok() {
            coalesced += 1;
        }
        coalesced
    }
}

/// Dedicated wake source used only to unblock the dispatch loop for
/// termination. Never carries callback semantics.
pub(crate) struct ShutdownSignal {
    tx: Sender<()>,
}

impl ShutdownSignal {
    /// Create the signal and the receiver the dispatch loop waits on.
    pub(crate) fn new() -> (Self, Receiver<()>) {
        let (tx, rx) = bounded(1);
        (Self { tx }, rx)
    }

    /// Raise the signal. Idempotent: a capacity-one channel absorbs the
    /// first send and silently drops the rest.
    pub(crate) fn raise(&self) {
        let _ = self.tx.try_send(());
    }
}
