//! The dispatch loop: one blocking wait multiplexing every wake source.
//!
//! The loop owns the registration map outright. New registrations arrive
//! over the control channel together with their armed source, so a tick can
//! never be observed for a registration the loop does not yet hold.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use crossbeam_channel::{Receiver, Select};
use tracing::{debug, error, warn};

use super::service::{ServiceShared, ServiceState, TimerRegistration};
use super::source::SourceId;

/// Messages from the service handle to the dispatch loop.
pub(crate) enum ControlMsg {
    /// Hand a freshly armed registration to the loop.
    Register(TimerRegistration),
}

/// The shutdown and control receivers occupy the first two multiplexer
/// slots; tick sources follow in registration-map order.
const FIXED_SOURCES: usize = 2;

/// One decoded wait result.
enum Wake {
    Shutdown,
    OwnerGone,
    Register(TimerRegistration),
    Tick(SourceId),
    SourceLost(SourceId),
}

/// Run the dispatch loop until shutdown. The service's state is set to
/// `Stopped` on the way out regardless of exit reason.
pub(crate) fn run(
    shared: &ServiceShared,
    control_rx: &Receiver<ControlMsg>,
    shutdown_rx: &Receiver<()>,
) {
    let mut registry: HashMap<SourceId, TimerRegistration> = HashMap::new();
    debug!("dispatch loop started");

    loop {
        match next_wake(&registry, control_rx, shutdown_rx) {
            Wake::Shutdown => {
                debug!("shutdown requested, leaving dispatch loop");
                break;
            }
            Wake::OwnerGone => {
                // Losing the control channel without a shutdown signal means
                // the wait set itself is broken; fatal to the loop.
                error!("wait failed: control channel lost without shutdown signal");
                break;
            }
            Wake::Register(registration) => {
                debug!(
                    source = registration.source.id().as_u64(),
                    period_ms = registration.source.period().as_millis() as u64,
                    "timer registered with multiplexer"
                );
                registry.insert(registration.source.id(), registration);
            }
            Wake::Tick(id) => {
                // Shutdown outranks any tick that became ready in the same
                // wake; it is terminal, so skip the callback entirely.
                if shutdown_rx.try_recv().is_ok() {
                    debug!("shutdown requested, leaving dispatch loop");
                    break;
                }
                if let Some(registration) = registry.get_mut(&id) {
                    let coalesced = registration.source.drain();
                    if coalesced > 0 {
                        shared
                            .counters
                            .coalesced_ticks
                            .fetch_add(coalesced, Ordering::Relaxed);
                    }
                    // At most one invocation per wake, however many periods
                    // elapsed.
                    (registration.callback)();
                    shared.counters.fired_ticks.fetch_add(1, Ordering::Relaxed);
                }
                // A tick for an unknown id is a stale wake; silently ignored.
            }
            Wake::SourceLost(id) => {
                // Non-fatal: one broken source must not stop every other
                // registered callback.
                warn!(
                    source = id.as_u64(),
                    "periodic source lost, dropping registration"
                );
                registry.remove(&id);
            }
        }
    }

    *shared.state.lock() = ServiceState::Stopped;
    debug!(registered = registry.len(), "dispatch loop exited");
}

/// Block on the multiplexer until one source is ready and decode it.
fn next_wake(
    registry: &HashMap<SourceId, TimerRegistration>,
    control_rx: &Receiver<ControlMsg>,
    shutdown_rx: &Receiver<()>,
) -> Wake {
    let mut sel = Select::new();
    let shutdown_idx = sel.recv(shutdown_rx);
    let control_idx = sel.recv(control_rx);
    let mut armed = Vec::with_capacity(registry.len());
    for (id, registration) in registry {
        armed.push(*id);
        sel.recv(registration.source.ticks());
    }

    let op = sel.select();
    let idx = op.index();
    if idx == shutdown_idx {
        // A disconnected shutdown sender means the owning service is gone,
        // which is terminal either way.
        let _ = op.recv(shutdown_rx);
        Wake::Shutdown
    } else if idx == control_idx {
        match op.recv(control_rx) {
            Ok(ControlMsg::Register(registration)) => Wake::Register(registration),
            Err(_) => Wake::OwnerGone,
        }
    } else {
        let id = armed[idx - FIXED_SOURCES];
        match op.recv(registry[&id].source.ticks()) {
            Ok(_) => Wake::Tick(id),
            Err(_) => Wake::SourceLost(id),
        }
    }
}
