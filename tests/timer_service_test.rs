//! Integration tests for periodic callback scheduling.
//!
//! These tests validate the scheduling contract end to end:
//! - Callbacks fire on their own period, never early
//! - Independent timers do not disturb each other
//! - Callback execution is strictly serialized on one thread
//! - Coalescing: a delayed loop never replays missed periods

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tickmux::core::{TimerError, TimerService};

/// A shared counter a callback can bump.
fn counter_pair() -> (Arc<AtomicU64>, Arc<AtomicU64>) {
    let counter = Arc::new(AtomicU64::new(0));
    (Arc::clone(&counter), counter)
}

#[test]
fn test_callback_fires_within_two_periods() {
    let service = TimerService::new().expect("failed to create service");
    let (counter, fired) = counter_pair();

    service
        .add_callback(Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("failed to register");

    // Three periods of slack for a >= 1 guarantee over a 2x window.
    thread::sleep(Duration::from_millis(150));
    service.close().expect("close failed");

    assert!(
        fired.load(Ordering::SeqCst) >= 1,
        "callback never fired within the observation window"
    );
}

#[test]
fn test_callback_never_fires_before_first_period() {
    let service = TimerService::new().expect("failed to create service");
    let (counter, fired) = counter_pair();

    service
        .add_callback(Duration::from_millis(200), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("failed to register");

    thread::sleep(Duration::from_millis(50));
    assert_eq!(
        fired.load(Ordering::SeqCst),
        0,
        "callback fired before one full period elapsed"
    );

    service.close().expect("close failed");
}

#[test]
fn test_zero_period_rejected_and_mapping_unchanged() {
    let service = TimerService::new().expect("failed to create service");

    let result = service.add_callback(Duration::ZERO, || {});
    assert!(matches!(result, Err(TimerError::InvalidPeriod)));
    assert_eq!(service.stats().registered_timers, 0);

    service.close().expect("close failed");
}

#[test]
fn test_independent_timers_fire_until_shutdown() {
    let service = TimerService::new().expect("failed to create service");
    let (counter_a, fired_a) = counter_pair();
    let (counter_b, fired_b) = counter_pair();

    service
        .add_callback(Duration::from_millis(100), move || {
            counter_a.fetch_add(1, Ordering::SeqCst);
        })
        .expect("failed to register A");
    service
        .add_callback(Duration::from_millis(150), move || {
            counter_b.fetch_add(1, Ordering::SeqCst);
        })
        .expect("failed to register B");

    thread::sleep(Duration::from_millis(1300));

    let start = Instant::now();
    service.close().expect("close failed");
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "close did not return within the bounded timeout"
    );

    // Tolerant bounds: ~13 and ~8 expected over 1.3s.
    let a = fired_a.load(Ordering::SeqCst);
    let b = fired_b.load(Ordering::SeqCst);
    assert!(a >= 8, "100ms timer fired only {a} times");
    assert!(b >= 5, "150ms timer fired only {b} times");

    // No further increments once close has returned.
    thread::sleep(Duration::from_millis(250));
    assert_eq!(fired_a.load(Ordering::SeqCst), a);
    assert_eq!(fired_b.load(Ordering::SeqCst), b);
}

#[test]
fn test_callbacks_never_run_concurrently() {
    let service = TimerService::new().expect("failed to create service");
    let in_flight = Arc::new(AtomicI64::new(0));
    let max_seen = Arc::new(AtomicI64::new(0));

    for period_ms in [10u64, 15, 20, 25] {
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        service
            .add_callback(Duration::from_millis(period_ms), move || {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(current, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
            .expect("failed to register");
    }

    thread::sleep(Duration::from_millis(400));
    service.close().expect("close failed");

    assert!(
        max_seen.load(Ordering::SeqCst) <= 1,
        "observed concurrent callback execution"
    );
    assert!(service.stats().fired_ticks > 0);
}

#[test]
fn test_slow_callback_delays_but_does_not_stop_others() {
    let service = TimerService::new().expect("failed to create service");
    let (slow_counter, slow_fired) = counter_pair();
    let (fast_counter, fast_fired) = counter_pair();

    service
        .add_callback(Duration::from_millis(50), move || {
            slow_counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(30));
        })
        .expect("failed to register slow");
    service
        .add_callback(Duration::from_millis(20), move || {
            fast_counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("failed to register fast");

    thread::sleep(Duration::from_millis(600));
    service.close().expect("close failed");

    // Both keep making progress; serialization delays, never starves.
    assert!(slow_fired.load(Ordering::SeqCst) >= 2);
    assert!(fast_fired.load(Ordering::SeqCst) >= 5);
}

#[test]
fn test_registration_while_dispatch_is_busy() {
    let service = Arc::new(TimerService::new().expect("failed to create service"));
    let (busy_counter, _busy_fired) = counter_pair();

    // Keep the dispatch loop waking frequently while we register.
    service
        .add_callback(Duration::from_millis(5), move || {
            busy_counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("failed to register");

    let fired = Arc::new(AtomicU64::new(0));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let fired = Arc::clone(&fired);
        handles.push(thread::spawn(move || {
            service
                .add_callback(Duration::from_millis(10), move || {
                    fired.fetch_add(1, Ordering::SeqCst);
                })
                .expect("registration raced with dispatch");
        }));
    }
    for handle in handles {
        handle.join().expect("registration thread panicked");
    }

    thread::sleep(Duration::from_millis(150));
    service.close().expect("close failed");

    assert_eq!(service.stats().registered_timers, 9);
    assert!(
        fired.load(Ordering::SeqCst) > 0,
        "timers registered mid-flight never fired"
    );
}

#[test]
fn test_stats_track_fired_ticks() {
    let service = TimerService::new().expect("failed to create service");
    let (counter, _fired) = counter_pair();

    service
        .add_callback(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("failed to register");

    thread::sleep(Duration::from_millis(200));
    service.close().expect("close failed");

    let stats = service.stats();
    assert_eq!(stats.registered_timers, 1);
    assert!(stats.fired_ticks >= 1);
}
