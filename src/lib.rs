//! # Tickmux
//!
//! A multiplexed periodic timer service with a dedicated dispatch thread.
//!
//! This library lets application code register an arbitrary number of
//! periodic callbacks, each with an independent period, without managing
//! threads, polling loops, or OS timer primitives directly. One background
//! thread blocks on a single readiness multiplexer covering every registered
//! timer plus a shutdown signal, and invokes due callbacks inline.
//!
//! ## Core Problem Solved
//!
//! Periodic work in a long-lived process usually grows organically: one
//! thread sleeping per timer, ad-hoc polling loops, or timers tangled into an
//! unrelated event loop. Those approaches waste threads, drift, and make
//! clean teardown racy. Tickmux multiplexes every periodic source and the
//! shutdown path through one blocking wait:
//!
//! - **One thread, N timers**: a single dispatch thread serves every
//!   registered callback; idle means blocked, never polling
//! - **Dynamic registration**: callbacks can be added from any thread while
//!   the dispatch loop is blocked waiting
//! - **Deterministic teardown**: shutdown is a dedicated wake source; closing
//!   the service joins the dispatch thread before returning
//! - **Strict serialization**: no two callbacks ever run concurrently
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tickmux::core::TimerService;
//!
//! let service = TimerService::new()?;
//!
//! service.add_callback(Duration::from_millis(100), || {
//!     // runs on the dispatch thread every 100ms
//! })?;
//! service.add_callback(Duration::from_secs(5), || {
//!     // independent schedule, same thread
//! })?;
//!
//! // ... let the process run ...
//!
//! service.close()?; // idempotent, blocks until the dispatch thread stops
//! ```
//!
//! Callbacks execute synchronously on the dispatch thread: a slow callback
//! delays all others. That is a deliberate property of the design, not an
//! accident; move heavy work onto your own worker if it matters.
//!
//! For complete scenarios, see `tests/timer_service_test.rs` and
//! `tests/lifecycle_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core timer scheduling: the service, its dispatch loop, and error types.
pub mod core;
/// Configuration models for the timer service.
pub mod config;
/// Builders to construct timer services from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
