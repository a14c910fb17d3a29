//! Process-wide singletons: one instance per declaration, constructed at most
//! once, shared by every thread.
//!
//! This crate provides three ways to declare a singleton:
//!
//! - [`Lazy<T, F>`]: built on first access with double-checked locking. The
//!   common path is a single `Acquire` load; only first-time callers ever
//!   touch the lock.
//! - [`Eager<T>`]: built in its `static` initializer, before anyone asks.
//! - [`singleton!`] + [`Singleton`]: the holder idiom. The instance lives in a
//!   `static` local to the type's `instance()` accessor, so the type itself is
//!   the only way in.
//!
//! # Choosing a strategy
//!
//! | Strategy | Constructed | Thread-safe | Cost after first call |
//! |---|---|---|---|
//! | [`Eager`] | in the `static` initializer | yes, no race exists | none |
//! | [`Lazy`] | on first call | yes | one `Acquire` load |
//! | [`singleton!`] | on first call (`lazy`) or up front (`eager`) | yes | as above |
//!
//! Two textbook variants are intentionally missing. An unguarded
//! "check, then store" lazy cell lets two threads both see an empty slot and
//! construct two instances. A lazy cell that takes a mutex on every call is
//! correct but pays for the lock forever. [`Lazy`] keeps the lock off the
//! common path and publishes the instance with `Release`, so no caller can
//! observe a partially constructed value.
//!
//! # Failure
//!
//! Failed construction is never cached. If the constructor panics or
//! [`Lazy::try_instance`] gets `Err`, the cell returns to pending, parked
//! callers wake up, and the next call constructs again.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use poly_singleton::Lazy;
//!
//! static BUILDS: AtomicUsize = AtomicUsize::new(0);
//! static SETTINGS: Lazy<Vec<String>> = Lazy::new(|| {
//!    BUILDS.fetch_add(1, Ordering::Relaxed);
//!    vec!["verbose".to_string()]
//! });
//!
//! std::thread::scope(|s| {
//!    for _ in 0..4 {
//!       s.spawn(|| assert_eq!(SETTINGS.instance()[0], "verbose"));
//!    }
//! });
//! assert_eq!(BUILDS.load(Ordering::Relaxed), 1);
//! ```
//!
//! The [`app`] module shows a complete singleton that reads a
//! [`config::Properties`] file and logs through a [`sink::MessageSink`].

/// Lazily constructed singleton cell.
mod lazy;

/// Eagerly constructed singleton cell.
mod eager;

/// `Singleton` trait and `singleton!` macro.
mod holder;

/// Internal construction state and parking.
mod state;

pub mod app;
pub mod config;
pub mod error;
pub mod sink;

pub use eager::Eager;
pub use error::ConfigError;
pub use holder::Singleton;
pub use lazy::Lazy;
