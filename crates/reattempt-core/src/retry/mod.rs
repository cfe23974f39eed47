//! Synchronous retry executor
//!
//! Runs a fallible operation on the calling thread and re-invokes it under a
//! stopping policy: a fixed number of attempts or a deadline.
//!
//! # Features
//!
//! - One executor for value-returning and unit operations (`FnMut() -> Result<T, E>`)
//! - Failure classifiers, including category matching via `Categorized`
//! - An optional recovery target reloaded before every retry
//! - An optional fixed delay before every retry
//! - Observable retries via the `RetryObserver` trait, with a built-in `TracingObserver`
//!
//! # Example
//!
//! ```rust
//! use reattempt_core::retry::{CategoryClassifier, Categorized, RetryExecutorBuilder};
//! use reattempt_core::types::RetryPolicy;
//! use std::cell::Cell;
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Kind {
//!     NotSynced,
//!     Denied,
//! }
//!
//! #[derive(Debug)]
//! struct DirectoryError(Kind);
//!
//! impl std::fmt::Display for DirectoryError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self.0)
//!     }
//! }
//!
//! impl Categorized for DirectoryError {
//!     type Category = Kind;
//!
//!     fn category(&self) -> Kind {
//!         self.0
//!     }
//! }
//!
//! let calls = Cell::new(0);
//! let user = RetryExecutorBuilder::new()
//!     .with_policy(RetryPolicy::attempts(3))
//!     .with_classifier(CategoryClassifier::only(Kind::NotSynced))
//!     .build()
//!     .execute(|| {
//!         calls.set(calls.get() + 1);
//!         if calls.get() < 3 {
//!             Err(DirectoryError(Kind::NotSynced))
//!         } else {
//!             Ok("jdoe")
//!         }
//!     })
//!     .unwrap();
//!
//! assert_eq!(user, "jdoe");
//! ```

mod classifier;
mod error;
mod executor;
mod observer;
mod reload;

pub use classifier::{
    AlwaysRetry, Categorized, CategoryClassifier, ClosureClassifier, FailureClassifier, NeverRetry,
};
pub use error::RetryError;
pub use executor::{retry, retry_with_policy, RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use reload::Reloadable;
