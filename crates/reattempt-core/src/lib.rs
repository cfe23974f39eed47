//! # reattempt-core
//!
//! Core library for reattempt providing:
//! - A synchronous retry executor with count- and deadline-bounded stopping policies
//! - Failure classifiers, recovery targets and retry observers
//! - Serializable retry policies and a layered configuration loader

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

pub use config::RetryConfigLoader;
pub use error::{Error, Result};
pub use retry::{retry, retry_with_policy, Reloadable, RetryError, RetryExecutorBuilder};
pub use types::{PolicyError, RetryPoliciesConfig, RetryPolicy, StoppingPolicy};
pub use utils::get_home_dir;
