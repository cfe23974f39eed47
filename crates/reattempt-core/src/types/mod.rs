//! Type definitions for retry policies and their configuration

mod retry_policy;

pub use retry_policy::*;
