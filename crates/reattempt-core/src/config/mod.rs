//! Configuration loading for retry policies

mod loader;

pub use loader::{RetryConfigLoader, CONFIG_FILE_NAME, ENV_DELAY_MS, ENV_MAX_ATTEMPTS, ENV_TIMEOUT_MS};
