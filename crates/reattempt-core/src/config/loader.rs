//! Layered retry policy loader
//!
//! Loads retry policies from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Config file (`~/.reattempt/retry.yaml`, or an explicit path)
//! 3. Environment variables (`REATTEMPT_*` prefix, applied to the default policy)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{RetryPoliciesConfig, RetryPolicy, StoppingPolicy};
use crate::utils::get_home_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::time::Duration;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// File name looked up in the config directory
pub const CONFIG_FILE_NAME: &str = "retry.yaml";

/// Overrides the default policy's attempt count
pub const ENV_MAX_ATTEMPTS: &str = "REATTEMPT_MAX_ATTEMPTS";

/// Switches the default policy to a deadline with this timeout
pub const ENV_TIMEOUT_MS: &str = "REATTEMPT_TIMEOUT_MS";

/// Overrides the default policy's delay
pub const ENV_DELAY_MS: &str = "REATTEMPT_DELAY_MS";

const EMBEDDED_DEFAULTS: &str = "retry-defaults.yaml";

/// A policy file layered over the embedded defaults
///
/// Unlike [`RetryPoliciesConfig`], an absent `default` leaves the lower
/// layer's default in place.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PoliciesOverlay {
    #[serde(default)]
    default: Option<RetryPolicy>,

    #[serde(default)]
    operations: HashMap<String, RetryPolicy>,
}

/// Retry policy configuration loader
pub struct RetryConfigLoader {
    /// Directory searched for `retry.yaml`
    config_dir: Utf8PathBuf,
}

impl RetryConfigLoader {
    /// Create a loader for the standard config directory (~/.reattempt)
    pub fn new() -> Result<Self> {
        let home = get_home_dir().map_err(|e| Error::invalid_config(e.to_string()))?;
        let home = Utf8PathBuf::from_path_buf(home).map_err(|p| {
            Error::invalid_config(format!("Home directory is not valid UTF-8: {}", p.display()))
        })?;

        Ok(Self {
            config_dir: home.join(".reattempt"),
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// The directory searched for `retry.yaml`
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load policies from the embedded defaults, the config directory and the environment
    ///
    /// A missing `retry.yaml` is not an error.
    pub fn load(&self) -> Result<RetryPoliciesConfig> {
        let mut config = Self::load_embedded()?;

        let path = self.config_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            tracing::debug!(path = %path, "loading retry policies");
            config = Self::merge(config, Self::load_yaml_file(&path)?);
        }

        Self::finish(config)
    }

    /// Load policies from the embedded defaults, an explicit file and the environment
    pub fn load_file(&self, path: &Utf8Path) -> Result<RetryPoliciesConfig> {
        let overlay = Self::load_yaml_file(path)?;
        let config = Self::merge(Self::load_embedded()?, overlay);

        Self::finish(config)
    }

    fn finish(config: RetryPoliciesConfig) -> Result<RetryPoliciesConfig> {
        let config = Self::apply_env_overrides(config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load the embedded defaults
    fn load_embedded() -> Result<RetryPoliciesConfig> {
        let embedded_file = EmbeddedConfigs::get(EMBEDDED_DEFAULTS).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", EMBEDDED_DEFAULTS))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!(
                "Invalid UTF-8 in embedded config: {}",
                EMBEDDED_DEFAULTS
            ))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                EMBEDDED_DEFAULTS, e
            ))
        })
    }

    /// Load a YAML policy file
    fn load_yaml_file(path: &Utf8Path) -> Result<PoliciesOverlay> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        if content.trim().is_empty() {
            return Ok(PoliciesOverlay::default());
        }

        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Merge a file over the current policies (operations are merged by name)
    fn merge(mut base: RetryPoliciesConfig, overlay: PoliciesOverlay) -> RetryPoliciesConfig {
        if let Some(default) = overlay.default {
            base.default = default;
        }
        base.operations.extend(overlay.operations);
        base
    }

    /// Apply environment variable overrides to the default policy
    fn apply_env_overrides(mut config: RetryPoliciesConfig) -> Result<RetryPoliciesConfig> {
        let max_attempts = Self::env_number(ENV_MAX_ATTEMPTS)?;
        let timeout_ms = Self::env_number(ENV_TIMEOUT_MS)?;

        match (max_attempts, timeout_ms) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid_config(format!(
                    "{} and {} cannot both be set",
                    ENV_MAX_ATTEMPTS, ENV_TIMEOUT_MS
                )))
            }
            (Some(n), None) => {
                let n = u32::try_from(n).map_err(|_| {
                    Error::invalid_config(format!("{} is out of range", ENV_MAX_ATTEMPTS))
                })?;
                config.default.stopping = StoppingPolicy::Attempts(n);
            }
            (None, Some(ms)) => {
                config.default.stopping = StoppingPolicy::Deadline(Duration::from_millis(ms));
            }
            (None, None) => {}
        }

        if let Some(ms) = Self::env_number(ENV_DELAY_MS)? {
            config.default.delay = Some(Duration::from_millis(ms));
        }

        Ok(config)
    }

    fn env_number(name: &str) -> Result<Option<u64>> {
        match env::var(name) {
            Ok(val) => val
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Error::invalid_config(format!("{} must be a valid number", name))),
            Err(_) => Ok(None),
        }
    }

    /// Validate every loaded policy
    fn validate(config: &RetryPoliciesConfig) -> Result<()> {
        config
            .default
            .validate()
            .map_err(|reason| Error::invalid_policy("default", reason))?;

        for (name, policy) in &config.operations {
            policy
                .validate()
                .map_err(|reason| Error::invalid_policy(name.as_str(), reason))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PolicyError;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        env::remove_var(ENV_MAX_ATTEMPTS);
        env::remove_var(ENV_TIMEOUT_MS);
        env::remove_var(ENV_DELAY_MS);
    }

    fn temp_loader() -> (TempDir, RetryConfigLoader) {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, RetryConfigLoader::with_dir(path))
    }

    #[test]
    #[serial]
    fn test_embedded_defaults() {
        clear_env();
        let (_dir, loader) = temp_loader();

        let config = loader.load().unwrap();
        assert_eq!(config.default, RetryPolicy::attempts(2));
        assert_eq!(
            config.policy_for("external-api"),
            &RetryPolicy::attempts(3).with_delay(Duration::from_millis(500))
        );
        assert_eq!(
            config.policy_for("directory-sync").timeout(),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    #[serial]
    fn test_file_overrides_embedded() {
        clear_env();
        let (_dir, loader) = temp_loader();
        fs::write(
            loader.config_dir().join(CONFIG_FILE_NAME),
            "operations:\n  external-api:\n    max-attempts: 7\n  billing:\n    timeout-ms: 700\n",
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.policy_for("external-api").max_attempts(), Some(7));
        assert_eq!(config.policy_for("external-api").delay, None);
        assert_eq!(
            config.policy_for("billing").timeout(),
            Some(Duration::from_millis(700))
        );
        // Untouched embedded operations survive, as does the embedded default.
        assert!(config.operations.contains_key("directory-sync"));
        assert_eq!(config.default, RetryPolicy::attempts(2));
    }

    #[test]
    #[serial]
    fn test_file_default_replaces_embedded_default() {
        clear_env();
        let (_dir, loader) = temp_loader();
        fs::write(
            loader.config_dir().join(CONFIG_FILE_NAME),
            "default:\n  timeout-ms: 900\n  delay-ms: 100\n",
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(
            config.default,
            RetryPolicy::deadline(Duration::from_millis(900)).with_delay(Duration::from_millis(100))
        );
    }

    #[test]
    #[serial]
    fn test_load_explicit_missing_file() {
        clear_env();
        let (_dir, loader) = temp_loader();
        let missing = loader.config_dir().join("nope.yaml");

        let err = loader.load_file(&missing).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_invalid_file_is_rejected() {
        clear_env();
        let (_dir, loader) = temp_loader();
        let path = loader.config_dir().join("bad.yaml");
        fs::write(&path, "default:\n  max-attempts: 0\n").unwrap();

        let err = loader.load_file(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    #[serial]
    fn test_malformed_yaml_names_the_file() {
        clear_env();
        let (_dir, loader) = temp_loader();
        let path = loader.config_dir().join("broken.yaml");
        fs::write(&path, "operations: [not, a, map\n").unwrap();

        match loader.load_file(&path) {
            Err(Error::InvalidConfig { message }) => assert!(message.contains("broken.yaml")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_conflicting_bounds_in_file() {
        clear_env();
        let (_dir, loader) = temp_loader();
        let path = loader.config_dir().join("both.yaml");
        fs::write(&path, "default:\n  max-attempts: 3\n  timeout-ms: 10\n").unwrap();

        match loader.load_file(&path) {
            Err(Error::InvalidConfig { message }) => {
                assert!(message.contains("mutually exclusive"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_empty_file_keeps_defaults() {
        clear_env();
        let (_dir, loader) = temp_loader();
        let path = loader.config_dir().join("empty.yaml");
        fs::write(&path, "\n").unwrap();

        let config = loader.load_file(&path).unwrap();
        assert_eq!(config.default, RetryPolicy::attempts(2));
    }

    #[test]
    #[serial]
    fn test_env_overrides_default_policy() {
        clear_env();
        let (_dir, loader) = temp_loader();
        env::set_var(ENV_TIMEOUT_MS, "700");
        env::set_var(ENV_DELAY_MS, "25");

        let config = loader.load();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.default.timeout(), Some(Duration::from_millis(700)));
        assert_eq!(config.default.delay(), Duration::from_millis(25));
    }

    #[test]
    #[serial]
    fn test_env_conflicting_bounds() {
        clear_env();
        let (_dir, loader) = temp_loader();
        env::set_var(ENV_MAX_ATTEMPTS, "3");
        env::set_var(ENV_TIMEOUT_MS, "700");

        let result = loader.load();
        clear_env();

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    #[serial]
    fn test_env_zero_attempts_fails_validation() {
        clear_env();
        let (_dir, loader) = temp_loader();
        env::set_var(ENV_MAX_ATTEMPTS, "0");

        let result = loader.load();
        clear_env();

        assert!(matches!(
            result,
            Err(Error::InvalidPolicy {
                ref name,
                source: PolicyError::ZeroAttempts,
            }) if name == "default"
        ));
    }

    #[test]
    #[serial]
    fn test_env_not_a_number() {
        clear_env();
        let (_dir, loader) = temp_loader();
        env::set_var(ENV_DELAY_MS, "soon");

        let result = loader.load();
        clear_env();

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
