//! Workspace-wide configuration: defaults, then a TOML file overlay, then
//! an environment-variable overlay.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every tunable knob the debug loop and its subsystems read at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShdeConfig {
    /// Minimum score for the Confidence Manager to nominate a patch.
    pub apply_threshold: f32,
    /// Minimum score to attempt a retry after a failure.
    pub retry_threshold: f32,
    /// Maximum escalation attempts per signature.
    pub max_attempts: u32,
    /// Maximum alternate-order retries at the rollback layer.
    pub max_retries: u32,
    /// Maximum outer session retries.
    pub session_max_retries: u32,
    /// Maximum oracle re-prompt attempts.
    pub oracle_prompt_retries: u32,
    /// Threshold below which an oracle patch is rejected without applying.
    pub validation_min_score: f32,
    /// Directory holding `learning_db.json`, `patch_data/`, backups, and the report.
    pub data_dir: PathBuf,
    /// Seed for the Confidence Manager's jitter RNG, for deterministic tests.
    pub rng_seed: u64,
    /// Shell command (program plus fixed arguments) the Test Executor
    /// invokes to run the suite. Target file paths, when the executor is
    /// scoped to a subset of files, are appended after these.
    pub test_command: Vec<String>,
}

impl Default for ShdeConfig {
    fn default() -> Self {
        Self {
            apply_threshold: 0.75,
            retry_threshold: 0.20,
            max_attempts: 3,
            max_retries: 3,
            session_max_retries: 3,
            oracle_prompt_retries: 3,
            validation_min_score: 0.75,
            data_dir: default_data_dir(),
            rng_seed: 0x5FDE_u64,
            test_command: vec!["pytest".to_string()],
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shde")
}

impl ShdeConfig {
    /// Load defaults, then overlay a TOML file (if it exists), then overlay
    /// environment variables.
    pub fn load(toml_path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match toml_path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a config from a TOML file on disk.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(CoreError::ConfigParse)
    }

    /// Overlay `SHDE_*` environment variables onto an existing config.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SHDE_APPLY_THRESHOLD") {
            if let Ok(parsed) = v.parse() {
                self.apply_threshold = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_RETRY_THRESHOLD") {
            if let Ok(parsed) = v.parse() {
                self.retry_threshold = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_MAX_ATTEMPTS") {
            if let Ok(parsed) = v.parse() {
                self.max_attempts = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_MAX_RETRIES") {
            if let Ok(parsed) = v.parse() {
                self.max_retries = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_SESSION_MAX_RETRIES") {
            if let Ok(parsed) = v.parse() {
                self.session_max_retries = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_ORACLE_PROMPT_RETRIES") {
            if let Ok(parsed) = v.parse() {
                self.oracle_prompt_retries = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_VALIDATION_MIN_SCORE") {
            if let Ok(parsed) = v.parse() {
                self.validation_min_score = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SHDE_RNG_SEED") {
            if let Ok(parsed) = v.parse() {
                self.rng_seed = parsed;
            }
        }
        if let Ok(v) = std::env::var("SHDE_TEST_COMMAND") {
            let parts: Vec<String> = v.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                self.test_command = parts;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = ShdeConfig::default();
        assert!((config.apply_threshold - 0.75).abs() < f32::EPSILON);
        assert!((config.retry_threshold - 0.20).abs() < f32::EPSILON);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.session_max_retries, 3);
        assert_eq!(config.oracle_prompt_retries, 3);
        assert!((config.validation_min_score - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn toml_overlay_applies() {
        let toml = r#"
apply_threshold = 0.9
max_attempts = 5
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shde.toml");
        std::fs::write(&path, toml).unwrap();
        let config = ShdeConfig::from_file(&path).unwrap();
        assert!((config.apply_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.max_attempts, 5);
        // Untouched fields keep their default.
        assert_eq!(config.max_retries, 3);
    }
}
