//! Operator configuration.
//!
//! Loaded from YAML; secrets come from the environment and override the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const ORACLE_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const TASK_RUNNER_KEY_ENV: &str = "SKYVERN_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub oracle: OracleSettings,
    pub task_runner: TaskRunnerSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Marqo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub marqo_url: String,
    /// Snapshot file for the memory backend; no persistence when unset.
    pub data_path: Option<PathBuf>,
    pub min_score: f64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            marqo_url: "http://localhost:8882".to_string(),
            data_path: Some(PathBuf::from("data/flowsmith-store.json")),
            min_score: flow_engine::DEFAULT_MIN_SCORE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub extraction_max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: reasoning_oracle::anthropic::DEFAULT_MODEL.to_string(),
            api_base: reasoning_oracle::anthropic::DEFAULT_API_BASE.to_string(),
            max_tokens: 4096,
            extraction_max_tokens: 1000,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl OracleSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRunnerSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub proxy_location: Option<String>,
}

impl Default for TaskRunnerSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.skyvern.com/api/v1".to_string(),
            poll_interval_secs: 10,
            timeout_secs: 3000,
            request_timeout_secs: 60,
            proxy_location: Some("RESIDENTIAL".to_string()),
        }
    }
}

impl TaskRunnerSettings {
    pub fn poll_policy(&self) -> task_runner::PollPolicy {
        task_runner::PollPolicy::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

impl Config {
    /// Applies credentials from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ORACLE_KEY_ENV).filter(|value| !value.is_empty()) {
            self.oracle.api_key = Some(key);
        }
        if let Some(key) = lookup(TASK_RUNNER_KEY_ENV).filter(|value| !value.is_empty()) {
            self.task_runner.api_key = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "store:\n  backend: marqo\ntask_runner:\n  poll_interval_secs: 2\n",
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Marqo);
        assert_eq!(config.store.marqo_url, "http://localhost:8882");
        assert_eq!(config.task_runner.poll_interval_secs, 2);
        assert_eq!(config.task_runner.timeout_secs, 3000);
        assert_eq!(config.oracle.max_tokens, 4096);
    }

    #[test]
    fn environment_overrides_file_keys() {
        let mut config: Config =
            serde_yaml::from_str("oracle:\n  api_key: from-file\n").unwrap();
        config.apply_env_from(|key| match key {
            ORACLE_KEY_ENV => Some("from-env".to_string()),
            TASK_RUNNER_KEY_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.oracle.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.task_runner.api_key, None);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = Config::default();
        config.oracle.api_key = Some("secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
