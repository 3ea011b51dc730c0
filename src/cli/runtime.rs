use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const LOCAL_ENV_PATH: &str = "config/local.env";
const LOCAL_CONFIG_PATH: &str = "config/flowsmith.yaml";

/// Exports `KEY=VALUE` lines from `config/local.env` for keys not already set.
pub fn load_local_env_overrides() {
    let path = Path::new(LOCAL_ENV_PATH);
    if !path.exists() {
        return;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            for (key, value) in parse_env_lines(&contents) {
                if env::var(&key).is_err() {
                    env::set_var(key, value);
                }
            }
            info!(path = %path.display(), "loaded environment overrides");
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read environment overrides");
        }
    }
}

/// Parses dotenv-style lines, skipping blanks and comments. Malformed entries
/// are logged and skipped.
pub fn parse_env_lines(contents: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(line = idx + 1, "invalid local.env entry; skipping");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            warn!(line = idx + 1, "local.env entry without a key; skipping");
            continue;
        }
        entries.push((key.to_string(), unquote(value.trim())));
    }
    entries
}

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

/// Resolves the config file: explicit path, `./config/flowsmith.yaml`, then the user config dir.
pub fn resolve_config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    let local = PathBuf::from(LOCAL_CONFIG_PATH);
    if local.exists() {
        return Ok(local);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("flowsmith");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = resolve_config_path(explicit)?;

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        config
    } else {
        warn!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };
    config.apply_env();

    Ok(LoadedConfig { config, path })
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}
