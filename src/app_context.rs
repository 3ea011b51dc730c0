//! Explicit wiring of the store, oracle and task runner handles.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use flow_engine::{Engine, EngineConfig, PlannerConfig};
use flowsmith_doc_store::{DocumentStore, MarqoConfig, MarqoDocumentStore, MemoryDocumentStore};
use reasoning_oracle::{ClaudeConfig, ClaudeOracle, ReasoningOracle};
use task_runner::{SkyvernClient, SkyvernConfig, TaskRunner};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, StoreBackend, ORACLE_KEY_ENV, TASK_RUNNER_KEY_ENV};

pub struct AppContext {
    engine: Engine,
}

impl AppContext {
    /// Builds the configured store, oracle and task runner clients.
    pub async fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let store = build_store(config)?;
        let oracle = build_oracle(config)?;
        let runner = build_runner(config)?;
        Self::with_services(config, store, runner, oracle, cancel).await
    }

    /// Wires the engine over caller-supplied collaborators.
    pub async fn with_services(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        runner: Arc<dyn TaskRunner>,
        oracle: Arc<dyn ReasoningOracle>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let engine_config = EngineConfig {
            min_score: config.store.min_score,
            poll: config.task_runner.poll_policy(),
            planner: PlannerConfig {
                max_tokens: config.oracle.max_tokens,
                extraction_max_tokens: config.oracle.extraction_max_tokens,
            },
            cancel: Some(cancel),
        };
        let engine = Engine::bootstrap(store, runner, oracle, engine_config)
            .await
            .context("failed to initialise the flow engine")?;
        Ok(Self { engine })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

fn build_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            let store = match &config.store.data_path {
                Some(path) => {
                    info!(path = %path.display(), "using file-backed memory store");
                    MemoryDocumentStore::with_persistence(path)
                        .with_context(|| format!("failed to open store at {}", path.display()))?
                }
                None => {
                    warn!("store has no data_path; records are lost on exit");
                    MemoryDocumentStore::new()
                }
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Marqo => {
            info!(url = %config.store.marqo_url, "using marqo store");
            let store = MarqoDocumentStore::new(MarqoConfig {
                url: config.store.marqo_url.clone(),
                ..MarqoConfig::default()
            })
            .context("failed to create marqo client")?;
            Ok(Arc::new(store))
        }
    }
}

fn build_oracle(config: &Config) -> Result<Arc<dyn ReasoningOracle>> {
    let settings = &config.oracle;
    if settings.api_key.is_none() {
        warn!("{ORACLE_KEY_ENV} is not set; planning requests will be rejected");
    }
    let oracle = ClaudeOracle::new(ClaudeConfig {
        api_key: settings.api_key.clone().unwrap_or_default(),
        model: settings.model.clone(),
        api_base: settings.api_base.clone(),
        temperature: settings.temperature,
        timeout: settings.timeout(),
    })
    .context("failed to create oracle client")?;
    Ok(Arc::new(oracle))
}

fn build_runner(config: &Config) -> Result<Arc<dyn TaskRunner>> {
    let settings = &config.task_runner;
    if settings.api_key.is_none() {
        warn!("{TASK_RUNNER_KEY_ENV} is not set; task dispatch will be rejected");
    }
    let runner = SkyvernClient::new(SkyvernConfig {
        api_key: settings.api_key.clone().unwrap_or_default(),
        base_url: settings.base_url.clone(),
        proxy_location: settings.proxy_location.clone(),
        request_timeout: Duration::from_secs(settings.request_timeout_secs),
    })
    .context("failed to create task runner client")?;
    Ok(Arc::new(runner))
}
