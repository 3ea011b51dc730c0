use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::app_context::AppContext;
use crate::config::Config;

use super::output::OutputFormat;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    output: OutputFormat,
    cancel: CancellationToken,
    app_context: OnceCell<Arc<AppContext>>,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
            cancel: CancellationToken::new(),
            app_context: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Token cancelled on Ctrl-C; shared with every engine this context builds.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Engine wiring, built on first use.
    pub async fn app_context(&self) -> Result<Arc<AppContext>> {
        self.app_context
            .get_or_try_init(|| async {
                AppContext::from_config(&self.config, self.cancel.clone())
                    .await
                    .map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }
}
