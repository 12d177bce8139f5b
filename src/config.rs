use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub mod goproxy;
pub mod logging;
pub mod reliability;


pub use goproxy::GoproxyConfig;
pub use logging::LoggingConfig;
pub use reliability::RetryConfig;

pub const DEFAULT_CONFIG_FILE: &str = "goproxy.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub goproxy: GoproxyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Read and parse `path`, or `None` when the file does not exist.
    ///
    /// Does not log; callers decide how to report a missing file once
    /// tracing is up.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config =
            toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let candidate = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        match Self::read(&candidate)? {
            Some(config) => Ok(config),
            None => {
                tracing::warn!(
                    path = %candidate.display(),
                    "configuration file not found, using defaults"
                );
                Ok(Config::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let retry = &self.goproxy.retry;
        if retry.interval_ms == 0 {
            bail!("goproxy.retry.interval_ms must be greater than zero");
        }
        if retry.timeout_secs.saturating_mul(1000) < retry.interval_ms {
            bail!(
                "goproxy.retry.timeout_secs ({}s) is shorter than interval_ms ({}ms)",
                retry.timeout_secs,
                retry.interval_ms
            );
        }
        if self.goproxy.request_timeout_secs == 0 {
            bail!("goproxy.request_timeout_secs must be greater than zero");
        }
        self.goproxy
            .endpoint()
            .with_context(|| format!("invalid goproxy.proxy {:?}", self.goproxy.proxy))?;
        Ok(())
    }
}
