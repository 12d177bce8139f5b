use serde::Deserialize;

use crate::config::reliability::RetryConfig;
use crate::error::Result;
use crate::resolver::{self, ProxyEndpoint};

/// Settings for talking to a module proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct GoproxyConfig {
    /// `GOPROXY`-style specification; empty means the public proxy.
    #[serde(default)]
    pub proxy: String,
    #[serde(default = "GoproxyConfig::default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout, independent of the retry budget.
    #[serde(default = "GoproxyConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` when reaching the module proxy.
    #[serde(default = "GoproxyConfig::default_system_proxy")]
    pub system_proxy: bool,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl GoproxyConfig {
    fn default_user_agent() -> String {
        concat!("goproxy/", env!("CARGO_PKG_VERSION")).to_string()
    }

    fn default_request_timeout_secs() -> u64 {
        30
    }

    fn default_system_proxy() -> bool {
        true
    }

    pub fn endpoint(&self) -> Result<ProxyEndpoint> {
        resolver::resolve(&self.proxy)
    }
}

impl Default for GoproxyConfig {
    fn default() -> Self {
        Self {
            proxy: String::new(),
            user_agent: Self::default_user_agent(),
            request_timeout_secs: Self::default_request_timeout_secs(),
            system_proxy: Self::default_system_proxy(),
            retry: RetryConfig::default(),
        }
    }
}
