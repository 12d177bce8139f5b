use std::time::Duration;

use reqwest::StatusCode;
use semver::Version;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::config::GoproxyConfig;
use crate::error::{GoproxyError, Result};
use crate::resolver::ProxyEndpoint;
use crate::retry::RetryPolicy;
use crate::versions::{VersionList, parse_list};


// Modules past this major are not probed.
const MAX_MAJOR_VERSION: u64 = 1000;

/// Client for the `@v/list` endpoint of a single GOPROXY host.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GoproxyClient {
    base: Url,
    http: reqwest::Client,
    retry: RetryPolicy,
}

/// What a single list request produced.
enum ListResponse {
    Found(String),
    NotFound,
}

impl GoproxyClient {
    /// Client bound to `scheme://host` with default settings.
    pub fn new(scheme: &str, host: &str) -> Result<Self> {
        Self::with_config(scheme, host, &GoproxyConfig::default())
    }

    pub fn with_config(scheme: &str, host: &str, config: &GoproxyConfig) -> Result<Self> {
        let raw = format!("{scheme}://{host}/");
        let base = Url::parse(&raw).map_err(|source| GoproxyError::Resolution {
            entry: raw.clone(),
            source,
        })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(GoproxyError::HttpClient)?;

        info!(
            proxy = %base,
            interval_ms = config.retry.interval_ms,
            timeout_secs = config.retry.timeout_secs,
            "goproxy client initialized"
        );

        Ok(Self {
            base,
            http,
            retry: config.retry.policy(),
        })
    }

    /// `None` when the endpoint says to bypass the proxy.
    pub fn from_endpoint(
        endpoint: &ProxyEndpoint,
        config: &GoproxyConfig,
    ) -> Result<Option<Self>> {
        match endpoint {
            ProxyEndpoint::Direct => Ok(None),
            ProxyEndpoint::Explicit { scheme, host } => {
                Self::with_config(scheme, host, config).map(Some)
            }
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// All published versions of `module_path`, ascending and deduplicated.
    ///
    /// Releases of later major versions live under `{module}/vN`; they are
    /// collected too, so `github.com/o/r` and `github.com/o/r/v2` give the
    /// same answer.
    pub async fn get_versions(
        &self,
        cancel: &CancellationToken,
        module_path: &str,
    ) -> Result<VersionList> {
        let (base_path, requested_major) = split_major_suffix(module_path)?;

        let mut versions = Vec::new();
        let mut any_found = false;

        for major in 1..=MAX_MAJOR_VERSION {
            let path = if major == 1 {
                base_path.to_string()
            } else {
                format!("{base_path}/v{major}")
            };

            match self.fetch_list(cancel, module_path, &path).await? {
                ListResponse::Found(body) => {
                    any_found = true;
                    let parsed = parse_list(&body).map_err(|(line, source)| {
                        GoproxyError::VersionParse {
                            module: path.clone(),
                            line,
                            source,
                        }
                    })?;
                    debug!(module = %path, count = parsed.len(), "listed versions");
                    versions.extend(parsed);
                }
                ListResponse::NotFound if major < requested_major => {
                    debug!(module = %path, "major version not published, skipping");
                }
                ListResponse::NotFound => break,
            }
        }

        if versions.is_empty() {
            let module = module_path.to_string();
            return Err(if any_found {
                GoproxyError::NoVersions { module }
            } else {
                GoproxyError::NotFound { module }
            });
        }

        let list: VersionList = versions.into_iter().collect();
        info!(
            module = module_path,
            count = list.len(),
            latest = %list.latest().map(Version::to_string).unwrap_or_default(),
            "fetched module versions"
        );
        Ok(list)
    }

    /// URL of the version list for `path`.
    pub fn list_url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/{path}/@v/list"));
        url
    }

    async fn fetch_list(
        &self,
        cancel: &CancellationToken,
        module: &str,
        path: &str,
    ) -> Result<ListResponse> {
        let url = self.list_url(path);
        let label = url.to_string();

        self.retry
            .run(cancel, &label, module, || {
                list_once(self.http.get(url.clone()), &label)
            })
            .await
    }
}

/// One GET against a list URL; 404 and 410 are answers, not failures.
async fn list_once(request: reqwest::RequestBuilder, url: &str) -> Result<ListResponse> {
    let transport = |source| GoproxyError::Transport {
        url: url.to_string(),
        source,
    };

    let response = request.send().await.map_err(transport)?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Ok(ListResponse::NotFound);
    }
    if !status.is_success() {
        return Err(GoproxyError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.text().await.map_err(transport)?;
    Ok(ListResponse::Found(body))
}

/// Split a trailing `/vN` (N >= 2) off a module path.
///
/// `github.com/o/r/v2` -> (`github.com/o/r`, 2); `github.com/o/r` -> (`github.com/o/r`, 1).
fn split_major_suffix(module_path: &str) -> Result<(&str, u64)> {
    let trimmed = module_path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(GoproxyError::InvalidModulePath(module_path.to_string()));
    }

    if let Some((base, last)) = trimmed.rsplit_once('/') {
        let major = last
            .strip_prefix('v')
            .filter(|digits| {
                !digits.starts_with('0') && digits.bytes().all(|b| b.is_ascii_digit())
            })
            .and_then(|digits| digits.parse::<u64>().ok())
            .filter(|major| *major >= 2);
        if let Some(major) = major {
            return Ok((base, major));
        }
    }

    Ok((trimmed, 1))
}
