//! Error types for proxy resolution and version fetching.

use std::time::Duration;

use reqwest::StatusCode;

/// Every failure the client can surface to a caller.
#[derive(Debug, thiserror::Error)]
pub enum GoproxyError {
    #[error("parse GOPROXY url {entry:?}: {source}")]
    Resolution {
        entry: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid GOPROXY entry {0:?}")]
    InvalidProxy(String),
    #[error("invalid go module path {0:?}")]
    InvalidModulePath(String),
    #[error("building goproxy HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to get versions: request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to get versions: {url} responded with status {status}")]
    Status { url: String, status: StatusCode },
    #[error(
        "failed to get versions from {url}: gave up after {elapsed:?}{}",
        last_error_suffix(.last)
    )]
    FetchTimeout {
        url: String,
        elapsed: Duration,
        #[source]
        last: Option<Box<GoproxyError>>,
    },
    #[error("go module {module:?} not found on proxy")]
    NotFound { module: String },
    #[error("no versions found for go module {module:?}")]
    NoVersions { module: String },
    #[error("invalid version {line:?} listed for go module {module:?}: {source}")]
    VersionParse {
        module: String,
        line: String,
        #[source]
        source: semver::Error,
    },
    #[error("fetching versions for go module {module:?} was cancelled")]
    Cancelled { module: String },
}

impl GoproxyError {
    /// Whether the failure may clear up on its own and is worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }

    /// True for both "the proxy has never heard of it" and "it has nothing published".
    pub fn is_no_versions(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoVersions { .. })
    }
}

fn last_error_suffix(last: &Option<Box<GoproxyError>>) -> String {
    match last {
        Some(err) => format!(": {err}"),
        None => String::new(),
    }
}

pub type Result<T, E = GoproxyError> = std::result::Result<T, E>;
