//! Turns a `GOPROXY`-style specification into the proxy endpoint to query.
//!
//! Accepted forms:
//! - `""` -> the public proxy at `https://proxy.golang.org`
//! - `"direct"` / `"off"` -> [`ProxyEndpoint::Direct`]
//! - `"foo.bar.de"` -> `https://foo.bar.de`
//! - `"http://foo.bar"` -> `http://foo.bar`
//! - `"foo.bar,mirror.example"` -> only `foo.bar` is used

use std::fmt;

use url::Url;

use crate::error::{GoproxyError, Result};

pub const DEFAULT_PROXY_SCHEME: &str = "https";
pub const DEFAULT_PROXY_HOST: &str = "proxy.golang.org";

/// Where module versions should be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEndpoint {
    /// `direct` or `off`: bypass the proxy entirely.
    Direct,
    Explicit { scheme: String, host: String },
}

impl ProxyEndpoint {
    pub fn default_proxy() -> Self {
        Self::Explicit {
            scheme: DEFAULT_PROXY_SCHEME.to_string(),
            host: DEFAULT_PROXY_HOST.to_string(),
        }
    }

    /// The endpoint as a `(scheme, host)` pair, empty strings for [`ProxyEndpoint::Direct`].
    pub fn scheme_and_host(&self) -> (&str, &str) {
        match self {
            Self::Direct => ("", ""),
            Self::Explicit { scheme, host } => (scheme, host),
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Explicit { scheme, host } => write!(f, "{scheme}://{host}"),
        }
    }
}

/// Resolve a proxy specification. Only the first entry of a list is consulted.
pub fn resolve(spec: &str) -> Result<ProxyEndpoint> {
    if spec.is_empty() {
        return Ok(ProxyEndpoint::default_proxy());
    }

    let first = spec
        .split([',', '|'])
        .next()
        .unwrap_or_default()
        .trim();

    match first {
        "" => Err(GoproxyError::InvalidProxy(spec.to_string())),
        "direct" | "off" => Ok(ProxyEndpoint::Direct),
        candidate => parse_candidate(candidate),
    }
}

/// Legacy pair form of [`resolve`].
pub fn scheme_and_host(spec: &str) -> Result<(String, String)> {
    let endpoint = resolve(spec)?;
    let (scheme, host) = endpoint.scheme_and_host();
    Ok((scheme.to_string(), host.to_string()))
}

fn parse_candidate(candidate: &str) -> Result<ProxyEndpoint> {
    let raw = if candidate.contains("://") {
        candidate.to_string()
    } else {
        format!("{DEFAULT_PROXY_SCHEME}://{candidate}")
    };

    let url = Url::parse(&raw).map_err(|source| GoproxyError::Resolution {
        entry: candidate.to_string(),
        source,
    })?;

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) if !host.is_empty() => format!("{host}:{port}"),
        (Some(host), None) if !host.is_empty() => host.to_string(),
        _ => return Err(GoproxyError::InvalidProxy(candidate.to_string())),
    };

    Ok(ProxyEndpoint::Explicit {
        scheme: url.scheme().to_string(),
        host,
    })
}
