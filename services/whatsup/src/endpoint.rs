//! Endpoint descriptors and their resolution into probe targets

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::WhatsupError;

/// Port applied when an endpoint does not configure one
pub const DEFAULT_PORT: &str = "80";

/// Port applied to `https` endpoints that do not configure one
pub const DEFAULT_TLS_PORT: &str = "443";

/// A configured endpoint, as read from the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub url: String,
    /// Accepts both `port: 8080` and `port: "8080"`
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<String>,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl EndpointSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            port: None,
            cookies: BTreeMap::new(),
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// The configured port, else the port written in the URL, else the
    /// default for the URL's scheme
    pub fn port_or_default(&self) -> String {
        if let Some(port) = &self.port {
            return port.clone();
        }
        match Url::parse(self.url.trim()).ok().and_then(|url| url.port()) {
            Some(port) => port.to_string(),
            None if has_scheme(&self.url, "https") => DEFAULT_TLS_PORT.to_string(),
            None => DEFAULT_PORT.to_string(),
        }
    }

    /// Resolve into a probe target, applying the configured or default port
    pub fn resolve(&self) -> crate::Result<ResolvedTarget> {
        let url = resolve(&self.url, &self.port_or_default())?;
        Ok(ResolvedTarget {
            url,
            cookies: self.cookies.clone(),
        })
    }
}

/// A fully-qualified probe target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    url: Url,
    cookies: BTreeMap<String, String>,
}

impl ResolvedTarget {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Identity of the target's host, used to key persisted state.
    ///
    /// The port is only included when it differs from the scheme default,
    /// since the URL does not carry a default port explicitly.
    pub fn host_key(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Parse `url` and apply `port` to its network location.
///
/// Scheme, path, query and fragment are preserved. Fails with
/// [`WhatsupError::InvalidEndpoint`] when the URL lacks a scheme or host,
/// or when the port is not a valid non-zero TCP port.
pub fn resolve(url: &str, port: &str) -> crate::Result<Url> {
    let mut parsed = Url::parse(url.trim())
        .map_err(|e| WhatsupError::InvalidEndpoint(format!("{:?}: {}", url, e)))?;

    if parsed.scheme().is_empty() || parsed.host_str().is_none_or(str::is_empty) {
        return Err(WhatsupError::InvalidEndpoint(format!(
            "{:?} has no scheme or host",
            url
        )));
    }

    let port = port
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| {
            WhatsupError::InvalidEndpoint(format!("{:?}: invalid port {:?}", url, port))
        })?;

    parsed
        .set_port(Some(port))
        .map_err(|()| WhatsupError::InvalidEndpoint(format!("{:?} cannot carry a port", url)))?;

    Ok(parsed)
}

fn has_scheme(url: &str, scheme: &str) -> bool {
    url.trim()
        .split_once(':')
        .is_some_and(|(s, _)| s.eq_ignore_ascii_case(scheme))
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u64),
        Text(String),
    }

    Ok(
        Option::<RawPort>::deserialize(deserializer)?.map(|raw| match raw {
            RawPort::Number(n) => n.to_string(),
            RawPort::Text(s) => s,
        }),
    )
}
