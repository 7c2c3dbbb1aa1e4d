//! # URL Model
//!
//! A forgiving parser for base URLs. As little as a bare port (`:8080`), a
//! bare host (`example.com`) or a bare path (`/api/v1`) is accepted; anything
//! missing falls back to `http://localhost:80/`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ClientError, ClientResult};

const DEFAULT_HOSTNAME: &str = "localhost";

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\w+)://").expect("scheme pattern is valid"))
}

/// Parsed and validated URL components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    scheme: String,
    hostname: String,
    port: u16,
    path: String,
    params: String,
    query: String,
    fragment: String,
}

impl Url {
    /// Parse and validate a URL string
    pub fn parse(input: &str) -> ClientResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ClientError::invalid_url(input, "empty URL"));
        }

        // scheme, if present
        let (scheme, remainder) = match scheme_pattern().captures(input) {
            Some(caps) => {
                let matched = caps.get(0).map_or(0, |m| m.end());
                let scheme = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
                (scheme, &input[matched..])
            }
            None => ("http".to_string(), input),
        };

        let (host, rest) = remainder.split_once('/').unwrap_or((remainder, ""));

        let (hostname, port) = match host.split_once(':') {
            Some((hostname, port)) => (hostname, Some(port)),
            None => (host, None),
        };
        let hostname = if hostname.is_empty() {
            DEFAULT_HOSTNAME.to_string()
        } else {
            hostname.to_lowercase()
        };

        // path;params?query#fragment, kept exactly as written
        let (rest, fragment) = rest.split_once('#').unwrap_or((rest, ""));
        let (rest, query) = rest.split_once('?').unwrap_or((rest, ""));
        let (path, params) = split_params(&format!("/{rest}"));

        let port = match port {
            None => default_port(&scheme).unwrap_or(80),
            Some(port) => parse_port(input, port)?,
        };

        let url = Self {
            scheme,
            hostname,
            port,
            path,
            params,
            query: query.to_string(),
            fragment: fragment.to_string(),
        };
        url.validate().map_err(|e| match e {
            ClientError::InvalidUrl { reason, .. } => ClientError::invalid_url(input, reason),
            other => other,
        })?;
        Ok(url)
    }

    /// Check the scheme and port constraints
    pub fn validate(&self) -> ClientResult<()> {
        if default_port(&self.scheme).is_none() {
            return Err(ClientError::invalid_url(
                self.to_string(),
                "Only HTTP and HTTPS are supported protocols.",
            ));
        }
        if self.port == 0 {
            return Err(ClientError::invalid_url(
                self.to_string(),
                format!("Invalid API service port: {}.", self.port),
            ));
        }
        Ok(())
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &str {
        &self.params
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// True when the port is the scheme's default and can be left out
    pub fn has_default_port(&self) -> bool {
        default_port(&self.scheme) == Some(self.port)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.hostname)?;
        if !self.has_default_port() {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "{}", self.path)?;
        if !self.params.is_empty() {
            write!(f, ";{}", self.params)?;
        }
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

impl FromStr for Url {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Default port for a supported scheme
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

fn parse_port(input: &str, port: &str) -> ClientResult<u16> {
    let value: i64 = port
        .trim()
        .parse()
        .map_err(|_| ClientError::invalid_url(input, format!("Invalid API service port: {port}.")))?;
    if !(1..=65535).contains(&value) {
        return Err(ClientError::invalid_url(
            input,
            format!("Invalid API service port: {value}."),
        ));
    }
    Ok(value as u16)
}

/// Split `;params` off the last path segment
fn split_params(path: &str) -> (String, String) {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].find(';') {
        Some(offset) => {
            let at = segment_start + offset;
            (path[..at].to_string(), path[at + 1..].to_string())
        }
        None => (path.to_string(), String::new()),
    }
}
