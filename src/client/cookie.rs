//! Session cookie jar
//!
//! The jar is flat: one `name -> value` mapping per client, last write wins.
//! Path, domain and expiry attributes are read past and ignored, so every
//! stored cookie goes out with every request to the base URL.

/// Attribute names that are never cookies themselves
const ATTRIBUTES: &[&str] = &[
    "path", "domain", "expires", "max-age", "secure", "httponly", "samesite", "version",
    "comment", "priority", "partitioned",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cookie
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Store every cookie carried by one `Set-Cookie` header value
    pub fn absorb_set_cookie(&mut self, header: &str) {
        for (name, value) in parse_set_cookie(header) {
            tracing::debug!("Storing cookie '{}'", name);
            self.set(name, value);
        }
    }

    /// The outgoing `Cookie` header value.
    ///
    /// Pairs are joined with `&` rather than `; `. Servers this shell talks to
    /// already rely on that format.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(n, v)| format!("{n}={v}"))
                .collect::<Vec<_>>()
                .join("&"),
        )
    }
}

/// Pull the `name=value` pairs out of a `Set-Cookie` header value
pub fn parse_set_cookie(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|part| {
            let (name, value) = part.split_once('=').unwrap_or((part, ""));
            let name = name.trim();
            if name.is_empty() || ATTRIBUTES.contains(&name.to_ascii_lowercase().as_str()) {
                return None;
            }
            // a bare word that is not an attribute is not a cookie either
            if !part.contains('=') {
                return None;
            }
            let value = value.trim().trim_matches('"');
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
