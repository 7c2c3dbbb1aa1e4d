//! # Query Strings
//!
//! Encoding follows PHP's `http_build_query`: nested mappings become
//! `key[sub]=v`, lists become `key[0]=v`, and booleans become `1`/`0`.

use serde_json::{Map, Value};

/// Encode a mapping as a query string.
///
/// `top_key` is the already-encoded key of the enclosing mapping; pass `""`
/// at the top level. Only the top-level call strips the trailing `&`.
pub fn build_query(params: &Map<String, Value>, top_key: &str) -> String {
    if params.is_empty() {
        return String::new();
    }

    let mut result = String::new();
    for (key, value) in params {
        let new_key = if top_key.is_empty() {
            quote(key)
        } else {
            format!("{top_key}{}", quote(&format!("[{key}]")))
        };

        match value {
            Value::Object(nested) => result.push_str(&build_query(nested, &new_key)),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    result.push_str(&new_key);
                    result.push_str(&quote(&format!("[{i}]")));
                    result.push('=');
                    result.push_str(&quote(&scalar_to_string(item)));
                    result.push('&');
                }
            }
            scalar => {
                result.push_str(&new_key);
                result.push('=');
                result.push_str(&quote(&scalar_to_string(scalar)));
                result.push('&');
            }
        }
    }

    if top_key.is_empty() && result.ends_with('&') {
        result.pop();
    }
    result
}

/// Join two query strings, dropping any leading `?` from either.
///
/// Keys are never de-duplicated; a key may legally repeat.
pub fn merge_query(query1: &str, query2: Option<&str>) -> String {
    let query1 = query1.strip_prefix('?').unwrap_or(query1);
    let query2 = match query2 {
        Some(q) if !q.is_empty() => q.strip_prefix('?').unwrap_or(q),
        _ => return query1.to_string(),
    };
    if query1.is_empty() {
        return query2.to_string();
    }
    if query2.is_empty() {
        return query1.to_string();
    }
    format!("{query1}&{query2}")
}

/// Add a query string to a URL, merging with any query it already has
pub fn merge_url_query(url: &str, query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let merged = match url.split_once('?') {
        Some((base, existing)) => format!("{base}?{}", merge_query(existing, Some(query))),
        None => format!("{url}?{query}"),
    };
    merged.trim_end_matches('?').to_string()
}

/// Parse a query string into a mapping.
///
/// Keys seen once map to a string; repeated keys map to a list of strings.
/// With `keep_blanks` off, pairs with an empty value are dropped.
pub fn parse_query_to_object(query: &str, keep_blanks: bool) -> Map<String, Value> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut object = Map::new();
    for (key, value) in ::url::form_urlencoded::parse(query.as_bytes()) {
        if !keep_blanks && value.is_empty() {
            continue;
        }
        let value = Value::String(value.into_owned());
        match object.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key.into_owned(), value);
            }
        }
    }
    object
}

/// Percent-encode everything except unreserved characters and `/`
pub(crate) fn quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                result.push(byte as char)
            }
            _ => result.push_str(&format!("%{byte:02X}")),
        }
    }
    result
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
