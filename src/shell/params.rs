//! Request parameter grammar
//!
//! | token            | result                              |
//! |------------------|-------------------------------------|
//! | `foo`            | `{"foo": true}`                     |
//! | `^foo`           | `{"foo": false}`                    |
//! | `foo=bar`        | `{"foo": "bar"}`                    |
//! | `a.b=3`          | `{"a": {"b": "3"}}`                 |
//! | `a:=[1,2]`       | `{"a": [1, 2]}`                     |
//! | `token+`         | `{"token": <data store "token">}`   |
//! | `token+=`        | same as `token+`                    |

use serde_json::{Map, Value};

use super::env::DataStore;
use crate::error::{ShellError, ShellResult};

/// Parse one `name[=value]` token into `params`
pub fn parse_param(
    token: &str,
    params: &mut Map<String, Value>,
    data: &DataStore,
) -> ShellResult<()> {
    let (name, value) = match token.split_once('=') {
        None => {
            if let Some(name) = token.strip_suffix('+') {
                (name, lookup(data, name)?)
            } else if let Some(name) = token.strip_prefix('^') {
                (name.trim_start_matches('^'), Value::Bool(false))
            } else {
                (token, Value::Bool(true))
            }
        }
        Some((name, raw)) => {
            if let Some(name) = name.strip_suffix(':') {
                let value = serde_json::from_str(raw).map_err(|e| {
                    ShellError::syntax(format!("Invalid JSON value for \"{name}\": {e}"))
                })?;
                (name, value)
            } else if let Some(name) = name.strip_suffix('+') {
                (name, lookup(data, name)?)
            } else {
                (name, Value::String(raw.to_string()))
            }
        }
    };

    if name.is_empty() {
        return Err(ShellError::syntax(format!("Missing parameter name in \"{token}\"")));
    }
    assign(params, name, value);
    Ok(())
}

fn lookup(data: &DataStore, name: &str) -> ShellResult<Value> {
    data.get(name)
        .cloned()
        .ok_or_else(|| ShellError::VariableNotFound(name.to_string()))
}

/// Set `value` at a dotted path, creating intermediate mappings and
/// overwriting anything on the way that is not a mapping.
fn assign(params: &mut Map<String, Value>, name: &str, value: Value) {
    let keys: Vec<&str> = name.split('.').collect();
    assign_path(params, &keys, value);
}

fn assign_path(params: &mut Map<String, Value>, keys: &[&str], value: Value) {
    match keys {
        [] => {}
        [last] => {
            params.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let child = params
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(nested) => assign_path(nested, rest, value),
                other => {
                    let mut nested = Map::new();
                    assign_path(&mut nested, rest, value);
                    *other = Value::Object(nested);
                }
            }
        }
    }
}
