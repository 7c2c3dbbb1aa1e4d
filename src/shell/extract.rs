//! Response projection for `-x`, `-X` and `-d`
//!
//! Paths are dotted: `items.0.id` walks into the `items` mapping key, the
//! first list element, then its `id` key. A `*` segment fans out over every
//! element of a list or every value of a mapping.

use serde_json::Value;

use super::args::DataMap;
use crate::error::{ShellError, ShellResult};

/// Result of projecting one response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    /// Values picked by the extract paths, or the whole (pruned) response
    /// when no extract path was given
    pub matches: Vec<Value>,
    /// `(name, values)` for every data capture, in request order
    pub captures: Vec<(String, Vec<Value>)>,
}

/// Projects a decoded JSON response
pub trait Extractor {
    fn extract(
        &self,
        value: &Value,
        extract: &[String],
        exclude: &[String],
        data_map: &[DataMap],
    ) -> ShellResult<Extraction>;
}

/// Dotted-path extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PathExtractor;

impl Extractor for PathExtractor {
    fn extract(
        &self,
        value: &Value,
        extract: &[String],
        exclude: &[String],
        data_map: &[DataMap],
    ) -> ShellResult<Extraction> {
        let mut pruned = value.clone();
        for path in exclude {
            remove_path(&mut pruned, &segments(path)?);
        }

        let matches = if extract.is_empty() {
            vec![pruned.clone()]
        } else {
            let mut matches = Vec::new();
            for path in extract {
                matches.extend(select(&pruned, &segments(path)?).into_iter().cloned());
            }
            matches
        };

        let mut captures = Vec::with_capacity(data_map.len());
        for map in data_map {
            let values = select(&pruned, &segments(&map.path)?)
                .into_iter()
                .cloned()
                .collect();
            captures.push((map.key.clone(), values));
        }

        Ok(Extraction { matches, captures })
    }
}

fn segments(path: &str) -> ShellResult<Vec<&str>> {
    let path = path.trim().trim_start_matches('.');
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ShellError::syntax(format!("Invalid path: \"{path}\"")));
    }
    Ok(segments)
}

fn child<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn select<'v>(value: &'v Value, segments: &[&str]) -> Vec<&'v Value> {
    let Some((first, rest)) = segments.split_first() else {
        return vec![value];
    };
    if *first == "*" {
        let children: Vec<&Value> = match value {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            _ => Vec::new(),
        };
        return children
            .into_iter()
            .flat_map(|child| select(child, rest))
            .collect();
    }
    child(value, first)
        .map(|child| select(child, rest))
        .unwrap_or_default()
}

fn remove_path(value: &mut Value, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        match value {
            Value::Object(map) => {
                if *first == "*" {
                    map.clear();
                } else {
                    map.shift_remove(*first);
                }
            }
            Value::Array(items) => {
                if *first == "*" {
                    items.clear();
                } else if let Ok(i) = first.parse::<usize>() {
                    if i < items.len() {
                        items.remove(i);
                    }
                }
            }
            _ => {}
        }
        return;
    }

    match value {
        Value::Object(map) if *first == "*" => {
            map.values_mut().for_each(|child| remove_path(child, rest));
        }
        Value::Array(items) if *first == "*" => {
            items.iter_mut().for_each(|child| remove_path(child, rest));
        }
        Value::Object(map) => {
            if let Some(child) = map.get_mut(*first) {
                remove_path(child, rest);
            }
        }
        Value::Array(items) => {
            if let Some(child) = first.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                remove_path(child, rest);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "count": 2,
            "items": [
                {"id": 1, "name": "a", "secret": "x"},
                {"id": 2, "name": "b", "secret": "y"}
            ]
        })
    }

    fn paths(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn extract_should_return_whole_value_without_paths() {
        let result = PathExtractor.extract(&sample(), &[], &[], &[]).unwrap();
        assert_eq!(result.matches, vec![sample()]);
        assert!(result.captures.is_empty());
    }

    #[test]
    fn extract_should_walk_dotted_paths() {
        let result = PathExtractor
            .extract(&sample(), &paths(&["items.1.name", "count"]), &[], &[])
            .unwrap();
        assert_eq!(result.matches, vec![json!("b"), json!(2)]);
    }

    #[test]
    fn extract_should_fan_out_on_wildcards() {
        let result = PathExtractor
            .extract(&sample(), &paths(&["items.*.id"]), &[], &[])
            .unwrap();
        assert_eq!(result.matches, vec![json!(1), json!(2)]);
    }

    #[test]
    fn extract_should_skip_missing_paths() {
        let result = PathExtractor
            .extract(&sample(), &paths(&["nope", "items.9"]), &[], &[])
            .unwrap();
        assert!(result.matches.is_empty());
    }

    #[test]
    fn exclude_should_prune_before_extracting() {
        let result = PathExtractor
            .extract(&sample(), &paths(&["items.0"]), &paths(&["items.*.secret"]), &[])
            .unwrap();
        assert_eq!(result.matches, vec![json!({"id": 1, "name": "a"})]);
    }

    #[test]
    fn data_map_should_capture_values() {
        let data_map = vec![
            DataMap {
                key: "first+".to_string(),
                path: "items.0.id".to_string(),
            },
            DataMap {
                key: "ids".to_string(),
                path: "items.*.id".to_string(),
            },
        ];
        let result = PathExtractor.extract(&sample(), &[], &[], &data_map).unwrap();
        assert_eq!(
            result.captures,
            vec![
                ("first+".to_string(), vec![json!(1)]),
                ("ids".to_string(), vec![json!(1), json!(2)]),
            ]
        );
    }

    #[test]
    fn malformed_paths_should_be_rejected() {
        let err = PathExtractor
            .extract(&sample(), &paths(&["items..id"]), &[], &[])
            .unwrap_err();
        assert!(matches!(err, ShellError::Syntax(_)));
    }
}
