//! Shell session state
//!
//! Two mappings live here and never reach into each other: `vars` are
//! defaults merged into every request body, while the [`DataStore`] holds
//! values captured from earlier responses. Values only move between them
//! through explicit commands (`env +=name`, `-d name+=path`).

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::path::PathResolver;

/// Named captures of earlier response fragments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStore {
    values: Map<String, Value>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Working path, request defaults and history location
#[derive(Debug, Clone)]
pub struct ShellEnv {
    pub paths: PathResolver,
    pub vars: Map<String, Value>,
    pub histfile: PathBuf,
}

impl ShellEnv {
    pub fn new(histfile: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathResolver::new(),
            vars: Map::new(),
            histfile: histfile.into(),
        }
    }

    pub fn cwd(&self) -> &str {
        self.paths.cwd()
    }
}
