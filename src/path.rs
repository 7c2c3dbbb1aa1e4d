//! # Virtual Paths
//!
//! Slash hygiene shared by URL composition and the shell's working path,
//! plus the resolver that walks relative paths against the current one.
//! Paths here are plain strings; nothing touches the filesystem.

use crate::error::{ShellError, ShellResult};

/// Collapse repeated slashes, optionally forcing a leading and/or trailing one.
///
/// A `false` flag leaves that end of the path as it was given.
pub fn normalize_path(path: &str, force_leading: bool, force_trailing: bool) -> String {
    let mut normalized = String::with_capacity(path.len() + 2);
    let mut last_was_slash = false;
    for ch in path.trim().chars() {
        if ch == '/' {
            if !last_was_slash {
                normalized.push(ch);
            }
            last_was_slash = true;
        } else {
            normalized.push(ch);
            last_was_slash = false;
        }
    }

    if force_leading && !normalized.starts_with('/') {
        normalized.insert(0, '/');
    }
    if force_trailing && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Tracks the shell's working path and resolves input against it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    cwd: String,
    last_cwd: String,
}

impl PathResolver {
    pub fn new() -> Self {
        Self {
            cwd: "/".to_string(),
            last_cwd: "/".to_string(),
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn last_cwd(&self) -> &str {
        &self.last_cwd
    }

    /// Resolve `input` to an absolute path without changing directory.
    ///
    /// `-` yields the previous working path and an empty input yields the
    /// current one. `..` past the root fails with `PathOutOfBounds`.
    pub fn resolve(&self, input: &str) -> ShellResult<String> {
        if input == "-" {
            return Ok(self.last_cwd.clone());
        }
        if input.is_empty() {
            return Ok(self.cwd.clone());
        }

        let path = normalize_path(input, false, false);
        let trailing = path.ends_with('/');

        let mut segments: Vec<&str> = if path.starts_with('/') {
            Vec::new()
        } else {
            self.cwd.split('/').filter(|s| !s.is_empty()).collect()
        };

        for name in path.split('/') {
            match name {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(ShellError::PathOutOfBounds(path.clone()));
                    }
                }
                _ => segments.push(name),
            }
        }

        let mut resolved = normalize_path(&segments.join("/"), true, false);
        if trailing && !resolved.ends_with('/') {
            resolved.push('/');
        }
        Ok(resolved)
    }

    /// Change the working path, remembering the old one for `cd -`
    pub fn change_dir(&mut self, input: &str) -> ShellResult<&str> {
        let resolved = self.resolve(input)?;
        tracing::debug!("cd {} -> {}", self.cwd, resolved);
        self.last_cwd = std::mem::replace(&mut self.cwd, resolved);
        Ok(&self.cwd)
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_at(path: &str) -> PathResolver {
        let mut resolver = PathResolver::new();
        resolver.change_dir(path).unwrap();
        resolver
    }

    #[test]
    fn normalize_path_should_collapse_slashes() {
        assert_eq!(normalize_path("//a///b//", false, false), "/a/b/");
        assert_eq!(normalize_path("a//b", false, false), "a/b");
    }

    #[test]
    fn normalize_path_should_honor_independent_flags() {
        assert_eq!(normalize_path("a/b", true, false), "/a/b");
        assert_eq!(normalize_path("a/b", false, true), "a/b/");
        assert_eq!(normalize_path("a/b", true, true), "/a/b/");
        assert_eq!(normalize_path("/a/b/", false, false), "/a/b/");
        assert_eq!(normalize_path("", true, false), "/");
        assert_eq!(normalize_path("", true, true), "/");
    }

    #[test]
    fn normalize_path_should_be_idempotent() {
        let once = normalize_path("//api//v1///users", true, false);
        assert_eq!(normalize_path(&once, true, false), once);
    }

    #[test]
    fn resolve_should_walk_up_one_level() {
        let resolver = resolver_at("/a/b");
        assert_eq!(resolver.resolve("..").unwrap(), "/a");
        assert_eq!(resolver.resolve("../..").unwrap(), "/");
    }

    #[test]
    fn resolve_should_fail_past_root() {
        let resolver = resolver_at("/a/b");
        let err = resolver.resolve("../../..").unwrap_err();
        assert!(matches!(err, ShellError::PathOutOfBounds(_)));
    }

    #[test]
    fn resolve_should_return_previous_path_for_dash() {
        let mut resolver = resolver_at("/a/b");
        resolver.change_dir("/c").unwrap();
        assert_eq!(resolver.resolve("-").unwrap(), "/a/b");
    }

    #[test]
    fn resolve_should_keep_cwd_for_empty_input() {
        let resolver = resolver_at("/a/b");
        assert_eq!(resolver.resolve("").unwrap(), "/a/b");
    }

    #[test]
    fn resolve_should_handle_relative_and_absolute_input() {
        let resolver = resolver_at("/a");
        assert_eq!(resolver.resolve("b/c").unwrap(), "/a/b/c");
        assert_eq!(resolver.resolve("./b/./c").unwrap(), "/a/b/c");
        assert_eq!(resolver.resolve("/x//y").unwrap(), "/x/y");
        assert_eq!(resolver.resolve("../x").unwrap(), "/x");
    }

    #[test]
    fn resolve_should_preserve_trailing_slash() {
        let resolver = resolver_at("/a");
        assert_eq!(resolver.resolve("b/").unwrap(), "/a/b/");
        assert_eq!(resolver.resolve("/").unwrap(), "/");
    }

    #[test]
    fn change_dir_should_remember_last_cwd() {
        let mut resolver = PathResolver::new();
        resolver.change_dir("/users").unwrap();
        resolver.change_dir("42").unwrap();
        assert_eq!(resolver.cwd(), "/users/42");
        assert_eq!(resolver.last_cwd(), "/users");

        resolver.change_dir("-").unwrap();
        assert_eq!(resolver.cwd(), "/users");
        assert_eq!(resolver.last_cwd(), "/users/42");
    }

    #[test]
    fn change_dir_should_leave_state_alone_on_error() {
        let mut resolver = resolver_at("/a");
        assert!(resolver.change_dir("../..").is_err());
        assert_eq!(resolver.cwd(), "/a");
    }
}
