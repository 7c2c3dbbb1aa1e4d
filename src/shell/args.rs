//! # Command Line Grammar
//!
//! Turns the words of one shell line into [`ParsedArgs`]. Flags may appear
//! anywhere on the line; bundled single-letter flags (`-rv`) are expanded
//! before the scan. Bare words fill the verb, then (for HTTP verbs) the
//! request path, then request parameters. For internal commands every bare
//! word after the verb is kept verbatim in `cmd_args`.

use serde_json::{Map, Value};

use super::env::DataStore;
use super::params::parse_param;
use crate::client::body::FORM_CONTENT_TYPE;
use crate::error::{ShellError, ShellResult};
use crate::path::normalize_path;

/// Verbs sent to the server as HTTP methods
pub const HTTP_METHODS: &[&str] = &["head", "get", "post", "put", "patch", "delete", "options"];

/// `true` when `verb` is sent to the server rather than handled locally
pub fn is_http_method(verb: &str) -> bool {
    HTTP_METHODS.contains(&verb)
}

fn resolve_alias(verb: &str) -> &str {
    match verb {
        "del" => "delete",
        "opts" | "opt" => "options",
        "?" => "help",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// `>`: replace the file
    Truncate,
    /// `>>`: append to the file
    Append,
}

/// Where a response should be written instead of stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub mode: RedirectMode,
}

/// A `-d NAME=PATH` capture request. A `NAME` ending in `+` is also copied
/// into the session vars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMap {
    pub key: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    pub verb: Option<String>,
    pub path: Option<String>,
    pub api_args: Map<String, Value>,
    pub cmd_args: Vec<String>,
    pub basic_auth: Option<String>,
    /// Header names are lowercased; a repeated name replaces the earlier value
    pub headers: Vec<(String, String)>,
    pub query: Vec<String>,
    pub data: Vec<DataMap>,
    pub extract: Vec<String>,
    pub exclude: Vec<String>,
    pub redirect: Option<Redirect>,
    pub url: Option<String>,
    pub color: bool,
    pub formatted: bool,
    pub invert_color: bool,
    pub insecure: bool,
    pub shell: bool,
    pub verbose: bool,
    pub help: bool,
}

impl ParsedArgs {
    fn with_defaults(color: bool, formatted: bool) -> Self {
        Self {
            verb: None,
            path: None,
            api_args: Map::new(),
            cmd_args: Vec::new(),
            basic_auth: None,
            headers: Vec::new(),
            query: Vec::new(),
            data: Vec::new(),
            extract: Vec::new(),
            exclude: Vec::new(),
            redirect: None,
            url: None,
            color,
            formatted,
            invert_color: false,
            insecure: false,
            shell: false,
            verbose: false,
            help: false,
        }
    }

    pub fn is_http(&self) -> bool {
        self.verb.as_deref().is_some_and(is_http_method)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let name = name.to_lowercase();
        self.headers.retain(|(n, _)| *n != name);
        self.headers.push((name, value.to_string()));
    }
}

/// Parses command words against the current session defaults
#[derive(Debug, Clone, Copy)]
pub struct ArgParser<'a> {
    color: bool,
    formatted: bool,
    data: &'a DataStore,
}

impl<'a> ArgParser<'a> {
    /// `data` resolves `name+` parameter references
    pub fn new(data: &'a DataStore) -> Self {
        Self {
            color: false,
            formatted: true,
            data,
        }
    }

    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn formatted(mut self, formatted: bool) -> Self {
        self.formatted = formatted;
        self
    }

    pub fn parse<S: AsRef<str>>(&self, words: &[S]) -> ShellResult<ParsedArgs> {
        let parts = expand_bundled_flags(words);
        let mut args = ParsedArgs::with_defaults(self.color, self.formatted);

        let mut i = 0;
        while i < parts.len() {
            let part = parts[i].as_str();
            match part {
                "" => {}
                ">" | ">>" => {
                    let mode = if part == ">" {
                        RedirectMode::Truncate
                    } else {
                        RedirectMode::Append
                    };
                    let path = next_value(&parts, &mut i, "Missing file path to output result to.")?;
                    args.redirect = Some(Redirect {
                        path: path.to_string(),
                        mode,
                    });
                }
                _ if part.starts_with(">>") => {
                    args.redirect = Some(Redirect {
                        path: part[2..].to_string(),
                        mode: RedirectMode::Append,
                    });
                }
                _ if part.starts_with('>') => {
                    args.redirect = Some(Redirect {
                        path: part[1..].to_string(),
                        mode: RedirectMode::Truncate,
                    });
                }
                "-B" | "--basic" => {
                    let value =
                        next_value(&parts, &mut i, "Missing HTTP basic auth user/pass parameter.")?;
                    if !value.contains(':') {
                        return Err(ShellError::syntax(
                            "Expected HTTP basic auth in format 'user:pass'.",
                        ));
                    }
                    args.basic_auth = Some(value.to_string());
                }
                "-F" | "--file" => {
                    let value = next_value(&parts, &mut i, "Missing value for file to upload.")?;
                    if !value.contains('=') || value.contains('&') {
                        return Err(ShellError::syntax("Invalid file name=file_path pair."));
                    }
                    return Err(ShellError::syntax("File uploads are not supported."));
                }
                "-Q" | "--query" => {
                    let value = next_value(&parts, &mut i, "Missing query name=value pair.")?;
                    if !value.contains('=') || value.contains('&') {
                        return Err(ShellError::syntax("Invalid query name=value pair."));
                    }
                    args.query.push(value.to_string());
                }
                "-i" | "--invert" => args.invert_color = true,
                "--insecure" => args.insecure = true,
                "-c" | "--color" => args.color = true,
                "-C" | "--no-color" => args.color = false,
                "-v" | "--verbose" => args.verbose = true,
                "-f" | "--form" => args.set_header("content-type", FORM_CONTENT_TYPE),
                "-h" | "--help" => args.help = true,
                "-H" | "--header" => {
                    let value = next_value(&parts, &mut i, "Missing value for HTTP header.")?;
                    let (name, value) = value
                        .split_once(": ")
                        .ok_or_else(|| ShellError::syntax("Invalid HTTP header."))?;
                    args.set_header(name, value);
                }
                "-s" | "--shell" => args.shell = true,
                "-j" | "--json" => {
                    let value = next_value(&parts, &mut i, "Missing value for JSON API params.")?;
                    let decoded: Value = serde_json::from_str(value)
                        .map_err(|e| ShellError::syntax(format!("Invalid JSON: {e}")))?;
                    match decoded {
                        Value::Object(params) => args.api_args.extend(params),
                        _ => {
                            return Err(ShellError::syntax(
                                "JSON values must be a dictionary of arguments.",
                            ))
                        }
                    }
                }
                "-r" | "--raw" => args.formatted = false,
                "-u" | "--url" => {
                    let value = next_value(&parts, &mut i, "Missing value for URL.")?;
                    args.url = Some(value.to_string());
                }
                "-d" | "--data" => {
                    let value = next_value(&parts, &mut i, "Missing value for --data.")?;
                    let (key, path) = value.split_once('=').ok_or_else(|| {
                        ShellError::syntax(
                            "Invalid parameter for --data: expected format NAME[+]=PATH",
                        )
                    })?;
                    args.data.push(DataMap {
                        key: key.to_string(),
                        path: path.to_string(),
                    });
                }
                "-x" | "--extract" => {
                    let value = next_value(&parts, &mut i, "Missing value for --extract.")?;
                    args.extract.push(value.to_string());
                }
                "-X" | "--exclude" => {
                    let value = next_value(&parts, &mut i, "Missing value for --exclude.")?;
                    args.exclude.push(value.to_string());
                }
                bare => self.take_bare_word(&mut args, bare)?,
            }
            i += 1;
        }

        tracing::trace!("Parsed command: {:?}", args);
        Ok(args)
    }

    fn take_bare_word(&self, args: &mut ParsedArgs, word: &str) -> ShellResult<()> {
        match args.verb.as_deref() {
            None => {
                let verb = word.to_lowercase();
                args.verb = Some(resolve_alias(&verb).to_string());
            }
            Some(verb) if is_http_method(verb) => {
                if args.path.is_none() {
                    args.path = Some(normalize_path(word, false, false));
                } else {
                    parse_param(word, &mut args.api_args, self.data)?;
                }
            }
            Some(_) => args.cmd_args.push(word.to_string()),
        }
        Ok(())
    }
}

/// `-rv` becomes `-r -v`. Words starting `--`, `-+` or `-=` are left alone.
fn expand_bundled_flags<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    let mut parts = Vec::with_capacity(words.len());
    for word in words {
        let word = word.as_ref();
        let mut chars = word.chars();
        let bundled = word.chars().count() > 2
            && chars.next() == Some('-')
            && !matches!(chars.next(), Some('-' | '+' | '='));
        if bundled {
            parts.extend(word.chars().skip(1).map(|flag| format!("-{flag}")));
        } else {
            parts.push(word.to_string());
        }
    }
    parts
}

fn next_value<'p>(parts: &'p [String], i: &mut usize, missing: &str) -> ShellResult<&'p str> {
    *i += 1;
    parts
        .get(*i)
        .map(String::as_str)
        .ok_or_else(|| ShellError::syntax(missing))
}
