//! # Presentation
//!
//! Everything the shell shows goes through a [`Presenter`]. Response values
//! and listings go to the output stream; diagnostics, the meta line and
//! errors go to the error stream so that `resht get /x > file` style
//! pipelines only ever see the payload.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Stderr, Stdout, Write};

use serde_json::{Map, Value};

use super::ansi::{self, Palette};
use super::args::{Redirect, RedirectMode};
use crate::client::ResponseMeta;

/// Longest string shown in formatted mode
pub const STRING_PREVIEW_LIMIT: usize = 256;

const INDENT: &str = "    ";

/// How a single command wants its output rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub formatted: bool,
    pub color: bool,
    pub invert_color: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            formatted: true,
            color: false,
            invert_color: false,
        }
    }
}

pub trait Presenter {
    /// A successful response (or extraction result)
    fn value(&mut self, value: &Value, style: Style) -> io::Result<()>;

    /// A failed request; `value` is whatever payload came back with it
    fn failure(&mut self, status: &str, value: &Value, style: Style) -> io::Result<()>;

    /// Status, duration and size of the last response
    fn meta(&mut self, meta: &ResponseMeta, color: bool) -> io::Result<()>;

    /// Plain informational output (listings, help, config)
    fn message(&mut self, text: &str) -> io::Result<()>;

    fn error(&mut self, text: &str) -> io::Result<()>;

    /// Unprefixed text on the error stream
    fn diagnostic(&mut self, text: &str) -> io::Result<()>;

    fn prompt(&mut self, prompt: &str) -> io::Result<()>;
}

/// Presenter over any pair of writers
#[derive(Debug)]
pub struct TerminalPresenter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl TerminalPresenter<Stdout, Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalPresenter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn out(&self) -> &O {
        &self.out
    }

    pub fn err(&self) -> &E {
        &self.err
    }

    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> Presenter for TerminalPresenter<O, E> {
    fn value(&mut self, value: &Value, style: Style) -> io::Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::String(text) if style.formatted => {
                let (shown, total) = char_counts(text);
                let hint = if shown < total {
                    ", use --raw|-r to see full output"
                } else {
                    ""
                };
                writeln!(self.err, "# {shown}/{total} chars{hint}")?;
                writeln!(self.out, "{}", preview(text))
            }
            Value::String(text) => writeln!(self.out, "{text}"),
            other => writeln!(self.out, "{}", render_json(other, style)),
        }
    }

    fn failure(&mut self, status: &str, value: &Value, style: Style) -> io::Result<()> {
        let (open, close) = if style.color {
            (ansi::FG_RED, ansi::RESET)
        } else {
            ("", "")
        };
        match value {
            Value::String(text) if style.formatted => {
                let (shown, total) = char_counts(text);
                writeln!(
                    self.err,
                    "{open}! {status} ({shown}/{total} chars){close}\n:{}",
                    preview(text)
                )
            }
            Value::String(text) => writeln!(self.err, "{open}! {status}:{close}\n{text}"),
            Value::Null => writeln!(self.err, "{open}! {status}{close}"),
            other => {
                writeln!(self.err, "{open}! {status}:{close}")?;
                writeln!(self.out, "{}", render_json(other, style))
            }
        }
    }

    fn meta(&mut self, meta: &ResponseMeta, color: bool) -> io::Result<()> {
        if color {
            let (badge, note) = if meta.success {
                (ansi::BADGE_OK, ansi::NOTE_OK)
            } else {
                (ansi::BADGE_FAIL, ansi::NOTE_FAIL)
            };
            writeln!(
                self.err,
                "{badge} {} {note} {} / {}{}",
                meta.status_code,
                meta.duration,
                meta.byte_size,
                ansi::RESET
            )
        } else {
            writeln!(
                self.err,
                " {}  {} / {}",
                meta.status_code, meta.duration, meta.byte_size
            )
        }
    }

    fn message(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    fn error(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.err, "! {text}")
    }

    fn diagnostic(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.err, "{text}")
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        write!(self.out, "{prompt}")?;
        self.out.flush()
    }
}

/// The interactive prompt: `[<base url> - <cwd>] > `
pub fn format_prompt(base_url: &str, cwd: &str, color: bool) -> String {
    if color {
        format!(
            "{}[{}{}{base_url} - {cwd}{}{}] {}{}> {}",
            ansi::FG_MAGENTA,
            ansi::BOLD,
            ansi::FG_MAGENTA,
            ansi::RESET,
            ansi::FG_MAGENTA,
            ansi::BOLD,
            ansi::FG_BRIGHT_WHITE,
            ansi::RESET
        )
    } else {
        format!("[{base_url} - {cwd}] > ")
    }
}

/// Write a response to a redirect target, uncolored
pub fn write_redirect(redirect: &Redirect, value: &Value) -> io::Result<()> {
    let mut file = match redirect.mode {
        RedirectMode::Truncate => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&redirect.path)?,
        RedirectMode::Append => OpenOptions::new()
            .append(true)
            .create(true)
            .open(&redirect.path)?,
    };
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => render_json(other, Style::default()),
    };
    file.write_all(text.as_bytes())?;
    tracing::debug!("Wrote {} bytes to {}", text.len(), redirect.path);
    Ok(())
}

/// Render a JSON value for display.
///
/// Raw mode sorts keys. Formatted mode keeps server order and colors the
/// output when asked.
pub fn render_json(value: &Value, style: Style) -> String {
    let mut rendered = String::new();
    if !style.formatted {
        write_plain(&mut rendered, &sorted(value), 0);
    } else if style.color {
        let palette = if style.invert_color {
            ansi::LIGHT_PALETTE
        } else {
            ansi::DARK_PALETTE
        };
        write_colored(&mut rendered, value, 0, &palette);
    } else {
        write_plain(&mut rendered, value, 0);
    }
    rendered
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn scalar(value: &Value) -> String {
    // serde_json escapes strings and prints numbers/literals canonically
    value.to_string()
}

fn write_plain(out: &mut String, value: &Value, depth: usize) {
    write_tree(out, value, depth, &|text, _| text.to_string());
}

fn write_colored(out: &mut String, value: &Value, depth: usize, palette: &Palette) {
    write_tree(out, value, depth, &|text, kind| {
        let color = match kind {
            Token::Key => palette.key,
            Token::String => palette.string,
            Token::Number => palette.number,
            Token::Literal => palette.literal,
            Token::Punctuation => palette.punctuation,
        };
        format!("{color}{text}{}", ansi::RESET)
    });
}

#[derive(Clone, Copy)]
enum Token {
    Key,
    String,
    Number,
    Literal,
    Punctuation,
}

fn write_tree(out: &mut String, value: &Value, depth: usize, paint: &dyn Fn(&str, Token) -> String) {
    let pad = INDENT.repeat(depth + 1);
    let close_pad = INDENT.repeat(depth);
    match value {
        Value::Object(map) if map.is_empty() => out.push_str(&paint("{}", Token::Punctuation)),
        Value::Array(items) if items.is_empty() => out.push_str(&paint("[]", Token::Punctuation)),
        Value::Object(map) => {
            out.push_str(&paint("{", Token::Punctuation));
            out.push('\n');
            for (i, (key, item)) in map.iter().enumerate() {
                let _ = write!(
                    out,
                    "{pad}{}{} ",
                    paint(&scalar(&Value::String(key.clone())), Token::Key),
                    paint(":", Token::Punctuation)
                );
                write_tree(out, item, depth + 1, paint);
                if i + 1 < map.len() {
                    out.push_str(&paint(",", Token::Punctuation));
                }
                out.push('\n');
            }
            out.push_str(&close_pad);
            out.push_str(&paint("}", Token::Punctuation));
        }
        Value::Array(items) => {
            out.push_str(&paint("[", Token::Punctuation));
            out.push('\n');
            for (i, item) in items.iter().enumerate() {
                out.push_str(&pad);
                write_tree(out, item, depth + 1, paint);
                if i + 1 < items.len() {
                    out.push_str(&paint(",", Token::Punctuation));
                }
                out.push('\n');
            }
            out.push_str(&close_pad);
            out.push_str(&paint("]", Token::Punctuation));
        }
        Value::String(_) => out.push_str(&paint(&scalar(value), Token::String)),
        Value::Number(_) => out.push_str(&paint(&scalar(value), Token::Number)),
        Value::Bool(_) | Value::Null => out.push_str(&paint(&scalar(value), Token::Literal)),
    }
}

fn char_counts(text: &str) -> (usize, usize) {
    let total = text.chars().count();
    (total.min(STRING_PREVIEW_LIMIT), total)
}

fn preview(text: &str) -> String {
    text.chars().take(STRING_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::client::response::{ByteSize, Elapsed};

    fn presenter() -> TerminalPresenter<Vec<u8>, Vec<u8>> {
        TerminalPresenter::new(Vec::new(), Vec::new())
    }

    fn output(p: TerminalPresenter<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = p.into_parts();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn render_json_should_indent_and_keep_order() {
        let value = json!({"b": 1, "a": [true, null], "c": {}});
        assert_eq!(
            render_json(&value, Style::default()),
            "{\n    \"b\": 1,\n    \"a\": [\n        true,\n        null\n    ],\n    \"c\": {}\n}"
        );
    }

    #[test]
    fn render_json_should_sort_keys_in_raw_mode() {
        let value = json!({"b": 1, "a": 2});
        let style = Style {
            formatted: false,
            ..Style::default()
        };
        assert_eq!(render_json(&value, style), "{\n    \"a\": 2,\n    \"b\": 1\n}");
    }

    #[test]
    fn render_json_should_color_when_asked() {
        let style = Style {
            color: true,
            ..Style::default()
        };
        let rendered = render_json(&json!({"k": "v"}), style);
        assert!(rendered.contains(ansi::FG_CYAN));
        assert!(rendered.contains(ansi::FG_GREEN));

        let inverted = render_json(&json!({"k": "v"}), Style { invert_color: true, ..style });
        assert!(inverted.contains(ansi::FG_BLUE));
    }

    #[test]
    fn value_should_truncate_long_strings_when_formatted() {
        let mut p = presenter();
        let long = "x".repeat(300);
        p.value(&Value::String(long.clone()), Style::default()).unwrap();
        let (out, err) = output(p);
        assert_eq!(out.trim_end().len(), STRING_PREVIEW_LIMIT);
        assert!(err.contains("# 256/300 chars, use --raw|-r to see full output"));

        let mut p = presenter();
        let raw = Style {
            formatted: false,
            ..Style::default()
        };
        p.value(&Value::String(long.clone()), raw).unwrap();
        let (out, err) = output(p);
        assert_eq!(out.trim_end(), long);
        assert!(err.is_empty());
    }

    #[test]
    fn value_should_print_nothing_for_null() {
        let mut p = presenter();
        p.value(&Value::Null, Style::default()).unwrap();
        let (out, err) = output(p);
        assert!(out.is_empty() && err.is_empty());
    }

    #[test]
    fn failure_should_report_status_and_payload() {
        let mut p = presenter();
        p.failure("\"GET /x\" failed (404)", &json!({"error": "missing"}), Style::default())
            .unwrap();
        let (out, err) = output(p);
        assert_eq!(err, "! \"GET /x\" failed (404):\n");
        assert!(out.contains("\"error\": \"missing\""));
    }

    #[test]
    fn meta_should_describe_response() {
        let meta = ResponseMeta {
            duration: Elapsed::from_duration(Duration::from_millis(12)),
            byte_size: ByteSize::from_bytes(2048),
            success: true,
            status_code: 200,
        };
        let mut p = presenter();
        p.meta(&meta, false).unwrap();
        let (_, err) = output(p);
        assert_eq!(err, " 200  12 ms / 2 KB\n");
    }

    #[test]
    fn format_prompt_should_show_url_and_cwd() {
        assert_eq!(
            format_prompt("http://localhost", "/api", false),
            "[http://localhost - /api] > "
        );
        assert!(format_prompt("http://localhost", "/api", true).contains("/api"));
    }

    #[test]
    fn write_redirect_should_truncate_or_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json").to_string_lossy().into_owned();

        let truncate = Redirect {
            path: path.clone(),
            mode: RedirectMode::Truncate,
        };
        write_redirect(&truncate, &json!("first")).unwrap();
        write_redirect(&truncate, &json!("second")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        let append = Redirect {
            path: path.clone(),
            mode: RedirectMode::Append,
        };
        write_redirect(&append, &json!({"n": 1})).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "second{\n    \"n\": 1\n}"
        );
    }
}
