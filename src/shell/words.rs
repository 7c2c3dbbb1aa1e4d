//! Quote-aware splitting of an input line into words
//!
//! POSIX-shell rules, minus expansion: whitespace separates words, single
//! quotes are literal, double quotes allow `\"`, `\\`, `\$` and `` \` ``
//! escapes, and a backslash outside quotes escapes the next character.

use crate::error::{ShellError, ShellResult};

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Plain,
    Single,
    Double,
}

/// Split `line` into words. `'{"a": 1}'` stays one word.
pub fn split_words(line: &str) -> ShellResult<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    // a pair of empty quotes still makes a word
    let mut in_word = false;
    let mut state = State::Plain;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Plain => match ch {
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                '\'' => {
                    state = State::Single;
                    in_word = true;
                }
                '"' => {
                    state = State::Double;
                    in_word = true;
                }
                '\\' => match chars.next() {
                    Some(escaped) => {
                        current.push(escaped);
                        in_word = true;
                    }
                    None => return Err(ShellError::syntax("No escaped character")),
                },
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
            State::Single => match ch {
                '\'' => state = State::Plain,
                c => current.push(c),
            },
            State::Double => match ch {
                '"' => state = State::Plain,
                '\\' => match chars.peek() {
                    Some(&next) if matches!(next, '"' | '\\' | '$' | '`' | '\n') => {
                        current.push(next);
                        chars.next();
                    }
                    Some(_) => current.push('\\'),
                    None => return Err(ShellError::syntax("No closing quotation")),
                },
                c => current.push(c),
            },
        }
    }

    if state != State::Plain {
        return Err(ShellError::syntax("No closing quotation"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
