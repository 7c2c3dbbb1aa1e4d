//! # Shell
//!
//! The interactive and one-shot front end. Each line is split into words,
//! parsed into [`ParsedArgs`], then either sent to the server (HTTP verbs)
//! or run as an internal command. Failures are reported through the
//! [`Presenter`] and never end the session; only `quit` and end of input
//! do.

pub mod ansi;
pub mod args;
pub mod commands;
pub mod env;
pub mod extract;
pub mod params;
pub mod present;
pub mod words;

use std::fs::OpenOptions;
use std::io::{BufRead, Write};

use serde_json::Value;

pub use args::{ArgParser, DataMap, ParsedArgs, Redirect, RedirectMode};
pub use commands::USAGE;
pub use env::{DataStore, ShellEnv};
pub use extract::{Extraction, Extractor, PathExtractor};
pub use present::{Presenter, Style, TerminalPresenter};
pub use words::split_words;

use crate::client::{Body, HttpClient, RequestOptions};
use crate::config::SessionOptions;
use crate::error::{ClientError, ShellResult};

/// Whether the loop keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlow {
    Continue,
    Quit,
}

/// Apply the process-level words to the session options.
///
/// `-u`, `--insecure`, `-s`, `-v`, `-c/-C`, `-r` and `-i` given on the
/// process command line become session defaults. The parsed words are
/// returned so the caller can check for `-h`.
pub fn apply_main_args<S: AsRef<str>>(
    options: &mut SessionOptions,
    words: &[S],
) -> ShellResult<ParsedArgs> {
    let data = DataStore::new();
    let args = ArgParser::new(&data)
        .color(options.color)
        .formatted(options.formatted)
        .parse(words)?;
    if let Some(url) = &args.url {
        options.url = url.clone();
    }
    if let Some(credential) = &args.basic_auth {
        options.basic_auth = Some(credential.clone());
    }
    options.insecure |= args.insecure;
    options.shell |= args.shell;
    options.verbose |= args.verbose;
    options.invert_color |= args.invert_color;
    options.color = args.color;
    options.formatted = args.formatted;
    Ok(args)
}

pub struct Shell<P: Presenter> {
    client: HttpClient,
    env: ShellEnv,
    data: DataStore,
    options: SessionOptions,
    presenter: P,
    extractor: Box<dyn Extractor>,
    last_status: i32,
}

impl<P: Presenter> Shell<P> {
    pub fn new(mut client: HttpClient, options: SessionOptions, presenter: P) -> Self {
        if options.basic_auth.is_some() {
            client.set_basic_auth(options.basic_auth.clone());
        }
        Self {
            client,
            env: ShellEnv::new(options.histfile.clone()),
            data: DataStore::new(),
            options,
            presenter,
            extractor: Box::new(PathExtractor),
            last_status: 0,
        }
    }

    /// Replace the response projection used by `-x`, `-X` and `-d`
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn env(&self) -> &ShellEnv {
        &self.env
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// 0 when the last command succeeded, 1 otherwise
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    pub fn prompt(&self) -> String {
        present::format_prompt(
            &self.client.base_url().to_string(),
            self.env.cwd(),
            self.options.color,
        )
    }

    /// Parse command words with the session's current defaults
    pub fn parse_args<S: AsRef<str>>(&self, words: &[S]) -> ShellResult<ParsedArgs> {
        ArgParser::new(&self.data)
            .color(self.options.color)
            .formatted(self.options.formatted)
            .parse(words)
    }

    /// Run the process-level command: the interactive loop with `-s`,
    /// otherwise the single command given. Returns the exit status.
    pub fn launch<S: AsRef<str>, R: BufRead>(&mut self, words: &[S], input: R) -> i32 {
        if self.options.shell {
            self.start(input, Some(words))
        } else {
            let print_meta = self.options.verbose;
            self.run_words(words, print_meta);
            self.last_status
        }
    }

    /// The interactive loop. `initial` runs first, if given.
    pub fn start<S: AsRef<str>, R: BufRead>(&mut self, mut input: R, initial: Option<&[S]>) -> i32 {
        if let Some(words) = initial {
            if self.run_words(words, true) == CommandFlow::Quit {
                return self.last_status;
            }
        }

        // a failing input stream gets one restart per session
        let mut restarted = false;
        loop {
            let prompt = self.prompt();
            if let Err(e) = self.presenter.prompt(&prompt) {
                tracing::warn!("Failed to write prompt: {}", e);
            }

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    // EOF; leave the prompt line clean
                    let _ = self.presenter.message("");
                    break;
                }
                Ok(_) => {
                    let line = line.trim_end_matches(['\r', '\n']);
                    self.append_history(line);
                    if self.run_line(line) == CommandFlow::Quit {
                        break;
                    }
                }
                Err(e) if !restarted => {
                    tracing::debug!("Input error, restarting: {}", e);
                    let _ = self.presenter.error(&format!("Input error: {e}"));
                    restarted = true;
                }
                Err(e) => {
                    tracing::debug!("Input error after restart, giving up: {}", e);
                    let _ = self.presenter.error(&format!("Input error: {e}"));
                    self.last_status = 1;
                    break;
                }
            }
        }
        self.last_status
    }

    /// Split and run one input line, reporting any failure
    pub fn run_line(&mut self, line: &str) -> CommandFlow {
        match split_words(line) {
            Ok(words) => self.run_words(&words, true),
            Err(e) => {
                self.report(&e.to_string());
                CommandFlow::Continue
            }
        }
    }

    fn run_words<S: AsRef<str>>(&mut self, words: &[S], print_meta: bool) -> CommandFlow {
        match self.parse_cmd(words, print_meta) {
            Ok(flow) => flow,
            Err(e) => {
                self.report(&e.to_string());
                CommandFlow::Continue
            }
        }
    }

    fn report(&mut self, message: &str) {
        tracing::debug!("Command failed: {}", message);
        self.last_status = 1;
        if let Err(e) = self.presenter.error(message) {
            tracing::warn!("Failed to report error: {}", e);
        }
    }

    /// Run one command. HTTP failures are presented here and leave
    /// `last_status` at 1; grammar and internal command errors are returned.
    pub fn parse_cmd<S: AsRef<str>>(
        &mut self,
        words: &[S],
        print_meta: bool,
    ) -> ShellResult<CommandFlow> {
        let args = self.parse_args(words)?;

        if args.help {
            self.presenter.message(USAGE)?;
            return Ok(CommandFlow::Continue);
        }

        let verb = match args.verb.as_deref() {
            Some(verb) if !verb.is_empty() => verb.to_string(),
            _ => {
                if !self.options.shell {
                    self.presenter.message(USAGE)?;
                    self.last_status = 1;
                }
                return Ok(CommandFlow::Continue);
            }
        };

        if args.is_http() {
            self.run_request(&verb, args, print_meta)?;
            Ok(CommandFlow::Continue)
        } else {
            let flow = self.run_cmd(&verb, &args.cmd_args)?;
            self.last_status = 0;
            Ok(flow)
        }
    }

    fn run_request(&mut self, verb: &str, args: ParsedArgs, print_meta: bool) -> ShellResult<()> {
        if let Some(url) = &args.url {
            self.client.set_base_url(url)?;
            self.options.url = url.clone();
        }
        let path = self.env.paths.resolve(args.path.as_deref().unwrap_or_default())?;

        // session vars are defaults; parameters on the line win
        let mut body = self.env.vars.clone();
        body.extend(args.api_args.clone());

        let mut options = RequestOptions::new()
            .body(Value::Object(body))
            .verbose(args.verbose || self.options.verbose);
        if !args.query.is_empty() {
            options = options.query(args.query.clone());
        }
        if let Some(credential) = &args.basic_auth {
            options = options.basic_auth(credential.clone());
        }
        options.headers = args.headers.clone();

        let style = Style {
            formatted: args.formatted,
            color: args.color,
            invert_color: args.invert_color || self.options.invert_color,
        };

        let (response, failure) = match self.client.request(verb, &path, options) {
            Ok(response) => (Some(response), None),
            Err(ClientError::Http(e)) => {
                let status = e.to_string();
                (Some(e.into_response()), Some(status))
            }
            Err(e) => (None, Some(e.to_string())),
        };
        self.last_status = i32::from(failure.is_some());
        for line in self.client.take_verbose_log() {
            self.presenter.diagnostic(&line)?;
        }

        let mut value = response
            .as_ref()
            .map(|r| display_value(r.body()))
            .unwrap_or(Value::Null);

        if let Some(response) = &response {
            let wants_projection =
                !args.extract.is_empty() || !args.exclude.is_empty() || !args.data.is_empty();
            if wants_projection && response.is_json() {
                match self.project(&value, &args) {
                    Ok(projected) => value = projected,
                    Err(e) => {
                        self.presenter.error(&e.to_string())?;
                        return Ok(());
                    }
                }
            }
        }

        match (&failure, &args.redirect) {
            (None, Some(redirect)) => {
                if let Err(e) = present::write_redirect(redirect, &value) {
                    self.presenter
                        .error(&format!("Failed to write response: {e}"))?;
                }
            }
            (None, None) => self.presenter.value(&value, style)?,
            (Some(status), _) => self.presenter.failure(status, &value, style)?,
        }

        if print_meta {
            if let Some(response) = &response {
                self.presenter.meta(response.meta(), style.color)?;
            }
        }
        Ok(())
    }

    /// Run extraction and store any captures
    fn project(&mut self, value: &Value, args: &ParsedArgs) -> ShellResult<Value> {
        let Extraction {
            mut matches,
            captures,
        } = self
            .extractor
            .extract(value, &args.extract, &args.exclude, &args.data)?;

        for (key, mut values) in captures {
            if values.is_empty() {
                tracing::debug!("Capture {} matched nothing", key);
                continue;
            }
            let captured = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            match key.strip_suffix('+') {
                Some(name) => {
                    self.env.vars.insert(name.to_string(), captured.clone());
                    self.data.insert(name, captured);
                }
                None => self.data.insert(key, captured),
            }
        }

        Ok(if matches.len() == 1 {
            matches.remove(0)
        } else {
            Value::Array(matches)
        })
    }

    fn append_history(&self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.env.histfile)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(e) = result {
            tracing::warn!(
                "Failed to append to history file {}: {}",
                self.env.histfile.display(),
                e
            );
        }
    }
}

/// The value shown for a response body. Empty text bodies show nothing.
fn display_value(body: &Body) -> Value {
    match body.to_value() {
        Value::String(text) if text.is_empty() => Value::Null,
        other => other,
    }
}

impl<P: Presenter> std::fmt::Debug for Shell<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("client", &self.client)
            .field("env", &self.env)
            .field("data", &self.data)
            .field("options", &self.options)
            .field("last_status", &self.last_status)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shell fixtures over the recording transport

    use super::*;
    use crate::client::transport::testing::RecordingTransport;

    pub type TestShell = Shell<TerminalPresenter<Vec<u8>, Vec<u8>>>;

    pub fn options() -> SessionOptions {
        SessionOptions {
            url: "http://api.test".to_string(),
            color: false,
            histfile: std::env::temp_dir().join("resht_test_history_unused"),
            ..SessionOptions::default()
        }
    }

    pub fn shell_with(transport: &RecordingTransport) -> TestShell {
        shell_with_options(transport, options())
    }

    pub fn shell_with_options(transport: &RecordingTransport, options: SessionOptions) -> TestShell {
        let client =
            HttpClient::with_transport(&options.url, false, Box::new(transport.clone())).unwrap();
        Shell::new(client, options, TerminalPresenter::new(Vec::new(), Vec::new()))
    }

    pub fn stdout_of(shell: TestShell) -> String {
        let (out, _) = shell.into_presenter().into_parts();
        String::from_utf8(out).unwrap()
    }

    pub fn output_of(shell: TestShell) -> (String, String) {
        let (out, err) = shell.into_presenter().into_parts();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }
}
