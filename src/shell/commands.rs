//! Internal shell commands

use std::io;
use std::process::Command;

use serde_json::{Map, Value};

use super::params::parse_param;
use super::present::{render_json, Presenter, Style};
use super::{CommandFlow, Shell};
use crate::config::parse_bool;
use crate::error::{ShellError, ShellResult};

pub const USAGE: &str = r#"resht - a shell for RESTful HTTP APIs

USAGE:
    resht [-p PROFILE] [OPTIONS] [VERB [PATH] [PARAM ...]]

VERBS:
    get, head, post, put, patch, delete (del), options (opts, opt)

PARAMETERS:
    foo            foo=true
    ^foo           foo=false
    foo=bar        string value; dotted names nest: a.b=c sends {"a": {"b": "c"}}
    foo:=JSON      JSON value, e.g. ids:=[1,2]
    foo+           value captured earlier with -d (also foo+=)

OPTIONS:
    -B, --basic USER:PASS     HTTP basic auth for this request
    -c, --color               color output
    -C, --no-color            no color output
    -d, --data NAME[+]=PATH   capture PATH from the response as NAME ('+' also
                              adds it to the env vars sent with each request)
    -f, --form                send the body form-encoded
    -h, --help                show this help
    -H, --header 'NAME: VAL'  add an HTTP header
    -i, --invert              colors for light backgrounds
    --insecure                skip TLS certificate and hostname checks
    -j, --json JSON           merge a JSON object into the parameters
    -Q, --query NAME=VAL      add a query string parameter
    -r, --raw                 unformatted output
    -s, --shell               start the interactive shell
    -u, --url URL             base URL, e.g. https://api.example.com/v1
    -v, --verbose             log request and response details
    -x, --extract PATH        show only PATH of the response, e.g. items.0.id
    -X, --exclude PATH        remove PATH from the response
    > FILE, >> FILE           write or append the response to FILE

SHELL COMMANDS:
    cd [PATH|-]               change the working path; '-' goes back
    config                    show the session options
    data [NAME|-=NAME ...]    list or remove captured values
    env [NAME|-=NAME|+=NAME]  list, remove or add (from captured data) env vars
    help, ?                   show this help
    quit                      leave the shell (or Ctrl-D)
    set NAME=VALUE ...        set color, formatted, verbose, invert_color or url
    sh CMD [ARG ...]          run a system command
    debug                     dump the shell state

ENVIRONMENT:
    RESHT_PROFILE_PATH        profile file (default ~/.resht/profile)
    RESHT_LOG_LEVEL           log filter: trace, debug, info, warn, error
"#;

/// Names accepted by `set`
const BOOLEAN_OPTIONS: &[&str] = &["color", "formatted", "verbose", "invert_color", "invert"];

impl<P: Presenter> Shell<P> {
    /// Run an internal (non-HTTP) command
    pub(super) fn run_cmd(&mut self, cmd: &str, params: &[String]) -> ShellResult<CommandFlow> {
        tracing::debug!("Running command '{}' with {:?}", cmd, params);
        match cmd {
            "set" => self.cmd_set(params)?,
            "env" => self.cmd_env(params)?,
            "data" => self.cmd_data(params)?,
            "cd" => {
                let path = params.first().map(String::as_str).unwrap_or_default();
                let cwd = self.env.paths.change_dir(path)?.to_string();
                tracing::debug!("Working path is now {}", cwd);
            }
            "config" => {
                let options = serde_json::to_value(&self.options).map_err(io::Error::from)?;
                self.presenter.message(&render_json(&options, Style::default()))?;
            }
            "quit" => return Ok(CommandFlow::Quit),
            "help" => self.presenter.message(USAGE)?,
            "sh" => self.cmd_sh(params)?,
            "debug" => {
                let dump = self.debug_dump();
                tracing::debug!("{}", dump);
                self.presenter.diagnostic(&dump)?;
            }
            other => return Err(ShellError::UnrecognizedCommand(other.to_string())),
        }
        Ok(CommandFlow::Continue)
    }

    fn cmd_set(&mut self, params: &[String]) -> ShellResult<()> {
        if params.is_empty() {
            return Err(ShellError::syntax("Usage: set NAME=VALUE ..."));
        }
        for param in params {
            let mut pair = Map::new();
            parse_param(param, &mut pair, &self.data)?;
            for (name, value) in pair {
                if BOOLEAN_OPTIONS.contains(&name.as_str()) {
                    let flag = match &value {
                        Value::Bool(flag) => *flag,
                        Value::String(text) => parse_bool(text).ok_or_else(|| {
                            ShellError::syntax(format!(
                                "Invalid value for \"{name}\": expected true or false."
                            ))
                        })?,
                        _ => {
                            return Err(ShellError::syntax(format!(
                                "Invalid value for \"{name}\": expected true or false."
                            )))
                        }
                    };
                    match name.as_str() {
                        "color" => self.options.color = flag,
                        "formatted" => self.options.formatted = flag,
                        "verbose" => self.options.verbose = flag,
                        _ => self.options.invert_color = flag,
                    }
                } else if name == "url" {
                    let url = match &value {
                        Value::String(url) => url.clone(),
                        other => other.to_string(),
                    };
                    self.client.set_base_url(&url)?;
                    self.options.url = url;
                } else {
                    return Err(ShellError::syntax(format!(
                        "Unrecognized configuration option: {name}."
                    )));
                }
            }
        }
        Ok(())
    }

    fn cmd_env(&mut self, params: &[String]) -> ShellResult<()> {
        self.presenter.message("ENV:")?;
        let names: Vec<String> = if params.is_empty() {
            self.env.vars.keys().cloned().collect()
        } else {
            params.to_vec()
        };
        for name in names {
            if let Some(name) = name.strip_prefix("-=") {
                if let Some(value) = self.env.vars.shift_remove(name) {
                    self.presenter.message(&format!("{name} -= {}", compact(&value)))?;
                }
            } else if let Some(name) = name.strip_prefix("+=") {
                let value = self
                    .data
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ShellError::VariableNotFound(name.to_string()))?;
                self.presenter.message(&format!("{name} += {}", compact(&value)))?;
                self.env.vars.insert(name.to_string(), value);
            } else if let Some(value) = self.env.vars.get(&name) {
                self.presenter.message(&format!("{name} = {}", compact(value)))?;
            }
        }
        Ok(())
    }

    fn cmd_data(&mut self, params: &[String]) -> ShellResult<()> {
        self.presenter.message("DATA:")?;
        let names = if params.is_empty() {
            self.data.names()
        } else {
            params.to_vec()
        };
        for name in names {
            if let Some(name) = name.strip_prefix("-=") {
                if let Some(value) = self.data.remove(name) {
                    self.presenter.message(&format!("{name} -= {}", compact(&value)))?;
                }
            } else if let Some(value) = self.data.get(&name) {
                self.presenter.message(&format!("{name} = {}", compact(value)))?;
            }
        }
        Ok(())
    }

    fn cmd_sh(&mut self, params: &[String]) -> ShellResult<()> {
        let Some((program, args)) = params.split_first() else {
            return Err(ShellError::syntax("Missing command to run."));
        };
        let status = Command::new(program).args(args).status()?;
        if !status.success() {
            self.presenter.error(&format!("{program} exited with {status}"))?;
        }
        Ok(())
    }

    fn debug_dump(&self) -> String {
        format!(
            "options: {:#?}\nclient: {:#?}\nenv: {:#?}\ndata: {:#?}\nlast status: {}",
            self.options, self.client, self.env, self.data, self.last_status
        )
    }
}

fn compact(value: &Value) -> String {
    value.to_string()
}
