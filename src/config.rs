//! Configuration constants, profile loading and session defaults for resht
//!
//! A profile is a section of an INI file:
//!
//! ```ini
//! [staging]
//! url = https://staging.example.com/api
//! insecure = true
//! basic_auth = deploy:s3cret
//! histfile = ~/.resht_staging_history
//! color = false
//! ```
//!
//! Values given on the command line always win over the profile.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use ini::Ini;
use serde::Serialize;

/// Default profile file path for resht
pub const DEFAULT_PROFILE_PATH: &str = "~/.resht/profile";

/// Environment variable name for overriding the profile path
pub const PROFILE_PATH_ENV_VAR: &str = "RESHT_PROFILE_PATH";

/// Environment variable holding the log filter (`trace` .. `error`)
pub const LOG_LEVEL_ENV_VAR: &str = "RESHT_LOG_LEVEL";

/// Default history file for interactive sessions
pub const DEFAULT_HISTFILE: &str = "~/.resht_history";

/// Base URL used when neither the profile nor the command line names one
pub const DEFAULT_URL: &str = "https://localhost:443/";

/// Profile section used when `--profile` is not given
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Get the profile file path, checking environment variable first, then falling back to default
pub fn get_profile_path() -> String {
    std::env::var_os(PROFILE_PATH_ENV_VAR)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string())
}

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Settings read from one profile section. Unset keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub url: Option<String>,
    pub insecure: Option<bool>,
    pub basic_auth: Option<String>,
    pub histfile: Option<String>,
    pub color: Option<bool>,
}

impl Profile {
    /// Load profile `name` from the INI file at `path`.
    ///
    /// A missing file or section yields an empty profile.
    pub fn load(path: &str, name: &str) -> Result<Self> {
        let expanded = expand_path(path);
        if !expanded.exists() {
            tracing::debug!("Profile file {} not found, using defaults", expanded.display());
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(&expanded)
            .with_context(|| format!("failed to read profile file {}", expanded.display()))?;
        tracing::debug!("Loading profile '{}' from '{}'", name, expanded.display());
        Self::from_ini(&ini, name)
    }

    /// Parse profile `name` from INI text
    pub fn parse(content: &str, name: &str) -> Result<Self> {
        let ini = Ini::load_from_str(content).context("failed to parse profile")?;
        Self::from_ini(&ini, name)
    }

    fn from_ini(ini: &Ini, name: &str) -> Result<Self> {
        let Some(section) = ini.section(Some(name)) else {
            tracing::debug!("Profile '{}' not found, using defaults", name);
            return Ok(Self::default());
        };
        let text = |key: &str| section.get(key).map(|v| v.trim().to_string());
        let flag = |key: &str| -> Result<Option<bool>> {
            match section.get(key) {
                None => Ok(None),
                Some(value) => parse_bool(value).map(Some).ok_or_else(|| {
                    anyhow!("invalid boolean for '{key}' in profile [{name}]: {value}")
                }),
            }
        };

        let basic_auth = text("basic_auth");
        if let Some(credential) = &basic_auth {
            if !credential.contains(':') {
                return Err(anyhow!(
                    "basic_auth in profile [{name}] must be in the form 'user:pass'"
                ));
            }
        }

        Ok(Self {
            url: text("url"),
            insecure: flag("insecure")?,
            basic_auth,
            histfile: text("histfile"),
            color: flag("color")?,
        })
    }
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Options for one shell session. Printed by the `config` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOptions {
    pub url: String,
    pub insecure: bool,
    pub color: bool,
    pub formatted: bool,
    pub verbose: bool,
    pub invert_color: bool,
    pub shell: bool,
    #[serde(skip_serializing)]
    pub basic_auth: Option<String>,
    pub histfile: PathBuf,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            insecure: false,
            color: atty::is(atty::Stream::Stdout),
            formatted: true,
            verbose: false,
            invert_color: false,
            shell: false,
            basic_auth: None,
            histfile: expand_path(DEFAULT_HISTFILE),
        }
    }
}

impl SessionOptions {
    /// Overlay the values a profile sets
    pub fn with_profile(mut self, profile: &Profile) -> Self {
        if let Some(url) = &profile.url {
            self.url = url.clone();
        }
        if let Some(insecure) = profile.insecure {
            self.insecure = insecure;
        }
        if let Some(color) = profile.color {
            self.color = color;
        }
        if let Some(credential) = &profile.basic_auth {
            self.basic_auth = Some(credential.clone());
        }
        if let Some(histfile) = &profile.histfile {
            self.histfile = expand_path(histfile);
        }
        self
    }

    pub fn histfile(&self) -> &Path {
        &self.histfile
    }
}
