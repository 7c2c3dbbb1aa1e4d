use std::ffi::OsString;

pub use clap::Parser;

use crate::config::DEFAULT_PROFILE_NAME;

/// Process arguments. Everything after the profile option is a shell
/// command line and is handed to the shell's own grammar untouched, so
/// `-h`, `-v` and friends mean what they mean inside the shell.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, disable_help_flag = true)]
struct ClapArgs {
    /// Profile name
    /// Section of the profile file to read defaults from. Default is 'default'.
    /// A profile that is not configured falls back to built-in defaults.
    #[clap(short = 'p', long, default_value = DEFAULT_PROFILE_NAME, help = "profile name")]
    profile: String,

    /// Command words, e.g. `get /users -x items`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    profile: String,
    words: Vec<String>,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        let args = ClapArgs::parse();
        Self {
            profile: args.profile,
            words: args.words,
        }
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = ClapArgs::parse_from(itr);
        Self {
            profile: args.profile,
            words: args.words,
        }
    }

    pub fn profile(&self) -> &String {
        &self.profile
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}
