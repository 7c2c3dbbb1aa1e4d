//! # resht entry point
//!
//! Reads the profile, folds the process arguments into the session options
//! and hands the remaining words to the shell.

use std::io;

use anyhow::{Context, Result};
use resht::client::HttpClient;
use resht::cmd_args::CommandLineArgs;
use resht::config::{get_profile_path, Profile, SessionOptions, LOG_LEVEL_ENV_VAR};
use resht::shell::{self, present::TerminalPresenter, Shell};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing_subscriber();

    let cmd_args = CommandLineArgs::parse();
    let profile = Profile::load(&get_profile_path(), cmd_args.profile())?;
    let mut options = SessionOptions::default().with_profile(&profile);

    if let Err(e) = shell::apply_main_args(&mut options, cmd_args.words()) {
        eprintln!("! {e}");
        std::process::exit(1);
    }
    tracing::debug!("Session options: {:?}", options);

    let client = HttpClient::new(&options.url, options.insecure)
        .with_context(|| format!("failed to create HTTP client for {}", options.url))?;
    let mut shell = Shell::new(client, options, TerminalPresenter::stdio());

    let status = shell.launch(cmd_args.words(), io::stdin().lock());
    std::process::exit(status);
}

fn init_tracing_subscriber() {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .with_env_var(LOG_LEVEL_ENV_VAR)
        .from_env_lossy();
    for quiet in ["reqwest=warn", "hyper=warn", "hyper_util=warn", "rustls=warn"] {
        if let Ok(directive) = quiet.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}
