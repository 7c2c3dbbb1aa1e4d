//! # resht - a shell for RESTful HTTP APIs
//!
//! Treats an API like a filesystem: `cd` between resources, issue
//! `get`/`post`/... against paths relative to the working path, keep cookies
//! for the session and reuse values captured from earlier responses.
//!
//! ## Layout
//!
//! ```text
//! ┌────────────┐  words   ┌─────────────┐  request   ┌──────────────┐
//! │  cmd_args  │─────────►│    shell    │───────────►│    client    │
//! │  (clap)    │          │ args/params │            │ url/query    │
//! └────────────┘          │ env/extract │◄───────────│ body/cookies │
//!                         │ present     │  response  │ transport    │
//!                         └─────────────┘            └──────────────┘
//! ```
//!
//! The [`client`] module is usable on its own:
//!
//! ```no_run
//! use resht::client::{HttpClient, RequestOptions};
//! use serde_json::json;
//!
//! let mut client = HttpClient::new("https://api.example.com/v1", false)?;
//! let body = client.post("/users", RequestOptions::new().body(json!({"name": "ada"})))?;
//! println!("{:?}", body.to_value());
//! # Ok::<(), resht::error::ClientError>(())
//! ```

pub mod client;
pub mod cmd_args;
pub mod config;
pub mod error;
pub mod path;
pub mod shell;

pub use client::{HttpClient, RequestOptions, Response};
pub use error::{ClientError, HttpError, ShellError};
pub use shell::{CommandFlow, Shell};
