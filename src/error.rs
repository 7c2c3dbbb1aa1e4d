//! Error types for resht
//!
//! Client errors cover everything between composing a URL and classifying the
//! response status. Shell errors cover the command grammar and wrap client
//! errors when a command fails while talking to the server.

use std::fmt;

use thiserror::Error;

use crate::client::Response;

/// Result type alias for HTTP client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Result type alias for shell operations
pub type ShellResult<T> = std::result::Result<T, ShellError>;

/// Errors raised by the HTTP client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The base URL (or its port) could not be parsed or validated
    #[error("Invalid API URL \"{input}\": {reason}")]
    InvalidUrl { input: String, reason: String },

    /// The server answered with a non-success status
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The response claimed to be JSON but did not parse
    #[error("Failed to decode API response\n{preview}")]
    Decode { preview: String },

    /// Connection-level failure: DNS, refused connection, TLS handshake...
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    Encode(String),
}

impl ClientError {
    pub(crate) fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Status class of an [`HttpError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// Anything outside 200-399 that is not a 4xx or 5xx
    Status,
    /// 400-499
    User,
    /// 500 and above
    Server,
}

impl HttpErrorKind {
    /// Classify a status code, returning `None` for statuses that are not errors
    pub fn classify(status: u16) -> Option<Self> {
        match status {
            200..=399 => None,
            400..=499 => Some(Self::User),
            500..=u16::MAX => Some(Self::Server),
            _ => Some(Self::Status),
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpErrorKind::Status => write!(f, "HttpError"),
            HttpErrorKind::User => write!(f, "UserHttpError"),
            HttpErrorKind::Server => write!(f, "ServerHttpError"),
        }
    }
}

/// A request that completed at the transport level but failed by status.
///
/// The full response stays attached so callers can still show the error
/// payload the server sent back.
#[derive(Debug)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
    response: Box<Response>,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>, response: Response) -> Self {
        Self {
            kind,
            message: message.into(),
            response: Box::new(response),
        }
    }

    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn is_user_error(&self) -> bool {
        self.kind == HttpErrorKind::User
    }

    pub fn is_server_error(&self) -> bool {
        self.kind == HttpErrorKind::Server
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        *self.response
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HttpError {}

/// Errors raised while parsing or running a shell command
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("{0}")]
    Syntax(String),

    #[error("Unrecognized command: \"{0}\". Enter \"help\" for help.")]
    UnrecognizedCommand(String),

    #[error("URI is out of bounds: \"{0}\".")]
    PathOutOfBounds(String),

    #[error("Variable \"{0}\" is not in memory")]
    VariableNotFound(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }
}
