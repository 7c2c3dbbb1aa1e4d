//! # Request Bodies
//!
//! How a request body is put on the wire is decided by the effective
//! `Content-Type` header, matched case-insensitively.

use bytes::Bytes;
use serde_json::Value;

use super::query::build_query;
use crate::error::{ClientError, ClientResult};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request body as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured parameters, encoded according to the content type
    Value(Value),
    /// Already-formatted bytes sent verbatim
    Raw(Bytes),
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Value(value)
    }
}

/// Body encoding strategy selected from a content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `application/json`, with or without parameters
    Json,
    /// exactly `application/x-www-form-urlencoded`
    Form,
    /// anything else; the body is assumed to be encoded by the caller
    Other(String),
}

impl BodyEncoding {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let content_type = content_type.unwrap_or_default().trim();
        let lowered = content_type.to_ascii_lowercase();
        if lowered.starts_with(JSON_CONTENT_TYPE) {
            BodyEncoding::Json
        } else if lowered == FORM_CONTENT_TYPE {
            BodyEncoding::Form
        } else {
            BodyEncoding::Other(content_type.to_string())
        }
    }

    /// Encode a body for the wire. `None` means no body is sent.
    pub fn encode(&self, body: &RequestBody) -> ClientResult<Option<Bytes>> {
        let value = match body {
            RequestBody::Raw(bytes) => return Ok(Some(bytes.clone())),
            RequestBody::Value(value) => value,
        };

        match self {
            BodyEncoding::Json => serde_json::to_vec(value)
                .map(|encoded| Some(Bytes::from(encoded)))
                .map_err(|e| ClientError::Encode(e.to_string())),
            BodyEncoding::Form => match value {
                Value::Object(params) => Ok(Some(Bytes::from(build_query(params, "")))),
                Value::Null => Ok(None),
                other => Ok(Some(Bytes::from(passthrough(other)))),
            },
            BodyEncoding::Other(_) => match value {
                Value::Null => Ok(None),
                other => Ok(Some(Bytes::from(passthrough(other)))),
            },
        }
    }
}

fn passthrough(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
