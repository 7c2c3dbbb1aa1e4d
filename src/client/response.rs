//! # HTTP Response
//!
//! Decoding of response bodies and the metadata shown after each request.
//! Bodies are decompressed per `Content-Encoding`, decoded per the charset
//! in `Content-Type`, and parsed as JSON when the content type says so.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use bytes::Bytes;
use encoding_rs::Encoding;
use flate2::read::{GzDecoder, ZlibDecoder};
use serde::Serialize;
use serde_json::Value;

use super::transport::HeaderValues;
use crate::error::{ClientError, ClientResult};

/// Longest chunk of an undecodable body quoted back in a decode error
const DECODE_PREVIEW_LIMIT: usize = 256;

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Parsed JSON
    Json(Value),
    /// Text decoded with the charset named by the response
    Text(String),
    /// Bytes left as received
    Raw(Bytes),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The body as a JSON value; text and raw bytes become strings
    pub fn to_value(&self) -> Value {
        match self {
            Body::Json(value) => value.clone(),
            Body::Text(text) => Value::String(text.clone()),
            Body::Raw(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Request duration with a human description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Elapsed {
    pub ms: u64,
    pub desc: String,
}

impl Elapsed {
    pub fn from_duration(duration: Duration) -> Self {
        let ms = duration.as_millis() as u64;
        let desc = if ms < 1_000 {
            format!("{ms} ms")
        } else if ms < 60_000 {
            format!("{:.2} s", ms as f64 / 1_000.0)
        } else if ms < 3_600_000 {
            format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1_000)
        } else {
            format!("{}h {}m", ms / 3_600_000, (ms % 3_600_000) / 60_000)
        };
        Self { ms, desc }
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.desc)
    }
}

/// Response size with a scaled unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ByteSize {
    pub num_bytes: usize,
    pub unit: &'static str,
    pub value: f64,
}

impl ByteSize {
    pub fn from_bytes(num_bytes: usize) -> Self {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut value = num_bytes as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        Self {
            num_bytes,
            unit: UNITS[unit],
            value: (value * 100.0).round() / 100.0,
        }
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Summary of a finished request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMeta {
    pub duration: Elapsed,
    pub byte_size: ByteSize,
    pub success: bool,
    pub status_code: u16,
}

/// A completed HTTP exchange. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderValues,
    body: Body,
    raw: Bytes,
    meta: ResponseMeta,
}

impl Response {
    pub(crate) fn new(
        status: u16,
        headers: HeaderValues,
        body: Body,
        raw: Bytes,
        duration: Duration,
    ) -> Self {
        let meta = ResponseMeta {
            duration: Elapsed::from_duration(duration),
            byte_size: ByteSize::from_bytes(raw.len()),
            success: (200..400).contains(&status),
            status_code: status,
        };
        Self {
            status,
            headers,
            body,
            raw,
            meta,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderValues {
        &self.headers
    }

    /// First value of a header, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        first_header(&self.headers, &name.to_ascii_lowercase())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("application/json"))
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// Body bytes exactly as received
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }
}

/// Decode a raw response body according to its headers
pub fn decode_body(headers: &HeaderValues, raw: &Bytes) -> ClientResult<Body> {
    let bytes = match first_header(headers, "content-encoding") {
        Some(encoding) => decompress(encoding, raw)?,
        None => raw.clone(),
    };
    let content_type = first_header(headers, "content-type").unwrap_or_default();

    let text = if bytes.is_empty() {
        None
    } else {
        charset_of(content_type).and_then(|label| decode_charset(label, &bytes))
    };

    if content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("application/json")
    {
        if bytes.is_empty() {
            return Ok(Body::Json(Value::Null));
        }
        let parsed = match &text {
            Some(text) => serde_json::from_str(text),
            None => serde_json::from_slice(&bytes),
        };
        return parsed.map(Body::Json).map_err(|e| {
            tracing::warn!("Response claimed JSON but failed to parse: {}", e);
            ClientError::Decode {
                preview: preview(&bytes),
            }
        });
    }

    Ok(match text {
        Some(text) => Body::Text(text),
        None => Body::Raw(bytes),
    })
}

fn first_header<'a>(headers: &'a HeaderValues, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|values| values.first())
        .map(String::as_str)
}

/// The charset label from a `type/subtype; key=value` content type
fn charset_of(content_type: &str) -> Option<&str> {
    let (_, parameter) = content_type.split_once(';')?;
    let parameter = parameter.split(';').next()?.trim();
    let (_, value) = parameter.split_once('=')?;
    Some(value.trim().trim_matches('"'))
}

fn decode_charset(label: &str, bytes: &[u8]) -> Option<String> {
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => {
            let (decoded, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                tracing::debug!("Response body had invalid {} sequences", encoding.name());
            }
            Some(decoded.into_owned())
        }
        None => {
            tracing::debug!("Unknown response charset '{}'; leaving body as bytes", label);
            None
        }
    }
}

fn decompress(encoding: &str, raw: &Bytes) -> ClientResult<Bytes> {
    let mut out = Vec::new();
    let result = match encoding.trim().to_ascii_lowercase().as_str() {
        "gzip" | "x-gzip" => GzDecoder::new(&raw[..]).read_to_end(&mut out).map(|_| ()),
        "deflate" => ZlibDecoder::new(&raw[..]).read_to_end(&mut out).map(|_| ()),
        "zstd" => zstd::stream::copy_decode(&raw[..], &mut out),
        "identity" | "" => return Ok(raw.clone()),
        other => {
            tracing::debug!("Unsupported content encoding '{}'; leaving body as is", other);
            return Ok(raw.clone());
        }
    };
    result.map_err(|e| ClientError::Decode {
        preview: format!("{encoding} body could not be decompressed: {e}"),
    })?;
    Ok(Bytes::from(out))
}

fn preview(bytes: &[u8]) -> String {
    let end = bytes.len().min(DECODE_PREVIEW_LIMIT);
    let mut preview = String::from_utf8_lossy(&bytes[..end]).into_owned();
    if bytes.len() > end {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderValues {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), vec![v.to_string()]))
            .collect()
    }

    #[test]
    fn decode_body_should_parse_json_with_or_without_charset() {
        let raw = Bytes::from_static(br#"{"foo": "bar"}"#);
        for ct in ["application/json", "application/json; charset=utf-8"] {
            let body = decode_body(&headers(&[("content-type", ct)]), &raw).unwrap();
            assert_eq!(body, Body::Json(json!({"foo": "bar"})));
        }
    }

    #[test]
    fn decode_body_should_leave_unknown_types_as_bytes() {
        let raw = Bytes::from_static(br#"{"foo": "bar"}"#);
        for ct in ["text/plain", "foo/bar"] {
            let body = decode_body(&headers(&[("content-type", ct)]), &raw).unwrap();
            assert_eq!(body, Body::Raw(raw.clone()));
        }
    }

    #[test]
    fn decode_body_should_apply_charset() {
        let raw = Bytes::from_static(b"caf\xe9");
        let body = decode_body(
            &headers(&[("content-type", "text/plain; charset=iso-8859-1")]),
            &raw,
        )
        .unwrap();
        assert_eq!(body, Body::Text("café".to_string()));
    }

    #[test]
    fn decode_body_should_report_bad_json_with_preview() {
        let raw = Bytes::from_static(b"<html>oops</html>");
        let err = decode_body(&headers(&[("content-type", "application/json")]), &raw).unwrap_err();
        match err {
            ClientError::Decode { preview } => assert!(preview.contains("<html>oops")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_body_should_truncate_long_previews() {
        let raw = Bytes::from(vec![b'x'; 1000]);
        let err = decode_body(&headers(&[("content-type", "application/json")]), &raw).unwrap_err();
        match err {
            ClientError::Decode { preview } => assert_eq!(preview.len(), DECODE_PREVIEW_LIMIT + 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_body_should_treat_empty_json_body_as_null() {
        let body = decode_body(&headers(&[("content-type", "application/json")]), &Bytes::new()).unwrap();
        assert_eq!(body, Body::Json(Value::Null));
    }

    #[test]
    fn decode_body_should_gunzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"zipped": true}"#).unwrap();
        let raw = Bytes::from(encoder.finish().unwrap());

        let body = decode_body(
            &headers(&[("content-type", "application/json"), ("content-encoding", "gzip")]),
            &raw,
        )
        .unwrap();
        assert_eq!(body, Body::Json(json!({"zipped": true})));
    }

    #[test]
    fn decode_body_should_unzstd() {
        let raw = Bytes::from(zstd::encode_all(&b"[1,2]"[..], 0).unwrap());
        let body = decode_body(
            &headers(&[("content-type", "application/json"), ("content-encoding", "zstd")]),
            &raw,
        )
        .unwrap();
        assert_eq!(body, Body::Json(json!([1, 2])));
    }

    #[test]
    fn elapsed_should_describe_by_magnitude() {
        assert_eq!(Elapsed::from_duration(Duration::from_millis(250)).desc, "250 ms");
        assert_eq!(Elapsed::from_duration(Duration::from_millis(1500)).desc, "1.50 s");
        assert_eq!(Elapsed::from_duration(Duration::from_secs(125)).desc, "2m 5s");
        assert_eq!(Elapsed::from_duration(Duration::from_secs(7260)).desc, "2h 1m");
    }

    #[test]
    fn byte_size_should_scale_units() {
        assert_eq!(ByteSize::from_bytes(512).to_string(), "512 B");
        assert_eq!(ByteSize::from_bytes(1536).to_string(), "1.5 KB");
        assert_eq!(ByteSize::from_bytes(3 * 1024 * 1024).to_string(), "3 MB");
    }

    #[test]
    fn response_should_report_success_in_meta() {
        let ok = Response::new(301, HeaderValues::new(), Body::Json(Value::Null), Bytes::new(), Duration::ZERO);
        assert!(ok.meta().success);
        let failed = Response::new(404, HeaderValues::new(), Body::Json(Value::Null), Bytes::new(), Duration::ZERO);
        assert!(!failed.meta().success);
        assert_eq!(failed.meta().status_code, 404);
    }
}
