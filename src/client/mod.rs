//! # HTTP Client
//!
//! A session-scoped REST client. It owns the base URL every request path is
//! resolved against, a flat cookie jar fed by `Set-Cookie` responses, and an
//! optional default basic-auth credential.
//!
//! Every verb goes through [`HttpClient::request`]:
//!
//! ```text
//! method/path ─► query ─► URL ─► headers ─► body ─► transport
//!                                                      │
//!        Body/Response ◄─ status check ◄─ decode ◄─ cookies
//! ```

pub mod body;
pub mod cookie;
pub mod headers;
pub mod query;
pub mod response;
pub mod transport;
pub mod url;

use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

pub use body::{BodyEncoding, RequestBody};
pub use cookie::CookieJar;
pub use headers::HeaderSet;
pub use query::{build_query, merge_query, merge_url_query, parse_query_to_object};
pub use response::{Body, ByteSize, Elapsed, Response, ResponseMeta};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use self::url::Url;

use crate::error::{ClientError, ClientResult, HttpError, HttpErrorKind};
use crate::path::normalize_path;

/// Query string input in any of the shapes callers tend to have on hand
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// A ready-made query string, with or without a leading `?`
    Text(String),
    /// `name=value` pairs joined with `&`
    Pairs(Vec<String>),
    /// A mapping encoded with [`build_query`]
    Params(Map<String, Value>),
}

impl Query {
    pub fn into_query_string(self) -> String {
        match self {
            Query::Text(text) => text,
            Query::Pairs(pairs) => pairs.join("&"),
            Query::Params(params) => build_query(&params, ""),
        }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::Text(text.to_string())
    }
}

impl From<Vec<String>> for Query {
    fn from(pairs: Vec<String>) -> Self {
        Query::Pairs(pairs)
    }
}

impl From<Map<String, Value>> for Query {
    fn from(params: Map<String, Value>) -> Self {
        Query::Params(params)
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<RequestBody>,
    pub query: Option<Query>,
    pub headers: Vec<(String, String)>,
    /// `user:pass`, overriding the client default for this call
    pub basic_auth: Option<String>,
    /// Log the request and response at info level
    pub verbose: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn query(mut self, query: impl Into<Query>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn basic_auth(mut self, credential: impl Into<String>) -> Self {
        self.basic_auth = Some(credential.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// REST client bound to a base URL
pub struct HttpClient {
    base_url: Url,
    cookies: CookieJar,
    basic_auth: Option<String>,
    insecure: bool,
    transport: Box<dyn Transport>,
    verbose_log: Vec<String>,
}

impl HttpClient {
    /// Create a client talking over reqwest
    pub fn new(base_url: &str, insecure: bool) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(insecure)?;
        Self::with_transport(base_url, insecure, Box::new(transport))
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(
        base_url: &str,
        insecure: bool,
        transport: Box<dyn Transport>,
    ) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        tracing::debug!("HttpClient created for {}", base_url);
        Ok(Self {
            base_url,
            cookies: CookieJar::new(),
            basic_auth: None,
            insecure,
            transport,
            verbose_log: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Replace the base URL. On failure the previous one stays in place.
    pub fn set_base_url(&mut self, base_url: &str) -> ClientResult<()> {
        self.base_url = Url::parse(base_url)?;
        tracing::info!("Base URL set to {}", self.base_url);
        Ok(())
    }

    /// Set or clear the default `user:pass` credential
    pub fn set_basic_auth(&mut self, credential: Option<String>) {
        self.basic_auth = credential;
    }

    pub fn basic_auth(&self) -> Option<&str> {
        self.basic_auth.as_deref()
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    /// Full URL for `path` under the base URL, with the base URL's own query
    /// merged first and then `query`.
    ///
    /// A query embedded in `path` lands between the two.
    pub fn build_url(&self, path: &str, query: Option<&str>) -> String {
        let (path, path_query) = path.split_once('?').unwrap_or((path, ""));
        let path = normalize_path(&format!("/{}/{}", self.base_url.path(), path), true, false);
        let port = if self.base_url.has_default_port() {
            String::new()
        } else {
            format!(":{}", self.base_url.port())
        };
        let mut url = format!(
            "{}://{}{}{}",
            self.base_url.scheme(),
            self.base_url.hostname(),
            port,
            path
        );
        if !self.base_url.query().is_empty() {
            url = merge_url_query(&url, self.base_url.query());
        }
        if !path_query.is_empty() {
            url = merge_url_query(&url, path_query);
        }
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url = merge_url_query(&url, query);
        }
        url
    }

    pub fn get(&mut self, path: &str, options: RequestOptions) -> ClientResult<Body> {
        self.request("GET", path, options).map(Response::into_body)
    }

    pub fn head(&mut self, path: &str, options: RequestOptions) -> ClientResult<Body> {
        self.request("HEAD", path, options).map(Response::into_body)
    }

    pub fn post(&mut self, path: &str, options: RequestOptions) -> ClientResult<Body> {
        self.request("POST", path, options).map(Response::into_body)
    }

    pub fn put(&mut self, path: &str, options: RequestOptions) -> ClientResult<Body> {
        self.request("PUT", path, options).map(Response::into_body)
    }

    pub fn patch(&mut self, path: &str, options: RequestOptions) -> ClientResult<Body> {
        self.request("PATCH", path, options).map(Response::into_body)
    }

    pub fn delete(&mut self, path: &str, options: RequestOptions) -> ClientResult<Body> {
        self.request("DELETE", path, options).map(Response::into_body)
    }

    pub fn options(&mut self, path: &str, options: RequestOptions) -> ClientResult<Body> {
        self.request("OPTIONS", path, options).map(Response::into_body)
    }

    /// Issue a request and return the full response.
    ///
    /// Statuses of 400 and above (and below 200) fail with
    /// [`ClientError::Http`]; the response is still reachable through the
    /// error. GET and HEAD never carry a body: a mapping body is folded into
    /// the query string instead.
    pub fn request(
        &mut self,
        method: &str,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<Response> {
        let method = if method.is_empty() {
            "GET".to_string()
        } else {
            method.to_uppercase()
        };
        let path = if path.is_empty() { "/" } else { path };
        let bodiless = method == "GET" || method == "HEAD";

        let mut query = options.query.map(Query::into_query_string);
        if bodiless {
            if let Some(RequestBody::Value(Value::Object(params))) = &options.body {
                if !params.is_empty() {
                    let encoded = build_query(params, "");
                    query = Some(match query {
                        Some(q) => merge_query(&q, Some(&encoded)),
                        None => encoded,
                    });
                }
            }
        }
        let url = self.build_url(path, query.as_deref());

        let mut headers = HeaderSet::new();
        headers.set("Content-Type", body::JSON_CONTENT_TYPE);
        headers.set("Accept", body::JSON_CONTENT_TYPE);
        if let Some(cookie) = self.cookies.header_value() {
            headers.set("Cookie", cookie);
        }
        if let Some(credential) = options.basic_auth.as_deref().or(self.basic_auth.as_deref()) {
            headers.set("Authorization", format!("Basic {}", STANDARD.encode(credential)));
        }
        headers.extend(options.headers);

        let body = match (&options.body, bodiless) {
            (Some(body), false) => {
                BodyEncoding::from_content_type(headers.get("content-type")).encode(body)?
            }
            _ => None,
        };

        if options.verbose {
            let mut lines = vec![format!("Request: {method} {url}")];
            lines.extend(
                headers
                    .iter()
                    .map(|(name, value)| format!("Request header: {name}: {value}")),
            );
            if let Some(body) = &body {
                lines.push(format!("Request body: {}", String::from_utf8_lossy(body)));
            }
            self.record_verbose(lines);
        } else {
            tracing::debug!("{} {}", method, url);
        }

        let transport_request = TransportRequest {
            method: method.clone(),
            url,
            headers: headers.into_vec(),
            body,
        };
        let started = Instant::now();
        let sent = self.transport.send(&transport_request)?;
        let elapsed = started.elapsed();

        if let Some(values) = sent.headers.get("set-cookie") {
            for value in values {
                self.cookies.absorb_set_cookie(value);
            }
        }

        if options.verbose {
            let mut lines = vec![format!("Response status: {}", sent.status)];
            lines.extend(
                sent.headers
                    .iter()
                    .map(|(name, values)| format!("Response header: {name}: {}", values.join(", "))),
            );
            lines.extend(
                self.cookies
                    .iter()
                    .map(|(name, value)| format!("Cookie: {name}={value}")),
            );
            self.record_verbose(lines);
        }

        let decoded = response::decode_body(&sent.headers, &sent.body)?;
        let response = Response::new(sent.status, sent.headers, decoded, sent.body, elapsed);

        match HttpErrorKind::classify(response.status()) {
            None => Ok(response),
            Some(kind) => {
                let message = format!("\"{} {}\" failed ({})", method, path, response.status());
                tracing::debug!("{}: {}", kind, message);
                Err(ClientError::Http(HttpError::new(kind, message, response)))
            }
        }
    }
}

impl HttpClient {
    /// Drain the request and response details recorded by verbose requests
    pub fn take_verbose_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.verbose_log)
    }

    fn record_verbose(&mut self, lines: Vec<String>) {
        for line in &lines {
            tracing::info!("{}", line);
        }
        self.verbose_log.extend(lines);
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.to_string())
            .field("cookies", &self.cookies)
            .field("basic_auth", &self.basic_auth.as_ref().map(|_| "<set>"))
            .field("insecure", &self.insecure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::transport::testing::{RecordingTransport, UnreachableTransport};
    use super::*;

    fn client_with(base_url: &str, transport: &RecordingTransport) -> HttpClient {
        HttpClient::with_transport(base_url, false, Box::new(transport.clone())).unwrap()
    }

    fn header<'a>(request: &'a TransportRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn params(value: Value) -> RequestBody {
        RequestBody::Value(value)
    }

    fn query_parts(url: &str) -> std::collections::BTreeSet<String> {
        let (_, query) = url.split_once('?').expect("url has a query");
        query.split('&').map(str::to_string).collect()
    }

    #[test]
    fn set_base_url_should_keep_previous_url_on_error() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com/api", &transport);
        assert!(client.set_base_url("ftp://nope").is_err());
        assert_eq!(client.base_url().to_string(), "http://example.com/api");
    }

    #[test]
    fn build_url_should_collapse_slashes() {
        let transport = RecordingTransport::new();
        let client = client_with("example.com/api/", &transport);
        assert_eq!(client.build_url("//users//42", None), "http://example.com/api/users/42");
        assert_eq!(client.build_url("/users/", None), "http://example.com/api/users/");
    }

    #[test]
    fn build_url_should_include_non_default_port_only() {
        let transport = RecordingTransport::new();
        let client = client_with("https://example.com:8443", &transport);
        assert_eq!(client.build_url("/", None), "https://example.com:8443/");

        let client = client_with("https://example.com:443", &transport);
        assert_eq!(client.build_url("/", None), "https://example.com/");
    }

    #[test]
    fn build_url_should_merge_base_query_then_call_query() {
        let transport = RecordingTransport::new();
        let client = client_with("example.com/?foo=bar", &transport);
        assert_eq!(
            client.build_url("/?food=barn", Some("fool=bard")),
            "http://example.com/?foo=bar&food=barn&fool=bard"
        );
    }

    #[test]
    fn request_should_default_path_and_uppercase_method() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);
        client.request("post", "", RequestOptions::new()).unwrap();
        let sent = transport.last_request();
        assert_eq!(sent.method, "POST");
        assert_eq!(sent.url, "http://example.com/");
    }

    #[test]
    fn request_should_accept_every_query_shape() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);

        let mut map = Map::new();
        map.insert("foo".to_string(), json!("bar"));
        map.insert("food".to_string(), json!("barn"));
        let shapes: Vec<Query> = vec![
            Query::from("foo=bar&food=barn"),
            Query::from("?foo=bar&food=barn"),
            Query::from(vec!["foo=bar".to_string(), "food=barn".to_string()]),
            Query::from(map),
        ];
        for shape in shapes {
            client.get("/path", RequestOptions::new().query(shape)).unwrap();
            assert_eq!(transport.last_request().url, "http://example.com/path?foo=bar&food=barn");
        }

        client.get("/path", RequestOptions::new().query("?")).unwrap();
        assert!(!transport.last_request().url.contains('?'));
    }

    #[test]
    fn get_should_fold_body_into_query() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com/?base=1", &transport);
        for method in ["GET", "HEAD"] {
            client
                .request(
                    method,
                    "/search",
                    RequestOptions::new().query("q=x").body(json!({"page": 2, "all": true})),
                )
                .unwrap();
            let sent = transport.last_request();
            assert_eq!(sent.body, None);
            let expected: std::collections::BTreeSet<String> =
                ["base=1", "q=x", "page=2", "all=1"].iter().map(|s| s.to_string()).collect();
            assert_eq!(query_parts(&sent.url), expected);
        }
    }

    #[test]
    fn request_should_encode_body_by_content_type() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);
        let body = json!({"foo": "bar"});

        for method in ["POST", "PUT", "PATCH", "DELETE", "OPTIONS"] {
            client
                .request(method, "/", RequestOptions::new().body(params(body.clone())))
                .unwrap();
            assert_eq!(transport.last_request().body.unwrap(), &br#"{"foo":"bar"}"#[..]);

            client
                .request(
                    method,
                    "/",
                    RequestOptions::new()
                        .body(params(body.clone()))
                        .header("content-type", "application/json; charset=utf-8"),
                )
                .unwrap();
            assert_eq!(transport.last_request().body.unwrap(), &br#"{"foo":"bar"}"#[..]);

            for name in ["content-type", "Content-Type"] {
                client
                    .request(
                        method,
                        "/",
                        RequestOptions::new()
                            .body(params(body.clone()))
                            .header(name, "application/x-www-form-urlencoded"),
                    )
                    .unwrap();
                assert_eq!(transport.last_request().body.unwrap(), &b"foo=bar"[..]);
            }
        }
    }

    #[test]
    fn request_should_pass_other_content_types_through() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);
        client
            .post(
                "/",
                RequestOptions::new()
                    .body(Value::String("<a/>".to_string()))
                    .header("Content-Type", "application/xml"),
            )
            .unwrap();
        let sent = transport.last_request();
        assert_eq!(sent.body.clone().unwrap(), &b"<a/>"[..]);
        assert_eq!(header(&sent, "content-type"), Some("application/xml"));
    }

    #[test]
    fn request_should_send_json_defaults() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);
        client.get("/", RequestOptions::new()).unwrap();
        let sent = transport.last_request();
        assert_eq!(header(&sent, "content-type"), Some("application/json"));
        assert_eq!(header(&sent, "accept"), Some("application/json"));
        assert_eq!(header(&sent, "authorization"), None);
        assert_eq!(header(&sent, "cookie"), None);
    }

    #[test]
    fn basic_auth_should_follow_precedence() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);
        client.set_basic_auth(Some("user:pass".to_string()));

        client.get("/", RequestOptions::new()).unwrap();
        assert_eq!(
            header(&transport.last_request(), "authorization"),
            Some(format!("Basic {}", STANDARD.encode("user:pass")).as_str())
        );

        client.get("/", RequestOptions::new().basic_auth("other:secret")).unwrap();
        assert_eq!(
            header(&transport.last_request(), "authorization"),
            Some(format!("Basic {}", STANDARD.encode("other:secret")).as_str())
        );

        client
            .get(
                "/",
                RequestOptions::new()
                    .basic_auth("other:secret")
                    .header("authorization", "Bearer abc"),
            )
            .unwrap();
        assert_eq!(header(&transport.last_request(), "authorization"), Some("Bearer abc"));
    }

    #[test]
    fn set_cookie_should_feed_next_request() {
        let transport = RecordingTransport::new();
        transport
            .respond_with(
                200,
                &[
                    ("content-type", "application/json"),
                    ("set-cookie", "session=abc; Path=/; HttpOnly"),
                    ("set-cookie", "theme=dark"),
                ],
                b"{}",
            )
            .respond(200, "application/json", b"{}");
        let mut client = client_with("example.com", &transport);

        client.get("/login", RequestOptions::new()).unwrap();
        client.get("/me", RequestOptions::new()).unwrap();

        let cookie = header(&transport.last_request(), "cookie").unwrap().to_string();
        assert!(cookie.contains("session=abc"));
        assert!(cookie.contains("theme=dark"));
        assert_eq!(client.cookies().len(), 2);
    }

    #[test]
    fn get_should_decode_json_and_leave_other_bodies_alone() {
        let transport = RecordingTransport::new();
        transport.respond(200, "application/json; charset=utf-8", br#"{"foo": "bar"}"#);
        let mut client = client_with("example.com", &transport);
        assert_eq!(
            client.get("/", RequestOptions::new()).unwrap(),
            Body::Json(json!({"foo": "bar"}))
        );

        let transport = RecordingTransport::new();
        transport.respond(200, "text/plain", b"hello");
        let mut client = client_with("example.com", &transport);
        assert_eq!(
            client.get("/", RequestOptions::new()).unwrap(),
            Body::Raw(bytes::Bytes::from_static(b"hello"))
        );
    }

    #[test]
    fn user_error_should_carry_decoded_payload() {
        let transport = RecordingTransport::new();
        transport.respond(404, "application/json", br#"{"error": "missing"}"#);
        let mut client = client_with("example.com", &transport);

        let err = client.get("/nope", RequestOptions::new()).unwrap_err();
        match err {
            ClientError::Http(e) => {
                assert!(e.is_user_error());
                assert_eq!(e.response().status(), 404);
                assert_eq!(e.response().body(), &Body::Json(json!({"error": "missing"})));
                assert_eq!(e.to_string(), "\"GET /nope\" failed (404)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_error_should_be_classified() {
        let transport = RecordingTransport::new();
        transport.respond(503, "text/plain", b"down");
        let mut client = client_with("example.com", &transport);
        match client.get("/", RequestOptions::new()).unwrap_err() {
            ClientError::Http(e) => assert!(e.is_server_error()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn redirect_should_not_raise() {
        let transport = RecordingTransport::new();
        transport.respond_with(301, &[("location", "/elsewhere")], b"");
        let mut client = client_with("example.com", &transport);
        let response = client.request("GET", "/", RequestOptions::new()).unwrap();
        assert_eq!(response.status(), 301);
        assert!(response.meta().success);
    }

    #[test]
    fn transport_failure_should_surface_as_transport_error() {
        let mut client =
            HttpClient::with_transport("example.com", false, Box::new(UnreachableTransport)).unwrap();
        let err = client.get("/", RequestOptions::new()).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn paths_should_land_at_end_of_url() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);
        for path in ["", "/", "/path", "//path", "/path/", "/path/path", "/path/path//path/"] {
            client.get(path, RequestOptions::new()).unwrap();
            let url = transport.last_request().url;
            let clean = normalize_path(path, true, false);
            assert!(url.ends_with(&clean), "{url} should end with {clean}");
        }
    }

    #[test]
    fn verbose_request_should_record_exchange_details() {
        let transport = RecordingTransport::new();
        transport.respond_with(
            200,
            &[("content-type", "application/json"), ("set-cookie", "session=abc")],
            b"{}",
        );
        let mut client = client_with("example.com", &transport);
        client
            .post("/x", RequestOptions::new().body(json!({"a": 1})).verbose(true))
            .unwrap();

        let log = client.take_verbose_log();
        assert_eq!(log[0], "Request: POST http://example.com/x");
        assert!(log.contains(&"Request header: Accept: application/json".to_string()));
        assert!(log.contains(&r#"Request body: {"a":1}"#.to_string()));
        assert!(log.contains(&"Response status: 200".to_string()));
        assert!(log.contains(&"Cookie: session=abc".to_string()));
        assert!(client.take_verbose_log().is_empty());
    }

    #[test]
    fn quiet_request_should_record_nothing() {
        let transport = RecordingTransport::new();
        let mut client = client_with("example.com", &transport);
        client.get("/x", RequestOptions::new()).unwrap();
        assert!(client.take_verbose_log().is_empty());
    }
}
