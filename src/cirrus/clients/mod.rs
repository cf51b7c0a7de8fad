//! # Remote API Clients
//!
//! Every client is a thin wrapper over [`RestClient`], which knows how to build
//! an authenticated request against a base URL, hand it to a [`Transport`] and
//! check the returned status against the set the operation accepts. Anything
//! outside that set becomes a [`ClientError`] through the client's error decoder.
//!
//! ## Transports
//!
//! - [`HttpTransport`]: production, blocking `reqwest`
//! - [`memory::MemoryTransport`]: scripted responses for tests, no network
//!
//! One request is in flight at a time; the process runs a single command and
//! exits, so there is no pooling, retrying or cancellation here.

use crate::error::ClientError;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

pub mod compute;
pub mod images;
pub mod memory;
pub mod storage;

pub use compute::ComputeClient;
pub use images::ImagesClient;
pub use storage::StorageClient;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_json(mut self, value: Value) -> Self {
        self.body = value.to_string().into_bytes();
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> ClientResult<Value> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            ClientError::new("Invalid JSON in response")
                .with_status(self.status)
                .with_details(e.to_string())
        })
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Moves one HTTP exchange over the wire (or pretends to).
pub trait Transport {
    fn send(&self, request: &Request) -> ClientResult<Response>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> ClientResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("cirrus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::new("Cannot create HTTP client").with_details(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> ClientResult<Response> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Bytes(bytes) => builder.body(bytes.clone()),
        };

        let response = builder.send().map_err(|e| {
            ClientError::new(format!("Cannot reach {}", request.url)).with_details(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| {
                ClientError::new("Cannot read response body")
                    .with_status(status)
                    .with_details(e.to_string())
            })?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Maps a rejected response to the error reported to the user.
pub type ErrorDecoder = fn(&Response) -> ClientError;

/// Status reason phrase as the message, the body as details.
pub fn default_error(response: &Response) -> ClientError {
    let message = StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Request failed");
    ClientError::new(message)
        .with_status(response.status)
        .with_details(response.text().trim())
}

/// Shared request plumbing for every API family.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    token: String,
    transport: Rc<dyn Transport>,
    decode_error: ErrorDecoder,
}

impl RestClient {
    pub fn new(base_url: &str, token: &str, transport: Rc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            transport,
            decode_error: default_error,
        }
    }

    pub fn with_error_decoder(mut self, decode_error: ErrorDecoder) -> Self {
        self.decode_error = decode_error;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// A request for `path` under the base URL, carrying the auth token if any.
    pub fn request(&self, method: Method, path: &str) -> Request {
        let request = Request::new(method, format!("{}{}", self.base_url, path));
        if self.token.is_empty() {
            request
        } else {
            request.header(AUTH_HEADER, self.token.as_str())
        }
    }

    /// Sends `request`, accepting only the listed statuses.
    pub fn execute(&self, request: Request, success: &[u16]) -> ClientResult<Response> {
        debug!("{} {}", request.method, request.url);
        let response = self.transport.send(&request)?;
        debug!("{} {} -> {}", request.method, request.url, response.status);

        if success.contains(&response.status) {
            Ok(response)
        } else {
            Err((self.decode_error)(&response))
        }
    }

    pub fn get(&self, path: &str, success: &[u16]) -> ClientResult<Response> {
        self.execute(self.request(Method::GET, path), success)
    }

    pub fn head(&self, path: &str, success: &[u16]) -> ClientResult<Response> {
        self.execute(self.request(Method::HEAD, path), success)
    }

    pub fn delete(&self, path: &str, success: &[u16]) -> ClientResult<Response> {
        self.execute(self.request(Method::DELETE, path), success)
    }

    pub fn post(&self, path: &str, json: Value, success: &[u16]) -> ClientResult<Response> {
        self.execute(
            self.request(Method::POST, path).body(Body::Json(json)),
            success,
        )
    }

    pub fn put(&self, path: &str, json: Value, success: &[u16]) -> ClientResult<Response> {
        self.execute(
            self.request(Method::PUT, path).body(Body::Json(json)),
            success,
        )
    }
}

/// Extracts `value[key]`, failing if the server left it out.
pub(crate) fn take_field(mut value: Value, key: &str) -> ClientResult<Value> {
    match value.get_mut(key) {
        Some(field) => Ok(field.take()),
        None => Err(ClientError::new(format!(
            "Unexpected response: missing '{}'",
            key
        ))),
    }
}

/// Extracts a collection that is either `value[key]` or `value[key]["values"]`.
pub(crate) fn take_list(value: Value, key: &str) -> ClientResult<Vec<Value>> {
    match take_field(value, key)? {
        Value::Array(items) => Ok(items),
        Value::Object(mut wrapped) => match wrapped.remove("values") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ClientError::new(format!(
                "Unexpected response: '{}' is not a list",
                key
            ))),
        },
        _ => Err(ClientError::new(format!(
            "Unexpected response: '{}' is not a list",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryTransport;
    use super::*;
    use serde_json::json;

    fn client(transport: &Rc<MemoryTransport>, token: &str) -> RestClient {
        RestClient::new("http://api.test/v1/", token, transport.clone())
    }

    #[test]
    fn test_request_joins_base_url_and_sets_token() {
        let transport = Rc::new(MemoryTransport::new());
        let rest = client(&transport, "secret");

        let request = rest.request(Method::GET, "/servers");
        assert_eq!(request.url, "http://api.test/v1/servers");
        assert_eq!(request.header_value("x-auth-token"), Some("secret"));
    }

    #[test]
    fn test_empty_token_sends_no_header() {
        let transport = Rc::new(MemoryTransport::new());
        let rest = client(&transport, "");
        let request = rest.request(Method::GET, "/servers");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_unexpected_status_uses_default_decoder() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::GET,
            "http://api.test/v1/servers",
            Response::new(503).with_body("try later"),
        );
        let rest = client(&transport, "");

        let err = rest.get("/servers", &[200]).unwrap_err();
        assert_eq!(err.message, "Service Unavailable");
        assert_eq!(err.status, Some(503));
        assert_eq!(err.details, "try later");
    }

    #[test]
    fn test_accepted_status_returns_response() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::DELETE,
            "http://api.test/v1/servers/1",
            Response::new(404),
        );
        let rest = client(&transport, "");

        let response = rest.delete("/servers/1", &[204, 404]).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_take_list_accepts_both_shapes() {
        let plain = json!({"servers": [{"id": 1}]});
        let wrapped = json!({"servers": {"values": [{"id": 1}, {"id": 2}]}});
        assert_eq!(take_list(plain, "servers").unwrap().len(), 1);
        assert_eq!(take_list(wrapped, "servers").unwrap().len(), 2);
        assert!(take_list(json!({"other": []}), "servers").is_err());
        assert!(take_list(json!({"servers": 3}), "servers").is_err());
    }

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let response = Response::new(204).with_header("X-Account-Bytes-Used", "10");
        assert_eq!(response.header("x-account-bytes-used"), Some("10"));
        assert_eq!(response.json().unwrap(), Value::Null);
    }
}
