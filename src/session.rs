//! Transport seam for the Launchpad API.
//!
//! Abstracts the HTTP session for testability:
//! - `Session` trait: interface the request gateway talks to
//! - `HttpSession`: reqwest-backed session for production
//! - `MockSession` (in `crate::mock`): in-process mock Launchpad
//!
//! The session owns connection reuse and timeout policy; the lane never
//! reconfigures it beyond the two default headers set at construction.

use std::io;

use crate::auth::Credentials;

/// HTTP method subset the lane issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A single API call: path plus query and form parameters.
///
/// `path` is either relative to the API base or an absolute self-link
/// as returned inside Launchpad payloads. Repeated form keys are
/// allowed (multi-valued fields such as `processors`).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Named API operation (`ws.op`), wherever it was supplied.
    pub fn ws_op(&self) -> Option<&str> {
        self.query
            .iter()
            .chain(self.form.iter())
            .find(|(key, _)| key == "ws.op")
            .map(|(_, value)| value.as_str())
    }

    /// First value for a query or form parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .chain(self.form.iter())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response: status code plus body bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport errors, distinct from remote (non-2xx) failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Interface between the request gateway and whatever carries the bytes.
pub trait Session: Send + Sync {
    /// Issue one call and return the raw response.
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Production session over reqwest's blocking client.
///
/// Sets `Accept: application/json` and the signed `Authorization`
/// header once as client defaults, the only configuration the lane
/// applies to its transport.
pub struct HttpSession {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSession {
    pub fn new(credentials: &Credentials) -> Result<Self, TransportError> {
        Self::with_base_url(credentials, lp_api::DEFAULT_API_BASE)
    }

    pub fn with_base_url(
        credentials: &Credentials,
        base_url: &str,
    ) -> Result<Self, TransportError> {
        use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&credentials.authorization_header())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?,
        );

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}/", base_url.trim_end_matches('/')),
        })
    }

    /// Self-links are absolute and used verbatim; everything else is
    /// joined to the API base.
    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}

impl Session for HttpSession {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder
            .send()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?
            .to_vec();

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builders_accumulate_params() {
        let request = ApiRequest::post("+snaps")
            .with_form("ws.op", "new")
            .with_form("processors", "/+processors/amd64")
            .with_form("processors", "/+processors/arm64")
            .with_query("name", "toto");

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.ws_op(), Some("new"));
        assert_eq!(request.param("name"), Some("toto"));
        let processors: Vec<_> = request
            .form
            .iter()
            .filter(|(k, _)| k == "processors")
            .collect();
        assert_eq!(processors.len(), 2);
    }

    #[test]
    fn response_json_decode() {
        let response = ApiResponse {
            status: 200,
            body: br#"{"entries": []}"#.to_vec(),
        };
        assert!(response.is_success());
        let value: serde_json::Value = response.json().unwrap();
        assert!(value["entries"].as_array().unwrap().is_empty());
    }

    #[test]
    fn url_joining() {
        let credentials = Credentials::new("u", "t", "s");
        let session =
            HttpSession::with_base_url(&credentials, "https://api.staging.launchpad.net/devel")
                .unwrap();

        assert_eq!(
            session.url_for("+snaps"),
            "https://api.staging.launchpad.net/devel/+snaps"
        );
        assert_eq!(
            session.url_for("/builders"),
            "https://api.staging.launchpad.net/devel/builders"
        );
        assert_eq!(
            session.url_for("https://api.launchpad.net/devel/~u/+snap/abc"),
            "https://api.launchpad.net/devel/~u/+snap/abc"
        );
    }
}
