//! HTTP request description for the host-does-IO pattern.
//!
//! # Design
//! `ClarifaiClient` never touches the network. Its `build_*` methods produce
//! an `HttpRequest` value naming the method, the fully-qualified endpoint URL,
//! and the optional JSON body. A `Transport` (see `transport.rs`) executes it
//! and hands back the raw response bytes for the matching `parse_*` method.
//!
//! Authentication headers are not part of the request: they belong to the
//! transport, which owns the access token.

use std::fmt;

/// HTTP method for a request. The v1 API only uses these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote endpoints of the v1 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Info,
    Tag,
    Feedback,
    Token,
}

impl Endpoint {
    /// Path segment as it appears in the URL.
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Info => "info",
            Endpoint::Tag => "tag",
            Endpoint::Feedback => "feedback",
            Endpoint::Token => "token",
        }
    }

    /// `{base_url}/{endpoint}/`. The service expects the trailing slash.
    pub fn url(self, base_url: &str) -> String {
        format!("{}/{}/", base_url.trim_end_matches('/'), self.as_str())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ClarifaiClient::build_*`. `body` is already-encoded JSON; when
/// present the request carries a `content-type: application/json` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub(crate) fn get(endpoint: Endpoint, base_url: &str) -> Self {
        Self {
            method: HttpMethod::Get,
            endpoint,
            url: endpoint.url(base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn post_json(endpoint: Endpoint, base_url: &str, body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            endpoint,
            url: endpoint.url(base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }
}
