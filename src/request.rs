//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{REFERER, USER_AGENT};
use http::{HeaderMap, Method, Uri, Version};

use crate::context::Context;

/// An incoming HTTP request with its body fully read.
///
/// Cloning is cheap apart from the header map: the body is reference-counted
/// [`Bytes`] and the context shares nothing mutable.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    remote_addr: String,
    context: Context,
}

impl Request {
    /// Builds a request from an [`http::Request`] and the peer address.
    ///
    /// The request's extensions seed its [`Context`]. `remote_addr` is kept
    /// as an opaque string, normally `host:port` as reported by the listener.
    pub fn from_http(req: http::Request<Bytes>, remote_addr: impl Into<String>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            remote_addr: remote_addr.into(),
            context: Context::from(parts.extensions),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn version(&self) -> Version { self.version }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> &str { &self.remote_addr }
    pub fn context(&self) -> &Context { &self.context }

    /// Header value as a string. Missing or non-UTF-8 values yield `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `User-Agent` header, or `""` when absent.
    pub fn user_agent(&self) -> &str {
        self.headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or_default()
    }

    /// The `Referer` header, or `""` when absent.
    pub fn referer(&self) -> &str {
        self.headers.get(REFERER).and_then(|v| v.to_str().ok()).unwrap_or_default()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Replaces the request's context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }
}
