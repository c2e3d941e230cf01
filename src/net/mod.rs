//! # HTTP Request Pipeline
//!
//! Every outbound call flows through an ordered chain of interceptors before
//! reaching the transport:
//!
//! ```text
//! ApiClient ─► BearerAuthenticator ─► HttpLogger ─► ReqwestTransport ─► network
//!               (auth.rs)              (logging.rs)   (transport.rs)
//! ```
//!
//! Each stage receives the request and a [`Next`] handle. `Next::proceed`
//! consumes the handle, so a stage can forward at most once.

pub mod auth;
pub mod logging;
pub mod transport;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::CredentialSource;

pub use auth::{AUTHORIZATION, BearerAuthenticator};
pub use logging::{HttpLogger, LogLevel};
pub use transport::ReqwestTransport;

// ============================================================================
// Request / Response
// ============================================================================

/// An outbound call, described before it reaches the wire.
///
/// Headers are kept as an ordered list of raw string pairs. Conversion into
/// real HTTP header values happens in the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Returns a copy of this request with one more header appended.
    /// Existing headers with the same name are kept.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.headers.push((name.into(), value.into()));
        next
    }

    /// Serializes `payload` as the body and sets `Content-Type: application/json`.
    pub fn with_json<T: Serialize>(self, payload: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(payload)?;
        let mut next = self.with_header("Content-Type", "application/json");
        next.body = Some(body);
        Ok(next)
    }

    /// First value of the named header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).next()
    }

    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What came back from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures raised below the interceptors. Stages pass these through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection-level failure (DNS, refused, reset).
    Network(String),
    /// Connect or request timeout elapsed.
    Timeout(String),
    /// The request could not be put on the wire (bad URL, illegal header value).
    InvalidRequest(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Timeout(msg) => write!(f, "timeout: {msg}"),
            TransportError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

// ============================================================================
// Pipeline
// ============================================================================

/// The last stage: actually performs the call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

/// A pipeline stage that may transform a request before forwarding it.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, request: Request, next: Next<'_>) -> Result<Response, TransportError>;
}

/// The remainder of the chain after the current stage.
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    /// Forwards `request` to the next stage and yields its result.
    pub async fn proceed(self, request: Request) -> Result<Response, TransportError> {
        match self.interceptors.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    interceptors: rest,
                    transport: self.transport,
                };
                stage.intercept(request, next).await
            }
            None => self.transport.execute(request).await,
        }
    }
}

/// Interceptors in insertion order, then the transport.
#[derive(Clone)]
pub struct Pipeline {
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            interceptors: Vec::new(),
            transport,
        }
    }

    /// The client's standard chain: authenticator first, then the logger,
    /// so logged requests show the attached credential (redacted).
    pub fn authenticated(
        transport: Arc<dyn Transport>,
        credentials: impl CredentialSource + 'static,
        logger: HttpLogger,
    ) -> Self {
        Self::new(transport)
            .with(BearerAuthenticator::new(credentials))
            .with(logger)
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let head = Next {
            interceptors: &self.interceptors,
            transport: self.transport.as_ref(),
        };
        head.proceed(request).await
    }
}
