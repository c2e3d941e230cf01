//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::net::{Request, Response, Transport, TransportError};
use crate::store::CredentialSource;

/// A transport that records every request and replays one canned outcome.
pub struct RecordingTransport {
    outcome: Result<Response, TransportError>,
    sent: Mutex<Vec<Request>>,
}

impl RecordingTransport {
    pub fn ok(status: u16, body: &str) -> Self {
        Self {
            outcome: Ok(Response::new(status, body)),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            outcome: Err(error),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.sent.lock().unwrap().push(request);
        self.outcome.clone()
    }
}

/// A credential source with a fixed answer that counts how often it is read.
#[derive(Clone)]
pub struct FixedCredential {
    token: Option<String>,
    reads: Arc<AtomicUsize>,
}

impl FixedCredential {
    pub fn some(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn none() -> Self {
        Self {
            token: None,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl CredentialSource for FixedCredential {
    fn get(&self) -> Option<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.token.clone()
    }
}
