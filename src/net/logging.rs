//! Request/response logging stage.
//!
//! Output, at `body` level:
//!
//! ```text
//! --> GET https://api.readpick.app/v1/api/books/9788936433598
//! Authorization: ██
//! --> END GET
//! <-- 200 (125ms)
//! Content-Type: application/json
//! {"success":true,"data":{"isbn13":"9788936433598","title":"1984"}}
//! <-- END HTTP
//! ```

use std::time::Instant;

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{Interceptor, Next, Request, Response, TransportError};

const REDACTED: &str = "██";

/// How much of each exchange to write to the log.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging.
    #[default]
    None,
    /// Request and response lines.
    Basic,
    /// Lines plus headers.
    Headers,
    /// Lines, headers and bodies.
    Body,
}

pub struct HttpLogger {
    level: LogLevel,
    redact: Vec<String>,
}

impl HttpLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            redact: vec![super::AUTHORIZATION.to_string()],
        }
    }

    /// Replaces the set of headers whose values are masked.
    pub fn redacting<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redact = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn is_redacted(&self, name: &str) -> bool {
        self.redact.iter().any(|r| r.eq_ignore_ascii_case(name))
    }

    /// Lines describing the outbound request, in emission order.
    pub fn request_lines(&self, request: &Request) -> Vec<String> {
        let mut lines = Vec::new();
        if self.level == LogLevel::None {
            return lines;
        }
        lines.push(format!("--> {} {}", request.method, request.url));
        if self.level >= LogLevel::Headers {
            lines.extend(self.header_lines(&request.headers));
        }
        if self.level == LogLevel::Body
            && let Some(body) = &request.body
        {
            lines.push(String::from_utf8_lossy(body).into_owned());
        }
        if self.level >= LogLevel::Headers {
            lines.push(format!("--> END {}", request.method));
        }
        lines
    }

    /// Lines describing the response, in emission order.
    pub fn response_lines(&self, response: &Response, elapsed_ms: u128) -> Vec<String> {
        let mut lines = Vec::new();
        if self.level == LogLevel::None {
            return lines;
        }
        lines.push(format!("<-- {} ({}ms)", response.status, elapsed_ms));
        if self.level >= LogLevel::Headers {
            lines.extend(self.header_lines(&response.headers));
        }
        if self.level == LogLevel::Body && !response.body.is_empty() {
            lines.push(response.text());
        }
        if self.level >= LogLevel::Headers {
            lines.push("<-- END HTTP".to_string());
        }
        lines
    }

    fn header_lines(&self, headers: &[(String, String)]) -> Vec<String> {
        headers
            .iter()
            .map(|(name, value)| {
                if self.is_redacted(name) {
                    format!("{name}: {REDACTED}")
                } else {
                    format!("{name}: {value}")
                }
            })
            .collect()
    }
}

#[async_trait]
impl Interceptor for HttpLogger {
    async fn intercept(
        &self,
        request: Request,
        next: Next<'_>,
    ) -> Result<Response, TransportError> {
        if self.level == LogLevel::None {
            return next.proceed(request).await;
        }

        for line in self.request_lines(&request) {
            info!("{}", line);
        }

        let started = Instant::now();
        let result = next.proceed(request).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &result {
            Ok(response) => {
                for line in self.response_lines(response, elapsed_ms) {
                    info!("{}", line);
                }
            }
            Err(e) => warn!("<-- HTTP FAILED: {} ({}ms)", e, elapsed_ms),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Pipeline;
    use crate::test_support::RecordingTransport;
    use std::sync::Arc;

    fn sample_request() -> Request {
        Request::post("http://api/v1/api/auth/google")
            .with_header("Authorization", "Bearer secret")
            .with_json(&serde_json::json!({ "idToken": "xyz" }))
            .unwrap()
    }

    #[test]
    fn test_none_level_emits_nothing() {
        let logger = HttpLogger::new(LogLevel::None);
        assert!(logger.request_lines(&sample_request()).is_empty());
        assert!(logger.response_lines(&Response::new(200, "ok"), 3).is_empty());
    }

    #[test]
    fn test_basic_level_emits_only_lines() {
        let logger = HttpLogger::new(LogLevel::Basic);
        assert_eq!(
            logger.request_lines(&sample_request()),
            vec!["--> POST http://api/v1/api/auth/google"]
        );
        assert_eq!(
            logger.response_lines(&Response::new(200, "ok"), 125),
            vec!["<-- 200 (125ms)"]
        );
    }

    #[test]
    fn test_headers_level_redacts_authorization() {
        let logger = HttpLogger::new(LogLevel::Headers);
        let lines = logger.request_lines(&sample_request());
        assert_eq!(
            lines,
            vec![
                "--> POST http://api/v1/api/auth/google",
                "Authorization: ██",
                "Content-Type: application/json",
                "--> END POST",
            ]
        );
        assert!(!lines.iter().any(|l| l.contains("secret")));
    }

    #[test]
    fn test_body_level_includes_bodies() {
        let logger = HttpLogger::new(LogLevel::Body).redacting(Vec::<String>::new());
        let lines = logger.request_lines(&sample_request());
        assert!(lines.contains(&"Authorization: Bearer secret".to_string()));
        assert!(lines.contains(&r#"{"idToken":"xyz"}"#.to_string()));

        let response = Response::new(200, r#"{"success":true}"#);
        let lines = logger.response_lines(&response, 7);
        assert_eq!(lines, vec!["<-- 200 (7ms)", r#"{"success":true}"#, "<-- END HTTP"]);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Body > LogLevel::Headers);
        assert!(LogLevel::Headers > LogLevel::Basic);
        assert!(LogLevel::Basic > LogLevel::None);
    }

    #[test]
    fn test_level_deserializes_lowercase() {
        let level: LogLevel = serde_json::from_str(r#""headers""#).unwrap();
        assert_eq!(level, LogLevel::Headers);
    }

    #[tokio::test]
    async fn test_logger_does_not_alter_exchange() {
        let transport = Arc::new(RecordingTransport::ok(201, "created"));
        let pipeline = Pipeline::new(transport.clone()).with(HttpLogger::new(LogLevel::Body));

        let request = sample_request();
        let response = pipeline.execute(request.clone()).await.unwrap();
        assert_eq!(response, Response::new(201, "created"));
        assert_eq!(transport.requests(), vec![request]);
    }
}
