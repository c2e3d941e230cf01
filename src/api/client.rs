use std::fmt;

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{ApiResponse, BookDto, ErrorResponse, LoginRequest, LoginResponse, UserInfoDto};
use crate::net::{Pipeline, Request, Response, TransportError};

/// Errors surfaced to callers of the typed client.
#[derive(Debug)]
pub enum ApiError {
    /// The call never produced a response.
    Transport(TransportError),
    /// Non-2xx status. `message` comes from the error body when it parses.
    Status { status: u16, message: String },
    /// 2xx response whose body did not match the expected shape.
    Decode(String),
    /// Envelope said `success: false`, or carried no data.
    Rejected(String),
    /// The request body could not be serialized.
    Encode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "{e}"),
            ApiError::Status { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ApiError::Decode(msg) => write!(f, "decode error: {msg}"),
            ApiError::Rejected(msg) => write!(f, "request rejected: {msg}"),
            ApiError::Encode(msg) => write!(f, "encode error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        ApiError::Transport(e)
    }
}

impl<T> ApiResponse<T> {
    /// Unwraps the payload of a successful envelope.
    pub fn into_data(self) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// 1-based position of the `index`-th item on a 1-based `page` of `size` items.
/// Page 0 is treated as page 1; the result saturates instead of overflowing.
pub fn list_position(page: u32, size: u32, index: usize) -> usize {
    (page.saturating_sub(1) as usize)
        .saturating_mul(size as usize)
        .saturating_add(index)
        .saturating_add(1)
}

/// Typed access to the ReadPick backend. Every call goes through `pipeline`.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    pipeline: Pipeline,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, pipeline: Pipeline) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, pipeline }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins a relative endpoint path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.pipeline.execute(request).await?;
        decode(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.send(Request::get(self.url(path))).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.send(Request::post(self.url(path))).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = Request::post(self.url(path))
            .with_json(body)
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        self.send(request).await
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    pub async fn login(
        &self,
        provider: &str,
        request: &LoginRequest,
    ) -> Result<ApiResponse<LoginResponse>, ApiError> {
        self.post_json(&format!("v1/api/auth/{provider}"), request).await
    }

    pub async fn fetch_user_profile(&self) -> Result<ApiResponse<UserInfoDto>, ApiError> {
        self.get("v1/api/user/profile").await
    }

    pub async fn logout(&self) -> Result<ApiResponse<()>, ApiError> {
        self.post("v1/api/auth/logout").await
    }

    // ------------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------------

    pub async fn bestsellers(
        &self,
        page: u32,
        size: u32,
        category: Option<i64>,
    ) -> Result<ApiResponse<Vec<BookDto>>, ApiError> {
        let mut path = format!("v1/api/books/bestsellers?page={page}&size={size}");
        if let Some(category) = category {
            path.push_str(&format!("&categoryId={category}"));
        }
        self.get(&path).await
    }

    pub async fn book_detail(&self, isbn13: &str) -> Result<ApiResponse<BookDto>, ApiError> {
        self.get(&format!("v1/api/books/{isbn13}")).await
    }

    pub async fn save_book(&self, isbn13: &str) -> Result<ApiResponse<()>, ApiError> {
        self.post(&format!("v1/api/books/{isbn13}")).await
    }
}

/// Maps a raw response onto the envelope, or onto an [`ApiError`].
fn decode<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>, ApiError> {
    if !response.is_success() {
        let message = match response.json::<ErrorResponse>() {
            Ok(err) => err.message,
            Err(_) => response.text(),
        };
        warn!("API error: {} - {}", response.status, message);
        return Err(ApiError::Status {
            status: response.status,
            message,
        });
    }

    debug!("API response status: {}", response.status);
    response.json().map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTransport;
    use std::sync::Arc;

    fn client(transport: Arc<RecordingTransport>) -> ApiClient {
        ApiClient::new("http://api.test/", Pipeline::new(transport))
    }

    #[test]
    fn test_list_position_counts_across_pages() {
        assert_eq!(list_position(1, 20, 0), 1);
        assert_eq!(list_position(2, 10, 0), 11);
        assert_eq!(list_position(3, 20, 4), 45);
        assert_eq!(list_position(0, 20, 2), 3);
    }

    #[test]
    fn test_list_position_far_page_does_not_overflow() {
        // 299_999_999 * 20 no longer fits in a u32.
        let position = list_position(300_000_000, 20, 0);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(position, 5_999_999_981);
        assert!(position > u32::MAX as usize || position == usize::MAX);
        assert!(list_position(u32::MAX, u32::MAX, usize::MAX) > 0);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let c = client(Arc::new(RecordingTransport::ok(200, "")));
        assert_eq!(c.base_url(), "http://api.test");
        assert_eq!(c.url("/v1/api/books/1"), "http://api.test/v1/api/books/1");
        assert_eq!(c.url("v1/api/books/1"), "http://api.test/v1/api/books/1");
    }

    #[tokio::test]
    async fn test_bestsellers_query_string() {
        let transport = Arc::new(RecordingTransport::ok(200, r#"{"success":true,"data":[]}"#));
        let c = client(transport.clone());

        c.bestsellers(DEFAULT_PAGE, DEFAULT_PAGE_SIZE, None).await.unwrap();
        c.bestsellers(2, 10, Some(55)).await.unwrap();

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://api.test/v1/api/books/bestsellers?page=1&size=20",
                "http://api.test/v1/api/books/bestsellers?page=2&size=10&categoryId=55",
            ]
        );
    }

    #[tokio::test]
    async fn test_login_posts_json_body() {
        let body = r#"{
            "success": true,
            "data": {"userId": 1, "accessToken": "jwt", "email": "e", "name": "n", "picture": "p"}
        }"#;
        let transport = Arc::new(RecordingTransport::ok(200, body));
        let c = client(transport.clone());

        let resp = c
            .login("google", &LoginRequest { id_token: "xyz".into() })
            .await
            .unwrap();
        assert_eq!(resp.into_data().unwrap().access_token, "jwt");

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, reqwest::Method::POST);
        assert_eq!(sent.url, "http://api.test/v1/api/auth/google");
        assert_eq!(sent.body.as_deref(), Some(br#"{"idToken":"xyz"}"#.as_slice()));
    }

    #[tokio::test]
    async fn test_error_body_message_is_used() {
        let body = r#"{
            "timestamp": "2025-10-30T12:00:00",
            "status": 404,
            "error": "Not Found",
            "message": "Book not found",
            "path": "/v1/api/books/1"
        }"#;
        let c = client(Arc::new(RecordingTransport::ok(404, body)));
        match c.book_detail("1").await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Book not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unstructured_error_body_falls_back_to_text() {
        let c = client(Arc::new(RecordingTransport::ok(502, "Bad Gateway")));
        match c.fetch_user_profile().await {
            Err(ApiError::Status { status: 502, message }) => assert_eq!(message, "Bad Gateway"),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let c = client(Arc::new(RecordingTransport::ok(200, "<html>")));
        assert!(matches!(c.book_detail("1").await, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_into_data_rejects_unsuccessful_envelope() {
        let resp: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            message: None,
        };
        match resp.into_data() {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "Unknown error"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
