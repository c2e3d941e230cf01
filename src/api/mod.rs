pub mod client;
pub mod types;

pub use client::{ApiClient, ApiError, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, list_position};
pub use types::{ApiResponse, BookDto, ErrorResponse, LoginRequest, LoginResponse, UserInfoDto};
