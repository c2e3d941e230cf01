use serde::{Deserialize, Serialize};

/// The backend's common response envelope.
///
/// ```json
/// { "success": true, "data": { ... }, "message": "Success" }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// Spring Boot's default error body, returned with non-2xx statuses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub id_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: i64,
    pub access_token: String,
    pub email: String,
    pub name: String,
    pub picture: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "USER".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserInfoDto {
    pub name: String,
    pub email: String,
    #[serde(rename = "picture")]
    pub profile_image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub isbn13: String,
    pub title: String,
    pub author: String,
    /// Cover image URL
    pub cover: String,
    pub description: String,
    #[serde(default)]
    pub category_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_serialization() {
        let req = LoginRequest {
            id_token: "xyz".to_string(),
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"idToken":"xyz"}"#);
    }

    #[test]
    fn test_login_response_defaults_role_and_ignores_extras() {
        let json = r#"{
            "userId": 3,
            "accessToken": "eyJ...",
            "email": "user@gmail.com",
            "name": "Jiho",
            "picture": "https://img",
            "refreshToken": "ignored"
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.user_id, 3);
        assert_eq!(resp.access_token, "eyJ...");
        assert_eq!(resp.role, "USER");
    }

    #[test]
    fn test_envelope_without_data() {
        let resp: ApiResponse<BookDto> =
            serde_json::from_str(r#"{"success":false,"message":"Book not found"}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.data.is_none());
        assert_eq!(resp.message.as_deref(), Some("Book not found"));
    }

    #[test]
    fn test_envelope_unit_data() {
        let resp: ApiResponse<()> =
            serde_json::from_str(r#"{"success":true,"data":null}"#).unwrap();
        assert!(resp.success);
    }

    #[test]
    fn test_user_info_picture_rename() {
        let info: UserInfoDto =
            serde_json::from_str(r#"{"name":"A","email":"a@b.c","picture":null}"#).unwrap();
        assert_eq!(info.profile_image_url, None);
    }

    #[test]
    fn test_book_dto_camel_case() {
        let book: BookDto = serde_json::from_str(
            r#"{
                "isbn13": "9788936433598",
                "title": "1984",
                "author": "George Orwell",
                "cover": "c",
                "description": "d",
                "categoryName": "Fiction"
            }"#,
        )
        .unwrap();
        assert_eq!(book.category_name.as_deref(), Some("Fiction"));
    }
}
