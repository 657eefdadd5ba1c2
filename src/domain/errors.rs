use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[derive(Debug, PartialEq, Eq)]
pub enum DatabaseError {
    /// A unique index rejected the write.
    Duplicate,
    ServerError,
}

#[derive(Debug)]
pub enum ApiError {
    UserExists,
    UserNotFound,
    ServerError,
}

impl From<DatabaseError> for ApiError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::Duplicate => Self::UserExists,
            DatabaseError::ServerError => Self::ServerError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Self::UserExists => (
                StatusCode::BAD_REQUEST,
                "User with this email already exists",
            ),
            Self::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            Self::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong"),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
