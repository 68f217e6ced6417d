//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.into(),
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "type": match self.status {
                    StatusCode::BAD_REQUEST => "invalid_request_error",
                    StatusCode::NOT_FOUND => "not_found_error",
                    StatusCode::GATEWAY_TIMEOUT => "timeout_error",
                    _ => "server_error",
                },
                "code": self.status.as_str()
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<lipika_core::Error> for ApiError {
    fn from(err: lipika_core::Error) -> Self {
        use lipika_core::Error;

        match &err {
            Error::ModelNotFound(_) => ApiError::not_found(err.to_string()),
            Error::InvalidInput(_) | Error::ConfigError(_) => ApiError::bad_request(err.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}

impl From<lipika_core::catalog::ParseLanguageCodeError> for ApiError {
    fn from(err: lipika_core::catalog::ParseLanguageCodeError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let missing: ApiError = lipika_core::Error::ModelNotFound("te".into()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let broken: ApiError = lipika_core::Error::ModelLoadError("bad".into()).into();
        assert_eq!(broken.status, StatusCode::INTERNAL_SERVER_ERROR);

        let invalid: ApiError = lipika_core::Error::InvalidInput("x".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    }
}
