use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn is_fetch_failed(&self) -> bool {
        self.code == 3
    }

    pub fn is_invalid_transition(&self) -> bool {
        self.code == 100
    }

    pub fn is_decode_error(&self) -> bool {
        self.code == 102
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        tracing::warn!("request failed: {}", err);
        fetch_failed_error()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        tracing::warn!("malformed response: {}", err);
        fetch_failed_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            3 => (StatusCode::BAD_GATEWAY, self.message.as_str()),
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            100 => (StatusCode::CONFLICT, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_transition_error() -> Error {
    Error {
        code: 100,
        message: "invalid transition".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn decode_error(reason: &str) -> Error {
    Error {
        code: 102,
        message: format!("malformed polyline: {}", reason),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn config_error<T: Debug>(value: T) -> Error {
    Error {
        code: 2,
        message: format!("invalid configuration value {:?}", value),
    }
}

pub fn fetch_failed_error() -> Error {
    Error {
        code: 3,
        message: "fetch failed".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

#[test]
fn error_status_mapping_test() {
    let response = fetch_failed_error().into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = invalid_transition_error().into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = decode_error("truncated").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = unexpected_error().into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn error_kind_test() {
    assert!(fetch_failed_error().is_fetch_failed());
    assert!(invalid_transition_error().is_invalid_transition());
    assert!(decode_error("overlong run").is_decode_error());
    assert!(!invalid_input_error().is_fetch_failed());
}
