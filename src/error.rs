use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XboostError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("missing x-api-key header")]
    Unauthorized,

    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

pub type Result<T> = std::result::Result<T, XboostError>;

impl XboostError {
    pub fn status(&self) -> StatusCode {
        match self {
            XboostError::InvalidRequest(_) | XboostError::InvalidRule(_) | XboostError::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            XboostError::RuleNotFound(_) => StatusCode::NOT_FOUND,
            XboostError::Unauthorized => StatusCode::UNAUTHORIZED,
            XboostError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            XboostError::Upstream(_) => StatusCode::BAD_GATEWAY,
            XboostError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            XboostError::Config(_) | XboostError::Io(_) | XboostError::Toml(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for XboostError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let retry_after = match &self {
            XboostError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
