//! Application error taxonomy and its HTTP rendering.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::models::UnsupportedLocale;
use crate::store::StoreError;

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            suggested_slug: None,
            remaining: None,
            reset_at: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("admin privileges required")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        suggested_slug: Option<String>,
    },

    #[error("too many requests")]
    TooManyRequests {
        remaining: u32,
        reset_at: DateTime<Utc>,
    },

    #[error("server misconfigured: {0}")]
    Misconfigured(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn missing_token() -> Self {
        Self::Unauthorized("missing token")
    }

    pub fn invalid_token() -> Self {
        Self::Unauthorized("invalid token")
    }

    pub fn expired_token() -> Self {
        Self::Unauthorized("token expired")
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Misconfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => Self::Conflict {
                message: format!("{} already exists", what),
                suggested_slug: None,
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<UnsupportedLocale> for AppError {
    fn from(err: UnsupportedLocale) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed with internal error");
                ErrorResponse::new("Internal server error")
            }
            Self::Misconfigured(what) => {
                tracing::error!(missing = %what, "request rejected: server misconfigured");
                ErrorResponse::new("Server misconfigured")
            }
            Self::Conflict {
                message,
                suggested_slug,
            } => ErrorResponse {
                suggested_slug: suggested_slug.clone(),
                ..ErrorResponse::new(message.clone())
            },
            Self::TooManyRequests {
                remaining,
                reset_at,
            } => ErrorResponse {
                message: Some("Please try again later.".to_string()),
                remaining: Some(*remaining),
                reset_at: Some(*reset_at),
                ..ErrorResponse::new("Too many requests")
            },
            other => ErrorResponse::new(other.to_string()),
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::TooManyRequests {
            remaining,
            reset_at,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            if let Ok(value) = HeaderValue::from_str(&reset_at.timestamp().to_string()) {
                headers.insert("x-ratelimit-reset", value);
            }
        }
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;
