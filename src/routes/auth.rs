/**
 * Authentication Routes
 * Bearer-token login and the extractors that gate admin and content routes
 */
use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::verify;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::routes::ClientIp;
use crate::state::AppState;

/// Access tokens are not refreshable; admins log in again after this
pub const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 12;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// User info returned to the admin UI
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<&Claims> for UserInfo {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.id.clone(),
            username: claims.username.clone(),
            is_admin: claims.is_admin,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Tokens
// ============================================================================

pub fn create_access_token(
    secret: &str,
    user: &User,
    issued_at: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        id: user.id.to_string(),
        username: user.username.clone(),
        is_admin: user.is_admin,
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decodes a token, telling expired tokens apart from forged or garbled ones
pub fn verify_access_token(secret: &str, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::expired_token(),
        _ => AppError::invalid_token(),
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn jwt_secret(state: &AppState) -> AppResult<&str> {
    state
        .config
        .jwt_secret
        .as_deref()
        .ok_or(AppError::Misconfigured("JWT_SECRET is not set"))
}

/// Constant-time comparison for shared secrets
fn secrets_match(given: &[u8], expected: &[u8]) -> bool {
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

// ============================================================================
// Extractors
// ============================================================================

/// An authenticated administrator. Handlers taking this are admin-only.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let secret = jwt_secret(state)?;
        let token = extract_bearer_token(&parts.headers).ok_or_else(AppError::missing_token)?;
        let claims = verify_access_token(secret, token)?;

        if !claims.is_admin {
            tracing::warn!(username = %claims.username, "non-admin token on admin route");
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser {
            id: claims.id,
            username: claims.username,
            is_admin: claims.is_admin,
        })
    }
}

/// Caller presented the `x-api-secret` shared with trusted services
#[derive(Debug, Clone, Copy)]
pub struct ApiSecret;

pub const API_SECRET_HEADER: &str = "x-api-secret";

impl FromRequestParts<AppState> for ApiSecret {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .content_api_secret
            .as_deref()
            .ok_or(AppError::Misconfigured("CONTENT_API_SECRET is not set"))?;

        let given = parts
            .headers
            .get(API_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized("missing api secret"))?;

        if secrets_match(given.as_bytes(), expected.as_bytes()) {
            Ok(ApiSecret)
        } else {
            Err(AppError::Unauthorized("invalid api secret"))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    state.login_limiter.check(&ip).await.into_result()?;

    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("username and password are required"));
    }

    let secret = jwt_secret(&state)?.to_string();

    let user = state.store.find_user_by_username(&username).await?;
    let Some(user) = user else {
        tracing::warn!(username = %username, ip = %ip, "login for unknown user");
        return Err(AppError::Unauthorized("invalid credentials"));
    };

    // bcrypt is CPU-bound; keep it off the async workers
    let password = payload.password;
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify(&password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("password check panicked: {}", e)))?
        .unwrap_or_else(|e| {
            tracing::error!(username = %username, error = %e, "stored password hash is unusable");
            false
        });

    if !matches {
        tracing::warn!(username = %username, ip = %ip, "failed login");
        return Err(AppError::Unauthorized("invalid credentials"));
    }

    let issued_at = Utc::now();
    let token = create_access_token(&secret, &user, issued_at)
        .map_err(|e| AppError::internal(format!("failed to sign token: {}", e)))?;
    tracing::info!(username = %user.username, "admin logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserInfo {
            id: user.id.to_string(),
            username: user.username,
            is_admin: user.is_admin,
        },
        expires_at: issued_at + Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS),
    }))
}

/// GET /api/auth/verify
/// Always 200 for a well-configured server; the body says whether the token holds.
pub async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let secret = jwt_secret(&state)?;

    let response = match extract_bearer_token(&headers) {
        None => VerifyResponse {
            is_valid: false,
            user: None,
            error: Some("missing token".to_string()),
        },
        Some(token) => match verify_access_token(secret, token) {
            Ok(claims) => VerifyResponse {
                is_valid: true,
                user: Some(UserInfo::from(&claims)),
                error: None,
            },
            Err(e) => VerifyResponse {
                is_valid: false,
                user: None,
                error: Some(e.to_string()),
            },
        },
    };

    Ok((StatusCode::OK, Json(response)))
}
