use axum::{
    extract::{Path, State},
    http::{header::USER_AGENT, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::ContactForm;
use crate::error::{AppError, AppResult};
use crate::routes::auth::AdminUser;
use crate::routes::ClientIp;
use crate::services::contact::{self, ContactRequest};
use crate::state::AppState;

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("invalid message id '{}'", raw)))
}

/// POST /api/contact
pub async fn submit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(payload): Json<ContactRequest>,
) -> AppResult<impl IntoResponse> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let receipt = contact::submit(&state, &ip, user_agent, payload).await?;

    let mut response = (StatusCode::CREATED, Json(&receipt)).into_response();
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-remaining", HeaderValue::from(receipt.remaining));
    if let Ok(value) = HeaderValue::from_str(&receipt.reset_at.timestamp().to_string()) {
        headers.insert("x-ratelimit-reset", value);
    }
    Ok(response)
}

/// GET /api/admin/contact
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<ContactForm>>> {
    Ok(Json(contact::list(state.store.as_ref()).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub is_read: bool,
}

/// PATCH /api/admin/contact/{id}
pub async fn mark_read(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<MarkReadRequest>,
) -> AppResult<Json<ContactForm>> {
    let id = parse_id(&id)?;
    Ok(Json(
        contact::mark_read(state.store.as_ref(), id, payload.is_read).await?,
    ))
}

/// DELETE /api/admin/contact/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    contact::delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{admin_token, send_json, send_with_headers};
    use crate::state::testing::TestContext;
    use crate::store::Store;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn message() -> Value {
        json!({ "name": "Ayşe", "email": "ayse@example.com", "message": "Merhaba!" })
    }

    #[tokio::test]
    async fn test_sixth_submission_from_same_ip_is_throttled() {
        let ctx = TestContext::new();
        let headers = [("x-forwarded-for", "203.0.113.7, 10.0.0.1")];
        for expected_remaining in (0..5).rev() {
            let (status, body) =
                send_with_headers(&ctx, Method::POST, "/api/contact", &headers, message()).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["remaining"], expected_remaining);
        }

        let (status, body) =
            send_with_headers(&ctx, Method::POST, "/api/contact", &headers, message()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["remaining"], 0);
        assert!(body["resetAt"].is_string());

        let stored = ctx.store.list_contacts().await.unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(stored[0].ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_invalid_submission_is_rejected() {
        let ctx = TestContext::new();
        let (status, _) = send_json(
            &ctx,
            Method::POST,
            "/api/contact",
            None,
            json!({ "name": "A", "email": "nope", "message": "hi" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(ctx.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_inbox_flow() {
        let ctx = TestContext::new();
        let token = admin_token();
        let (_, receipt) = send_json(&ctx, Method::POST, "/api/contact", None, message()).await;
        let id = receipt["id"].as_str().unwrap().to_string();

        let (status, inbox) =
            send_json(&ctx, Method::GET, "/api/admin/contact", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(inbox[0]["isRead"], false);

        let uri = format!("/api/admin/contact/{}", id);
        let (status, read) =
            send_json(&ctx, Method::PATCH, &uri, Some(&token), json!({ "isRead": true })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["isRead"], true);

        let (status, _) = send_json(&ctx, Method::DELETE, &uri, Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send_json(
            &ctx,
            Method::DELETE,
            "/api/admin/contact/not-a-uuid",
            Some(&token),
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
