/**
 * Content Routes
 * Per-locale page copy and the shared project-page strings
 */
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::db::models::{Content, Locale, ProjectTranslation};
use crate::error::AppResult;
use crate::routes::auth::{AdminUser, ApiSecret};
use crate::services::content::{self, ContentView};
use crate::state::AppState;

/// GET /api/content/{locale}
/// Public read; falls back to the built-in copy so pages always render.
pub async fn get_public_content(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> AppResult<Json<ContentView>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(content::resolve_content(state.store.as_ref(), locale).await))
}

/// PUT /api/content/{locale}
/// For trusted services holding the content API secret.
pub async fn put_content_with_secret(
    State(state): State<AppState>,
    _secret: ApiSecret,
    Path(locale): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Content>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(content::put_content(&state, locale, payload).await?))
}

/// GET /api/admin/content/{locale}
pub async fn get_admin_content(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(locale): Path<String>,
) -> AppResult<Json<Content>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(content::get_content(state.store.as_ref(), locale).await?))
}

/// PUT /api/admin/content/{locale}
pub async fn put_admin_content(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(locale): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Content>> {
    let locale: Locale = locale.parse()?;
    let updated = content::put_content(&state, locale, payload).await?;
    tracing::info!(admin = %admin.username, locale = %locale, "content saved from admin");
    Ok(Json(updated))
}

/// GET /api/admin/project-translations/{locale}
pub async fn get_project_translation(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(locale): Path<String>,
) -> AppResult<Json<ProjectTranslation>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(
        content::get_project_translation(state.store.as_ref(), locale).await?,
    ))
}

/// PUT /api/admin/project-translations/{locale}
pub async fn put_project_translation(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(locale): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<ProjectTranslation>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(
        content::put_project_translation(&state, locale, payload).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{admin_token, send_json, send_with_headers};
    use crate::services::content::seed_defaults;
    use crate::state::testing::TestContext;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_public_content_falls_back_to_defaults() {
        let ctx = TestContext::new();
        let (status, body) =
            send_json(&ctx, Method::GET, "/api/content/en", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "default");
        assert_eq!(body["hero"]["title"], "Hello");
    }

    #[tokio::test]
    async fn test_unsupported_locale_is_bad_request() {
        let ctx = TestContext::new();
        let (status, _) = send_json(&ctx, Method::GET, "/api/content/de", None, Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_secret_gated_put_updates_content() {
        let ctx = TestContext::new();
        seed_defaults(ctx.store.as_ref()).await.unwrap();

        let (status, body) = send_with_headers(
            &ctx,
            Method::PUT,
            "/api/content/tr",
            &[("x-api-secret", "content-secret")],
            json!({ "hero": { "title": "Hoş geldiniz" } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hero"]["title"], "Hoş geldiniz");
        assert_eq!(body["about"]["title"], "Hakkımda");
        assert!(!body["navigation"].as_array().unwrap().is_empty());

        let (_, body) = send_json(&ctx, Method::GET, "/api/content/tr", None, Value::Null).await;
        assert_eq!(body["source"], "stored");
        assert_eq!(body["hero"]["title"], "Hoş geldiniz");
    }

    #[tokio::test]
    async fn test_secret_gated_put_fails_closed_without_secret() {
        let ctx = TestContext::with_config(|c| c.content_api_secret = None);
        let (status, _) = send_with_headers(
            &ctx,
            Method::PUT,
            "/api/content/tr",
            &[("x-api-secret", "anything")],
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_admin_content_roundtrip() {
        let ctx = TestContext::new();
        let token = admin_token();

        let (status, _) =
            send_json(&ctx, Method::GET, "/api/admin/content/en", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        seed_defaults(ctx.store.as_ref()).await.unwrap();
        let (status, body) = send_json(
            &ctx,
            Method::PUT,
            "/api/admin/content/en",
            Some(&token),
            json!({ "navigation": [{ "label": "Work", "url": "/en/projects" }] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["navigation"][0]["label"], "Work");
        assert!(ctx.revalidator.tags().contains(&"navigation".to_string()));

        let (status, _) = send_json(
            &ctx,
            Method::PUT,
            "/api/admin/content/en",
            Some(&token),
            json!({ "hero": { "headline": "unknown field" } }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_project_translations_route() {
        let ctx = TestContext::new();
        let token = admin_token();
        let (status, body) = send_json(
            &ctx,
            Method::PUT,
            "/api/admin/project-translations/en",
            Some(&token),
            json!({ "idMapping": { "tabak": "plate" } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["idMapping"]["tabak"], "plate");
        assert_eq!(body["strings"]["title"], "Projects");
    }
}
