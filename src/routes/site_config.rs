use axum::{extract::State, Json};
use serde_json::Value;

use crate::db::models::SiteConfig;
use crate::error::AppResult;
use crate::routes::auth::AdminUser;
use crate::services::site_config::{self, PublicSiteSettings};
use crate::state::AppState;

/// GET /api/site-config
pub async fn get_site_config(State(state): State<AppState>) -> Json<SiteConfig> {
    Json(site_config::load(state.store.as_ref()).await)
}

/// PUT /api/site-config
pub async fn put_site_config(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<Value>,
) -> AppResult<Json<SiteConfig>> {
    let saved = site_config::save(&state, payload).await?;
    tracing::info!(admin = %admin.username, "site config saved from admin");
    Ok(Json(saved))
}

/// GET /api/site-settings
pub async fn get_site_settings(State(state): State<AppState>) -> Json<PublicSiteSettings> {
    Json(site_config::load(state.store.as_ref()).await.into())
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{admin_token, send_json};
    use crate::services::site_config::default_site_config;
    use crate::state::testing::TestContext;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_site_config_defaults_then_gated_write() {
        let ctx = TestContext::new();
        let (status, body) = send_json(&ctx, Method::GET, "/api/site-config", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["projectsPerPage"], 9);

        let mut payload = serde_json::to_value(default_site_config()).unwrap();
        payload["robotsIndex"] = json!(false);

        let (status, _) = send_json(&ctx, Method::PUT, "/api/site-config", None, payload.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = admin_token();
        let (status, body) =
            send_json(&ctx, Method::PUT, "/api/site-config", Some(&token), payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["robotsIndex"], false);

        let (_, settings) =
            send_json(&ctx, Method::GET, "/api/site-settings", None, Value::Null).await;
        assert_eq!(settings["robotsIndex"], false);
        assert!(settings.get("contactEmail").is_none());
    }
}
