/**
 * Project Routes
 * Public listings plus the admin surface for bilingual project pairs
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::{Locale, Project};
use crate::error::AppResult;
use crate::routes::auth::AdminUser;
use crate::services::projects::{
    self, CreatedProject, DeletedProject, OrderItem, ProjectDetail, ProjectList, ProjectPayload,
    ReconciledPair, ReorderOutcome, SlugCheck,
};
use crate::state::AppState;

// ============================================================================
// Public
// ============================================================================

/// GET /api/projects/{locale}
pub async fn list_published(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> AppResult<Json<ProjectList>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(projects::list_published(state.store.as_ref(), locale).await?))
}

/// GET /api/projects/{locale}/{id}
pub async fn get_published(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
) -> AppResult<Json<ProjectDetail>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(
        projects::get_published_project(state.store.as_ref(), locale, &slug).await?,
    ))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/projects/{locale}
pub async fn list_projects(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(locale): Path<String>,
) -> AppResult<Json<ProjectList>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(projects::list_projects(state.store.as_ref(), locale).await?))
}

/// POST /api/admin/projects/{locale}
pub async fn create_project(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(locale): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let locale: Locale = locale.parse()?;
    let payload = ProjectPayload::from_value(payload)?;
    let created: CreatedProject = projects::create_project(&state, locale, payload).await?;
    tracing::info!(admin = %admin.username, slug = %created.project.id, "project created from admin");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/admin/projects/{locale}/by-original-id/{originalId}
pub async fn get_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((locale, original_id)): Path<(String, String)>,
) -> AppResult<Json<Project>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(
        projects::get_project(state.store.as_ref(), locale, &original_id).await?,
    ))
}

/// PUT /api/admin/projects/{locale}/by-original-id/{originalId}
pub async fn update_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((locale, original_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Project>> {
    let locale: Locale = locale.parse()?;
    let payload = ProjectPayload::from_value(payload)?;
    Ok(Json(
        projects::update_project(&state, locale, &original_id, payload).await?,
    ))
}

/// POST /api/admin/projects/{locale}/by-original-id/{originalId}/reconcile
pub async fn reconcile_project(
    State(state): State<AppState>,
    admin: AdminUser,
    Path((locale, original_id)): Path<(String, String)>,
) -> AppResult<Json<ReconciledPair>> {
    let locale: Locale = locale.parse()?;
    let pair = projects::reconcile_pair(&state, locale, &original_id).await?;
    tracing::info!(admin = %admin.username, original_id = %original_id, "pair reconciled from admin");
    Ok(Json(pair))
}

/// DELETE /api/admin/projects/{locale}/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((locale, slug)): Path<(String, String)>,
) -> AppResult<Json<DeletedProject>> {
    let locale: Locale = locale.parse()?;
    Ok(Json(projects::delete_project(&state, locale, &slug).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub locale: String,
    pub orders: Vec<OrderItem>,
}

/// POST /api/admin/projects/order
/// 200 when at least one item was written, 400 when none was; the body lists
/// the result of every item either way.
pub async fn reorder_projects(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<ReorderRequest>,
) -> AppResult<impl IntoResponse> {
    let locale: Locale = payload.locale.parse()?;
    let outcome: ReorderOutcome = projects::reorder_projects(&state, locale, payload.orders).await?;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(outcome)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugCheckQuery {
    pub slug: String,
    pub locale: String,
    #[serde(default)]
    pub original_id: Option<String>,
}

/// GET /api/admin/projects/slug-check?slug&locale&originalId
pub async fn slug_check(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<SlugCheckQuery>,
) -> AppResult<Json<SlugCheck>> {
    let locale: Locale = query.locale.parse()?;
    let exclude = query.original_id.as_deref().filter(|s| !s.is_empty());
    Ok(Json(
        projects::check_slug(state.store.as_ref(), &query.slug, locale, exclude).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct UnsyncedResponse {
    pub total: usize,
    pub projects: Vec<Project>,
}

/// GET /api/admin/projects/unsynced
pub async fn list_unsynced(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<UnsyncedResponse>> {
    let projects = projects::list_unsynced(state.store.as_ref()).await?;
    Ok(Json(UnsyncedResponse {
        total: projects.len(),
        projects,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{admin_token, send_json};
    use crate::state::testing::TestContext;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    async fn create(ctx: &TestContext, token: &str, slug: &str, title: &str) -> Value {
        let (status, body) = send_json(
            ctx,
            Method::POST,
            "/api/admin/projects/tr",
            Some(token),
            json!({
                "id": slug,
                "title": title,
                "description": "El yapımı",
                "technologies": ["porselen"]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    #[tokio::test]
    async fn test_create_list_and_fetch_pair() {
        let ctx = TestContext::new();
        let token = admin_token();
        let body = create(&ctx, &token, "porselen-tabak", "Porselen Tabak").await;
        let original_id = body["project"]["originalId"].as_str().unwrap().to_string();
        assert_eq!(body["sibling"]["originalId"], original_id.as_str());
        assert_eq!(body["sibling"]["status"], false);

        let (status, list) =
            send_json(&ctx, Method::GET, "/api/admin/projects/en", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["projects"].as_array().unwrap().len(), 1);
        assert_eq!(list["translations"]["title"], "Projects");

        let uri = format!("/api/admin/projects/en/by-original-id/{}", original_id);
        let (status, en) = send_json(&ctx, Method::GET, &uri, Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(en["title"], "");
        assert_eq!(en["pairingStatus"], "synced");
    }

    #[tokio::test]
    async fn test_duplicate_slug_returns_conflict_with_suggestion() {
        let ctx = TestContext::new();
        let token = admin_token();
        create(&ctx, &token, "foo", "Foo").await;

        let (status, body) = send_json(
            &ctx,
            Method::POST,
            "/api/admin/projects/tr",
            Some(&token),
            json!({ "id": "foo", "title": "Foo", "description": "x", "technologies": ["clay"] }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["suggestedSlug"], "foo1");
    }

    #[tokio::test]
    async fn test_update_images_propagates_through_routes() {
        let ctx = TestContext::new();
        let token = admin_token();
        let body = create(&ctx, &token, "vazo", "Vazo").await;
        let original_id = body["project"]["originalId"].as_str().unwrap().to_string();

        let (status, updated) = send_json(
            &ctx,
            Method::PUT,
            &format!("/api/admin/projects/tr/by-original-id/{}", original_id),
            Some(&token),
            json!({
                "_id": "client-echo",
                "originalId": "ignored",
                "images": ["/uploads/projects/1.jpg"]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["originalId"], original_id.as_str());

        let (_, en) = send_json(
            &ctx,
            Method::GET,
            &format!("/api/admin/projects/en/by-original-id/{}", original_id),
            Some(&token),
            Value::Null,
        )
        .await;
        assert_eq!(en["images"], json!(["/uploads/projects/1.jpg"]));
    }

    #[tokio::test]
    async fn test_slug_check_route() {
        let ctx = TestContext::new();
        let token = admin_token();
        create(&ctx, &token, "foo", "Foo").await;
        create(&ctx, &token, "foo1", "Foo 1").await;

        let (status, body) = send_json(
            &ctx,
            Method::GET,
            "/api/admin/projects/slug-check?slug=foo&locale=tr",
            Some(&token),
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAvailable"], false);
        assert_eq!(body["suggestedSlug"], "foo2");
    }

    #[tokio::test]
    async fn test_create_tr_without_description_or_technologies_is_rejected() {
        let ctx = TestContext::new();
        let token = admin_token();
        for payload in [
            json!({ "id": "bare", "title": "Bare", "technologies": ["clay"] }),
            json!({ "id": "bare", "title": "Bare", "description": "x", "technologies": [" "] }),
        ] {
            let (status, _) = send_json(
                &ctx,
                Method::POST,
                "/api/admin/projects/tr",
                Some(&token),
                payload,
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_reorder_route_and_public_listing() {
        let ctx = TestContext::new();
        let token = admin_token();
        create(&ctx, &token, "a", "A").await;
        create(&ctx, &token, "b", "B").await;

        let (status, body) = send_json(
            &ctx,
            Method::POST,
            "/api/admin/projects/order",
            Some(&token),
            json!({ "locale": "tr", "orders": [{ "id": "a", "order": 5 }, { "id": "b", "order": 1 }] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 2);

        let (status, list) = send_json(&ctx, Method::GET, "/api/projects/tr", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        let slugs: Vec<_> = list["projects"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(slugs, vec!["b", "a"]);

        // EN siblings are drafts until translated
        let (_, en) = send_json(&ctx, Method::GET, "/api/projects/en", None, Value::Null).await;
        assert!(en["projects"].as_array().unwrap().is_empty());
        let (status, _) = send_json(&ctx, Method::GET, "/api/projects/en/a", None, Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_route() {
        let ctx = TestContext::new();
        let token = admin_token();
        create(&ctx, &token, "gone", "Gone").await;

        let (status, body) =
            send_json(&ctx, Method::DELETE, "/api/admin/projects/tr/gone", Some(&token), Value::Null)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"]["id"], "gone");

        let (_, unsynced) = send_json(
            &ctx,
            Method::GET,
            "/api/admin/projects/unsynced",
            Some(&token),
            Value::Null,
        )
        .await;
        assert_eq!(unsynced["total"], 1);
        assert_eq!(unsynced["projects"][0]["locale"], "en");
    }
}
