use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::media::{self, UploadKind, MAX_FILE_SIZE};
use crate::routes::auth::AdminUser;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub file_name: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest {
    pub file_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageResponse {
    pub success: bool,
    pub file_name: String,
}

fn normalize_mime(declared: &str) -> &str {
    match declared {
        "image/jpg" | "image/pjpeg" => "image/jpeg",
        other => other,
    }
}

/// POST /api/admin/upload
/// Multipart with a `type` field (`logo`, `ogImage`, `project`) and a `file`.
pub async fn upload_image(
    State(state): State<AppState>,
    admin: AdminUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut kind: Option<String> = None;
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("invalid multipart data: {}", e)))?
    {
        match field.name() {
            Some("type") => {
                kind = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("invalid type field: {}", e)))?,
                );
            }
            Some("file") => {
                let declared = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("failed to read file data: {}", e)))?;
                file = Some((declared, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let raw_kind = kind.ok_or_else(|| AppError::validation("type is required"))?;
    let kind = UploadKind::parse(raw_kind.trim()).ok_or_else(|| {
        AppError::validation(format!(
            "unsupported upload type '{}'; expected logo, ogImage or project",
            raw_kind
        ))
    })?;
    let (declared, bytes) = file.ok_or_else(|| AppError::validation("No file provided"))?;

    if bytes.is_empty() {
        return Err(AppError::validation("Empty file"));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(AppError::validation("File too large. Maximum size is 5MB."));
    }

    let allowed = kind.allowed_mime_types();
    let mime_type = media::detect_image_type(&bytes)
        .filter(|mime| allowed.contains(mime))
        .ok_or_else(|| {
            AppError::validation(format!(
                "File content is not an allowed image type. Allowed: {}",
                allowed.join(", ")
            ))
        })?;
    if let Some(declared) = declared.as_deref().map(normalize_mime) {
        if declared != mime_type {
            return Err(AppError::validation(format!(
                "Declared type {} does not match file content ({})",
                declared, mime_type
            )));
        }
    }

    let directory = state.config.upload_dir.join(kind.directory());
    tokio::fs::create_dir_all(&directory)
        .await
        .map_err(|e| AppError::internal(format!("failed to create upload directory: {}", e)))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), media::extension_for_mime(mime_type));
    tokio::fs::write(directory.join(&file_name), &bytes)
        .await
        .map_err(|e| AppError::internal(format!("failed to save upload: {}", e)))?;

    tracing::info!(
        admin = %admin.username,
        kind = kind.directory(),
        file = %file_name,
        size = bytes.len(),
        "image uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: media::public_url(kind, &file_name),
            file_name: format!("{}/{}", kind.directory(), file_name),
            size: bytes.len(),
            mime_type: mime_type.to_string(),
        }),
    ))
}

/// POST /api/admin/deleteImage
/// Accepts `projects/x.jpg` or `/uploads/projects/x.jpg`.
pub async fn delete_image(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<DeleteImageRequest>,
) -> AppResult<Json<DeleteImageResponse>> {
    let path = media::resolve_upload_path(&state.config.upload_dir, payload.file_name.trim())
        .ok_or_else(|| AppError::validation("Invalid file name"))?;

    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found("File not found"));
        }
        Err(e) => {
            return Err(AppError::internal(format!(
                "failed to delete {}: {}",
                path.display(),
                e
            )))
        }
    }

    tracing::info!(admin = %admin.username, file = %payload.file_name, "image deleted");
    Ok(Json(DeleteImageResponse {
        success: true,
        file_name: payload.file_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{admin_token, read_json, send_json};
    use crate::state::testing::TestContext;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::json;
    use tower::ServiceExt;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const BOUNDARY: &str = "X-TEST-BOUNDARY";

    fn multipart_body(kind: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\n{kind}\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
                 Content-Type: {content_type}\r\n\r\n",
                b = BOUNDARY,
                kind = kind,
                content_type = content_type,
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    async fn upload(
        ctx: &TestContext,
        kind: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/admin/upload")
            .header("authorization", format!("Bearer {}", admin_token()))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(kind, content_type, bytes)))
            .unwrap();
        let response = crate::create_app(ctx.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        read_json(response).await
    }

    #[tokio::test]
    async fn test_upload_stores_file_under_kind_directory() {
        let ctx = TestContext::new();
        let (status, body) = upload(&ctx, "project", "image/png", PNG).await;
        assert_eq!(status, StatusCode::CREATED);

        let response: UploadResponse = serde_json::from_value(body).unwrap();
        assert!(response.url.starts_with("/uploads/projects/"));
        assert!(response.url.ends_with(".png"));
        assert_eq!(response.mime_type, "image/png");
        assert!(ctx.upload_dir.path().join(&response.file_name).exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_kind_and_bad_content() {
        let ctx = TestContext::new();
        let (status, _) = upload(&ctx, "avatar", "image/png", PNG).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = upload(&ctx, "project", "image/png", b"not an image at all").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // declared type must agree with the bytes
        let (status, _) = upload(&ctx, "project", "image/jpeg", PNG).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_og_image_rejects_svg() {
        let ctx = TestContext::new();
        let (status, _) = upload(&ctx, "ogImage", "image/svg+xml", b"<svg></svg>").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_image() {
        let ctx = TestContext::new();
        let dir = ctx.upload_dir.path().join("projects");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("x.jpg"), b"jpeg").await.unwrap();
        let token = admin_token();

        let (status, _) = send_json(
            &ctx,
            Method::POST,
            "/api/admin/deleteImage",
            Some(&token),
            json!({ "fileName": "/uploads/projects/x.jpg" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!dir.join("x.jpg").exists());

        let (status, _) = send_json(
            &ctx,
            Method::POST,
            "/api/admin/deleteImage",
            Some(&token),
            json!({ "fileName": "projects/x.jpg" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(
            &ctx,
            Method::POST,
            "/api/admin/deleteImage",
            Some(&token),
            json!({ "fileName": "../../etc/passwd" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
