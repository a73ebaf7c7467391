//! Uploaded image files on disk.

use std::path::{Component, Path, PathBuf};

/// Public URL prefix under which the upload directory is served
pub const PUBLIC_PREFIX: &str = "/uploads/";

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// What an upload is for; decides its directory and accepted formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Logo,
    OgImage,
    Project,
}

impl UploadKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "logo" => Some(UploadKind::Logo),
            "ogImage" => Some(UploadKind::OgImage),
            "project" => Some(UploadKind::Project),
            _ => None,
        }
    }

    pub fn directory(&self) -> &'static str {
        match self {
            UploadKind::Logo => "logos",
            UploadKind::OgImage => "og",
            UploadKind::Project => "projects",
        }
    }

    pub fn allowed_mime_types(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Logo => &["image/png", "image/jpeg", "image/webp", "image/svg+xml"],
            UploadKind::OgImage => &["image/png", "image/jpeg", "image/webp"],
            UploadKind::Project => &["image/png", "image/jpeg", "image/webp", "image/gif"],
        }
    }
}

/// Sniffs the real content type; declared MIME types are not trusted
pub fn detect_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => {
            let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
            let head = head.trim_start();
            if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
                Some("image/svg+xml")
            } else {
                None
            }
        }
    }
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Maps a stored reference (`projects/a.jpg` or `/uploads/projects/a.jpg`)
/// to a path under `root`. Anything that could escape `root` yields `None`.
pub fn resolve_upload_path(root: &Path, reference: &str) -> Option<PathBuf> {
    let relative = reference
        .strip_prefix(PUBLIC_PREFIX)
        .unwrap_or(reference)
        .trim_start_matches('/');

    if relative.is_empty() || relative.contains('\\') || relative.contains('\0') {
        return None;
    }

    let relative = Path::new(relative);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    Some(root.join(relative))
}

pub fn public_url(kind: UploadKind, file_name: &str) -> String {
    format!("{}{}/{}", PUBLIC_PREFIX, kind.directory(), file_name)
}

/// Removes each referenced file; missing or unresolvable files are logged and
/// skipped. Returns how many files were actually removed.
pub async fn remove_files(root: &Path, references: &[String]) -> usize {
    let mut removed = 0;
    for reference in references {
        let Some(path) = resolve_upload_path(root, reference) else {
            tracing::warn!(reference = %reference, "refusing to delete file outside upload root");
            continue;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                removed += 1;
                tracing::info!(path = %path.display(), "image deleted");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "image already missing");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to delete image");
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_upload_path_accepts_public_urls() {
        let root = Path::new("/srv/uploads");
        assert_eq!(
            resolve_upload_path(root, "/uploads/projects/a.jpg"),
            Some(PathBuf::from("/srv/uploads/projects/a.jpg"))
        );
        assert_eq!(
            resolve_upload_path(root, "projects/a.jpg"),
            Some(PathBuf::from("/srv/uploads/projects/a.jpg"))
        );
    }

    #[test]
    fn test_resolve_upload_path_rejects_traversal() {
        let root = Path::new("/srv/uploads");
        assert!(resolve_upload_path(root, "../etc/passwd").is_none());
        assert!(resolve_upload_path(root, "/uploads/../../etc/passwd").is_none());
        assert!(resolve_upload_path(root, "projects\\..\\a.jpg").is_none());
        assert!(resolve_upload_path(root, "").is_none());
    }

    #[test]
    fn test_detect_image_type() {
        assert_eq!(detect_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_image_type(b"<svg xmlns=\"x\"></svg>"), Some("image/svg+xml"));
        assert_eq!(detect_image_type(b"plain text"), None);
    }

    #[test]
    fn test_upload_kind_parse() {
        assert_eq!(UploadKind::parse("ogImage"), Some(UploadKind::OgImage));
        assert_eq!(UploadKind::parse("avatar"), None);
    }

    #[tokio::test]
    async fn test_remove_files_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("projects")).await.unwrap();
        tokio::fs::write(dir.path().join("projects/a.jpg"), b"x").await.unwrap();

        let removed = remove_files(
            dir.path(),
            &[
                "/uploads/projects/a.jpg".to_string(),
                "/uploads/projects/missing.jpg".to_string(),
            ],
        )
        .await;
        assert_eq!(removed, 1);
        assert!(!dir.path().join("projects/a.jpg").exists());
    }
}
