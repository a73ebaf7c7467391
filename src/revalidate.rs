//! Frontend cache revalidation.
//!
//! After a publicly visible write, the rendered pages and data tags that can
//! show it are invalidated explicitly. Each target is attempted on its own;
//! failures are logged and never reach the caller.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::json;

use crate::db::models::Locale;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap_or_default()
});

#[async_trait]
pub trait Revalidator: Send + Sync {
    async fn revalidate_path(&self, path: &str) -> Result<(), String>;
    async fn revalidate_tag(&self, tag: &str) -> Result<(), String>;
}

/// Posts each target to the frontend's revalidation endpoint
pub struct HttpRevalidator {
    url: String,
    secret: Option<String>,
}

impl HttpRevalidator {
    pub fn new(url: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            url: url.into(),
            secret,
        }
    }

    async fn post(&self, body: serde_json::Value) -> Result<(), String> {
        let mut request = HTTP_CLIENT.post(&self.url).json(&body);
        if let Some(secret) = &self.secret {
            request = request.header("x-revalidate-secret", secret);
        }
        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("revalidation endpoint returned {}", status))
        }
    }
}

#[async_trait]
impl Revalidator for HttpRevalidator {
    async fn revalidate_path(&self, path: &str) -> Result<(), String> {
        self.post(json!({ "path": path })).await
    }

    async fn revalidate_tag(&self, tag: &str) -> Result<(), String> {
        self.post(json!({ "tag": tag })).await
    }
}

/// Used when no revalidation endpoint is configured
pub struct LogRevalidator;

#[async_trait]
impl Revalidator for LogRevalidator {
    async fn revalidate_path(&self, path: &str) -> Result<(), String> {
        tracing::debug!(path = %path, "revalidation endpoint not configured, skipping path");
        Ok(())
    }

    async fn revalidate_tag(&self, tag: &str) -> Result<(), String> {
        tracing::debug!(tag = %tag, "revalidation endpoint not configured, skipping tag");
        Ok(())
    }
}

/// What changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidationScope {
    Content(Locale),
    Projects(Locale),
    Project { locale: Locale, slug: String },
    SiteSettings,
}

/// Paths and tags to invalidate for one scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevalidationTargets {
    pub paths: Vec<String>,
    pub tags: Vec<String>,
}

impl RevalidationScope {
    pub fn targets(&self) -> RevalidationTargets {
        let locale_paths = |locale: Locale| {
            vec![
                "/".to_string(),
                format!("/{}", locale),
                format!("/{}/projects", locale),
            ]
        };
        let shared_tags = |locale: Locale| {
            vec![
                "content".to_string(),
                "navigation".to_string(),
                format!("content-{}", locale),
                "footer".to_string(),
                "site-settings".to_string(),
            ]
        };

        match self {
            RevalidationScope::Content(locale) => RevalidationTargets {
                paths: locale_paths(*locale),
                tags: shared_tags(*locale),
            },
            RevalidationScope::Projects(locale) => {
                let mut tags = shared_tags(*locale);
                tags.push("projects".to_string());
                tags.push(format!("projects-{}", locale));
                RevalidationTargets {
                    paths: locale_paths(*locale),
                    tags,
                }
            }
            RevalidationScope::Project { locale, slug } => {
                let mut targets = RevalidationScope::Projects(*locale).targets();
                targets.paths.push(format!("/{}/projects/{}", locale, slug));
                targets
            }
            RevalidationScope::SiteSettings => RevalidationTargets {
                paths: Locale::ALL
                    .iter()
                    .flat_map(|l| locale_paths(*l))
                    .fold(Vec::new(), |mut acc, p| {
                        if !acc.contains(&p) {
                            acc.push(p);
                        }
                        acc
                    }),
                tags: vec!["site-settings".to_string(), "footer".to_string()],
            },
        }
    }
}

/// Invalidates every target of `scope`; returns how many attempts failed
pub async fn revalidate(revalidator: &dyn Revalidator, scope: &RevalidationScope) -> usize {
    let targets = scope.targets();
    let mut failures = 0;

    for path in &targets.paths {
        if let Err(e) = revalidator.revalidate_path(path).await {
            failures += 1;
            tracing::warn!(path = %path, error = %e, "path revalidation failed");
        }
    }
    for tag in &targets.tags {
        if let Err(e) = revalidator.revalidate_tag(tag).await {
            failures += 1;
            tracing::warn!(tag = %tag, error = %e, "tag revalidation failed");
        }
    }

    tracing::debug!(
        scope = ?scope,
        paths = targets.paths.len(),
        tags = targets.tags.len(),
        failures,
        "revalidation finished"
    );
    failures
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every target; fails on one chosen target
    #[derive(Default)]
    pub struct RecordingRevalidator {
        pub paths: Mutex<Vec<String>>,
        pub tags: Mutex<Vec<String>>,
        pub fail_on: Option<String>,
    }

    impl RecordingRevalidator {
        pub fn failing_on(target: &str) -> Self {
            Self {
                fail_on: Some(target.to_string()),
                ..Self::default()
            }
        }

        pub fn paths(&self) -> Vec<String> {
            self.paths.lock().unwrap().clone()
        }

        pub fn tags(&self) -> Vec<String> {
            self.tags.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Revalidator for RecordingRevalidator {
        async fn revalidate_path(&self, path: &str) -> Result<(), String> {
            self.paths.lock().unwrap().push(path.to_string());
            match &self.fail_on {
                Some(target) if target == path => Err("boom".to_string()),
                _ => Ok(()),
            }
        }

        async fn revalidate_tag(&self, tag: &str) -> Result<(), String> {
            self.tags.lock().unwrap().push(tag.to_string());
            match &self.fail_on {
                Some(target) if target == tag => Err("boom".to_string()),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingRevalidator;
    use super::*;

    #[test]
    fn test_content_scope_targets() {
        let targets = RevalidationScope::Content(Locale::En).targets();
        assert_eq!(targets.paths, vec!["/", "/en", "/en/projects"]);
        assert!(targets.tags.contains(&"content-en".to_string()));
        assert!(targets.tags.contains(&"navigation".to_string()));
    }

    #[test]
    fn test_project_scope_adds_detail_path() {
        let targets = RevalidationScope::Project {
            locale: Locale::Tr,
            slug: "porselen-tabak".to_string(),
        }
        .targets();
        assert!(targets.paths.contains(&"/tr/projects/porselen-tabak".to_string()));
        assert!(targets.tags.contains(&"projects-tr".to_string()));
    }

    #[test]
    fn test_site_settings_scope_has_no_duplicate_paths() {
        let targets = RevalidationScope::SiteSettings.targets();
        assert_eq!(targets.paths.iter().filter(|p| *p == "/").count(), 1);
        assert_eq!(targets.paths.len(), 5);
    }

    #[tokio::test]
    async fn test_one_failing_target_does_not_stop_the_rest() {
        let revalidator = RecordingRevalidator::failing_on("/tr");
        let failures = revalidate(&revalidator, &RevalidationScope::Content(Locale::Tr)).await;
        assert_eq!(failures, 1);
        assert_eq!(revalidator.paths(), vec!["/", "/tr", "/tr/projects"]);
        assert_eq!(revalidator.tags().len(), 5);
    }
}
