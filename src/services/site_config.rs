//! Singleton site settings.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::db::models::{LocalizedSeo, SeoDefaults, SiteConfig};
use crate::error::{AppError, AppResult};
use crate::revalidate::{revalidate, RevalidationScope};
use crate::state::AppState;
use crate::store::Store;

const MAX_PROJECTS_PER_PAGE: u32 = 100;

pub fn default_site_config() -> SiteConfig {
    SiteConfig {
        contact_email: "contact@example.com".to_string(),
        display_email: "contact@example.com".to_string(),
        logo: None,
        seo: LocalizedSeo {
            tr: SeoDefaults {
                title: "Portfolyo".to_string(),
                description: "Seçilmiş projeler ve çalışmalar".to_string(),
                keywords: vec!["portfolyo".to_string()],
                og_image: None,
            },
            en: SeoDefaults {
                title: "Portfolio".to_string(),
                description: "Selected projects and work".to_string(),
                keywords: vec!["portfolio".to_string()],
                og_image: None,
            },
        },
        projects_per_page: 9,
        robots_index: true,
        updated_at: None,
    }
}

/// Stored config, or the built-in fallback when none was saved yet or the
/// store is unreachable
pub async fn load(store: &dyn Store) -> SiteConfig {
    match store.get_site_config().await {
        Ok(Some(config)) => config,
        Ok(None) => default_site_config(),
        Err(e) => {
            tracing::error!(error = %e, "failed to load site config, using defaults");
            default_site_config()
        }
    }
}

fn validate(config: &SiteConfig) -> AppResult<()> {
    for (field, email) in [
        ("contactEmail", &config.contact_email),
        ("displayEmail", &config.display_email),
    ] {
        if !email.contains('@') {
            return Err(AppError::validation(format!("{} must be an e-mail address", field)));
        }
    }
    if config.projects_per_page == 0 || config.projects_per_page > MAX_PROJECTS_PER_PAGE {
        return Err(AppError::validation(format!(
            "projectsPerPage must be between 1 and {}",
            MAX_PROJECTS_PER_PAGE
        )));
    }
    Ok(())
}

/// Validates and upserts the singleton, then revalidates the pages showing it
pub async fn save(state: &AppState, mut payload: Value) -> AppResult<SiteConfig> {
    if let Value::Object(map) = &mut payload {
        for key in ["_id", "__v", "createdAt", "updatedAt"] {
            map.remove(key);
        }
    }
    let mut config: SiteConfig = serde_json::from_value(payload)
        .map_err(|e| AppError::validation(format!("invalid site config: {}", e)))?;
    validate(&config)?;
    config.updated_at = Some(Utc::now());

    let saved = state.store.put_site_config(config).await?;
    tracing::info!("site config updated");
    revalidate(state.revalidator.as_ref(), &RevalidationScope::SiteSettings).await;
    Ok(saved)
}

/// The part of the config the public site needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSiteSettings {
    pub display_email: String,
    pub logo: Option<String>,
    pub seo: LocalizedSeo,
    pub projects_per_page: u32,
    pub robots_index: bool,
}

impl From<SiteConfig> for PublicSiteSettings {
    fn from(config: SiteConfig) -> Self {
        Self {
            display_email: config.display_email,
            logo: config.logo,
            seo: config.seo,
            projects_per_page: config.projects_per_page,
            robots_index: config.robots_index,
        }
    }
}
