//! Bilingual portfolio projects.
//!
//! Every logical project is a TR document plus an EN twin sharing one
//! `originalId`. Creating the pair and keeping the image lists aligned are
//! separate, idempotent steps whose progress is persisted as the documents'
//! [`PairingStatus`], so a half-finished pair stays visible in
//! [`list_unsynced`] until [`reconcile_pair`] repairs it.

use std::collections::BTreeMap;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::models::{
    Locale, PairingStatus, Project, ProjectSeo, ProjectStrings, SeoDefaults,
};
use crate::error::{AppError, AppResult};
use crate::media;
use crate::revalidate::{revalidate, RevalidationScope};
use crate::services::{content, site_config};
use crate::state::AppState;
use crate::store::{Store, StoreError};

lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

const MAX_SLUG_LENGTH: usize = 120;
const MAX_SUGGESTION_ATTEMPTS: u32 = 1000;
const META_DESCRIPTION_LENGTH: usize = 160;

/// Keys the server owns on a project document
const SERVER_MANAGED_FIELDS: &[&str] = &[
    "_id",
    "__v",
    "locale",
    "originalId",
    "pairingStatus",
    "createdAt",
    "updatedAt",
];

pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= MAX_SLUG_LENGTH && SLUG_REGEX.is_match(slug)
}

fn validate_slug(slug: &str) -> AppResult<()> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "invalid slug '{}': use lowercase letters, digits and single hyphens",
            slug
        )))
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Admin create/update body. Omitted fields keep their current value on
/// update and take defaults on create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectPayload {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
    pub order: Option<i32>,
    pub status: Option<bool>,
    pub seo: Option<ProjectSeo>,
}

impl ProjectPayload {
    pub fn from_value(mut payload: Value) -> AppResult<Self> {
        if let Value::Object(map) = &mut payload {
            for key in SERVER_MANAGED_FIELDS {
                map.remove(*key);
            }
        }
        serde_json::from_value(payload)
            .map_err(|e| AppError::validation(format!("invalid project payload: {}", e)))
    }

    fn slug(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Trims entries and drops blanks
/// TR is the authoritative locale and must be complete on its own
fn require_tr_fields(title: &str, description: &str, technologies: &[String]) -> AppResult<()> {
    if title.is_empty() {
        return Err(AppError::validation("title is required"));
    }
    if description.trim().is_empty() {
        return Err(AppError::validation("description is required"));
    }
    if technologies.is_empty() {
        return Err(AppError::validation("at least one technology is required"));
    }
    Ok(())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fills the SEO fields the admin left blank from the project itself, then
/// from the site-wide defaults for the locale
pub fn fill_seo_defaults(
    seo: ProjectSeo,
    title: &str,
    description: &str,
    technologies: &[String],
    images: &[String],
    defaults: &SeoDefaults,
) -> ProjectSeo {
    let mut seo = seo;
    if seo.meta_title.trim().is_empty() {
        seo.meta_title = match (title.is_empty(), defaults.title.is_empty()) {
            (true, _) => defaults.title.clone(),
            (false, true) => title.to_string(),
            (false, false) => format!("{} | {}", title, defaults.title),
        };
    }
    if seo.meta_description.trim().is_empty() {
        seo.meta_description = if description.is_empty() {
            defaults.description.clone()
        } else {
            description.chars().take(META_DESCRIPTION_LENGTH).collect()
        };
    }
    if seo.keywords.is_empty() {
        seo.keywords = if technologies.is_empty() {
            defaults.keywords.clone()
        } else {
            technologies.to_vec()
        };
    }
    if seo.og_title.trim().is_empty() {
        seo.og_title = seo.meta_title.clone();
    }
    if seo.og_description.trim().is_empty() {
        seo.og_description = seo.meta_description.clone();
    }
    if seo.og_image.is_none() {
        seo.og_image = images.first().cloned().or_else(|| defaults.og_image.clone());
    }
    seo
}

// ============================================================================
// Slugs
// ============================================================================

/// True when no document in `locale` uses `slug`, ignoring the pair member
/// identified by `exclude_original_id`
pub async fn is_slug_free(
    store: &dyn Store,
    locale: Locale,
    slug: &str,
    exclude_original_id: Option<&str>,
) -> AppResult<bool> {
    Ok(match store.find_project_by_slug(locale, slug).await? {
        None => true,
        Some(project) => exclude_original_id == Some(project.original_id.as_str()),
    })
}

/// `base` cut so that `suffix_len` more characters still fit a slug
fn slug_stem(base: &str, suffix_len: usize) -> &str {
    let keep = MAX_SLUG_LENGTH.saturating_sub(suffix_len).min(base.len());
    let stem = base.get(..keep).unwrap_or(base);
    stem.trim_end_matches('-')
}

/// First free `{base}1`, `{base}2`, ...; the base is shortened when the
/// suffix would push the slug past its length limit
pub async fn suggest_slug(
    store: &dyn Store,
    locale: Locale,
    base: &str,
    exclude_original_id: Option<&str>,
) -> AppResult<String> {
    for n in 1..=MAX_SUGGESTION_ATTEMPTS {
        let suffix = n.to_string();
        let candidate = format!("{}{}", slug_stem(base, suffix.len()), suffix);
        if is_slug_free(store, locale, &candidate, exclude_original_id).await? {
            return Ok(candidate);
        }
    }
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    Ok(format!("{}-{}", slug_stem(base, suffix.len() + 1), suffix))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugCheck {
    pub slug: String,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_slug: Option<String>,
}

pub async fn check_slug(
    store: &dyn Store,
    candidate: &str,
    locale: Locale,
    exclude_original_id: Option<&str>,
) -> AppResult<SlugCheck> {
    let slug = candidate.trim();
    validate_slug(slug)?;

    if is_slug_free(store, locale, slug, exclude_original_id).await? {
        return Ok(SlugCheck {
            slug: slug.to_string(),
            is_available: true,
            suggested_slug: None,
        });
    }
    Ok(SlugCheck {
        slug: slug.to_string(),
        is_available: false,
        suggested_slug: Some(suggest_slug(store, locale, slug, exclude_original_id).await?),
    })
}

async fn slug_conflict(
    store: &dyn Store,
    locale: Locale,
    slug: &str,
    exclude_original_id: Option<&str>,
) -> AppError {
    let suggested_slug = match suggest_slug(store, locale, slug, exclude_original_id).await {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(slug = %slug, error = %e, "could not compute slug suggestion");
            None
        }
    };
    AppError::Conflict {
        message: format!("Slug '{}' is already in use for locale '{}'", slug, locale),
        suggested_slug,
    }
}

// ============================================================================
// Reads
// ============================================================================

/// Public listing order: explicit `order` ascending with unordered documents
/// first, newest first among equals
pub fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Gives every unordered document its current position. Write failures are
/// logged and never fail the read.
///
/// The positions can collide with explicit orders already stored, so the
/// next listing may place a backfilled document among ranked ones.
async fn backfill_orders(store: &dyn Store, locale: Locale, projects: &mut [Project]) {
    for (index, project) in projects.iter_mut().enumerate() {
        if project.order.is_some() {
            continue;
        }
        let order = index as i32;
        project.order = Some(order);
        match store.set_project_order(locale, &project.id, order).await {
            Ok(true) => {
                tracing::debug!(locale = %locale, slug = %project.id, order, "backfilled project order")
            }
            Ok(false) => {
                tracing::warn!(locale = %locale, slug = %project.id, "project vanished during order backfill")
            }
            Err(e) => {
                tracing::warn!(locale = %locale, slug = %project.id, error = %e, "failed to backfill project order")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectList {
    pub locale: Locale,
    pub projects: Vec<Project>,
    pub translations: ProjectStrings,
    pub id_mapping: BTreeMap<String, String>,
}

async fn sorted_projects(store: &dyn Store, locale: Locale) -> AppResult<Vec<Project>> {
    let mut projects = store.list_projects(locale).await?;
    sort_projects(&mut projects);
    backfill_orders(store, locale, &mut projects).await;
    Ok(projects)
}

/// Every document of a locale, joined with the shared page strings
pub async fn list_projects(store: &dyn Store, locale: Locale) -> AppResult<ProjectList> {
    let projects = sorted_projects(store, locale).await?;
    let translation = content::get_project_translation(store, locale).await?;
    Ok(ProjectList {
        locale,
        projects,
        translations: translation.strings,
        id_mapping: translation.id_mapping,
    })
}

/// Same as [`list_projects`] restricted to published documents
pub async fn list_published(store: &dyn Store, locale: Locale) -> AppResult<ProjectList> {
    let mut list = list_projects(store, locale).await?;
    list.projects.retain(|p| p.status);
    Ok(list)
}

pub async fn get_project(store: &dyn Store, locale: Locale, original_id: &str) -> AppResult<Project> {
    store
        .find_project_by_original_id(locale, original_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "No {} project with originalId '{}'",
                locale, original_id
            ))
        })
}

/// Slug of the published twin, for language switchers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternateLink {
    pub locale: Locale,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub project: Project,
    pub alternate: Option<AlternateLink>,
}

pub async fn get_published_project(
    store: &dyn Store,
    locale: Locale,
    slug: &str,
) -> AppResult<ProjectDetail> {
    let project = store
        .find_project_by_slug(locale, slug)
        .await?
        .filter(|p| p.status)
        .ok_or_else(|| AppError::not_found(format!("Project '{}' not found", slug)))?;

    let sibling_locale = locale.sibling();
    let alternate = store
        .find_project_by_original_id(sibling_locale, &project.original_id)
        .await?
        .filter(|p| p.status)
        .map(|p| AlternateLink {
            locale: sibling_locale,
            id: p.id,
        });

    Ok(ProjectDetail { project, alternate })
}

// ============================================================================
// Pairing steps
// ============================================================================

/// Makes sure the twin of `source` exists; returns it. Safe to repeat.
async fn ensure_sibling(store: &dyn Store, source: &Project) -> AppResult<Project> {
    let locale = source.locale.sibling();
    if let Some(existing) = store
        .find_project_by_original_id(locale, &source.original_id)
        .await?
    {
        return Ok(existing);
    }

    let slug = if is_slug_free(store, locale, &source.id, None).await? {
        source.id.clone()
    } else {
        suggest_slug(store, locale, &source.id, None).await?
    };

    let now = Utc::now();
    let sibling = Project {
        doc_id: Uuid::new_v4(),
        locale,
        id: slug,
        original_id: source.original_id.clone(),
        title: String::new(),
        description: String::new(),
        images: source.images.clone(),
        technologies: source.technologies.clone(),
        order: source.order,
        status: false,
        seo: ProjectSeo {
            og_image: source.images.first().cloned(),
            ..ProjectSeo::default()
        },
        pairing_status: PairingStatus::Partial,
        created_at: now,
        updated_at: now,
    };
    store.insert_project(sibling.clone()).await?;
    tracing::info!(
        locale = %locale,
        slug = %sibling.id,
        original_id = %sibling.original_id,
        "created sibling project"
    );
    Ok(sibling)
}

/// Copies `source`'s image list onto its twin; returns whether a twin existed
async fn propagate_images(store: &dyn Store, source: &Project) -> AppResult<bool> {
    Ok(store
        .set_project_images(source.locale.sibling(), &source.original_id, &source.images)
        .await?)
}

async fn mark_pair(store: &dyn Store, original_id: &str, status: PairingStatus) {
    if let Err(e) = store.set_pairing_status(original_id, status).await {
        tracing::error!(
            original_id = %original_id,
            status = status.as_str(),
            error = %e,
            "failed to record pairing status"
        );
    }
}

// ============================================================================
// Writes
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProject {
    pub project: Project,
    pub sibling: Option<Project>,
}

pub async fn create_project(
    state: &AppState,
    locale: Locale,
    payload: ProjectPayload,
) -> AppResult<CreatedProject> {
    let store = state.store.as_ref();
    let original_id = Uuid::new_v4().to_string();

    let title = payload.title.clone().unwrap_or_default().trim().to_string();
    let slug = match (locale, payload.slug()) {
        (_, Some(slug)) => slug,
        (Locale::Tr, None) => return Err(AppError::validation("id (slug) is required")),
        (Locale::En, None) => format!("project-{}", &original_id[..8]),
    };
    validate_slug(&slug)?;

    let description = payload.description.clone().unwrap_or_default();
    let images = clean_list(payload.images.clone().unwrap_or_default());
    let technologies = clean_list(payload.technologies.clone().unwrap_or_default());
    if locale == Locale::Tr {
        require_tr_fields(&title, &description, &technologies)?;
    }

    if !is_slug_free(store, locale, &slug, None).await? {
        return Err(slug_conflict(store, locale, &slug, None).await);
    }
    let order = match payload.order {
        Some(order) => Some(order),
        None => next_order(store, locale).await,
    };

    let config = site_config::load(store).await;
    let seo = fill_seo_defaults(
        payload.seo.unwrap_or_default(),
        &title,
        &description,
        &technologies,
        &images,
        config.seo.for_locale(locale),
    );

    let now = Utc::now();
    let project = Project {
        doc_id: Uuid::new_v4(),
        locale,
        id: slug.clone(),
        original_id: original_id.clone(),
        title,
        description,
        images,
        technologies,
        order,
        status: payload.status.unwrap_or(locale == Locale::Tr),
        seo,
        // no twin yet; TR is promoted below, EN waits for reconciliation
        pairing_status: PairingStatus::Partial,
        created_at: now,
        updated_at: now,
    };

    match store.insert_project(project.clone()).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => return Err(slug_conflict(store, locale, &slug, None).await),
        Err(e) => return Err(e.into()),
    }
    tracing::info!(locale = %locale, slug = %slug, original_id = %original_id, "project created");

    let mut created = CreatedProject {
        project,
        sibling: None,
    };

    if locale == Locale::Tr {
        match ensure_sibling(store, &created.project).await {
            Ok(sibling) => {
                mark_pair(store, &original_id, PairingStatus::Synced).await;
                created.sibling = Some(sibling);
            }
            Err(e) => {
                tracing::error!(
                    original_id = %original_id,
                    error = %e,
                    "sibling creation failed, pair left for reconciliation"
                );
                mark_pair(store, &original_id, PairingStatus::Failed).await;
            }
        }
        created.project = get_project(store, locale, &original_id).await?;
        if created.sibling.is_some() {
            created.sibling = store
                .find_project_by_original_id(locale.sibling(), &original_id)
                .await?;
        }
    }

    revalidate(state.revalidator.as_ref(), &RevalidationScope::Projects(locale)).await;
    Ok(created)
}

/// One past the highest explicit order in the locale
async fn next_order(store: &dyn Store, locale: Locale) -> Option<i32> {
    match store.list_projects(locale).await {
        Ok(projects) => Some(
            projects
                .iter()
                .filter_map(|p| p.order)
                .max()
                .map_or(0, |max| max + 1),
        ),
        Err(e) => {
            tracing::warn!(locale = %locale, error = %e, "could not compute next order");
            None
        }
    }
}

pub async fn update_project(
    state: &AppState,
    locale: Locale,
    original_id: &str,
    payload: ProjectPayload,
) -> AppResult<Project> {
    let store = state.store.as_ref();
    let existing = get_project(store, locale, original_id).await?;

    let slug = payload.slug().unwrap_or_else(|| existing.id.clone());
    if slug != existing.id {
        validate_slug(&slug)?;
        if !is_slug_free(store, locale, &slug, Some(original_id)).await? {
            return Err(slug_conflict(store, locale, &slug, Some(original_id)).await);
        }
    }

    let title = match payload.title {
        Some(title) => title.trim().to_string(),
        None => existing.title.clone(),
    };
    let description = payload.description.unwrap_or_else(|| existing.description.clone());
    let technologies = payload
        .technologies
        .map(clean_list)
        .unwrap_or_else(|| existing.technologies.clone());
    if locale == Locale::Tr {
        require_tr_fields(&title, &description, &technologies)?;
    }
    let images = payload
        .images
        .map(clean_list)
        .unwrap_or_else(|| existing.images.clone());
    let images_changed = images != existing.images;

    let seo = match payload.seo {
        Some(seo) => {
            let config = site_config::load(store).await;
            fill_seo_defaults(
                seo,
                &title,
                &description,
                &technologies,
                &images,
                config.seo.for_locale(locale),
            )
        }
        None => existing.seo.clone(),
    };

    let updated = Project {
        doc_id: existing.doc_id,
        locale,
        id: slug.clone(),
        original_id: existing.original_id.clone(),
        title,
        description,
        images,
        technologies,
        order: payload.order.or(existing.order),
        status: payload.status.unwrap_or(existing.status),
        seo,
        pairing_status: existing.pairing_status,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    match store.replace_project(updated.clone()).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(AppError::not_found(format!(
                "No {} project with originalId '{}'",
                locale, original_id
            )))
        }
        Err(StoreError::Duplicate(_)) => {
            return Err(slug_conflict(store, locale, &slug, Some(original_id)).await)
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(locale = %locale, slug = %slug, original_id = %original_id, "project updated");

    if images_changed {
        match propagate_images(store, &updated).await {
            Ok(true) => mark_pair(store, original_id, PairingStatus::Synced).await,
            Ok(false) => {
                tracing::warn!(original_id = %original_id, "no sibling to receive images");
                mark_pair(store, original_id, PairingStatus::Partial).await;
            }
            Err(e) => {
                tracing::error!(original_id = %original_id, error = %e, "image propagation failed");
                mark_pair(store, original_id, PairingStatus::Failed).await;
            }
        }
    }

    let stored = get_project(store, locale, original_id).await?;

    let revalidator = state.revalidator.as_ref();
    revalidate(
        revalidator,
        &RevalidationScope::Project {
            locale,
            slug: stored.id.clone(),
        },
    )
    .await;
    if existing.id != stored.id {
        revalidate(
            revalidator,
            &RevalidationScope::Project {
                locale,
                slug: existing.id,
            },
        )
        .await;
    }
    if images_changed {
        revalidate(revalidator, &RevalidationScope::Projects(locale.sibling())).await;
    }

    Ok(stored)
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemResult {
    pub id: String,
    pub order: i32,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderOutcome {
    pub success: bool,
    pub updated: usize,
    pub results: Vec<OrderItemResult>,
}

/// Applies each `(slug, order)` independently. The batch succeeds when at
/// least one item was written; every item reports its own result.
pub async fn reorder_projects(
    state: &AppState,
    locale: Locale,
    items: Vec<OrderItem>,
) -> AppResult<ReorderOutcome> {
    if items.is_empty() {
        return Err(AppError::validation("orders must not be empty"));
    }

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let (updated, error) = match state
            .store
            .set_project_order(locale, &item.id, item.order)
            .await
        {
            Ok(true) => (true, None),
            Ok(false) => (false, Some("project not found".to_string())),
            Err(e) => {
                tracing::warn!(locale = %locale, slug = %item.id, error = %e, "order update failed");
                (false, Some(e.to_string()))
            }
        };
        results.push(OrderItemResult {
            id: item.id,
            order: item.order,
            updated,
            error,
        });
    }

    let updated = results.iter().filter(|r| r.updated).count();
    tracing::info!(locale = %locale, updated, total = results.len(), "projects reordered");
    if updated > 0 {
        revalidate(state.revalidator.as_ref(), &RevalidationScope::Projects(locale)).await;
    }

    Ok(ReorderOutcome {
        success: updated > 0,
        updated,
        results,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProject {
    pub deleted: Project,
    pub images_removed: usize,
}

/// Removes the document, then its image files. Missing files are not errors.
pub async fn delete_project(
    state: &AppState,
    locale: Locale,
    slug: &str,
) -> AppResult<DeletedProject> {
    let store = state.store.as_ref();
    let deleted = store
        .delete_project(locale, slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Project '{}' not found", slug)))?;
    tracing::info!(locale = %locale, slug = %slug, "project deleted");

    let twin = store
        .find_project_by_original_id(locale.sibling(), &deleted.original_id)
        .await;

    // images still shown by the twin stay on disk; so does everything when
    // the twin cannot be looked up
    let unshared: Vec<String> = match &twin {
        Ok(twin) => deleted
            .images
            .iter()
            .filter(|image| !twin.as_ref().is_some_and(|t| t.images.contains(*image)))
            .cloned()
            .collect(),
        Err(e) => {
            tracing::warn!(original_id = %deleted.original_id, error = %e, "twin lookup failed, keeping images");
            Vec::new()
        }
    };
    let images_removed = media::remove_files(&state.config.upload_dir, &unshared).await;

    if matches!(twin, Ok(Some(_))) {
        mark_pair(store, &deleted.original_id, PairingStatus::Partial).await;
    }

    revalidate(
        state.revalidator.as_ref(),
        &RevalidationScope::Project {
            locale,
            slug: deleted.id.clone(),
        },
    )
    .await;

    Ok(DeletedProject {
        deleted,
        images_removed,
    })
}

// ============================================================================
// Repair
// ============================================================================

pub async fn list_unsynced(store: &dyn Store) -> AppResult<Vec<Project>> {
    let mut projects = store.list_unsynced_projects().await?;
    projects.sort_by(|a, b| {
        a.original_id
            .cmp(&b.original_id)
            .then_with(|| a.locale.cmp(&b.locale))
    });
    Ok(projects)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledPair {
    pub original_id: String,
    pub tr: Project,
    pub en: Project,
}

/// Re-runs the pairing steps for one pair: creates the missing twin, copies
/// the TR images across and marks both documents synced
pub async fn reconcile_pair(
    state: &AppState,
    locale: Locale,
    original_id: &str,
) -> AppResult<ReconciledPair> {
    let store = state.store.as_ref();
    let requested = get_project(store, locale, original_id).await?;
    let source = match locale {
        Locale::Tr => requested,
        Locale::En => store
            .find_project_by_original_id(Locale::Tr, original_id)
            .await?
            .unwrap_or(requested),
    };

    let sibling = ensure_sibling(store, &source).await?;
    if sibling.images != source.images {
        propagate_images(store, &source).await?;
    }
    store
        .set_pairing_status(original_id, PairingStatus::Synced)
        .await?;
    tracing::info!(original_id = %original_id, "project pair reconciled");

    let tr = get_project(store, Locale::Tr, original_id).await?;
    let en = get_project(store, Locale::En, original_id).await?;
    for locale in Locale::ALL {
        revalidate(state.revalidator.as_ref(), &RevalidationScope::Projects(locale)).await;
    }

    Ok(ReconciledPair {
        original_id: original_id.to_string(),
        tr,
        en,
    })
}
