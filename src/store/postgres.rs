//! Postgres-backed store. Nested documents live in JSONB columns; the
//! uniqueness invariants are enforced by the indexes in `db::run_migrations`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::models::{
    Content, ContactForm, ContentBody, Locale, PairingStatus, Project, ProjectSeo,
    ProjectStrings, ProjectTranslation, SiteConfig, User,
};

const PROJECT_COLUMNS: &str = "doc_id, locale, slug, original_id, title, description, images, \
     technologies, sort_order, status, seo, pairing_status, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_locale(raw: &str) -> StoreResult<Locale> {
    raw.parse()
        .map_err(|e: crate::db::models::UnsupportedLocale| StoreError::Corrupt(e.to_string()))
}

/// Unique-index violations surface as [`StoreError::Duplicate`]
fn map_write_error(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Duplicate(what())
        }
        _ => StoreError::Database(err),
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(FromRow)]
struct ContentRow {
    locale: String,
    body: Json<ContentBody>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentRow> for Content {
    type Error = StoreError;

    fn try_from(row: ContentRow) -> StoreResult<Self> {
        Ok(Content {
            locale: parse_locale(&row.locale)?,
            body: row.body.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TranslationRow {
    locale: String,
    strings: Json<ProjectStrings>,
    id_mapping: Json<BTreeMap<String, String>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TranslationRow> for ProjectTranslation {
    type Error = StoreError;

    fn try_from(row: TranslationRow) -> StoreResult<Self> {
        Ok(ProjectTranslation {
            locale: parse_locale(&row.locale)?,
            strings: row.strings.0,
            id_mapping: row.id_mapping.0,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProjectRow {
    doc_id: Uuid,
    locale: String,
    slug: String,
    original_id: String,
    title: String,
    description: String,
    images: Vec<String>,
    technologies: Vec<String>,
    sort_order: Option<i32>,
    status: bool,
    seo: Json<ProjectSeo>,
    pairing_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> StoreResult<Self> {
        Ok(Project {
            doc_id: row.doc_id,
            locale: parse_locale(&row.locale)?,
            id: row.slug,
            original_id: row.original_id,
            title: row.title,
            description: row.description,
            images: row.images,
            technologies: row.technologies,
            order: row.sort_order,
            status: row.status,
            seo: row.seo.0,
            pairing_status: row
                .pairing_status
                .parse()
                .map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_projects(rows: Vec<ProjectRow>) -> StoreResult<Vec<Project>> {
    rows.into_iter().map(Project::try_from).collect()
}

#[derive(FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    message: String,
    ip: String,
    user_agent: Option<String>,
    is_read: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactForm {
    fn from(row: ContactRow) -> Self {
        ContactForm {
            id: row.id,
            name: row.name,
            email: row.email,
            message: row.message,
            ip: row.ip,
            user_agent: row.user_agent,
            is_read: row.is_read,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

// ============================================================================
// Store implementation
// ============================================================================

#[async_trait]
impl Store for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<std::time::Duration> {
        let start = std::time::Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn get_content(&self, locale: Locale) -> StoreResult<Option<Content>> {
        sqlx::query_as::<_, ContentRow>(
            "SELECT locale, body, created_at, updated_at FROM contents WHERE locale = $1",
        )
        .bind(locale.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(Content::try_from)
        .transpose()
    }

    async fn insert_content_if_missing(&self, content: Content) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO contents (locale, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (locale) DO NOTHING
            "#,
        )
        .bind(content.locale.as_str())
        .bind(Json(&content.body))
        .bind(content.created_at)
        .bind(content.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_content(
        &self,
        locale: Locale,
        body: ContentBody,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Content>> {
        sqlx::query_as::<_, ContentRow>(
            r#"
            UPDATE contents SET body = $1, updated_at = $2
            WHERE locale = $3
            RETURNING locale, body, created_at, updated_at
            "#,
        )
        .bind(Json(&body))
        .bind(updated_at)
        .bind(locale.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(Content::try_from)
        .transpose()
    }

    async fn get_project_translation(
        &self,
        locale: Locale,
    ) -> StoreResult<Option<ProjectTranslation>> {
        sqlx::query_as::<_, TranslationRow>(
            "SELECT locale, strings, id_mapping, updated_at FROM project_translations WHERE locale = $1",
        )
        .bind(locale.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(ProjectTranslation::try_from)
        .transpose()
    }

    async fn put_project_translation(
        &self,
        translation: ProjectTranslation,
    ) -> StoreResult<ProjectTranslation> {
        let row = sqlx::query_as::<_, TranslationRow>(
            r#"
            INSERT INTO project_translations (locale, strings, id_mapping, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (locale) DO UPDATE SET
                strings = EXCLUDED.strings,
                id_mapping = EXCLUDED.id_mapping,
                updated_at = EXCLUDED.updated_at
            RETURNING locale, strings, id_mapping, updated_at
            "#,
        )
        .bind(translation.locale.as_str())
        .bind(Json(&translation.strings))
        .bind(Json(&translation.id_mapping))
        .bind(translation.updated_at)
        .fetch_one(&self.pool)
        .await?;
        ProjectTranslation::try_from(row)
    }

    async fn get_site_config(&self) -> StoreResult<Option<SiteConfig>> {
        let row: Option<(Json<SiteConfig>,)> =
            sqlx::query_as("SELECT config FROM site_config WHERE singleton")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(config,)| config.0))
    }

    async fn put_site_config(&self, config: SiteConfig) -> StoreResult<SiteConfig> {
        let (stored,): (Json<SiteConfig>,) = sqlx::query_as(
            r#"
            INSERT INTO site_config (singleton, config, updated_at)
            VALUES (true, $1, now())
            ON CONFLICT (singleton) DO UPDATE SET
                config = EXCLUDED.config,
                updated_at = now()
            RETURNING config
            "#,
        )
        .bind(Json(&config))
        .fetch_one(&self.pool)
        .await?;
        Ok(stored.0)
    }

    async fn list_projects(&self, locale: Locale) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE locale = $1",
            PROJECT_COLUMNS
        ))
        .bind(locale.as_str())
        .fetch_all(&self.pool)
        .await?;
        into_projects(rows)
    }

    async fn find_project_by_slug(
        &self,
        locale: Locale,
        slug: &str,
    ) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE locale = $1 AND slug = $2",
            PROJECT_COLUMNS
        ))
        .bind(locale.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn find_project_by_original_id(
        &self,
        locale: Locale,
        original_id: &str,
    ) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE locale = $1 AND original_id = $2",
            PROJECT_COLUMNS
        ))
        .bind(locale.as_str())
        .bind(original_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn insert_project(&self, project: Project) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (doc_id, locale, slug, original_id, title, description, images,
                technologies, sort_order, status, seo, pairing_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(project.doc_id)
        .bind(project.locale.as_str())
        .bind(&project.id)
        .bind(&project.original_id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.images)
        .bind(&project.technologies)
        .bind(project.order)
        .bind(project.status)
        .bind(Json(&project.seo))
        .bind(project.pairing_status.as_str())
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, || format!("project '{}' ({})", project.id, project.locale))
        })?;
        Ok(())
    }

    async fn replace_project(&self, project: Project) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                slug = $2, title = $3, description = $4, images = $5, technologies = $6,
                sort_order = $7, status = $8, seo = $9, pairing_status = $10, updated_at = $11
            WHERE doc_id = $1
            "#,
        )
        .bind(project.doc_id)
        .bind(&project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.images)
        .bind(&project.technologies)
        .bind(project.order)
        .bind(project.status)
        .bind(Json(&project.seo))
        .bind(project.pairing_status.as_str())
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, || format!("project '{}' ({})", project.id, project.locale))
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_project_order(
        &self,
        locale: Locale,
        slug: &str,
        order: i32,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE projects SET sort_order = $1, updated_at = now() WHERE locale = $2 AND slug = $3",
        )
        .bind(order)
        .bind(locale.as_str())
        .bind(slug)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_project_images(
        &self,
        locale: Locale,
        original_id: &str,
        images: &[String],
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE projects SET images = $1, updated_at = now() WHERE locale = $2 AND original_id = $3",
        )
        .bind(images)
        .bind(locale.as_str())
        .bind(original_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_pairing_status(
        &self,
        original_id: &str,
        status: PairingStatus,
    ) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE projects SET pairing_status = $1 WHERE original_id = $2")
            .bind(status.as_str())
            .bind(original_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_project(&self, locale: Locale, slug: &str) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, ProjectRow>(&format!(
            "DELETE FROM projects WHERE locale = $1 AND slug = $2 RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(locale.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn list_unsynced_projects(&self) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE pairing_status <> 'synced' ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        into_projects(rows)
    }

    async fn insert_contact(&self, form: ContactForm) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contact_forms (id, name, email, message, ip, user_agent, is_read, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(form.id)
        .bind(&form.name)
        .bind(&form.email)
        .bind(&form.message)
        .bind(&form.ip)
        .bind(&form.user_agent)
        .bind(form.is_read)
        .bind(form.created_at)
        .bind(form.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_contacts(&self) -> StoreResult<Vec<ContactForm>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT id, name, email, message, ip, user_agent, is_read, created_at, updated_at
            FROM contact_forms
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ContactForm::from).collect())
    }

    async fn set_contact_read(&self, id: Uuid, is_read: bool) -> StoreResult<Option<ContactForm>> {
        let row = sqlx::query_as::<_, ContactRow>(
            r#"
            UPDATE contact_forms SET is_read = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, name, email, message, ip, user_agent, is_read, created_at, updated_at
            "#,
        )
        .bind(is_read)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ContactForm::from))
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM contact_forms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, is_admin, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, || format!("user '{}'", user.username)))?;
        Ok(())
    }
}
