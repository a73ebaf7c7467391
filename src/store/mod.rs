//! Document store seam.
//!
//! Every collection the service persists is reached through [`Store`]. Two
//! backends exist: [`PgStore`] for deployments with `DATABASE_URL`, and
//! [`MemoryStore`] for local development without Postgres and for tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{
    Content, ContactForm, ContentBody, Locale, PairingStatus, Project, ProjectTranslation,
    SiteConfig, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Round-trip latency of a trivial query
    async fn health_check(&self) -> StoreResult<std::time::Duration>;

    // -- contents ------------------------------------------------------------

    async fn get_content(&self, locale: Locale) -> StoreResult<Option<Content>>;

    /// Inserts only when no document exists for the locale; returns whether it did
    async fn insert_content_if_missing(&self, content: Content) -> StoreResult<bool>;

    /// Replaces the body of an existing document; `None` when there is none
    async fn update_content(
        &self,
        locale: Locale,
        body: ContentBody,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Content>>;

    // -- project translations ------------------------------------------------

    async fn get_project_translation(
        &self,
        locale: Locale,
    ) -> StoreResult<Option<ProjectTranslation>>;

    async fn put_project_translation(
        &self,
        translation: ProjectTranslation,
    ) -> StoreResult<ProjectTranslation>;

    // -- site config -----------------------------------------------------------

    async fn get_site_config(&self) -> StoreResult<Option<SiteConfig>>;

    async fn put_site_config(&self, config: SiteConfig) -> StoreResult<SiteConfig>;

    // -- projects ----------------------------------------------------------------

    async fn list_projects(&self, locale: Locale) -> StoreResult<Vec<Project>>;

    async fn find_project_by_slug(&self, locale: Locale, slug: &str)
        -> StoreResult<Option<Project>>;

    async fn find_project_by_original_id(
        &self,
        locale: Locale,
        original_id: &str,
    ) -> StoreResult<Option<Project>>;

    /// Fails with [`StoreError::Duplicate`] when `(locale, id)` or
    /// `(locale, originalId)` is taken
    async fn insert_project(&self, project: Project) -> StoreResult<()>;

    /// Replaces the document with the same row id; returns whether it existed
    async fn replace_project(&self, project: Project) -> StoreResult<bool>;

    /// Returns whether a document matched
    async fn set_project_order(&self, locale: Locale, slug: &str, order: i32)
        -> StoreResult<bool>;

    async fn set_project_images(
        &self,
        locale: Locale,
        original_id: &str,
        images: &[String],
    ) -> StoreResult<bool>;

    /// Marks every locale's document of one pair; returns the number touched
    async fn set_pairing_status(
        &self,
        original_id: &str,
        status: PairingStatus,
    ) -> StoreResult<u64>;

    async fn delete_project(&self, locale: Locale, slug: &str) -> StoreResult<Option<Project>>;

    async fn list_unsynced_projects(&self) -> StoreResult<Vec<Project>>;

    // -- contact forms -----------------------------------------------------------

    async fn insert_contact(&self, form: ContactForm) -> StoreResult<()>;

    /// Newest first
    async fn list_contacts(&self) -> StoreResult<Vec<ContactForm>>;

    async fn set_contact_read(&self, id: Uuid, is_read: bool) -> StoreResult<Option<ContactForm>>;

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool>;

    // -- users -------------------------------------------------------------------

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn insert_user(&self, user: User) -> StoreResult<()>;
}
