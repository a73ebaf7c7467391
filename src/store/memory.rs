//! In-process store used without `DATABASE_URL` and by the test suite.
//! State lives for the process lifetime only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::models::{
    Content, ContactForm, ContentBody, Locale, PairingStatus, Project, ProjectTranslation,
    SiteConfig, User,
};

#[derive(Default)]
pub struct MemoryStore {
    contents: RwLock<HashMap<Locale, Content>>,
    translations: RwLock<HashMap<Locale, ProjectTranslation>>,
    site_config: RwLock<Option<SiteConfig>>,
    projects: RwLock<Vec<Project>>,
    contacts: RwLock<Vec<ContactForm>>,
    users: RwLock<HashMap<String, User>>,
    #[cfg(test)]
    failing_locale: RwLock<Option<Locale>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every project write for `locale` fail with a database error
    #[cfg(test)]
    pub async fn fail_project_writes_for(&self, locale: Option<Locale>) {
        *self.failing_locale.write().await = locale;
    }

    #[cfg(test)]
    async fn check_failure(&self, locale: Locale) -> StoreResult<()> {
        if *self.failing_locale.read().await == Some(locale) {
            return Err(StoreError::Corrupt(format!("injected failure for {}", locale)));
        }
        Ok(())
    }

    #[cfg(not(test))]
    async fn check_failure(&self, _locale: Locale) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<std::time::Duration> {
        let start = std::time::Instant::now();
        let _ = self.contents.read().await.len();
        Ok(start.elapsed())
    }

    async fn get_content(&self, locale: Locale) -> StoreResult<Option<Content>> {
        Ok(self.contents.read().await.get(&locale).cloned())
    }

    async fn insert_content_if_missing(&self, content: Content) -> StoreResult<bool> {
        let mut contents = self.contents.write().await;
        if contents.contains_key(&content.locale) {
            return Ok(false);
        }
        contents.insert(content.locale, content);
        Ok(true)
    }

    async fn update_content(
        &self,
        locale: Locale,
        body: ContentBody,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Content>> {
        let mut contents = self.contents.write().await;
        Ok(contents.get_mut(&locale).map(|content| {
            content.body = body;
            content.updated_at = updated_at;
            content.clone()
        }))
    }

    async fn get_project_translation(
        &self,
        locale: Locale,
    ) -> StoreResult<Option<ProjectTranslation>> {
        Ok(self.translations.read().await.get(&locale).cloned())
    }

    async fn put_project_translation(
        &self,
        translation: ProjectTranslation,
    ) -> StoreResult<ProjectTranslation> {
        self.translations
            .write()
            .await
            .insert(translation.locale, translation.clone());
        Ok(translation)
    }

    async fn get_site_config(&self) -> StoreResult<Option<SiteConfig>> {
        Ok(self.site_config.read().await.clone())
    }

    async fn put_site_config(&self, config: SiteConfig) -> StoreResult<SiteConfig> {
        *self.site_config.write().await = Some(config.clone());
        Ok(config)
    }

    async fn list_projects(&self, locale: Locale) -> StoreResult<Vec<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .filter(|p| p.locale == locale)
            .cloned()
            .collect())
    }

    async fn find_project_by_slug(
        &self,
        locale: Locale,
        slug: &str,
    ) -> StoreResult<Option<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .find(|p| p.locale == locale && p.id == slug)
            .cloned())
    }

    async fn find_project_by_original_id(
        &self,
        locale: Locale,
        original_id: &str,
    ) -> StoreResult<Option<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .find(|p| p.locale == locale && p.original_id == original_id)
            .cloned())
    }

    async fn insert_project(&self, project: Project) -> StoreResult<()> {
        self.check_failure(project.locale).await?;
        let mut projects = self.projects.write().await;
        if projects
            .iter()
            .any(|p| p.locale == project.locale && p.id == project.id)
        {
            return Err(StoreError::Duplicate(format!(
                "project '{}' ({})",
                project.id, project.locale
            )));
        }
        if projects
            .iter()
            .any(|p| p.locale == project.locale && p.original_id == project.original_id)
        {
            return Err(StoreError::Duplicate(format!(
                "pair member {} ({})",
                project.original_id, project.locale
            )));
        }
        projects.push(project);
        Ok(())
    }

    async fn replace_project(&self, project: Project) -> StoreResult<bool> {
        self.check_failure(project.locale).await?;
        let mut projects = self.projects.write().await;
        if projects.iter().any(|p| {
            p.doc_id != project.doc_id && p.locale == project.locale && p.id == project.id
        }) {
            return Err(StoreError::Duplicate(format!(
                "project '{}' ({})",
                project.id, project.locale
            )));
        }
        match projects.iter_mut().find(|p| p.doc_id == project.doc_id) {
            Some(existing) => {
                *existing = project;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_project_order(
        &self,
        locale: Locale,
        slug: &str,
        order: i32,
    ) -> StoreResult<bool> {
        self.check_failure(locale).await?;
        let mut projects = self.projects.write().await;
        match projects
            .iter_mut()
            .find(|p| p.locale == locale && p.id == slug)
        {
            Some(project) => {
                project.order = Some(order);
                project.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_project_images(
        &self,
        locale: Locale,
        original_id: &str,
        images: &[String],
    ) -> StoreResult<bool> {
        self.check_failure(locale).await?;
        let mut projects = self.projects.write().await;
        match projects
            .iter_mut()
            .find(|p| p.locale == locale && p.original_id == original_id)
        {
            Some(project) => {
                project.images = images.to_vec();
                project.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_pairing_status(
        &self,
        original_id: &str,
        status: PairingStatus,
    ) -> StoreResult<u64> {
        let mut projects = self.projects.write().await;
        let mut touched = 0;
        for project in projects.iter_mut().filter(|p| p.original_id == original_id) {
            project.pairing_status = status;
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_project(&self, locale: Locale, slug: &str) -> StoreResult<Option<Project>> {
        let mut projects = self.projects.write().await;
        Ok(projects
            .iter()
            .position(|p| p.locale == locale && p.id == slug)
            .map(|index| projects.remove(index)))
    }

    async fn list_unsynced_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .filter(|p| p.pairing_status != PairingStatus::Synced)
            .cloned()
            .collect())
    }

    async fn insert_contact(&self, form: ContactForm) -> StoreResult<()> {
        self.contacts.write().await.push(form);
        Ok(())
    }

    async fn list_contacts(&self) -> StoreResult<Vec<ContactForm>> {
        let mut contacts = self.contacts.read().await.clone();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    async fn set_contact_read(&self, id: Uuid, is_read: bool) -> StoreResult<Option<ContactForm>> {
        let mut contacts = self.contacts.write().await;
        Ok(contacts.iter_mut().find(|c| c.id == id).map(|form| {
            form.is_read = is_read;
            form.updated_at = Utc::now();
            form.clone()
        }))
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        let mut contacts = self.contacts.write().await;
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        Ok(contacts.len() != before)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(format!("user '{}'", user.username)));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }
}
