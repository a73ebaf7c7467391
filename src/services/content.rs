//! Localized page copy and shared project-page strings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::db::models::{
    AboutSection, ContactSection, Content, ContentBody, ExpertiseItem, ExpertiseSection,
    FooterSection, HeroSection, Locale, NavLink, ProjectStrings, ProjectTranslation,
    SkillItem, SkillsSection,
};
use crate::error::{AppError, AppResult};
use crate::revalidate::{revalidate, RevalidationScope};
use crate::state::AppState;
use crate::store::Store;

/// Keys the server owns; clients may echo them back but never set them
const SERVER_MANAGED_FIELDS: &[&str] = &["_id", "__v", "id", "locale", "createdAt", "updatedAt"];

pub fn strip_server_fields(payload: &mut Value) {
    if let Value::Object(map) = payload {
        for key in SERVER_MANAGED_FIELDS {
            map.remove(*key);
        }
    }
}

fn is_valid_link(url: &str) -> bool {
    url.starts_with('/')
        || url.starts_with('#')
        || url.starts_with("https://")
        || url.starts_with("http://")
        || url.starts_with("mailto:")
}

fn validate_links(section: &str, links: &[NavLink]) -> AppResult<()> {
    for (index, link) in links.iter().enumerate() {
        if link.label.trim().is_empty() {
            return Err(AppError::validation(format!(
                "{}[{}]: label is required",
                section, index
            )));
        }
        if !is_valid_link(&link.url) {
            return Err(AppError::validation(format!(
                "{}[{}]: invalid url '{}'",
                section, index, link.url
            )));
        }
    }
    Ok(())
}

/// Shape checks beyond what deserialization already enforces
pub fn validate_body(body: &ContentBody) -> AppResult<()> {
    validate_links("navigation", &body.navigation)?;
    validate_links("footer.links", &body.footer.links)?;

    if let Some(skill) = body
        .skills
        .items
        .iter()
        .find(|s| s.level.is_some_and(|level| level > 100))
    {
        return Err(AppError::validation(format!(
            "skills: level of '{}' must be between 0 and 100",
            skill.name
        )));
    }
    Ok(())
}

/// Parses an admin payload into a typed body
pub fn parse_body(mut payload: Value) -> AppResult<ContentBody> {
    strip_server_fields(&mut payload);
    let body: ContentBody = serde_json::from_value(payload)
        .map_err(|e| AppError::validation(format!("invalid content payload: {}", e)))?;
    validate_body(&body)?;
    Ok(body)
}

pub async fn get_content(store: &dyn Store, locale: Locale) -> AppResult<Content> {
    store
        .get_content(locale)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No content for locale '{}'", locale)))
}

/// Overlays the payload's top-level sections onto the stored body.
/// Sections the payload leaves out keep their stored value.
fn merge_sections(current: &ContentBody, mut payload: Value) -> AppResult<Value> {
    strip_server_fields(&mut payload);
    let Value::Object(sections) = payload else {
        return Err(AppError::validation("content payload must be a JSON object"));
    };
    let mut merged = serde_json::to_value(current)
        .map_err(|e| AppError::internal(format!("could not encode stored content: {}", e)))?;
    if let Value::Object(target) = &mut merged {
        target.extend(sections);
    }
    Ok(merged)
}

/// Updates the sections named in the payload and revalidates everything that
/// renders them. Documents are never created here; they come from seeding.
pub async fn put_content(state: &AppState, locale: Locale, payload: Value) -> AppResult<Content> {
    let current = get_content(state.store.as_ref(), locale).await?;
    let body = parse_body(merge_sections(&current.body, payload)?)?;

    let updated = state
        .store
        .update_content(locale, body, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found(format!("No content for locale '{}'", locale)))?;

    tracing::info!(locale = %locale, "content updated");
    revalidate(state.revalidator.as_ref(), &RevalidationScope::Content(locale)).await;

    Ok(updated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Stored,
    Default,
}

/// What the public site renders for one locale
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    pub locale: Locale,
    pub source: ContentSource,
    #[serde(flatten)]
    pub content: ContentBody,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Stored document first, built-in copy second. A store failure degrades to
/// the built-in copy instead of failing the page.
pub async fn resolve_content(store: &dyn Store, locale: Locale) -> ContentView {
    match store.get_content(locale).await {
        Ok(Some(content)) => {
            return ContentView {
                locale,
                source: ContentSource::Stored,
                content: content.body,
                updated_at: Some(content.updated_at),
            };
        }
        Ok(None) => {
            tracing::debug!(locale = %locale, "content not found in store, using defaults");
        }
        Err(e) => {
            tracing::error!(locale = %locale, error = %e, "failed to load content, using defaults");
        }
    }

    ContentView {
        locale,
        source: ContentSource::Default,
        content: default_content(locale),
        updated_at: None,
    }
}

// ============================================================================
// Project translations
// ============================================================================

pub async fn get_project_translation(
    store: &dyn Store,
    locale: Locale,
) -> AppResult<ProjectTranslation> {
    Ok(store
        .get_project_translation(locale)
        .await?
        .unwrap_or_else(|| ProjectTranslation {
            locale,
            strings: default_project_strings(locale),
            id_mapping: Default::default(),
            updated_at: Utc::now(),
        }))
}

pub async fn put_project_translation(
    state: &AppState,
    locale: Locale,
    mut payload: Value,
) -> AppResult<ProjectTranslation> {
    strip_server_fields(&mut payload);
    let strings = payload
        .get("strings")
        .cloned()
        .map(serde_json::from_value::<ProjectStrings>)
        .transpose()
        .map_err(|e| AppError::validation(format!("invalid strings: {}", e)))?;
    let id_mapping = payload
        .get("idMapping")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AppError::validation(format!("invalid idMapping: {}", e)))?;

    let current = get_project_translation(state.store.as_ref(), locale).await?;
    let updated = ProjectTranslation {
        locale,
        strings: strings.unwrap_or(current.strings),
        id_mapping: id_mapping.unwrap_or(current.id_mapping),
        updated_at: Utc::now(),
    };
    let stored = state.store.put_project_translation(updated).await?;

    revalidate(state.revalidator.as_ref(), &RevalidationScope::Projects(locale)).await;
    Ok(stored)
}

// ============================================================================
// Seeding
// ============================================================================

/// Creates the per-locale singletons that must exist before admins can edit
pub async fn seed_defaults(store: &dyn Store) -> AppResult<()> {
    let now = Utc::now();
    for locale in Locale::ALL {
        let created = store
            .insert_content_if_missing(Content {
                locale,
                body: default_content(locale),
                created_at: now,
                updated_at: now,
            })
            .await?;
        if created {
            tracing::info!(locale = %locale, "seeded default content");
        }

        if store.get_project_translation(locale).await?.is_none() {
            store
                .put_project_translation(ProjectTranslation {
                    locale,
                    strings: default_project_strings(locale),
                    id_mapping: Default::default(),
                    updated_at: now,
                })
                .await?;
            tracing::info!(locale = %locale, "seeded default project strings");
        }
    }
    Ok(())
}

fn nav(items: &[(&str, &str)]) -> Vec<NavLink> {
    items
        .iter()
        .enumerate()
        .map(|(i, (label, url))| NavLink {
            label: label.to_string(),
            url: url.to_string(),
            order: i as i32,
        })
        .collect()
}

pub fn default_content(locale: Locale) -> ContentBody {
    match locale {
        Locale::Tr => ContentBody {
            navigation: nav(&[
                ("Ana Sayfa", "/tr"),
                ("Hakkımda", "/tr#about"),
                ("Projeler", "/tr/projects"),
                ("İletişim", "/tr#contact"),
            ]),
            hero: HeroSection {
                title: "Merhaba".to_string(),
                subtitle: "Tasarım ve üretim".to_string(),
                description: "Seçilmiş çalışmalarımı keşfedin.".to_string(),
                cta_text: "Projeleri gör".to_string(),
                cta_link: "/tr/projects".to_string(),
                image: None,
            },
            about: AboutSection {
                title: "Hakkımda".to_string(),
                paragraphs: vec!["Kısa bir tanıtım metni.".to_string()],
                image: None,
            },
            skills: SkillsSection {
                title: "Yetenekler".to_string(),
                description: String::new(),
                items: vec![SkillItem {
                    name: "Tasarım".to_string(),
                    level: Some(90),
                    icon: None,
                }],
            },
            expertise: ExpertiseSection {
                title: "Uzmanlık".to_string(),
                description: String::new(),
                items: vec![ExpertiseItem {
                    title: "Ürün tasarımı".to_string(),
                    description: "Fikirden üretime.".to_string(),
                    icon: None,
                }],
            },
            contact: ContactSection {
                title: "İletişim".to_string(),
                description: "Bir projeniz mi var? Yazın.".to_string(),
                form_name_label: "Adınız".to_string(),
                form_email_label: "E-posta".to_string(),
                form_message_label: "Mesajınız".to_string(),
                form_submit_label: "Gönder".to_string(),
                ..ContactSection::default()
            },
            footer: FooterSection {
                copyright: "Tüm hakları saklıdır.".to_string(),
                ..FooterSection::default()
            },
        },
        Locale::En => ContentBody {
            navigation: nav(&[
                ("Home", "/en"),
                ("About", "/en#about"),
                ("Projects", "/en/projects"),
                ("Contact", "/en#contact"),
            ]),
            hero: HeroSection {
                title: "Hello".to_string(),
                subtitle: "Design and making".to_string(),
                description: "Explore a selection of my work.".to_string(),
                cta_text: "See projects".to_string(),
                cta_link: "/en/projects".to_string(),
                image: None,
            },
            about: AboutSection {
                title: "About".to_string(),
                paragraphs: vec!["A short introduction.".to_string()],
                image: None,
            },
            skills: SkillsSection {
                title: "Skills".to_string(),
                description: String::new(),
                items: vec![SkillItem {
                    name: "Design".to_string(),
                    level: Some(90),
                    icon: None,
                }],
            },
            expertise: ExpertiseSection {
                title: "Expertise".to_string(),
                description: String::new(),
                items: vec![ExpertiseItem {
                    title: "Product design".to_string(),
                    description: "From idea to production.".to_string(),
                    icon: None,
                }],
            },
            contact: ContactSection {
                title: "Contact".to_string(),
                description: "Have a project in mind? Get in touch.".to_string(),
                form_name_label: "Name".to_string(),
                form_email_label: "Email".to_string(),
                form_message_label: "Message".to_string(),
                form_submit_label: "Send".to_string(),
                ..ContactSection::default()
            },
            footer: FooterSection {
                copyright: "All rights reserved.".to_string(),
                ..FooterSection::default()
            },
        },
    }
}

pub fn default_project_strings(locale: Locale) -> ProjectStrings {
    match locale {
        Locale::Tr => ProjectStrings {
            title: "Projeler".to_string(),
            subtitle: "Seçilmiş çalışmalar".to_string(),
            view_details: "Detayları gör".to_string(),
            back_to_projects: "Projelere dön".to_string(),
            technologies_label: "Teknolojiler".to_string(),
            all_technologies: "Tümü".to_string(),
            filter_label: "Filtrele".to_string(),
            no_projects: "Henüz proje yok.".to_string(),
            previous: "Önceki".to_string(),
            next: "Sonraki".to_string(),
            page: "Sayfa".to_string(),
            of: "/".to_string(),
        },
        Locale::En => ProjectStrings {
            title: "Projects".to_string(),
            subtitle: "Selected work".to_string(),
            view_details: "View details".to_string(),
            back_to_projects: "Back to projects".to_string(),
            technologies_label: "Technologies".to_string(),
            all_technologies: "All".to_string(),
            filter_label: "Filter".to_string(),
            no_projects: "No projects yet.".to_string(),
            previous: "Previous".to_string(),
            next: "Next".to_string(),
            page: "Page".to_string(),
            of: "of".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::TestContext;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_strip_server_fields() {
        let mut payload = json!({
            "_id": "x", "__v": 3, "locale": "en", "createdAt": "then",
            "hero": { "title": "Hi" }
        });
        strip_server_fields(&mut payload);
        assert_eq!(payload, json!({ "hero": { "title": "Hi" } }));
    }

    #[test]
    fn test_parse_body_rejects_bad_navigation_url() {
        let result = parse_body(json!({
            "navigation": [{ "label": "Home", "url": "javascript:alert(1)" }]
        }));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_body_rejects_unknown_section() {
        assert!(parse_body(json!({ "banner": {} })).is_err());
    }

    #[test]
    fn test_default_content_validates() {
        for locale in Locale::ALL {
            validate_body(&default_content(locale)).unwrap();
        }
    }

    #[tokio::test]
    async fn test_get_content_not_found_before_seeding() {
        let store = MemoryStore::new();
        let result = get_content(&store, Locale::Tr).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_put_content_requires_existing_document() {
        let ctx = TestContext::new();
        let result = put_content(&ctx.state, Locale::En, json!({})).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(ctx.revalidator.paths().is_empty());
    }

    #[tokio::test]
    async fn test_put_content_writes_and_revalidates() {
        let ctx = TestContext::new();
        seed_defaults(ctx.store.as_ref()).await.unwrap();

        let updated = put_content(
            &ctx.state,
            Locale::En,
            json!({ "_id": "ignored", "locale": "tr", "hero": { "title": "Welcome" } }),
        )
        .await
        .unwrap();

        assert_eq!(updated.locale, Locale::En);
        assert_eq!(updated.body.hero.title, "Welcome");
        assert!(ctx.revalidator.paths().contains(&"/en".to_string()));
        assert!(ctx.revalidator.tags().contains(&"content-en".to_string()));

        let tr = get_content(ctx.store.as_ref(), Locale::Tr).await.unwrap();
        assert_eq!(tr.body.hero.title, "Merhaba");
    }

    #[tokio::test]
    async fn test_put_content_keeps_sections_left_out() {
        let ctx = TestContext::new();
        seed_defaults(ctx.store.as_ref()).await.unwrap();
        let before = get_content(ctx.store.as_ref(), Locale::En).await.unwrap();
        assert!(!before.body.navigation.is_empty());

        let updated = put_content(&ctx.state, Locale::En, json!({ "hero": { "title": "Welcome" } }))
            .await
            .unwrap();

        assert_eq!(updated.body.hero.title, "Welcome");
        assert_eq!(updated.body.navigation, before.body.navigation);
        assert_eq!(updated.body.about, before.body.about);
        assert_eq!(updated.body.footer, before.body.footer);
    }

    #[tokio::test]
    async fn test_put_content_rejects_non_object_payload() {
        let ctx = TestContext::new();
        seed_defaults(ctx.store.as_ref()).await.unwrap();
        let result = put_content(&ctx.state, Locale::Tr, json!(["hero"])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_resolve_content_prefers_stored_then_default() {
        let store = MemoryStore::new();
        let view = resolve_content(&store, Locale::Tr).await;
        assert_eq!(view.source, ContentSource::Default);
        assert_eq!(view.content.hero.title, "Merhaba");

        seed_defaults(&store).await.unwrap();
        store
            .update_content(
                Locale::Tr,
                ContentBody {
                    hero: HeroSection {
                        title: "Selam".to_string(),
                        ..HeroSection::default()
                    },
                    ..ContentBody::default()
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let view = resolve_content(&store, Locale::Tr).await;
        assert_eq!(view.source, ContentSource::Stored);
        assert_eq!(view.content.hero.title, "Selam");
    }

    #[tokio::test]
    async fn test_seed_defaults_is_idempotent() {
        let store = MemoryStore::new();
        seed_defaults(&store).await.unwrap();
        store
            .update_content(Locale::En, ContentBody::default(), Utc::now())
            .await
            .unwrap();
        seed_defaults(&store).await.unwrap();
        let en = get_content(&store, Locale::En).await.unwrap();
        assert!(en.body.hero.title.is_empty());
    }

    #[tokio::test]
    async fn test_put_project_translation_keeps_unspecified_parts() {
        let ctx = TestContext::new();
        seed_defaults(ctx.store.as_ref()).await.unwrap();
        let updated = put_project_translation(
            &ctx.state,
            Locale::Tr,
            json!({ "idMapping": { "porselen-tabak": "porcelain-plate" } }),
        )
        .await
        .unwrap();
        assert_eq!(updated.strings.title, "Projeler");
        assert_eq!(updated.id_mapping["porselen-tabak"], "porcelain-plate");
    }
}
