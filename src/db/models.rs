//! Database Models - the documents held by the store, shared by every backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Locale
// ============================================================================

/// One of the two supported content languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Tr,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Tr, Locale::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Tr => "tr",
            Locale::En => "en",
        }
    }

    /// The other half of a bilingual pair
    pub fn sibling(&self) -> Locale {
        match self {
            Locale::Tr => Locale::En,
            Locale::En => Locale::Tr,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedLocale(pub String);

impl fmt::Display for UnsupportedLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported locale '{}', expected one of: tr, en", self.0)
    }
}

impl std::error::Error for UnsupportedLocale {}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" => Ok(Locale::Tr),
            "en" => Ok(Locale::En),
            _ => Err(UnsupportedLocale(s.to_string())),
        }
    }
}

// ============================================================================
// Content
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NavLink {
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct HeroSection {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_text: String,
    pub cta_link: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AboutSection {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SkillItem {
    pub name: String,
    pub level: Option<u8>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SkillsSection {
    pub title: String,
    pub description: String,
    pub items: Vec<SkillItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ExpertiseItem {
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ExpertiseSection {
    pub title: String,
    pub description: String,
    pub items: Vec<ExpertiseItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ContactSection {
    pub title: String,
    pub description: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub form_name_label: String,
    pub form_email_label: String,
    pub form_message_label: String,
    pub form_submit_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FooterSection {
    pub copyright: String,
    pub links: Vec<NavLink>,
    pub social: Vec<SocialLink>,
}

/// The editable part of a content document. Unknown keys are rejected so a
/// malformed admin payload never reaches the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ContentBody {
    pub navigation: Vec<NavLink>,
    pub hero: HeroSection,
    pub about: AboutSection,
    pub skills: SkillsSection,
    pub expertise: ExpertiseSection,
    pub contact: ContactSection,
    pub footer: FooterSection,
}

/// Localized page copy, one document per locale
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub locale: Locale,
    #[serde(flatten)]
    pub body: ContentBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Projects
// ============================================================================

/// Progress of the TR/EN pairing steps for one `originalId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingStatus {
    Synced,
    Partial,
    Failed,
}

impl PairingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingStatus::Synced => "synced",
            PairingStatus::Partial => "partial",
            PairingStatus::Failed => "failed",
        }
    }
}

impl FromStr for PairingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(PairingStatus::Synced),
            "partial" => Ok(PairingStatus::Partial),
            "failed" => Ok(PairingStatus::Failed),
            other => Err(format!("unknown pairing status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSeo {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub og_title: String,
    pub og_description: String,
    pub og_image: Option<String>,
}

/// A portfolio entry in one locale. `id` is the URL slug; `original_id` links
/// the TR document to its EN twin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub doc_id: Uuid,
    pub locale: Locale,
    pub id: String,
    pub original_id: String,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub technologies: Vec<String>,
    pub order: Option<i32>,
    pub status: bool,
    pub seo: ProjectSeo,
    pub pairing_status: PairingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Project translations
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ProjectStrings {
    pub title: String,
    pub subtitle: String,
    pub view_details: String,
    pub back_to_projects: String,
    pub technologies_label: String,
    pub all_technologies: String,
    pub filter_label: String,
    pub no_projects: String,
    pub previous: String,
    pub next: String,
    pub page: String,
    pub of: String,
}

/// Shared strings for the project listing/detail pages of one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTranslation {
    pub locale: Locale,
    pub strings: ProjectStrings,
    /// TR slug -> EN slug, used by the language switcher
    pub id_mapping: BTreeMap<String, String>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Site config
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SeoDefaults {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalizedSeo {
    pub tr: SeoDefaults,
    pub en: SeoDefaults,
}

impl LocalizedSeo {
    pub fn for_locale(&self, locale: Locale) -> &SeoDefaults {
        match locale {
            Locale::Tr => &self.tr,
            Locale::En => &self.en,
        }
    }
}

/// Singleton site settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteConfig {
    pub contact_email: String,
    pub display_email: String,
    pub logo: Option<String>,
    pub seo: LocalizedSeo,
    pub projects_per_page: u32,
    pub robots_index: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Contact forms
// ============================================================================

/// One inbound message from the public contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Users
// ============================================================================

/// Admin account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse_and_sibling() {
        assert_eq!("TR".parse::<Locale>().unwrap(), Locale::Tr);
        assert_eq!("en".parse::<Locale>().unwrap().sibling(), Locale::Tr);
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn test_content_body_rejects_unknown_fields() {
        let result = serde_json::from_value::<ContentBody>(serde_json::json!({
            "hero": { "title": "Merhaba", "bogus": true }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_content_body_accepts_sparse_sections() {
        let body: ContentBody = serde_json::from_value(serde_json::json!({
            "navigation": [{ "label": "Projeler", "url": "/tr/projects" }]
        }))
        .unwrap();
        assert_eq!(body.navigation[0].order, 0);
        assert!(body.hero.title.is_empty());
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            is_admin: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("isAdmin"));
    }

    #[test]
    fn test_project_serializes_slug_and_row_id() {
        let project = Project {
            doc_id: Uuid::nil(),
            locale: Locale::Tr,
            id: "porselen-tabak".to_string(),
            original_id: "abc".to_string(),
            title: "Porselen Tabak".to_string(),
            description: String::new(),
            images: vec![],
            technologies: vec![],
            order: None,
            status: true,
            seo: ProjectSeo::default(),
            pairing_status: PairingStatus::Synced,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["id"], "porselen-tabak");
        assert_eq!(value["originalId"], "abc");
        assert_eq!(value["pairingStatus"], "synced");
        assert!(value.get("_id").is_some());
    }
}
