//! Environment-driven application configuration.

use std::path::PathBuf;

/// Contact form quota: requests per window per client IP
pub const CONTACT_RATE_LIMIT: u32 = 5;
pub const CONTACT_RATE_WINDOW_SECS: i64 = 60;

/// Login quota per client IP
pub const LOGIN_RATE_LIMIT: u32 = 10;
pub const LOGIN_RATE_WINDOW_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    /// Bearer-token signing secret. Gated routes fail closed without it.
    pub jwt_secret: Option<String>,
    /// Shared secret for the header-gated content write endpoint
    pub content_api_secret: Option<String>,
    pub site_url: String,
    pub upload_dir: PathBuf,
    pub revalidate_url: Option<String>,
    pub revalidate_secret: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub contact_email: Option<String>,
    /// Seed account for the in-memory store
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            database_url: non_empty_var("DATABASE_URL"),
            jwt_secret: non_empty_var("JWT_SECRET"),
            content_api_secret: non_empty_var("CONTENT_API_SECRET"),
            site_url: std::env::var("SITE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            revalidate_url: non_empty_var("REVALIDATE_URL"),
            revalidate_secret: non_empty_var("REVALIDATE_SECRET"),
            email_api_key: non_empty_var("EMAIL_API_KEY"),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Portfolio <noreply@localhost>".to_string()),
            contact_email: non_empty_var("CONTACT_EMAIL"),
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    /// Development defaults with no external collaborators configured
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_url: None,
            jwt_secret: None,
            content_api_secret: None,
            site_url: "http://localhost:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            revalidate_url: None,
            revalidate_secret: None,
            email_api_key: None,
            email_from: "Portfolio <noreply@localhost>".to_string(),
            contact_email: None,
            admin_username: None,
            admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_has_usable_defaults() {
        let config = AppConfig::from_env();
        assert!(config.port > 0);
        assert!(!config.site_url.is_empty());
        assert!(!config.upload_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_default_is_not_production() {
        assert!(!AppConfig::default().is_production());
    }
}
