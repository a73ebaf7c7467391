//! Shared handler state.

use std::sync::Arc;

use crate::config::{
    AppConfig, CONTACT_RATE_LIMIT, CONTACT_RATE_WINDOW_SECS, LOGIN_RATE_LIMIT,
    LOGIN_RATE_WINDOW_SECS,
};
use crate::mailer::{LogMailer, Mailer, ResendMailer};
use crate::rate_limit::RateLimiter;
use crate::revalidate::{HttpRevalidator, LogRevalidator, Revalidator};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub revalidator: Arc<dyn Revalidator>,
    pub mailer: Arc<dyn Mailer>,
    pub contact_limiter: Arc<RateLimiter>,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires the collaborators the configuration asks for
    pub fn from_config(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let revalidator: Arc<dyn Revalidator> = match &config.revalidate_url {
            Some(url) => {
                tracing::info!(url = %url, "frontend revalidation enabled");
                Arc::new(HttpRevalidator::new(url.clone(), config.revalidate_secret.clone()))
            }
            None => {
                tracing::info!("REVALIDATE_URL not set. Revalidation will only be logged.");
                Arc::new(LogRevalidator)
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.email_api_key {
            Some(key) => Arc::new(ResendMailer::new(key.clone())),
            None => {
                tracing::info!("EMAIL_API_KEY not set. Contact e-mails will only be logged.");
                Arc::new(LogMailer)
            }
        };

        Self::new(config, store, revalidator, mailer)
    }

    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        revalidator: Arc<dyn Revalidator>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            revalidator,
            mailer,
            contact_limiter: Arc::new(RateLimiter::in_memory(
                CONTACT_RATE_LIMIT,
                CONTACT_RATE_WINDOW_SECS,
            )),
            login_limiter: Arc::new(RateLimiter::in_memory(
                LOGIN_RATE_LIMIT,
                LOGIN_RATE_WINDOW_SECS,
            )),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::mailer::testing::RecordingMailer;
    use crate::revalidate::testing::RecordingRevalidator;
    use crate::store::MemoryStore;

    pub const TEST_SECRET: &str = "test-secret";

    /// State over a fresh in-memory store with recording collaborators
    pub struct TestContext {
        pub state: AppState,
        pub store: Arc<MemoryStore>,
        pub revalidator: Arc<RecordingRevalidator>,
        pub mailer: Arc<RecordingMailer>,
        pub upload_dir: tempfile::TempDir,
    }

    impl TestContext {
        pub fn new() -> Self {
            Self::with_config(|_| {})
        }

        pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
            let upload_dir = tempfile::tempdir().unwrap();
            let mut config = AppConfig {
                jwt_secret: Some(TEST_SECRET.to_string()),
                content_api_secret: Some("content-secret".to_string()),
                contact_email: Some("owner@example.com".to_string()),
                upload_dir: upload_dir.path().to_path_buf(),
                ..AppConfig::default()
            };
            adjust(&mut config);

            let store = Arc::new(MemoryStore::new());
            let revalidator = Arc::new(RecordingRevalidator::default());
            let mailer = Arc::new(RecordingMailer::default());
            let state = AppState::new(config, store.clone(), revalidator.clone(), mailer.clone());
            Self {
                state,
                store,
                revalidator,
                mailer,
                upload_dir,
            }
        }
    }
}
