use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::ContactForm;
use crate::error::{AppError, AppResult};
use crate::mailer::contact_notification;
use crate::services::site_config;
use crate::state::AppState;
use crate::store::Store;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_MESSAGE_LENGTH: usize = 5000;
const MAX_USER_AGENT_LENGTH: usize = 512;

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactRequest {
    /// Trimmed copy, or the first rule it breaks
    pub fn validate(self) -> AppResult<Self> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let message = self.message.trim().to_string();

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(AppError::validation("name, email and message are required"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::validation(format!(
                "name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        if email.len() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(&email) {
            return Err(AppError::validation("invalid email address"));
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::validation(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }
        Ok(Self {
            name,
            email,
            message,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub success: bool,
    pub id: Uuid,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Public form submission: quota per client IP, then validation, then the
/// write. The owner notification is best-effort.
pub async fn submit(
    state: &AppState,
    ip: &str,
    user_agent: Option<String>,
    request: ContactRequest,
) -> AppResult<ContactReceipt> {
    let decision = state.contact_limiter.check(ip).await.into_result()?;
    let request = request.validate()?;

    let now = Utc::now();
    let form = ContactForm {
        id: Uuid::new_v4(),
        name: request.name,
        email: request.email,
        message: request.message,
        ip: ip.to_string(),
        user_agent: user_agent.map(|ua| ua.chars().take(MAX_USER_AGENT_LENGTH).collect()),
        is_read: false,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_contact(form.clone()).await?;
    tracing::info!(id = %form.id, ip = %ip, "contact form stored");

    notify_owner(state, &form).await;

    Ok(ContactReceipt {
        success: true,
        id: form.id,
        remaining: decision.remaining,
        reset_at: decision.reset_at,
    })
}

async fn notify_owner(state: &AppState, form: &ContactForm) {
    let to = match &state.config.contact_email {
        Some(address) => address.clone(),
        None => site_config::load(state.store.as_ref()).await.contact_email,
    };
    let email = contact_notification(form, &state.config.email_from, &to);
    if let Err(e) = state.mailer.send(email).await {
        tracing::error!(id = %form.id, error = %e, "failed to send contact notification");
    }
}

pub async fn list(store: &dyn Store) -> AppResult<Vec<ContactForm>> {
    Ok(store.list_contacts().await?)
}

pub async fn mark_read(store: &dyn Store, id: Uuid, is_read: bool) -> AppResult<ContactForm> {
    store
        .set_contact_read(id, is_read)
        .await?
        .ok_or_else(|| AppError::not_found("Contact message not found"))
}

pub async fn delete(store: &dyn Store, id: Uuid) -> AppResult<()> {
    if store.delete_contact(id).await? {
        tracing::info!(id = %id, "contact message deleted");
        Ok(())
    } else {
        Err(AppError::not_found("Contact message not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::TestContext;

    fn request() -> ContactRequest {
        ContactRequest {
            name: " Ayşe ".to_string(),
            email: "ayse@example.com".to_string(),
            message: "Merhaba".to_string(),
        }
    }

    #[test]
    fn test_validate_trims_and_checks_email() {
        let ok = request().validate().unwrap();
        assert_eq!(ok.name, "Ayşe");

        let bad = ContactRequest {
            email: "not-an-email".to_string(),
            ..request()
        };
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));

        let empty = ContactRequest {
            message: "   ".to_string(),
            ..request()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_validate_caps_message_length() {
        let long = ContactRequest {
            message: "a".repeat(MAX_MESSAGE_LENGTH + 1),
            ..request()
        };
        assert!(long.validate().is_err());
    }

    #[tokio::test]
    async fn test_submit_persists_and_notifies() {
        let ctx = TestContext::new();
        let receipt = submit(&ctx.state, "10.0.0.1", Some("curl/8".to_string()), request())
            .await
            .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.remaining, 4);

        let stored = list(ctx.store.as_ref()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].ip, "10.0.0.1");
        assert!(!stored[0].is_read);

        let sent = ctx.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["owner@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_sixth_submission_is_throttled() {
        let ctx = TestContext::new();
        for _ in 0..5 {
            submit(&ctx.state, "10.0.0.2", None, request()).await.unwrap();
        }
        match submit(&ctx.state, "10.0.0.2", None, request()).await {
            Err(AppError::TooManyRequests { remaining, .. }) => assert_eq!(remaining, 0),
            other => panic!("expected throttling, got {:?}", other.map(|r| r.id)),
        }
        // other clients keep their own quota
        submit(&ctx.state, "10.0.0.3", None, request()).await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_read_and_delete() {
        let ctx = TestContext::new();
        let receipt = submit(&ctx.state, "10.0.0.4", None, request()).await.unwrap();

        let read = mark_read(ctx.store.as_ref(), receipt.id, true).await.unwrap();
        assert!(read.is_read);

        delete(ctx.store.as_ref(), receipt.id).await.unwrap();
        assert!(matches!(
            delete(ctx.store.as_ref(), receipt.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            mark_read(ctx.store.as_ref(), receipt.id, false).await,
            Err(AppError::NotFound(_))
        ));
    }
}
