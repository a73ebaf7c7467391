//! Outbound e-mail for contact-form notifications.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::db::models::ContactForm;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String>;
}

/// Sends through the Resend HTTP API
pub struct ResendMailer {
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String> {
        let response = HTTP_CLIENT
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(format!("mail provider returned {}: {}", status, detail))
        }
    }
}

/// Used when no e-mail API key is configured
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String> {
        tracing::info!(
            to = ?email.to,
            subject = %email.subject,
            "email provider not configured, message not sent"
        );
        Ok(())
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Notification for the site owner about a new contact message
pub fn contact_notification(form: &ContactForm, from: &str, to: &str) -> OutgoingEmail {
    let message_html = ammonia::clean(&escape_html(&form.message).replace('\n', "<br>"));
    let html = format!(
        "<h2>New contact message</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Message:</strong></p><p>{}</p>\
         <hr><p><small>IP: {}</small></p>",
        escape_html(&form.name),
        escape_html(&form.email),
        message_html,
        escape_html(&form.ip),
    );

    OutgoingEmail {
        from: from.to_string(),
        to: vec![to.to_string()],
        reply_to: Some(form.email.clone()),
        subject: format!("Portfolio contact: {}", form.name),
        html,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_contact_notification_escapes_markup() {
        let form = ContactForm {
            id: Uuid::new_v4(),
            name: "<b>Ayşe</b>".to_string(),
            email: "ayse@example.com".to_string(),
            message: "Merhaba\n<script>alert(1)</script>".to_string(),
            ip: "127.0.0.1".to_string(),
            user_agent: None,
            is_read: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let email = contact_notification(&form, "site@example.com", "owner@example.com");
        assert!(!email.html.contains("<script>"));
        assert!(!email.html.contains("<b>Ayşe</b>"));
        assert!(email.html.contains("<br>"));
        assert_eq!(email.reply_to.as_deref(), Some("ayse@example.com"));
    }
}
