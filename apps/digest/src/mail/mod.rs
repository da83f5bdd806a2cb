//! Mail transport: hands the finished digest to the bulk-mail HTTP service.
//!
//! Sending is a single attempt. The pipeline logs a failure and moves on; the
//! document stays on disk so it can be sent by hand.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail server rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("No recipients given")]
    NoRecipients,
}

/// One outgoing digest mail.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HttpMailTransport
// ────────────────────────────────────────────────────────────────────────────

/// Posts the message as `multipart/form-data` to the bulk-mail endpoint.
///
/// Form fields: `toMails` (comma-joined recipients), `subject`, `body`, and the
/// PDF as the `attachment` file part.
#[derive(Clone)]
pub struct HttpMailTransport {
    client: Client,
    endpoint: String,
}

impl HttpMailTransport {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn build_form(message: &MailMessage) -> Result<Form, MailError> {
        let attachment = Part::bytes(message.attachment.clone())
            .file_name(message.attachment_name.clone())
            .mime_str("application/pdf")?;

        Ok(Form::new()
            .text("toMails", message.recipients.join(","))
            .text("subject", message.subject.clone())
            .text("body", message.body.clone())
            .part("attachment", attachment))
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if message.recipients.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let form = Self::build_form(message)?;
        debug!(
            endpoint = %self.endpoint,
            recipients = message.recipients.len(),
            attachment_bytes = message.attachment.len(),
            "Posting digest to mail server"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!(recipients = message.recipients.len(), "Mail sent");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
