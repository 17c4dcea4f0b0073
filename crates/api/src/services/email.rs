//! Transactional email.
//!
//! Uses SMTP via lettre for delivery with Askama templates, each message
//! sent as plain text plus HTML. Without SMTP settings the service only logs
//! what it would have sent.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::contact::ContactMessage;

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    code: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    code: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_changed.html")]
struct PasswordChangedHtml<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_changed.txt")]
struct PasswordChangedText<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_notification.html")]
struct ContactNotificationHtml<'a> {
    id: i32,
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    subject: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_notification.txt")]
struct ContactNotificationText<'a> {
    id: i32,
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    subject: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_confirmation.html")]
struct ContactConfirmationHtml<'a> {
    name: &'a str,
    subject: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_confirmation.txt")]
struct ContactConfirmationText<'a> {
    name: &'a str,
    subject: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("enabled", &self.is_enabled())
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl EmailService {
    /// Create the service. `None` gives a log-only service.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Some(mailer),
            from_address: config.from_address.clone(),
        })
    }

    /// A service that logs instead of sending.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            mailer: None,
            from_address: "no-reply@babycash.com".to_string(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Send a password-reset code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        code: &str,
        valid_minutes: i64,
    ) -> Result<(), EmailError> {
        let html = PasswordResetHtml { name, code, valid_minutes }.render()?;
        let text = PasswordResetText { name, code, valid_minutes }.render()?;

        self.send_multipart_email(to, "Baby Cash - Password reset code", &text, &html)
            .await
    }

    /// Confirm that a password was changed.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_changed(&self, to: &str, name: &str) -> Result<(), EmailError> {
        let html = PasswordChangedHtml { name }.render()?;
        let text = PasswordChangedText { name }.render()?;

        self.send_multipart_email(to, "Baby Cash - Your password was changed", &text, &html)
            .await
    }

    /// Tell the store inbox about a new contact message.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact_notification(
        &self,
        admin_email: &str,
        message: &ContactMessage,
    ) -> Result<(), EmailError> {
        let html = ContactNotificationHtml {
            id: message.id.as_i32(),
            name: &message.name,
            email: message.email.as_str(),
            phone: message.phone.as_deref(),
            subject: &message.subject,
            message: &message.message,
        }
        .render()?;
        let text = ContactNotificationText {
            id: message.id.as_i32(),
            name: &message.name,
            email: message.email.as_str(),
            phone: message.phone.as_deref(),
            subject: &message.subject,
            message: &message.message,
        }
        .render()?;

        let subject = format!("New contact message: {}", message.subject);
        self.send_multipart_email(admin_email, &subject, &text, &html)
            .await
    }

    /// Let the sender know their message arrived.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact_confirmation(&self, message: &ContactMessage) -> Result<(), EmailError> {
        let html = ContactConfirmationHtml {
            name: &message.name,
            subject: &message.subject,
        }
        .render()?;
        let text = ContactConfirmationText {
            name: &message.name,
            subject: &message.subject,
        }
        .render()?;

        self.send_multipart_email(
            message.email.as_str(),
            "Baby Cash - We received your message",
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let Some(mailer) = &self.mailer else {
            tracing::info!(to = %to, subject = %subject, "Email disabled, not sending");
            return Ok(());
        };

        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_verification_code_format() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_templates_render() {
        let text = PasswordResetText {
            name: "Ana",
            code: "482913",
            valid_minutes: 15,
        }
        .render()
        .unwrap();
        assert!(text.contains("482913"));
        assert!(text.contains("15 minutes"));

        let html = ContactNotificationHtml {
            id: 7,
            name: "Luisa",
            email: "luisa@example.com",
            phone: None,
            subject: "Pedido <grande>",
            message: "Hola",
        }
        .render()
        .unwrap();
        assert!(html.contains("#7"));
        assert!(!html.contains("Phone"));
        assert!(html.contains("Pedido &#60;grande&#62;") || html.contains("Pedido &lt;grande&gt;"));
    }

    #[tokio::test]
    async fn test_disabled_service_only_logs() {
        let service = EmailService::disabled();
        assert!(!service.is_enabled());
        service
            .send_password_changed("ana@babycash.com", "Ana")
            .await
            .unwrap();
    }
}
