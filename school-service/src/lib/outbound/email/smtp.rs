use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::Address;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::EmailConfig;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::ports::EmailSender;
use crate::user::errors::EmailDeliveryError;

const RESET_SUBJECT: &str = "Password reset request";

/// Email sender that delivers reset tokens over SMTP with STARTTLS.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build a sender from the `email` configuration section.
    ///
    /// No connection is opened here; the transport connects on first send.
    ///
    /// # Errors
    /// * `NotConfigured` - No host, or a username without a password
    /// * `InvalidAddress` - `from_address` is not a mailbox
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailDeliveryError> {
        let host = config
            .smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or(EmailDeliveryError::NotConfigured)?;

        let from = config.from_address.parse::<Mailbox>().map_err(|e| {
            EmailDeliveryError::InvalidAddress(format!("{}: {}", config.from_address, e))
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| EmailDeliveryError::DeliveryFailed(e.to_string()))?
            .port(config.smtp_port);

        match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder =
                    builder.credentials(Credentials::new(username.clone(), password.clone()));
            }
            (Some(_), None) => return Err(EmailDeliveryError::NotConfigured),
            _ => {}
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn reset_message(
        &self,
        to: &EmailAddress,
        full_name: &str,
        reset_token: &str,
    ) -> Result<Message, EmailDeliveryError> {
        let address = to
            .as_str()
            .parse::<Address>()
            .map_err(|e| EmailDeliveryError::InvalidAddress(format!("{}: {}", to, e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(Some(full_name.to_string()), address))
            .subject(RESET_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(reset_body(full_name, reset_token))
            .map_err(|e| EmailDeliveryError::DeliveryFailed(e.to_string()))
    }
}

fn reset_body(full_name: &str, reset_token: &str) -> String {
    format!(
        "Hello {},\n\n\
         Use the following token to reset your password:\n\n\
         {}\n\n\
         If you did not request a password reset you can ignore this email.\n",
        full_name, reset_token
    )
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        full_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailDeliveryError> {
        let message = self.reset_message(to, full_name, reset_token)?;

        self.transport.send(message).await.map_err(|e| {
            tracing::warn!(to = %to, error = %e, "SMTP delivery failed");
            EmailDeliveryError::DeliveryFailed(e.to_string())
        })?;

        tracing::info!(to = %to, "Password reset email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_config(host: Option<&str>) -> EmailConfig {
        EmailConfig {
            from_address: "School <noreply@school.com>".to_string(),
            smtp_host: host.map(str::to_string),
            smtp_port: 587,
            smtp_username: Some("noreply@school.com".to_string()),
            smtp_password: Some("smtp-password".to_string()),
        }
    }

    #[tokio::test]
    async fn test_missing_host_is_not_configured() {
        let missing = SmtpEmailSender::from_config(&email_config(None));
        let blank = SmtpEmailSender::from_config(&email_config(Some("  ")));

        assert!(matches!(missing, Err(EmailDeliveryError::NotConfigured)));
        assert!(matches!(blank, Err(EmailDeliveryError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_username_without_password_is_not_configured() {
        let mut config = email_config(Some("smtp.school.com"));
        config.smtp_password = None;

        let result = SmtpEmailSender::from_config(&config);
        assert!(matches!(result, Err(EmailDeliveryError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_invalid_from_address() {
        let mut config = email_config(Some("smtp.school.com"));
        config.from_address = "not a mailbox".to_string();

        let result = SmtpEmailSender::from_config(&config);
        assert!(matches!(result, Err(EmailDeliveryError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_reset_message_carries_token() {
        let sender =
            SmtpEmailSender::from_config(&email_config(Some("smtp.school.com"))).unwrap();
        let to = EmailAddress::new("alice@s.edu".to_string()).unwrap();

        let message = sender
            .reset_message(&to, "Alice", "reset-token-123")
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("<alice@s.edu>"));
        assert!(formatted.contains("<noreply@school.com>"));
        assert!(formatted.contains("Subject: Password reset request"));
        assert!(formatted.contains("reset-token-123"));
    }
}
