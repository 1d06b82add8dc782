mod smtp;

use async_trait::async_trait;
pub use smtp::SmtpEmailSender;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::ports::EmailSender;
use crate::user::errors::EmailDeliveryError;

/// Email sender used when no mail transport is configured.
///
/// The reset token is written to the log instead of a mailbox, which keeps
/// the reset flow usable in development.
pub struct LoggingEmailSender {
    from_address: String,
}

impl LoggingEmailSender {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        full_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailDeliveryError> {
        tracing::warn!(
            from = %self.from_address,
            to = %to,
            recipient_name = full_name,
            reset_token,
            "Mail transport not configured, logging password reset token"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_sender_always_succeeds() {
        let sender = LoggingEmailSender::new("noreply@school.com");
        let to = EmailAddress::new("alice@s.edu".to_string()).unwrap();

        assert!(sender
            .send_password_reset(&to, "Alice", "token")
            .await
            .is_ok());
    }
}
