/// Notifier used when mail delivery is not configured
///
/// Missing SMTP settings are not fatal at startup. Accounts are still
/// provisioned; each attempted notification is logged as an error so the
/// operator can follow up by hand.

use super::{AccessEmail, Notifier, NotifyOutcome};
use async_trait::async_trait;

/// Notifier that records every attempt as undeliverable
#[derive(Debug, Clone)]
pub struct DisabledNotifier {
    reason: String,
}

impl DisabledNotifier {
    /// Creates the notifier with the reason mail is off
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why notifications are disabled
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send_access_email(&self, email: &AccessEmail) -> NotifyOutcome {
        tracing::error!(
            to = %email.email,
            reason = %self.reason,
            "SMTP is not configured; access email will not be sent"
        );

        NotifyOutcome::Disabled {
            reason: self.reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::generate_random_password;

    #[tokio::test]
    async fn test_every_attempt_is_disabled() {
        let notifier = DisabledNotifier::new("missing SMTP_SERVER");
        let email = AccessEmail::new("Ana", "ana@example.com", generate_random_password(8));

        for _ in 0..2 {
            let outcome = notifier.send_access_email(&email).await;
            assert_eq!(
                outcome,
                NotifyOutcome::Disabled {
                    reason: "missing SMTP_SERVER".to_string()
                }
            );
        }
        assert_eq!(notifier.reason(), "missing SMTP_SERVER");
    }
}
