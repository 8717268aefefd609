/// Access-credential notifications
///
/// After an account is provisioned, the buyer receives one email with the
/// access link, their login and the generated password. Delivery is best
/// effort: a [`Notifier`] never returns an error, it reports a
/// [`NotifyOutcome`] that the caller logs. By the time a notification is
/// attempted the account is already committed, so nothing upstream can or
/// should unwind on failure.
///
/// # Implementations
///
/// - [`SmtpNotifier`]: sends through an SMTP relay using `lettre`
/// - [`DisabledNotifier`]: installed when mail settings are incomplete
///
/// # Example
///
/// ```no_run
/// use accessgate_shared::auth::password::generate_random_password;
/// use accessgate_shared::notify::{AccessEmail, DisabledNotifier, Notifier};
///
/// # async fn example() {
/// let notifier = DisabledNotifier::new("SMTP_SERVER is not set");
/// let email = AccessEmail::new("Ana Silva", "ana@example.com", generate_random_password(8));
///
/// let outcome = notifier.send_access_email(&email).await;
/// assert!(!outcome.is_sent());
/// # }
/// ```

pub mod disabled;
pub mod smtp;

pub use disabled::DisabledNotifier;
pub use smtp::{SmtpConfig, SmtpNotifier};

use crate::auth::password::GeneratedPassword;
use askama::Template;
use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;

/// Subject line of the access email
pub const ACCESS_EMAIL_SUBJECT: &str = "Your access details";

/// Result of a notification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The relay accepted the message
    Sent,

    /// Delivery was attempted and failed
    Failed {
        /// What went wrong (connectivity, auth, bad address, ...)
        reason: String,
    },

    /// Notifications are switched off by configuration
    Disabled {
        /// Why notifications are off
        reason: String,
    },
}

impl NotifyOutcome {
    /// Whether the message was handed to the relay
    pub fn is_sent(&self) -> bool {
        matches!(self, NotifyOutcome::Sent)
    }
}

impl fmt::Display for NotifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyOutcome::Sent => write!(f, "sent"),
            NotifyOutcome::Failed { reason } => write!(f, "failed: {}", reason),
            NotifyOutcome::Disabled { reason } => write!(f, "disabled: {}", reason),
        }
    }
}

/// Sends access credentials to a newly provisioned buyer
///
/// Implementations must catch every failure internally and report it through
/// [`NotifyOutcome`].
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers the access email
    async fn send_access_email(&self, email: &AccessEmail) -> NotifyOutcome;
}

/// Content of one access email
///
/// `Debug` never shows the password.
#[derive(Debug, Clone)]
pub struct AccessEmail {
    /// Buyer display name
    pub name: String,

    /// Recipient address, also the login
    pub email: String,

    /// Generated plaintext password
    pub password: GeneratedPassword,
}

/// Branding inserted into the access email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailBranding {
    /// Where the buyer signs in
    pub access_url: String,

    /// Name used in the signature line
    pub team_name: String,
}

impl Default for MailBranding {
    fn default() -> Self {
        Self {
            access_url: "https://usiggfuq.manus.space".to_string(),
            team_name: "Fresley".to_string(),
        }
    }
}

/// Subject and bodies ready to hand to a transport
///
/// Both bodies carry the plaintext password, so they stay wrapped until the
/// transport needs them.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// Subject line
    pub subject: String,

    /// HTML body
    pub html: SecretString,

    /// Plain text alternative
    pub text: SecretString,
}

#[derive(Template)]
#[template(path = "email/access.html")]
struct AccessEmailHtml<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    access_url: &'a str,
    team_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/access.txt")]
struct AccessEmailText<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    access_url: &'a str,
    team_name: &'a str,
}

impl AccessEmail {
    /// Creates the email for one buyer
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: GeneratedPassword) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password,
        }
    }

    /// Renders subject, HTML and plain text bodies
    ///
    /// The buyer name comes straight from the payment platform; the HTML
    /// template escapes every interpolated value.
    ///
    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render
    pub fn render(&self, branding: &MailBranding) -> Result<RenderedEmail, askama::Error> {
        let password = self.password.expose();

        let html = AccessEmailHtml {
            name: &self.name,
            email: &self.email,
            password,
            access_url: &branding.access_url,
            team_name: &branding.team_name,
        }
        .render()?;

        let text = AccessEmailText {
            name: &self.name,
            email: &self.email,
            password,
            access_url: &branding.access_url,
            team_name: &branding.team_name,
        }
        .render()?;

        Ok(RenderedEmail {
            subject: ACCESS_EMAIL_SUBJECT.to_string(),
            html: SecretString::from(html),
            text: SecretString::from(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::generate_random_password;
    use secrecy::ExposeSecret;

    fn sample_email(name: &str) -> AccessEmail {
        AccessEmail::new(name, "ana@example.com", generate_random_password(8))
    }

    #[test]
    fn test_render_contains_credentials() {
        let email = sample_email("Ana Silva");
        let rendered = email.render(&MailBranding::default()).unwrap();
        let html = rendered.html.expose_secret();
        let text = rendered.text.expose_secret();

        assert_eq!(rendered.subject, ACCESS_EMAIL_SUBJECT);
        assert!(html.contains("Hello, Ana Silva!"));
        assert!(html.contains("ana@example.com"));
        assert!(html.contains(email.password.expose()));
        assert!(text.contains(email.password.expose()));
        assert!(text.contains("https://usiggfuq.manus.space"));
    }

    #[test]
    fn test_render_uses_branding() {
        let branding = MailBranding {
            access_url: "https://app.example.com/login".to_string(),
            team_name: "Example".to_string(),
        };
        let rendered = sample_email("Ana").render(&branding).unwrap();

        assert!(rendered
            .html
            .expose_secret()
            .contains(r#"<a href="https://app.example.com/login">"#));
        assert!(rendered.html.expose_secret().contains("The Example team."));
        assert!(rendered.text.expose_secret().contains("The Example team."));
    }

    #[test]
    fn test_render_escapes_name_in_html() {
        let rendered = sample_email("<script>alert('x')</script>")
            .render(&MailBranding::default())
            .unwrap();
        let html = rendered.html.expose_secret();

        assert!(!html.contains("<script"));
        assert!(!html.contains("</script"));
        assert!(html.contains("script"));
        assert!(html.contains("alert("));
    }

    #[test]
    fn test_text_body_is_not_escaped() {
        let rendered = sample_email("Ana & Bruno").render(&MailBranding::default()).unwrap();

        assert!(rendered.text.expose_secret().contains("Hello, Ana & Bruno!"));
        assert!(!rendered.html.expose_secret().contains("Ana & Bruno"));
    }

    #[test]
    fn test_debug_never_shows_password() {
        let email = sample_email("Ana Silva");
        let rendered = email.render(&MailBranding::default()).unwrap();

        assert!(!format!("{:?}", email).contains(email.password.expose()));
        assert!(!format!("{:?}", rendered).contains(email.password.expose()));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(NotifyOutcome::Sent.to_string(), "sent");
        assert!(NotifyOutcome::Sent.is_sent());

        let failed = NotifyOutcome::Failed {
            reason: "connection refused".to_string(),
        };
        assert_eq!(failed.to_string(), "failed: connection refused");
        assert!(!failed.is_sent());
    }
}
