/// SMTP notifier built on `lettre`
///
/// Port 465 uses implicit TLS (SMTPS); any other port negotiates STARTTLS.
/// The transport is built once and reused for every message; connections are
/// opened lazily when a message is sent.

use super::{AccessEmail, MailBranding, Notifier, NotifyOutcome};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};

/// Port that expects TLS from the first byte
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Errors raised while building the SMTP transport
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
    /// Failed to set up the relay
    #[error("connection setup failed: {0}")]
    Connection(String),

    /// Invalid sender address
    #[error("invalid email address: {0}")]
    Address(String),
}

/// Settings for the SMTP relay
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Relay hostname (e.g., "smtp.gmail.com")
    pub host: String,

    /// Relay port; 465 for implicit TLS, 587 for STARTTLS
    pub port: u16,

    /// Login for the relay
    pub username: String,

    /// Password for the relay
    pub password: SecretString,

    /// Sender address; the username is used when absent
    pub from_address: Option<String>,

    /// Sender display name
    pub from_name: Option<String>,
}

impl SmtpConfig {
    /// Whether the relay expects implicit TLS
    pub fn implicit_tls(&self) -> bool {
        self.port == IMPLICIT_TLS_PORT
    }

    fn sender(&self) -> Result<Mailbox, SmtpError> {
        let address = self.from_address.as_deref().unwrap_or(&self.username);

        let mailbox = match &self.from_name {
            Some(name) => format!("{} <{}>", name, address),
            None => address.to_string(),
        };

        mailbox
            .parse::<Mailbox>()
            .map_err(|e| SmtpError::Address(format!("{}: {}", address, e)))
    }
}

/// Notifier that delivers access emails through an SMTP relay
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_mailbox: Mailbox,
    branding: MailBranding,
}

impl SmtpNotifier {
    /// Builds the notifier and its transport
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::Address`] if the sender address is invalid and
    /// [`SmtpError::Connection`] if the TLS relay cannot be configured.
    #[tracing::instrument(
        name = "smtp_notifier_new",
        skip(config, branding),
        fields(host = %config.host, port = %config.port, implicit_tls = %config.implicit_tls())
    )]
    pub fn new(config: SmtpConfig, branding: MailBranding) -> Result<Self, SmtpError> {
        let from_mailbox = config.sender()?;

        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| SmtpError::Connection(e.to_string()))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username,
                config.password.expose_secret().to_string(),
            ))
            .build();

        tracing::debug!("SMTP notifier initialized");

        Ok(Self {
            transport,
            from_mailbox,
            branding,
        })
    }

    fn build_message(&self, email: &AccessEmail) -> Result<Message, String> {
        let address = email
            .email
            .parse::<Address>()
            .map_err(|e| format!("invalid recipient address: {}", e))?;
        let to_mailbox = Mailbox::new(Some(email.name.clone()), address);

        let rendered = email
            .render(&self.branding)
            .map_err(|e| format!("failed to render message: {}", e))?;

        Message::builder()
            .from(self.from_mailbox.clone())
            .to(to_mailbox)
            .subject(rendered.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.text.expose_secret().to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(rendered.html.expose_secret().to_string()),
                    ),
            )
            .map_err(|e| format!("failed to build message: {}", e))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[tracing::instrument(name = "smtp_send_access_email", skip(self, email), fields(to = %email.email))]
    async fn send_access_email(&self, email: &AccessEmail) -> NotifyOutcome {
        let message = match self.build_message(email) {
            Ok(message) => message,
            Err(reason) => {
                tracing::error!(reason = %reason, "Access email could not be built");
                return NotifyOutcome::Failed { reason };
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!("Access email sent");
                NotifyOutcome::Sent
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send access email");
                NotifyOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
