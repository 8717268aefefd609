/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file when present) into a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required unless `ACCESSGATE_STORE=memory`)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `ACCESSGATE_STORE`: `postgres` (default) or `memory`
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8080)
/// - `CORS_ORIGINS`: comma separated origins, `*` for any (default: `*`)
/// - `PRODUCTION`: enables HSTS (default: false)
/// - `WEBHOOK_PAID_EVENT`: event tag that triggers provisioning (default: `invoice_paid`)
/// - `SMTP_SERVER`, `SMTP_PORT` (default: 465), `SMTP_USERNAME`, `SMTP_PASSWORD`
/// - `SMTP_FROM_ADDRESS`, `SMTP_FROM_NAME`: optional sender overrides
/// - `ACCESS_URL`, `MAIL_TEAM_NAME`: access link and signature in the email
/// - `STORE_TIMEOUT_SECS` (default: 10), `NOTIFY_TIMEOUT_SECS` (default: 30)
/// - `SHUTDOWN_GRACE_SECS`: wait for background runs on shutdown (default: 30)
/// - `LOG_FORMAT`: `json` for JSON logs
/// - `RUST_LOG`: Log level
///
/// Missing SMTP settings are not fatal: notifications are disabled and
/// every attempt is logged as an error.
///
/// # Example
///
/// ```no_run
/// use accessgate_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use accessgate_shared::notify::{MailBranding, SmtpConfig};
use accessgate_shared::provisioning::ProvisioningConfig;
use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Event tag the payment platform sends when a payment completes
pub const DEFAULT_PAID_EVENT: &str = "invoice_paid";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// User store configuration
    pub store: StoreConfig,

    /// Mail configuration
    pub mail: MailConfig,

    /// Webhook and provisioning configuration
    pub webhook: WebhookConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,

    /// How long shutdown waits for background provisioning runs
    pub shutdown_grace: Duration,
}

/// Which user store backs the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// PostgreSQL
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum number of connections in pool
        max_connections: u32,
    },

    /// Process memory; data is lost on restart
    Memory,
}

/// Mail configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP relay settings, `None` when incomplete
    pub smtp: Option<SmtpConfig>,

    /// Names of the required SMTP variables that are missing
    pub missing: Vec<&'static str>,

    /// Access link and signature
    pub branding: MailBranding,
}

/// Webhook and provisioning configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Event tag that triggers provisioning
    pub paid_event: String,

    /// Workflow tuning
    pub provisioning: ProvisioningConfig,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing while the Postgres store is selected
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(&env::vars().collect())
    }

    /// Builds configuration from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> anyhow::Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let api = ApiConfig {
            host: get("API_HOST").unwrap_or("0.0.0.0").to_string(),
            port: get("API_PORT").unwrap_or("8080").parse::<u16>()?,
            cors_origins: get("CORS_ORIGINS")
                .unwrap_or("*")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            production: parse_bool(get("PRODUCTION")),
            shutdown_grace: Duration::from_secs(
                get("SHUTDOWN_GRACE_SECS").unwrap_or("30").parse::<u64>()?,
            ),
        };

        let store = match get("ACCESSGATE_STORE").unwrap_or("postgres") {
            "memory" => StoreConfig::Memory,
            "postgres" => StoreConfig::Postgres {
                url: get("DATABASE_URL")
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?
                    .to_string(),
                max_connections: get("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or("10")
                    .parse::<u32>()?,
            },
            other => anyhow::bail!("ACCESSGATE_STORE must be 'postgres' or 'memory', got '{}'", other),
        };

        let required = [
            ("SMTP_SERVER", get("SMTP_SERVER")),
            ("SMTP_USERNAME", get("SMTP_USERNAME")),
            ("SMTP_PASSWORD", get("SMTP_PASSWORD")),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        let smtp = match required {
            [(_, Some(host)), (_, Some(username)), (_, Some(password))] => Some(SmtpConfig {
                host: host.to_string(),
                port: get("SMTP_PORT").unwrap_or("465").parse::<u16>()?,
                username: username.to_string(),
                password: SecretString::from(password.to_string()),
                from_address: get("SMTP_FROM_ADDRESS").map(str::to_string),
                from_name: get("SMTP_FROM_NAME").map(str::to_string),
            }),
            _ => None,
        };

        let defaults = MailBranding::default();
        let branding = MailBranding {
            access_url: get("ACCESS_URL").map_or(defaults.access_url, str::to_string),
            team_name: get("MAIL_TEAM_NAME").map_or(defaults.team_name, str::to_string),
        };

        let webhook = WebhookConfig {
            paid_event: get("WEBHOOK_PAID_EVENT")
                .unwrap_or(DEFAULT_PAID_EVENT)
                .to_string(),
            provisioning: ProvisioningConfig {
                store_timeout: Duration::from_secs(
                    get("STORE_TIMEOUT_SECS").unwrap_or("10").parse::<u64>()?,
                ),
                notify_timeout: Duration::from_secs(
                    get("NOTIFY_TIMEOUT_SECS").unwrap_or("30").parse::<u64>()?,
                ),
                ..ProvisioningConfig::default()
            },
        };

        Ok(Self {
            api,
            store,
            mail: MailConfig {
                smtp,
                missing,
                branding,
            },
            webhook,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes")
    )
}
