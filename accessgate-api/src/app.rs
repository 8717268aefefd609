/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use accessgate_api::{app::{build_router, AppState}, config::Config};
/// use accessgate_shared::notify::DisabledNotifier;
/// use accessgate_shared::provisioning::{Dispatcher, ProvisioningWorkflow};
/// use accessgate_shared::store::MemoryUserStore;
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = Arc::new(MemoryUserStore::new());
/// let workflow = ProvisioningWorkflow::new(
///     store.clone(),
///     Arc::new(DisabledNotifier::new("SMTP_SERVER is not set")),
///     config.webhook.provisioning.clone(),
/// );
/// let state = AppState::new(store, Dispatcher::new(workflow), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, MailConfig},
    middleware::security::SecurityHeadersLayer,
};
use accessgate_shared::{
    notify::{DisabledNotifier, Notifier, SmtpNotifier},
    provisioning::Dispatcher,
    store::UserStore,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// User store, shared with the provisioning workflow
    pub store: Arc<dyn UserStore>,

    /// Background provisioning
    pub dispatcher: Dispatcher,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn UserStore>, dispatcher: Dispatcher, config: Config) -> Self {
        Self {
            store,
            dispatcher,
            config: Arc::new(config),
        }
    }
}

/// Picks the notifier for the configured mail settings
///
/// Mail problems never stop the server: missing settings and settings the
/// SMTP transport rejects both fall back to a [`DisabledNotifier`] that
/// carries the reason, and accounts are still provisioned.
pub fn build_notifier(mail: &MailConfig) -> Arc<dyn Notifier> {
    let disabled = match &mail.smtp {
        Some(smtp) => match SmtpNotifier::new(smtp.clone(), mail.branding.clone()) {
            Ok(notifier) => return Arc::new(notifier),
            Err(e) => DisabledNotifier::new(format!("invalid SMTP settings: {}", e)),
        },
        None => DisabledNotifier::new(format!(
            "mail settings missing: {}",
            mail.missing.join(", ")
        )),
    };

    tracing::error!(
        reason = %disabled.reason(),
        "SMTP is not available; access emails will not be sent"
    );
    Arc::new(disabled)
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET, HEAD /               # Liveness
/// ├── GET  /health              # Liveness plus store connectivity
/// ├── POST /webhook-endpoint    # Payment events
/// └── POST /login               # Credential check
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/webhook-endpoint", post(routes::webhook::receive_event))
        .route("/login", post(routes::auth::login))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_shared::auth::password::generate_random_password;
    use accessgate_shared::notify::{AccessEmail, MailBranding, NotifyOutcome, SmtpConfig};
    use secrecy::SecretString;

    fn mail(smtp: Option<SmtpConfig>, missing: Vec<&'static str>) -> MailConfig {
        MailConfig {
            smtp,
            missing,
            branding: MailBranding::default(),
        }
    }

    fn smtp(username: &str) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 465,
            username: username.to_string(),
            password: SecretString::from("relay-password".to_string()),
            from_address: None,
            from_name: None,
        }
    }

    async fn outcome_for(mail: &MailConfig, to: &str) -> NotifyOutcome {
        let email = AccessEmail::new("Ana Silva", to, generate_random_password(8));
        build_notifier(mail).send_access_email(&email).await
    }

    #[tokio::test]
    async fn test_missing_settings_disable_mail() {
        let outcome = outcome_for(&mail(None, vec!["SMTP_SERVER"]), "ana@example.com").await;

        assert_eq!(
            outcome,
            NotifyOutcome::Disabled {
                reason: "mail settings missing: SMTP_SERVER".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_smtp_settings_disable_mail() {
        let outcome = outcome_for(&mail(Some(smtp("not-an-address")), vec![]), "ana@example.com").await;

        match outcome {
            NotifyOutcome::Disabled { reason } => {
                assert!(reason.starts_with("invalid SMTP settings:"), "{}", reason);
            }
            other => panic!("Expected Disabled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_smtp_settings_use_relay() {
        // A bad recipient fails before any connection is attempted
        let outcome = outcome_for(&mail(Some(smtp("sender@example.com")), vec![]), "not-an-address").await;

        assert!(matches!(outcome, NotifyOutcome::Failed { .. }));
    }
}
