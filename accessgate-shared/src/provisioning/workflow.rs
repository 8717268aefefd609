/// Idempotent account provisioning
///
/// One run turns a confirmed purchase into an account:
///
/// ```text
/// Start
///   └─> CheckExisting ──(record exists)──> Stop (AlreadyExists)
///         └─> GeneratePassword
///               └─> HashPassword
///                     └─> Persist ──(duplicate email)──> Stop (AlreadyExists)
///                           └─> Notify
///                                 └─> Stop (Created)
/// ```
///
/// # Idempotence
///
/// Webhooks are delivered at least once, so the same purchase can arrive
/// several times, possibly concurrently. The existence check turns plain
/// redeliveries into no-ops. Two concurrent deliveries can both pass that
/// check; the store's unique email constraint then rejects the second insert
/// and that run also ends as `AlreadyExists` without sending a second email.
///
/// # Failure policy
///
/// - Store errors (and store timeouts) abort the run. A failed insert never
///   leads to an email.
/// - Notification failures are logged and reported in the outcome but never
///   undo the insert.
///
/// The plaintext password exists only inside one run and in the outbound
/// email; it is never logged, returned or stored.

use crate::auth::password::{self, generate_random_password, PasswordError, DEFAULT_PASSWORD_LENGTH};
use crate::models::user::{normalize_email, CreateUser};
use crate::notify::{AccessEmail, Notifier, NotifyOutcome};
use crate::store::{StoreError, StoreResult, UserStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default bound on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on sending the access email
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Workflow tuning
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Length of generated passwords
    pub password_length: usize,

    /// Bound on each store call
    pub store_timeout: Duration,

    /// Bound on the notification
    pub notify_timeout: Duration,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            password_length: DEFAULT_PASSWORD_LENGTH,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

/// Buyer data extracted from a qualifying webhook event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Display name
    pub name: String,

    /// Normalized email
    pub email: String,
}

impl ProvisionRequest {
    /// Creates a request, normalizing the email
    pub fn new(name: impl Into<String>, email: &str) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// An account for this email already existed; nothing was changed
    AlreadyExists,

    /// A new account was stored
    Created {
        /// ID of the new user
        user_id: Uuid,

        /// Result of sending the access email
        notification: NotifyOutcome,
    },
}

/// Errors that abort a run before an account is committed
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The user store failed or timed out
    #[error("user store error: {0}")]
    Store(#[from] StoreError),

    /// The password could not be hashed
    #[error("password error: {0}")]
    Password(#[from] PasswordError),
}

/// Orchestrates existence check, credential creation, persistence and notification
pub struct ProvisioningWorkflow {
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    config: ProvisioningConfig,
}

impl ProvisioningWorkflow {
    /// Creates the workflow over injected collaborators
    pub fn new(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Runs the workflow for one buyer
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] if the store fails before the account is
    /// committed, or if hashing fails. Notification problems are not errors.
    pub async fn run(&self, request: ProvisionRequest) -> Result<ProvisionOutcome, ProvisionError> {
        let existing = self
            .bounded(self.store.find_by_email(&request.email))
            .await?;

        if existing.is_some() {
            tracing::info!(email = %request.email, "User already provisioned, skipping");
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        let password = generate_random_password(self.config.password_length);
        let password_hash = password::hash_password_blocking(password.expose().to_string()).await?;

        let insert = self.bounded(self.store.insert(CreateUser {
            name: request.name,
            email: request.email.clone(),
            password_hash,
        }));

        let user = match insert.await {
            Ok(user) => user,
            Err(StoreError::DuplicateEmail(_)) => {
                tracing::info!(
                    email = %request.email,
                    "User created concurrently by another delivery, skipping"
                );
                return Ok(ProvisionOutcome::AlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %user.id, email = %user.email, "User created");

        let email = AccessEmail::new(user.name, user.email, password);
        let notification = self.notify(&email).await;

        match &notification {
            NotifyOutcome::Sent => {
                tracing::info!(user_id = %user.id, "Access email delivered")
            }
            other => tracing::error!(
                user_id = %user.id,
                email = %email.email,
                outcome = %other,
                "Access email not delivered; account remains created"
            ),
        }

        Ok(ProvisionOutcome::Created {
            user_id: user.id,
            notification,
        })
    }

    async fn bounded<T>(&self, operation: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        let limit = self.config.store_timeout;
        tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| StoreError::Timeout(limit))?
    }

    async fn notify(&self, email: &AccessEmail) -> NotifyOutcome {
        let limit = self.config.notify_timeout;
        match tokio::time::timeout(limit, self.notifier.send_access_email(email)).await {
            Ok(outcome) => outcome,
            Err(_) => NotifyOutcome::Failed {
                reason: format!("timed out after {:?}", limit),
            },
        }
    }
}
