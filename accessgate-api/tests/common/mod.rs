/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory user store
/// - A notifier that records every access email instead of sending it
/// - A router wired the same way `main` wires it
/// - Request helpers

use accessgate_api::app::{build_router, AppState};
use accessgate_api::config::Config;
use accessgate_shared::notify::{AccessEmail, Notifier, NotifyOutcome};
use accessgate_shared::provisioning::{Dispatcher, ProvisioningWorkflow};
use accessgate_shared::store::MemoryUserStore;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Notifier that keeps every email it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<AccessEmail>>,
}

impl RecordingNotifier {
    /// Emails recorded so far
    pub fn sent(&self) -> Vec<AccessEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_access_email(&self, email: &AccessEmail) -> NotifyOutcome {
        self.sent.lock().unwrap().push(email.clone());
        NotifyOutcome::Sent
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub store: MemoryUserStore,
    pub notifier: Arc<RecordingNotifier>,
    pub dispatcher: Dispatcher,
}

impl TestContext {
    /// Creates a context over a fresh in-memory store
    pub fn new() -> Self {
        Self::with_store(MemoryUserStore::new())
    }

    /// Creates a context over the given store
    pub fn with_store(store: MemoryUserStore) -> Self {
        let vars: HashMap<String, String> = [("ACCESSGATE_STORE", "memory")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_vars(&vars).unwrap();

        let notifier = Arc::new(RecordingNotifier::default());
        let workflow = ProvisioningWorkflow::new(
            Arc::new(store.clone()),
            notifier.clone(),
            config.webhook.provisioning.clone(),
        );
        let dispatcher = Dispatcher::new(workflow);

        let state = AppState::new(Arc::new(store.clone()), dispatcher.clone(), config);

        Self {
            app: build_router(state),
            store,
            notifier,
            dispatcher,
        }
    }

    /// Waits until every background provisioning run has finished
    pub async fn drain(&self) {
        assert!(
            self.dispatcher.shutdown(Duration::from_secs(30)).await,
            "provisioning runs did not finish"
        );
    }

    /// Sends a request and returns the status and the raw body
    pub async fn request(&self, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body)
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    /// POSTs a JSON body and parses the JSON response
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = self.request(Method::POST, uri, Some(body.to_string())).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// GETs a path and parses the JSON response
    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = self.request(Method::GET, uri, None).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Delivers a payment webhook
    pub async fn webhook(&self, event_name: &str, name: &str, email: &str) -> (StatusCode, serde_json::Value) {
        self.post_json(
            "/webhook-endpoint",
            serde_json::json!({
                "event_name": event_name,
                "cus_name": name,
                "cus_email": email,
            }),
        )
        .await
    }

    /// Attempts a login
    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
        self.post_json(
            "/login",
            serde_json::json!({
                "email": email,
                "password": password,
            }),
        )
        .await
    }
}
