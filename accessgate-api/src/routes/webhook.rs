/// Payment webhook intake
///
/// The payment platform posts every invoice event here. Only the configured
/// "payment completed" tag starts provisioning; everything else is
/// acknowledged and dropped. Provisioning runs in the background, so the
/// response never waits on the store or the mail relay.
///
/// # Endpoints
///
/// - `POST /webhook-endpoint` - Receive a payment event

use crate::{app::AppState, error::ApiResult};
use accessgate_shared::provisioning::ProvisionRequest;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Acknowledgment sent when provisioning was scheduled
pub const STATUS_PROCESSING: &str = "success - processing in background";

/// Acknowledgment sent for events that do not trigger provisioning
pub const STATUS_IGNORED: &str = "event_ignored";

/// Webhook payload
///
/// `customer_name` and `customer_email` are accepted as aliases of
/// `cus_name` and `cus_email`.
#[derive(Debug, Deserialize, Validate)]
pub struct WebhookEvent {
    /// Event tag, e.g. `invoice_paid`
    #[validate(length(min = 1, max = 100, message = "Event name must be 1-100 characters"))]
    pub event_name: String,

    /// Buyer display name
    #[serde(alias = "customer_name")]
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub cus_name: String,

    /// Buyer email
    #[serde(alias = "customer_email")]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 320, message = "Email must be at most 320 characters")
    )]
    pub cus_email: String,
}

/// Rejects values that are empty once surrounding whitespace is trimmed
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Name must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Webhook acknowledgment
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookResponse {
    /// Processing status
    pub status: String,

    /// Event tag, only echoed for ignored events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

/// Webhook endpoint
///
/// # Endpoint
///
/// ```text
/// POST /webhook-endpoint
/// Content-Type: application/json
///
/// {
///   "event_name": "invoice_paid",
///   "cus_name": "Ana Silva",
///   "cus_email": "ana@example.com"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "status": "success - processing in background" }
/// ```
///
/// or, for any other event tag:
///
/// ```json
/// { "status": "event_ignored", "event": "invoice_created" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON or missing fields
/// - `422 Unprocessable Entity`: Invalid email, blank name or over-long fields
///
/// Validation runs before filtering, so an invalid payload is rejected
/// whatever its tag.
#[tracing::instrument(name = "webhook", skip(state, payload))]
pub async fn receive_event(
    State(state): State<AppState>,
    payload: Result<Json<WebhookEvent>, JsonRejection>,
) -> ApiResult<Json<WebhookResponse>> {
    let Json(event) = payload?;
    event.validate()?;

    if event.event_name != state.config.webhook.paid_event {
        tracing::info!(event = %event.event_name, "Ignoring webhook event");
        return Ok(Json(WebhookResponse {
            status: STATUS_IGNORED.to_string(),
            event: Some(event.event_name),
        }));
    }

    let request = ProvisionRequest::new(event.cus_name.trim(), &event.cus_email);
    tracing::info!(email = %request.email, "Payment confirmed, scheduling provisioning");

    state.dispatcher.dispatch(request);

    Ok(Json(WebhookResponse {
        status: STATUS_PROCESSING.to_string(),
        event: None,
    }))
}
