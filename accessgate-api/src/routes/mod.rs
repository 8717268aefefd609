/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Liveness and health check endpoints
/// - `webhook`: Payment webhook intake
/// - `auth`: Login verification

pub mod auth;
pub mod health;
pub mod webhook;
