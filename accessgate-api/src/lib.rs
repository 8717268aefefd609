//! # accessgate API Server Library
//!
//! This library provides the HTTP surface of accessgate: a payment webhook
//! that provisions accounts in the background, a login check, and
//! liveness endpoints.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
