//! HTTP API layer
//!
//! This module provides:
//! - The Axum server with CORS, timeouts, and graceful shutdown
//! - Versioned API routes split into public and protected groups
//! - Request handlers and response types
//! - Trace ID middleware

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::ApiServer;
