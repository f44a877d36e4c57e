//! Authentication and account management
//!
//! This module provides:
//! - bcrypt password hashing and verification
//! - JWT bearer token issuing and validation
//! - Registration, login, and profile handlers
//! - Route-group authentication middleware

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use middleware::{authenticate, AuthUser};
