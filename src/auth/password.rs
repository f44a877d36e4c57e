//! Password hashing and verification using bcrypt

use crate::core::error::{LmsError, Result};
use std::sync::OnceLock;

/// Hash a password using bcrypt. The salt is generated per call, so two
/// hashes of the same password differ.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| LmsError::TaskError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash.
///
/// bcrypt's comparison is constant-time. Malformed hash strings fail closed:
/// the result is false, never an error a caller could mistake for a match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// A hash no real password verifies against. Login runs a verification
/// against this when the email is unknown so that unknown-email and
/// wrong-password failures have the same latency shape.
pub fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| {
        bcrypt::hash("jijue-dummy-credential", bcrypt::DEFAULT_COST).unwrap_or_default()
    })
}
