//! Bearer token issuing and validation
//!
//! Tokens are HS256 JWTs carrying the account email as the subject and an
//! absolute expiry. The signing secret comes from configuration and is the
//! system's sole trust anchor.

use crate::core::error::{LmsError, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Issue a signed token for a subject, valid for `ttl_minutes`
pub fn issue_token(subject: &str, ttl_minutes: i64, secret: &str) -> Result<String> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::minutes(ttl_minutes))
        .ok_or_else(|| LmsError::InvalidToken("Failed to calculate expiration".to_string()))?
        .timestamp();

    let claims = Claims {
        sub: subject.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| LmsError::InvalidToken(format!("Failed to issue token: {}", e)))
}

/// Validate a token and extract its claims
///
/// Fails with InvalidToken on a bad signature, a past expiry, or a missing
/// subject claim.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    // No leeway, and treat exp == now as expired: a token must fail
    // validation the moment its expiry instant is reached.
    validation.leeway = 0;
    validation.reject_tokens_expiring_in_less_than = 1;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| LmsError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("alex@example.com", 60, SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "alex@example.com");
    }

    #[test]
    fn test_zero_ttl_token_is_expired() {
        let token = issue_token("alex@example.com", 0, SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET),
            Err(LmsError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("alex@example.com", 60, SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, "another-secret"),
            Err(LmsError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_missing_subject_rejected() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
        }

        let claims = NoSubject {
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(LmsError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            validate_token("not.a.jwt", SECRET),
            Err(LmsError::InvalidToken(_))
        ));
    }
}
