/// Session tokens
///
/// A signed-in browser carries an HS256 JWT in the `session` cookie. The
/// subject is the user id; the token expires after the configured TTL and
/// is only accepted with the `taskman` issuer.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskman_shared::auth::session::{issue_session_token, verify_session_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-session-secret-of-at-least-32-bytes";
/// let token = issue_session_token(42, secret, Duration::hours(24))?;
/// let claims = verify_session_token(&token, secret)?;
/// assert_eq!(claims.user_id()?, 42);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_ISSUER: &str = "taskman";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to create session token: {0}")]
    CreateError(String),

    #[error("Session has expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id, as a decimal string
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl SessionClaims {
    /// Fails when `ttl` puts the expiry outside the representable range
    pub fn new(user_id: i64, ttl: Duration) -> Result<Self, SessionError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| SessionError::CreateError(format!("session lifetime {ttl} is out of range")))?;

        Ok(Self {
            sub: user_id.to_string(),
            iss: SESSION_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
        })
    }

    pub fn user_id(&self) -> Result<i64, SessionError> {
        self.sub
            .parse()
            .map_err(|_| SessionError::Invalid(format!("subject {:?} is not a user id", self.sub)))
    }
}

pub fn issue_session_token(user_id: i64, secret: &str, ttl: Duration) -> Result<String, SessionError> {
    let claims = SessionClaims::new(user_id, ttl)?;
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| SessionError::CreateError(e.to_string()))
}

/// Checks signature, expiry, not-before and issuer
pub fn verify_session_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Invalid(e.to_string()),
        })
}
