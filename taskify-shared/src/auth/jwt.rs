/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the user's identity, role, and a
/// purpose tag. Only tokens with purpose `auth` grant API access; the other
/// purposes exist so that e.g. a password-reset token can never be replayed
/// as a login token.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC-SHA256)
/// - **Expiration**: 12 hours for auth tokens
/// - **Validation**: signature, expiration, and issuer checks
/// - **Secret**: should be at least 32 bytes
///
/// The token payload is a claim, not an authorization decision: handlers
/// must still resolve the claims against the live user row.
///
/// # Example
///
/// ```
/// use taskify_shared::auth::jwt::{create_token, validate_auth_token, Claims, TokenPurpose};
/// use taskify_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, Role::Member, TokenPurpose::Auth);
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_auth_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token carries the wrong purpose tag
    #[error("Wrong token purpose: expected {expected}, got {actual}")]
    WrongPurpose {
        expected: &'static str,
        actual: String,
    },
}

/// Purpose tag embedded in every token
///
/// Only `Auth` tokens are accepted by the access guard. The remaining
/// variants reserve the claim vocabulary for other flows (the issue/consume
/// endpoints for those flows are out of scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    /// API access token
    Auth,

    /// Token refresh
    Refresh,

    /// Workspace invitation
    Invite,

    /// Password reset
    Reset,

    /// Email verification
    Verify,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Auth => "auth",
            TokenPurpose::Refresh => "refresh",
            TokenPurpose::Invite => "invite",
            TokenPurpose::Reset => "reset",
            TokenPurpose::Verify => "verify",
        }
    }
}

/// Default lifetime of an auth token
const AUTH_TOKEN_LIFETIME_HOURS: i64 = 12;

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "taskify")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
///
/// # Custom Claims
///
/// - `role`: the role the user held when the token was issued
/// - `purpose`: what the token is good for (see [`TokenPurpose`])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - always "taskify"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Role at issuance time (re-checked against the live row on every request)
    pub role: Role,

    /// Purpose tag
    pub purpose: TokenPurpose,
}

impl Claims {
    /// Creates new claims with the default 12-hour expiration
    pub fn new(user_id: Uuid, role: Role, purpose: TokenPurpose) -> Self {
        Self::with_expiration(user_id, role, purpose, Duration::hours(AUTH_TOKEN_LIFETIME_HOURS))
    }

    /// Creates claims with a custom expiration
    pub fn with_expiration(
        user_id: Uuid,
        role: Role,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: "taskify".to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            role,
            purpose,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a JWT token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies the signature, expiration, and issuer. Does NOT check the
/// purpose tag; use [`validate_auth_token`] for access tokens.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["taskify"]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and requires the `auth` purpose
///
/// This is the entry point for the access guard: a structurally valid token
/// issued for password reset or any other purpose is rejected here.
pub fn validate_auth_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.purpose != TokenPurpose::Auth {
        return Err(JwtError::WrongPurpose {
            expected: "auth",
            actual: claims.purpose.as_str().to_string(),
        });
    }

    Ok(claims)
}
