/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a new account
/// - `POST /auth/login` - Login and get an access token
/// - `POST /auth/logout` - Clear the access token cookie
///
/// Login failures are uniform: an unknown email and a wrong password both
/// answer 401 "Invalid email or password". Registration against an existing
/// email answers 401 with a message telling the caller to log in instead.
///
/// The access token is returned in the response body and also set as an
/// `accessToken` cookie for browser clients. Logout only clears the cookie;
/// issued tokens stay valid until they expire.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use taskify_shared::{
    auth::{
        jwt::{self, TokenPurpose},
        password,
    },
    models::user::{CreateUser, Role, User, UserStatus},
};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response,
};

/// Auth token cookie lifetime, matching the JWT expiry (12 hours)
const COOKIE_MAX_AGE_SECONDS: i64 = 12 * 60 * 60;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 30, message = "Username must be between 1 and 30 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength separately)
    pub password: String,

    /// Optional role; defaults to member
    pub role: Option<Role>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: validation failed (username, email, or password)
/// - `401 Unauthorized`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(ApiError::Validation)?;

    let email = normalize_email(&req.email);

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Unauthorized(
            "You already have an existing account, please login using your email address"
                .to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
            username: req.username,
            role: req.role.unwrap_or(Role::Member),
            status: UserStatus::Active,
        },
    )
    .await?;

    let claims = jwt::Claims::new(user.id, user.role, TokenPurpose::Auth);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User registered");

    let res = response::created(
        "User registered successfully",
        json!({ "accessToken": token, "userData": user }),
    );

    with_auth_cookie(res, &token)
}

/// Login with email and password
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: unknown email or wrong password (uniform message)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let email = normalize_email(&req.email);

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id, user.role, TokenPurpose::Auth);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    let res = response::ok(
        "Login successful",
        json!({ "accessToken": token, "userData": user }),
    );

    with_auth_cookie(res, &token)
}

/// Logout
///
/// Clears the access token cookie. Always succeeds; the bearer token itself
/// stays valid until expiry.
pub async fn logout() -> ApiResult<Response> {
    let mut res = response::ok("Logged out successfully", json!(null));

    let cookie = "accessToken=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax";
    res.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static(cookie),
    );

    Ok(res)
}

/// Trims and lowercases an email so lookups and uniqueness are
/// case-insensitive
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn with_auth_cookie(mut res: Response, token: &str) -> ApiResult<Response> {
    let cookie = format!(
        "accessToken={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        token, COOKIE_MAX_AGE_SECONDS
    );

    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("Invalid cookie value: {}", e)))?;
    res.headers_mut().insert(header::SET_COOKIE, value);

    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Passw0rd".to_string(),
            role: None,
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "Passw0rd".to_string(),
            role: None,
        };
        assert!(bad_email.validate().is_err());

        let long_username = RegisterRequest {
            username: "a".repeat(31),
            email: "alice@example.com".to_string(),
            password: "Passw0rd".to_string(),
            role: None,
        };
        assert!(long_username.validate().is_err());
    }

    #[test]
    fn test_cookie_is_http_only() {
        let res = response::ok("ok", json!(null));
        let res = with_auth_cookie(res, "abc.def.ghi").unwrap();

        let cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();

        assert!(cookie.starts_with("accessToken=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=43200"));
    }
}
