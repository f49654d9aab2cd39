/// Access guard
///
/// Protected route groups are wrapped in one of two middleware layers:
/// [`require_member_or_admin`] or [`require_admin`]. Each request must
/// carry `Authorization: Bearer <token>` where the token is a valid,
/// unexpired JWT with purpose `auth`, and the claimed id+role pair must
/// still resolve to an active user row. The surviving user's identity is
/// then attached to the request for handlers to read.
///
/// Every failure path returns the same 401 "Access denied" envelope: the
/// guard never reveals which check failed. A blocked user or a user whose
/// role changed since token issuance is rejected even though their token is
/// cryptographically valid.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskify_shared::{
    auth::jwt,
    models::user::{Role, User},
};
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// The authenticated caller, attached as a request extension
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Guard for routes open to members and admins
pub async fn require_member_or_admin(
    state: State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(state, req, next, &[Role::Member, Role::Admin]).await
}

/// Guard for member-only routes (task creation)
pub async fn require_member(
    state: State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(state, req, next, &[Role::Member]).await
}

/// Guard for admin-only routes
pub async fn require_admin(
    state: State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(state, req, next, &[Role::Admin]).await
}

async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
    allowed_roles: &[Role],
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).ok_or(ApiError::AccessDenied)?;

    // Signature, expiration, issuer, and purpose checks
    let claims = jwt::validate_auth_token(token, state.jwt_secret())?;

    // The token is a claim, not a decision: the id+role pair must still
    // match a live, active row. A stale token (blocked user, changed role)
    // dies here.
    let user = User::find_for_auth(&state.db, claims.sub, claims.role)
        .await
        .map_err(|_| ApiError::AccessDenied)?
        .ok_or(ApiError::AccessDenied)?;

    if !allowed_roles.contains(&user.role) {
        return Err(ApiError::AccessDenied);
    }

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        role: user.role,
    });

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_is_admin() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let member = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Member,
        };

        assert!(admin.is_admin());
        assert!(!member.is_admin());
    }

    fn request_with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        let req = request_with_headers(&[("Authorization", "Bearer abc.def.ghi")]);
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));

        // non-Bearer schemes are not accepted
        let req = request_with_headers(&[("Authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(bearer_token(&req), None);

        let req = request_with_headers(&[]);
        assert_eq!(bearer_token(&req), None);
    }
}
