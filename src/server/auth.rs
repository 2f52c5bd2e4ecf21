//! Caller identity seam
//!
//! Authentication itself belongs to the fronting web UI platform; the
//! bridge only trusts the identity headers that platform injects after
//! verifying the user. Requests without an identity are rejected, and
//! administrative routes additionally require the admin role.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

/// Header carrying the verified user name
pub const USER_HEADER: &str = "x-bridge-user";
/// Header carrying the verified user role
pub const ROLE_HEADER: &str = "x-bridge-role";

/// Role of the verified caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Regular verified user
    User,
    /// Administrator
    Admin,
}

/// Verified caller identity, resolved by the fronting platform
#[derive(Debug, Clone)]
pub struct Caller {
    /// User name
    pub user: String,
    /// Role
    pub role: Role,
}

impl Caller {
    /// Whether this caller may hit administrative routes
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Extract the caller identity from trusted headers, rejecting requests
/// the platform has not attached an identity to.
pub async fn identity_middleware(mut request: Request<Body>, next: Next) -> Response {
    let Some(user) = request
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Not authenticated"})),
        )
            .into_response();
    };

    let role = match request
        .headers()
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some("admin") => Role::Admin,
        _ => Role::User,
    };

    debug!(user = %user, ?role, path = %request.uri().path(), "Caller identified");
    request.extensions_mut().insert(Caller { user, role });
    next.run(request).await
}

/// Gate an administrative route. Returns the 403 response to send when
/// the caller lacks the admin role.
pub fn require_admin(caller: &Caller) -> Result<(), Response> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Admin privileges required"})),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gate_rejects_users() {
        let user = Caller {
            user: "u".to_string(),
            role: Role::User,
        };
        assert!(require_admin(&user).is_err());

        let admin = Caller {
            user: "a".to_string(),
            role: Role::Admin,
        };
        assert!(require_admin(&admin).is_ok());
    }
}
