/// Authentication middleware for Axum
///
/// Resolves the `Authorization: Bearer <token>` header of an inbound request
/// into a [`Principal`] and stores it in the request extensions. Handlers take
/// the principal as an explicit argument from there; there is no ambient
/// "current user" anywhere in the system.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskroster_shared::auth::middleware::{require_principal, Principal};
///
/// async fn protected_handler(Extension(principal): Extension<Principal>) -> String {
///     format!("Hello, {}!", principal.id())
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn_with_state(
///         "your-jwt-secret".to_string(),
///         require_principal,
///     ));
/// ```

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::UserRole;

/// The authenticated actor of a request
///
/// A tagged variant per role: the role decision is made exactly once, when
/// the token resolves, and every authorization function downstream matches on
/// the variant instead of comparing role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Principal {
    /// An admin: manages a roster of members and their tasks
    Admin {
        /// The admin's user id
        id: Uuid,
    },

    /// A member: sees and completes only its own tasks
    Member {
        /// The member's user id
        id: Uuid,
    },
}

impl Principal {
    /// Builds a principal from validated token claims
    pub fn from_claims(user_id: Uuid, role: UserRole) -> Self {
        match role {
            UserRole::Admin => Principal::Admin { id: user_id },
            UserRole::Member => Principal::Member { id: user_id },
        }
    }

    /// The actor's user id, regardless of role
    pub fn id(&self) -> Uuid {
        match self {
            Principal::Admin { id } | Principal::Member { id } => *id,
        }
    }

    /// The actor's role
    pub fn role(&self) -> UserRole {
        match self {
            Principal::Admin { .. } => UserRole::Admin,
            Principal::Member { .. } => UserRole::Member,
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

/// Extracts the bearer token from request headers
pub fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Resolves a bearer token into a principal
pub fn principal_from_token(token: &str, secret: &str) -> Result<Principal, AuthError> {
    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(Principal::from_claims(claims.sub, claims.role))
}

/// Bearer authentication middleware
///
/// Rejects the request with 401 before any handler logic runs when the
/// credential is missing or invalid; otherwise inserts the resolved
/// [`Principal`] into the request extensions.
pub async fn require_principal(
    State(secret): State<String>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer_token(req.headers())?;
    let principal = principal_from_token(token, &secret)?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_principal_from_claims() {
        let id = Uuid::new_v4();

        let admin = Principal::from_claims(id, UserRole::Admin);
        assert_eq!(admin, Principal::Admin { id });
        assert_eq!(admin.id(), id);
        assert_eq!(admin.role(), UserRole::Admin);

        let member = Principal::from_claims(id, UserRole::Member);
        assert_eq!(member, Principal::Member { id });
        assert_eq!(member.role(), UserRole::Member);
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = axum::http::HeaderMap::new();

        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::MissingCredentials)
        ));

        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidFormat(_))
        ));

        headers.insert(header::AUTHORIZATION, "Bearer the-token".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), "the-token");
    }

    #[test]
    fn test_principal_from_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Member, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let principal = principal_from_token(&token, SECRET).unwrap();
        assert_eq!(principal, Principal::Member { id: user_id });
    }

    #[test]
    fn test_principal_from_token_rejects_refresh_token() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::Member, TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            principal_from_token(&token, SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_principal_from_token_rejects_garbage() {
        assert!(matches!(
            principal_from_token("not.a.jwt", SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
