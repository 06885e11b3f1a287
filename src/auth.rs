//! # Authentication
//!
//! This module resolves request credentials into a user identity. The
//! resolution itself sits behind [`IdentityProvider`]; the middleware only
//! extracts the credential, asks the provider, and stores the resulting
//! [`AuthenticatedUser`] in the request extensions.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::{AppConfig, ApiTokenBinding};
use crate::error::{ApiError, unauthorized};
use crate::server::AppState;

/// User identity wrapper for type safety
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Resolves an opaque credential into the user it belongs to.
pub trait IdentityProvider: Send + Sync {
    /// Returns the user for `token`, or `None` if the token is not recognised.
    fn authenticate(&self, token: &str) -> Option<UserId>;
}

/// Identity provider backed by the statically configured API tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    bindings: Vec<ApiTokenBinding>,
}

impl StaticTokenIdentity {
    pub fn new(bindings: Vec<ApiTokenBinding>) -> Self {
        Self { bindings }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_tokens.clone())
    }
}

impl IdentityProvider for StaticTokenIdentity {
    fn authenticate(&self, token: &str) -> Option<UserId> {
        // Compare against every binding so timing does not reveal the match position.
        let mut matched = None;
        for binding in &self.bindings {
            let equal: bool = token.as_bytes().ct_eq(binding.token.as_bytes()).into();
            if equal {
                matched = Some(UserId(binding.user_id));
            }
        }
        matched
    }
}

/// The authenticated caller, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl FromRef<AppState> for Arc<dyn IdentityProvider> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.identity)
    }
}

/// Authentication middleware that validates the request credential
pub async fn auth_middleware(
    State(identity): State<Arc<dyn IdentityProvider>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())?;

    let user = identity
        .authenticate(token)
        .ok_or_else(|| unauthorized(Some("Invalid API token")))?;
    tracing::debug!(user_id = %user, "Authenticated request");

    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

/// Extracts the credential from `Authorization: Bearer <token>` or `Authorization: Token <token>`.
fn extract_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("Token "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            unauthorized(Some(
                "Authorization header must use the Bearer or Token scheme",
            ))
        })
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    const USER: &str = "7d444840-9dc0-11d1-b245-5ffdce74fad2";

    fn identity() -> Arc<dyn IdentityProvider> {
        Arc::new(StaticTokenIdentity::new(vec![
            ApiTokenBinding {
                token: "test-token-123".to_string(),
                user_id: USER.parse().unwrap(),
            },
            ApiTokenBinding {
                token: "other-token".to_string(),
                user_id: Uuid::new_v4(),
            },
        ]))
    }

    async fn run_middleware(request: Request<Body>) -> Response {
        async fn handler(AuthenticatedUser(user): AuthenticatedUser) -> String {
            user.to_string()
        }

        Router::new()
            .route("/test", get(handler))
            .layer(axum::middleware::from_fn_with_state(
                identity(),
                auth_middleware,
            ))
            .oneshot(request)
            .await
            .unwrap()
    }

    #[test]
    fn static_identity_maps_tokens_to_users() {
        let provider = identity();

        assert_eq!(
            provider.authenticate("test-token-123"),
            Some(UserId(USER.parse().unwrap()))
        );
        assert_eq!(provider.authenticate("test-token-12"), None);
        assert_eq!(provider.authenticate(""), None);
    }

    #[tokio::test]
    async fn missing_auth_header_returns_401() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_auth_scheme_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dGVzdDoxMjM=")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer wrong-token")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_and_token_schemes_resolve_the_user() {
        for scheme in ["Bearer", "Token"] {
            let request = Request::builder()
                .uri("/test")
                .header("Authorization", format!("{} test-token-123", scheme))
                .body(Body::empty())
                .unwrap();

            let response = run_middleware(request).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&body[..], USER.as_bytes());
        }
    }
}
