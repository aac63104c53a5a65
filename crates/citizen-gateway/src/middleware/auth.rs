//! Bearer-token role check.
//!
//! Applied per route group: the token must resolve to a caller whose role is
//! exactly the one the group requires. The caller is stored in the request
//! extensions as a [`Principal`].

use crate::domain::{ApiError, Principal, Role};
use crate::ports::Authenticator;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn};

pub const NO_TOKEN: &str = "No token provided.";
pub const USER_NOT_FOUND: &str = "Authentication failed. User not found.";
pub const ROLE_DENIED: &str = "Authentication failed. User role has no access.";

/// Layer requiring a role.
#[derive(Clone)]
pub struct RequireRoleLayer {
    authenticator: Arc<dyn Authenticator>,
    role: Role,
}

impl RequireRoleLayer {
    pub fn new(authenticator: Arc<dyn Authenticator>, role: Role) -> Self {
        Self {
            authenticator,
            role,
        }
    }
}

impl<S> Layer<S> for RequireRoleLayer {
    type Service = RequireRoleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRoleService {
            inner,
            authenticator: Arc::clone(&self.authenticator),
            role: self.role,
        }
    }
}

/// Role-check service
#[derive(Clone)]
pub struct RequireRoleService<S> {
    inner: S,
    authenticator: Arc<dyn Authenticator>,
    role: Role,
}

impl<S> Service<Request<Body>> for RequireRoleService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let checked = authorize(req.headers(), self.authenticator.as_ref(), self.role);

        Box::pin(async move {
            match checked {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                    inner.call(req).await
                }
                Err(error) => Ok(error.into_response()),
            }
        })
    }
}

/// Resolve the caller and check the role.
pub fn authorize(
    headers: &HeaderMap,
    authenticator: &dyn Authenticator,
    required: Role,
) -> Result<Principal, ApiError> {
    let Some(token) = extract_token(headers) else {
        debug!("Request without token");
        return Err(ApiError::forbidden(NO_TOKEN));
    };

    let Some(principal) = authenticator.authenticate(token) else {
        warn!("Unknown token presented");
        return Err(ApiError::forbidden(USER_NOT_FOUND));
    };

    if principal.role != required {
        warn!(
            user = %principal.username,
            role = %principal.role,
            required = %required,
            "Role denied"
        );
        return Err(ApiError::forbidden(ROLE_DENIED));
    }

    Ok(principal)
}

/// Token from `Authorization: <scheme> <token>`.
///
/// The scheme is `Bearer` or `JWT`; anything other than exactly two
/// space-separated parts counts as no token.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt") {
        Some(token)
    } else {
        None
    }
}

/// Constant-time string comparison.
///
/// Takes the same time however many leading characters match.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    // Pad both to the longer length; different pad bytes keep unequal
    // lengths unequal.
    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}
