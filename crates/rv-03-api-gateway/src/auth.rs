//! Bearer authentication.
//!
//! `StaticTokenResolver` is the configured stand-in for an external identity
//! provider; anything implementing [`IdentityResolver`] can replace it.

use crate::domain::config::TokenEntry;
use crate::domain::error::ApiError;
use crate::service::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use shared_types::{IdentityError, IdentityResolver, Principal, ResolvedIdentity, Role};
use tracing::debug;

/// Resolves tokens from the `[[auth.tokens]]` table.
pub struct StaticTokenResolver {
    entries: Vec<TokenEntry>,
}

impl StaticTokenResolver {
    pub fn new(entries: Vec<TokenEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve(&self, credential: &str) -> Result<ResolvedIdentity, IdentityError> {
        // Every entry is compared so the scan time does not depend on the match.
        let mut found = None;
        for entry in &self.entries {
            if constant_time_compare(credential, &entry.token) && found.is_none() {
                found = Some(entry);
            }
        }
        found
            .map(TokenEntry::identity)
            .ok_or(IdentityError::InvalidCredential)
    }
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    // Pad both to the longer length; differing pad bytes force a mismatch.
    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// The authenticated caller of a REST route.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

impl AuthenticatedPrincipal {
    /// Refuse callers whose role is not in `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<&Principal, ApiError> {
        if roles.contains(&self.0.role) {
            Ok(&self.0)
        } else {
            Err(ApiError::forbidden(format!(
                "role {} may not perform this operation",
                self.0.role
            )))
        }
    }

    pub fn require_admin(&self) -> Result<&Principal, ApiError> {
        self.require_role(&[Role::Admin])
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        let principal = state.resolver.authenticate(&token).await?;
        debug!(user_id = %principal.user_id, role = %principal.role, "Request authenticated");
        Ok(Self(principal))
    }
}
