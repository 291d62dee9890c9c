//! Explicit session context
//!
//! Every view and mutation takes a [`Session`] argument instead of reading a
//! global. The HTTP layer builds it from the `x-peerpool-user` header;
//! signing in and issuing that header belongs to the auth provider in front
//! of this service.

use crate::error::PeerpoolError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

pub const SESSION_HEADER: &str = "x-peerpool-user";

/// The signed-in user for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The current user, or `None` when nobody is signed in
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Session::new)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = PeerpoolError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Session::from_headers(&parts.headers).ok_or(PeerpoolError::Unauthenticated)
    }
}
