//! Acting-user identity carried into the workflow core.
//!
//! Authentication itself happens in an upstream middleware layer that is not
//! part of this service; it stores the resolved [`AuthUser`] in the request
//! extensions. A header fallback keeps local tooling and tests simple.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::ServiceError;

/// The authenticated operator performing a workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    /// Dealer scope of the operator, recorded on lost-order bookkeeping.
    pub dealer_id: Option<i32>,
}

fn header_i32(parts: &Parts, name: &str) -> Option<i32> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let id = header_i32(parts, "x-user-id")
            .ok_or_else(|| ServiceError::Unauthorized("احراز هویت انجام نشد.".to_string()))?;
        let dealer_id = header_i32(parts, "x-dealer-id");

        Ok(AuthUser { id, dealer_id })
    }
}
