//! Hospital tenant extraction.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::server::AppState;

/// The hospital tenant of a request, read from the configured tenant header.
///
/// A missing or non-UTF-8 header yields an empty tenant, which the search
/// service answers with no patients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant(pub String);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let hospital = parts
            .headers
            .get(&state.tenant_header)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(Self(hospital))
    }
}
