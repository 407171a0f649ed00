//! Tenant resolution from the `Host` header.
//!
//! Every tenant route runs behind [`resolve_tenant`]. It maps the request host
//! (port stripped, lowercased) to a tenant through the `domains` table and
//! stores the result as a [`CurrentTenant`] request extension. Unknown hosts
//! get a 404 before any handler runs.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::HOST, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Span;

use stylecore_core::TenantScope;

use crate::error::AppError;
use crate::models::Tenant;
use crate::state::AppState;

/// The tenant a request was resolved to.
#[derive(Debug, Clone)]
pub struct CurrentTenant {
    pub tenant: Tenant,
    /// Normalized host the request arrived on.
    pub host: String,
}

impl CurrentTenant {
    /// Scope for every store call made on behalf of this request.
    #[must_use]
    pub fn scope(&self) -> TenantScope {
        self.tenant.scope()
    }

    /// `scheme://host` of this tenant, for links in emails and OAuth redirects.
    #[must_use]
    pub fn origin(&self, scheme: &str) -> String {
        format!("{scheme}://{}", self.host)
    }
}

/// Normalize a `Host` header value: drop the port and lowercase.
///
/// IPv6 literals keep their brackets.
#[must_use]
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let host = if raw.starts_with('[') {
        raw.split_once(']')
            .map_or(raw, |(addr, _)| addr)
            .to_owned()
            + "]"
    } else {
        raw.split(':').next().unwrap_or(raw).to_owned()
    };
    host.to_lowercase()
}

/// Resolve the tenant for the request host, or answer 404.
pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(host) = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(normalize_host)
        .filter(|h| !h.is_empty())
    else {
        tracing::debug!("Request without a Host header");
        return StatusCode::NOT_FOUND.into_response();
    };

    let tenant = match state.store().tenant_for_domain(&host).await {
        Ok(Some(tenant)) => tenant,
        Ok(None) => {
            tracing::debug!(host = %host, "No tenant for host");
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    Span::current().record("tenant_id", tenant.id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("tenant_id", tenant.id.as_str());
    });

    request
        .extensions_mut()
        .insert(CurrentTenant { tenant, host });
    next.run(request).await
}

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(StatusCode::NOT_FOUND)
    }
}
