//! E-mail domain allow-list for requests authenticated by the upstream identity provider.
//!
//! Sign-in itself happens in front of this service. The authenticating proxy
//! forwards the verified address in a header, and this guard only decides
//! whether that address belongs to an allowed organisation.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

pub const DEFAULT_EMAIL_HEADER: &str = "x-auth-request-email";

#[derive(Debug, Clone)]
pub struct EmailDomainPolicy {
    allowed_domains: Vec<String>,
    header: HeaderName,
}

impl EmailDomainPolicy {
    pub fn new<I, D>(allowed_domains: I, header: HeaderName) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        let allowed_domains = allowed_domains
            .into_iter()
            .map(|domain| {
                domain
                    .as_ref()
                    .trim()
                    .trim_start_matches('@')
                    .to_ascii_lowercase()
            })
            .filter(|domain| !domain.is_empty())
            .collect();

        Self {
            allowed_domains,
            header,
        }
    }

    /// Policy that admits every request.
    pub fn disabled() -> Self {
        Self::new(
            Vec::<String>::new(),
            HeaderName::from_static(DEFAULT_EMAIL_HEADER),
        )
    }

    pub fn is_enabled(&self) -> bool {
        !self.allowed_domains.is_empty()
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), AccessDenied> {
        if !self.is_enabled() {
            return Ok(());
        }

        let email = headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AccessDenied::MissingIdentity)?;

        let domain = email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_ascii_lowercase())
            .filter(|domain| !domain.is_empty())
            .ok_or(AccessDenied::MissingIdentity)?;

        if self.allowed_domains.iter().any(|allowed| *allowed == domain) {
            Ok(())
        } else {
            Err(AccessDenied::DomainNotAllowed { domain })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("authentication required")]
    MissingIdentity,
    #[error("e-mail domain {domain} is not allowed")]
    DomainNotAllowed { domain: String },
}

impl AccessDenied {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingIdentity => StatusCode::UNAUTHORIZED,
            Self::DomainNotAllowed { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

/// Wraps every route of `router` with the allow-list check.
pub fn guard_routes(router: Router, policy: Arc<EmailDomainPolicy>) -> Router {
    router.layer(middleware::from_fn_with_state(policy, enforce_policy))
}

async fn enforce_policy(
    State(policy): State<Arc<EmailDomainPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    match policy.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(denied) => {
            warn!(path = %request.uri().path(), reason = %denied, "request denied by domain policy");
            denied.into_response()
        }
    }
}
