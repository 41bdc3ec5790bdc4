//! # Caller Credentials
//!
//! ghdb holds no accounts of its own. Callers present their GitHub
//! credentials on every request and the service acts with them:
//!
//! ```text
//! Authorization: Bearer <github token>
//! X-Ghdb-Login:  <github login>
//! X-Ghdb-Email:  <commit email>        (optional)
//! ```
//!
//! Handlers take a [`Caller`]; a missing or malformed header is a 401,
//! and so is a login that is not the token's owner (see
//! [`crate::identity`]).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use ghdb_core::QualifiedName;
use ghdb_github::Credentials;

use crate::error::AppError;
use crate::state::AppState;

pub const LOGIN_HEADER: &str = "x-ghdb-login";
pub const EMAIL_HEADER: &str = "x-ghdb-email";

/// Credentials of the authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller(pub Credentials);

impl Caller {
    pub fn credentials(&self) -> &Credentials {
        &self.0
    }

    pub fn login(&self) -> &str {
        self.0.login()
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let creds = credentials_from_headers(&parts.headers)?;
        state.identities.verify(&creds).await?;
        Ok(Caller(creds))
    }
}

fn credentials_from_headers(headers: &HeaderMap) -> Result<Credentials, AppError> {
    let token = header_str(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

    let login = header_str(headers, LOGIN_HEADER)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing login".into()))?;
    QualifiedName::service_entity(login)
        .map_err(|_| AppError::Unauthorized("invalid login".into()))?;

    let mut creds = Credentials::new(token, login);
    if let Some(email) = header_str(headers, EMAIL_HEADER) {
        creds = creds.with_email(email.trim());
    }
    Ok(creds)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
