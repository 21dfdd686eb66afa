//! Authentication module
//!
//! Bearer-token extraction from either authorizer event shape, and JWT
//! verification of the extracted token.

use crate::event::{is_api_gateway_event, is_appsync_event};
use serde_json::Value;
use thiserror::Error;

pub mod jwt;

pub use jwt::{Claims, JwtAuthenticator};

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid signature")]
    InvalidSignature,
}

/// Extract the bearer token from an authorizer event.
///
/// API Gateway carries it in the `Authorization` header (either header
/// casing, `Bearer` prefix required, case-insensitive). AppSync carries it in
/// `authorizationToken`, where a `Bearer` prefix is accepted but optional.
pub fn bearer_token(event: &Value) -> Option<String> {
    if is_api_gateway_event(event) {
        let headers = event.get("headers")?.as_object()?;
        let header = headers
            .get("authorization")
            .or_else(|| headers.get("Authorization"))?
            .as_str()?;
        return strip_bearer(header.trim());
    }
    if is_appsync_event(event) {
        let raw = event.get("authorizationToken")?.as_str()?.trim();
        if raw.is_empty() {
            return None;
        }
        return strip_bearer(raw).or_else(|| Some(raw.to_string()));
    }
    None
}

/// Strip a case-insensitive `Bearer` prefix followed by whitespace.
fn strip_bearer(value: &str) -> Option<String> {
    let mut parts = value.splitn(2, char::is_whitespace);
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = parts.next()?.trim_start();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
