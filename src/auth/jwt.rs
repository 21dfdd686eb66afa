//! JWT verification
//!
//! Verifies the bearer token carried by an authorizer event. HS256 with a
//! shared secret is the deployed configuration; expiry is always enforced,
//! issuer and audience only when configured.

use super::AuthError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
}

impl Claims {
    /// Subject for the authorization query. Tokens without a `sub` claim
    /// fall back to a fixed placeholder so the principal id is never empty.
    pub fn subject(&self) -> &str {
        self.sub.as_deref().unwrap_or("subject")
    }
}

/// JWT verifier
///
/// # Example
///
/// ```
/// use komainu_authorizr::auth::JwtAuthenticator;
///
/// let auth = JwtAuthenticator::new_hs256("my-secret")
///     .with_issuer("https://auth.example.com")
///     .with_audience("my-api");
/// ```
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    /// Create a verifier with a shared secret (HS256)
    pub fn new_hs256(secret: &str) -> Self {
        Self::hmac(secret, Algorithm::HS256)
    }

    /// Create a verifier with a shared secret (HS384)
    pub fn new_hs384(secret: &str) -> Self {
        Self::hmac(secret, Algorithm::HS384)
    }

    /// Create a verifier with a shared secret (HS512)
    pub fn new_hs512(secret: &str) -> Self {
        Self::hmac(secret, Algorithm::HS512)
    }

    fn hmac(secret: &str, algorithm: Algorithm) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false; // Only validate aud when explicitly set

        Self {
            decoding_key,
            validation,
        }
    }

    /// Set the required issuer (`iss` claim)
    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    /// Set the required audience (`aud` claim)
    #[must_use]
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Verify a token and return its claims.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidToken(e.to_string()),
            },
        )?;
        Ok(token_data.claims)
    }
}
