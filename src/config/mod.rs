//! Configuration module
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
fn expand_env_vars(s: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let var_name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = cap.get(2) {
                    default.as_str().to_string()
                } else {
                    // No env var and no default. Keep the original placeholder.
                    full_match.as_str().to_string()
                }
            }
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Custom deserializer for strings with environment variable expansion.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub authorizer: AuthorizerConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authorizer.policy_store_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "authorizer.policy_store_id must not be empty".into(),
            ));
        }
        if self.schema.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "schema.path must not be empty".into(),
            ));
        }
        if let Some(ref jwt) = self.auth.jwt {
            match jwt.algorithm.as_str() {
                "HS256" | "HS384" | "HS512" => {}
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "Invalid JWT algorithm '{}': must be 'HS256', 'HS384' or 'HS512'",
                        other
                    )))
                }
            }
            if jwt.secret.trim().is_empty() || jwt.secret.starts_with("${") {
                return Err(ConfigError::ValidationError(
                    "auth.jwt.secret is not configured".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Authorizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    /// Verified Permissions policy store. Supports ${VAR} and
    /// ${VAR:-default} expansion.
    #[serde(deserialize_with = "deserialize_with_env")]
    pub policy_store_id: String,

    /// Entity type bound to the authenticated principal. Default: "User"
    #[serde(default = "default_principal_type")]
    pub principal_entity_type: String,

    /// Entity type qualifying action ids. Default: "Action"
    #[serde(default = "default_action_type")]
    pub action_entity_type: String,
}

fn default_principal_type() -> String {
    "User".to_string()
}

fn default_action_type() -> String {
    "Action".to_string()
}

/// Merged-schema location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Path to the merged superset document (JSON or YAML).
    /// Default: "schema.merged.json"
    #[serde(default = "default_schema_path")]
    pub path: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
        }
    }
}

fn default_schema_path() -> String {
    "schema.merged.json".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt: Option<JwtConfig>,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared secret. Supports ${VAR} and ${VAR:-default} expansion.
    #[serde(deserialize_with = "deserialize_with_env")]
    pub secret: String,

    /// Signing algorithm. Default: "HS256"
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    #[serde(default)]
    pub issuer: Option<String>,

    #[serde(default)]
    pub audience: Option<String>,
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}
