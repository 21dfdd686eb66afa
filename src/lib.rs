//! Komainu Authorizr Library
//!
//! Schema-driven Lambda authorizer core for Amazon Verified Permissions.
//!
//! # Features
//!
//! - **Schema Merging**: Compose per-tenant schema extensions onto a shared
//!   base Cedar schema under strict extension-only rules
//! - **Build-Time Validation**: Prove every resource-identity variable is
//!   derivable from the declared request inputs before a schema ships
//! - **Event Resolution**: Map API Gateway and AppSync authorizer events to
//!   a concrete action and resource entity
//! - **Fail Closed**: Unresolvable requests deny, never default to an
//!   unrestricted resource
//!
//! # Example
//!
//! ```no_run
//! use komainu_authorizr::auth::JwtAuthenticator;
//! use komainu_authorizr::authorizer::Authorizer;
//! use komainu_authorizr::authz::VerifiedPermissionsEngine;
//! use komainu_authorizr::schema::SchemaDocument;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let schema = SchemaDocument::load("schema.merged.json")?;
//!     let authorizer = Authorizer::new(
//!         schema,
//!         JwtAuthenticator::new_hs256("secret"),
//!         Arc::new(VerifiedPermissionsEngine::new().await),
//!         "policy-store-id",
//!     );
//!     let event = serde_json::json!({});
//!     let response = authorizer.respond(&event).await;
//!     println!("{response}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod authorizer;
pub mod authz;
pub mod config;
pub mod event;
pub mod extract;
pub mod mapping;
pub mod schema;

// Re-export commonly used types
pub use authorizer::Authorizer;
pub use config::Config;
pub use schema::{merge_schemas, validate_superset, SchemaDocument};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
