//! Authorization module
//!
//! The structured authorization query assembled from a resolved event, and
//! the policy-engine seam it is submitted through. The engine only answers
//! allow/deny; assembling the query (and refusing to assemble one from an
//! unresolved event) happens upstream in the authorizer flow.

use crate::extract::EntityIdentifier;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod avp;

pub use avp::VerifiedPermissionsEngine;

/// Authorization errors
#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("Policy error: {0}")]
    PolicyError(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Action reference within the policy store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRef {
    #[serde(rename = "actionType")]
    pub action_type: String,
    #[serde(rename = "actionId")]
    pub action_id: String,
}

/// A fully assembled authorization query.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationQuery {
    #[serde(rename = "policyStoreId")]
    pub policy_store_id: String,
    pub principal: EntityIdentifier,
    pub action: ActionRef,
    pub resource: EntityIdentifier,
}

/// Policy-engine decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(self) -> bool {
        self == Decision::Allow
    }
}

/// Policy engine trait
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// Submit a query and return the engine's decision.
    async fn is_authorized(&self, query: &AuthorizationQuery) -> Result<Decision, AuthzError>;
}

/// No-op engine that always allows
pub struct AllowAllEngine;

#[async_trait]
impl PolicyEngine for AllowAllEngine {
    async fn is_authorized(&self, _query: &AuthorizationQuery) -> Result<Decision, AuthzError> {
        Ok(Decision::Allow)
    }
}

/// No-op engine that always denies
pub struct DenyAllEngine;

#[async_trait]
impl PolicyEngine for DenyAllEngine {
    async fn is_authorized(&self, _query: &AuthorizationQuery) -> Result<Decision, AuthzError> {
        Ok(Decision::Deny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_query() -> AuthorizationQuery {
        AuthorizationQuery {
            policy_store_id: "store-1".into(),
            principal: EntityIdentifier {
                entity_type: "User".into(),
                entity_id: "alice".into(),
            },
            action: ActionRef {
                action_type: "Action".into(),
                action_id: "getTicket".into(),
            },
            resource: EntityIdentifier {
                entity_type: "Ticket".into(),
                entity_id: "t1:abc".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_allow_all() {
        let engine = AllowAllEngine;
        let decision = engine.is_authorized(&test_query()).await.unwrap();
        assert!(decision.is_allow());
    }

    #[tokio::test]
    async fn test_deny_all() {
        let engine = DenyAllEngine;
        let decision = engine.is_authorized(&test_query()).await.unwrap();
        assert!(!decision.is_allow());
    }

    #[test]
    fn test_query_serializes_with_wire_names() {
        let value = serde_json::to_value(test_query()).unwrap();
        assert_eq!(value["policyStoreId"], "store-1");
        assert_eq!(value["principal"]["entityType"], "User");
        assert_eq!(value["action"]["actionId"], "getTicket");
    }
}
