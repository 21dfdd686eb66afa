//! Amazon Verified Permissions engine
//!
//! Thin client over the `IsAuthorized` API. Anything other than an explicit
//! ALLOW from the service is treated as a deny.

use super::{AuthorizationQuery, AuthzError, Decision, PolicyEngine};
use async_trait::async_trait;
use aws_sdk_verifiedpermissions::types::{
    ActionIdentifier as AvpAction, Decision as AvpDecision, EntityIdentifier as AvpEntity,
};
use aws_sdk_verifiedpermissions::Client;

/// Verified Permissions policy engine
pub struct VerifiedPermissionsEngine {
    client: Client,
}

impl VerifiedPermissionsEngine {
    /// Create an engine from the ambient AWS configuration (region,
    /// credentials and endpoint resolution all follow the default chain).
    pub async fn new() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Create an engine from an existing client (tests, custom endpoints).
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicyEngine for VerifiedPermissionsEngine {
    async fn is_authorized(&self, query: &AuthorizationQuery) -> Result<Decision, AuthzError> {
        let principal = AvpEntity::builder()
            .entity_type(&query.principal.entity_type)
            .entity_id(&query.principal.entity_id)
            .build()
            .map_err(|e| AuthzError::PolicyError(e.to_string()))?;
        let action = AvpAction::builder()
            .action_type(&query.action.action_type)
            .action_id(&query.action.action_id)
            .build()
            .map_err(|e| AuthzError::PolicyError(e.to_string()))?;
        let resource = AvpEntity::builder()
            .entity_type(&query.resource.entity_type)
            .entity_id(&query.resource.entity_id)
            .build()
            .map_err(|e| AuthzError::PolicyError(e.to_string()))?;

        let output = self
            .client
            .is_authorized()
            .policy_store_id(&query.policy_store_id)
            .principal(principal)
            .action(action)
            .resource(resource)
            .send()
            .await
            .map_err(|e| AuthzError::BackendError(e.to_string()))?;

        let decision = match output.decision() {
            AvpDecision::Allow => Decision::Allow,
            _ => Decision::Deny,
        };
        Ok(decision)
    }
}
