//! Authorizer flow
//!
//! End-to-end request processing: classify the event, verify the bearer
//! token, resolve the action and resource through the merged superset, submit
//! the authorization query and render a gateway response. Every failure on
//! the way denies; nothing in this module defaults to an unrestricted
//! resource or an allow.

use crate::auth::{bearer_token, JwtAuthenticator};
use crate::authz::{ActionRef, AuthorizationQuery, AuthzError, PolicyEngine};
use crate::config::Config;
use crate::event::{classify, EventKind};
use crate::extract::{extract_from_api_gateway, extract_from_appsync, EntityIdentifier};
use crate::schema::{SchemaDocument, SchemaError};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Authorizer setup errors
#[derive(Error, Debug)]
pub enum AuthorizerError {
    #[error("auth.jwt must be configured")]
    MissingJwtConfig,

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Entity type used for principals in authorization queries.
pub const DEFAULT_PRINCIPAL_TYPE: &str = "User";
/// Entity type used for actions in authorization queries.
pub const DEFAULT_ACTION_TYPE: &str = "Action";

/// Request authorizer
///
/// Holds the merged superset document (constructed once, shared immutably),
/// the JWT verifier and the policy engine. All methods are safe to call
/// concurrently; nothing here mutates shared state.
pub struct Authorizer {
    schema: SchemaDocument,
    jwt: JwtAuthenticator,
    engine: Arc<dyn PolicyEngine>,
    policy_store_id: String,
    principal_type: String,
    action_type: String,
}

impl Authorizer {
    pub fn new(
        schema: SchemaDocument,
        jwt: JwtAuthenticator,
        engine: Arc<dyn PolicyEngine>,
        policy_store_id: impl Into<String>,
    ) -> Self {
        Self {
            schema,
            jwt,
            engine,
            policy_store_id: policy_store_id.into(),
            principal_type: DEFAULT_PRINCIPAL_TYPE.to_string(),
            action_type: DEFAULT_ACTION_TYPE.to_string(),
        }
    }

    /// Build an authorizer from configuration: reads the merged schema from
    /// `schema.path` and wires the JWT verifier from `auth.jwt`.
    pub fn from_config(
        config: &Config,
        engine: Arc<dyn PolicyEngine>,
    ) -> Result<Self, AuthorizerError> {
        let jwt_config = config
            .auth
            .jwt
            .as_ref()
            .ok_or(AuthorizerError::MissingJwtConfig)?;
        let mut jwt = match jwt_config.algorithm.as_str() {
            "HS384" => JwtAuthenticator::new_hs384(&jwt_config.secret),
            "HS512" => JwtAuthenticator::new_hs512(&jwt_config.secret),
            _ => JwtAuthenticator::new_hs256(&jwt_config.secret),
        };
        if let Some(issuer) = &jwt_config.issuer {
            jwt = jwt.with_issuer(issuer);
        }
        if let Some(audience) = &jwt_config.audience {
            jwt = jwt.with_audience(audience);
        }
        let schema = SchemaDocument::load(&config.schema.path)?;
        Ok(
            Self::new(schema, jwt, engine, &config.authorizer.policy_store_id)
                .with_principal_type(&config.authorizer.principal_entity_type)
                .with_action_type(&config.authorizer.action_entity_type),
        )
    }

    /// Override the principal entity type (default `User`).
    #[must_use]
    pub fn with_principal_type(mut self, entity_type: &str) -> Self {
        self.principal_type = entity_type.to_string();
        self
    }

    /// Override the action entity type (default `Action`).
    #[must_use]
    pub fn with_action_type(mut self, action_type: &str) -> Self {
        self.action_type = action_type.to_string();
        self
    }

    /// Assemble the authorization query for an event.
    ///
    /// Fails when the event cannot be classified or when the resolver leaves
    /// the action or resource unset; callers must translate that into a deny.
    pub fn build_query(
        &self,
        event: &Value,
        principal_id: &str,
    ) -> Result<AuthorizationQuery, AuthzError> {
        let extracted = match classify(event) {
            EventKind::ApiGateway => extract_from_api_gateway(event, &self.schema),
            EventKind::AppSync => extract_from_appsync(event, &self.schema),
            EventKind::Unknown => {
                return Err(AuthzError::PolicyError(
                    "unrecognized authorizer event shape".into(),
                ))
            }
        };
        let Some(action_id) = extracted.action else {
            return Err(AuthzError::PolicyError(
                "missing action identifier for event".into(),
            ));
        };
        let Some(resource) = extracted.resource else {
            return Err(AuthzError::PolicyError(format!(
                "missing resource template for action {action_id}"
            )));
        };
        Ok(AuthorizationQuery {
            policy_store_id: self.policy_store_id.clone(),
            principal: EntityIdentifier {
                entity_type: self.principal_type.clone(),
                entity_id: principal_id.to_string(),
            },
            action: ActionRef {
                action_type: self.action_type.clone(),
                action_id,
            },
            resource,
        })
    }

    /// Authenticate and authorize one event. Fail-closed: any missing token,
    /// failed verification, unresolved mapping or engine error denies.
    pub async fn authorize_event(&self, event: &Value) -> bool {
        let Some(token) = bearer_token(event) else {
            warn!("denying request without bearer token");
            return false;
        };
        let claims = match self.jwt.authenticate(&token) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(error = %err, "denying request with unverifiable token");
                return false;
            }
        };
        let query = match self.build_query(event, claims.subject()) {
            Ok(query) => query,
            Err(err) => {
                warn!(error = %err, "refusing request due to mapping/schema error");
                return false;
            }
        };
        match self.engine.is_authorized(&query).await {
            Ok(decision) => decision.is_allow(),
            Err(err) => {
                warn!(error = %err, "denying request after engine error");
                false
            }
        }
    }

    /// Process one event and render the gateway-shaped response.
    pub async fn respond(&self, event: &Value) -> Value {
        let allowed = self.authorize_event(event).await;
        match classify(event) {
            EventKind::ApiGateway => {
                let arn = event
                    .get("methodArn")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                // API Gateway requires a principal id; use a placeholder on deny.
                let principal = if allowed { "subject" } else { "anonymous" };
                api_gateway_policy(allowed, arn, principal)
            }
            _ => appsync_auth_result(allowed),
        }
    }
}

/// IAM policy document response for an API Gateway request authorizer.
pub fn api_gateway_policy(allow: bool, resource_arn: &str, principal_id: &str) -> Value {
    let effect = if allow { "Allow" } else { "Deny" };
    json!({
        "principalId": principal_id,
        "policyDocument": {
            "Version": "2012-10-17",
            "Statement": [{
                "Action": "execute-api:Invoke",
                "Effect": effect,
                "Resource": resource_arn
            }]
        },
        "context": {}
    })
}

/// AppSync authorizer response.
pub fn appsync_auth_result(is_authorized: bool) -> Value {
    json!({ "isAuthorized": is_authorized })
}
