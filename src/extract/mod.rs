//! Event resolvers
//!
//! Runtime counterpart of the superset validator: turn an inbound authorizer
//! event plus the merged superset document into an action identifier and a
//! concrete resource entity. Everything here fails closed by omission -
//! a missing mapping, template or body never raises, it just leaves the
//! corresponding field unset, and the caller denies on unset fields.

use crate::mapping::{get_by_path, substitute, value_to_string};
use crate::schema::{ActionDef, NamespaceBody};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub mod apigateway;
pub mod appsync;

pub use apigateway::extract_from_api_gateway;
pub use appsync::extract_from_appsync;

/// An entity reference (type + id), used both for resolved resources and for
/// principals in authorization queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityIdentifier {
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(rename = "entityId")]
    pub entity_id: String,
}

/// Outcome of resolving one event. Constructed fresh per request, never
/// persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractResult {
    /// Action identifier, when one could be extracted.
    pub action: Option<String>,
    /// Bound resource entity, when the action's identity template resolved.
    pub resource: Option<EntityIdentifier>,
    /// Variables gathered from the configured input channels.
    pub vars: BTreeMap<String, Value>,
}

impl ExtractResult {
    fn empty() -> Self {
        Self::default()
    }

    fn unresolved(action: String, vars: BTreeMap<String, Value>) -> Self {
        Self {
            action: Some(action),
            resource: None,
            vars,
        }
    }
}

/// Extract the action identifier from an event via a dotted path, coercing
/// to string. Absent or empty values mean "no action".
pub(crate) fn action_id(event: &Value, path: &str) -> Option<String> {
    let raw = get_by_path(event, path)?;
    let id = value_to_string(raw);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Resolve the bound resource for an action from gathered variables: first
/// declared resource type -> entityMap template name -> identity template.
/// Any missing link yields `None`.
///
/// Only the first declared resource type is bound at request time; the
/// validator checks coverage for all of them.
pub(crate) fn resolve_resource(
    body: &NamespaceBody,
    action: &ActionDef,
    vars: &BTreeMap<String, Value>,
) -> Option<EntityIdentifier> {
    let resource_type = *action.resource_types().first()?;
    let template_name = action.entity_map.as_ref()?.get(resource_type)?;
    let template = body
        .entity_types
        .get(resource_type)?
        .resource_entities
        .as_ref()?
        .get(template_name)?;
    let entity_type = template
        .entity_type
        .clone()
        .unwrap_or_else(|| resource_type.to_string());
    Some(EntityIdentifier {
        entity_type,
        entity_id: substitute(&template.id, vars),
    })
}
