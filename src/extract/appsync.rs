//! AppSync event resolver

use super::{action_id, resolve_resource, ExtractResult};
use crate::mapping::get_from_json_body;
use crate::schema::{SchemaDocument, APPSYNC_INTEGRATION};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default action-identifier path for AppSync authorizer events.
const DEFAULT_ACTION_PATH: &str = "info.fieldName";

/// Resolve an AppSync authorizer event against the merged superset.
///
/// Variables come from the event's `arguments` object through the action's
/// `input.appsync.body` field specs.
pub fn extract_from_appsync(event: &Value, doc: &SchemaDocument) -> ExtractResult {
    let body = doc.body();
    let path = body
        .mappings
        .as_ref()
        .and_then(|m| m.action_path(APPSYNC_INTEGRATION))
        .unwrap_or(DEFAULT_ACTION_PATH);

    let Some(action) = action_id(event, path) else {
        return ExtractResult::empty();
    };
    let Some(action_def) = body.actions.get(&action) else {
        return ExtractResult::unresolved(action, BTreeMap::new());
    };

    let mut vars = BTreeMap::new();
    if let Some(fields) = action_def
        .input_for(APPSYNC_INTEGRATION)
        .and_then(|spec| spec.body.as_ref())
    {
        let arguments = event.get("arguments");
        for (name, spec) in fields {
            let value = get_from_json_body(arguments, spec)
                .cloned()
                .unwrap_or(Value::Null);
            vars.insert(name.clone(), value);
        }
    }

    let resource = resolve_resource(body, action_def, &vars);
    ExtractResult {
        action: Some(action),
        resource,
        vars,
    }
}
