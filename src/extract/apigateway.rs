//! API Gateway event resolver

use super::{action_id, resolve_resource, ExtractResult};
use crate::mapping::{get_from_json_body, parse_url_template};
use crate::schema::{QuerySpec, SchemaDocument, API_GATEWAY_INTEGRATION, REST_INTEGRATION};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default action-identifier path for API Gateway request-authorizer events.
const DEFAULT_ACTION_PATH: &str = "requestContext.httpMethod";

/// Resolve an API Gateway request-authorizer event against the merged
/// superset.
///
/// Variables come from three REST channels declared under `input.rest`:
/// the `:name` URL template matched against the request path, query string
/// parameters, and JSON body fields. An unparsable body counts as no body.
pub fn extract_from_api_gateway(event: &Value, doc: &SchemaDocument) -> ExtractResult {
    let body = doc.body();
    let path = body
        .mappings
        .as_ref()
        .and_then(|m| m.action_path(API_GATEWAY_INTEGRATION))
        .unwrap_or(DEFAULT_ACTION_PATH);

    let Some(action) = action_id(event, path) else {
        return ExtractResult::empty();
    };
    let Some(action_def) = body.actions.get(&action) else {
        return ExtractResult::unresolved(action, BTreeMap::new());
    };

    let mut vars = BTreeMap::new();
    if let Some(rest) = action_def.input_for(REST_INTEGRATION) {
        if let Some(url) = rest.url.as_deref().filter(|u| !u.is_empty()) {
            if let Some(bound) = parse_url_template(url, raw_path(event)) {
                for (name, value) in bound {
                    vars.insert(name, Value::String(value));
                }
            }
        }

        if let Some(query) = &rest.query {
            let params = event.get("queryStringParameters");
            match query {
                QuerySpec::Name(name) => {
                    vars.insert(name.clone(), query_param(params, name));
                }
                QuerySpec::Map(map) => {
                    for (name, key) in map {
                        vars.insert(name.clone(), query_param(params, key));
                    }
                }
            }
        }

        if let Some(fields) = &rest.body {
            let parsed = parse_body(event);
            for (name, spec) in fields {
                let value = get_from_json_body(parsed.as_ref(), spec)
                    .cloned()
                    .unwrap_or(Value::Null);
                vars.insert(name.clone(), value);
            }
        }
    }

    let resource = resolve_resource(body, action_def, &vars);
    ExtractResult {
        action: Some(action),
        resource,
        vars,
    }
}

/// Request path: `rawPath` with a fallback to the legacy `path` attribute.
fn raw_path(event: &Value) -> &str {
    event
        .get("rawPath")
        .and_then(Value::as_str)
        .or_else(|| event.get("path").and_then(Value::as_str))
        .unwrap_or("")
}

/// One query-string parameter by name, `Null` when absent.
fn query_param(params: Option<&Value>, key: &str) -> Value {
    params
        .and_then(Value::as_object)
        .and_then(|map| map.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Best-effort body parse: a string body is parsed as JSON with failures
/// treated as no body; a non-string body is used as-is.
fn parse_body(event: &Value) -> Option<Value> {
    match event.get("body") {
        Some(Value::String(text)) => serde_json::from_str(text).ok(),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.clone()),
    }
}
