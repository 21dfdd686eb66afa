//! Authorizer event classification
//!
//! Inbound events arrive untyped; which gateway produced one is decided by
//! shape, the same way the upstream SDK type guards do it. Events stay
//! `serde_json::Value` throughout because the action-identifier path into
//! them is runtime configuration.

use serde_json::Value;

/// Which gateway integration produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ApiGateway,
    AppSync,
    Unknown,
}

/// True for an API Gateway request-authorizer event: a string `methodArn`,
/// a string `type` and a `headers` object.
pub fn is_api_gateway_event(event: &Value) -> bool {
    let Some(obj) = event.as_object() else {
        return false;
    };
    obj.get("methodArn").map(Value::is_string).unwrap_or(false)
        && obj.get("type").map(Value::is_string).unwrap_or(false)
        && obj.get("headers").map(Value::is_object).unwrap_or(false)
}

/// True for an AppSync authorizer event: a string `authorizationToken` and a
/// string `requestContext.apiId`.
pub fn is_appsync_event(event: &Value) -> bool {
    let Some(obj) = event.as_object() else {
        return false;
    };
    let has_token = obj
        .get("authorizationToken")
        .map(Value::is_string)
        .unwrap_or(false);
    let has_api_id = obj
        .get("requestContext")
        .and_then(Value::as_object)
        .and_then(|ctx| ctx.get("apiId"))
        .map(Value::is_string)
        .unwrap_or(false);
    has_token && has_api_id
}

/// Classify an event, API Gateway first (matching the upstream guard order).
pub fn classify(event: &Value) -> EventKind {
    if is_api_gateway_event(event) {
        EventKind::ApiGateway
    } else if is_appsync_event(event) {
        EventKind::AppSync
    } else {
        EventKind::Unknown
    }
}
