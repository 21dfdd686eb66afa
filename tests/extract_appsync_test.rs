//! AppSync resolver integration tests

use komainu_authorizr::extract::extract_from_appsync;
use komainu_authorizr::schema::{merge_schemas, SchemaDocument};
use serde_json::json;

/// The merged tenant-grant superset used across resolver tests.
fn superset() -> SchemaDocument {
    let base = r#"
ns:
  entityTypes:
    Tenant: { shape: { type: Record } }
    User: { shape: { type: Record } }
    Role: { shape: { type: Record } }
    GlobalRole: { shape: { type: Record } }
    TenantGrant: { shape: { type: Record } }
  actions:
    Get: { appliesTo: { principalTypes: [User] } }
"#;
    let partial = r#"
ns:
  entityTypes:
    TenantGrant:
      resourceEntities:
        byTenantIdAndUserId: { id: "$tenantId:$userId", type: TenantGrant }
  actions:
    getTenantGrant:
      appliesTo: { resourceTypes: [TenantGrant] }
      entityMap: { TenantGrant: byTenantIdAndUserId }
      input:
        appsync:
          body: { tenantId: tenantId, userId: userId }
        rest:
          url: "/tenant-grant/:tenantId/:userId"
  mappings:
    actions:
      appsync: { path: info.fieldName }
      apiGateway: { path: requestContext.httpMethod }
"#;
    let merged = merge_schemas(base, partial).unwrap();
    SchemaDocument::parse(&merged.superset_json).unwrap()
}

#[test]
fn test_resolves_action_and_resource_from_arguments() {
    let event = json!({
        "info": {"fieldName": "getTenantGrant"},
        "arguments": {"tenantId": "acme", "userId": "alice"}
    });
    let out = extract_from_appsync(&event, &superset());
    assert_eq!(out.action.as_deref(), Some("getTenantGrant"));
    let resource = out.resource.unwrap();
    assert_eq!(resource.entity_type, "TenantGrant");
    assert_eq!(resource.entity_id, "acme:alice");
}

#[test]
fn test_unknown_action_returns_action_without_resource() {
    let event = json!({
        "info": {"fieldName": "listSomething"},
        "arguments": {}
    });
    let out = extract_from_appsync(&event, &superset());
    assert_eq!(out.action.as_deref(), Some("listSomething"));
    assert!(out.resource.is_none());
}

#[test]
fn test_action_without_resource_types_has_no_resource() {
    let event = json!({
        "info": {"fieldName": "Get"},
        "arguments": {}
    });
    let out = extract_from_appsync(&event, &superset());
    assert_eq!(out.action.as_deref(), Some("Get"));
    assert!(out.resource.is_none());
}

#[test]
fn test_absent_field_name_short_circuits() {
    let out = extract_from_appsync(&json!({"arguments": {"tenantId": "t"}}), &superset());
    assert!(out.action.is_none());
    assert!(out.resource.is_none());
    assert!(out.vars.is_empty());
}

#[test]
fn test_dotted_body_spec_reads_nested_argument() {
    let doc = SchemaDocument::parse(
        r#"
ns:
  entityTypes:
    Ticket:
      resourceEntities:
        byId: { id: "$id" }
  actions:
    getTicket:
      appliesTo: { resourceTypes: [Ticket] }
      entityMap: { Ticket: byId }
      input:
        appsync:
          body: { id: "$.ticket.id" }
"#,
    )
    .unwrap();
    let event = json!({
        "info": {"fieldName": "getTicket"},
        "arguments": {"ticket": {"id": "T-7"}}
    });
    let out = extract_from_appsync(&event, &doc);
    assert_eq!(out.resource.unwrap().entity_id, "T-7");
}

#[test]
fn test_custom_action_path_from_mappings() {
    let doc = SchemaDocument::parse(
        r#"
ns:
  actions:
    ping: { appliesTo: { principalTypes: [User] } }
  mappings:
    actions:
      appsync: { path: custom.operation }
"#,
    )
    .unwrap();
    let event = json!({"custom": {"operation": "ping"}});
    let out = extract_from_appsync(&event, &doc);
    assert_eq!(out.action.as_deref(), Some("ping"));
}
