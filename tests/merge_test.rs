//! Schema merge integration tests
//!
//! Exercises the extension-only merge rules end to end on YAML documents:
//! tenant partials may add new entity types and actions, may extend existing
//! ones with identity templates and input declarations, and may touch
//! nothing else.

use komainu_authorizr::schema::{
    merge_schemas, prune_for_cedar, validate_superset, SchemaDocument, PRINCIPAL_TYPES,
};
use serde_json::Value;

const BASE_YAML: &str = r#"
ns:
  entityTypes:
    Tenant: { shape: { type: Record, attributes: {} } }
    User: { shape: { type: Record, attributes: {} } }
    Role: { shape: { type: Record, attributes: {} } }
    GlobalRole: { shape: { type: Record, attributes: {} } }
    TenantGrant:
      memberOfTypes: [Role, Tenant, User]
      shape: { type: Record, attributes: { tenantId: { type: String }, userId: { type: String } } }
  actions:
    Get: { appliesTo: { principalTypes: [User, GlobalRole, Role, Tenant, TenantGrant] } }
"#;

const PARTIAL_YAML: &str = r#"
ns:
  entityTypes:
    TenantGrant:
      resourceEntities:
        byTenantIdAndUserId:
          id: "$tenantId:$userId"
          type: TenantGrant
          attributes: { tenantId: "$tenantId", userId: "$userId" }
          parents: []
  actions:
    getTenantGrant:
      memberOf: [Get]
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

#[test]
fn test_merge_keeps_extensions_in_superset_and_strips_them_from_cedar() {
    let result = merge_schemas(BASE_YAML, PARTIAL_YAML).unwrap();
    assert_eq!(result.namespace, "ns");

    let superset: Value = serde_json::from_str(&result.superset_json).unwrap();
    assert!(
        superset["ns"]["entityTypes"]["TenantGrant"]["resourceEntities"]["byTenantIdAndUserId"]
            .is_object()
    );
    assert_eq!(
        superset["ns"]["actions"]["getTenantGrant"]["entityMap"]["TenantGrant"],
        "byTenantIdAndUserId"
    );

    let cedar: Value = serde_json::from_str(&result.cedar_json).unwrap();
    assert!(cedar["ns"]["entityTypes"]["TenantGrant"]["resourceEntities"].is_null());
    assert!(cedar["ns"]["actions"]["getTenantGrant"]["entityMap"].is_null());
    assert!(cedar["ns"]["actions"]["getTenantGrant"]["input"].is_null());
    assert!(cedar["ns"]["mappings"].is_null());

    // The merged superset passes coverage validation.
    let superset = SchemaDocument::from_json_value(superset).unwrap();
    assert!(validate_superset(&superset).is_empty());
}

#[test]
fn test_merge_preserves_base_engine_fields_byte_identical() {
    let result = merge_schemas(BASE_YAML, PARTIAL_YAML).unwrap();
    let superset: Value = serde_json::from_str(&result.superset_json).unwrap();
    let base = SchemaDocument::parse(BASE_YAML).unwrap();
    let base_value = base.to_json_value().unwrap();

    // Pre-existing entity shapes and the base action survive untouched.
    for entity in ["Tenant", "User", "Role", "GlobalRole"] {
        assert_eq!(
            superset["ns"]["entityTypes"][entity],
            base_value["ns"]["entityTypes"][entity],
            "entity {entity} changed across merge"
        );
    }
    assert_eq!(
        superset["ns"]["entityTypes"]["TenantGrant"]["shape"],
        base_value["ns"]["entityTypes"]["TenantGrant"]["shape"]
    );
    assert_eq!(superset["ns"]["actions"]["Get"], base_value["ns"]["actions"]["Get"]);
}

#[test]
fn test_merge_rejects_every_principal_as_new_type() {
    let base = "ns:\n  entityTypes: {}\n  actions: {}\n";
    for principal in PRINCIPAL_TYPES {
        let partial = format!(
            "ns:\n  entityTypes:\n    {principal}: {{ shape: {{ type: Record }} }}\n"
        );
        let err = merge_schemas(base, &partial).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("cannot add or modify principal type {principal}")
        );
    }
}

#[test]
fn test_merge_rejects_engine_field_overrides() {
    let bad_entity = "ns:\n  entityTypes:\n    Tenant: { shape: { type: Record, attributes: { x: { type: String } } } }\n";
    let err = merge_schemas(BASE_YAML, bad_entity).unwrap_err();
    assert_eq!(err.to_string(), "cannot override base entityType Tenant.shape");

    let bad_action = "ns:\n  actions:\n    Get: { appliesTo: { resourceTypes: [User] } }\n";
    let err = merge_schemas(BASE_YAML, bad_action).unwrap_err();
    assert_eq!(err.to_string(), "cannot override base action Get.appliesTo");
}

#[test]
fn test_merge_rejects_duplicate_template_and_entity_map_key() {
    let with_template = merge_schemas(BASE_YAML, PARTIAL_YAML).unwrap();
    let superset = with_template.superset_json;

    let redefine_template = r#"
ns:
  entityTypes:
    TenantGrant:
      resourceEntities:
        byTenantIdAndUserId: { id: "$other" }
"#;
    let err = merge_schemas(&superset, redefine_template).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot override existing resourceEntities template TenantGrant.byTenantIdAndUserId"
    );

    let redefine_entity_map = r#"
ns:
  actions:
    getTenantGrant:
      entityMap: { TenantGrant: somethingElse }
"#;
    let err = merge_schemas(&superset, redefine_entity_map).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot override existing actions.getTenantGrant.entityMap for TenantGrant"
    );
}

#[test]
fn test_merge_rejects_namespace_problems() {
    let err = merge_schemas(BASE_YAML, "other: {}\n").unwrap_err();
    assert!(err.to_string().contains("namespace mismatch"));

    let err = merge_schemas(BASE_YAML, "a: {}\nb: {}\n").unwrap_err();
    assert!(err.to_string().contains("exactly one namespace, found 2"));

    let err = merge_schemas("a: {}\nb: {}\n", "a: {}\n").unwrap_err();
    assert!(err.to_string().contains("exactly one namespace, found 2"));
}

#[test]
fn test_merge_input_is_last_writer_per_integration() {
    let first = merge_schemas(BASE_YAML, PARTIAL_YAML).unwrap();
    let replace_input = r#"
ns:
  actions:
    getTenantGrant:
      input:
        rest:
          url: "/grants/:tenantId/:userId"
"#;
    let result = merge_schemas(&first.superset_json, replace_input).unwrap();
    let superset: Value = serde_json::from_str(&result.superset_json).unwrap();
    let input = &superset["ns"]["actions"]["getTenantGrant"]["input"];
    assert_eq!(input["rest"]["url"], "/grants/:tenantId/:userId");
    // The other integration is untouched.
    assert_eq!(input["appsync"]["body"]["tenantId"], "tenantId");
}

#[test]
fn test_merge_mappings_partial_wins_over_base() {
    let base_with_mappings = format!(
        "{BASE_YAML}  mappings:\n    actions:\n      appsync: {{ path: base.path }}\n"
    );
    let result = merge_schemas(&base_with_mappings, PARTIAL_YAML).unwrap();
    let mappings = result.mappings.unwrap();
    assert_eq!(mappings.action_path("appsync"), Some("info.fieldName"));

    let superset: Value = serde_json::from_str(&result.superset_json).unwrap();
    assert_eq!(
        superset["ns"]["mappings"]["actions"]["appsync"]["path"],
        "info.fieldName"
    );
}

#[test]
fn test_merge_mappings_base_survives_when_partial_silent() {
    let base_with_mappings = format!(
        "{BASE_YAML}  mappings:\n    actions:\n      appsync: {{ path: base.path }}\n"
    );
    let partial = "ns:\n  entityTypes: {}\n";
    let result = merge_schemas(&base_with_mappings, partial).unwrap();
    assert_eq!(
        result.mappings.unwrap().action_path("appsync"),
        Some("base.path")
    );
}

#[test]
fn test_prune_for_cedar_is_idempotent() {
    let result = merge_schemas(BASE_YAML, PARTIAL_YAML).unwrap();
    let superset = SchemaDocument::parse(&result.superset_json).unwrap();
    let once = prune_for_cedar(&superset);
    let twice = prune_for_cedar(&once);
    assert_eq!(once.to_json().unwrap(), twice.to_json().unwrap());
    assert_eq!(once.to_json().unwrap(), result.cedar_json);
}
