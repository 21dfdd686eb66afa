//! Superset validator
//!
//! Static variable-coverage analysis over a merged superset document. Runs at
//! schema build/deploy time and returns every gap it finds rather than
//! stopping at the first. A deployment must refuse to publish a schema with a
//! non-empty result.

use super::{ActionDef, SchemaDocument, APPSYNC_INTEGRATION, REST_INTEGRATION};
use crate::mapping::{template_vars, url_template_vars};
use serde_json::Value;
use std::collections::BTreeSet;

/// Validate a superset document. Empty result = valid. Errors accumulate in
/// action-map iteration order.
pub fn validate_superset(doc: &SchemaDocument) -> Vec<String> {
    let body = doc.body();
    let mut errors = Vec::new();

    for (name, action) in &body.actions {
        // Actions without declared resource types are action groups that
        // constrain principals only; they carry no resource identity.
        let resource_types = action.resource_types();
        if resource_types.is_empty() {
            continue;
        }

        let Some(entity_map) = &action.entity_map else {
            errors.push(format!("actions.{name}.entityMap is required"));
            continue;
        };

        for resource_type in resource_types {
            let Some(template_name) = entity_map.get(resource_type) else {
                errors.push(format!(
                    "actions.{name}.entityMap missing key for resourceType {resource_type}"
                ));
                continue;
            };

            let template = body
                .entity_types
                .get(resource_type)
                .and_then(|entity| entity.resource_entities.as_ref())
                .and_then(|templates| templates.get(template_name));
            let Some(template) = template else {
                errors.push(format!(
                    "actions.{name}.entityMap.{resource_type} references missing template \
                     {resource_type}.resourceEntities.{template_name}"
                ));
                continue;
            };

            let mut needed = template_vars(&template.id);
            for value in template.attributes.iter().flatten().map(|(_, v)| v) {
                if let Value::String(text) = value {
                    needed.extend(template_vars(text));
                }
            }

            check_appsync_coverage(name, action, &needed, &mut errors);
            check_rest_coverage(name, action, &needed, &mut errors);
        }
    }

    errors
}

/// Untyped entry point: a document that fails basic validation (namespace
/// cardinality, malformed definitions) yields a one-element error list
/// instead of an error value.
pub fn validate_superset_value(value: &Value) -> Vec<String> {
    match SchemaDocument::from_json_value(value.clone()) {
        Ok(doc) => validate_superset(&doc),
        Err(err) => vec![err.to_string()],
    }
}

/// Every needed variable must appear in the AppSync body-field map.
fn check_appsync_coverage(
    name: &str,
    action: &ActionDef,
    needed: &BTreeSet<String>,
    errors: &mut Vec<String>,
) {
    let provided: BTreeSet<&str> = action
        .input_for(APPSYNC_INTEGRATION)
        .and_then(|spec| spec.body.as_ref())
        .map(|body| body.keys().map(String::as_str).collect())
        .unwrap_or_default();
    for var in needed {
        if !provided.contains(var.as_str()) {
            errors.push(format!(
                "actions.{name} (appsync): template requires variable ${var} \
                 not provided in input.appsync.body"
            ));
        }
    }
}

/// Every needed variable must be reachable through at least one REST channel:
/// a URL template segment, a declared body field, or a query parameter.
fn check_rest_coverage(
    name: &str,
    action: &ActionDef,
    needed: &BTreeSet<String>,
    errors: &mut Vec<String>,
) {
    let rest = action.input_for(REST_INTEGRATION);
    let url_vars = rest
        .and_then(|spec| spec.url.as_deref())
        .map(url_template_vars)
        .unwrap_or_default();
    let body_vars: BTreeSet<&str> = rest
        .and_then(|spec| spec.body.as_ref())
        .map(|body| body.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let query_vars: BTreeSet<&str> = rest
        .and_then(|spec| spec.query.as_ref())
        .map(|query| query.variable_names().into_iter().collect())
        .unwrap_or_default();

    for var in needed {
        let covered = url_vars.contains(var)
            || body_vars.contains(var.as_str())
            || query_vars.contains(var.as_str());
        if !covered {
            errors.push(format!(
                "actions.{name} (rest): template requires variable ${var} \
                 not provided in input.rest (url/body/query)"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> SchemaDocument {
        SchemaDocument::parse(text).unwrap()
    }

    #[test]
    fn test_skips_actions_without_resource_types() {
        let d = doc("ns:\n  actions:\n    Get: { appliesTo: { principalTypes: [User] } }\n");
        assert!(validate_superset(&d).is_empty());
    }

    #[test]
    fn test_missing_entity_map() {
        let d = doc("ns:\n  actions:\n    getTicket: { appliesTo: { resourceTypes: [Ticket] } }\n");
        let errors = validate_superset(&d);
        assert_eq!(errors, vec!["actions.getTicket.entityMap is required"]);
    }

    #[test]
    fn test_missing_entity_map_key() {
        let d = doc(
            r#"
ns:
  actions:
    getTicket:
      appliesTo: { resourceTypes: [Ticket] }
      entityMap: { Other: byId }
"#,
        );
        let errors = validate_superset(&d);
        assert_eq!(
            errors,
            vec!["actions.getTicket.entityMap missing key for resourceType Ticket"]
        );
    }

    #[test]
    fn test_missing_template() {
        let d = doc(
            r#"
ns:
  entityTypes:
    Ticket: { shape: { type: Record } }
  actions:
    getTicket:
      appliesTo: { resourceTypes: [Ticket] }
      entityMap: { Ticket: byId }
"#,
        );
        let errors = validate_superset(&d);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("missing template Ticket.resourceEntities.byId"));
    }

    #[test]
    fn test_uncovered_variable_reported_per_integration() {
        let d = doc(
            r#"
ns:
  entityTypes:
    Ticket:
      resourceEntities:
        byId: { id: "$tenantId:$userId" }
  actions:
    getTicket:
      appliesTo: { resourceTypes: [Ticket] }
      entityMap: { Ticket: byId }
      input:
        appsync:
          body: { tenantId: tenantId }
"#,
        );
        let errors = validate_superset(&d);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("(appsync)") && errors[0].contains("$userId"));
        assert!(errors[1].contains("(rest)") && errors[1].contains("$tenantId"));
        assert!(errors[2].contains("(rest)") && errors[2].contains("$userId"));
    }

    #[test]
    fn test_attribute_variables_counted() {
        let d = doc(
            r#"
ns:
  entityTypes:
    Ticket:
      resourceEntities:
        byId:
          id: "$ticketId"
          attributes: { owner: "$ownerId" }
  actions:
    getTicket:
      appliesTo: { resourceTypes: [Ticket] }
      entityMap: { Ticket: byId }
      input:
        appsync:
          body: { ticketId: ticketId }
        rest:
          url: "/tickets/:ticketId"
"#,
        );
        let errors = validate_superset(&d);
        // $ownerId is uncovered on both integrations
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.contains("$ownerId")));
    }

    #[test]
    fn test_all_resource_types_validated() {
        let d = doc(
            r#"
ns:
  entityTypes:
    Ticket:
      resourceEntities:
        byId: { id: "$id" }
  actions:
    getEither:
      appliesTo: { resourceTypes: [Ticket, Comment] }
      entityMap: { Ticket: byId }
      input:
        appsync: { body: { id: id } }
        rest: { url: "/either/:id" }
"#,
        );
        let errors = validate_superset(&d);
        assert_eq!(
            errors,
            vec!["actions.getEither.entityMap missing key for resourceType Comment"]
        );
    }

    #[test]
    fn test_query_covers_rest_variable() {
        let d = doc(
            r#"
ns:
  entityTypes:
    Ticket:
      resourceEntities:
        byId: { id: "$tenantId" }
  actions:
    getTicket:
      appliesTo: { resourceTypes: [Ticket] }
      entityMap: { Ticket: byId }
      input:
        appsync: { body: { tenantId: tenantId } }
        rest: { query: tenantId }
"#,
        );
        assert!(validate_superset(&d).is_empty());
    }

    #[test]
    fn test_malformed_value_yields_single_error() {
        let value = serde_json::json!({"a": {}, "b": {}});
        let errors = validate_superset_value(&value);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("exactly one namespace"));
    }
}
