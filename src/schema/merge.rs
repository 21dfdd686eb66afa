//! Schema merge engine
//!
//! Composes one per-tenant partial document onto one base document under
//! extension-only rules: brand-new entity types and actions may carry
//! anything, existing definitions may only gain the extension fields
//! (`resourceEntities` on entities, `entityMap`/`input` on actions), and
//! principal types are never addable. Any violation aborts the merge; there
//! is no partial output.

use super::{
    ActionDef, EntityTypeDef, MappingConfig, NamespaceBody, SchemaDocument, SchemaError,
    PRINCIPAL_TYPES,
};
use std::collections::BTreeMap;

/// Outcome of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Full merged document including extension fields, compact JSON.
    pub superset_json: String,
    /// The same document with extensions pruned, safe to hand to Verified
    /// Permissions as a Cedar schema.
    pub cedar_json: String,
    /// The shared namespace name.
    pub namespace: String,
    /// Effective root-level action-mapping configuration, if any.
    pub mappings: Option<MappingConfig>,
}

/// Merge two serialized schema documents (YAML or JSON) and serialize both
/// outputs.
pub fn merge_schemas(base: &str, partial: &str) -> Result<MergeResult, SchemaError> {
    let base = SchemaDocument::parse(base)?;
    let partial = SchemaDocument::parse(partial)?;
    let merged = merge_documents(&base, &partial)?;
    let cedar = prune_for_cedar(&merged);
    Ok(MergeResult {
        superset_json: merged.to_json()?,
        cedar_json: cedar.to_json()?,
        namespace: merged.namespace().to_string(),
        mappings: merged.body().mappings.clone(),
    })
}

/// Merge a parsed partial document onto a parsed base document.
pub fn merge_documents(
    base: &SchemaDocument,
    partial: &SchemaDocument,
) -> Result<SchemaDocument, SchemaError> {
    if base.namespace() != partial.namespace() {
        return Err(SchemaError::NamespaceMismatch {
            base: base.namespace().to_string(),
            partial: partial.namespace().to_string(),
        });
    }

    let mut out = base.body().clone();

    for (name, pdef) in &partial.body().entity_types {
        if let Some(bdef) = out.entity_types.get_mut(name) {
            extend_entity_type(name, bdef, pdef)?;
        } else {
            if PRINCIPAL_TYPES.contains(&name.as_str()) {
                return Err(SchemaError::PrincipalType(name.clone()));
            }
            out.entity_types.insert(name.clone(), pdef.clone());
        }
    }

    for (name, pdef) in &partial.body().actions {
        if let Some(bdef) = out.actions.get_mut(name) {
            extend_action(name, bdef, pdef)?;
        } else {
            out.actions.insert(name.clone(), pdef.clone());
        }
    }

    // Root mappings: last writer wins, with the partial as the later writer.
    if partial.body().mappings.is_some() {
        out.mappings = partial.body().mappings.clone();
    }

    Ok(SchemaDocument::new(base.namespace(), out))
}

/// Apply a partial definition to an entity type that already exists in the
/// base. Only `resourceEntities` may appear, and only with template names
/// the base does not define yet.
fn extend_entity_type(
    name: &str,
    bdef: &mut EntityTypeDef,
    pdef: &EntityTypeDef,
) -> Result<(), SchemaError> {
    if let Some(field) = pdef.cedar.keys().next() {
        return Err(SchemaError::EntityFieldOverride {
            entity: name.to_string(),
            field: field.clone(),
        });
    }
    if let Some(templates) = &pdef.resource_entities {
        let existing = bdef.resource_entities.get_or_insert_with(BTreeMap::new);
        for (template, tdef) in templates {
            if existing.contains_key(template) {
                return Err(SchemaError::TemplateOverride {
                    entity: name.to_string(),
                    template: template.clone(),
                });
            }
            existing.insert(template.clone(), tdef.clone());
        }
    }
    Ok(())
}

/// Apply a partial definition to an action that already exists in the base.
/// `entityMap` merges key-by-key without overwrite; `input` merges by
/// integration with the partial winning per integration (it is additive
/// tenant configuration, not an engine-native field).
fn extend_action(name: &str, bdef: &mut ActionDef, pdef: &ActionDef) -> Result<(), SchemaError> {
    if let Some(field) = pdef.cedar.keys().next() {
        return Err(SchemaError::ActionFieldOverride {
            action: name.to_string(),
            field: field.clone(),
        });
    }
    if let Some(entity_map) = &pdef.entity_map {
        let existing = bdef.entity_map.get_or_insert_with(BTreeMap::new);
        for (resource_type, template) in entity_map {
            if existing.contains_key(resource_type) {
                return Err(SchemaError::EntityMapOverride {
                    action: name.to_string(),
                    resource_type: resource_type.clone(),
                });
            }
            existing.insert(resource_type.clone(), template.clone());
        }
    }
    if let Some(input) = &pdef.input {
        let existing = bdef.input.get_or_insert_with(BTreeMap::new);
        for (integration, spec) in input {
            existing.insert(integration.clone(), spec.clone());
        }
    }
    Ok(())
}

/// Strip the authorizer extensions so only engine-native Cedar fields remain:
/// root `mappings`, per-entity `resourceEntities`, per-action `entityMap` and
/// `input`. Idempotent.
pub fn prune_for_cedar(doc: &SchemaDocument) -> SchemaDocument {
    let mut body: NamespaceBody = doc.body().clone();
    body.mappings = None;
    for entity in body.entity_types.values_mut() {
        entity.resource_entities = None;
    }
    for action in body.actions.values_mut() {
        action.entity_map = None;
        action.input = None;
    }
    SchemaDocument::new(doc.namespace(), body)
}
