//! Cedar schema document model
//!
//! A schema document maps exactly one namespace name to a namespace body.
//! Engine-native Cedar fields (entity shapes, `appliesTo`, `memberOf`, ...)
//! are carried opaquely and round-trip untouched; the authorizer extensions
//! (`resourceEntities`, `entityMap`, `input`, root `mappings`) are typed so
//! the merge engine and validator can reason about them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

mod merge;
mod validate;

pub use merge::{merge_documents, merge_schemas, prune_for_cedar, MergeResult};
pub use validate::{validate_superset, validate_superset_value};

/// Entity types reserved for principals. A partial document may never add a
/// type with one of these names; the base owns them.
pub const PRINCIPAL_TYPES: [&str; 5] = ["Tenant", "User", "Role", "GlobalRole", "TenantGrant"];

/// Integration key for AppSync input declarations and action mappings.
pub const APPSYNC_INTEGRATION: &str = "appsync";
/// Integration key for REST input declarations.
pub const REST_INTEGRATION: &str = "rest";
/// Integration key for API Gateway action mappings.
pub const API_GATEWAY_INTEGRATION: &str = "apiGateway";

/// Schema document errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema must contain exactly one namespace, found {0}")]
    NamespaceCount(usize),

    #[error("namespace mismatch: base={base} partial={partial}")]
    NamespaceMismatch { base: String, partial: String },

    #[error("cannot add or modify principal type {0}")]
    PrincipalType(String),

    #[error("cannot override base entityType {entity}.{field}")]
    EntityFieldOverride { entity: String, field: String },

    #[error("cannot override existing resourceEntities template {entity}.{template}")]
    TemplateOverride { entity: String, template: String },

    #[error("cannot override base action {action}.{field}")]
    ActionFieldOverride { action: String, field: String },

    #[error("cannot override existing actions.{action}.entityMap for {resource_type}")]
    EntityMapOverride {
        action: String,
        resource_type: String,
    },

    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse schema document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to serialize schema document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A parsed schema document: one namespace name and its body.
///
/// Construction goes through [`SchemaDocument::parse`] or
/// [`SchemaDocument::from_json_value`], both of which enforce the
/// single-namespace invariant, so a value of this type is always well formed.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    namespace: String,
    body: NamespaceBody,
}

impl SchemaDocument {
    /// Build a document from already-validated parts.
    pub fn new(namespace: impl Into<String>, body: NamespaceBody) -> Self {
        Self {
            namespace: namespace.into(),
            body,
        }
    }

    /// Parse a document from YAML or JSON text (YAML is a superset of JSON,
    /// so one parser covers both on-disk formats).
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let namespaces: BTreeMap<String, NamespaceBody> = serde_yaml::from_str(text)?;
        Self::from_namespaces(namespaces)
    }

    /// Build a document from an in-memory JSON value.
    pub fn from_json_value(value: Value) -> Result<Self, SchemaError> {
        let namespaces: BTreeMap<String, NamespaceBody> = serde_json::from_value(value)?;
        Self::from_namespaces(namespaces)
    }

    /// Read and parse a document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn from_namespaces(namespaces: BTreeMap<String, NamespaceBody>) -> Result<Self, SchemaError> {
        if namespaces.len() != 1 {
            return Err(SchemaError::NamespaceCount(namespaces.len()));
        }
        let (namespace, body) = namespaces.into_iter().next().unwrap_or_default();
        Ok(Self { namespace, body })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn body(&self) -> &NamespaceBody {
        &self.body
    }

    /// Render the document as a `{ namespace: body }` JSON value.
    pub fn to_json_value(&self) -> Result<Value, SchemaError> {
        let body = serde_json::to_value(&self.body)?;
        let mut root = serde_json::Map::new();
        root.insert(self.namespace.clone(), body);
        Ok(Value::Object(root))
    }

    /// Serialize the document as compact JSON. Map keys are sorted, so the
    /// output is deterministic for a given document.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(self.to_json_value()?.to_string())
    }
}

/// Body of the single namespace in a schema document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceBody {
    #[serde(default, rename = "entityTypes")]
    pub entity_types: BTreeMap<String, EntityTypeDef>,

    #[serde(default)]
    pub actions: BTreeMap<String, ActionDef>,

    /// Action-identifier extraction configuration, keyed by integration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<MappingConfig>,

    /// Any other engine-native root section (e.g. `commonTypes`), passed
    /// through untouched.
    #[serde(flatten)]
    pub cedar: serde_json::Map<String, Value>,
}

/// One entity type definition.
///
/// `cedar` holds the engine-native fields (shape, memberOfTypes, ...). The
/// merge engine refuses any partial that touches them on an existing type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDef {
    /// Identity templates keyed by template name. Owned by whichever
    /// document defines a name first; never redefinable.
    #[serde(
        default,
        rename = "resourceEntities",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_entities: Option<BTreeMap<String, IdentityTemplate>>,

    #[serde(flatten)]
    pub cedar: serde_json::Map<String, Value>,
}

/// A resource-identity template: how to mint a concrete entity id (and
/// optional attributes/parents) from request variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityTemplate {
    /// Id template with `$name` variables, e.g. `"$tenantId:$userId"`.
    #[serde(default)]
    pub id: String,

    /// Entity type to bind; defaults to the declaring resource type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Attribute templates; values may also carry `$name` variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<Value>>,
}

/// One action definition.
///
/// `cedar` holds the engine-native fields (`appliesTo`, `memberOf`, ...),
/// protected on existing actions just like entity shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Resource type name -> identity-template name.
    #[serde(default, rename = "entityMap", skip_serializing_if = "Option::is_none")]
    pub entity_map: Option<BTreeMap<String, String>>,

    /// Per-integration variable-source declarations, keyed by integration
    /// name (`appsync`, `rest`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<BTreeMap<String, InputSpec>>,

    #[serde(flatten)]
    pub cedar: serde_json::Map<String, Value>,
}

impl ActionDef {
    /// Resource types this action applies to, read out of the engine-native
    /// `appliesTo.resourceTypes` list. Non-string entries are skipped.
    pub fn resource_types(&self) -> Vec<&str> {
        self.cedar
            .get("appliesTo")
            .and_then(Value::as_object)
            .and_then(|applies| applies.get("resourceTypes"))
            .and_then(Value::as_array)
            .map(|types| types.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Input declaration for one integration, if any.
    pub fn input_for(&self, integration: &str) -> Option<&InputSpec> {
        self.input.as_ref()?.get(integration)
    }
}

/// Variable sources declared for one integration.
///
/// AppSync uses only `body` (field specs against the GraphQL arguments);
/// REST uses a URL template, query parameters and JSON body fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    /// URL template with `:name` segments, matched against the request path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Query parameters: a single parameter name, or variable-name ->
    /// parameter-name map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QuerySpec>,

    /// Variable-name -> body field spec (plain field or `$.dotted.path`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BTreeMap<String, String>>,

    /// Unknown input channels are preserved verbatim for forward
    /// compatibility.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Query-parameter declaration: either one parameter bound under its own
/// name, or a map from variable name to parameter name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuerySpec {
    Name(String),
    Map(BTreeMap<String, String>),
}

impl QuerySpec {
    /// Variable names this declaration supplies.
    pub fn variable_names(&self) -> Vec<&str> {
        match self {
            QuerySpec::Name(name) => vec![name.as_str()],
            QuerySpec::Map(map) => map.keys().map(String::as_str).collect(),
        }
    }
}

/// Root-level action-identifier extraction configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Integration name (`appsync`, `apiGateway`) -> extraction path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, ActionPathSpec>,
}

impl MappingConfig {
    /// Configured action-identifier path for an integration, when non-empty.
    pub fn action_path(&self, integration: &str) -> Option<&str> {
        self.actions
            .get(integration)
            .map(|spec| spec.path.as_str())
            .filter(|path| !path.is_empty())
    }
}

/// Dotted path into the raw event that yields the action identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPathSpec {
    pub path: String,
}
