//! API document model
//!
//! OpenAPI-shaped representation populated by every decoder. The structural
//! binder deserializes OpenAPI YAML/JSON straight into these types; the
//! Blueprint decoder builds them incrementally.

use crate::{HttpMethod, ParameterLocation, Schema};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Document root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// OpenAPI version (e.g., "3.0.0")
    #[serde(default = "default_openapi_version", deserialize_with = "string_or_number")]
    pub openapi: String,

    /// API metadata
    #[serde(default)]
    pub info: Info,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    /// API paths keyed by path template
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    /// Reusable components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// Extensions (x-*)
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            openapi: default_openapi_version(),
            info: Info::default(),
            servers: Vec::new(),
            paths: BTreeMap::new(),
            components: None,
            tags: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }
}

fn default_openapi_version() -> String {
    "3.0.0".to_string()
}

/// Accept `1.0` as well as `"1.0"` for version-like fields
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

/// API information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default = "default_api_version", deserialize_with = "string_or_number")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: String::new(),
            version: default_api_version(),
            description: None,
        }
    }
}

fn default_api_version() -> String {
    "1.0.0".to_string()
}

/// Server information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Tag used to group operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations for one path template, one slot per verb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,

    /// Parameters shared by every operation on this path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
        }
    }

    /// Mutable slot for `method`
    pub fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
        }
    }

    /// Populated slots in GET, POST, PUT, DELETE, PATCH order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |method| self.operation(method).map(|op| (method, op)))
    }
}

/// HTTP operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation ID (unique identifier)
    #[serde(
        rename = "operationId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tags (for grouping)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(
        rename = "requestBody",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body: Option<RequestBody>,

    /// Responses keyed by status code
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

/// Parameter definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    /// Location: query, header, path, cookie
    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Content keyed by media type
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

/// Response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,

    /// Content keyed by media type
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

/// Response header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

/// Payload description for one media type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

impl MediaType {
    /// Overlay the parts `other` declares, keeping the rest of `self`
    pub fn merge(&mut self, other: MediaType) {
        if other.schema.is_some() {
            self.schema = other.schema;
        }
        if other.example.is_some() {
            self.example = other.example;
        }
    }
}

/// Reusable components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,

    /// Other component sections, kept as raw JSON
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Document {
    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn description(&self) -> Option<&str> {
        self.info.description.as_deref()
    }

    /// Named schemas declared in `components.schemas`
    pub fn named_schemas(&self) -> Option<&BTreeMap<String, Schema>> {
        self.components.as_ref().map(|c| &c.schemas)
    }

    /// Named schema table, created on first use
    pub fn schemas_mut(&mut self) -> &mut BTreeMap<String, Schema> {
        &mut self.components.get_or_insert_with(Components::default).schemas
    }

    /// Get a schema by reference path
    /// e.g., "#/components/schemas/Pod" -> returns Pod schema
    pub fn resolve_schema_ref(&self, ref_path: &str) -> Option<&Schema> {
        let schema_name = ref_path.strip_prefix("#/components/schemas/")?;
        self.named_schemas()?.get(schema_name)
    }

    /// Total number of operations across all paths
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_schema_ref() {
        let mut doc = Document::default();
        doc.schemas_mut()
            .insert("Pod".to_string(), Schema::of_type("object"));

        assert!(doc.resolve_schema_ref("#/components/schemas/Pod").is_some());
        assert!(doc.resolve_schema_ref("#/components/schemas/Node").is_none());
        assert!(doc.resolve_schema_ref("#/definitions/Pod").is_none());
    }

    #[test]
    fn test_path_item_slots_are_exclusive_per_verb() {
        let mut item = PathItem::default();
        *item.slot_mut(HttpMethod::Get) = Some(Operation {
            summary: Some("List".to_string()),
            ..Default::default()
        });
        *item.slot_mut(HttpMethod::Delete) = Some(Operation::default());
        *item.slot_mut(HttpMethod::Get) = Some(Operation {
            summary: Some("Replaced".to_string()),
            ..Default::default()
        });

        let methods: Vec<HttpMethod> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Delete]);
        assert_eq!(
            item.operation(HttpMethod::Get).unwrap().summary.as_deref(),
            Some("Replaced")
        );
    }

    #[test]
    fn test_version_fields_accept_numbers() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "openapi": "3.0.3",
            "info": {"title": "Pets", "version": 2.5},
            "paths": {}
        }))
        .unwrap();

        assert_eq!(doc.info.version, "2.5");
        assert_eq!(doc.openapi, "3.0.3");
    }

    #[test]
    fn test_minimal_document_defaults() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.openapi, "3.0.0");
        assert_eq!(doc.title(), "");
        assert!(doc.named_schemas().is_none());
        assert_eq!(doc.operation_count(), 0);
    }

    #[test]
    fn test_media_type_merge_keeps_undeclared_parts() {
        let mut media = MediaType {
            schema: Some(Schema::of_type("object")),
            example: None,
        };
        media.merge(MediaType {
            schema: None,
            example: Some(serde_json::json!({"text": "x"})),
        });

        assert_eq!(media.schema, Some(Schema::of_type("object")));
        assert_eq!(media.example, Some(serde_json::json!({"text": "x"})));
    }
}
