//! Schema definitions shared by every decoder
//!
//! A [`Schema`] is either a reference to a named schema (`$ref`) or an inline
//! definition, never both.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Schema `type`: a single type name or a union of type names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Single(String),
    Union(Vec<String>),
}

impl TypeSpec {
    pub fn single(name: impl Into<String>) -> Self {
        TypeSpec::Single(name.into())
    }

    /// All type names, in declaration order
    pub fn names(&self) -> Vec<&str> {
        match self {
            TypeSpec::Single(name) => vec![name.as_str()],
            TypeSpec::Union(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }

    pub fn is_nullable(&self) -> bool {
        self.contains("null")
    }

    /// First non-null type name
    pub fn primary(&self) -> Option<&str> {
        self.names().into_iter().find(|name| *name != "null")
    }

    /// Add `null` to the accepted types
    pub fn with_null(self) -> Self {
        if self.is_nullable() {
            return self;
        }
        let mut names: Vec<String> = self.names().into_iter().map(String::from).collect();
        names.push("null".to_string());
        TypeSpec::Union(names)
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::Single(name.to_string())
    }
}

/// Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Type: string, number, integer, boolean, array, object
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSpec>,

    /// Reference to a named schema
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,

    /// Format (e.g., int32, date-time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Properties (for object type)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    /// Required properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Items schema (for array type)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    /// Extensions (x-*) and keywords without a typed field
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Schema {
    /// Inline schema of the given type
    pub fn of_type(name: impl Into<String>) -> Self {
        Schema {
            schema_type: Some(TypeSpec::single(name)),
            ..Default::default()
        }
    }

    /// Reference to a named schema in `components.schemas`
    pub fn reference(name: &str) -> Self {
        Schema {
            ref_path: Some(schema_ref_path(name)),
            ..Default::default()
        }
    }

    /// Array whose items follow `items`
    pub fn array_of(items: Schema) -> Self {
        Schema {
            items: Some(Box::new(items)),
            ..Schema::of_type("array")
        }
    }

    pub fn is_reference(&self) -> bool {
        self.ref_path.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Name of the referenced schema, if this is a component reference
    pub fn referenced_name(&self) -> Option<&str> {
        self.ref_path.as_deref()?.strip_prefix(SCHEMA_REF_PREFIX)
    }

    /// Declared primary type name, if any
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(TypeSpec::primary)
    }

    /// Add a property, recording it as required when asked
    pub fn insert_property(&mut self, name: impl Into<String>, schema: Schema, required: bool) {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
    }
}

/// `#/components/schemas/<name>`
pub fn schema_ref_path(name: &str) -> String {
    format!("{}{}", SCHEMA_REF_PREFIX, name)
}
