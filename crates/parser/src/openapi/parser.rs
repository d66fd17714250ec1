//! OpenAPI document loader

use crate::binder::bind;
use crate::options::ParseOptions;
use crate::yaml::{self, Value};
use apiconv_common::{ConverterError, Document, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// OpenAPI (YAML or JSON) document parser
///
/// Decodes the text into a generic value tree with the YAML-lite parser,
/// then binds that tree into the typed [`Document`] model.
pub struct OpenApiParser {
    /// Decoded value tree
    value: Value,
}

impl OpenApiParser {
    /// Load an OpenAPI document from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = OpenApiParser::from_file("petstore.yaml", &ParseOptions::default())?;
    /// let document = parser.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ConverterError::Parse(format!(
                "Failed to read OpenAPI file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_text(&content, options)
    }

    /// Decode an OpenAPI document from YAML or JSON text
    pub fn from_text(text: &str, options: &ParseOptions) -> Result<Self> {
        let value = yaml::parse_document_with(text, options)?;
        debug!(root_is_mapping = value.as_mapping().is_some(), "decoded value tree");
        Ok(Self { value })
    }

    /// Bind the decoded tree into the document model
    pub fn parse(&self) -> Result<Document> {
        if self.value.as_mapping().is_none() {
            return Err(ConverterError::Binding(
                "OpenAPI document root must be a mapping".to_string(),
            ));
        }
        bind(&self.value)
    }

    /// Get reference to the decoded value tree
    pub fn value(&self) -> &Value {
        &self.value
    }
}
