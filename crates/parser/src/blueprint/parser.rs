//! API Blueprint document loader

use super::builder::DocumentBuilder;
use crate::line;
use crate::options::ParseOptions;
use apiconv_common::{ConverterError, Document, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// API Blueprint (markdown) document parser
///
/// Keeps the source text; every call to [`parse`](Self::parse) runs a fresh
/// line-by-line decode, so no state is shared between documents.
pub struct BlueprintParser {
    source: String,
    options: ParseOptions,
}

impl BlueprintParser {
    /// Load a Blueprint document from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = BlueprintParser::from_file("api.apib", &ParseOptions::default())?;
    /// let document = parser.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ConverterError::Parse(format!(
                "Failed to read Blueprint file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Ok(Self::from_text(content, options))
    }

    pub fn from_text(text: impl Into<String>, options: &ParseOptions) -> Self {
        Self {
            source: text.into(),
            options: options.clone(),
        }
    }

    /// Decode the document
    ///
    /// Fails only when the line classifier rejects a line; unrecognized
    /// Blueprint constructs are skipped.
    pub fn parse(&self) -> Result<Document> {
        let lines = line::classify_all(&self.source, self.options.tab_policy)?;
        let mut builder = DocumentBuilder::new();
        for classified in lines {
            builder.feed(classified);
        }

        let document = builder.finish();
        debug!(
            title = document.title(),
            paths = document.paths.len(),
            operations = document.operation_count(),
            "decoded blueprint"
        );
        Ok(document)
    }
}
