//! API description parsing
//!
//! Decodes API descriptions into the shared `Document` model from
//! `apiconv-common`.
//!
//! ## Formats
//!
//! - **OpenAPI** (YAML or JSON): a YAML-lite value parser builds a generic
//!   [`Value`] tree which is then bound onto the typed model by field name
//! - **API Blueprint** (markdown): a rule-driven line decoder builds the
//!   model incrementally
//!
//! Both decoders share the line classifier and honor [`ParseOptions`].

mod binder;
pub mod blueprint;
mod line;
pub mod openapi;
mod options;
mod scalar;
pub mod yaml;

pub use binder::bind;
pub use blueprint::BlueprintParser;
pub use line::{classify, classify_all, split_lines, ClassifiedLine};
pub use openapi::OpenApiParser;
pub use options::{ParseOptions, TabPolicy};
pub use scalar::parse_scalar;
pub use yaml::{parse_document, parse_document_with, Value};

use apiconv_common::{Document, Result};

/// Parse an OpenAPI document (YAML or JSON) with default options
pub fn parse_openapi(text: &str) -> Result<Document> {
    OpenApiParser::from_text(text, &ParseOptions::default())?.parse()
}

/// Parse an API Blueprint document with default options
pub fn parse_blueprint(text: &str) -> Result<Document> {
    BlueprintParser::from_text(text, &ParseOptions::default()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openapi_json() {
        let document =
            parse_openapi(r#"{"openapi": "3.0.1", "info": {"title": "T", "version": "2"}, "paths": {}}"#)
                .unwrap();
        assert_eq!(document.openapi, "3.0.1");
        assert_eq!(document.info.version, "2");
    }

    #[test]
    fn test_parse_blueprint_title_only() {
        let document = parse_blueprint("# Empty API\n").unwrap();
        assert_eq!(document.title(), "Empty API");
        assert!(document.paths.is_empty());
    }
}
