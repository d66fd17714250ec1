//! YAML-lite value parser
//!
//! Restricted, indentation-sensitive YAML grammar producing a generic
//! [`Value`] tree: block mappings and sequences, compact `- key: value`
//! items, `|`/`>` block scalars, inline flow collections and plain or quoted
//! scalars. Anchors, tags and multi-document streams are not supported.
//!
//! ## Usage
//! ```rust,ignore
//! use apiconv_parser::yaml::parse_document;
//!
//! let value = parse_document("title: Pets\nversion: 1.0.0\n")?;
//! assert_eq!(value.get("version").and_then(|v| v.as_str()), Some("1.0.0"));
//! ```

mod flow;
mod parser;
mod value;

pub use flow::parse_flow;
pub use parser::{parse_document, parse_document_with};
pub use value::Value;
