//! OpenAPI 3 document parser
//!
//! Decodes OpenAPI YAML or JSON into the shared [`Document`] model.
//!
//! ## Decoding Strategy
//! 1. The YAML-lite parser turns the text into a generic value tree (JSON
//!    input is accepted as-is).
//! 2. The structural binder maps that tree onto the typed model by field
//!    name. Shape mismatches surface as binding errors, never parser errors.
//!
//! ## Usage
//! ```rust,ignore
//! use apiconv_parser::openapi::OpenApiParser;
//! use apiconv_parser::ParseOptions;
//!
//! let parser = OpenApiParser::from_file("petstore.yaml", &ParseOptions::default())?;
//! let document = parser.parse()?;
//! ```
//!
//! [`Document`]: apiconv_common::Document

mod parser;

pub use parser::OpenApiParser;
