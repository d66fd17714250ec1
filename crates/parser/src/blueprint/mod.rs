//! API Blueprint decoder
//!
//! Decodes markdown-based API Blueprint into the shared [`Document`] model
//! without a markdown AST.
//!
//! ## Decoding Strategy
//! Each classified line is matched against an ordered list of rules
//! (header, structural, content, then body capture). The matching rule
//! yields a [`LineEvent`] which drives the document builder:
//!
//! - `## Name [/path]` opens a resource, `### Name [VERB]` an action
//! - `+ Request` / `+ Response` open payloads whose indented JSON is
//!   captured as the example
//! - `+ Attributes` and `## Data Structures` hold MSON property lists
//! - `+ Parameters` lists path and query parameters
//!
//! Opening any construct first finalizes the innermost open one into its
//! parent; end of input flushes everything still open.
//!
//! ## Usage
//! ```rust,ignore
//! use apiconv_parser::blueprint::BlueprintParser;
//! use apiconv_parser::ParseOptions;
//!
//! let parser = BlueprintParser::from_file("api.apib", &ParseOptions::default())?;
//! let document = parser.parse()?;
//! ```
//!
//! [`Document`]: apiconv_common::Document

mod builder;
pub mod mson;
mod parser;
pub mod rules;

pub use builder::{infer_location, path_key};
pub use parser::BlueprintParser;
pub use rules::{LineEvent, RuleContext};
