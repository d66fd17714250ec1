//! Common types and utilities for apiconv
//!
//! This crate contains the shared API document model, the error type and the
//! small enums used by the decoders in `apiconv-parser` and by the CLI.

mod document;
mod schema;

pub use document::{
    Components, Document, Header, Info, MediaType, Operation, Parameter, PathItem, RequestBody,
    Response, Server, Tag,
};
pub use schema::{schema_ref_path, Schema, TypeSpec};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while decoding an API description
#[derive(Error, Debug)]
pub enum ConverterError {
    /// Hard decode error tied to a source line
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// The generic value tree does not fit the typed document model
    #[error("Binding error: {0}")]
    Binding(String),
}

impl ConverterError {
    /// Build a syntax error for a 1-based line number
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        ConverterError::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, ConverterError>;

/// HTTP verbs that own a slot in a [`PathItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Every method, in path item slot order
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(ConverterError::Parse(format!(
                "Unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

/// Where a parameter is carried in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_from_str_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("HEAD".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_syntax_error_message() {
        let err = ConverterError::syntax(3, "invalid flow collection");
        assert_eq!(
            err.to_string(),
            "Syntax error at line 3: invalid flow collection"
        );
    }

    #[test]
    fn test_parameter_location_serializes_lowercase() {
        let json = serde_json::to_string(&ParameterLocation::Query).unwrap();
        assert_eq!(json, "\"query\"");
    }
}
