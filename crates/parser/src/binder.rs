//! Structural binder from generic value trees to typed structures

use crate::yaml::Value;
use apiconv_common::{ConverterError, Result};
use serde::de::DeserializeOwned;

/// Bind a value tree into `T` by field-name matching.
///
/// Shape mismatches are reported as [`ConverterError::Binding`].
pub fn bind<T: DeserializeOwned>(value: &Value) -> Result<T> {
    serde_json::from_value(value.to_json()).map_err(|e| ConverterError::Binding(e.to_string()))
}
