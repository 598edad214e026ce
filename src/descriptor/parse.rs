//! Response body parsing
//!
//! Bodies are checked in a fixed order: emptiness, then the error envelope,
//! then the expected shape. A well-formed error envelope never matches a
//! success schema, so it must be recognized before structural parsing.

use crate::model::wire::ErrorEnvelope;
use crate::{CatalogError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parses a response body into the expected wire shape
///
/// # Arguments
///
/// * `url` - The requested URL, used in error reports
/// * `body` - The raw response body
///
/// # Returns
///
/// * `Ok(T)` - The deserialized descriptor
/// * `Err(CatalogError::EmptyResponse)` - Blank body
/// * `Err(CatalogError::ServerReported)` - Body is an error envelope
/// * `Err(CatalogError::Deserialization)` - Body is `null`, not JSON, or
///   does not match `T`
pub fn parse_descriptor<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    if body.trim().is_empty() {
        return Err(CatalogError::EmptyResponse {
            url: url.to_string(),
        });
    }

    let value: Value = serde_json::from_str(body).map_err(|e| CatalogError::Deserialization {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if let Some(error) = error_envelope(url, &value) {
        return Err(error);
    }

    if value.is_null() {
        return Err(CatalogError::Deserialization {
            url: url.to_string(),
            message: "response was null".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| CatalogError::Deserialization {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Recognizes `{"error": {...}}` bodies
fn error_envelope(url: &str, value: &Value) -> Option<CatalogError> {
    if !value.get("error").is_some_and(Value::is_object) {
        return None;
    }

    let envelope: ErrorEnvelope = serde_json::from_value(value.clone()).ok()?;
    let mut message = envelope
        .error
        .message
        .unwrap_or_else(|| "unknown error".to_string());
    if !envelope.error.details.is_empty() {
        message = format!("{} ({})", message, envelope.error.details.join("; "));
    }

    Some(CatalogError::ServerReported {
        url: url.to_string(),
        message,
        code: envelope.error.code,
    })
}
