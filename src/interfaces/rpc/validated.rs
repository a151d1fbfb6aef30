//! Validating payload extractor
//!
//! `Validated<T>` deserializes an RPC payload and then runs
//! `validator::Validate::validate()` on it, so a handler only ever sees a
//! well-formed DTO.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use super::error::RpcError;

pub struct Validated<T>(pub T);

/// Error type for `Validated` extraction failures.
#[derive(Debug, Error)]
pub enum ValidationRejection {
    /// Payload did not match the DTO shape.
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// Payload parsed but broke a field constraint.
    #[error("{}", describe(.0))]
    Constraints(#[from] ValidationErrors),
}

fn describe(errors: &ValidationErrors) -> String {
    let mut field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    field_errors.sort();

    if field_errors.is_empty() {
        "Validation failed".to_string()
    } else {
        field_errors.join("; ")
    }
}

impl From<ValidationRejection> for RpcError {
    fn from(rejection: ValidationRejection) -> Self {
        RpcError::bad_request(rejection.to_string())
    }
}

impl<T> Validated<T>
where
    T: DeserializeOwned + Validate,
{
    /// A missing payload (`null`) is read as an empty object.
    pub fn from_value(value: Value) -> Result<Self, ValidationRejection> {
        let value = if value.is_null() {
            Value::Object(Map::new())
        } else {
            value
        };

        let dto: T = serde_json::from_value(value)?;
        dto.validate()?;
        Ok(Validated(dto))
    }
}

// ── Tests ──────────────────────────────────────────────────────
