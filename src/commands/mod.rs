//! Request payloads and their decoders. Each payload is validated in one
//! pass and turned into a typed command; services never see raw input.

pub mod admin;
pub mod auth;
pub mod profile;
pub mod query;
pub mod trip;

use std::str::FromStr;

use serde_json::Value;
use validator::Validate;

use crate::error::{AppError, FieldError};
use crate::models::trip::city::UnknownVariant;

/// Accumulates every field problem so a payload is rejected once, with all
/// of its messages.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Starts from the derive-based rules on `request`.
    pub fn validate<T: Validate>(request: &T) -> Self {
        match request.validate() {
            Ok(()) => Self::default(),
            Err(errors) => match AppError::from(errors) {
                AppError::Validation(fields) => Self(fields),
                _ => Self::default(),
            },
        }
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Parses `value` against a fixed vocabulary, recording a message on
    /// failure.
    pub fn parse<T>(&mut self, field: &str, value: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                self.push(field, format!("{} {}", field, err));
                None
            }
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn into_result(mut self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            self.0.sort_by(|a, b| a.field.cmp(&b.field));
            Err(AppError::Validation(self.0))
        }
    }
}

/// Loose string view of a JSON value: strings as-is, numbers printed,
/// anything else empty.
pub fn value_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Loose numeric view of a JSON value. Numeric strings are accepted;
/// anything unparseable is zero.
pub fn value_to_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
