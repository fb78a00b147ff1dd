//! Request validation helpers built on the `validator` crate.

use validator::{Validate, ValidationErrors};

use crate::error::CoreError;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Run `validator` rules and convert failures into [`CoreError::Validation`].
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(describe(&errors)))
}

/// Flatten field errors into `field: message; field: message`, sorted by field.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{field}: {}", messages.join(", "))
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
