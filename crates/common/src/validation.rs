//! Request body validation with garde.

use crate::domain::DomainError;
use garde::{Report, Validate};

/// Validate `value`, folding every failed rule into one `ValidationError`
pub fn validate_struct<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::ValidationError(describe(&report)))
}

/// `path: message` pairs, comma separated; root-level errors carry no path
fn describe(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            let path = path.to_string();
            if path.is_empty() {
                error.message().to_string()
            } else {
                format!("{path}: {}", error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
