use crate::error::{ModelError, ModelResult};

pub const MIN_INSTRUCTIONS_LEN: usize = 50;

/// Trim `value` and reject it when nothing is left.
pub fn required(field: &'static str, value: &str, message: &str) -> ModelResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::validation(field, message));
    }
    Ok(trimmed.to_string())
}

/// Turn an absent payload field into the same error an empty one gets.
pub fn present<'a>(
    field: &'static str,
    value: Option<&'a str>,
    message: &str,
) -> ModelResult<&'a str> {
    value.ok_or_else(|| ModelError::validation(field, message))
}

/// Like [`required`], plus a minimum length counted in chars after trimming.
pub fn min_chars(
    field: &'static str,
    value: &str,
    min: usize,
    empty_message: &str,
    short_message: &str,
) -> ModelResult<String> {
    let trimmed = required(field, value, empty_message)?;
    if trimmed.chars().count() < min {
        return Err(ModelError::validation(field, short_message));
    }
    Ok(trimmed)
}
