//! Field-level checks shared by every write endpoint.
//!
//! Payload fields are `Option<Option<T>>` read through `nullable`: missing is
//! `None`, an explicit `null` is `Some(None)`. [`WriteMode`] decides whether a
//! missing required field is an error (create, PUT) or means "keep" (PATCH).

use crate::api::error::FieldErrors;
use crate::utils::validation::is_blank_or_url;
use validator::Validate;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Replace,
    Partial,
}

impl WriteMode {
    pub fn is_partial(self) -> bool {
        self == WriteMode::Partial
    }
}

/// Runs the payload's derived validators and returns the messages per field.
pub fn field_errors<T: Validate>(payload: &T) -> FieldErrors {
    match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => e.into(),
    }
}

/// Value of a non-nullable field, if one was sent.
pub fn given<T>(value: &Option<Option<T>>) -> Option<&T> {
    value.as_ref().and_then(Option::as_ref)
}

pub fn given_str(value: &Option<Option<String>>) -> Option<&str> {
    given(value).map(String::as_str)
}

/// Optional but non-nullable: only an explicit `null` is an error.
pub fn not_null<T>(errors: &mut FieldErrors, field: &str, value: &Option<Option<T>>) {
    if matches!(value, Some(None)) {
        errors.add(field, NULL);
    }
}

pub fn require<T>(errors: &mut FieldErrors, mode: WriteMode, field: &str, value: &Option<Option<T>>) {
    match value {
        Some(None) => errors.add(field, NULL),
        None if !mode.is_partial() => errors.add(field, REQUIRED),
        _ => {}
    }
}

/// Required text: must be present on full writes, never null and never blank.
pub fn require_text(
    errors: &mut FieldErrors,
    mode: WriteMode,
    field: &str,
    value: &Option<Option<String>>,
) {
    match value {
        Some(Some(v)) if v.trim().is_empty() => errors.add(field, BLANK),
        _ => require(errors, mode, field, value),
    }
}

pub fn non_negative(errors: &mut FieldErrors, field: &str, value: Option<i32>) {
    if value.is_some_and(|v| v < 0) {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
    }
}

pub fn blank_or_url(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value
        && !is_blank_or_url(v)
    {
        errors.add(field, "Enter a valid URL.");
    }
}
