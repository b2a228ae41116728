//! Parsing helpers shared by the [`Settable`](super::Settable) impls.

use thiserror::Error;

use crate::descriptor::FieldKind;

/// Failure converting a raw value into a field's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CoerceError {
    /// The raw text could not be parsed as the declared type.
    #[error("cannot parse {raw:?} as {expected}: {reason}")]
    Parse {
        /// Declared type of the field.
        expected: FieldKind,
        /// Raw value as received.
        raw: String,
        /// Parser explanation.
        reason: String,
    },

    /// The source held bytes that are not valid UTF-8.
    #[error("value {raw:?} is not valid UTF-8")]
    NotUnicode {
        /// Lossy rendering of the value.
        raw: String,
    },

    /// The raw value had the wrong shape, such as a list for a scalar.
    #[error("expected {expected}, found {raw}")]
    Shape {
        /// Declared type of the field.
        expected: FieldKind,
        /// Rendering of the offending value.
        raw: String,
    },
}

/// Parses a boolean the way command lines and environment files spell it.
///
/// Accepts `true`/`false`, `t`/`f` and `1`/`0`, ignoring ASCII case and
/// surrounding whitespace.
///
/// # Errors
///
/// Returns [`CoerceError::Parse`] for anything else.
pub fn parse_bool(raw: &str) -> Result<bool, CoerceError> {
    let trimmed = raw.trim();
    if ["true", "t", "1"]
        .iter()
        .any(|candidate| trimmed.eq_ignore_ascii_case(candidate))
    {
        return Ok(true);
    }
    if ["false", "f", "0"]
        .iter()
        .any(|candidate| trimmed.eq_ignore_ascii_case(candidate))
    {
        return Ok(false);
    }
    Err(CoerceError::Parse {
        expected: FieldKind::Boolean,
        raw: raw.to_owned(),
        reason: String::from("expected true or false"),
    })
}

/// Splits a flat-source value into a list.
///
/// Values starting with `[` are read as an inline sequence (`[a, "b c"]`);
/// anything else is split on commas with each item trimmed. Blank input is
/// an empty list.
///
/// # Errors
///
/// Returns [`CoerceError::Parse`] when a bracketed value is not a valid
/// sequence of strings.
pub fn split_list(raw: &str) -> Result<Vec<String>, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_saphyr::from_str::<Vec<String>>(trimmed).map_err(|err| {
            CoerceError::Parse {
                expected: FieldKind::StringList,
                raw: raw.to_owned(),
                reason: err.to_string(),
            }
        });
    }
    Ok(trimmed
        .split(',')
        .map(|item| item.trim().to_owned())
        .collect())
}
