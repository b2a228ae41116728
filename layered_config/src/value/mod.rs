//! Raw values and the per-type coercion that writes them into fields.

mod coerce;

use std::path::PathBuf;

use crate::descriptor::{Field, FieldKind, FieldRef, FieldSlot};

pub use coerce::{CoerceError, parse_bool, split_list};

/// A value as produced by a source, before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A single textual value.
    Scalar(String),
    /// A sequence of textual values.
    List(Vec<String>),
    /// A nested table where a value was expected.
    Map,
    /// A sequence with at least one item that is not a scalar.
    NestedList,
    /// Text that was not valid UTF-8, rendered lossily.
    NotUnicode(String),
}

impl RawValue {
    /// Builds a scalar from anything string-like.
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    fn describe(&self) -> String {
        match self {
            Self::Scalar(text) => text.clone(),
            Self::List(items) => format!("[{}]", items.join(", ")),
            Self::Map => String::from("{..}"),
            Self::NestedList => String::from("a sequence with non-scalar items"),
            Self::NotUnicode(lossy) => lossy.clone(),
        }
    }
}

/// A field that accepts raw values.
///
/// Each supported type parses the raw value itself; a failure leaves the
/// field untouched.
pub trait Settable: Send {
    /// Coerces `raw` and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`CoerceError`] when `raw` cannot be represented as this type.
    fn set(&mut self, raw: RawValue) -> Result<(), CoerceError>;

    /// Human-readable rendering of the current value.
    fn render(&self) -> String;
}

fn expect_scalar(raw: RawValue, expected: FieldKind) -> Result<String, CoerceError> {
    match raw {
        RawValue::Scalar(text) => Ok(text),
        RawValue::NotUnicode(raw) => Err(CoerceError::NotUnicode { raw }),
        other => Err(CoerceError::Shape {
            expected,
            raw: other.describe(),
        }),
    }
}

impl Settable for String {
    fn set(&mut self, raw: RawValue) -> Result<(), CoerceError> {
        *self = expect_scalar(raw, FieldKind::String)?;
        Ok(())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl Settable for PathBuf {
    fn set(&mut self, raw: RawValue) -> Result<(), CoerceError> {
        *self = PathBuf::from(expect_scalar(raw, FieldKind::String)?);
        Ok(())
    }

    fn render(&self) -> String {
        self.display().to_string()
    }
}

impl Settable for bool {
    fn set(&mut self, raw: RawValue) -> Result<(), CoerceError> {
        let text = expect_scalar(raw, FieldKind::Boolean)?;
        *self = parse_bool(&text)?;
        Ok(())
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl Settable for Vec<String> {
    fn set(&mut self, raw: RawValue) -> Result<(), CoerceError> {
        *self = match raw {
            RawValue::List(items) => items,
            RawValue::Scalar(text) => split_list(&text)?,
            RawValue::NotUnicode(raw) => return Err(CoerceError::NotUnicode { raw }),
            other @ (RawValue::Map | RawValue::NestedList) => {
                return Err(CoerceError::Shape {
                    expected: FieldKind::StringList,
                    raw: other.describe(),
                });
            }
        };
        Ok(())
    }

    fn render(&self) -> String {
        format!("[{}]", self.join(", "))
    }
}

macro_rules! parsed_settable {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Settable for $ty {
                fn set(&mut self, raw: RawValue) -> Result<(), CoerceError> {
                    let text = expect_scalar(raw, $kind)?;
                    *self = text.trim().parse::<$ty>().map_err(|err| CoerceError::Parse {
                        expected: $kind,
                        raw: text.clone(),
                        reason: err.to_string(),
                    })?;
                    Ok(())
                }

                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )+
    };
}

parsed_settable!(FieldKind::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
parsed_settable!(FieldKind::Float => f32, f64);

impl<T> Settable for Option<T>
where
    T: Settable + Default,
{
    fn set(&mut self, raw: RawValue) -> Result<(), CoerceError> {
        let mut value = T::default();
        value.set(raw)?;
        *self = Some(value);
        Ok(())
    }

    fn render(&self) -> String {
        self.as_ref()
            .map_or_else(|| String::from("<unset>"), Settable::render)
    }
}

macro_rules! scalar_field {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Field for $ty {
                const KIND: FieldKind = $kind;

                fn slot(&mut self) -> FieldSlot<'_> {
                    FieldSlot::Value(self)
                }

                fn view(&self) -> FieldRef<'_> {
                    FieldRef::Value(self)
                }
            }
        )+
    };
}

scalar_field!(FieldKind::String => String, PathBuf);
scalar_field!(FieldKind::Boolean => bool);
scalar_field!(FieldKind::StringList => Vec<String>);
scalar_field!(FieldKind::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
scalar_field!(FieldKind::Float => f32, f64);

impl<T> Field for Option<T>
where
    T: Field + Settable + Default,
{
    const KIND: FieldKind = T::KIND;

    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Value(self)
    }

    fn view(&self) -> FieldRef<'_> {
        FieldRef::Value(self)
    }
}

#[cfg(test)]
mod tests;
