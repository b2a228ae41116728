//! Matching descriptor fields against a source and writing typed values.
//!
//! Binding walks a struct's descriptor in declaration order. For each field
//! the source-specific name hints are tried in order and the first hit wins.
//! Nested structs recurse through [`Lookup::nested`]. Fields the source does
//! not mention are left exactly as they were, which is what lets later
//! sources override earlier ones field by field.

use tracing::debug;

use crate::descriptor::{Configurable, FieldDescriptor, FieldRef, FieldSlot};
use crate::error::{LoadError, LoadResult};
use crate::lookup::Lookup;
use crate::value::RawValue;

/// Dotted paths of the fields written by one bind, in binding order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundFields {
    paths: Vec<String>,
}

impl BoundFields {
    /// Whether `path` was written.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|bound| bound == path)
    }

    /// Number of fields written.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing was written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates the written paths.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

/// Whether declared default literals fill fields the lookup misses.
///
/// Only the defaults source enables this; every other source leaves unmatched
/// fields alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultPolicy {
    /// Leave unmatched fields untouched.
    #[default]
    Skip,
    /// Apply the field's default literal when nothing matched.
    Apply,
}

/// Binds values from `lookup` onto `target`.
///
/// # Errors
///
/// Returns [`LoadError::InvalidValue`] naming the dotted field path and the
/// source when a found value or default literal cannot be coerced. Fields
/// bound before the failure keep their new values.
///
/// # Examples
///
/// ```
/// use figment::value::{Dict, Value};
/// use layered_config::{DefaultPolicy, Layered, SourceKind, TreeLookup, bind};
///
/// #[derive(Debug, Default, Layered)]
/// struct Settings {
///     #[layered(name = "listenPort", default = "8080")]
///     port: u16,
/// }
///
/// let mut dict = Dict::new();
/// dict.insert("listenPort".into(), Value::from(9090_u16));
/// let mut settings = Settings::default();
/// let bound = bind(
///     &mut settings,
///     &TreeLookup::new(SourceKind::File, &dict),
///     DefaultPolicy::Skip,
/// )?;
/// assert_eq!(settings.port, 9090);
/// assert!(bound.contains("port"));
/// # Ok::<(), layered_config::LoadError>(())
/// ```
pub fn bind(
    target: &mut dyn Configurable,
    lookup: &dyn Lookup,
    defaults: DefaultPolicy,
) -> LoadResult<BoundFields> {
    let mut bound = BoundFields::default();
    bind_into(target, lookup, defaults, "", &mut bound)?;
    Ok(bound)
}

fn bind_into(
    target: &mut dyn Configurable,
    lookup: &dyn Lookup,
    defaults: DefaultPolicy,
    parent: &str,
    bound: &mut BoundFields,
) -> LoadResult<()> {
    let descriptor = target.descriptor();
    let source = lookup.source();
    for (index, field) in descriptor.fields.iter().enumerate() {
        let path = join_path(parent, field.ident);
        let hints = field.hints_for(source);
        match target.field_mut(index) {
            Some(FieldSlot::Nested(inner)) => {
                if let Some(scoped) = lookup.nested(&hints) {
                    bind_into(inner, scoped.as_ref(), defaults, &path, bound)?;
                }
            }
            Some(FieldSlot::Value(slot)) => {
                let raw = hints.iter().find_map(|hint| lookup.get(hint)).or_else(|| {
                    match defaults {
                        DefaultPolicy::Apply => field.default.map(RawValue::scalar),
                        DefaultPolicy::Skip => None,
                    }
                });
                let Some(raw) = raw else { continue };
                slot.set(raw).map_err(|cause| LoadError::InvalidValue {
                    field: path.clone(),
                    source_kind: source,
                    cause,
                })?;
                debug!(
                    source = %source,
                    field = %path,
                    value = %loggable_value(field, &slot.render()),
                    "bound configuration field"
                );
                bound.paths.push(path);
            }
            None => {}
        }
    }
    Ok(())
}

fn join_path(parent: &str, ident: &str) -> String {
    if parent.is_empty() {
        ident.to_owned()
    } else {
        format!("{parent}.{ident}")
    }
}

fn loggable_value(field: &FieldDescriptor, rendered: &str) -> String {
    if field.loggable {
        rendered.to_owned()
    } else {
        String::from("***")
    }
}

/// One line of a configuration summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    /// Dotted path of the field.
    pub path: String,
    /// Rendered value, or `***` for fields that are not loggable.
    pub value: String,
    /// Whether the field is marked secret.
    pub secret: bool,
}

/// Summarises every leaf field of `target`, redacting values that are not
/// loggable.
///
/// Secret fields are not loggable unless they opt in with
/// `#[layered(loggable = true)]`.
#[must_use]
pub fn describe(target: &dyn Configurable) -> Vec<FieldReport> {
    let mut reports = Vec::new();
    describe_into(target, "", &mut reports);
    reports
}

fn describe_into(target: &dyn Configurable, parent: &str, reports: &mut Vec<FieldReport>) {
    let descriptor = target.descriptor();
    for (index, field) in descriptor.fields.iter().enumerate() {
        let path = join_path(parent, field.ident);
        match target.field(index) {
            Some(FieldRef::Nested(inner)) => describe_into(inner, &path, reports),
            Some(FieldRef::Value(value)) => reports.push(FieldReport {
                value: loggable_value(field, &value.render()),
                path,
                secret: field.secret,
            }),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests;
