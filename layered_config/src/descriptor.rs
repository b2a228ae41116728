//! Compile-time field metadata for configuration structs.
//!
//! `#[derive(Layered)]` emits a static [`ConfigDescriptor`] for each struct
//! together with an implementation of [`Configurable`], which hands out a
//! settable slot per field. Loaders never inspect types at runtime; they walk
//! the descriptor and write through the slots.

use std::fmt;

use crate::value::Settable;

/// Origin of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SourceKind {
    /// Default literals declared on the struct.
    Default,
    /// A configuration file discovered on disk.
    File,
    /// Process environment variables.
    Env,
    /// Command-line flags.
    Flags,
    /// The Consul key/value store.
    Consul,
    /// The Vault secrets store.
    Vault,
}

impl SourceKind {
    /// Lowercase name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::File => "file",
            Self::Env => "env",
            Self::Flags => "flags",
            Self::Consul => "consul",
            Self::Vault => "vault",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type family of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldKind {
    /// Text, including paths.
    String,
    /// Signed or unsigned integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean switch.
    Boolean,
    /// Nested configuration struct.
    Struct,
    /// Ordered sequence of strings.
    StringList,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Struct => "struct",
            Self::StringList => "list of strings",
        })
    }
}

/// A candidate name for a field, optionally restricted to one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameHint {
    source: Option<SourceKind>,
    name: &'static str,
}

impl NameHint {
    /// A name tried by every source.
    #[must_use]
    pub const fn any(name: &'static str) -> Self {
        Self { source: None, name }
    }

    /// A name tried only by `source`.
    #[must_use]
    pub const fn source(source: SourceKind, name: &'static str) -> Self {
        Self {
            source: Some(source),
            name,
        }
    }

    /// The candidate name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The source this hint is restricted to, if any.
    #[must_use]
    pub const fn restricted_to(&self) -> Option<SourceKind> {
        self.source
    }
}

/// Metadata describing one field of a configuration struct.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// The Rust field name.
    pub ident: &'static str,
    /// Alternate names in declaration order.
    pub hints: &'static [NameHint],
    /// Literal applied by the defaults source when nothing else matched.
    pub default: Option<&'static str>,
    /// Whether the value must be redacted from logs.
    pub secret: bool,
    /// Whether the value may be written to logs.
    pub loggable: bool,
    /// Declared type family.
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Names to try for `source`, in order.
    ///
    /// Hints restricted to `source` come first, then unrestricted hints, then
    /// the field's own name. Duplicates are dropped, so the list is never
    /// empty and no name is consulted twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use layered_config::{FieldDescriptor, FieldKind, NameHint, SourceKind};
    ///
    /// static HINTS: &[NameHint] = &[
    ///     NameHint::any("dbHost"),
    ///     NameHint::source(SourceKind::Env, "DATABASE_HOST"),
    /// ];
    /// let field = FieldDescriptor {
    ///     ident: "db_host",
    ///     hints: HINTS,
    ///     default: None,
    ///     secret: false,
    ///     loggable: true,
    ///     kind: FieldKind::String,
    /// };
    /// assert_eq!(
    ///     field.hints_for(SourceKind::Env),
    ///     ["DATABASE_HOST", "dbHost", "db_host"]
    /// );
    /// assert_eq!(field.hints_for(SourceKind::File), ["dbHost", "db_host"]);
    /// ```
    #[must_use]
    pub fn hints_for(&self, source: SourceKind) -> Vec<&'static str> {
        let specific = self
            .hints
            .iter()
            .filter(|hint| hint.source == Some(source));
        let generic = self.hints.iter().filter(|hint| hint.source.is_none());
        let mut names: Vec<&'static str> = Vec::with_capacity(self.hints.len() + 1);
        for name in specific
            .chain(generic)
            .map(NameHint::name)
            .chain(std::iter::once(self.ident))
        {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Ordered field metadata for one configuration struct.
#[derive(Debug, Clone, Copy)]
pub struct ConfigDescriptor {
    /// Name of the Rust type.
    pub type_name: &'static str,
    /// Fields in declaration order.
    pub fields: &'static [FieldDescriptor],
}

/// Mutable access to a single field.
pub enum FieldSlot<'a> {
    /// A scalar or list field accepting raw values.
    Value(&'a mut dyn Settable),
    /// A nested configuration struct.
    Nested(&'a mut dyn Configurable),
}

/// Read-only access to a single field.
pub enum FieldRef<'a> {
    /// A scalar or list field.
    Value(&'a dyn Settable),
    /// A nested configuration struct.
    Nested(&'a dyn Configurable),
}

/// A struct whose fields can be populated from configuration sources.
///
/// Implemented by `#[derive(Layered)]`. The index passed to
/// [`Configurable::field_mut`] and [`Configurable::field`] is the position of
/// the field in [`ConfigDescriptor::fields`].
pub trait Configurable: Send {
    /// Field metadata for this struct.
    fn descriptor(&self) -> ConfigDescriptor;

    /// Mutable slot for the field at `index`.
    fn field_mut(&mut self, index: usize) -> Option<FieldSlot<'_>>;

    /// Read-only view of the field at `index`.
    fn field(&self, index: usize) -> Option<FieldRef<'_>>;
}

/// A type usable as a field of a `#[derive(Layered)]` struct.
pub trait Field {
    /// Type family recorded in the descriptor.
    const KIND: FieldKind;

    /// Mutable slot for this value.
    fn slot(&mut self) -> FieldSlot<'_>;

    /// Read-only view of this value.
    fn view(&self) -> FieldRef<'_>;
}
