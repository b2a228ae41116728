//! Name-based access to the values offered by one source.
//!
//! Hierarchical sources (files, Consul, Vault) expose a decoded tree and
//! scope into sub-tables for nested structs. Flat sources (environment,
//! flags) have no tree; nested structs are reached by prefixing names.

use figment::value::{Dict, Value};
use uncased::UncasedStr;

use crate::descriptor::SourceKind;
use crate::value::RawValue;

/// Named-value lookup for a single source.
pub trait Lookup {
    /// The source answering the lookup.
    fn source(&self) -> SourceKind;

    /// Returns the raw value stored under `name`, if any.
    fn get(&self, name: &str) -> Option<RawValue>;

    /// Returns a lookup scoped to the nested struct reached through `hints`.
    ///
    /// `None` means the source holds nothing for the nested struct.
    fn nested(&self, hints: &[&str]) -> Option<Box<dyn Lookup + '_>>;
}

/// Lookup over a decoded document.
///
/// Keys match exactly first, then ignoring ASCII case, then ignoring case
/// together with `_` and `-` separators, so `untagged_str` finds
/// `untaggedStr`.
#[derive(Debug, Clone, Copy)]
pub struct TreeLookup<'a> {
    source: SourceKind,
    dict: &'a Dict,
}

impl<'a> TreeLookup<'a> {
    /// Wraps `dict` as the values offered by `source`.
    #[must_use]
    pub const fn new(source: SourceKind, dict: &'a Dict) -> Self {
        Self { source, dict }
    }

    fn find(&self, name: &str) -> Option<&'a Value> {
        if let Some(value) = self.dict.get(name) {
            return Some(value);
        }
        let wanted = UncasedStr::new(name);
        if let Some((_, value)) = self
            .dict
            .iter()
            .find(|(key, _)| UncasedStr::new(key) == wanted)
        {
            return Some(value);
        }
        let loose = loose_key(name);
        self.dict
            .iter()
            .find(|(key, _)| loose_key(key) == loose)
            .map(|(_, value)| value)
    }
}

fn loose_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Converts a decoded tree node into a raw value.
///
/// Empty nodes count as absent. A sequence is only a list when every item is
/// a scalar; one table, nested sequence or null item makes the whole sequence
/// [`RawValue::NestedList`].
#[must_use]
pub fn raw_from_value(value: &Value) -> Option<RawValue> {
    match value {
        Value::Empty(..) => None,
        Value::Dict(..) => Some(RawValue::Map),
        Value::Array(_, items) => Some(
            items
                .iter()
                .map(scalar_text)
                .collect::<Option<Vec<_>>>()
                .map_or(RawValue::NestedList, RawValue::List),
        ),
        other => scalar_text(other).map(RawValue::Scalar),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(_, text) => Some(text.clone()),
        Value::Char(_, c) => Some(c.to_string()),
        Value::Bool(_, flag) => Some(flag.to_string()),
        Value::Num(..) => serde_json::to_string(value).ok(),
        _ => None,
    }
}

impl Lookup for TreeLookup<'_> {
    fn source(&self) -> SourceKind {
        self.source
    }

    fn get(&self, name: &str) -> Option<RawValue> {
        self.find(name).and_then(raw_from_value)
    }

    fn nested(&self, hints: &[&str]) -> Option<Box<dyn Lookup + '_>> {
        hints.iter().find_map(|hint| match self.find(hint) {
            Some(Value::Dict(_, dict)) => {
                Some(Box::new(TreeLookup::new(self.source, dict)) as Box<dyn Lookup + '_>)
            }
            _ => None,
        })
    }
}

/// Lookup over a flat key space such as the environment.
///
/// Nested structs are addressed by joining every parent hint with every
/// child name using `separator`, trying parent hints in order.
pub struct FlatLookup<'a> {
    source: SourceKind,
    separator: &'static str,
    prefixes: Vec<String>,
    probe: &'a dyn Fn(&str) -> Option<RawValue>,
}

impl<'a> FlatLookup<'a> {
    /// Builds a top-level lookup that resolves names through `probe`.
    #[must_use]
    pub fn new(
        source: SourceKind,
        separator: &'static str,
        probe: &'a dyn Fn(&str) -> Option<RawValue>,
    ) -> Self {
        Self {
            source,
            separator,
            prefixes: Vec::new(),
            probe,
        }
    }

    /// Every full name `name` expands to under the current prefixes.
    #[must_use]
    pub fn expand(&self, name: &str) -> Vec<String> {
        if self.prefixes.is_empty() {
            return vec![name.to_owned()];
        }
        self.prefixes
            .iter()
            .map(|prefix| format!("{prefix}{}{name}", self.separator))
            .collect()
    }
}

impl Lookup for FlatLookup<'_> {
    fn source(&self) -> SourceKind {
        self.source
    }

    fn get(&self, name: &str) -> Option<RawValue> {
        self.expand(name)
            .iter()
            .find_map(|candidate| (self.probe)(candidate))
    }

    fn nested(&self, hints: &[&str]) -> Option<Box<dyn Lookup + '_>> {
        let prefixes = hints.iter().flat_map(|hint| self.expand(hint)).collect();
        Some(Box::new(FlatLookup {
            source: self.source,
            separator: self.separator,
            prefixes,
            probe: self.probe,
        }))
    }
}

/// Lookup that never finds anything; used by the defaults source.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLookup;

impl Lookup for EmptyLookup {
    fn source(&self) -> SourceKind {
        SourceKind::Default
    }

    fn get(&self, _name: &str) -> Option<RawValue> {
        None
    }

    fn nested(&self, _hints: &[&str]) -> Option<Box<dyn Lookup + '_>> {
        Some(Box::new(Self))
    }
}
