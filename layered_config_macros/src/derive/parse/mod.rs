//! Parsing of `#[layered(...)]` attributes.

use syn::Attribute;
use syn::meta::ParseNestedMeta;

mod input;
mod literals;
#[cfg(test)]
mod tests;

pub(crate) use input::{ParsedField, ParsedStruct, parse_input};
use literals::{lit_bool, lit_names, lit_str, lit_text};

/// Struct-level attributes.
#[derive(Default, Clone)]
pub(crate) struct StructAttrs {
    /// Overrides the generated crate path for dependency aliasing.
    pub crate_path: Option<syn::Path>,
}

/// A source that a name hint can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HintSource {
    Env,
    Flags,
    Consul,
    Vault,
    File,
}

impl HintSource {
    /// Variant name of `layered_config::SourceKind`.
    pub(crate) const fn variant(self) -> &'static str {
        match self {
            Self::Env => "Env",
            Self::Flags => "Flags",
            Self::Consul => "Consul",
            Self::Vault => "Vault",
            Self::File => "File",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "env" => Some(Self::Env),
            "flag" => Some(Self::Flags),
            "consul" => Some(Self::Consul),
            "vault" => Some(Self::Vault),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

/// Field-level attributes recognised by `#[derive(Layered)]`.
#[derive(Default, Clone)]
pub(crate) struct FieldAttrs {
    /// Names tried by every source.
    pub names: Vec<String>,
    /// Names tried by one source only, in declaration order.
    pub source_names: Vec<(HintSource, String)>,
    pub default: Option<String>,
    pub secret: bool,
    pub loggable: Option<bool>,
    pub skip: bool,
}

impl FieldAttrs {
    /// Whether an explicit name was given for `source`.
    pub(crate) fn has_names_for(&self, source: HintSource) -> bool {
        self.source_names.iter().any(|(kind, _)| *kind == source)
    }

    /// Whether the value may be logged.
    pub(crate) fn is_loggable(&self) -> bool {
        self.loggable.unwrap_or(!self.secret)
    }
}

/// Iterate all `#[layered(...)]` attributes once and apply a callback.
fn parse_layered<F>(attrs: &[Attribute], mut f: F) -> syn::Result<()>
where
    F: FnMut(&ParseNestedMeta) -> syn::Result<()>,
{
    for attr in attrs.iter().filter(|a| a.path().is_ident("layered")) {
        attr.parse_nested_meta(|meta| f(&meta))?;
    }
    Ok(())
}

fn meta_key(meta: &ParseNestedMeta) -> syn::Result<String> {
    meta.path
        .get_ident()
        .map(ToString::to_string)
        .ok_or_else(|| meta.error("expected a single identifier"))
}

/// Reads a flag-style key that may also be written `key = bool`.
fn flag_value(meta: &ParseNestedMeta, key: &str) -> syn::Result<bool> {
    if meta.input.peek(syn::Token![=]) {
        lit_bool(meta, key)
    } else {
        Ok(true)
    }
}

/// Extracts `#[layered(...)]` metadata applied to a struct.
pub(crate) fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut out = StructAttrs::default();
    parse_layered(attrs, |meta| {
        let key = meta_key(meta)?;
        match key.as_str() {
            "crate" => {
                let s = lit_str(meta, "crate")?;
                let path: syn::Path =
                    syn::parse_str(&s.value()).map_err(|e| syn::Error::new(s.span(), e))?;
                out.crate_path = Some(path);
                Ok(())
            }
            other => Err(meta.error(format!("unknown struct attribute `{other}`"))),
        }
    })?;
    Ok(out)
}

fn apply_field_attr(meta: &ParseNestedMeta, out: &mut FieldAttrs) -> syn::Result<()> {
    let key = meta_key(meta)?;
    if let Some(source) = HintSource::from_key(&key) {
        let names = lit_names(meta, &key)?;
        out.source_names
            .extend(names.into_iter().map(|name| (source, name)));
        return Ok(());
    }
    match key.as_str() {
        "name" => out.names.extend(lit_names(meta, "name")?),
        "default" => out.default = Some(lit_text(meta, "default")?),
        "secret" => out.secret = flag_value(meta, "secret")?,
        "loggable" => out.loggable = Some(flag_value(meta, "loggable")?),
        "skip" => out.skip = flag_value(meta, "skip")?,
        other => return Err(meta.error(format!("unknown field attribute `{other}`"))),
    }
    Ok(())
}

/// Parses field-level `#[layered(...)]` attributes.
///
/// Keys may repeat; names accumulate in declaration order.
pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    parse_layered(attrs, |meta| apply_field_attr(meta, &mut out))?;
    Ok(out)
}
