//! Literal parsing helpers for derive attributes.

use syn::meta::ParseNestedMeta;
use syn::{Lit, LitStr};

/// Parses a literal from an attribute using `extractor`.
fn parse_lit<T, F>(meta: &ParseNestedMeta, key: &str, expected: &str, extractor: F) -> syn::Result<T>
where
    F: FnOnce(Lit) -> Option<T>,
{
    let literal = meta.value()?.parse::<Lit>()?;
    let span = literal.span();
    extractor(literal).ok_or_else(|| syn::Error::new(span, format!("{key} must be a {expected}")))
}

/// Parses a string literal.
pub(crate) fn lit_str(meta: &ParseNestedMeta, key: &str) -> syn::Result<LitStr> {
    parse_lit(meta, key, "string", |lit| match lit {
        Lit::Str(s) => Some(s),
        _ => None,
    })
}

/// Parses a boolean literal.
pub(crate) fn lit_bool(meta: &ParseNestedMeta, key: &str) -> syn::Result<bool> {
    parse_lit(meta, key, "boolean", |lit| match lit {
        Lit::Bool(b) => Some(b.value),
        _ => None,
    })
}

/// Parses a string, integer, float or boolean literal into its text.
///
/// Lets `default = 8080` stand in for `default = "8080"`.
pub(crate) fn lit_text(meta: &ParseNestedMeta, key: &str) -> syn::Result<String> {
    parse_lit(meta, key, "string, number or boolean literal", |lit| match lit {
        Lit::Str(s) => Some(s.value()),
        Lit::Int(i) => Some(i.base10_digits().to_owned()),
        Lit::Float(f) => Some(f.base10_digits().to_owned()),
        Lit::Bool(b) => Some(b.value.to_string()),
        _ => None,
    })
}

/// Parses a comma-separated list of names.
///
/// Blank entries are dropped, so `"a, ,b"` yields `a` and `b`.
pub(crate) fn lit_names(meta: &ParseNestedMeta, key: &str) -> syn::Result<Vec<String>> {
    let lit = lit_str(meta, key)?;
    let names: Vec<String> = lit
        .value()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect();
    if names.is_empty() {
        return Err(syn::Error::new(lit.span(), format!("{key} must name at least one key")));
    }
    Ok(names)
}
