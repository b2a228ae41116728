//! Procedural macros for `layered_config`.
//!
//! [`Layered`] generates the static field descriptor and the per-field slot
//! accessors that the loaders bind through, so no runtime type inspection is
//! needed.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive;

/// Derives `layered_config::Configurable` and `layered_config::Field` for a
/// struct with named fields.
///
/// Field attributes, all optional:
///
/// - `name = "a,b"`: names tried by every source.
/// - `env`, `flag`, `consul`, `vault`, `file`: names tried only by that
///   source. Without `flag`, the kebab-case field name is added as a flag.
/// - `default = "literal"`: applied by the defaults loader; numeric and
///   boolean literals are accepted too.
/// - `secret`: redacts the value from logs and summaries.
/// - `loggable = bool`: overrides the redaction implied by `secret`.
/// - `skip`: leaves the field out of the descriptor.
///
/// The struct attribute `#[layered(crate = "path")]` points generated code
/// at a renamed dependency.
#[proc_macro_derive(Layered, attributes(layered))]
pub fn derive_layered(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
