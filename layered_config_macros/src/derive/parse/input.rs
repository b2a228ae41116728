//! Input parsing for the `Layered` derive macro.
//!
//! Gathers the struct identifier, fields and attribute metadata in one pass
//! so expansion can fail fast with useful errors.

use syn::{Data, DeriveInput, Fields};

use super::{FieldAttrs, StructAttrs, parse_field_attrs, parse_struct_attrs};

/// One named field that takes part in binding.
pub(crate) struct ParsedField {
    pub ident: syn::Ident,
    pub ty: syn::Type,
    pub attrs: FieldAttrs,
}

/// The user's struct, reduced to what generation needs.
pub(crate) struct ParsedStruct {
    pub ident: syn::Ident,
    pub attrs: StructAttrs,
    /// Fields in declaration order, without skipped ones.
    pub fields: Vec<ParsedField>,
}

/// Gathers information from the user-provided struct.
///
/// Only non-generic structs with named fields are accepted.
pub(crate) fn parse_input(input: &DeriveInput) -> syn::Result<ParsedStruct> {
    let ident = input.ident.clone();
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Layered cannot be derived for generic structs",
        ));
    }
    let attrs = parse_struct_attrs(&input.attrs)?;
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    data.struct_token,
                    "Layered requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Layered can only be derived for structs",
            ));
        }
    };

    let mut fields = Vec::with_capacity(named.len());
    for field in named {
        let field_attrs = parse_field_attrs(&field.attrs)?;
        if field_attrs.skip {
            continue;
        }
        let Some(field_ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Layered requires named fields"));
        };
        fields.push(ParsedField {
            ident: field_ident,
            ty: field.ty.clone(),
            attrs: field_attrs,
        });
    }
    Ok(ParsedStruct {
        ident,
        attrs,
        fields,
    })
}
