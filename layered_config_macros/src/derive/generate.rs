//! Token generation for `#[derive(Layered)]`.
//!
//! Emits an `impl Configurable` carrying a static descriptor table and an
//! `impl Field` so the struct can itself be nested in another one.

use heck::ToKebabCase;
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use super::parse::{HintSource, ParsedField, ParsedStruct};

/// Hint expressions for one field, source-restricted names first.
fn hint_tokens(field: &ParsedField, krate: &TokenStream) -> Vec<TokenStream> {
    let attrs = &field.attrs;
    let mut hints: Vec<TokenStream> = attrs
        .source_names
        .iter()
        .map(|(source, name)| {
            let variant = format_ident!("{}", source.variant());
            quote! { #krate::NameHint::source(#krate::SourceKind::#variant, #name) }
        })
        .collect();
    if !attrs.has_names_for(HintSource::Flags) {
        let flag = field.ident.to_string().to_kebab_case();
        hints.push(quote! { #krate::NameHint::source(#krate::SourceKind::Flags, #flag) });
    }
    hints.extend(
        attrs
            .names
            .iter()
            .map(|name| quote! { #krate::NameHint::any(#name) }),
    );
    hints
}

fn descriptor_entry(field: &ParsedField, krate: &TokenStream) -> TokenStream {
    let ident = field.ident.to_string();
    let ty = &field.ty;
    let hints = hint_tokens(field, krate);
    let default = field.attrs.default.as_ref().map_or_else(
        || quote! { ::core::option::Option::None },
        |value| quote! { ::core::option::Option::Some(#value) },
    );
    let secret = field.attrs.secret;
    let loggable = field.attrs.is_loggable();
    quote! {
        #krate::FieldDescriptor {
            ident: #ident,
            hints: &[#(#hints),*],
            default: #default,
            secret: #secret,
            loggable: #loggable,
            kind: <#ty as #krate::Field>::KIND,
        }
    }
}

/// Builds both trait implementations for `parsed`.
pub(crate) fn implementations(parsed: &ParsedStruct, krate: &TokenStream) -> TokenStream {
    let ident = &parsed.ident;
    let type_name = ident.to_string();
    let entries = parsed.fields.iter().map(|field| descriptor_entry(field, krate));
    let indices: Vec<Literal> = (0..parsed.fields.len())
        .map(Literal::usize_unsuffixed)
        .collect();
    let members: Vec<&syn::Ident> = parsed.fields.iter().map(|field| &field.ident).collect();

    quote! {
        #[automatically_derived]
        impl #krate::Configurable for #ident {
            fn descriptor(&self) -> #krate::ConfigDescriptor {
                const FIELDS: &[#krate::FieldDescriptor] = &[#(#entries),*];
                #krate::ConfigDescriptor {
                    type_name: #type_name,
                    fields: FIELDS,
                }
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<#krate::FieldSlot<'_>> {
                match index {
                    #(#indices => ::core::option::Option::Some(
                        #krate::Field::slot(&mut self.#members)
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field(&self, index: usize) -> ::core::option::Option<#krate::FieldRef<'_>> {
                match index {
                    #(#indices => ::core::option::Option::Some(
                        #krate::Field::view(&self.#members)
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        #[automatically_derived]
        impl #krate::Field for #ident {
            const KIND: #krate::FieldKind = #krate::FieldKind::Struct;

            fn slot(&mut self) -> #krate::FieldSlot<'_> {
                #krate::FieldSlot::Nested(self)
            }

            fn view(&self) -> #krate::FieldRef<'_> {
                #krate::FieldRef::Nested(self)
            }
        }
    }
}
