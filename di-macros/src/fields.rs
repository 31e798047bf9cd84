//! Field access shared by both derives.

use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Field, Fields, Ident, Type};

/// `(name, type)` of every named field, or a spanned error naming `derive`.
pub fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<Vec<(&'a Ident, &'a Type)>> {
    let named: &Punctuated<Field, Comma> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{} can only be derived for structs with named fields", derive),
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{} can only be derived for structs", derive),
            ))
        }
    };

    named
        .iter()
        .map(|field| {
            field
                .ident
                .as_ref()
                .map(|ident| (ident, &field.ty))
                .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))
        })
        .collect()
}
