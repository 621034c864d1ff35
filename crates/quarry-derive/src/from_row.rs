//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitStr, Result};

struct FieldAttrs {
    column: Option<String>,
    default: bool,
}

fn parse_field_attrs(field: &Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs {
        column: None,
        default: false,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("quarry") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.column = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("default") {
                attrs.default = true;
                Ok(())
            } else {
                Err(meta.error("unsupported quarry attribute, expected `column` or `default`"))
            }
        })?;
    }

    Ok(attrs)
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let mut generics = input.generics.clone();
    let mut field_extracts = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let attrs = parse_field_attrs(field)?;
        let column = attrs.column.unwrap_or_else(|| field_name.to_string());
        let ty = &field.ty;

        // Bound every field type so generic fields resolve.
        let predicates = &mut generics.make_where_clause().predicates;
        predicates.push(syn::parse_quote!(#ty: ::quarry::FromValue));
        if attrs.default {
            predicates.push(syn::parse_quote!(#ty: ::core::default::Default));
        }

        field_extracts.push(if attrs.default {
            quote! {
                #field_name: match row.get(#column) {
                    Some(_) => row.try_get(#column)?,
                    None => ::core::default::Default::default(),
                }
            }
        } else {
            quote! {
                #field_name: row.try_get(#column)?
            }
        });
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::quarry::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::quarry::Record) -> ::quarry::DbResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
