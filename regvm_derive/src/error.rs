//! Derive macro for error enums.
//!
//! # Usage
//!
//! ```ignore
//! use regvm_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum StoreError {
//!     #[error("store is full")]
//!     Full,
//!
//!     #[error("index {index} out of bounds")]
//!     OutOfBounds { index: usize, len: usize },
//!
//!     #[error("bad word {0:#x}")]
//!     BadWord(usize),
//! }
//! ```
//!
//! Only the fields a message refers to are bound in the generated match arm,
//! so a variant may carry context that its message does not print.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use std::collections::BTreeSet;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, Lit, Meta, Variant};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive only supports enums",
        ));
    };

    let arms = data
        .variants
        .iter()
        .map(display_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#arms)*
                }
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Builds the `Display` match arm for one variant.
fn display_arm(variant: &Variant) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &variant.ident;
    let message = error_message(variant)?;
    let (format, used) = rewrite_placeholders(&message);

    match &variant.fields {
        Fields::Unit => {
            if let Some(name) = used.iter().next() {
                return Err(unknown_field(variant, name));
            }
            Ok(quote! { Self::#ident => write!(f, #format), })
        }
        Fields::Unnamed(fields) => {
            let mut patterns = Vec::with_capacity(fields.unnamed.len());
            let mut bound = Vec::new();
            for i in 0..fields.unnamed.len() {
                let alias = format!("f{i}");
                if used.contains(&alias) {
                    let alias = format_ident!("{}", alias);
                    patterns.push(quote! { #alias });
                    bound.push(alias);
                } else {
                    patterns.push(quote! { _ });
                }
            }
            if let Some(name) = used.iter().find(|n| !bound.iter().any(|b| b == n.as_str())) {
                return Err(unknown_field(variant, name));
            }
            Ok(quote! {
                Self::#ident(#(#patterns),*) => write!(f, #format, #(#bound = #bound),*),
            })
        }
        Fields::Named(fields) => {
            let bound: Vec<&Ident> = fields
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .filter(|field| used.contains(&field.to_string()))
                .collect();
            if let Some(name) = used.iter().find(|n| !bound.iter().any(|b| *b == n.as_str())) {
                return Err(unknown_field(variant, name));
            }
            Ok(quote! {
                Self::#ident { #(#bound,)* .. } => write!(f, #format, #(#bound = #bound),*),
            })
        }
    }
}

fn unknown_field(variant: &Variant, name: &str) -> syn::Error {
    syn::Error::new_spanned(
        variant,
        format!(
            "#[error] message of `{}` refers to `{}`, which is not a field of the variant",
            variant.ident, name
        ),
    )
}

/// Reads the string literal out of the variant's `#[error("...")]` attribute.
fn error_message(variant: &Variant) -> syn::Result<String> {
    let Some(attr) = variant.attrs.iter().find(|a| a.path().is_ident("error")) else {
        return Err(syn::Error::new_spanned(
            &variant.ident,
            format!(
                "missing #[error(\"...\")] attribute on variant `{}`",
                variant.ident
            ),
        ));
    };

    let Meta::List(list) = &attr.meta else {
        return Err(syn::Error::new_spanned(
            &attr.meta,
            "expected #[error(\"message\")]",
        ));
    };

    match syn::parse2::<Lit>(list.tokens.clone()) {
        Ok(Lit::Str(lit)) => Ok(lit.value()),
        _ => Err(syn::Error::new(
            Span::call_site(),
            "#[error] message must be a single string literal",
        )),
    }
}

/// Renames positional placeholders (`{0}`, `{1:?}`) to `{f0}`, `{f1:?}` and
/// collects every argument name the message uses.
fn rewrite_placeholders(message: &str) -> (String, BTreeSet<String>) {
    let mut out = String::with_capacity(message.len() + 4);
    let mut used = BTreeSet::new();
    let mut chars = message.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push_str("{{");
            }
            '{' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '}' || next == ':' {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                let name = if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
                    format!("f{name}")
                } else {
                    name
                };
                out.push('{');
                out.push_str(&name);
                if !name.is_empty() {
                    used.insert(name);
                }
            }
            other => out.push(other),
        }
    }

    (out, used)
}
