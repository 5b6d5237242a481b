//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations.
//!
//! # Usage
//!
//! ```ignore
//! use ls8_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum LoadError {
//!     #[error("program file not found: {path}")]
//!     FileNotFound { path: String },
//!
//!     #[error("failed to read {path}: {source}")]
//!     Io {
//!         path: String,
//!         #[source]
//!         source: std::io::Error,
//!     },
//!
//!     #[error("unsupported operation: {0}")]
//!     Unsupported(String),
//!
//!     #[error("empty program")]
//!     Empty,
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args: `#[error("expected {expected}")]`
//! - `#[source]` on at most one field per variant, returned from `Error::source`
//!
//! Only the fields a message names are handed to `write!`, so a variant can
//! carry context that its message leaves out.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

/// Derives `Display` and `Error` for an enum or struct.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (display_body, source_body) = match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::with_capacity(data_enum.variants.len());
            let mut source_arms = Vec::new();

            for variant in &data_enum.variants {
                let variant_name = &variant.ident;
                let message = extract_error_message(
                    &variant.attrs,
                    variant_name,
                    &format!("variant `{variant_name}`"),
                )?;
                let Binding {
                    pattern,
                    format,
                    args,
                } = bind_message_fields(&variant.fields, &message);
                display_arms.push(quote! {
                    Self::#variant_name #pattern => write!(f, #format #(, #args)*),
                });

                if let Some((pattern, source)) = bind_source_field(&variant.fields)? {
                    source_arms.push(quote! {
                        Self::#variant_name #pattern => ::core::option::Option::Some(
                            #source as &(dyn ::std::error::Error + 'static)
                        ),
                    });
                }
            }

            let source_body = if source_arms.is_empty() {
                None
            } else {
                Some(quote! {
                    match self {
                        #(#source_arms)*
                        _ => ::core::option::Option::None,
                    }
                })
            };

            (
                quote! {
                    match self {
                        #(#display_arms)*
                    }
                },
                source_body,
            )
        }
        Data::Struct(data_struct) => {
            let message =
                extract_error_message(&input.attrs, name, &format!("type `{name}`"))?;
            let Binding {
                pattern,
                format,
                args,
            } = bind_message_fields(&data_struct.fields, &message);
            let display_body = quote! {
                let Self #pattern = self;
                write!(f, #format #(, #args)*)
            };

            let source_body = bind_source_field(&data_struct.fields)?.map(|(pattern, source)| {
                quote! {
                    let Self #pattern = self;
                    ::core::option::Option::Some(#source as &(dyn ::std::error::Error + 'static))
                }
            });

            (display_body, source_body)
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    let source_fn = source_body.map(|body| {
        quote! {
            #[allow(unreachable_patterns)]
            fn source(&self) -> ::core::option::Option<&(dyn ::std::error::Error + 'static)> {
                #body
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #source_fn
        }
    })
}

/// Destructuring pattern plus the `write!` arguments for one message.
struct Binding {
    pattern: TokenStream2,
    format: String,
    args: Vec<TokenStream2>,
}

/// Binds only the fields the message refers to.
fn bind_message_fields(fields: &Fields, message: &str) -> Binding {
    match fields {
        Fields::Unit => Binding {
            pattern: TokenStream2::new(),
            format: message.to_string(),
            args: Vec::new(),
        },
        Fields::Named(named) => {
            let used: Vec<_> = named
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .filter(|ident| mentions(message, &ident.to_string()))
                .collect();
            Binding {
                pattern: quote! { { #(#used,)* .. } },
                format: message.to_string(),
                args: used.iter().map(|ident| quote! { #ident = #ident }).collect(),
            }
        }
        Fields::Unnamed(unnamed) => {
            let mut format = message.to_string();
            let mut slots = Vec::with_capacity(unnamed.unnamed.len());
            let mut args = Vec::new();
            for i in 0..unnamed.unnamed.len() {
                if mentions(message, &i.to_string()) {
                    let ident = format_ident!("f{}", i);
                    format = format
                        .replace(&format!("{{{i}}}"), &format!("{{{ident}}}"))
                        .replace(&format!("{{{i}:"), &format!("{{{ident}:"));
                    args.push(quote! { #ident = #ident });
                    slots.push(ident.into_token_stream());
                } else {
                    slots.push(quote! { _ });
                }
            }
            Binding {
                pattern: quote! { ( #(#slots),* ) },
                format,
                args,
            }
        }
    }
}

/// Returns a pattern binding the `#[source]` field, and the bound name.
fn bind_source_field(fields: &Fields) -> syn::Result<Option<(TokenStream2, TokenStream2)>> {
    let mut marked = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.attrs.iter().any(|a| a.path().is_ident("source")));

    let Some((index, field)) = marked.next() else {
        return Ok(None);
    };
    if let Some((_, extra)) = marked.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "only one field per variant may be marked #[source]",
        ));
    }

    let bound = format_ident!("source");
    let pattern = match (fields, &field.ident) {
        (Fields::Named(_), Some(ident)) => quote! { { #ident: #bound, .. } },
        _ => {
            let slots = (0..fields.len()).map(|i| {
                if i == index {
                    bound.to_token_stream()
                } else {
                    quote! { _ }
                }
            });
            quote! { ( #(#slots),* ) }
        }
    };
    Ok(Some((pattern, bound.into_token_stream())))
}

/// Whether `message` interpolates the argument `name` (`{name}` or `{name:...}`).
fn mentions(message: &str, name: &str) -> bool {
    message.contains(&format!("{{{name}}}")) || message.contains(&format!("{{{name}:"))
}

/// Extracts the message from an `#[error("...")]` attribute.
fn extract_error_message<T: ToTokens>(
    attrs: &[Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    for attr in attrs {
        if !attr.path().is_ident("error") {
            continue;
        }
        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        };
        let lit = syn::parse2::<Lit>(meta_list.tokens.clone()).map_err(|_| {
            syn::Error::new_spanned(
                &attr.meta,
                "failed to parse #[error] attribute; expected a string literal like #[error(\"illegal opcode: {0}\")]",
            )
        })?;
        return match lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute: message must be a string literal",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        target,
        format!("missing #[error(\"...\")] attribute on {target_desc}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_plain_and_formatted_args() {
        assert!(mentions("pc {pc}", "pc"));
        assert!(mentions("opcode {opcode:#04x}", "opcode"));
        assert!(!mentions("pc {pcx}", "pc"));
        assert!(!mentions("no args", "pc"));
    }

    #[test]
    fn positional_args_are_renamed() {
        let fields: Fields = Fields::Unnamed(syn::parse_quote! { (String, u8) });
        let binding = bind_message_fields(&fields, "unsupported: {0}");
        assert_eq!(binding.format, "unsupported: {f0}");
        assert_eq!(binding.args.len(), 1);
    }

    #[test]
    fn unused_named_fields_are_skipped() {
        let fields: Fields = Fields::Named(syn::parse_quote! { { line: usize, text: String } });
        let binding = bind_message_fields(&fields, "line {line} is malformed");
        assert_eq!(binding.args.len(), 1);
    }

    #[test]
    fn source_field_is_found() {
        let fields: Fields = Fields::Named(syn::parse_quote! {
            { path: String, #[source] source: std::io::Error }
        });
        assert!(bind_source_field(&fields).unwrap().is_some());

        let fields: Fields = Fields::Named(syn::parse_quote! { { path: String } });
        assert!(bind_source_field(&fields).unwrap().is_none());
    }
}
