//! Derive macros for the ls8 crate.
//!
//! Provides:
//! - `#[derive(Error)]` - `Display` and `std::error::Error` for error enums and structs

mod error;

use proc_macro::TokenStream;

/// Implements `Display` and `Error` from `#[error("...")]` messages.
///
/// Fields marked `#[source]` are returned from `Error::source`.
#[proc_macro_derive(Error, attributes(error, source))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
