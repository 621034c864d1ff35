//! Derive macros for quarry
//!
//! Provides `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_row;

/// Derive `FromRow` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use quarry::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     name: String,
///     #[quarry(column = "email_address")]
///     email: Option<String>,
///     #[quarry(default)]
///     score: i64,
/// }
/// ```
///
/// # Attributes
///
/// - `#[quarry(column = "name")]` - Read the field from a differently named column
/// - `#[quarry(default)]` - Use `Default::default()` when the column is absent
#[proc_macro_derive(FromRow, attributes(quarry))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
