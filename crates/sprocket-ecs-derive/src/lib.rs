//! Derive macro for Sprocket ECS components.
//!
//! `#[derive(Component)]` implements `sprocket_ecs::Component` for a struct
//! or enum. Components are handed out as owned copies, so the type must also
//! be `Clone + Send + Sync + 'static`; the derive does not add those bounds
//! itself.
//!
//! ```ignore
//! #[derive(Component, Clone)]
//! struct Position { x: i64, y: i64 }
//! ```
//!
//! # Rejected Shapes
//!
//! - Unions
//! - Fields holding references, raw pointers, `dyn Trait` or `impl Trait`

use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::{Data, DeriveInput, Fields, Type, spanned::Spanned};

/// Derive macro for ECS components.
///
/// # Examples
///
/// ```ignore
/// #[derive(Component, Clone, Debug)]
/// struct Health(u32);
///
/// #[derive(Component, Clone, Copy)]
/// enum Team { Red, Blue }
/// ```
#[proc_macro_derive(Component)]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let mut errors = Vec::new();

    match &input.data {
        Data::Struct(data) => check_fields(&data.fields, &mut errors),
        Data::Enum(data) => {
            for variant in &data.variants {
                check_fields(&variant.fields, &mut errors);
            }
        }
        Data::Union(_) => {
            errors.push(quote_spanned! {
                input.span() =>
                compile_error!("Unions cannot derive Component. Use a struct or enum instead.");
            });
        }
    }

    if !errors.is_empty() {
        let error_tokens = errors.into_iter().collect::<proc_macro2::TokenStream>();
        return TokenStream::from(error_tokens);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::sprocket_ecs::Component for #name #ty_generics #where_clause {}
    };

    TokenStream::from(expanded)
}

fn check_fields(fields: &Fields, errors: &mut Vec<proc_macro2::TokenStream>) {
    for field in fields {
        check_type(&field.ty, errors);
    }
}

fn check_type(ty: &Type, errors: &mut Vec<proc_macro2::TokenStream>) {
    match ty {
        Type::Array(array) => check_type(&array.elem, errors),
        Type::Tuple(tuple) => {
            for elem in &tuple.elems {
                check_type(elem, errors);
            }
        }
        Type::Paren(paren) => check_type(&paren.elem, errors),
        Type::Group(group) => check_type(&group.elem, errors),
        Type::Reference(_) => {
            errors.push(quote_spanned! {
                ty.span() =>
                compile_error!("References are not allowed in components. Components are owned values.\n\
                               Store the value itself, or the EntityId of the entity holding it.");
            });
        }
        Type::Ptr(_) => {
            errors.push(quote_spanned! {
                ty.span() =>
                compile_error!("Raw pointers are not allowed in components.\n\
                               Refer to other entities by EntityId instead.");
            });
        }
        Type::TraitObject(_) => {
            errors.push(quote_spanned! {
                ty.span() =>
                compile_error!("Trait objects (dyn Trait) are not allowed in components.\n\
                               Use one component kind per variant of behavior instead.");
            });
        }
        Type::ImplTrait(_) => {
            errors.push(quote_spanned! {
                ty.span() =>
                compile_error!("impl Trait is not allowed in component fields. Use concrete types.");
            });
        }
        // Paths, `!`, `_` and friends are left for rustc to judge.
        _ => {}
    }
}
