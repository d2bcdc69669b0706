// #[derive(Reflect)] expansion: builds the type descriptor from the struct's
// named fields and submits the type for link-time registration.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{parse2, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta, Token};
use syn::punctuated::Punctuated;

use crate::field_kind::{self, Access};

// ---------------------------------------------------------------------------
// Attribute parsing
// ---------------------------------------------------------------------------

/// Parsed #[reflect(...)] attributes, on the struct or on a field.
#[derive(Default)]
struct ReflectArgs {
    name: Option<String>,
    rename: Option<String>,
    skip: bool,
    custom: bool,
}

fn string_value(expr: &Expr, key: &str) -> syn::Result<String> {
    if let Expr::Lit(syn::ExprLit { lit: Lit::Str(s), .. }) = expr {
        Ok(s.value())
    } else {
        Err(syn::Error::new_spanned(
            expr,
            format!("`{key}` must be a string literal, e.g. {key} = \"Transform\""),
        ))
    }
}

fn parse_reflect_args(attrs: &[Attribute]) -> syn::Result<ReflectArgs> {
    let mut args = ReflectArgs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        let nested = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for meta in &nested {
            match meta {
                Meta::Path(p) if p.is_ident("skip") => args.skip = true,
                Meta::Path(p) if p.is_ident("custom") => args.custom = true,
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    args.name = Some(string_value(&nv.value, "name")?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    args.rename = Some(string_value(&nv.value, "rename")?);
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unknown reflect option; expected `name`, `rename`, `skip` or `custom`",
                    ));
                }
            }
        }
    }
    Ok(args)
}

// ---------------------------------------------------------------------------
// Field classification
// ---------------------------------------------------------------------------

struct ReflectedField {
    ident: Ident,
    ty: syn::Type,
    name: String,
    access: Access,
}

fn classify_fields(input: &DeriveInput) -> syn::Result<Vec<ReflectedField>> {
    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(f) => &f.named,
            _ => return Err(named_fields_error(input)),
        },
        _ => return Err(named_fields_error(input)),
    };

    let mut reflected = Vec::new();
    for field in fields {
        let args = parse_reflect_args(&field.attrs)?;
        if args.name.is_some() {
            return Err(syn::Error::new_spanned(field, "`name` applies to the struct; use `rename` on fields"));
        }
        if args.skip {
            continue;
        }
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let access = if args.custom {
            Access::Opaque
        } else {
            field_kind::map_type(&field.ty).map(|_| Access::Bound).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "unsupported field type for #[derive(Reflect)]: expected bool, i32, f32, f64, \
                     String, Vec2, Vec3 or Color.\n\n\
                     Mark the field #[reflect(skip)] to hide it or #[reflect(custom)] to describe it \
                     without an accessor.",
                )
            })?
        };
        let name = args.rename.unwrap_or_else(|| ident.to_string());
        if reflected.iter().any(|f: &ReflectedField| f.name == name) {
            return Err(syn::Error::new_spanned(field, format!("duplicate reflected field name `{name}`")));
        }
        reflected.push(ReflectedField { ident, ty: field.ty.clone(), name, access });
    }
    Ok(reflected)
}

fn named_fields_error(input: &DeriveInput) -> syn::Error {
    syn::Error::new_spanned(
        &input.ident,
        "#[derive(Reflect)] requires a struct with named fields.\n\n\
         Example:\n\
         \x20   #[derive(Reflect)]\n\
         \x20   pub struct Transform {\n\
         \x20       x: f32,\n\
         \x20       y: f32,\n\
         \x20   }",
    )
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

pub fn expand_derive_reflect(item: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(item)?;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Reflect)] does not support generic types",
        ));
    }

    let struct_name = &input.ident;
    let type_args = parse_reflect_args(&input.attrs)?;
    if type_args.skip || type_args.custom || type_args.rename.is_some() {
        return Err(syn::Error::new_spanned(
            struct_name,
            "only `name` is allowed on the struct, e.g. #[reflect(name = \"Transform\")]",
        ));
    }
    let reflect_name = type_args.name.unwrap_or_else(|| struct_name.to_string());
    let fields = classify_fields(&input)?;

    let field_exprs: Vec<TokenStream> = fields
        .iter()
        .map(|f| {
            let ident = &f.ident;
            let ty = &f.ty;
            let name = &f.name;
            let offset = quote! { ::core::mem::offset_of!(#struct_name, #ident) };
            match f.access {
                Access::Bound => quote! {
                    ::mirror::FieldDescriptor::bound::<#struct_name, #ty>(
                        #name,
                        #offset,
                        |s: &#struct_name| &s.#ident,
                        |s: &mut #struct_name| &mut s.#ident,
                    )
                },
                Access::Opaque => quote! {
                    ::mirror::FieldDescriptor::opaque(#name, ::mirror::FieldKind::Custom, #offset)
                },
            }
        })
        .collect();

    let register_fn_name = format_ident!("__mirror_register_{}", to_snake_case(&struct_name.to_string()));

    Ok(quote! {
        impl ::mirror::Reflect for #struct_name {
            const REFLECT_NAME: &'static str = #reflect_name;

            fn describe() -> ::mirror::TypeDescriptor {
                ::mirror::TypeDescriptor::of::<#struct_name>(#reflect_name)
                    #(.with_field(#field_exprs))*
            }
        }

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #register_fn_name(builder: &mut ::mirror::RegistryBuilder) {
            builder.register::<#struct_name>();
        }

        ::mirror::__inventory::submit! {
            ::mirror::TypeRegistration {
                register: #register_fn_name,
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
