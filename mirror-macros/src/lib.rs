// mirror-macros: #[derive(Reflect)].

mod field_kind;
mod reflect;

/// Derive `mirror::Reflect` for a struct with named fields and register it
/// at link time.
///
/// Field kinds are inferred from the field types (`bool`, `i32`, `f32`,
/// `f64`, `String`, `Vec2`, `Vec3`, `Color`).
///
/// # Example
/// ```ignore
/// #[derive(Reflect, Default)]
/// #[reflect(name = "Player")]
/// pub struct PlayerState {
///     health: f32,
///     #[reflect(rename = "displayName")]
///     display_name: String,
///
///     // not visible to tooling
///     #[reflect(skip)]
///     path_cache: Vec<u32>,
///
///     // described, never read or written
///     #[reflect(custom)]
///     inventory: Inventory,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    match reflect::expand_derive_reflect(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
