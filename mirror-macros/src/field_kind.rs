// Rust field type → FieldKind mapping.

use syn::Type;

/// How the derive exposes a reflected field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Typed accessor; the kind comes from the field type's `FieldType` impl.
    Bound,
    /// Described as `FieldKind::Custom`, with no accessor.
    Opaque,
}

/// `FieldKind` variant a field type maps to, by the last path segment.
/// None for types without a typed accessor.
pub fn map_type(ty: &Type) -> Option<&'static str> {
    let type_str = match ty {
        Type::Path(tp) if tp.qself.is_none() => {
            let seg = tp.path.segments.last()?;
            if !seg.arguments.is_empty() {
                return None;
            }
            seg.ident.to_string()
        }
        _ => return None,
    };

    Some(match type_str.as_str() {
        "bool" => "Bool",
        "i32" => "Int",
        "f32" => "Float",
        "f64" => "Double",
        "String" => "String",
        "Vec2" => "Vector2",
        "Vec3" => "Vector3",
        "Color" => "Color",
        _ => return None,
    })
}
