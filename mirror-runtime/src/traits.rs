// Traits for reflected types and the Rust storage types of their fields.
// `#[derive(Reflect)]` generates `Reflect` impls; `FieldType` is implemented
// here for exactly one Rust type per `FieldKind`.

use std::any::Any;

use glam::{Vec2, Vec3};
use mirror_ffi::FieldKind;

use crate::descriptor::TypeDescriptor;
use crate::math::Color;
use crate::value::FieldValue;

/// Implemented (usually by `#[derive(Reflect)]`) for every type exposed to tooling.
pub trait Reflect: Any {
    /// Registry name of the type.
    const REFLECT_NAME: &'static str;

    /// Build the descriptor registered for this type.
    fn describe() -> TypeDescriptor;
}

/// Rust storage type of a reflected field.
///
/// Each `FieldKind` with typed access has exactly one storage type, so asking
/// for an `i64` out of an `Int` field is a compile error rather than a
/// misread.
pub trait FieldType: Clone + 'static {
    const KIND: FieldKind;

    fn into_value(self) -> FieldValue;

    fn from_value(value: FieldValue) -> Option<Self>;
}

macro_rules! impl_field_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl FieldType for $ty {
            const KIND: FieldKind = FieldKind::$variant;

            #[inline]
            fn into_value(self) -> FieldValue {
                FieldValue::$variant(self)
            }

            #[inline]
            fn from_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

impl_field_type! {
    bool => Bool,
    i32 => Int,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec2 => Vector2,
    Vec3 => Vector3,
    Color => Color,
}
