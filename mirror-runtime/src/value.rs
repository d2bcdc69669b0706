// Owned, kind-tagged field values passed through the type-erased accessors.

use glam::{Vec2, Vec3};
use mirror_ffi::FieldKind;

use crate::math::Color;

/// A field value read from or written to a reflected instance.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Double(f64),
    String(String),
    Vector2(Vec2),
    Vector3(Vec3),
    Color(Color),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Double(_) => FieldKind::Double,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Vector2(_) => FieldKind::Vector2,
            FieldValue::Vector3(_) => FieldKind::Vector3,
            FieldValue::Color(_) => FieldKind::Color,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            FieldValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            FieldValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            FieldValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}
