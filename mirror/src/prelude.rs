// Prelude: one-import access to the most commonly used mirror types.
//
// Usage: `use mirror::prelude::*;`

// Core runtime types
pub use mirror_runtime::{
    Color, FieldDescriptor, FieldKind, FieldType, FieldValue, MirrorError, MirrorResult, Registry,
    RegistryBuilder, TypeDescriptor,
    LOG_DISPLAY, LOG_WARNING, LOG_ERROR,
};

// Protocol
pub use mirror_runtime::ipc::{Client, LoopbackHub, Message, ObjectTable, Server};
pub use mirror_runtime::MessageType;

// Derive macro and trait
pub use crate::Reflect;

// glam re-exports (vector field storage types)
pub use glam::{Vec2, Vec3};
