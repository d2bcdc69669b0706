// mirror-runtime: reflection registry, typed field access, JSON codec and the
// editor query protocol. Everything here is safe Rust except the raw-pointer
// seam used by the flat C API (`TypeDescriptor::instance_from_raw`).

pub mod error;
pub mod logging;
pub mod ffi_guard;
pub mod math;
pub mod value;
pub mod traits;
pub mod descriptor;
pub mod registry;
pub mod accessor;
pub mod json;
pub mod ipc;
pub mod config;

// Re-export the primary public API surface.
pub use error::{error_payload, payload_error, MirrorError, MirrorResult};
pub use logging::{install_host_logger, LOG_DISPLAY, LOG_ERROR, LOG_WARNING};
pub use ffi_guard::{ffi_boundary, panic_message};
pub use math::Color;
pub use value::FieldValue;
pub use traits::{FieldType, Reflect};
pub use descriptor::{FieldAccessor, FieldDescriptor, TypeDescriptor};
pub use registry::{Registry, RegistryBuilder, TypeRegistration};
pub use json::{deserialize, load_from_file, save_to_file, serialize, serialize_compact};
pub use ipc::{Client, ClientTransport, LoopbackHub, Message, ObjectTable, Server, ServerTransport};
pub use config::MirrorConfig;

// Re-export FFI types used in public signatures.
pub use mirror_ffi::{FieldKind, MessageFamily, MessageType, MirrorErrorCode};

// Storage types of vector fields.
pub use glam::{Vec2, Vec3};
