// mirror: user-facing library crate. Users derive `Reflect` on their types,
// build a `Registry` (or let the C API build the process-wide one) and hand
// it to the JSON codec and the protocol server.
//
//! ## Example
//!
//! ```ignore
//! use mirror::prelude::*;
//!
//! #[derive(Reflect, Default)]
//! struct Point { x: f32, y: f32 }
//!
//! let mut builder = Registry::builder();
//! builder.register::<Point>();
//! let registry = builder.build();
//!
//! let json = mirror::json::serialize(&registry, "Point", Some(&Point { x: 10.0, y: 20.0 }));
//! assert_eq!(json, "{\n  \"x\": 10.000000,\n  \"y\": 20.000000\n}");
//! ```

// Lets `#[derive(Reflect)]` expansions inside this crate resolve `::mirror`.
extern crate self as mirror;

// Re-exports for proc macro path resolution and user access.
pub use mirror_ffi as ffi;
pub use mirror_runtime as runtime;
pub use mirror_macros::Reflect;

pub use mirror_runtime::{
    json, ipc, config, logging,
    Color, FieldDescriptor, FieldKind, FieldType, FieldValue, MessageType, MirrorConfig,
    MirrorError, MirrorResult, Reflect, Registry, RegistryBuilder, TypeDescriptor,
    TypeRegistration, mlog,
};

// For proc macro generated inventory::submit! invocations.
#[doc(hidden)]
pub extern crate inventory as __inventory;

pub mod capi;
pub mod demo;
pub mod prelude;

// Re-export glam for convenience.
pub use glam;

use std::sync::Arc;

/// Build a registry from every `#[derive(Reflect)]` type linked into the
/// program and install it for the C API. Returns the installed registry
/// (the existing one if the C API already built or received one).
pub fn init() -> Arc<Registry> {
    let registry = Arc::new(Registry::from_inventory());
    if !capi::install_registry(Arc::clone(&registry)) {
        log::debug!("process-wide registry already installed");
    }
    let global = mirror_runtime::registry::global();
    log::info!("mirror initialized with {} types", global.type_count());
    global
}
