// Type registry: name -> TypeDescriptor catalog.
//
// Two phases:
// 1. `RegistryBuilder` collects descriptors at start-up (by hand, per type, or
//    from link-time `#[derive(Reflect)]` submissions).
// 2. `build()` freezes it into an immutable `Registry`, shared by `Arc`.
//
// A process-wide registry exists only for the flat C API.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::traits::Reflect;

// ---------------------------------------------------------------------------
// Inventory-based auto-registration
// ---------------------------------------------------------------------------

/// Submitted by `#[derive(Reflect)]`; registers one type into a builder.
pub struct TypeRegistration {
    pub register: fn(&mut RegistryBuilder),
}
inventory::collect!(TypeRegistration);

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Mutable start-up phase of a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    types: BTreeMap<String, TypeDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a type described only by name, size and fields.
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        size_bytes: usize,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> &mut Self {
        let mut desc = TypeDescriptor::new(name, size_bytes);
        for field in fields {
            desc.add_field(field);
        }
        self.register_descriptor(desc)
    }

    /// Insert or replace a prepared descriptor. Last writer wins.
    pub fn register_descriptor(&mut self, desc: TypeDescriptor) -> &mut Self {
        let name = desc.name().to_string();
        if self.types.insert(name.clone(), desc).is_some() {
            log::warn!("type '{name}' registered twice, replacing the previous descriptor");
        }
        self
    }

    /// Register the descriptor `T` produces for itself.
    pub fn register<T: Reflect>(&mut self) -> &mut Self {
        self.register_descriptor(T::describe())
    }

    /// Register every type submitted at link time by `#[derive(Reflect)]`.
    pub fn register_all_from_inventory(&mut self) -> &mut Self {
        let before = self.types.len();
        let mut submissions = 0u32;
        for reg in inventory::iter::<TypeRegistration> {
            (reg.register)(self);
            submissions += 1;
        }
        log::info!(
            "register_all_from_inventory: {} submissions, {} new types",
            submissions,
            self.types.len() - before,
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Freeze into an immutable registry.
    pub fn build(self) -> Registry {
        let names = self.types.keys().cloned().collect();
        Registry { types: self.types, names }
    }
}

// ---------------------------------------------------------------------------
// Frozen registry
// ---------------------------------------------------------------------------

/// Immutable catalog of type descriptors, ordered by name.
#[derive(Debug, Default)]
pub struct Registry {
    types: BTreeMap<String, TypeDescriptor>,
    names: Vec<String>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// A registry holding every link-time `#[derive(Reflect)]` type.
    pub fn from_inventory() -> Registry {
        let mut builder = RegistryBuilder::new();
        builder.register_all_from_inventory();
        builder.build()
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn list_type_names(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn type_count(&self) -> usize {
        self.names.len()
    }

    /// Name at `index` in `list_type_names` order.
    pub fn type_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }
}

// ---------------------------------------------------------------------------
// Process-wide instance (C API only)
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Install the registry served by the flat C API.
///
/// Returns `false` if one was already installed (or lazily built).
pub fn install_global(registry: Arc<Registry>) -> bool {
    GLOBAL.set(registry).is_ok()
}

/// The process-wide registry, built from inventory on first use if nothing
/// was installed.
pub fn global() -> Arc<Registry> {
    GLOBAL
        .get_or_init(|| Arc::new(Registry::from_inventory()))
        .clone()
}
