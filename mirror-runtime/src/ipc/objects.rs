// Live reflected objects addressable by id from the editor protocol.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::{MirrorError, MirrorResult};
use crate::json::codec::{serialize_compact, value_from_json};
use crate::registry::Registry;
use crate::traits::Reflect;

pub type ObjectId = u32;

struct Entry {
    type_name: String,
    object: Box<dyn Any + Send>,
}

/// Objects owned on behalf of the host, keyed by id (ids start at 1).
pub struct ObjectTable {
    registry: Arc<Registry>,
    entries: BTreeMap<ObjectId, Entry>,
    next_id: ObjectId,
}

/// An object table shared between the host loop and a server.
pub type SharedObjects = Arc<Mutex<ObjectTable>>;

/// Lock a shared table, recovering from poisoning.
pub fn lock_objects(objects: &SharedObjects) -> MutexGuard<'_, ObjectTable> {
    objects.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ObjectTable {
    pub fn new(registry: Arc<Registry>) -> Self {
        ObjectTable {
            registry,
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn into_shared(self) -> SharedObjects {
        Arc::new(Mutex::new(self))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Take ownership of a derived object.
    pub fn insert<T: Reflect + Send>(&mut self, object: T) -> MirrorResult<ObjectId> {
        self.insert_boxed(T::REFLECT_NAME, Box::new(object))
    }

    /// Take ownership of an object registered under `type_name`.
    pub fn insert_boxed(&mut self, type_name: &str, object: Box<dyn Any + Send>) -> MirrorResult<ObjectId> {
        let desc = self
            .registry
            .get_type(type_name)
            .ok_or_else(|| MirrorError::TypeNotFound(type_name.to_string()))?;
        desc.check_instance(object.as_ref())?;

        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, Entry { type_name: type_name.to_string(), object });
        Ok(id)
    }

    pub fn remove(&mut self, id: ObjectId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn type_of(&self, id: ObjectId) -> Option<&str> {
        self.entries.get(&id).map(|e| e.type_name.as_str())
    }

    pub fn get<T: Any>(&self, id: ObjectId) -> Option<&T> {
        self.entries.get(&id)?.object.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.entries.get_mut(&id)?.object.downcast_mut()
    }

    /// `(id, type name)` pairs in id order.
    pub fn list(&self) -> Vec<(ObjectId, &str)> {
        self.entries.iter().map(|(id, e)| (*id, e.type_name.as_str())).collect()
    }

    /// Compact JSON of an object's scalar fields.
    pub fn properties(&self, id: ObjectId) -> MirrorResult<String> {
        let entry = self.entries.get(&id).ok_or(MirrorError::ObjectNotFound(id))?;
        serialize_compact(&self.registry, &entry.type_name, entry.object.as_ref())
    }

    /// Set one scalar field from a JSON value.
    pub fn set_property(&mut self, id: ObjectId, field: &str, value: &Value) -> MirrorResult<()> {
        let entry = self.entries.get_mut(&id).ok_or(MirrorError::ObjectNotFound(id))?;
        let (_, field_desc) = self.registry.resolve(&entry.type_name, field)?;
        let value = value_from_json(field_desc, value)?;
        self.registry.set_value(&entry.type_name, field, entry.object.as_mut(), value)
    }
}
