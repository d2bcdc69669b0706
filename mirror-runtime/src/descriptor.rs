// Type and field descriptors.
//
// A field descriptor carries its name, kind and byte offset (reported to
// tooling) plus a type-erased accessor bound to the concrete field at
// registration time. Reads and writes always go through the accessor; the
// offset is never used to address memory.

use std::any::{Any, TypeId};
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

use mirror_ffi::FieldKind;

use crate::error::{MirrorError, MirrorResult};
use crate::traits::FieldType;
use crate::value::FieldValue;

type Getter = Arc<dyn Fn(&dyn Any) -> Option<FieldValue> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn Any, FieldValue) -> Option<()> + Send + Sync>;

/// Getter/setter pair for one field of one concrete type.
///
/// Both closures downcast the instance to the owning type and return `None`
/// when it is something else.
#[derive(Clone)]
pub struct FieldAccessor {
    get: Getter,
    set: Setter,
}

impl FieldAccessor {
    /// Bind to a field through plain projection functions, e.g.
    /// `FieldAccessor::new(|p: &Point| &p.x, |p: &mut Point| &mut p.x)`.
    pub fn new<T, V>(get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self
    where
        T: Any,
        V: FieldType,
    {
        FieldAccessor {
            get: Arc::new(move |instance: &dyn Any| {
                instance.downcast_ref::<T>().map(|t| get(t).clone().into_value())
            }),
            set: Arc::new(move |instance: &mut dyn Any, value: FieldValue| {
                let target = instance.downcast_mut::<T>()?;
                *get_mut(target) = V::from_value(value)?;
                Some(())
            }),
        }
    }

    pub fn read(&self, instance: &dyn Any) -> Option<FieldValue> {
        (self.get)(instance)
    }

    pub fn write(&self, instance: &mut dyn Any, value: FieldValue) -> Option<()> {
        (self.set)(instance, value)
    }
}

/// One named member of a reflected type.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    byte_offset: usize,
    accessor: Option<FieldAccessor>,
}

impl FieldDescriptor {
    /// A field with typed access. The kind comes from the storage type `V`.
    pub fn bound<T, V>(
        name: impl Into<String>,
        byte_offset: usize,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self
    where
        T: Any,
        V: FieldType,
    {
        FieldDescriptor {
            name: name.into(),
            kind: V::KIND,
            byte_offset,
            accessor: Some(FieldAccessor::new(get, get_mut)),
        }
    }

    /// A described-only field: visible to tooling, never read or written.
    pub fn opaque(name: impl Into<String>, kind: FieldKind, byte_offset: usize) -> Self {
        FieldDescriptor {
            name: name.into(),
            kind,
            byte_offset,
            accessor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// Read the field from `instance`.
    pub fn read(&self, instance: &dyn Any) -> MirrorResult<FieldValue> {
        let accessor = self
            .accessor
            .as_ref()
            .ok_or_else(|| MirrorError::NoAccessor(self.name.clone()))?;
        accessor
            .read(instance)
            .ok_or_else(|| MirrorError::InstanceMismatch(self.name.clone()))
    }

    /// Write `value` into the field of `instance`. The value kind must match.
    pub fn write(&self, instance: &mut dyn Any, value: FieldValue) -> MirrorResult<()> {
        if value.kind() != self.kind {
            return Err(MirrorError::TypeMismatch {
                expected: self.kind,
                found: value.kind(),
            });
        }
        let accessor = self
            .accessor
            .as_ref()
            .ok_or_else(|| MirrorError::NoAccessor(self.name.clone()))?;
        accessor
            .write(instance, value)
            .ok_or_else(|| MirrorError::InstanceMismatch(self.name.clone()))
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.byte_offset == other.byte_offset
            && self.has_accessor() == other.has_accessor()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("byte_offset", &self.byte_offset)
            .field("bound", &self.has_accessor())
            .finish()
    }
}

/// Reinterprets a host pointer as the registered concrete type.
type RawCast = fn(*mut c_void) -> *mut dyn Any;

fn cast_raw<T: Any>(ptr: *mut c_void) -> *mut dyn Any {
    ptr as *mut T as *mut dyn Any
}

/// A reflected type: name, size and ordered fields.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    size_bytes: usize,
    fields: Vec<FieldDescriptor>,
    instance_type: Option<TypeId>,
    raw_cast: Option<RawCast>,
}

impl TypeDescriptor {
    /// A descriptor not tied to a Rust type. Its fields can be described but
    /// instances can only be checked by the accessors themselves.
    pub fn new(name: impl Into<String>, size_bytes: usize) -> Self {
        TypeDescriptor {
            name: name.into(),
            size_bytes,
            fields: Vec::new(),
            instance_type: None,
            raw_cast: None,
        }
    }

    /// A descriptor for the concrete type `T`, sized with `size_of::<T>()`.
    pub fn of<T: Any>(name: impl Into<String>) -> Self {
        TypeDescriptor {
            name: name.into(),
            size_bytes: std::mem::size_of::<T>(),
            fields: Vec::new(),
            instance_type: Some(TypeId::of::<T>()),
            raw_cast: Some(cast_raw::<T>),
        }
    }

    /// Builder-style `add_field`.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.add_field(field);
        self
    }

    /// Append a field. A field with the same name is replaced in place.
    pub fn add_field(&mut self, field: FieldDescriptor) {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
            log::warn!("{}: field '{}' declared twice, keeping the last", self.name, field.name);
            *existing = field;
        } else {
            self.fields.push(field);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Like [`field`](Self::field) but with a typed not-found error.
    pub fn require_field(&self, name: &str) -> MirrorResult<&FieldDescriptor> {
        self.field(name).ok_or_else(|| MirrorError::FieldNotFound {
            type_name: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Fail unless `instance` is of the concrete type this descriptor was registered for.
    pub fn check_instance(&self, instance: &dyn Any) -> MirrorResult<()> {
        match self.instance_type {
            Some(id) if instance.type_id() != id => {
                Err(MirrorError::InstanceMismatch(self.name.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Whether host pointers can be turned into instances of this type.
    pub fn accepts_raw(&self) -> bool {
        self.raw_cast.is_some()
    }

    /// Reinterpret a host pointer as an instance of the registered type.
    ///
    /// Returns `None` for null pointers and for descriptors not created with
    /// [`TypeDescriptor::of`].
    ///
    /// # Safety
    /// `ptr` must point to a live, properly aligned value of the Rust type
    /// this descriptor was registered for, and no other reference to it may
    /// be used while the returned borrow is alive.
    pub unsafe fn instance_from_raw<'a>(&self, ptr: *mut c_void) -> Option<&'a mut dyn Any> {
        if ptr.is_null() {
            return None;
        }
        let cast = self.raw_cast?;
        // SAFETY: upheld by the caller (see above).
        unsafe { Some(&mut *cast(ptr)) }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.size_bytes == other.size_bytes
            && self.fields == other.fields
            && self.instance_type == other.instance_type
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("fields", &self.fields)
            .finish()
    }
}
