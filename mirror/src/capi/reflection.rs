// Flat reflection queries and typed field access.
//
// # Safety
// Every `*const c_char` argument must be null or a null-terminated string.
// Output buffers must be null or valid for `buf_len` bytes. Instance handles
// must be null or point to a live value of the Rust type registered under the
// given type name, with no other access while the call runs.

use std::ffi::c_char;
use std::panic::AssertUnwindSafe;

use mirror_ffi::{InstanceHandle, MirrorErrorCode};
use mirror_runtime::{ffi_boundary, registry, FieldType, TypeDescriptor};

use super::{error_code, read_str, record, set_last_error, with_instance, write_str};

fn with_type<R>(type_name: *const c_char, f: impl FnOnce(&TypeDescriptor) -> R) -> Option<R> {
    // SAFETY: argument contract of the module.
    let name = unsafe { read_str(type_name) }?;
    let registry = registry::global();
    registry.get_type(name).map(f)
}

#[unsafe(no_mangle)]
pub extern "C" fn mirror_type_count() -> u32 {
    ffi_boundary(0, || registry::global().type_count() as u32)
}

/// Name of the type at `index`. Returns the full name length, or 0 (and an
/// empty string) for an index out of range.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_type_name(index: u32, buf: *mut c_char, buf_len: u32) -> u32 {
    ffi_boundary(0, || {
        let registry = registry::global();
        let name = registry.type_name(index as usize).unwrap_or("");
        // SAFETY: argument contract of the module.
        unsafe { write_str(name, buf, buf_len) }
    })
}

/// Size in bytes of a type, 0 if unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_type_size(type_name: *const c_char) -> u32 {
    ffi_boundary(0, || with_type(type_name, |d| d.size_bytes() as u32).unwrap_or(0))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_field_count(type_name: *const c_char) -> u32 {
    ffi_boundary(0, || with_type(type_name, |d| d.fields().len() as u32).unwrap_or(0))
}

/// Name of the field at `index`. Returns the full name length, or 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_field_name(
    type_name: *const c_char,
    index: u32,
    buf: *mut c_char,
    buf_len: u32,
) -> u32 {
    ffi_boundary(0, || {
        let name = with_type(type_name, |d| d.fields().get(index as usize).map(|f| f.name().to_string()))
            .flatten()
            .unwrap_or_default();
        // SAFETY: argument contract of the module.
        unsafe { write_str(&name, buf, buf_len) }
    })
}

/// `FieldKind` tag of a field, -1 if the type or field is unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_field_type(type_name: *const c_char, field_name: *const c_char) -> i32 {
    ffi_boundary(-1, || {
        // SAFETY: argument contract of the module.
        let Some(field_name) = (unsafe { read_str(field_name) }) else {
            return -1;
        };
        with_type(type_name, |d| d.field(field_name).map(|f| f.kind() as i32))
            .flatten()
            .unwrap_or(-1)
    })
}

/// Byte offset of a field, 0 if the type or field is unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_field_offset(type_name: *const c_char, field_name: *const c_char) -> u32 {
    ffi_boundary(0, || {
        // SAFETY: argument contract of the module.
        let Some(field_name) = (unsafe { read_str(field_name) }) else {
            return 0;
        };
        with_type(type_name, |d| d.field(field_name).map(|f| f.byte_offset() as u32))
            .flatten()
            .unwrap_or(0)
    })
}

// ---------------------------------------------------------------------------
// Typed getters / setters
// ---------------------------------------------------------------------------

/// Read a field of storage type `V`; `None` on any failure, with the reason
/// left for `mirror_last_error`.
unsafe fn get<V: FieldType>(
    type_name: *const c_char,
    field_name: *const c_char,
    instance: InstanceHandle,
) -> Option<V> {
    // SAFETY: argument contract of the module.
    let Some(field_name) = (unsafe { read_str(field_name) }) else {
        return record(Err(MirrorErrorCode::NullArgument));
    };
    // SAFETY: argument contract of the module.
    let result = unsafe {
        with_instance(type_name, instance, |reg, ty, object| {
            reg.get_field::<V>(ty, field_name, object).map_err(|err| error_code("get", &err))
        })
    };
    record(result.and_then(|inner| inner))
}

/// Write a field of storage type `V`; false on any failure.
unsafe fn set<V: FieldType>(
    type_name: *const c_char,
    field_name: *const c_char,
    instance: InstanceHandle,
    value: V,
) -> bool {
    // SAFETY: argument contract of the module.
    let Some(field_name) = (unsafe { read_str(field_name) }) else {
        set_last_error(MirrorErrorCode::NullArgument);
        return false;
    };
    // SAFETY: argument contract of the module.
    let result = unsafe {
        with_instance(type_name, instance, |reg, ty, object| {
            reg.set_field(ty, field_name, object, value).map_err(|err| error_code("set", &err))
        })
    };
    record(result.and_then(|inner| inner)).is_some()
}

macro_rules! scalar_accessors {
    ($($get:ident / $set:ident: $ty:ty = $zero:expr;)*) => {$(
        /// Returns the zero value on any failure.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $get(
            type_name: *const c_char,
            field_name: *const c_char,
            instance: InstanceHandle,
        ) -> $ty {
            ffi_boundary($zero, AssertUnwindSafe(|| {
                // SAFETY: forwarded caller contract.
                unsafe { get::<$ty>(type_name, field_name, instance) }.unwrap_or($zero)
            }))
        }

        /// Returns false on any failure (unknown names, kind mismatch).
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $set(
            type_name: *const c_char,
            field_name: *const c_char,
            instance: InstanceHandle,
            value: $ty,
        ) -> bool {
            ffi_boundary(false, AssertUnwindSafe(|| {
                // SAFETY: forwarded caller contract.
                unsafe { set::<$ty>(type_name, field_name, instance, value) }
            }))
        }
    )*};
}

scalar_accessors! {
    mirror_get_bool / mirror_set_bool: bool = false;
    mirror_get_int / mirror_set_int: i32 = 0;
    mirror_get_float / mirror_set_float: f32 = 0.0;
    mirror_get_double / mirror_set_double: f64 = 0.0;
}

/// Read a String field into `buf`. Returns the full length, 0 on failure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_get_string(
    type_name: *const c_char,
    field_name: *const c_char,
    instance: InstanceHandle,
    buf: *mut c_char,
    buf_len: u32,
) -> u32 {
    ffi_boundary(0, AssertUnwindSafe(|| {
        // SAFETY: argument contract of the module.
        let value = unsafe { get::<String>(type_name, field_name, instance) }.unwrap_or_default();
        // SAFETY: argument contract of the module.
        unsafe { write_str(&value, buf, buf_len) }
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_set_string(
    type_name: *const c_char,
    field_name: *const c_char,
    instance: InstanceHandle,
    value: *const c_char,
) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: argument contract of the module.
        let Some(value) = (unsafe { read_str(value) }) else {
            set_last_error(MirrorErrorCode::NullArgument);
            return false;
        };
        // SAFETY: argument contract of the module.
        unsafe { set::<String>(type_name, field_name, instance, value.to_string()) }
    }))
}
