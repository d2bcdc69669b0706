// Flat JSON codec entry points over the process-wide registry.
// Argument contract as in `capi::reflection`.

use std::ffi::c_char;
use std::panic::AssertUnwindSafe;

use mirror_ffi::{InstanceHandle, MirrorErrorCode};
use mirror_runtime::{ffi_boundary, json, MirrorResult};

use super::{read_str, record, set_last_error, with_instance, write_str};

/// Serialize an instance into `buf`.
///
/// Returns the JSON length, or -1 if the buffer cannot hold it (including
/// the terminator). Unknown types and null instances serialize as `{}`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_serialize_to_json(
    type_name: *const c_char,
    instance: InstanceHandle,
    buf: *mut c_char,
    buf_len: u32,
) -> i32 {
    ffi_boundary(-1, AssertUnwindSafe(|| {
        // SAFETY: argument contract of the module.
        let text = record(unsafe {
            with_instance(type_name, instance, |reg, ty, object| json::serialize(reg, ty, Some(&*object)))
        })
        .unwrap_or_else(|| "{}".to_string());
        if buf.is_null() || text.len() >= buf_len as usize {
            set_last_error(MirrorErrorCode::BufferTooSmall);
            return -1;
        }
        // SAFETY: argument contract of the module.
        let len = unsafe { write_str(&text, buf, buf_len) };
        i32::try_from(len).unwrap_or(-1)
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_deserialize_from_json(
    type_name: *const c_char,
    instance: InstanceHandle,
    json_text: *const c_char,
) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: argument contract of the module.
        let Some(text) = (unsafe { read_str(json_text) }) else {
            set_last_error(MirrorErrorCode::NullArgument);
            return false;
        };
        // SAFETY: argument contract of the module.
        let result = unsafe { with_instance(type_name, instance, |reg, ty, object| json::deserialize(reg, ty, object, text)) };
        record(result.and_then(|result| report(result, "deserialize"))).is_some()
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_save_to_file(
    type_name: *const c_char,
    instance: InstanceHandle,
    path: *const c_char,
) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: argument contract of the module.
        let Some(path) = (unsafe { read_str(path) }) else {
            set_last_error(MirrorErrorCode::NullArgument);
            return false;
        };
        // SAFETY: argument contract of the module.
        let result = unsafe { with_instance(type_name, instance, |reg, ty, object| json::save_to_file(reg, ty, &*object, path)) };
        record(result.and_then(|result| report(result, "save_to_file"))).is_some()
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_load_from_file(
    type_name: *const c_char,
    instance: InstanceHandle,
    path: *const c_char,
) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: argument contract of the module.
        let Some(path) = (unsafe { read_str(path) }) else {
            set_last_error(MirrorErrorCode::NullArgument);
            return false;
        };
        // SAFETY: argument contract of the module.
        let result = unsafe { with_instance(type_name, instance, |reg, ty, object| json::load_from_file(reg, ty, object, path)) };
        record(result.and_then(|result| report(result, "load_from_file"))).is_some()
    }))
}

fn report(result: MirrorResult<()>, op: &str) -> Result<(), MirrorErrorCode> {
    result.map_err(|err| {
        log::warn!("{op}: {err}");
        MirrorErrorCode::from(&err)
    })
}
