// Flat C API over the process-wide registry, the JSON codec and the protocol.
//
// Every export is wrapped in `ffi_boundary`; failures map to sentinels
// (0, false, -1, empty string). String outputs go to caller buffers and the
// functions return the full length required, excluding the terminator.
// Field access and codec exports also record a `MirrorErrorCode` that the
// host can fetch with `mirror_last_error`.

pub mod ipc;
pub mod reflection;
pub mod serialization;

use std::any::Any;
use std::cell::Cell;
use std::ffi::{c_char, CStr};
use std::sync::{Arc, OnceLock};

use mirror_ffi::{InstanceHandle, MirrorErrorCode, MirrorLogCallback};
use mirror_runtime::ipc::LoopbackHub;
use mirror_runtime::{ffi_boundary, registry, MirrorError, Registry};

thread_local! {
    static LAST_ERROR: Cell<MirrorErrorCode> = const { Cell::new(MirrorErrorCode::Ok) };
}

pub(crate) fn set_last_error(code: MirrorErrorCode) {
    LAST_ERROR.with(|last| last.set(code));
}

/// Record the outcome of a fallible call and keep its value, if any.
pub(crate) fn record<T>(result: Result<T, MirrorErrorCode>) -> Option<T> {
    match result {
        Ok(value) => {
            set_last_error(MirrorErrorCode::Ok);
            Some(value)
        }
        Err(code) => {
            set_last_error(code);
            None
        }
    }
}

/// Map a runtime error to its C code, logging it at debug.
pub(crate) fn error_code(op: &str, err: &MirrorError) -> MirrorErrorCode {
    log::debug!("{op}: {err}");
    MirrorErrorCode::from(err)
}

/// Copy `s` into `buf` (capacity `buf_len` bytes including the terminator),
/// truncating at a character boundary. Returns `s.len()`.
///
/// # Safety
/// `buf` must be null or valid for `buf_len` bytes of writes.
pub(crate) unsafe fn write_str(s: &str, buf: *mut c_char, buf_len: u32) -> u32 {
    if !buf.is_null() && buf_len > 0 {
        let mut n = s.len().min(buf_len as usize - 1);
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        // SAFETY: n < buf_len and the caller guarantees the buffer size.
        unsafe {
            std::ptr::copy_nonoverlapping(s.as_ptr(), buf as *mut u8, n);
            *buf.add(n) = 0;
        }
    }
    u32::try_from(s.len()).unwrap_or(u32::MAX)
}

/// Borrow a null-terminated UTF-8 argument.
///
/// # Safety
/// `ptr` must be null or point to a null-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: upheld by the caller.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Resolve `instance` as a live value of the registered type `type_name`.
///
/// # Safety
/// `instance` must be null or point to a live value of the Rust type
/// registered under `type_name`, not aliased for the duration of `f`.
pub(crate) unsafe fn with_instance<R>(
    type_name: *const c_char,
    instance: InstanceHandle,
    f: impl FnOnce(&Registry, &str, &mut dyn Any) -> R,
) -> Result<R, MirrorErrorCode> {
    // SAFETY: upheld by the caller.
    let type_name = unsafe { read_str(type_name) }.ok_or(MirrorErrorCode::NullArgument)?;
    if instance.is_null() {
        return Err(MirrorErrorCode::NullArgument);
    }
    let registry = registry::global();
    let desc = registry.get_type(type_name).ok_or(MirrorErrorCode::TypeNotFound)?;
    // SAFETY: upheld by the caller.
    let object = unsafe { desc.instance_from_raw(instance.0) }.ok_or(MirrorErrorCode::InstanceMismatch)?;
    Ok(f(&registry, type_name, object))
}

/// In-process hub shared by every server and client created through the C API.
pub(crate) fn hub() -> &'static LoopbackHub {
    static HUB: OnceLock<LoopbackHub> = OnceLock::new();
    HUB.get_or_init(LoopbackHub::new)
}

/// Build the process-wide registry from link-time registrations (if not
/// already built) and return its type count.
#[unsafe(no_mangle)]
pub extern "C" fn mirror_init() -> u32 {
    ffi_boundary(0, || registry::global().type_count() as u32)
}

/// Forward `log` records to a host sink at `Info` and above.
/// Returns false if a logger is already installed.
#[unsafe(no_mangle)]
pub extern "C" fn mirror_set_log_callback(callback: Option<MirrorLogCallback>) -> bool {
    ffi_boundary(false, || match callback {
        Some(cb) => mirror_runtime::install_host_logger(cb, log::LevelFilter::Info),
        None => false,
    })
}

/// `MirrorErrorCode` of the last field access or codec call made on this
/// thread; `Ok` (0) if it succeeded.
#[unsafe(no_mangle)]
pub extern "C" fn mirror_last_error() -> u32 {
    LAST_ERROR.with(Cell::get) as u32
}

/// Install `registry` as the one served by the C API.
pub fn install_registry(registry: Arc<Registry>) -> bool {
    registry::install_global(registry)
}
